//! The Pact interpreter CLI.
//!
//! Reads a program from standard input, one line at a time, and runs it
//! to completion (or to the first fatal diagnostic).
//!
//! Flags:
//! - `--ast` - print the parsed tree before execution
//! - `--globals` - print the final global environment after execution

use std::io::{BufRead, Write};
use std::process;

use clap::Parser as ClapParser;
use pact_common::Diagnostic;
use pact_interp::Executor;
use pact_lexer::lex_line;
use pact_parser::{pretty_print, Parser as PactParser};

const RULE: &str = "=-=-=-=-=-=-=-=-=-=";

/// Recognized only so `--help`/`--version` render through clap; actual
/// flag interpretation goes through [`scan_flags`] (see DESIGN.md for
/// why unknown flags must not abort startup the way clap's strict
/// derive parsing would).
#[derive(ClapParser)]
#[command(name = "pact", version, about = "Interpreter for the Pact language")]
struct Cli {
    /// Print the parsed AST before execution
    #[arg(long)]
    ast: bool,

    /// Print the final global environment after execution
    #[arg(long)]
    globals: bool,
}

struct Flags {
    ast: bool,
    globals: bool,
}

fn scan_flags(args: &[String]) -> Flags {
    let mut flags = Flags { ast: false, globals: false };
    for arg in args {
        let Some(name) = arg.strip_prefix("--") else { continue };
        match name.to_lowercase().as_str() {
            "ast" => flags.ast = true,
            "globals" => flags.globals = true,
            _ => {}
        }
    }
    flags
}

fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.iter().any(|a| a == "--help" || a == "-h" || a == "--version" || a == "-V") {
        Cli::parse();
        return;
    }
    let flags = scan_flags(&args);

    let stdin = std::io::stdin();
    let mut lines: Vec<String> = Vec::new();
    let mut parser = PactParser::new();
    let mut fatal = false;

    for (line_no, line) in stdin.lock().lines().enumerate() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                let diag = Diagnostic::error(line_no, format!("I/O error reading input: {e}"));
                print!("{}", diag.render(""));
                fatal = true;
                break;
            }
        };

        let (tokens, lex_diags) = lex_line(&line, line_no);
        for diag in &lex_diags {
            print!("{}", diag.render(&line));
        }

        parser.parse_line(&tokens, line_no);
        for diag in parser.take_diagnostics() {
            print!("{}", diag.render(&line));
        }

        lines.push(line);
        if parser.is_terminated() {
            fatal = true;
            break;
        }
    }

    let arena = parser.into_arena();

    if flags.ast {
        println!("{RULE}");
        print!("{}", pretty_print(&arena));
        println!("{RULE}");
    }

    if fatal {
        println!("Interpreter Terminated");
        process::exit(1);
    }

    let mut exec = Executor::new();
    let stdout = std::io::stdout();
    {
        let mut out = stdout.lock();
        exec.run(&arena, &mut out);
        let _ = out.flush();
    }

    for diag in exec.take_diagnostics() {
        let source = lines.get(diag.line).map(String::as_str).unwrap_or("");
        print!("{}", diag.render(source));
    }

    if exec.is_terminated() {
        println!("Interpreter Terminated");
        process::exit(1);
    }

    if flags.globals {
        println!("{RULE}");
        for (name, value) in exec.globals() {
            println!("{name} : {value}");
        }
        println!("{RULE}");
    }
}
