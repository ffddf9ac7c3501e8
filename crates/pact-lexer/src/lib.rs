//! Tokenizer for the Pact language.
//!
//! Pact programs are fed to the interpreter one line at a time (see the
//! parser crate for why). The lexer mirrors that: [`lex_line`] tokenizes a
//! single line in isolation. There is no cross-line lexer state -- a line
//! is always either fully valid or produces diagnostics on its own.
//!
//! # States
//!
//! The scanner is a finite-state machine over one line: `Search` (default),
//! `GName`, `LName`, `Number`. Single-character tokens (`[`, `]`, `(`, `)`,
//! `@`, `+`, `-`, `:`, `?`, `;`) and the reserved output sink `!` emit
//! directly from `Search`. Everything else accumulates into `GName`/
//! `LName`/`Number` until a non-continuing character is seen, at which
//! point the accumulated token is flushed and (for `GName`/`Number`) the
//! offending character is re-examined in `Search` on the same iteration.

use pact_common::token::{Token, TokenKind, TokenValue};
use pact_common::Diagnostic;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Search,
    GName,
    LName,
    Number,
}

/// Tokenize a single line of source text.
///
/// Returns the tokens produced and any diagnostics raised along the way.
/// Lexical diagnostics are always non-fatal: a bad character is reported
/// and lexing continues.
pub fn lex_line(line: &str, line_no: usize) -> (Vec<Token>, Vec<Diagnostic>) {
    let chars: Vec<char> = line.chars().collect();
    let mut tokens = Vec::new();
    let mut diagnostics = Vec::new();
    let mut state = State::Search;
    let mut builder = String::new();
    let mut idx = 0;

    while idx < chars.len() {
        let c = chars[idx];

        match state {
            State::GName => {
                if c.is_alphanumeric() || c == '_' {
                    builder.push(c);
                    idx += 1;
                    continue;
                }
                tokens.push(gname_token(&builder, line_no));
                builder.clear();
                state = State::Search;
                // Fall through: re-examine `c` under Search below.
            }
            State::LName => {
                if c.is_alphanumeric() || c == '_' {
                    builder.push(c);
                    idx += 1;
                    continue;
                }
                tokens.push(lname_token(&builder, line_no));
                builder.clear();
                state = State::Search;
                if c != '\'' {
                    diagnostics.push(Diagnostic::warning(
                        line_no,
                        format!("Bad character in local identifier '{c}'"),
                    ));
                }
                // Either way the offending character (closing apostrophe or
                // not) is consumed here, not re-examined.
                idx += 1;
                continue;
            }
            State::Number => {
                if c.is_ascii_digit() {
                    builder.push(c);
                    idx += 1;
                    continue;
                }
                tokens.push(number_token(&builder, line_no));
                builder.clear();
                state = State::Search;
                // Fall through: re-examine `c` under Search below.
            }
            State::Search => {}
        }

        // `state` is `Search` here, either because it always was or because
        // a GName/Number flush just fell through to reprocess `c`.
        if c.is_whitespace() {
            idx += 1;
            continue;
        }
        if let Some(kind) = single_char_kind(c) {
            tokens.push(Token::new(kind, line_no));
            idx += 1;
            continue;
        }
        if c == '!' {
            tokens.push(Token::with_value(
                TokenKind::GName,
                TokenValue::Name("!".to_string()),
                line_no,
            ));
            idx += 1;
            continue;
        }
        if c.is_alphabetic() || c == '_' {
            state = State::GName;
            builder.push(c);
            idx += 1;
            continue;
        }
        if c == '\'' {
            state = State::LName;
            idx += 1;
            continue;
        }
        if c.is_ascii_digit() {
            state = State::Number;
            builder.push(c);
            idx += 1;
            continue;
        }
        diagnostics.push(Diagnostic::warning(
            line_no,
            format!("Bad character in program '{c}'"),
        ));
        idx += 1;
    }

    // End-of-line flush of any pending identifier/number token.
    match state {
        State::GName => tokens.push(gname_token(&builder, line_no)),
        State::LName => tokens.push(lname_token(&builder, line_no)),
        State::Number => tokens.push(number_token(&builder, line_no)),
        State::Search => {}
    }

    (tokens, diagnostics)
}

fn gname_token(name: &str, line_no: usize) -> Token {
    Token::with_value(TokenKind::GName, TokenValue::Name(name.to_string()), line_no)
}

fn lname_token(name: &str, line_no: usize) -> Token {
    Token::with_value(TokenKind::LName, TokenValue::Name(name.to_string()), line_no)
}

fn number_token(digits: &str, line_no: usize) -> Token {
    // `digits` is non-empty and ASCII-digit-only by construction.
    let n: i64 = digits.parse().expect("lexer only accumulates ASCII digits");
    Token::with_value(TokenKind::Number, TokenValue::Number(n), line_no)
}

fn single_char_kind(c: char) -> Option<TokenKind> {
    match c {
        '[' => Some(TokenKind::LBrack),
        ']' => Some(TokenKind::RBrack),
        '(' => Some(TokenKind::LParen),
        ')' => Some(TokenKind::RParen),
        '@' => Some(TokenKind::At),
        '+' => Some(TokenKind::Plus),
        '-' => Some(TokenKind::Minus),
        ':' => Some(TokenKind::Colon),
        '?' => Some(TokenKind::Quoi),
        ';' => Some(TokenKind::Semi),
        _ => None,
    }
}
