//! AST pretty-printer for the `--ast` CLI flag: one line per node,
//! indented one tab per depth level, `[KIND (index) payload]`.

use pact_common::TokenKind;

use crate::arena::{Arena, NodeId, NodeKind, Payload};

pub fn pretty_print(arena: &Arena) -> String {
    let mut out = String::new();
    print_node(arena, Arena::root(), 0, &mut out);
    out
}

fn print_node(arena: &Arena, id: NodeId, depth: usize, out: &mut String) {
    let node = arena.get(id);
    for _ in 0..depth {
        out.push('\t');
    }
    out.push_str(&format!("[{} ({}){}]\n", kind_name(node.kind), id.0, payload_text(&node.payload)));
    for &child in &node.children {
        print_node(arena, child, depth + 1, out);
    }
}

fn kind_name(kind: NodeKind) -> &'static str {
    match kind {
        NodeKind::Seq => "SEQ",
        NodeKind::Scope => "SCOPE",
        NodeKind::Return => "RETURN",
        NodeKind::Assign => "ASSIGN",
        NodeKind::Lvalue => "LVALUE",
        NodeKind::Expr => "EXPR",
        NodeKind::Value => "VALUE",
        NodeKind::Op => "OP",
        NodeKind::Cycle => "CYCLE",
        NodeKind::Condex => "CONDEX",
        NodeKind::If => "IF",
        NodeKind::Else => "ELSE",
        NodeKind::Predicate => "PREDICATE",
    }
}

fn payload_text(payload: &Payload) -> String {
    match payload {
        Payload::None => String::new(),
        Payload::Token(tok) => format!(" {}", token_text(tok)),
        Payload::Predicate(p) => {
            let mut s = format!(" {:?} taken={}", p.test, p.taken.0);
            if let Some(not_taken) = p.not_taken {
                s.push_str(&format!(" not_taken={}", not_taken.0));
            }
            s
        }
    }
}

fn token_text(tok: &pact_common::Token) -> String {
    match tok.kind {
        TokenKind::Number => tok.number().to_string(),
        TokenKind::GName | TokenKind::LName => tok.name().to_string(),
        TokenKind::Plus => "+".to_string(),
        TokenKind::Minus => "-".to_string(),
        other => format!("{other:?}"),
    }
}
