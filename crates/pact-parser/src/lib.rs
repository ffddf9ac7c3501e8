//! Stack-driven construct-oriented parser for the Pact language.
//!
//! Consumes tokens (from `pact_lexer::lex_line`) one line at a time and
//! grows a single append-only node arena. See [`Parser`] for the entry
//! point; [`pretty::pretty_print`] renders the finished tree for the
//! `--ast` CLI flag.

mod arena;
mod parser;
mod pretty;
mod state;

pub use arena::{Arena, Node, NodeId, NodeKind, Payload, PredicatePayload, PredicateTest};
pub use parser::Parser;
pub use pretty::pretty_print;
