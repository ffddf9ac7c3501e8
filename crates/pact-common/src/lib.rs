//! Shared types for the Pact interpreter: tokens, diagnostics, and runtime
//! values. No lexing, parsing, or execution logic lives here -- just the
//! vocabulary the other crates share.

pub mod diagnostic;
pub mod token;
pub mod value;

pub use diagnostic::{Diagnostic, Severity};
pub use token::{Token, TokenKind, TokenValue, OUTPUT_SINK};
pub use value::Value;
