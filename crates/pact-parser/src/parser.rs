//! The stack-driven parser. One `Parser` owns the arena and the three
//! stacks (active/construct/scope) for the whole program; `parse_line`
//! feeds it one line's tokens at a time, in the order the lines arrive.
//!
//! The "expectation automaton" (`State`) is not reset between lines: a
//! construct opened on one line and closed on a later one resumes right
//! where it left off, because the active/construct/scope stacks carry
//! the open construct across the `parse_line` boundary and `State` is
//! just the parser's own field, not a per-call local.

use pact_common::{Diagnostic, Token, TokenKind};

use crate::arena::{Arena, Node, NodeId, NodeKind, Payload, PredicatePayload, PredicateTest};
use crate::state::State;

pub struct Parser {
    arena: Arena,
    active: Vec<NodeId>,
    construct: Vec<NodeId>,
    scope: Vec<NodeId>,
    state: State,
    diagnostics: Vec<Diagnostic>,
    terminated: bool,
}

impl Default for Parser {
    fn default() -> Self {
        Self::new()
    }
}

impl Parser {
    pub fn new() -> Self {
        let arena = Arena::new();
        let root = Arena::root();
        Self {
            arena,
            active: vec![root],
            construct: vec![root],
            scope: vec![root],
            state: State::Initial,
            diagnostics: Vec::new(),
            terminated: false,
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Diagnostics raised since the last call to this method.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    pub fn into_arena(self) -> Arena {
        self.arena
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    /// Feed one line's tokens to the parser. A no-op if the parser has
    /// already seen a fatal diagnostic.
    pub fn parse_line(&mut self, tokens: &[Token], line_no: usize) {
        if self.terminated {
            return;
        }
        let mut idx = 0;
        while idx < tokens.len() {
            if self.terminated {
                return;
            }
            let consumed = self.step(tokens, idx, line_no);
            if consumed {
                idx += 1;
            }
        }
        if !self.terminated {
            self.rebase_sequence_eol();
        }
    }

    // ---- stack machinery -------------------------------------------------

    fn scope_sig(&self) -> String {
        self.scope
            .iter()
            .map(|id| id.0.to_string())
            .collect::<Vec<_>>()
            .join(".")
    }

    fn add_leaf(&mut self, kind: NodeKind, payload: Payload, line: usize) -> NodeId {
        let parent = *self.active.last().expect("active stack is never empty");
        let scope_sig = self.scope_sig();
        let id = self.arena.push(Node {
            parent,
            kind,
            line,
            payload,
            scope_sig,
            children: Vec::new(),
        });
        self.arena.get_mut(parent).children.push(id);
        id
    }

    fn add_active(&mut self, kind: NodeKind, payload: Payload, line: usize, construct: bool) -> NodeId {
        let parent = *self.active.last().expect("active stack is never empty");
        // A Scope's own index is part of its own scope signature, so the
        // scope stack gets the id it's about to receive before the
        // signature is computed.
        let pending_id = NodeId(self.arena.len() as u32);
        if kind == NodeKind::Scope {
            self.scope.push(pending_id);
        }
        let scope_sig = self.scope_sig();
        let id = self.arena.push(Node {
            parent,
            kind,
            line,
            payload,
            scope_sig,
            children: Vec::new(),
        });
        debug_assert_eq!(id, pending_id);
        self.arena.get_mut(parent).children.push(id);
        self.active.push(id);
        if construct {
            self.construct.push(id);
        }
        id
    }

    fn conclude_active(&mut self) -> NodeId {
        let id = self.active.pop().expect("active stack underflow");
        if self.scope.last() == Some(&id) {
            self.scope.pop();
        }
        id
    }

    fn conclude_construct(&mut self) {
        let construct = self.construct.pop().expect("construct stack underflow");
        loop {
            if self.conclude_active() == construct {
                break;
            }
        }
    }

    /// Conclude actives until the active top is `target`. Used by the
    /// closer/separator rules, which always know exactly which open node
    /// they're rebasing to.
    fn rebase_to(&mut self, target: NodeId) {
        while *self.active.last().expect("active stack is never empty") != target {
            self.conclude_active();
        }
    }

    fn rebase_construct(&mut self) {
        let target = *self.construct.last().expect("construct stack is never empty");
        self.rebase_to(target);
    }

    /// The nearest open `If`/`Else` arm, scanning from the active top down.
    fn current_condex_arm(&self) -> NodeId {
        self.active
            .iter()
            .rev()
            .find(|&&id| matches!(self.arena.get(id).kind, NodeKind::If | NodeKind::Else))
            .copied()
            .expect("a Condex always has an open If/Else arm while building its body")
    }

    fn auto_close_condex(&mut self) {
        while let Some(&top) = self.construct.last() {
            if self.arena.get(top).kind == NodeKind::Condex {
                self.conclude_construct();
            } else {
                break;
            }
        }
    }

    /// End-of-line rebase: conclude actives up to the enclosing `Seq`,
    /// unless the active top is itself the open construct (a construct
    /// legitimately spanning multiple lines) -- in which case parsing
    /// stops here and resumes on the next line in the same `state`.
    fn rebase_sequence_eol(&mut self) {
        loop {
            let top = *self.active.last().expect("active stack is never empty");
            if self.arena.get(top).kind == NodeKind::Seq {
                self.state = State::Initial;
                break;
            }
            if self.arena.get(top).kind == NodeKind::Else {
                self.conclude_active();
                let condex = *self.active.last().expect("Else is always nested in a Condex");
                if self.construct.last() == Some(&condex) {
                    self.construct.pop();
                }
                self.conclude_active();
                continue;
            }
            if self.construct.last() == Some(&top) {
                break;
            }
            self.conclude_active();
        }
    }

    fn fatal(&mut self, line_no: usize, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::error(line_no, message));
        self.terminated = true;
    }

    fn warn(&mut self, line_no: usize, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::warning(line_no, message));
    }

    fn in_scope_single_statement_body(&self) -> bool {
        let len = self.active.len();
        if len < 5 {
            return false;
        }
        let kinds: Vec<NodeKind> = self.active[len - 5..].iter().map(|&id| self.arena.get(id).kind).collect();
        matches!(
            kinds.as_slice(),
            [NodeKind::Scope, NodeKind::Return, NodeKind::Seq, NodeKind::Assign, NodeKind::Expr]
        )
    }

    fn open_cycle_predicate(&mut self, line: usize) {
        let cycle = self.add_active(NodeKind::Cycle, Payload::None, line, true);
        let predicate_payload = PredicatePayload {
            test: PredicateTest::GreaterThanZero,
            taken: cycle,
            not_taken: None,
        };
        self.add_active(NodeKind::Predicate, Payload::Predicate(predicate_payload), line, false);
        self.add_active(NodeKind::Expr, Payload::None, line, false);
    }

    fn open_condex_if(&mut self, line: usize, construct: bool) {
        let condex = if construct {
            self.add_active(NodeKind::Condex, Payload::None, line, true)
        } else {
            *self.construct.last().expect("construct stack is never empty")
        };
        let if_node = self.add_active(NodeKind::If, Payload::None, line, false);
        let predicate_payload = PredicatePayload {
            test: PredicateTest::GreaterThanZero,
            taken: condex,
            not_taken: Some(if_node),
        };
        self.add_active(NodeKind::Predicate, Payload::Predicate(predicate_payload), line, false);
        self.add_active(NodeKind::Expr, Payload::None, line, false);
    }

    // ---- the automaton -----------------------------------------------

    /// Processes `tokens[idx]` under the current state. Returns `true` if
    /// the token was consumed (caller should advance `idx`); `false`
    /// means the same token should be reprocessed under the new state.
    fn step(&mut self, tokens: &[Token], idx: usize, line_no: usize) -> bool {
        let tok = &tokens[idx];
        match self.state {
            State::Initial => self.step_initial(tok, line_no),
            State::AssignColon => self.step_assign_colon(tok, line_no),
            State::ExprVal => self.step_expr_val(tok, line_no),
            State::ExprOp => self.step_expr_op(tok, line_no),
            State::ParenContents => self.step_paren_contents(tok, line_no),
            State::ScopeRet => self.step_scope_ret(tok, line_no),
            State::ScopeAwaitReturnRepeat => self.step_scope_await_return_repeat(tok, line_no),
            State::ScopeAwaitClose => self.step_scope_await_close(tok, line_no),
        }
    }

    fn step_initial(&mut self, tok: &Token, line_no: usize) -> bool {
        match tok.kind {
            TokenKind::GName | TokenKind::LName => {
                self.add_active(NodeKind::Assign, Payload::None, line_no, false);
                self.add_leaf(NodeKind::Lvalue, Payload::Token(tok.clone()), line_no);
                self.state = State::AssignColon;
                true
            }
            TokenKind::RParen | TokenKind::RBrack => {
                // Closer continuing a construct opened on a previous line.
                self.state = State::ExprOp;
                false
            }
            _ => {
                self.fatal(line_no, "Malformed line: expected an assignment target");
                true
            }
        }
    }

    fn step_assign_colon(&mut self, tok: &Token, line_no: usize) -> bool {
        match tok.kind {
            TokenKind::Colon => {
                self.add_active(NodeKind::Expr, Payload::None, line_no, false);
                self.state = State::ExprVal;
                true
            }
            _ => {
                self.fatal(line_no, "Malformed line: expected ':' after assignment target");
                true
            }
        }
    }

    fn step_expr_val(&mut self, tok: &Token, line_no: usize) -> bool {
        match tok.kind {
            TokenKind::GName | TokenKind::LName | TokenKind::Number => {
                self.add_leaf(NodeKind::Value, Payload::Token(tok.clone()), line_no);
                self.state = State::ExprOp;
                true
            }
            TokenKind::LParen => {
                self.state = State::ParenContents;
                true
            }
            TokenKind::LBrack => {
                self.open_cycle_predicate(line_no);
                self.state = State::ExprVal;
                true
            }
            TokenKind::Quoi => {
                self.open_condex_if(line_no, true);
                self.state = State::ExprVal;
                true
            }
            _ => {
                self.fatal(line_no, "Malformed expression: expected a value");
                true
            }
        }
    }

    fn step_expr_op(&mut self, tok: &Token, line_no: usize) -> bool {
        match tok.kind {
            TokenKind::Plus | TokenKind::Minus => {
                self.add_leaf(NodeKind::Op, Payload::Token(tok.clone()), line_no);
                self.state = State::ExprVal;
                true
            }
            TokenKind::RParen => {
                self.auto_close_condex();
                match self.construct.last().map(|&id| self.arena.get(id).kind) {
                    Some(NodeKind::Expr) | Some(NodeKind::Scope) => {
                        self.conclude_construct();
                        self.state = State::ExprOp;
                        true
                    }
                    _ => {
                        self.fatal(line_no, "Unexpected closer: ')' does not close an open expression or scope");
                        true
                    }
                }
            }
            TokenKind::RBrack => {
                self.auto_close_condex();
                match self.construct.last().map(|&id| self.arena.get(id).kind) {
                    Some(NodeKind::Cycle) => {
                        self.conclude_construct();
                        self.state = State::ExprOp;
                        true
                    }
                    _ => {
                        self.fatal(line_no, "Unexpected closer: ']' does not close an open cycle");
                        true
                    }
                }
            }
            TokenKind::Colon => {
                self.handle_colon(line_no);
                true
            }
            TokenKind::Quoi => {
                if matches!(self.construct.last().map(|&id| self.arena.get(id).kind), Some(NodeKind::Condex)) {
                    self.rebase_construct();
                    self.open_condex_if(line_no, false);
                    self.state = State::ExprVal;
                } else {
                    self.fatal(line_no, "Unexpected '?': no open conditional expression to add an arm to");
                }
                true
            }
            TokenKind::Semi => {
                if matches!(self.construct.last().map(|&id| self.arena.get(id).kind), Some(NodeKind::Condex)) {
                    self.rebase_construct();
                    self.add_active(NodeKind::Else, Payload::None, line_no, false);
                    self.add_active(NodeKind::Expr, Payload::None, line_no, false);
                    self.state = State::ExprVal;
                } else {
                    self.fatal(line_no, "Unexpected ';': no open conditional expression to terminate");
                }
                true
            }
            TokenKind::LParen | TokenKind::LBrack => {
                if matches!(self.construct.last().map(|&id| self.arena.get(id).kind), Some(NodeKind::Cycle) | Some(NodeKind::Condex)) {
                    self.warn(line_no, "Missing ':' before nested construct; assuming it was intended");
                    self.rebase_construct();
                    self.add_active(NodeKind::Expr, Payload::None, line_no, false);
                    self.state = State::ExprVal;
                    false
                } else {
                    self.fatal(line_no, "Malformed expression: unexpected opener");
                    true
                }
            }
            TokenKind::GName | TokenKind::LName if self.in_scope_single_statement_body() => {
                self.conclude_active(); // Expr
                self.conclude_active(); // Assign
                self.state = State::ScopeAwaitReturnRepeat;
                false
            }
            _ => {
                self.fatal(line_no, "Malformed expression: expected an operator or closer");
                true
            }
        }
    }

    fn handle_colon(&mut self, line_no: usize) {
        match self.construct.last().map(|&id| self.arena.get(id).kind) {
            Some(NodeKind::Cycle) => {
                self.rebase_construct();
                self.add_active(NodeKind::Expr, Payload::None, line_no, false);
                self.state = State::ExprVal;
            }
            Some(NodeKind::Condex) => {
                let arm = self.current_condex_arm();
                if self.arena.get(arm).kind == NodeKind::Else {
                    self.fatal(line_no, "Unexpected ':' in an 'else' arm, which has no predicate");
                    return;
                }
                self.rebase_to(arm);
                self.add_active(NodeKind::Expr, Payload::None, line_no, false);
                self.state = State::ExprVal;
            }
            _ => {
                self.fatal(line_no, "Unexpected ':' outside a cycle or conditional expression");
            }
        }
    }

    fn step_paren_contents(&mut self, tok: &Token, line_no: usize) -> bool {
        match tok.kind {
            TokenKind::At => {
                self.add_active(NodeKind::Scope, Payload::None, line_no, true);
                self.state = State::ScopeRet;
                true
            }
            _ => {
                self.add_active(NodeKind::Expr, Payload::None, line_no, true);
                self.state = State::ExprVal;
                false
            }
        }
    }

    // Resolved ambiguity: the automaton as documented only accepts GName
    // here, but the language's own worked example declares a scope's
    // return name with an apostrophe (an LName) -- see DESIGN.md.
    fn step_scope_ret(&mut self, tok: &Token, line_no: usize) -> bool {
        match tok.kind {
            TokenKind::GName | TokenKind::LName => {
                self.add_active(NodeKind::Return, Payload::Token(tok.clone()), line_no, false);
                self.add_active(NodeKind::Seq, Payload::None, line_no, false);
                self.add_active(NodeKind::Assign, Payload::None, line_no, false);
                self.add_leaf(NodeKind::Lvalue, Payload::Token(tok.clone()), line_no);
                self.state = State::AssignColon;
                true
            }
            _ => {
                self.fatal(line_no, "Malformed line: expected a scope return name after '(@'");
                true
            }
        }
    }

    fn step_scope_await_return_repeat(&mut self, tok: &Token, line_no: usize) -> bool {
        match tok.kind {
            TokenKind::GName | TokenKind::LName => {
                self.state = State::ScopeAwaitClose;
                true
            }
            _ => {
                self.fatal(line_no, "Trailing tokens after a scope's return name");
                true
            }
        }
    }

    fn step_scope_await_close(&mut self, tok: &Token, line_no: usize) -> bool {
        match tok.kind {
            TokenKind::RParen => {
                self.auto_close_condex();
                match self.construct.last().map(|&id| self.arena.get(id).kind) {
                    Some(NodeKind::Scope) => {
                        self.conclude_construct();
                        self.state = State::ExprOp;
                        true
                    }
                    _ => {
                        self.fatal(line_no, "Unexpected closer: ')' does not close an open scope");
                        true
                    }
                }
            }
            _ => {
                self.fatal(line_no, "Malformed line: expected ')' to close a scope");
                true
            }
        }
    }
}
