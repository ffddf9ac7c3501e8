//! The tree-walking executor. One `Executor` owns the variable
//! environment, the scope-local bookkeeping, and the node-value cache
//! for a single run; `run` walks the finished arena once.
//!
//! Unlike the flat linearization + jump-pointer traversal the design
//! notes describe, constructs are evaluated by direct recursion (see
//! DESIGN.md for why: a single global jump pointer cannot distinguish a
//! cycle's first pass over a node from a deliberately re-scheduled later
//! pass over the *same* node id, which the forward-only jump semantics
//! need in order to mean anything). Recursion gives identical observable
//! behavior -- predicates still gate forward progress, just through
//! ordinary call/return instead of a mutable pointer -- and is how the
//! original interpreter this language was modeled on works too.

use std::io::Write;

use pact_common::{Diagnostic, Token, TokenKind, Value, OUTPUT_SINK};
use pact_parser::{Arena, NodeId, NodeKind, Payload, PredicateTest};
use rustc_hash::FxHashMap;

enum RpnItem {
    Value(Value),
    Op(TokenKind),
}

pub struct Executor {
    env: FxHashMap<String, Value>,
    order: Vec<String>,
    scope_locals: FxHashMap<String, Vec<String>>,
    cache: FxHashMap<NodeId, Value>,
    diagnostics: Vec<Diagnostic>,
    terminated: bool,
}

impl Default for Executor {
    fn default() -> Self {
        Self::new()
    }
}

impl Executor {
    pub fn new() -> Self {
        Self {
            env: FxHashMap::default(),
            order: Vec::new(),
            scope_locals: FxHashMap::default(),
            cache: FxHashMap::default(),
            diagnostics: Vec::new(),
            terminated: false,
        }
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// The final environment, in insertion order, with any names whose
    /// owning scope has since concluded already removed.
    pub fn globals(&self) -> Vec<(String, Value)> {
        self.order
            .iter()
            .map(|name| (name.clone(), self.env[name].clone()))
            .collect()
    }

    pub fn run(&mut self, arena: &Arena, out: &mut impl Write) {
        self.exec_seq(arena, Arena::root(), out);
    }

    fn exec_seq(&mut self, arena: &Arena, seq: NodeId, out: &mut impl Write) {
        for &stmt in &arena.get(seq).children {
            if self.terminated {
                return;
            }
            self.exec_assign(arena, stmt, out);
        }
    }

    fn exec_assign(&mut self, arena: &Arena, assign: NodeId, out: &mut impl Write) {
        let node = arena.get(assign);
        let lvalue_id = node.children[0];
        let expr_id = node.children[1];
        let line = node.line;

        self.register_lvalue(arena, lvalue_id);
        let Some(value) = self.eval_expr(arena, expr_id, out) else {
            return;
        };

        let name = lvalue_name(token_of(arena, lvalue_id));
        if name == OUTPUT_SINK {
            let _ = writeln!(out, "{value}");
        } else {
            self.set_var(&name, value, line);
        }
    }

    fn register_lvalue(&mut self, arena: &Arena, lvalue_id: NodeId) {
        let node = arena.get(lvalue_id);
        let tok = token_of(arena, lvalue_id);
        let name = lvalue_name(tok);
        if name == OUTPUT_SINK {
            return;
        }
        if tok.kind == TokenKind::LName {
            let locals = self.scope_locals.entry(node.scope_sig.clone()).or_default();
            if !locals.contains(&name) {
                locals.push(name.clone());
            }
        }
        if !self.env.contains_key(&name) {
            self.order.push(name.clone());
            self.env.insert(name, Value::Unset);
        }
    }

    fn set_var(&mut self, name: &str, value: Value, _line: usize) {
        if !self.env.contains_key(name) {
            self.order.push(name.to_string());
        }
        self.env.insert(name.to_string(), value);
    }

    fn fatal(&mut self, line: usize, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic::error(line, message));
        self.terminated = true;
    }

    // ---- expression evaluation ----------------------------------------

    fn eval_expr(&mut self, arena: &Arena, id: NodeId, out: &mut impl Write) -> Option<Value> {
        if let Some(v) = self.cache.get(&id) {
            return Some(v.clone());
        }
        let value = match arena.get(id).kind {
            NodeKind::Expr => self.eval_expr_node(arena, id, out)?,
            NodeKind::Value => self.eval_value(arena, id)?,
            NodeKind::Cycle => self.eval_cycle(arena, id, out)?,
            NodeKind::Condex => self.eval_condex(arena, id, out)?,
            NodeKind::Scope => self.eval_scope(arena, id, out)?,
            other => unreachable!("{other:?} does not produce a value"),
        };
        self.cache.insert(id, value.clone());
        Some(value)
    }

    fn eval_expr_node(&mut self, arena: &Arena, id: NodeId, out: &mut impl Write) -> Option<Value> {
        let children = arena.get(id).children.clone();
        if children.len() == 1 {
            return self.eval_expr(arena, children[0], out);
        }

        // Shunting-yard over a flat `operand (op operand)*` sequence.
        // `+`/`-` sit at equal precedence, left-associative, so the
        // operator "stack" never holds more than one pending operator.
        let mut rpn = Vec::with_capacity(children.len());
        let mut op_stack: Vec<TokenKind> = Vec::new();
        for &child in &children {
            if arena.get(child).kind == NodeKind::Op {
                if let Some(pending) = op_stack.pop() {
                    rpn.push(RpnItem::Op(pending));
                }
                op_stack.push(token_of(arena, child).kind);
            } else {
                let value = self.eval_expr(arena, child, out)?;
                rpn.push(RpnItem::Value(value));
            }
        }
        while let Some(op) = op_stack.pop() {
            rpn.push(RpnItem::Op(op));
        }

        let line = arena.get(id).line;
        let mut stack: Vec<Value> = Vec::new();
        for item in rpn {
            match item {
                RpnItem::Value(v) => stack.push(v),
                RpnItem::Op(kind) => {
                    let (Some(b), Some(a)) = (stack.pop(), stack.pop()) else {
                        self.fatal(line, "Malformed expression: operator with too few operands");
                        return None;
                    };
                    let (Some(a), Some(b)) = (a.as_int(), b.as_int()) else {
                        self.fatal(line, "Malformed expression: arithmetic on a non-integer value");
                        return None;
                    };
                    let result = match kind {
                        TokenKind::Plus => a + b,
                        TokenKind::Minus => a - b,
                        _ => unreachable!("only Plus/Minus are ever recorded as Op payloads"),
                    };
                    stack.push(Value::Int(result));
                }
            }
        }
        if stack.len() != 1 {
            self.fatal(line, "Malformed expression: operands left unreduced");
            return None;
        }
        Some(stack.pop().unwrap())
    }

    fn eval_value(&mut self, arena: &Arena, id: NodeId) -> Option<Value> {
        let node = arena.get(id);
        let tok = token_of(arena, id);
        match tok.kind {
            TokenKind::Number => Some(Value::Int(tok.number())),
            TokenKind::GName | TokenKind::LName => {
                let name = tok.name();
                if name == OUTPUT_SINK {
                    self.fatal(node.line, "'!' cannot be used as a value");
                    return None;
                }
                match self.env.get(name) {
                    Some(v) => Some(v.clone()),
                    None => {
                        let scope = if tok.kind == TokenKind::LName { "local" } else { "global" };
                        self.fatal(node.line, format!("Undefined {scope} name {name}"));
                        None
                    }
                }
            }
            other => unreachable!("{other:?} is not a Value payload kind"),
        }
    }

    fn eval_cycle(&mut self, arena: &Arena, id: NodeId, out: &mut impl Write) -> Option<Value> {
        let node = arena.get(id);
        let line = node.line;
        let predicate_id = node.children[0];
        let body_id = node.children[1];
        let mut acc: Vec<Value> = Vec::new();

        loop {
            let predicate_node = arena.get(predicate_id);
            let predicate_expr = predicate_node.children[0];
            let test = predicate_test(predicate_node);
            let test_value = self.eval_expr(arena, predicate_expr, out)?;
            if !test.succeeds(&test_value) {
                break;
            }
            acc.push(test_value);
            let body_value = self.eval_expr(arena, body_id, out)?;

            // The only way a cycle's guard changes between iterations:
            // when the predicate is a bare name, rebind it to the body's
            // value, exactly as if the cycle were `while name > 0 { ...
            // name = body }`.
            if let Some(name) = bare_name(arena, predicate_expr) {
                self.set_var(&name, body_value, line);
            }

            self.clear_subtree_cache(arena, predicate_expr);
            self.clear_subtree_cache(arena, body_id);
            self.cache.remove(&predicate_id);

            if self.terminated {
                return None;
            }
        }
        Some(Value::Seq(acc))
    }

    fn eval_condex(&mut self, arena: &Arena, id: NodeId, out: &mut impl Write) -> Option<Value> {
        for &arm in &arena.get(id).children {
            match arena.get(arm).kind {
                NodeKind::If => {
                    let if_node = arena.get(arm);
                    let predicate_id = if_node.children[0];
                    let body_id = if_node.children[1];
                    let predicate_node = arena.get(predicate_id);
                    let predicate_expr = predicate_node.children[0];
                    let test = predicate_test(predicate_node);
                    let test_value = self.eval_expr(arena, predicate_expr, out)?;
                    if test.succeeds(&test_value) {
                        return self.eval_expr(arena, body_id, out);
                    }
                }
                NodeKind::Else => {
                    let body_id = arena.get(arm).children[0];
                    return self.eval_expr(arena, body_id, out);
                }
                other => unreachable!("{other:?} is not a Condex arm"),
            }
        }
        Some(Value::Unset)
    }

    fn eval_scope(&mut self, arena: &Arena, id: NodeId, out: &mut impl Write) -> Option<Value> {
        let node = arena.get(id);
        let return_id = node.children[0];
        let return_node = arena.get(return_id);
        let seq_id = return_node.children[0];

        self.exec_seq(arena, seq_id, out);
        if self.terminated {
            return None;
        }

        let name = lvalue_name(token_of(arena, return_id));
        let value = match self.env.get(&name) {
            Some(v) => v.clone(),
            None => {
                self.fatal(return_node.line, format!("Return name {name} is not in any live scope"));
                return None;
            }
        };

        if let Some(locals) = self.scope_locals.remove(&node.scope_sig) {
            for local in locals {
                self.env.remove(&local);
                self.order.retain(|n| n != &local);
            }
        }
        Some(value)
    }

    fn clear_subtree_cache(&mut self, arena: &Arena, id: NodeId) {
        self.cache.remove(&id);
        for &child in &arena.get(id).children.clone() {
            self.clear_subtree_cache(arena, child);
        }
    }
}

fn token_of(arena: &Arena, id: NodeId) -> &Token {
    match &arena.get(id).payload {
        Payload::Token(tok) => tok,
        other => unreachable!("node {} has no token payload: {other:?}", id.0),
    }
}

fn lvalue_name(tok: &Token) -> String {
    tok.name().to_string()
}

fn predicate_test(predicate_node: &pact_parser::Node) -> PredicateTest {
    match &predicate_node.payload {
        Payload::Predicate(p) => p.test,
        other => unreachable!("a Predicate node always carries a PredicatePayload: {other:?}"),
    }
}

trait TestExt {
    fn succeeds(&self, value: &Value) -> bool;
}

impl TestExt for PredicateTest {
    fn succeeds(&self, value: &Value) -> bool {
        match self {
            PredicateTest::GreaterThanZero => value.as_int().map(|n| n > 0).unwrap_or(false),
        }
    }
}

/// If `expr` is a single bare name reference, its name -- used to detect
/// a cycle's implicit loop variable.
fn bare_name(arena: &Arena, expr_id: NodeId) -> Option<String> {
    let node = arena.get(expr_id);
    if node.children.len() != 1 {
        return None;
    }
    let child = arena.get(node.children[0]);
    if child.kind != NodeKind::Value {
        return None;
    }
    match &child.payload {
        Payload::Token(tok) if matches!(tok.kind, TokenKind::GName | TokenKind::LName) => Some(tok.name().to_string()),
        _ => None,
    }
}
