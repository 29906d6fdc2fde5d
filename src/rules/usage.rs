//! Classifies whether the value produced by a call expression is consumed.
//!
//! A result counts as used when one of these shapes holds, checked in order:
//!
//! 1. a further call is made on it, possibly through member accesses
//!    (`f().execute()`);
//! 2. it is bound to a variable, by assignment or by initializer, again
//!    possibly through member accesses and chained calls
//!    (`v = f()`, `T v = f()`, `x = f().prop`);
//! 3. the nearest enclosing statement is a `return`;
//! 4. it is passed directly as an argument to a method call. Constructor
//!    arguments (`new T(f())`) do not count.
//!
//! Parentheses are transparent at every step. Binding alone counts: later
//! reads of the variable are not checked.

use crate::resolve::Resolve;
use crate::syntax::{NodeId, NodeKind, SyntaxTree, MAX_ANCESTOR_DEPTH};

/// Whether the result of `call` is consumed by its surrounding context
pub fn is_result_used(tree: &SyntaxTree, call: NodeId, resolver: &dyn Resolve) -> bool {
    has_chained_call(tree, call)
        || is_bound_to_variable(tree, call, resolver)
        || is_returned(tree, call)
        || is_passed_as_argument(tree, call)
}

/// The parent of `node` with parentheses skipped, together with the child
/// of that parent the walk came through
fn ascend(tree: &SyntaxTree, node: NodeId) -> Option<(NodeId, NodeId)> {
    let mut child = node;
    let mut parent = tree.parent(node)?;
    for _ in 0..MAX_ANCESTOR_DEPTH {
        if !matches!(tree.kind(parent), Some(NodeKind::Parenthesized { .. })) {
            return Some((child, parent));
        }
        child = parent;
        parent = tree.parent(parent)?;
    }
    None
}

/// `f().g()`, `f().a.b.g()`
pub fn has_chained_call(tree: &SyntaxTree, call: NodeId) -> bool {
    let mut current = call;
    for _ in 0..MAX_ANCESTOR_DEPTH {
        let Some((child, parent)) = ascend(tree, current) else {
            return false;
        };
        match tree.kind(parent) {
            Some(NodeKind::MemberAccess { .. }) => current = parent,
            Some(NodeKind::Call { callee, .. }) => return *callee == child,
            _ => return false,
        }
    }
    false
}

/// `v = f()`, `T v = f()`, `v = f().prop`, `v = f().g().prop`
pub fn is_bound_to_variable(tree: &SyntaxTree, call: NodeId, resolver: &dyn Resolve) -> bool {
    let mut current = call;
    for _ in 0..MAX_ANCESTOR_DEPTH {
        let Some((child, parent)) = ascend(tree, current) else {
            return false;
        };
        match tree.kind(parent) {
            Some(NodeKind::MemberAccess { .. }) => current = parent,
            Some(NodeKind::Call { callee, .. }) if *callee == child => current = parent,
            Some(NodeKind::Assignment { target, value, .. }) => {
                return *value == child && resolver.resolve_variable(*target).is_some();
            }
            Some(NodeKind::VariableDeclarator { init, .. }) => return *init == Some(child),
            _ => return false,
        }
    }
    false
}

/// The nearest statement around `call` is a `return`
pub fn is_returned(tree: &SyntaxTree, call: NodeId) -> bool {
    tree.ancestors(call)
        .find(|&a| tree.kind(a).is_some_and(NodeKind::is_statement))
        .is_some_and(|stmt| matches!(tree.kind(stmt), Some(NodeKind::Return { .. })))
}

/// `g(f())`, `x.g(f())`
pub fn is_passed_as_argument(tree: &SyntaxTree, call: NodeId) -> bool {
    let Some((_, parent)) = ascend(tree, call) else {
        return false;
    };
    if !matches!(tree.kind(parent), Some(NodeKind::ArgumentList { .. })) {
        return false;
    }
    tree.parent(parent)
        .is_some_and(|owner| matches!(tree.kind(owner), Some(NodeKind::Call { .. })))
}
