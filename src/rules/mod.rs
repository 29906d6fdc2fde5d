//! Rule definitions and evaluation

pub mod markers;
pub mod unused_call;
pub mod usage;

pub use markers::MarkerSet;
pub use unused_call::UnusedCallObject;

use crate::Severity;

/// Identifier of the unused call object rule
pub const UNUSED_CALL_OBJECT: &str = "UnusedCallObject";

/// Static metadata describing a lint rule
#[derive(Debug, Clone)]
pub struct Rule {
    /// Unique rule identifier
    pub id: &'static str,
    /// Human-readable name
    pub name: &'static str,
    /// One-line description
    pub description: &'static str,
    /// Longer explanation shown by `--explain`
    pub explanation: &'static str,
    /// Issue category (e.g. "Correctness")
    pub category: &'static str,
    /// Priority from 1 (lowest) to 10 (highest)
    pub priority: u8,
    /// Default severity level
    pub severity: Severity,
    /// User-facing message
    pub message: &'static str,
    /// Suggested remedy attached to each diagnostic
    pub help: &'static str,
}

/// Metadata for [`UnusedCallObject`]
pub const UNUSED_CALL_OBJECT_RULE: Rule = Rule {
    id: UNUSED_CALL_OBJECT,
    name: "Unused call object",
    description: "Detects when call object is created but not used",
    explanation: "Methods annotated with an HTTP method marker (for example \
        `@GET` or `@POST`) only build a call object; no request is sent until \
        the object is executed or enqueued. Calling such a method and dropping \
        the result is almost always a mistake.",
    category: "Correctness",
    priority: 8,
    severity: Severity::Error,
    message: "Call object was created but never used.",
    help: "execute or enqueue the call, or remove the invocation",
};

static RULES: &[Rule] = &[UNUSED_CALL_OBJECT_RULE];

/// All built-in rules
pub fn all_rules() -> &'static [Rule] {
    RULES
}

/// Look up a rule by identifier (case-insensitive)
pub fn find_rule(id: &str) -> Option<&'static Rule> {
    RULES.iter().find(|r| r.id.eq_ignore_ascii_case(id))
}
