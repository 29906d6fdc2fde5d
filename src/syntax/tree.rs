//! Arena-backed syntax tree with parent links

use super::parser::{ParseError, Parser};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::fs;
use std::path::Path;

/// Index of a node inside its [`SyntaxTree`]
pub type NodeId = usize;

/// Upper bound on any upward walk through parent links
pub const MAX_ANCESTOR_DEPTH: usize = 256;

/// Byte range in the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A type as written in source, e.g. `Call<Void>` or `String[]`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TypeName {
    /// Dotted base name without type arguments (`retrofit2.Call`, `Map.Entry`, `int`)
    pub name: String,
    /// Type arguments of the last segment
    pub args: Vec<TypeName>,
    /// Array dimensions
    pub dims: usize,
}

const PRIMITIVES: &[&str] = &[
    "boolean", "byte", "char", "short", "int", "long", "float", "double", "void",
];

impl TypeName {
    pub fn simple(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            args: Vec::new(),
            dims: 0,
        }
    }

    pub fn is_primitive(&self) -> bool {
        self.dims == 0 && PRIMITIVES.contains(&self.name.as_str())
    }

    /// `var` in a local declaration: the type comes from the initializer
    pub fn is_inferred(&self) -> bool {
        self.name == "var" && self.args.is_empty() && self.dims == 0
    }
}

impl fmt::Display for TypeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if !self.args.is_empty() {
            write!(f, "<")?;
            for (i, arg) in self.args.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", arg)?;
            }
            write!(f, ">")?;
        }
        for _ in 0..self.dims {
            write!(f, "[]")?;
        }
        Ok(())
    }
}

/// An import declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Import {
    /// Imported path without the trailing `.*`
    pub path: String,
    /// `import pkg.*;`
    pub on_demand: bool,
    /// `import static ...;`
    pub is_static: bool,
}

/// Kind of a type declaration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeKind {
    Class,
    Interface,
    Enum,
    Record,
    Annotation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiteralKind {
    Int,
    Float,
    Char,
    String,
    TextBlock,
    Bool,
    Null,
}

/// Closed set of node kinds produced by the parser.
///
/// Child references are stored inline; [`NodeKind::children`] lists them so
/// the arena can wire parent links on allocation.
#[derive(Debug, Clone)]
pub enum NodeKind {
    // Declarations
    CompilationUnit {
        package: Option<String>,
        imports: Vec<Import>,
        types: Vec<NodeId>,
    },
    TypeDecl {
        kind: TypeKind,
        name: String,
        annotations: Vec<NodeId>,
        supertypes: Vec<TypeName>,
        /// Record components (parameters of the record header)
        components: Vec<NodeId>,
        members: Vec<NodeId>,
    },
    Method {
        name: String,
        annotations: Vec<NodeId>,
        /// `None` for constructors
        return_type: Option<TypeName>,
        params: Vec<NodeId>,
        body: Option<NodeId>,
    },
    Field {
        annotations: Vec<NodeId>,
        ty: TypeName,
        declarators: Vec<NodeId>,
    },
    Parameter {
        annotations: Vec<NodeId>,
        /// `None` for untyped lambda parameters
        ty: Option<TypeName>,
        name: String,
        varargs: bool,
    },
    Initializer {
        is_static: bool,
        body: NodeId,
    },
    EnumConstant {
        name: String,
        annotations: Vec<NodeId>,
        args: Option<NodeId>,
        members: Vec<NodeId>,
    },
    Annotation {
        name: String,
        args: Vec<NodeId>,
    },
    ElementValue {
        name: String,
        value: NodeId,
    },

    // Statements
    Block {
        statements: Vec<NodeId>,
    },
    LocalVariable {
        annotations: Vec<NodeId>,
        ty: TypeName,
        declarators: Vec<NodeId>,
    },
    VariableDeclarator {
        name: String,
        dims: usize,
        init: Option<NodeId>,
    },
    ExpressionStatement {
        expr: NodeId,
    },
    Return {
        value: Option<NodeId>,
    },
    If {
        condition: NodeId,
        then_branch: NodeId,
        else_branch: Option<NodeId>,
    },
    While {
        condition: NodeId,
        body: NodeId,
    },
    DoWhile {
        body: NodeId,
        condition: NodeId,
    },
    For {
        init: Vec<NodeId>,
        condition: Option<NodeId>,
        update: Vec<NodeId>,
        body: NodeId,
    },
    ForEach {
        variable: NodeId,
        iterable: NodeId,
        body: NodeId,
    },
    Try {
        resources: Vec<NodeId>,
        body: NodeId,
        catches: Vec<NodeId>,
        finally: Option<NodeId>,
    },
    Catch {
        parameter: NodeId,
        body: NodeId,
    },
    Throw {
        value: NodeId,
    },
    Yield {
        value: NodeId,
    },
    Switch {
        selector: NodeId,
        cases: Vec<NodeId>,
        is_expression: bool,
    },
    SwitchCase {
        labels: Vec<NodeId>,
        is_default: bool,
        arrow: bool,
        body: Vec<NodeId>,
    },
    Labeled {
        label: String,
        body: NodeId,
    },
    Synchronized {
        lock: NodeId,
        body: NodeId,
    },
    Assert {
        condition: NodeId,
        message: Option<NodeId>,
    },
    Break {
        label: Option<String>,
    },
    Continue {
        label: Option<String>,
    },
    Empty,

    // Expressions
    Literal {
        kind: LiteralKind,
        text: String,
    },
    Name {
        name: String,
    },
    This,
    Super,
    MemberAccess {
        receiver: NodeId,
        member: String,
    },
    Call {
        callee: NodeId,
        args: NodeId,
    },
    ArgumentList {
        args: Vec<NodeId>,
    },
    NewObject {
        ty: TypeName,
        outer: Option<NodeId>,
        args: NodeId,
        body: Option<Vec<NodeId>>,
    },
    NewArray {
        ty: TypeName,
        dimensions: Vec<NodeId>,
        init: Option<NodeId>,
    },
    ArrayInit {
        elements: Vec<NodeId>,
    },
    ArrayAccess {
        array: NodeId,
        index: NodeId,
    },
    Assignment {
        op: String,
        target: NodeId,
        value: NodeId,
    },
    Binary {
        op: String,
        lhs: NodeId,
        rhs: NodeId,
    },
    Unary {
        op: String,
        operand: NodeId,
        postfix: bool,
    },
    Conditional {
        condition: NodeId,
        then_value: NodeId,
        else_value: NodeId,
    },
    Cast {
        ty: TypeName,
        expr: NodeId,
    },
    InstanceOf {
        expr: NodeId,
        ty: TypeName,
        binding: Option<String>,
    },
    Parenthesized {
        inner: NodeId,
    },
    Lambda {
        params: Vec<NodeId>,
        body: NodeId,
    },
    MethodRef {
        target: NodeId,
        name: String,
    },
    ClassLiteral {
        ty: TypeName,
    },
    TypeExpr {
        ty: TypeName,
    },
}

impl NodeKind {
    /// Direct children in source order
    pub fn children(&self) -> Vec<NodeId> {
        use NodeKind::*;
        let mut out = Vec::new();
        match self {
            CompilationUnit { types, .. } => out.extend(types),
            TypeDecl {
                annotations,
                components,
                members,
                ..
            } => {
                out.extend(annotations);
                out.extend(components);
                out.extend(members);
            }
            Method {
                annotations,
                params,
                body,
                ..
            } => {
                out.extend(annotations);
                out.extend(params);
                out.extend(body);
            }
            Field {
                annotations,
                declarators,
                ..
            }
            | LocalVariable {
                annotations,
                declarators,
                ..
            } => {
                out.extend(annotations);
                out.extend(declarators);
            }
            Parameter { annotations, .. } => out.extend(annotations),
            Initializer { body, .. } => out.push(*body),
            EnumConstant {
                annotations,
                args,
                members,
                ..
            } => {
                out.extend(annotations);
                out.extend(args);
                out.extend(members);
            }
            Annotation { args, .. } => out.extend(args),
            ElementValue { value, .. } => out.push(*value),
            Block { statements } => out.extend(statements),
            VariableDeclarator { init, .. } => out.extend(init),
            ExpressionStatement { expr } => out.push(*expr),
            Return { value } => out.extend(value),
            If {
                condition,
                then_branch,
                else_branch,
            } => {
                out.push(*condition);
                out.push(*then_branch);
                out.extend(else_branch);
            }
            While { condition, body } => {
                out.push(*condition);
                out.push(*body);
            }
            DoWhile { body, condition } => {
                out.push(*body);
                out.push(*condition);
            }
            For {
                init,
                condition,
                update,
                body,
            } => {
                out.extend(init);
                out.extend(condition);
                out.extend(update);
                out.push(*body);
            }
            ForEach {
                variable,
                iterable,
                body,
            } => {
                out.push(*variable);
                out.push(*iterable);
                out.push(*body);
            }
            Try {
                resources,
                body,
                catches,
                finally,
            } => {
                out.extend(resources);
                out.push(*body);
                out.extend(catches);
                out.extend(finally);
            }
            Catch { parameter, body } => {
                out.push(*parameter);
                out.push(*body);
            }
            Throw { value } | Yield { value } => out.push(*value),
            Switch {
                selector, cases, ..
            } => {
                out.push(*selector);
                out.extend(cases);
            }
            SwitchCase { labels, body, .. } => {
                out.extend(labels);
                out.extend(body);
            }
            Labeled { body, .. } => out.push(*body),
            Synchronized { lock, body } => {
                out.push(*lock);
                out.push(*body);
            }
            Assert { condition, message } => {
                out.push(*condition);
                out.extend(message);
            }
            Break { .. } | Continue { .. } | Empty => {}
            Literal { .. } | Name { .. } | This | Super | ClassLiteral { .. } | TypeExpr { .. } => {}
            MemberAccess { receiver, .. } => out.push(*receiver),
            Call { callee, args } => {
                out.push(*callee);
                out.push(*args);
            }
            ArgumentList { args } => out.extend(args),
            NewObject {
                outer, args, body, ..
            } => {
                out.extend(outer);
                out.push(*args);
                if let Some(members) = body {
                    out.extend(members);
                }
            }
            NewArray {
                dimensions, init, ..
            } => {
                out.extend(dimensions);
                out.extend(init);
            }
            ArrayInit { elements } => out.extend(elements),
            ArrayAccess { array, index } => {
                out.push(*array);
                out.push(*index);
            }
            Assignment { target, value, .. } => {
                out.push(*target);
                out.push(*value);
            }
            Binary { lhs, rhs, .. } => {
                out.push(*lhs);
                out.push(*rhs);
            }
            Unary { operand, .. } => out.push(*operand),
            Conditional {
                condition,
                then_value,
                else_value,
            } => {
                out.push(*condition);
                out.push(*then_value);
                out.push(*else_value);
            }
            Cast { expr, .. } | InstanceOf { expr, .. } => out.push(*expr),
            Parenthesized { inner } => out.push(*inner),
            Lambda { params, body } => {
                out.extend(params);
                out.push(*body);
            }
            MethodRef { target, .. } => out.push(*target),
        }
        out
    }

    /// Statement-level nodes: the boundary for "enclosing statement" walks
    pub fn is_statement(&self) -> bool {
        use NodeKind::*;
        match self {
            Block { .. }
            | LocalVariable { .. }
            | ExpressionStatement { .. }
            | Return { .. }
            | If { .. }
            | While { .. }
            | DoWhile { .. }
            | For { .. }
            | ForEach { .. }
            | Try { .. }
            | Throw { .. }
            | Yield { .. }
            | Labeled { .. }
            | Synchronized { .. }
            | Assert { .. }
            | Break { .. }
            | Continue { .. }
            | Empty => true,
            Switch { is_expression, .. } => !is_expression,
            _ => false,
        }
    }

    /// Declarations that can carry suppression annotations
    pub fn annotations(&self) -> &[NodeId] {
        match self {
            NodeKind::TypeDecl { annotations, .. }
            | NodeKind::Method { annotations, .. }
            | NodeKind::Field { annotations, .. }
            | NodeKind::LocalVariable { annotations, .. }
            | NodeKind::Parameter { annotations, .. }
            | NodeKind::EnumConstant { annotations, .. } => annotations,
            _ => &[],
        }
    }

    /// Short tag for logs and test failure messages
    pub fn tag(&self) -> &'static str {
        use NodeKind::*;
        match self {
            CompilationUnit { .. } => "compilation-unit",
            TypeDecl { .. } => "type",
            Method { .. } => "method",
            Field { .. } => "field",
            Parameter { .. } => "parameter",
            Initializer { .. } => "initializer",
            EnumConstant { .. } => "enum-constant",
            Annotation { .. } => "annotation",
            ElementValue { .. } => "element-value",
            Block { .. } => "block",
            LocalVariable { .. } => "local-variable",
            VariableDeclarator { .. } => "declarator",
            ExpressionStatement { .. } => "expression-statement",
            Return { .. } => "return",
            If { .. } => "if",
            While { .. } => "while",
            DoWhile { .. } => "do",
            For { .. } => "for",
            ForEach { .. } => "for-each",
            Try { .. } => "try",
            Catch { .. } => "catch",
            Throw { .. } => "throw",
            Yield { .. } => "yield",
            Switch { .. } => "switch",
            SwitchCase { .. } => "case",
            Labeled { .. } => "labeled",
            Synchronized { .. } => "synchronized",
            Assert { .. } => "assert",
            Break { .. } => "break",
            Continue { .. } => "continue",
            Empty => "empty",
            Literal { .. } => "literal",
            Name { .. } => "name",
            This => "this",
            Super => "super",
            MemberAccess { .. } => "member-access",
            Call { .. } => "call",
            ArgumentList { .. } => "arguments",
            NewObject { .. } => "new",
            NewArray { .. } => "new-array",
            ArrayInit { .. } => "array-init",
            ArrayAccess { .. } => "array-access",
            Assignment { .. } => "assignment",
            Binary { .. } => "binary",
            Unary { .. } => "unary",
            Conditional { .. } => "conditional",
            Cast { .. } => "cast",
            InstanceOf { .. } => "instanceof",
            Parenthesized { .. } => "parenthesized",
            Lambda { .. } => "lambda",
            MethodRef { .. } => "method-ref",
            ClassLiteral { .. } => "class-literal",
            TypeExpr { .. } => "type-expr",
        }
    }
}

/// A node in the arena
#[derive(Debug, Clone)]
pub struct SyntaxNode {
    pub kind: NodeKind,
    /// Parent node (None for the compilation unit)
    pub parent: Option<NodeId>,
    pub span: Span,
}

/// Inline disable directive
#[derive(Debug, Clone)]
pub struct InlineDisable {
    /// If empty, all rules are disabled
    pub rules: HashSet<String>,
    /// Whether this affects the next line (vs current line)
    pub next_line: bool,
}

/// Node storage used while parsing. Allocation wires the parent link of
/// every child named by the new node's kind.
#[derive(Debug, Default)]
pub(crate) struct NodeArena {
    nodes: Vec<SyntaxNode>,
}

impl NodeArena {
    pub(crate) fn alloc(&mut self, kind: NodeKind, span: Span) -> NodeId {
        let id = self.nodes.len();
        for child in kind.children() {
            if let Some(node) = self.nodes.get_mut(child) {
                node.parent = Some(id);
            }
        }
        self.nodes.push(SyntaxNode {
            kind,
            parent: None,
            span,
        });
        id
    }

    pub(crate) fn into_nodes(self) -> Vec<SyntaxNode> {
        self.nodes
    }
}

static DISABLE_DIRECTIVE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?://|/\*)\s*endpoint-lint-disable(-next-line)?([\w\-, \t]*)")
        .expect("directive pattern is valid")
});

const SUPPRESS_ANNOTATIONS: &[&str] = &["SuppressWarnings", "SuppressLint"];

/// A parsed compilation unit
#[derive(Debug)]
pub struct SyntaxTree {
    /// The source content (for error reporting)
    pub source: String,
    nodes: Vec<SyntaxNode>,
    root: NodeId,
    line_starts: Vec<usize>,
    /// Inline disable directives: line -> set of disabled rule IDs (empty = all)
    pub inline_disables: HashMap<usize, InlineDisable>,
}

impl SyntaxTree {
    /// Parse a Java source file
    pub fn parse_file(path: &Path) -> Result<Self, ParseError> {
        let source = fs::read_to_string(path)?;
        Self::parse_str(&source)
    }

    /// Parse Java source from a string
    pub fn parse_str(source: &str) -> Result<Self, ParseError> {
        let (nodes, root) = Parser::new(source)?.parse_compilation_unit()?;
        Ok(Self {
            source: source.to_string(),
            nodes,
            root,
            line_starts: line_starts(source),
            inline_disables: Self::parse_inline_disables(source),
        })
    }

    /// Parse inline disable comments from source
    /// Supports:
    /// - // endpoint-lint-disable - disable all rules for this line
    /// - // endpoint-lint-disable RuleId - disable specific rule
    /// - // endpoint-lint-disable Rule1, Rule2 - disable multiple rules
    /// - // endpoint-lint-disable-next-line [rules] - same, for the next line
    fn parse_inline_disables(source: &str) -> HashMap<usize, InlineDisable> {
        let mut disables = HashMap::new();

        for (line_num, line) in source.lines().enumerate() {
            let line_num = line_num + 1; // 1-based

            for cap in DISABLE_DIRECTIVE.captures_iter(line) {
                let is_next_line = cap.get(1).is_some();
                let rules_str = cap.get(2).map(|m| m.as_str()).unwrap_or("");

                let rules: HashSet<String> = rules_str
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect();

                let target_line = if is_next_line { line_num + 1 } else { line_num };

                disables.insert(
                    target_line,
                    InlineDisable {
                        rules,
                        next_line: is_next_line,
                    },
                );
            }
        }

        disables
    }

    /// Check if a rule is disabled at a specific line
    pub fn is_rule_disabled_at_line(&self, rule_id: &str, line: usize) -> bool {
        if let Some(disable) = self.inline_disables.get(&line) {
            // Empty rules set means all rules are disabled
            if disable.rules.is_empty() {
                return true;
            }
            return disable.rules.contains(rule_id);
        }
        false
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Get node by index
    pub fn get(&self, id: NodeId) -> Option<&SyntaxNode> {
        self.nodes.get(id)
    }

    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.nodes.get(id).map(|n| &n.kind)
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(id).and_then(|n| n.parent)
    }

    pub fn span(&self, id: NodeId) -> Span {
        self.nodes.get(id).map(|n| n.span).unwrap_or_default()
    }

    /// Source text covered by a node
    pub fn text(&self, id: NodeId) -> &str {
        let span = self.span(id);
        self.source.get(span.start..span.end).unwrap_or("")
    }

    /// Proper ancestors, nearest first, capped at [`MAX_ANCESTOR_DEPTH`]
    pub fn ancestors(&self, id: NodeId) -> Ancestors<'_> {
        Ancestors {
            tree: self,
            next: self.parent(id),
            remaining: MAX_ANCESTOR_DEPTH,
        }
    }

    /// Iterate over all nodes
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &SyntaxNode)> {
        self.nodes.iter().enumerate()
    }

    /// All call expressions in source order; an outer call precedes the
    /// calls nested in its receiver
    pub fn calls(&self) -> Vec<NodeId> {
        let mut calls: Vec<NodeId> = self
            .iter()
            .filter(|(_, n)| matches!(n.kind, NodeKind::Call { .. }))
            .map(|(id, _)| id)
            .collect();
        calls.sort_by_key(|&id| {
            let span = self.span(id);
            (span.start, std::cmp::Reverse(span.end))
        });
        calls
    }

    /// Package declared by this unit
    pub fn package(&self) -> Option<&str> {
        match self.kind(self.root) {
            Some(NodeKind::CompilationUnit { package, .. }) => package.as_deref(),
            _ => None,
        }
    }

    pub fn imports(&self) -> &[Import] {
        match self.kind(self.root) {
            Some(NodeKind::CompilationUnit { imports, .. }) => imports,
            _ => &[],
        }
    }

    /// Innermost type declaration containing `id` (exclusive)
    pub fn enclosing_type(&self, id: NodeId) -> Option<NodeId> {
        self.ancestors(id)
            .find(|&a| matches!(self.kind(a), Some(NodeKind::TypeDecl { .. })))
    }

    /// 1-based line and column (in characters) of a byte offset
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        position(&self.line_starts, &self.source, offset)
    }

    /// Get the source line (1-based)
    pub fn get_source_line(&self, line: usize) -> Option<String> {
        self.source.lines().nth(line.saturating_sub(1)).map(|s| s.to_string())
    }

    /// Whether an enclosing declaration carries `@SuppressWarnings`/`@SuppressLint`
    /// naming `rule_id` or `"all"`
    pub fn is_suppressed(&self, id: NodeId, rule_id: &str) -> bool {
        self.ancestors(id).any(|decl| {
            self.kind(decl)
                .map(|k| k.annotations())
                .unwrap_or(&[])
                .iter()
                .any(|&ann| self.annotation_suppresses(ann, rule_id))
        })
    }

    fn annotation_suppresses(&self, ann: NodeId, rule_id: &str) -> bool {
        let Some(NodeKind::Annotation { name, args }) = self.kind(ann) else {
            return false;
        };
        let simple = name.rsplit('.').next().unwrap_or(name);
        if !SUPPRESS_ANNOTATIONS.contains(&simple) {
            return false;
        }
        let mut values = Vec::new();
        for &arg in args {
            self.collect_strings(arg, &mut values);
        }
        values.iter().any(|v| v == rule_id || v == "all")
    }

    fn collect_strings(&self, id: NodeId, out: &mut Vec<String>) {
        match self.kind(id) {
            Some(NodeKind::Literal {
                kind: LiteralKind::String,
                text,
            }) => out.push(text.trim_matches('"').to_string()),
            Some(NodeKind::ArrayInit { elements }) => {
                for &e in elements {
                    self.collect_strings(e, out);
                }
            }
            Some(NodeKind::ElementValue { value, .. }) => self.collect_strings(*value, out),
            _ => {}
        }
    }
}

/// Iterator over a node's ancestors
pub struct Ancestors<'a> {
    tree: &'a SyntaxTree,
    next: Option<NodeId>,
    remaining: usize,
}

impl Iterator for Ancestors<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if self.remaining == 0 {
            return None;
        }
        let current = self.next?;
        self.remaining -= 1;
        self.next = self.tree.parent(current);
        Some(current)
    }
}

pub(crate) fn line_starts(source: &str) -> Vec<usize> {
    std::iter::once(0)
        .chain(source.match_indices('\n').map(|(i, _)| i + 1))
        .collect()
}

/// 1-based line and character column of `offset`
pub(crate) fn position(line_starts: &[usize], source: &str, offset: usize) -> (usize, usize) {
    let line_idx = match line_starts.binary_search(&offset) {
        Ok(i) => i,
        Err(i) => i.saturating_sub(1),
    };
    let line_start = line_starts.get(line_idx).copied().unwrap_or(0);
    let column = source
        .get(line_start..offset)
        .map(|s| s.chars().count())
        .unwrap_or(0);
    (line_idx + 1, column + 1)
}
