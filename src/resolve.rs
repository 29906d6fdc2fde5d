//! Name and type resolution over the parsed sources
//!
//! Resolution is by simple name and arity across every unit handed to
//! [`ProjectIndex::build`], narrowed by argument types when a name is
//! overloaded. It binds a call to the method it names and an
//! assignment target to the variable it writes; anything it cannot bind is
//! reported as unresolved and the caller skips it.

use crate::syntax::{Import, LiteralKind, NodeId, NodeKind, SyntaxTree, TypeKind, TypeName};
use log::{debug, trace};
use std::collections::{HashMap, HashSet, VecDeque};

/// Types and annotations visible without an import
const JAVA_LANG: &[&str] = &[
    "AutoCloseable",
    "Boolean",
    "Byte",
    "CharSequence",
    "Character",
    "Class",
    "Comparable",
    "Deprecated",
    "Double",
    "Enum",
    "Error",
    "Exception",
    "Float",
    "FunctionalInterface",
    "Integer",
    "Iterable",
    "Long",
    "Math",
    "Number",
    "Object",
    "Override",
    "Record",
    "Runnable",
    "RuntimeException",
    "SafeVarargs",
    "Short",
    "String",
    "StringBuilder",
    "SuppressWarnings",
    "System",
    "Thread",
    "Throwable",
    "Void",
];

/// Bound on nested type inference (`var` chains, receivers of receivers)
const MAX_TYPE_DEPTH: usize = 32;

/// A method or constructor as seen by callers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    /// Qualified name of the declaring type
    pub owner: String,
    pub name: String,
    /// Number of declared parameters
    pub params: usize,
    /// Qualified parameter types; the last is the element type when `varargs`
    pub param_types: Vec<String>,
    pub varargs: bool,
    /// Qualified return type; `None` for constructors
    pub return_type: Option<String>,
    /// Qualified names of the annotations on the declaration
    pub annotations: Vec<String>,
}

impl Declaration {
    /// Whether a call with `arity` arguments can bind to this declaration
    pub fn accepts(&self, arity: usize) -> bool {
        if self.varargs {
            arity + 1 >= self.params
        } else {
            arity == self.params
        }
    }

    /// Declared type of the parameter receiving argument `position`
    fn param_type(&self, position: usize) -> Option<&str> {
        let last = self.param_types.len().checked_sub(1)?;
        let i = if self.varargs { position.min(last) } else { position };
        self.param_types.get(i).map(String::as_str)
    }
}

/// Members of one declared type
#[derive(Debug, Clone)]
pub struct TypeInfo {
    pub qualified_name: String,
    pub kind: TypeKind,
    /// Qualified `extends`/`implements` targets
    pub supertypes: Vec<String>,
    pub methods: Vec<Declaration>,
    /// Field name -> qualified type
    pub fields: HashMap<String, String>,
}

impl TypeInfo {
    fn new(qualified_name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            qualified_name: qualified_name.into(),
            kind,
            supertypes: Vec::new(),
            methods: Vec::new(),
            fields: HashMap::new(),
        }
    }
}

/// Every type declared across the analyzed and context sources
#[derive(Debug, Default)]
pub struct ProjectIndex {
    types: HashMap<String, TypeInfo>,
}

impl ProjectIndex {
    /// Index the given units. Type names are collected first so that member
    /// signatures can be qualified against the whole project.
    pub fn build<'t>(trees: impl IntoIterator<Item = &'t SyntaxTree>) -> Self {
        let trees: Vec<&SyntaxTree> = trees.into_iter().collect();
        let contexts: Vec<FileContext> = trees.iter().map(|tree| FileContext::new(tree)).collect();

        let mut index = ProjectIndex::default();
        for (tree, context) in trees.iter().zip(&contexts) {
            for (&node, name) in &context.decl_names {
                if let Some(NodeKind::TypeDecl { kind, .. }) = tree.kind(node) {
                    index
                        .types
                        .entry(name.clone())
                        .or_insert_with(|| TypeInfo::new(name.clone(), *kind));
                }
            }
        }

        let mut filled = Vec::new();
        for (tree, context) in trees.iter().zip(&contexts) {
            for (&node, name) in &context.decl_names {
                filled.push(context.type_info(tree, node, name, &index));
            }
        }
        for info in filled {
            index.types.insert(info.qualified_name.clone(), info);
        }

        debug!("Indexed {} types from {} units", index.types.len(), trees.len());
        index
    }

    pub fn get(&self, qualified_name: &str) -> Option<&TypeInfo> {
        self.types.get(qualified_name)
    }

    pub fn contains(&self, qualified_name: &str) -> bool {
        self.types.contains_key(qualified_name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// `owner` followed by its supertypes, breadth first, each visited once
    fn hierarchy<'s>(&'s self, owner: &str) -> Vec<&'s TypeInfo> {
        let mut out = Vec::new();
        let Some(first) = self.types.get(owner) else {
            return out;
        };
        let mut seen: HashSet<&str> = HashSet::new();
        let mut queue = VecDeque::from([first]);
        seen.insert(first.qualified_name.as_str());
        while let Some(info) = queue.pop_front() {
            out.push(info);
            for sup in &info.supertypes {
                if seen.insert(sup.as_str()) {
                    if let Some(next) = self.types.get(sup) {
                        queue.push_back(next);
                    }
                }
            }
        }
        out
    }

    /// Every method named `name` taking `arity` arguments on `owner` or its
    /// supertypes. An override hides the supertype declaration it replaces.
    pub fn find_methods(&self, owner: &str, name: &str, arity: usize) -> Vec<&Declaration> {
        let mut out: Vec<&Declaration> = Vec::new();
        for info in self.hierarchy(owner) {
            for m in &info.methods {
                if m.name != name || m.return_type.is_none() || !m.accepts(arity) {
                    continue;
                }
                if !out.iter().any(|o| o.param_types == m.param_types) {
                    out.push(m);
                }
            }
        }
        out
    }

    /// Find a field on `owner` or its supertypes: (declaring type, field type)
    pub fn find_field(&self, owner: &str, name: &str) -> Option<(&str, &str)> {
        self.hierarchy(owner).into_iter().find_map(|info| {
            info.fields
                .get(name)
                .map(|ty| (info.qualified_name.as_str(), ty.as_str()))
        })
    }
}

/// Per-file naming context: package, imports and the types declared here
#[derive(Debug, Clone, Default)]
pub struct FileContext {
    package: Option<String>,
    imports: Vec<Import>,
    /// Type declaration node -> qualified name
    decl_names: HashMap<NodeId, String>,
    /// Simple name -> qualified name, first declaration wins
    declared: HashMap<String, String>,
}

impl FileContext {
    pub fn new(tree: &SyntaxTree) -> Self {
        let package = tree.package().map(str::to_string);
        let mut decl_names = HashMap::new();
        let mut declared = HashMap::new();

        for (id, node) in tree.iter() {
            let NodeKind::TypeDecl { name, .. } = &node.kind else {
                continue;
            };
            let mut path: Vec<&str> = tree
                .ancestors(id)
                .filter_map(|a| match tree.kind(a) {
                    Some(NodeKind::TypeDecl { name, .. }) => Some(name.as_str()),
                    _ => None,
                })
                .collect();
            path.reverse();
            path.push(name);
            let local = path.join(".");
            let qualified = match &package {
                Some(pkg) => format!("{}.{}", pkg, local),
                None => local,
            };
            declared.entry(name.clone()).or_insert_with(|| qualified.clone());
            decl_names.insert(id, qualified);
        }

        Self {
            package,
            imports: tree.imports().to_vec(),
            decl_names,
            declared,
        }
    }

    /// Qualified name of a type declaration node
    pub fn type_name(&self, decl: NodeId) -> Option<&str> {
        self.decl_names.get(&decl).map(String::as_str)
    }

    /// Qualify a type name as written at `scope`
    pub fn qualify(
        &self,
        name: &str,
        scope: Option<NodeId>,
        tree: &SyntaxTree,
        index: &ProjectIndex,
    ) -> String {
        if !name.contains('.') {
            return self
                .qualify_simple(name, scope, tree, index)
                .unwrap_or_else(|| self.fallback(name));
        }
        if index.contains(name) {
            return name.to_string();
        }
        let (head, rest) = name.split_once('.').unwrap_or((name, ""));
        // lower-case head: a package, so the name is already qualified
        if head.chars().next().is_some_and(char::is_lowercase) {
            return name.to_string();
        }
        match self.qualify_simple(head, scope, tree, index) {
            Some(outer) => format!("{}.{}", outer, rest),
            None => name.to_string(),
        }
    }

    /// Qualify a [`TypeName`], keeping array dimensions
    pub fn qualify_type(
        &self,
        ty: &TypeName,
        scope: Option<NodeId>,
        tree: &SyntaxTree,
        index: &ProjectIndex,
    ) -> String {
        let base = if ty.is_primitive() || ty.name == "void" {
            ty.name.clone()
        } else {
            self.qualify(&ty.name, scope, tree, index)
        };
        let mut out = base;
        for _ in 0..ty.dims {
            out.push_str("[]");
        }
        out
    }

    fn qualify_simple(
        &self,
        name: &str,
        scope: Option<NodeId>,
        tree: &SyntaxTree,
        index: &ProjectIndex,
    ) -> Option<String> {
        // enclosing types and their member types, innermost first
        if let Some(scope) = scope {
            for decl in std::iter::once(scope).chain(tree.ancestors(scope)) {
                let Some(qualified) = self.decl_names.get(&decl) else {
                    continue;
                };
                if qualified.rsplit('.').next() == Some(name) {
                    return Some(qualified.clone());
                }
                let member = format!("{}.{}", qualified, name);
                if index.contains(&member) || self.decl_names.values().any(|q| *q == member) {
                    return Some(member);
                }
            }
        }

        if let Some(qualified) = self.declared.get(name) {
            return Some(qualified.clone());
        }

        let suffix = format!(".{}", name);
        if let Some(import) = self
            .imports
            .iter()
            .find(|i| !i.is_static && !i.on_demand && i.path.ends_with(&suffix))
        {
            return Some(import.path.clone());
        }

        if let Some(pkg) = &self.package {
            let candidate = format!("{}.{}", pkg, name);
            if index.contains(&candidate) {
                return Some(candidate);
            }
        }

        let on_demand: Vec<&Import> = self
            .imports
            .iter()
            .filter(|i| !i.is_static && i.on_demand)
            .collect();
        if let Some(hit) = on_demand
            .iter()
            .map(|i| format!("{}.{}", i.path, name))
            .find(|candidate| index.contains(candidate))
        {
            return Some(hit);
        }

        if JAVA_LANG.contains(&name) {
            return Some(format!("java.lang.{}", name));
        }

        if let [only] = on_demand.as_slice() {
            return Some(format!("{}.{}", only.path, name));
        }

        None
    }

    fn fallback(&self, name: &str) -> String {
        match &self.package {
            Some(pkg) => format!("{}.{}", pkg, name),
            None => name.to_string(),
        }
    }

    fn annotation_names(
        &self,
        annotations: &[NodeId],
        scope: NodeId,
        tree: &SyntaxTree,
        index: &ProjectIndex,
    ) -> Vec<String> {
        annotations
            .iter()
            .filter_map(|&a| match tree.kind(a) {
                Some(NodeKind::Annotation { name, .. }) => {
                    Some(self.qualify(name, Some(scope), tree, index))
                }
                _ => None,
            })
            .collect()
    }

    fn type_info(
        &self,
        tree: &SyntaxTree,
        node: NodeId,
        qualified_name: &str,
        index: &ProjectIndex,
    ) -> TypeInfo {
        let Some(NodeKind::TypeDecl {
            kind,
            supertypes,
            components,
            members,
            ..
        }) = tree.kind(node)
        else {
            return TypeInfo::new(qualified_name, TypeKind::Class);
        };

        let mut info = TypeInfo::new(qualified_name, *kind);
        info.supertypes = supertypes
            .iter()
            .map(|t| self.qualify(&t.name, Some(node), tree, index))
            .collect();

        for &member in members {
            match tree.kind(member) {
                Some(NodeKind::Method {
                    name,
                    annotations,
                    return_type,
                    params,
                    ..
                }) => {
                    let varargs = params.last().is_some_and(|&p| {
                        matches!(tree.kind(p), Some(NodeKind::Parameter { varargs: true, .. }))
                    });
                    let param_types = params
                        .iter()
                        .map(|&p| match tree.kind(p) {
                            Some(NodeKind::Parameter { ty: Some(ty), .. }) => {
                                self.qualify_type(ty, Some(member), tree, index)
                            }
                            _ => String::new(),
                        })
                        .collect();
                    info.methods.push(Declaration {
                        owner: qualified_name.to_string(),
                        name: name.clone(),
                        params: params.len(),
                        param_types,
                        varargs,
                        return_type: return_type
                            .as_ref()
                            .map(|t| self.qualify_type(t, Some(member), tree, index)),
                        annotations: self.annotation_names(annotations, member, tree, index),
                    });
                }
                Some(NodeKind::Field {
                    ty, declarators, ..
                }) => {
                    for &d in declarators {
                        if let Some(NodeKind::VariableDeclarator { name, dims, .. }) = tree.kind(d) {
                            let mut field_ty = self.qualify_type(ty, Some(node), tree, index);
                            for _ in 0..*dims {
                                field_ty.push_str("[]");
                            }
                            info.fields.insert(name.clone(), field_ty);
                        }
                    }
                }
                Some(NodeKind::EnumConstant { name, .. }) => {
                    info.fields.insert(name.clone(), qualified_name.to_string());
                }
                _ => {}
            }
        }

        // record components: a private field plus an accessor unless declared
        for &component in components {
            if let Some(NodeKind::Parameter {
                name, ty: Some(ty), ..
            }) = tree.kind(component)
            {
                let component_ty = self.qualify_type(ty, Some(node), tree, index);
                info.fields.insert(name.clone(), component_ty.clone());
                if !info.methods.iter().any(|m| m.name == *name && m.params == 0) {
                    info.methods.push(Declaration {
                        owner: qualified_name.to_string(),
                        name: name.clone(),
                        params: 0,
                        param_types: Vec::new(),
                        varargs: false,
                        return_type: Some(component_ty),
                        annotations: Vec::new(),
                    });
                }
            }
        }

        info
    }
}

/// A variable an expression refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Variable {
    /// Local variable declarator or parameter node
    Local(NodeId),
    Field { owner: String, name: String },
}

/// Binding of calls and assignment targets to declarations
pub trait Resolve {
    /// The method a call expression invokes, if it can be determined
    fn resolve_call(&self, call: NodeId) -> Option<&Declaration>;

    /// The variable an expression names, if it names one
    fn resolve_variable(&self, expr: NodeId) -> Option<Variable>;
}

/// What a simple name is bound to at a given point
#[derive(Debug, Clone)]
enum Binding {
    Local(NodeId),
    Field { owner: String, ty: String },
}

/// Resolver for the nodes of one syntax tree
pub struct FileResolver<'a> {
    tree: &'a SyntaxTree,
    index: &'a ProjectIndex,
    context: FileContext,
}

impl<'a> FileResolver<'a> {
    pub fn new(tree: &'a SyntaxTree, index: &'a ProjectIndex) -> Self {
        Self {
            tree,
            index,
            context: FileContext::new(tree),
        }
    }

    /// Qualified static type of an expression, when it can be inferred
    pub fn type_of(&self, expr: NodeId) -> Option<String> {
        self.type_of_at(expr, 0)
    }

    fn type_of_at(&self, expr: NodeId, depth: usize) -> Option<String> {
        if depth > MAX_TYPE_DEPTH {
            return None;
        }
        let next = depth + 1;
        match self.tree.kind(expr)? {
            NodeKind::Parenthesized { inner } => self.type_of_at(*inner, next),
            NodeKind::Name { name } => match self.lookup(expr, name) {
                Some(binding) => self.binding_type(&binding, next),
                None => self.type_named(name, expr),
            },
            NodeKind::This => self.enclosing_type_name(expr).map(str::to_string),
            NodeKind::Super => {
                let own = self.enclosing_type_name(expr)?;
                self.index.get(own)?.supertypes.first().cloned()
            }
            NodeKind::MemberAccess { receiver, member } => {
                if member == "this" {
                    return self.type_named(&compact(self.tree.text(*receiver)), expr);
                }
                match self.type_of_at(*receiver, next) {
                    Some(owner) => {
                        if let Some((_, ty)) = self.index.find_field(&owner, member) {
                            return Some(ty.to_string());
                        }
                        let nested = format!("{}.{}", owner, member);
                        self.index.contains(&nested).then_some(nested)
                    }
                    None => {
                        let dotted = compact(self.tree.text(expr));
                        self.index.contains(&dotted).then_some(dotted)
                    }
                }
            }
            NodeKind::Call { .. } => self
                .resolve_call_at(expr, next)
                .and_then(|decl| decl.return_type.clone()),
            NodeKind::NewObject { ty, .. } | NodeKind::Cast { ty, .. } | NodeKind::NewArray { ty, .. } => {
                Some(self.context.qualify_type(ty, Some(expr), self.tree, self.index))
            }
            NodeKind::Literal { kind, text } => literal_type(*kind, text).map(str::to_string),
            NodeKind::ClassLiteral { .. } => Some("java.lang.Class".to_string()),
            NodeKind::Conditional {
                then_value,
                else_value,
                ..
            } => self
                .type_of_at(*then_value, next)
                .or_else(|| self.type_of_at(*else_value, next)),
            NodeKind::Assignment { target, .. } => self.type_of_at(*target, next),
            NodeKind::ArrayAccess { array, .. } => self
                .type_of_at(*array, next)
                .and_then(|ty| ty.strip_suffix("[]").map(str::to_string)),
            _ => None,
        }
    }

    /// A bare name used as a receiver that is not a variable: a type
    fn type_named(&self, name: &str, scope: NodeId) -> Option<String> {
        let qualified = self.context.qualify(name, Some(scope), self.tree, self.index);
        self.index.contains(&qualified).then_some(qualified)
    }

    fn enclosing_type_name(&self, node: NodeId) -> Option<&str> {
        self.tree
            .enclosing_type(node)
            .and_then(|decl| self.context.type_name(decl))
    }

    fn binding_type(&self, binding: &Binding, depth: usize) -> Option<String> {
        match binding {
            Binding::Field { ty, .. } => Some(ty.clone()),
            Binding::Local(id) => match self.tree.kind(*id)? {
                NodeKind::Parameter { ty: Some(ty), .. } if !ty.is_inferred() => {
                    Some(self.context.qualify_type(ty, Some(*id), self.tree, self.index))
                }
                NodeKind::VariableDeclarator { dims, init, .. } => {
                    let parent = self.tree.parent(*id)?;
                    let ty = match self.tree.kind(parent)? {
                        NodeKind::LocalVariable { ty, .. } | NodeKind::Field { ty, .. } => ty,
                        _ => return None,
                    };
                    if ty.is_inferred() {
                        return init.and_then(|init| self.type_of_at(init, depth));
                    }
                    let mut out = self.context.qualify_type(ty, Some(*id), self.tree, self.index);
                    for _ in 0..*dims {
                        out.push_str("[]");
                    }
                    Some(out)
                }
                _ => None,
            },
        }
    }

    /// Bind a simple name at `from`, walking outward through local scopes
    /// and then the fields of each enclosing type
    fn lookup(&self, from: NodeId, name: &str) -> Option<Binding> {
        let mut child = from;
        for ancestor in self.tree.ancestors(from) {
            let found = match self.tree.kind(ancestor)? {
                NodeKind::Block { statements } => self.declared_before(statements, child, name),
                NodeKind::SwitchCase { body, .. } => self.declared_before(body, child, name),
                NodeKind::Method { params, .. } | NodeKind::Lambda { params, .. } => {
                    self.parameter_named(params, name)
                }
                NodeKind::Catch { parameter, .. } => self.parameter_named(&[*parameter], name),
                NodeKind::For { init, .. } => self.declared_in(init, name),
                NodeKind::ForEach { variable, .. } => self.declared_in(&[*variable], name),
                NodeKind::Try { resources, .. } => self.declared_in(resources, name),
                NodeKind::TypeDecl { .. } => {
                    let field = self
                        .context
                        .type_name(ancestor)
                        .and_then(|owner| self.index.find_field(owner, name));
                    if let Some((owner, ty)) = field {
                        return Some(Binding::Field {
                            owner: owner.to_string(),
                            ty: ty.to_string(),
                        });
                    }
                    None
                }
                _ => None,
            };
            if let Some(id) = found {
                return Some(Binding::Local(id));
            }
            child = ancestor;
        }
        None
    }

    /// Declarators named `name` among statements up to and including `child`
    fn declared_before(&self, statements: &[NodeId], child: NodeId, name: &str) -> Option<NodeId> {
        let end = statements
            .iter()
            .position(|&s| s == child)
            .map(|i| i + 1)
            .unwrap_or(statements.len());
        statements[..end]
            .iter()
            .rev()
            .find_map(|&s| self.declared_in(&[s], name))
    }

    fn declared_in(&self, nodes: &[NodeId], name: &str) -> Option<NodeId> {
        nodes.iter().find_map(|&node| match self.tree.kind(node) {
            Some(NodeKind::LocalVariable { declarators, .. }) => {
                declarators.iter().copied().find(|&d| {
                    matches!(self.tree.kind(d), Some(NodeKind::VariableDeclarator { name: n, .. }) if n == name)
                })
            }
            _ => None,
        })
    }

    fn parameter_named(&self, params: &[NodeId], name: &str) -> Option<NodeId> {
        params.iter().copied().find(|&p| {
            matches!(self.tree.kind(p), Some(NodeKind::Parameter { name: n, .. }) if n == name)
        })
    }

    fn resolve_call_at(&self, call: NodeId, depth: usize) -> Option<&'a Declaration> {
        let NodeKind::Call { callee, args } = self.tree.kind(call)? else {
            return None;
        };
        let args: &[NodeId] = match self.tree.kind(*args) {
            Some(NodeKind::ArgumentList { args }) => args,
            _ => &[],
        };

        let candidates = match self.tree.kind(*callee)? {
            NodeKind::Name { name } => self.resolve_unqualified(call, name, args.len()),
            NodeKind::MemberAccess { receiver, member } => {
                let owner = self.type_of_at(*receiver, depth)?;
                self.index.find_methods(&owner, member, args.len())
            }
            // explicit constructor invocations
            _ => Vec::new(),
        };
        let resolved = self.select_overload(candidates, args, depth);

        if resolved.is_none() {
            trace!("Unresolved call `{}`", self.tree.text(call));
        }
        resolved
    }

    /// `name(...)`: methods of enclosing types, then static imports
    fn resolve_unqualified(&self, call: NodeId, name: &str, arity: usize) -> Vec<&'a Declaration> {
        let index = self.index;
        for decl in self.tree.ancestors(call) {
            if let Some(owner) = self.context.type_name(decl) {
                let found = index.find_methods(owner, name, arity);
                if !found.is_empty() {
                    return found;
                }
            }
        }

        let suffix = format!(".{}", name);
        self.context
            .imports
            .iter()
            .filter(|i| i.is_static)
            .map(|import| {
                if import.on_demand {
                    index.find_methods(&import.path, name, arity)
                } else {
                    import
                        .path
                        .strip_suffix(&suffix)
                        .map(|owner| index.find_methods(owner, name, arity))
                        .unwrap_or_default()
                }
            })
            .find(|found| !found.is_empty())
            .unwrap_or_default()
    }

    /// Pick among overloads of one arity by the argument types that can be
    /// inferred. Candidates that survive must agree on their annotations,
    /// otherwise the call stays unresolved.
    fn select_overload(
        &self,
        candidates: Vec<&'a Declaration>,
        args: &[NodeId],
        depth: usize,
    ) -> Option<&'a Declaration> {
        if candidates.len() <= 1 {
            return candidates.into_iter().next();
        }

        let arg_types: Vec<Option<String>> = args
            .iter()
            .map(|&a| self.type_of_at(a, depth + 1))
            .collect();
        let applicable: Vec<&'a Declaration> = candidates
            .iter()
            .copied()
            .filter(|decl| self.is_applicable(decl, &arg_types))
            .collect();
        let pool = if applicable.is_empty() { candidates } else { applicable };

        let first = pool[0];
        if pool.iter().all(|d| d.annotations == first.annotations) {
            Some(first)
        } else {
            trace!(
                "Ambiguous overloads of `{}.{}` with differing annotations",
                first.owner,
                first.name
            );
            None
        }
    }

    /// Every argument whose type is known can be passed to `decl`
    fn is_applicable(&self, decl: &Declaration, arg_types: &[Option<String>]) -> bool {
        let exact_array = decl.varargs && arg_types.len() == decl.params;
        arg_types.iter().enumerate().all(|(i, arg)| {
            let (Some(arg), Some(param)) = (arg, decl.param_type(i)) else {
                return true;
            };
            if self.accepts_argument(param, arg) {
                return true;
            }
            exact_array && i + 1 == decl.params && arg == &format!("{}[]", param)
        })
    }

    /// Method invocation conversion of an `arg` typed value to `param`
    fn accepts_argument(&self, param: &str, arg: &str) -> bool {
        if param.is_empty() || param == arg || param == "java.lang.Object" {
            return true;
        }
        match (boxed(param).is_some(), boxed(arg).is_some()) {
            (true, true) => widens_to(arg, param),
            (true, false) => unboxed(arg).is_some_and(|p| p == param || widens_to(p, param)),
            (false, true) => boxed(arg).is_some_and(|b| {
                b == param || self.is_subtype(b, param).unwrap_or(false)
            }),
            (false, false) => self.is_subtype(arg, param).unwrap_or(true),
        }
    }

    /// `None` when the hierarchy of `sub` is not fully known
    fn is_subtype(&self, sub: &str, sup: &str) -> Option<bool> {
        if let Some(supertypes) = jdk_supertypes(sub) {
            return Some(supertypes.contains(&sup));
        }
        if !self.index.contains(sub) {
            return None;
        }
        let mut closed = true;
        for info in self.index.hierarchy(sub) {
            if info.qualified_name == sup {
                return Some(true);
            }
            closed &= info.supertypes.iter().all(|s| self.index.contains(s));
        }
        // type variables qualify to names nothing declares
        if !self.index.contains(sup) && !sup.starts_with("java.") {
            return None;
        }
        closed.then_some(false)
    }
}

impl Resolve for FileResolver<'_> {
    fn resolve_call(&self, call: NodeId) -> Option<&Declaration> {
        self.resolve_call_at(call, 0)
    }

    fn resolve_variable(&self, expr: NodeId) -> Option<Variable> {
        match self.tree.kind(expr)? {
            NodeKind::Parenthesized { inner } => self.resolve_variable(*inner),
            NodeKind::Name { name } => match self.lookup(expr, name)? {
                Binding::Local(id) => Some(Variable::Local(id)),
                Binding::Field { owner, .. } => Some(Variable::Field {
                    owner,
                    name: name.clone(),
                }),
            },
            NodeKind::MemberAccess { receiver, member } => {
                let owner = self.type_of(*receiver)?;
                let (declaring, _) = self.index.find_field(&owner, member)?;
                Some(Variable::Field {
                    owner: declaring.to_string(),
                    name: member.clone(),
                })
            }
            _ => None,
        }
    }
}

/// Static type of a literal; `null` has none
fn literal_type(kind: LiteralKind, text: &str) -> Option<&'static str> {
    match kind {
        LiteralKind::Int if text.ends_with(['l', 'L']) => Some("long"),
        LiteralKind::Int => Some("int"),
        LiteralKind::Float if text.ends_with(['f', 'F']) => Some("float"),
        LiteralKind::Float => Some("double"),
        LiteralKind::Char => Some("char"),
        LiteralKind::Bool => Some("boolean"),
        LiteralKind::String | LiteralKind::TextBlock => Some("java.lang.String"),
        LiteralKind::Null => None,
    }
}

fn boxed(primitive: &str) -> Option<&'static str> {
    Some(match primitive {
        "boolean" => "java.lang.Boolean",
        "byte" => "java.lang.Byte",
        "char" => "java.lang.Character",
        "short" => "java.lang.Short",
        "int" => "java.lang.Integer",
        "long" => "java.lang.Long",
        "float" => "java.lang.Float",
        "double" => "java.lang.Double",
        _ => return None,
    })
}

fn unboxed(reference: &str) -> Option<&'static str> {
    Some(match reference {
        "java.lang.Boolean" => "boolean",
        "java.lang.Byte" => "byte",
        "java.lang.Character" => "char",
        "java.lang.Short" => "short",
        "java.lang.Integer" => "int",
        "java.lang.Long" => "long",
        "java.lang.Float" => "float",
        "java.lang.Double" => "double",
        _ => return None,
    })
}

/// Widening primitive conversion
fn widens_to(from: &str, to: &str) -> bool {
    match from {
        "byte" => matches!(to, "short" | "int" | "long" | "float" | "double"),
        "short" | "char" => matches!(to, "int" | "long" | "float" | "double"),
        "int" => matches!(to, "long" | "float" | "double"),
        "long" => matches!(to, "float" | "double"),
        "float" => to == "double",
        _ => false,
    }
}

/// Supertypes of the final JDK types literals and boxing produce
fn jdk_supertypes(ty: &str) -> Option<&'static [&'static str]> {
    const STRING: &[&str] = &[
        "java.lang.CharSequence",
        "java.lang.Comparable",
        "java.io.Serializable",
        "java.lang.constant.Constable",
        "java.lang.constant.ConstantDesc",
    ];
    const NUMBER: &[&str] = &[
        "java.lang.Number",
        "java.lang.Comparable",
        "java.io.Serializable",
        "java.lang.constant.Constable",
    ];
    const OTHER: &[&str] = &[
        "java.lang.Comparable",
        "java.io.Serializable",
        "java.lang.constant.Constable",
    ];
    match ty {
        "java.lang.String" => Some(STRING),
        "java.lang.Boolean" | "java.lang.Character" => Some(OTHER),
        _ if unboxed(ty).is_some() => Some(NUMBER),
        _ => None,
    }
}

fn compact(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const API: &str = r#"package com.example;

import retrofit2.Call;
import retrofit2.http.GET;

public interface ApiInterface {
    @GET("foo")
    Call<Void> foo();

    @retrofit2.http.POST("bar")
    Call<Void> bar(String body);

    Call<Void> plain();
}
"#;

    fn parse(src: &str) -> SyntaxTree {
        SyntaxTree::parse_str(src).unwrap()
    }

    /// Resolve every call in `client` against `API` plus `extra` units,
    /// returning (call text, resolved owner.name)
    fn resolved_calls(client: &str, extra: &[&str]) -> Vec<(String, Option<String>)> {
        let mut trees = vec![parse(API), parse(client)];
        trees.extend(extra.iter().map(|s| parse(s)));
        let index = ProjectIndex::build(&trees);
        let tree = &trees[1];
        let resolver = FileResolver::new(tree, &index);
        tree.calls()
            .into_iter()
            .map(|c| {
                (
                    tree.text(c).to_string(),
                    resolver
                        .resolve_call(c)
                        .map(|d| format!("{}.{}", d.owner, d.name)),
                )
            })
            .collect()
    }

    fn lookup<'c>(calls: &'c [(String, Option<String>)], text: &str) -> Option<&'c str> {
        calls
            .iter()
            .find(|(t, _)| t == text)
            .and_then(|(_, r)| r.as_deref())
    }

    #[test]
    fn test_index_qualifies_annotations_and_return_types() {
        let trees = vec![parse(API)];
        let index = ProjectIndex::build(&trees);
        let info = index.get("com.example.ApiInterface").unwrap();
        assert_eq!(info.kind, TypeKind::Interface);

        let foo = info.methods.iter().find(|m| m.name == "foo").unwrap();
        assert_eq!(foo.annotations, vec!["retrofit2.http.GET".to_string()]);
        assert_eq!(foo.return_type.as_deref(), Some("retrofit2.Call"));

        let bar = info.methods.iter().find(|m| m.name == "bar").unwrap();
        assert_eq!(bar.annotations, vec!["retrofit2.http.POST".to_string()]);
        assert_eq!(bar.params, 1);
    }

    #[test]
    fn test_on_demand_import_qualifies_annotation() {
        let src = r#"package com.other;
import retrofit2.http.*;
interface Svc { @DELETE("x") Object remove(); @Deprecated Object old(); }
"#;
        let trees = vec![parse(src)];
        let index = ProjectIndex::build(&trees);
        let info = index.get("com.other.Svc").unwrap();
        assert_eq!(info.methods[0].annotations, vec!["retrofit2.http.DELETE"]);
        assert_eq!(info.methods[1].annotations, vec!["java.lang.Deprecated"]);
    }

    #[test]
    fn test_resolve_through_parameter() {
        let client = r#"package com.example;
class Client {
    void run(ApiInterface api) {
        api.foo();
        api.bar("x");
        api.bar();
    }
}
"#;
        let calls = resolved_calls(client, &[]);
        assert_eq!(lookup(&calls, "api.foo()"), Some("com.example.ApiInterface.foo"));
        assert_eq!(lookup(&calls, "api.bar(\"x\")"), Some("com.example.ApiInterface.bar"));
        // arity mismatch
        assert_eq!(lookup(&calls, "api.bar()"), None);
    }

    #[test]
    fn test_resolve_through_fields_and_this() {
        let client = r#"package com.example;
class Client {
    private ApiInterface api;
    void run() {
        api.foo();
        this.api.plain();
    }
}
"#;
        let calls = resolved_calls(client, &[]);
        assert_eq!(lookup(&calls, "api.foo()"), Some("com.example.ApiInterface.foo"));
        assert_eq!(lookup(&calls, "this.api.plain()"), Some("com.example.ApiInterface.plain"));
    }

    #[test]
    fn test_resolve_var_and_chained_receivers() {
        let factory = r#"package com.example;
public class Factory {
    public static ApiInterface create() { return null; }
    public ApiInterface api() { return null; }
}
"#;
        let client = r#"package com.example;
class Client {
    void run(Factory factory) {
        var api = factory.api();
        api.foo();
        Factory.create().plain();
        ((ApiInterface) lookup()).foo();
    }
}
"#;
        let calls = resolved_calls(client, &[factory]);
        assert_eq!(lookup(&calls, "api.foo()"), Some("com.example.ApiInterface.foo"));
        assert_eq!(
            lookup(&calls, "Factory.create().plain()"),
            Some("com.example.ApiInterface.plain")
        );
        assert_eq!(lookup(&calls, "Factory.create()"), Some("com.example.Factory.create"));
        assert_eq!(
            lookup(&calls, "((ApiInterface) lookup()).foo()"),
            Some("com.example.ApiInterface.foo")
        );
    }

    #[test]
    fn test_resolve_inherited_method() {
        let child = r#"package com.example;
public interface ChildApi extends ApiInterface {}
"#;
        let client = r#"package com.example;
class Client {
    void run(ChildApi api) { api.foo(); }
}
"#;
        let calls = resolved_calls(client, &[child]);
        assert_eq!(lookup(&calls, "api.foo()"), Some("com.example.ApiInterface.foo"));
    }

    #[test]
    fn test_resolve_unqualified_and_static_import() {
        let endpoints = r#"package com.example.net;
import retrofit2.http.GET;
public class Endpoints {
    @GET("ping") public static Object ping() { return null; }
}
"#;
        let client = r#"package com.example;
import static com.example.net.Endpoints.ping;
class Client implements ApiInterface {
    void run() {
        foo();
        ping();
        missing();
    }
}
"#;
        let calls = resolved_calls(client, &[endpoints]);
        assert_eq!(lookup(&calls, "foo()"), Some("com.example.ApiInterface.foo"));
        assert_eq!(lookup(&calls, "ping()"), Some("com.example.net.Endpoints.ping"));
        assert_eq!(lookup(&calls, "missing()"), None);
    }

    #[test]
    fn test_unknown_receiver_is_unresolved() {
        let client = r#"package com.example;
class Client {
    void run() { unknown.foo(); }
}
"#;
        let calls = resolved_calls(client, &[]);
        assert_eq!(lookup(&calls, "unknown.foo()"), None);
    }

    #[test]
    fn test_cyclic_supertypes_terminate() {
        let src = r#"package p;
interface A extends B {}
interface B extends A {}
class C { void run(A a) { a.missing(); } }
"#;
        let trees = vec![parse(src)];
        let index = ProjectIndex::build(&trees);
        let resolver = FileResolver::new(&trees[0], &index);
        let call = trees[0].calls()[0];
        assert!(resolver.resolve_call(call).is_none());
        assert!(index.find_field("p.A", "x").is_none());
    }

    #[test]
    fn test_resolve_variable_targets() {
        let src = r#"package com.example;
class Client {
    Object field;
    Object[] items;
    void run(Object param) {
        Object local;
        local = null;
        param = null;
        field = null;
        this.field = null;
        items[0] = null;
        (local) = null;
        nowhere = null;
    }
}
"#;
        let trees = vec![parse(src)];
        let index = ProjectIndex::build(&trees);
        let tree = &trees[0];
        let resolver = FileResolver::new(tree, &index);

        let targets: Vec<(String, Option<Variable>)> = tree
            .iter()
            .filter_map(|(_, n)| match n.kind {
                NodeKind::Assignment { target, .. } => Some(target),
                _ => None,
            })
            .map(|t| (tree.text(t).to_string(), resolver.resolve_variable(t)))
            .collect();

        let get = |text: &str| {
            targets
                .iter()
                .find(|(t, _)| t == text)
                .and_then(|(_, v)| v.clone())
        };
        assert!(matches!(get("local"), Some(Variable::Local(_))));
        assert!(matches!(get("param"), Some(Variable::Local(_))));
        assert_eq!(
            get("field"),
            Some(Variable::Field {
                owner: "com.example.Client".into(),
                name: "field".into()
            })
        );
        assert_eq!(get("this.field"), get("field"));
        assert_eq!(get("items[0]"), None);
        assert!(matches!(get("(local)"), Some(Variable::Local(_))));
        assert_eq!(get("nowhere"), None);
    }

    #[test]
    fn test_nested_types_and_records() {
        let src = r#"package com.example;
class Outer {
    static class Holder { ApiInterface api; }
    record Pair(ApiInterface api, int n) {}
    void run(Holder holder, Pair pair) {
        holder.api.foo();
        pair.api().plain();
    }
}
"#;
        let calls = resolved_calls(src, &[]);
        assert_eq!(lookup(&calls, "holder.api.foo()"), Some("com.example.ApiInterface.foo"));
        assert_eq!(lookup(&calls, "pair.api()"), Some("com.example.Outer.Pair.api"));
        assert_eq!(
            lookup(&calls, "pair.api().plain()"),
            Some("com.example.ApiInterface.plain")
        );
    }

    const OVERLOADED: &str = r#"package com.example;

import retrofit2.Call;
import retrofit2.http.GET;

public interface Overloaded {
    @GET("item")
    Call<Void> get(String id);

    Call<Void> get(int id);

    @GET("a")
    Call<Void> find(Object key);

    @GET("b")
    Call<Void> find(long key);

    Call<Void> pick(String id);

    @GET("pick")
    Call<Void> pick(java.util.List<String> ids);
}
"#;

    /// Parameter types of the declaration each call binds to
    fn overload_of(client: &str) -> Vec<(String, Option<Vec<String>>)> {
        let trees = vec![parse(OVERLOADED), parse(client)];
        let index = ProjectIndex::build(&trees);
        let tree = &trees[1];
        let resolver = FileResolver::new(tree, &index);
        tree.calls()
            .into_iter()
            .map(|c| {
                (
                    tree.text(c).to_string(),
                    resolver.resolve_call(c).map(|d| d.param_types.clone()),
                )
            })
            .collect()
    }

    #[test]
    fn test_overloads_narrowed_by_argument_type() {
        let client = r#"package com.example;
class Client {
    void run(Overloaded api, String name, Integer boxed) {
        api.get(5);
        api.get("x");
        api.get(name);
        api.get(boxed);
        api.get('c');
    }
}
"#;
        let calls = overload_of(client);
        let params = |text: &str| {
            calls
                .iter()
                .find(|(t, _)| t == text)
                .and_then(|(_, p)| p.clone())
        };
        assert_eq!(params("api.get(5)"), Some(vec!["int".to_string()]));
        assert_eq!(params("api.get(\"x\")"), Some(vec!["java.lang.String".to_string()]));
        assert_eq!(params("api.get(name)"), Some(vec!["java.lang.String".to_string()]));
        assert_eq!(params("api.get(boxed)"), Some(vec!["int".to_string()]));
        assert_eq!(params("api.get('c')"), Some(vec!["int".to_string()]));
    }

    #[test]
    fn test_ambiguous_overloads_agreeing_on_annotations_resolve() {
        let client = r#"package com.example;
class Client {
    void run(Overloaded api, Thing thing) { api.find(thing.key()); }
}
"#;
        // neither argument type is known, both overloads carry @GET
        let calls = overload_of(client);
        let found = calls.iter().find(|(t, _)| t == "api.find(thing.key())");
        assert!(found.is_some_and(|(_, p)| p.is_some()));
    }

    #[test]
    fn test_ambiguous_overloads_with_differing_annotations_are_unresolved() {
        let client = r#"package com.example;
class Client {
    void run(Overloaded api, Thing thing) { api.pick(thing.ids()); }
}
"#;
        let calls = overload_of(client);
        let found = calls.iter().find(|(t, _)| t == "api.pick(thing.ids())");
        assert!(found.is_some_and(|(_, p)| p.is_none()));
    }
}
