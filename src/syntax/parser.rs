//! Recursive-descent parser for the Java subset the linter understands.
//!
//! Speculative parses (local declaration detection, casts, lambdas) only
//! consume [`TypeName`]s or scan tokens, so backtracking never leaves
//! orphaned nodes in the arena.

use super::lexer::{tokenize, Lexeme, Token};
use super::tree::{
    line_starts, position, Import, LiteralKind, NodeArena, NodeId, NodeKind, Span, SyntaxNode,
    TypeKind, TypeName,
};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("Failed to read file: {0}")]
    ReadFile(#[from] std::io::Error),
    #[error("Unexpected character at line {line}, column {column}")]
    UnexpectedCharacter { line: usize, column: usize },
    #[error("Syntax error at line {line}, column {column}: {message}")]
    Syntax {
        line: usize,
        column: usize,
        message: String,
    },
}

type PResult<T> = Result<T, ParseError>;

/// Deepest nesting of expressions, statements, types and initializers the
/// parser descends into before giving up on the file
pub const MAX_NESTING_DEPTH: usize = 100;

#[derive(Debug, Default)]
struct Modifiers {
    annotations: Vec<NodeId>,
    is_static: bool,
}

pub(crate) struct Parser<'src> {
    source: &'src str,
    tokens: Vec<Lexeme>,
    pos: usize,
    arena: NodeArena,
    line_starts: Vec<usize>,
    /// Inside `case` labels `IDENT ->` ends the label instead of starting a lambda
    no_lambda: bool,
    /// Current recursion depth, bounded by [`MAX_NESTING_DEPTH`]
    depth: usize,
}

impl<'src> Parser<'src> {
    pub(crate) fn new(source: &'src str) -> PResult<Self> {
        let line_starts = line_starts(source);
        let tokens = tokenize(source).map_err(|offset| {
            let (line, column) = position(&line_starts, source, offset);
            ParseError::UnexpectedCharacter { line, column }
        })?;
        Ok(Self {
            source,
            tokens,
            pos: 0,
            arena: NodeArena::default(),
            line_starts,
            no_lambda: false,
            depth: 0,
        })
    }

    // ---------------------------------------------------------------------
    // Token helpers
    // ---------------------------------------------------------------------

    fn peek(&self) -> Option<Token> {
        self.peek_at(0)
    }

    fn peek_at(&self, n: usize) -> Option<Token> {
        self.tokens.get(self.pos + n).map(|l| l.token)
    }

    fn at(&self, token: Token) -> bool {
        self.peek() == Some(token)
    }

    fn text_at(&self, n: usize) -> &'src str {
        self.tokens
            .get(self.pos + n)
            .and_then(|l| self.source.get(l.span.clone()))
            .unwrap_or("")
    }

    fn current_text(&self) -> &'src str {
        self.text_at(0)
    }

    fn at_ident(&self, text: &str) -> bool {
        self.at(Token::Ident) && self.current_text() == text
    }

    /// Token `n` ends exactly where token `n + 1` starts
    fn contiguous(&self, n: usize) -> bool {
        match (self.tokens.get(self.pos + n), self.tokens.get(self.pos + n + 1)) {
            (Some(a), Some(b)) => a.span.end == b.span.start,
            _ => false,
        }
    }

    fn eat(&mut self, token: Token) -> bool {
        if self.at(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, token: Token) -> PResult<()> {
        if self.eat(token) {
            Ok(())
        } else {
            self.error(format!("expected {}, found {}", describe(token), self.found()))
        }
    }

    fn expect_ident(&mut self) -> PResult<String> {
        if self.at(Token::Ident) {
            let text = self.current_text().to_string();
            self.pos += 1;
            Ok(text)
        } else {
            self.error(format!("expected identifier, found {}", self.found()))
        }
    }

    fn found(&self) -> String {
        if self.peek().is_none() {
            "end of input".to_string()
        } else {
            format!("`{}`", self.current_text())
        }
    }

    /// Byte offset where the current token starts
    fn start(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|l| l.span.start)
            .unwrap_or(self.source.len())
    }

    /// Byte offset where the previously consumed token ends
    fn prev_end(&self) -> usize {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map(|l| l.span.end)
            .unwrap_or(0)
    }

    fn finish(&mut self, kind: NodeKind, start: usize) -> NodeId {
        let end = self.prev_end().max(start);
        self.arena.alloc(kind, Span::new(start, end))
    }

    fn error<T>(&self, message: impl Into<String>) -> PResult<T> {
        let (line, column) = position(&self.line_starts, self.source, self.start());
        Err(ParseError::Syntax {
            line,
            column,
            message: message.into(),
        })
    }

    /// Run `parse` one nesting level deeper
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> PResult<T>) -> PResult<T> {
        if self.depth >= MAX_NESTING_DEPTH {
            return self.error(format!("nesting deeper than {} levels", MAX_NESTING_DEPTH));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    fn literal(&mut self, kind: LiteralKind) -> NodeId {
        let start = self.start();
        let text = self.current_text().to_string();
        self.pos += 1;
        self.finish(NodeKind::Literal { kind, text }, start)
    }

    // ---------------------------------------------------------------------
    // Compilation unit and declarations
    // ---------------------------------------------------------------------

    pub(crate) fn parse_compilation_unit(mut self) -> PResult<(Vec<SyntaxNode>, NodeId)> {
        let mut package = None;
        let mut imports = Vec::new();
        let mut types = Vec::new();

        // package-info.java may annotate the package declaration
        let save = self.pos;
        while self.at(Token::At) && self.peek_at(1) != Some(Token::Interface) {
            self.skip_annotation()?;
        }
        if self.eat(Token::Package) {
            package = Some(self.qualified_name()?);
            self.expect(Token::Semi)?;
        } else {
            self.pos = save;
        }

        while self.at(Token::Import) || self.at(Token::Semi) {
            if self.eat(Token::Semi) {
                continue;
            }
            imports.push(self.import()?);
        }

        while self.peek().is_some() {
            if self.eat(Token::Semi) {
                continue;
            }
            let start = self.start();
            let mods = self.modifiers()?;
            types.push(self.type_declaration(mods, start)?);
        }

        let root = self.arena.alloc(
            NodeKind::CompilationUnit {
                package,
                imports,
                types,
            },
            Span::new(0, self.source.len()),
        );
        Ok((self.arena.into_nodes(), root))
    }

    fn import(&mut self) -> PResult<Import> {
        self.expect(Token::Import)?;
        let is_static = self.eat(Token::Static);
        let mut path = self.expect_ident()?;
        let mut on_demand = false;
        while self.eat(Token::Dot) {
            if self.eat(Token::Star) {
                on_demand = true;
                break;
            }
            path.push('.');
            path.push_str(&self.expect_ident()?);
        }
        self.expect(Token::Semi)?;
        Ok(Import {
            path,
            on_demand,
            is_static,
        })
    }

    fn qualified_name(&mut self) -> PResult<String> {
        let mut name = self.expect_ident()?;
        while self.at(Token::Dot) && self.peek_at(1) == Some(Token::Ident) {
            self.pos += 1;
            name.push('.');
            name.push_str(&self.expect_ident()?);
        }
        Ok(name)
    }

    fn modifiers(&mut self) -> PResult<Modifiers> {
        let mut mods = Modifiers::default();
        loop {
            match self.peek() {
                Some(Token::At) if self.peek_at(1) != Some(Token::Interface) => {
                    mods.annotations.push(self.annotation()?);
                }
                Some(Token::Static) => {
                    mods.is_static = true;
                    self.pos += 1;
                }
                Some(
                    Token::Public
                    | Token::Private
                    | Token::Protected
                    | Token::Final
                    | Token::Abstract
                    | Token::Native
                    | Token::Transient
                    | Token::Volatile
                    | Token::Strictfp,
                ) => self.pos += 1,
                Some(Token::Synchronized) if self.peek_at(1) != Some(Token::LParen) => {
                    self.pos += 1
                }
                Some(Token::Default)
                    if !matches!(self.peek_at(1), Some(Token::Colon | Token::Arrow)) =>
                {
                    self.pos += 1
                }
                Some(Token::Ident) if self.current_text() == "sealed" && self.declaration_at(1) => {
                    self.pos += 1
                }
                Some(Token::Ident)
                    if self.current_text() == "non"
                        && self.peek_at(1) == Some(Token::Minus)
                        && self.text_at(2) == "sealed" =>
                {
                    self.pos += 3
                }
                _ => break,
            }
        }
        Ok(mods)
    }

    /// Whether token `n` can continue a declaration's modifier list
    fn declaration_at(&self, n: usize) -> bool {
        match self.peek_at(n) {
            Some(
                Token::Class
                | Token::Interface
                | Token::Abstract
                | Token::Static
                | Token::Final
                | Token::Public
                | Token::Private
                | Token::Protected
                | Token::Strictfp
                | Token::At,
            ) => true,
            Some(Token::Ident) => matches!(self.text_at(n), "non" | "sealed" | "record"),
            _ => false,
        }
    }

    fn starts_type_declaration(&self) -> bool {
        match self.peek() {
            Some(Token::Class | Token::Interface | Token::Enum) => true,
            Some(Token::At) => self.peek_at(1) == Some(Token::Interface),
            Some(Token::Ident) => {
                self.current_text() == "record"
                    && self.peek_at(1) == Some(Token::Ident)
                    && matches!(self.peek_at(2), Some(Token::LParen | Token::Lt))
            }
            _ => false,
        }
    }

    fn type_declaration(&mut self, mods: Modifiers, start: usize) -> PResult<NodeId> {
        let kind = match self.peek() {
            Some(Token::Class) => TypeKind::Class,
            Some(Token::Interface) => TypeKind::Interface,
            Some(Token::Enum) => TypeKind::Enum,
            Some(Token::At) if self.peek_at(1) == Some(Token::Interface) => {
                self.pos += 1;
                TypeKind::Annotation
            }
            Some(Token::Ident) if self.current_text() == "record" => TypeKind::Record,
            _ => {
                return self.error(format!(
                    "expected class, interface, enum or record declaration, found {}",
                    self.found()
                ))
            }
        };
        self.pos += 1;

        let name = self.expect_ident()?;
        if self.at(Token::Lt) {
            self.skip_type_parameters()?;
        }

        let components = if kind == TypeKind::Record {
            self.formal_parameters()?
        } else {
            Vec::new()
        };

        let mut supertypes = Vec::new();
        loop {
            if self.eat(Token::Extends) || self.eat(Token::Implements) {
                supertypes.extend(self.type_list()?);
            } else if self.at_ident("permits") {
                self.pos += 1;
                self.type_list()?;
            } else {
                break;
            }
        }

        let members = if kind == TypeKind::Enum {
            self.enum_body(&name)?
        } else {
            self.class_body(&name)?
        };

        Ok(self.finish(
            NodeKind::TypeDecl {
                kind,
                name,
                annotations: mods.annotations,
                supertypes,
                components,
                members,
            },
            start,
        ))
    }

    fn type_list(&mut self) -> PResult<Vec<TypeName>> {
        let mut types = vec![self.parse_type()?];
        while self.eat(Token::Comma) {
            types.push(self.parse_type()?);
        }
        Ok(types)
    }

    fn class_body(&mut self, type_name: &str) -> PResult<Vec<NodeId>> {
        self.expect(Token::LBrace)?;
        let mut members = Vec::new();
        while !self.at(Token::RBrace) {
            if self.peek().is_none() {
                return self.error("unexpected end of input, expected `}`");
            }
            if self.eat(Token::Semi) {
                continue;
            }
            members.push(self.member(type_name)?);
        }
        self.expect(Token::RBrace)?;
        Ok(members)
    }

    fn enum_body(&mut self, type_name: &str) -> PResult<Vec<NodeId>> {
        self.expect(Token::LBrace)?;
        let mut members = Vec::new();

        while !self.at(Token::Semi) && !self.at(Token::RBrace) {
            let start = self.start();
            let mods = self.modifiers()?;
            let name = self.expect_ident()?;
            let args = if self.at(Token::LParen) {
                Some(self.arguments()?)
            } else {
                None
            };
            let body = if self.at(Token::LBrace) {
                self.class_body(&name)?
            } else {
                Vec::new()
            };
            members.push(self.finish(
                NodeKind::EnumConstant {
                    name,
                    annotations: mods.annotations,
                    args,
                    members: body,
                },
                start,
            ));
            if !self.eat(Token::Comma) {
                break;
            }
        }

        if self.eat(Token::Semi) {
            while !self.at(Token::RBrace) {
                if self.peek().is_none() {
                    return self.error("unexpected end of input, expected `}`");
                }
                if self.eat(Token::Semi) {
                    continue;
                }
                members.push(self.member(type_name)?);
            }
        }
        self.expect(Token::RBrace)?;
        Ok(members)
    }

    fn member(&mut self, type_name: &str) -> PResult<NodeId> {
        let start = self.start();

        if self.at(Token::LBrace) {
            let body = self.block()?;
            return Ok(self.finish(
                NodeKind::Initializer {
                    is_static: false,
                    body,
                },
                start,
            ));
        }

        let mods = self.modifiers()?;
        if mods.annotations.is_empty() && mods.is_static && self.at(Token::LBrace) {
            let body = self.block()?;
            return Ok(self.finish(
                NodeKind::Initializer {
                    is_static: true,
                    body,
                },
                start,
            ));
        }

        if self.starts_type_declaration() {
            return self.nested(|p| p.type_declaration(mods, start));
        }

        if self.at(Token::Lt) {
            self.skip_type_parameters()?;
        }

        if self.at(Token::Ident) && self.current_text() == type_name {
            match self.peek_at(1) {
                Some(Token::LParen) => {
                    let name = self.expect_ident()?;
                    return self.method_rest(mods, name, None, start);
                }
                // compact canonical constructor of a record
                Some(Token::LBrace) => {
                    let name = self.expect_ident()?;
                    let body = self.block()?;
                    return Ok(self.finish(
                        NodeKind::Method {
                            name,
                            annotations: mods.annotations,
                            return_type: None,
                            params: Vec::new(),
                            body: Some(body),
                        },
                        start,
                    ));
                }
                _ => {}
            }
        }

        let ty = self.parse_type()?;
        if self.at(Token::Ident) && self.peek_at(1) == Some(Token::LParen) {
            let name = self.expect_ident()?;
            return self.method_rest(mods, name, Some(ty), start);
        }

        let declarators = self.declarators()?;
        self.expect(Token::Semi)?;
        Ok(self.finish(
            NodeKind::Field {
                annotations: mods.annotations,
                ty,
                declarators,
            },
            start,
        ))
    }

    fn method_rest(
        &mut self,
        mods: Modifiers,
        name: String,
        return_type: Option<TypeName>,
        start: usize,
    ) -> PResult<NodeId> {
        let params = self.formal_parameters()?;
        self.dims();
        if self.eat(Token::Throws) {
            self.type_list()?;
        }

        let body = if self.at(Token::LBrace) {
            Some(self.block()?)
        } else {
            if self.eat(Token::Default) {
                self.skip_element_value()?;
            }
            self.expect(Token::Semi)?;
            None
        };

        Ok(self.finish(
            NodeKind::Method {
                name,
                annotations: mods.annotations,
                return_type,
                params,
                body,
            },
            start,
        ))
    }

    fn formal_parameters(&mut self) -> PResult<Vec<NodeId>> {
        self.expect(Token::LParen)?;
        let mut params = Vec::new();
        while !self.at(Token::RParen) {
            params.push(self.parameter()?);
            if !self.eat(Token::Comma) {
                break;
            }
        }
        self.expect(Token::RParen)?;
        Ok(params)
    }

    fn parameter(&mut self) -> PResult<NodeId> {
        let start = self.start();
        let mods = self.modifiers()?;
        let ty = self.parse_type()?;
        while self.at(Token::At) {
            self.skip_annotation()?;
        }
        let varargs = self.eat(Token::Ellipsis);
        // receiver parameter: `void m(Outer this)`
        let name = if self.eat(Token::This) {
            "this".to_string()
        } else {
            self.expect_ident()?
        };
        self.dims();
        Ok(self.finish(
            NodeKind::Parameter {
                annotations: mods.annotations,
                ty: Some(ty),
                name,
                varargs,
            },
            start,
        ))
    }

    fn declarators(&mut self) -> PResult<Vec<NodeId>> {
        let mut out = Vec::new();
        loop {
            let start = self.start();
            let name = self.expect_ident()?;
            let dims = self.dims();
            let init = if self.eat(Token::Assign) {
                Some(self.variable_initializer()?)
            } else {
                None
            };
            out.push(self.finish(NodeKind::VariableDeclarator { name, dims, init }, start));
            if !self.eat(Token::Comma) {
                break;
            }
        }
        Ok(out)
    }

    fn variable_initializer(&mut self) -> PResult<NodeId> {
        if self.at(Token::LBrace) {
            self.nested(Self::array_initializer)
        } else {
            self.expression()
        }
    }

    fn array_initializer(&mut self) -> PResult<NodeId> {
        let start = self.start();
        self.expect(Token::LBrace)?;
        let mut elements = Vec::new();
        while !self.at(Token::RBrace) {
            elements.push(self.variable_initializer()?);
            if !self.eat(Token::Comma) {
                break;
            }
        }
        self.expect(Token::RBrace)?;
        Ok(self.finish(NodeKind::ArrayInit { elements }, start))
    }

    fn dims(&mut self) -> usize {
        let mut dims = 0;
        while self.at(Token::LBracket) && self.peek_at(1) == Some(Token::RBracket) {
            self.pos += 2;
            dims += 1;
        }
        dims
    }

    // ---------------------------------------------------------------------
    // Annotations
    // ---------------------------------------------------------------------

    fn annotation(&mut self) -> PResult<NodeId> {
        let start = self.start();
        self.expect(Token::At)?;
        let name = self.qualified_name()?;
        let mut args = Vec::new();
        if self.eat(Token::LParen) {
            while !self.at(Token::RParen) {
                if self.at(Token::Ident) && self.peek_at(1) == Some(Token::Assign) {
                    let pair_start = self.start();
                    let key = self.expect_ident()?;
                    self.pos += 1;
                    let value = self.element_value()?;
                    args.push(self.finish(NodeKind::ElementValue { name: key, value }, pair_start));
                } else {
                    args.push(self.element_value()?);
                }
                if !self.eat(Token::Comma) {
                    break;
                }
            }
            self.expect(Token::RParen)?;
        }
        Ok(self.finish(NodeKind::Annotation { name, args }, start))
    }

    fn element_value(&mut self) -> PResult<NodeId> {
        match self.peek() {
            Some(Token::At) => self.annotation(),
            Some(Token::LBrace) => {
                let start = self.start();
                self.pos += 1;
                let mut elements = Vec::new();
                while !self.at(Token::RBrace) {
                    elements.push(self.nested(Self::element_value)?);
                    if !self.eat(Token::Comma) {
                        break;
                    }
                }
                self.expect(Token::RBrace)?;
                Ok(self.finish(NodeKind::ArrayInit { elements }, start))
            }
            _ => self.conditional(),
        }
    }

    /// Consume an annotation without allocating nodes (type-use positions)
    fn skip_annotation(&mut self) -> PResult<()> {
        self.expect(Token::At)?;
        self.qualified_name()?;
        if self.at(Token::LParen) {
            self.skip_balanced(Token::LParen, Token::RParen)?;
        }
        Ok(())
    }

    /// Consume an annotation-member default value without allocating nodes
    fn skip_element_value(&mut self) -> PResult<()> {
        match self.peek() {
            Some(Token::At) => self.skip_annotation(),
            Some(Token::LBrace) => self.skip_balanced(Token::LBrace, Token::RBrace),
            _ => {
                while !self.at(Token::Semi) {
                    if self.peek().is_none() {
                        return self.error("unexpected end of input, expected `;`");
                    }
                    self.pos += 1;
                }
                Ok(())
            }
        }
    }

    fn skip_balanced(&mut self, open: Token, close: Token) -> PResult<()> {
        let mut depth = 0usize;
        loop {
            match self.peek() {
                None => return self.error(format!("unbalanced {}", describe(open))),
                Some(t) if t == open => depth += 1,
                Some(t) if t == close => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        self.pos += 1;
                        return Ok(());
                    }
                }
                _ => {}
            }
            self.pos += 1;
        }
    }

    // ---------------------------------------------------------------------
    // Types
    // ---------------------------------------------------------------------

    fn parse_type(&mut self) -> PResult<TypeName> {
        while self.at(Token::At) && self.peek_at(1) != Some(Token::Interface) {
            self.skip_annotation()?;
        }
        let mut ty = match self.peek() {
            Some(Token::Primitive) => {
                let name = self.current_text().to_string();
                self.pos += 1;
                TypeName::simple(name)
            }
            Some(Token::Ident) => {
                let mut name = self.expect_ident()?;
                let mut args = if self.at(Token::Lt) {
                    self.type_arguments()?
                } else {
                    Vec::new()
                };
                while self.at(Token::Dot) && matches!(self.peek_at(1), Some(Token::Ident | Token::At))
                {
                    self.pos += 1;
                    while self.at(Token::At) {
                        self.skip_annotation()?;
                    }
                    name.push('.');
                    name.push_str(&self.expect_ident()?);
                    args = if self.at(Token::Lt) {
                        self.type_arguments()?
                    } else {
                        Vec::new()
                    };
                }
                TypeName {
                    name,
                    args,
                    dims: 0,
                }
            }
            _ => return self.error(format!("expected type, found {}", self.found())),
        };

        loop {
            let save = self.pos;
            while self.at(Token::At) {
                self.skip_annotation()?;
            }
            if self.at(Token::LBracket) && self.peek_at(1) == Some(Token::RBracket) {
                self.pos += 2;
                ty.dims += 1;
            } else {
                self.pos = save;
                break;
            }
        }
        Ok(ty)
    }

    fn type_arguments(&mut self) -> PResult<Vec<TypeName>> {
        self.expect(Token::Lt)?;
        let mut args = Vec::new();
        if self.eat(Token::Gt) {
            return Ok(args); // diamond
        }
        loop {
            while self.at(Token::At) {
                self.skip_annotation()?;
            }
            if self.eat(Token::Question) {
                let mut wildcard = TypeName::simple("?");
                if self.eat(Token::Extends) || self.eat(Token::Super) {
                    wildcard.args.push(self.nested(Self::parse_type)?);
                }
                args.push(wildcard);
            } else {
                args.push(self.nested(Self::parse_type)?);
            }
            if !self.eat(Token::Comma) {
                break;
            }
        }
        self.expect(Token::Gt)?;
        Ok(args)
    }

    fn skip_type_parameters(&mut self) -> PResult<()> {
        self.skip_balanced(Token::Lt, Token::Gt)
    }

    // ---------------------------------------------------------------------
    // Statements
    // ---------------------------------------------------------------------

    fn block(&mut self) -> PResult<NodeId> {
        let start = self.start();
        self.expect(Token::LBrace)?;
        let mut statements = Vec::new();
        while !self.at(Token::RBrace) {
            if self.peek().is_none() {
                return self.error("unexpected end of input, expected `}`");
            }
            statements.push(self.block_statement()?);
        }
        self.expect(Token::RBrace)?;
        Ok(self.finish(NodeKind::Block { statements }, start))
    }

    fn block_statement(&mut self) -> PResult<NodeId> {
        let start = self.start();

        if self.is_yield() {
            return self.statement();
        }

        if self.starts_type_declaration() {
            return self.nested(|p| p.type_declaration(Modifiers::default(), start));
        }

        if matches!(
            self.peek(),
            Some(Token::Final | Token::At | Token::Abstract | Token::Static | Token::Strictfp)
        ) {
            let mods = self.modifiers()?;
            if self.starts_type_declaration() {
                return self.nested(|p| p.type_declaration(mods, start));
            }
            let decl = self.local_variable(mods, start)?;
            self.expect(Token::Semi)?;
            return Ok(decl);
        }

        if self.is_local_variable_start() {
            let decl = self.local_variable(Modifiers::default(), start)?;
            self.expect(Token::Semi)?;
            return Ok(decl);
        }

        self.statement()
    }

    /// `Type name =`, `Type name;`, `Type name,`, `Type name[` or `Type name :`
    fn is_local_variable_start(&mut self) -> bool {
        if !matches!(self.peek(), Some(Token::Ident | Token::Primitive)) {
            return false;
        }
        let save = self.pos;
        let is_decl = self.parse_type().is_ok()
            && self.at(Token::Ident)
            && matches!(
                self.peek_at(1),
                Some(Token::Assign | Token::Semi | Token::Comma | Token::LBracket | Token::Colon)
            );
        self.pos = save;
        is_decl
    }

    fn is_yield(&self) -> bool {
        self.at_ident("yield")
            && !matches!(
                self.peek_at(1),
                None | Some(
                    Token::Assign
                        | Token::Dot
                        | Token::LParen
                        | Token::LBracket
                        | Token::PlusPlus
                        | Token::MinusMinus
                        | Token::PlusAssign
                        | Token::MinusAssign
                        | Token::StarAssign
                        | Token::SlashAssign
                        | Token::Semi
                        | Token::Colon
                        | Token::ColonColon
                        | Token::Arrow
                )
            )
    }

    fn local_variable(&mut self, mods: Modifiers, start: usize) -> PResult<NodeId> {
        let ty = self.parse_type()?;
        let declarators = self.declarators()?;
        Ok(self.finish(
            NodeKind::LocalVariable {
                annotations: mods.annotations,
                ty,
                declarators,
            },
            start,
        ))
    }

    fn statement(&mut self) -> PResult<NodeId> {
        self.nested(Self::statement_body)
    }

    fn statement_body(&mut self) -> PResult<NodeId> {
        let start = self.start();
        match self.peek() {
            None => self.error("unexpected end of input, expected statement"),
            Some(Token::LBrace) => self.block(),
            Some(Token::Semi) => {
                self.pos += 1;
                Ok(self.finish(NodeKind::Empty, start))
            }
            Some(Token::If) => {
                self.pos += 1;
                let condition = self.parenthesized_condition()?;
                let then_branch = self.statement()?;
                let else_branch = if self.eat(Token::Else) {
                    Some(self.statement()?)
                } else {
                    None
                };
                Ok(self.finish(
                    NodeKind::If {
                        condition,
                        then_branch,
                        else_branch,
                    },
                    start,
                ))
            }
            Some(Token::While) => {
                self.pos += 1;
                let condition = self.parenthesized_condition()?;
                let body = self.statement()?;
                Ok(self.finish(NodeKind::While { condition, body }, start))
            }
            Some(Token::Do) => {
                self.pos += 1;
                let body = self.statement()?;
                self.expect(Token::While)?;
                let condition = self.parenthesized_condition()?;
                self.expect(Token::Semi)?;
                Ok(self.finish(NodeKind::DoWhile { body, condition }, start))
            }
            Some(Token::For) => self.for_statement(start),
            Some(Token::Try) => self.try_statement(start),
            Some(Token::Switch) => self.switch(false),
            Some(Token::Return) => {
                self.pos += 1;
                let value = if self.at(Token::Semi) {
                    None
                } else {
                    Some(self.expression()?)
                };
                self.expect(Token::Semi)?;
                Ok(self.finish(NodeKind::Return { value }, start))
            }
            Some(Token::Throw) => {
                self.pos += 1;
                let value = self.expression()?;
                self.expect(Token::Semi)?;
                Ok(self.finish(NodeKind::Throw { value }, start))
            }
            Some(Token::Break) => {
                self.pos += 1;
                let label = if self.at(Token::Ident) {
                    Some(self.expect_ident()?)
                } else {
                    None
                };
                self.expect(Token::Semi)?;
                Ok(self.finish(NodeKind::Break { label }, start))
            }
            Some(Token::Continue) => {
                self.pos += 1;
                let label = if self.at(Token::Ident) {
                    Some(self.expect_ident()?)
                } else {
                    None
                };
                self.expect(Token::Semi)?;
                Ok(self.finish(NodeKind::Continue { label }, start))
            }
            Some(Token::Synchronized) => {
                self.pos += 1;
                let lock = self.parenthesized_condition()?;
                let body = self.block()?;
                Ok(self.finish(NodeKind::Synchronized { lock, body }, start))
            }
            Some(Token::Assert) => {
                self.pos += 1;
                let condition = self.expression()?;
                let message = if self.eat(Token::Colon) {
                    Some(self.expression()?)
                } else {
                    None
                };
                self.expect(Token::Semi)?;
                Ok(self.finish(NodeKind::Assert { condition, message }, start))
            }
            Some(Token::Ident) if self.peek_at(1) == Some(Token::Colon) => {
                let label = self.expect_ident()?;
                self.pos += 1;
                let body = self.statement()?;
                Ok(self.finish(NodeKind::Labeled { label, body }, start))
            }
            Some(Token::Ident) if self.is_yield() => {
                self.pos += 1;
                let value = self.expression()?;
                self.expect(Token::Semi)?;
                Ok(self.finish(NodeKind::Yield { value }, start))
            }
            _ => {
                let expr = self.expression()?;
                self.expect(Token::Semi)?;
                Ok(self.finish(NodeKind::ExpressionStatement { expr }, start))
            }
        }
    }

    fn parenthesized_condition(&mut self) -> PResult<NodeId> {
        self.expect(Token::LParen)?;
        let expr = self.expression()?;
        self.expect(Token::RParen)?;
        Ok(expr)
    }

    fn for_statement(&mut self, start: usize) -> PResult<NodeId> {
        self.expect(Token::For)?;
        self.expect(Token::LParen)?;

        let mut init = Vec::new();
        if !self.at(Token::Semi) {
            let decl_start = self.start();
            if matches!(self.peek(), Some(Token::Final | Token::At)) || self.is_local_variable_start()
            {
                let mods = self.modifiers()?;
                let ty = self.parse_type()?;

                if self.at(Token::Ident) && self.peek_at(1) == Some(Token::Colon) {
                    let var_start = self.start();
                    let name = self.expect_ident()?;
                    let declarator = self.finish(
                        NodeKind::VariableDeclarator {
                            name,
                            dims: 0,
                            init: None,
                        },
                        var_start,
                    );
                    let variable = self.finish(
                        NodeKind::LocalVariable {
                            annotations: mods.annotations,
                            ty,
                            declarators: vec![declarator],
                        },
                        decl_start,
                    );
                    self.expect(Token::Colon)?;
                    let iterable = self.expression()?;
                    self.expect(Token::RParen)?;
                    let body = self.statement()?;
                    return Ok(self.finish(
                        NodeKind::ForEach {
                            variable,
                            iterable,
                            body,
                        },
                        start,
                    ));
                }

                let declarators = self.declarators()?;
                init.push(self.finish(
                    NodeKind::LocalVariable {
                        annotations: mods.annotations,
                        ty,
                        declarators,
                    },
                    decl_start,
                ));
            } else {
                init = self.expression_statements()?;
            }
        }
        self.expect(Token::Semi)?;

        let condition = if self.at(Token::Semi) {
            None
        } else {
            Some(self.expression()?)
        };
        self.expect(Token::Semi)?;

        let update = if self.at(Token::RParen) {
            Vec::new()
        } else {
            self.expression_statements()?
        };
        self.expect(Token::RParen)?;

        let body = self.statement()?;
        Ok(self.finish(
            NodeKind::For {
                init,
                condition,
                update,
                body,
            },
            start,
        ))
    }

    fn expression_statements(&mut self) -> PResult<Vec<NodeId>> {
        let mut out = Vec::new();
        loop {
            let start = self.start();
            let expr = self.expression()?;
            out.push(self.finish(NodeKind::ExpressionStatement { expr }, start));
            if !self.eat(Token::Comma) {
                break;
            }
        }
        Ok(out)
    }

    fn try_statement(&mut self, start: usize) -> PResult<NodeId> {
        self.expect(Token::Try)?;

        let mut resources = Vec::new();
        if self.eat(Token::LParen) {
            while !self.at(Token::RParen) {
                let resource_start = self.start();
                if matches!(self.peek(), Some(Token::Final | Token::At))
                    || self.is_local_variable_start()
                {
                    let mods = self.modifiers()?;
                    resources.push(self.local_variable(mods, resource_start)?);
                } else {
                    resources.push(self.expression()?);
                }
                if !self.eat(Token::Semi) {
                    break;
                }
            }
            self.expect(Token::RParen)?;
        }

        let body = self.block()?;

        let mut catches = Vec::new();
        while self.at(Token::Catch) {
            let catch_start = self.start();
            self.pos += 1;
            self.expect(Token::LParen)?;
            let param_start = self.start();
            let mods = self.modifiers()?;
            let ty = self.parse_type()?;
            while self.eat(Token::Pipe) {
                self.parse_type()?;
            }
            let name = self.expect_ident()?;
            let parameter = self.finish(
                NodeKind::Parameter {
                    annotations: mods.annotations,
                    ty: Some(ty),
                    name,
                    varargs: false,
                },
                param_start,
            );
            self.expect(Token::RParen)?;
            let catch_body = self.block()?;
            catches.push(self.finish(
                NodeKind::Catch {
                    parameter,
                    body: catch_body,
                },
                catch_start,
            ));
        }

        let finally = if self.eat(Token::Finally) {
            Some(self.block()?)
        } else {
            None
        };

        Ok(self.finish(
            NodeKind::Try {
                resources,
                body,
                catches,
                finally,
            },
            start,
        ))
    }

    fn switch(&mut self, is_expression: bool) -> PResult<NodeId> {
        let start = self.start();
        self.expect(Token::Switch)?;
        let selector = self.parenthesized_condition()?;
        self.expect(Token::LBrace)?;
        let mut cases = Vec::new();
        while !self.at(Token::RBrace) {
            if self.peek().is_none() {
                return self.error("unexpected end of input, expected `}`");
            }
            cases.push(self.switch_case()?);
        }
        self.expect(Token::RBrace)?;
        Ok(self.finish(
            NodeKind::Switch {
                selector,
                cases,
                is_expression,
            },
            start,
        ))
    }

    fn switch_case(&mut self) -> PResult<NodeId> {
        let start = self.start();
        let mut labels = Vec::new();
        let mut is_default = false;

        if self.eat(Token::Default) {
            is_default = true;
        } else {
            self.expect(Token::Case)?;
            let saved = std::mem::replace(&mut self.no_lambda, true);
            let result = self.case_labels(&mut labels, &mut is_default);
            self.no_lambda = saved;
            result?;
        }

        let arrow = if self.eat(Token::Arrow) {
            true
        } else {
            self.expect(Token::Colon)?;
            false
        };

        let mut body = Vec::new();
        if arrow {
            match self.peek() {
                Some(Token::LBrace) => body.push(self.block()?),
                Some(Token::Throw) => body.push(self.statement()?),
                _ => {
                    body.push(self.expression()?);
                    self.expect(Token::Semi)?;
                }
            }
        } else {
            while !matches!(
                self.peek(),
                None | Some(Token::Case | Token::Default | Token::RBrace)
            ) {
                body.push(self.block_statement()?);
            }
        }

        Ok(self.finish(
            NodeKind::SwitchCase {
                labels,
                is_default,
                arrow,
                body,
            },
            start,
        ))
    }

    fn case_labels(&mut self, labels: &mut Vec<NodeId>, is_default: &mut bool) -> PResult<()> {
        loop {
            if self.eat(Token::Default) {
                *is_default = true;
            } else {
                labels.push(self.conditional()?);
                // type pattern binding: `case Circle c ->`
                if self.at(Token::Ident) && !self.at_ident("when") {
                    self.pos += 1;
                }
                if self.at_ident("when") {
                    self.pos += 1;
                    labels.push(self.conditional()?);
                }
            }
            if !self.eat(Token::Comma) {
                return Ok(());
            }
        }
    }

    // ---------------------------------------------------------------------
    // Expressions
    // ---------------------------------------------------------------------

    fn expression(&mut self) -> PResult<NodeId> {
        self.nested(Self::assignment_expression)
    }

    fn assignment_expression(&mut self) -> PResult<NodeId> {
        if self.lambda_ahead() {
            return self.lambda();
        }
        let start = self.start();
        let target = self.conditional()?;
        if let Some((op, len)) = self.assignment_operator() {
            self.pos += len;
            let value = self.expression()?;
            return Ok(self.finish(
                NodeKind::Assignment {
                    op: op.to_string(),
                    target,
                    value,
                },
                start,
            ));
        }
        Ok(target)
    }

    fn assignment_operator(&self) -> Option<(&'static str, usize)> {
        let op = match self.peek()? {
            Token::Assign => "=",
            Token::PlusAssign => "+=",
            Token::MinusAssign => "-=",
            Token::StarAssign => "*=",
            Token::SlashAssign => "/=",
            Token::AmpAssign => "&=",
            Token::PipeAssign => "|=",
            Token::CaretAssign => "^=",
            Token::PercentAssign => "%=",
            Token::ShlAssign => "<<=",
            Token::Gt if self.contiguous(0) => {
                return match (self.peek_at(1), self.peek_at(2)) {
                    (Some(Token::GtEq), _) => Some((">>=", 2)),
                    (Some(Token::Gt), Some(Token::GtEq)) if self.contiguous(1) => Some((">>>=", 3)),
                    _ => None,
                };
            }
            _ => return None,
        };
        Some((op, 1))
    }

    fn conditional(&mut self) -> PResult<NodeId> {
        let start = self.start();
        let condition = self.binary(1)?;
        if !self.eat(Token::Question) {
            return Ok(condition);
        }
        let then_value = self.expression()?;
        self.expect(Token::Colon)?;
        let else_value = if self.lambda_ahead() {
            self.lambda()?
        } else {
            self.nested(Self::conditional)?
        };
        Ok(self.finish(
            NodeKind::Conditional {
                condition,
                then_value,
                else_value,
            },
            start,
        ))
    }

    fn binary(&mut self, min_prec: u8) -> PResult<NodeId> {
        const RELATIONAL: u8 = 7;

        let start = self.start();
        let mut lhs = self.unary()?;
        loop {
            if self.at(Token::InstanceOf) {
                if RELATIONAL < min_prec {
                    break;
                }
                self.pos += 1;
                self.eat(Token::Final);
                let ty = self.parse_type()?;
                let binding = if self.at(Token::Ident) {
                    Some(self.expect_ident()?)
                } else {
                    None
                };
                lhs = self.finish(
                    NodeKind::InstanceOf {
                        expr: lhs,
                        ty,
                        binding,
                    },
                    start,
                );
                continue;
            }

            let Some((op, prec, len)) = self.binary_operator() else {
                break;
            };
            if prec < min_prec {
                break;
            }
            self.pos += len;
            let rhs = self.binary(prec + 1)?;
            lhs = self.finish(
                NodeKind::Binary {
                    op: op.to_string(),
                    lhs,
                    rhs,
                },
                start,
            );
        }
        Ok(lhs)
    }

    /// Operator, precedence and token count
    fn binary_operator(&self) -> Option<(&'static str, u8, usize)> {
        let op = match self.peek()? {
            Token::OrOr => ("||", 1),
            Token::AndAnd => ("&&", 2),
            Token::Pipe => ("|", 3),
            Token::Caret => ("^", 4),
            Token::Amp => ("&", 5),
            Token::EqEq => ("==", 6),
            Token::NotEq => ("!=", 6),
            Token::Lt => ("<", 7),
            Token::LtEq => ("<=", 7),
            Token::GtEq => (">=", 7),
            Token::Gt => {
                if !self.contiguous(0) {
                    return Some((">", 7, 1));
                }
                return match (self.peek_at(1), self.peek_at(2)) {
                    (Some(Token::GtEq), _) => None, // `>>=`
                    (Some(Token::Gt), Some(Token::GtEq)) if self.contiguous(1) => None, // `>>>=`
                    (Some(Token::Gt), Some(Token::Gt)) if self.contiguous(1) => Some((">>>", 8, 3)),
                    (Some(Token::Gt), _) => Some((">>", 8, 2)),
                    _ => Some((">", 7, 1)),
                };
            }
            Token::Shl => ("<<", 8),
            Token::Plus => ("+", 9),
            Token::Minus => ("-", 9),
            Token::Star => ("*", 10),
            Token::Slash => ("/", 10),
            Token::Percent => ("%", 10),
            _ => return None,
        };
        Some((op.0, op.1, 1))
    }

    fn unary(&mut self) -> PResult<NodeId> {
        let start = self.start();
        match self.peek() {
            Some(
                Token::Plus
                | Token::Minus
                | Token::PlusPlus
                | Token::MinusMinus
                | Token::Bang
                | Token::Tilde,
            ) => {
                let op = self.current_text().to_string();
                self.pos += 1;
                let operand = self.nested(Self::unary)?;
                Ok(self.finish(
                    NodeKind::Unary {
                        op,
                        operand,
                        postfix: false,
                    },
                    start,
                ))
            }
            Some(Token::LParen) => match self.try_cast(start)? {
                Some(cast) => Ok(cast),
                None => self.postfix_expression(),
            },
            _ => self.postfix_expression(),
        }
    }

    fn try_cast(&mut self, start: usize) -> PResult<Option<NodeId>> {
        let save = self.pos;
        self.pos += 1;

        let Ok(ty) = self.parse_type() else {
            self.pos = save;
            return Ok(None);
        };
        while self.eat(Token::Amp) {
            if self.parse_type().is_err() {
                self.pos = save;
                return Ok(None);
            }
        }
        if !self.eat(Token::RParen) {
            self.pos = save;
            return Ok(None);
        }

        let is_cast = if ty.is_primitive() {
            self.starts_operand() || matches!(self.peek(), Some(Token::Plus | Token::Minus))
        } else {
            self.starts_operand()
        };
        if !is_cast {
            self.pos = save;
            return Ok(None);
        }

        let expr = if self.lambda_ahead() {
            self.lambda()?
        } else {
            self.nested(Self::unary)?
        };
        Ok(Some(self.finish(NodeKind::Cast { ty, expr }, start)))
    }

    /// Tokens that can begin the operand of a reference cast
    fn starts_operand(&self) -> bool {
        matches!(
            self.peek(),
            Some(
                Token::Ident
                    | Token::IntLit
                    | Token::FloatLit
                    | Token::CharLit
                    | Token::StringLit
                    | Token::TextBlock
                    | Token::BoolLit
                    | Token::NullLit
                    | Token::LParen
                    | Token::This
                    | Token::Super
                    | Token::New
                    | Token::Bang
                    | Token::Tilde
                    | Token::Primitive
                    | Token::Switch
            )
        )
    }

    fn postfix_expression(&mut self) -> PResult<NodeId> {
        let start = self.start();
        let mut expr = self.primary()?;
        loop {
            match self.peek() {
                Some(Token::Dot) => {
                    let dot = self.start();
                    self.pos += 1;
                    match self.peek() {
                        Some(Token::Ident) => {
                            let member = self.expect_ident()?;
                            let access = self.finish(
                                NodeKind::MemberAccess {
                                    receiver: expr,
                                    member,
                                },
                                start,
                            );
                            expr = if self.at(Token::LParen) {
                                let args = self.arguments()?;
                                self.finish(NodeKind::Call { callee: access, args }, start)
                            } else {
                                access
                            };
                        }
                        Some(Token::Lt) => {
                            self.type_arguments()?;
                            let member = self.expect_ident()?;
                            let access = self.finish(
                                NodeKind::MemberAccess {
                                    receiver: expr,
                                    member,
                                },
                                start,
                            );
                            let args = self.arguments()?;
                            expr = self.finish(NodeKind::Call { callee: access, args }, start);
                        }
                        Some(Token::New) => {
                            expr = self.creator(start, Some(expr))?;
                        }
                        Some(Token::This | Token::Super) => {
                            let member = self.current_text().to_string();
                            self.pos += 1;
                            // `Outer.this`, `Interface.super`
                            expr = self.finish(
                                NodeKind::MemberAccess {
                                    receiver: expr,
                                    member,
                                },
                                start,
                            );
                        }
                        Some(Token::Class) => {
                            self.pos += 1;
                            let ty = TypeName::simple(compact(self.source.get(start..dot).unwrap_or("")));
                            expr = self.finish(NodeKind::ClassLiteral { ty }, start);
                        }
                        _ => {
                            return self.error(format!(
                                "expected member name after `.`, found {}",
                                self.found()
                            ))
                        }
                    }
                }
                Some(Token::LBracket) if self.peek_at(1) == Some(Token::RBracket) => {
                    // array type in expression position: `String[].class`, `int[]::new`
                    let mut ty =
                        TypeName::simple(compact(self.source.get(start..self.prev_end()).unwrap_or("")));
                    ty.dims = self.dims();
                    if self.eat(Token::Dot) {
                        self.expect(Token::Class)?;
                        expr = self.finish(NodeKind::ClassLiteral { ty }, start);
                    } else if self.at(Token::ColonColon) {
                        expr = self.finish(NodeKind::TypeExpr { ty }, start);
                    } else {
                        return self.error("expected `.class` or `::` after array type");
                    }
                }
                Some(Token::LBracket) => {
                    self.pos += 1;
                    let index = self.expression()?;
                    self.expect(Token::RBracket)?;
                    expr = self.finish(NodeKind::ArrayAccess { array: expr, index }, start);
                }
                Some(Token::ColonColon) => {
                    self.pos += 1;
                    let name = if self.eat(Token::New) {
                        "new".to_string()
                    } else {
                        self.expect_ident()?
                    };
                    expr = self.finish(NodeKind::MethodRef { target: expr, name }, start);
                }
                Some(Token::PlusPlus | Token::MinusMinus) => {
                    let op = self.current_text().to_string();
                    self.pos += 1;
                    expr = self.finish(
                        NodeKind::Unary {
                            op,
                            operand: expr,
                            postfix: true,
                        },
                        start,
                    );
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn primary(&mut self) -> PResult<NodeId> {
        let start = self.start();
        match self.peek() {
            None => self.error("unexpected end of input, expected expression"),
            Some(Token::IntLit) => Ok(self.literal(LiteralKind::Int)),
            Some(Token::FloatLit) => Ok(self.literal(LiteralKind::Float)),
            Some(Token::CharLit) => Ok(self.literal(LiteralKind::Char)),
            Some(Token::StringLit) => Ok(self.literal(LiteralKind::String)),
            Some(Token::TextBlock) => Ok(self.literal(LiteralKind::TextBlock)),
            Some(Token::BoolLit) => Ok(self.literal(LiteralKind::Bool)),
            Some(Token::NullLit) => Ok(self.literal(LiteralKind::Null)),
            Some(Token::This) | Some(Token::Super) => {
                let kind = if self.at(Token::This) {
                    NodeKind::This
                } else {
                    NodeKind::Super
                };
                self.pos += 1;
                let node = self.finish(kind, start);
                // explicit constructor invocation: `this(...)` / `super(...)`
                if self.at(Token::LParen) {
                    let args = self.arguments()?;
                    return Ok(self.finish(NodeKind::Call { callee: node, args }, start));
                }
                Ok(node)
            }
            Some(Token::New) => self.creator(start, None),
            Some(Token::LParen) => {
                self.pos += 1;
                let saved = std::mem::replace(&mut self.no_lambda, false);
                let inner = self.expression();
                self.no_lambda = saved;
                let inner = inner?;
                self.expect(Token::RParen)?;
                Ok(self.finish(NodeKind::Parenthesized { inner }, start))
            }
            Some(Token::Ident) => {
                if self.lambda_ahead() {
                    return self.lambda();
                }
                let name = self.expect_ident()?;
                let node = self.finish(NodeKind::Name { name }, start);
                if self.at(Token::LParen) {
                    let args = self.arguments()?;
                    return Ok(self.finish(NodeKind::Call { callee: node, args }, start));
                }
                Ok(node)
            }
            Some(Token::Primitive) => {
                let ty = self.parse_type()?;
                if self.eat(Token::Dot) {
                    self.expect(Token::Class)?;
                    Ok(self.finish(NodeKind::ClassLiteral { ty }, start))
                } else if self.at(Token::ColonColon) {
                    Ok(self.finish(NodeKind::TypeExpr { ty }, start))
                } else {
                    self.error("expected `.class` or `::` after primitive type")
                }
            }
            Some(Token::Switch) => self.switch(true),
            Some(_) => self.error(format!("expected expression, found {}", self.found())),
        }
    }

    fn creator(&mut self, start: usize, outer: Option<NodeId>) -> PResult<NodeId> {
        self.expect(Token::New)?;
        if self.at(Token::Lt) {
            self.type_arguments()?;
        }
        let mut ty = self.parse_type()?;

        if self.at(Token::LBracket) || ty.dims > 0 {
            let mut dimensions = Vec::new();
            while self.eat(Token::LBracket) {
                if !self.eat(Token::RBracket) {
                    dimensions.push(self.expression()?);
                    self.expect(Token::RBracket)?;
                }
                ty.dims += 1;
            }
            let init = if self.at(Token::LBrace) {
                Some(self.array_initializer()?)
            } else {
                None
            };
            return Ok(self.finish(
                NodeKind::NewArray {
                    ty,
                    dimensions,
                    init,
                },
                start,
            ));
        }

        let args = self.arguments()?;
        let body = if self.at(Token::LBrace) {
            Some(self.class_body("")?)
        } else {
            None
        };
        Ok(self.finish(
            NodeKind::NewObject {
                ty,
                outer,
                args,
                body,
            },
            start,
        ))
    }

    fn arguments(&mut self) -> PResult<NodeId> {
        let start = self.start();
        self.expect(Token::LParen)?;
        let saved = std::mem::replace(&mut self.no_lambda, false);
        let args = self.argument_items();
        self.no_lambda = saved;
        let args = args?;
        self.expect(Token::RParen)?;
        Ok(self.finish(NodeKind::ArgumentList { args }, start))
    }

    fn argument_items(&mut self) -> PResult<Vec<NodeId>> {
        let mut args = Vec::new();
        while !self.at(Token::RParen) {
            args.push(self.expression()?);
            if !self.eat(Token::Comma) {
                break;
            }
        }
        Ok(args)
    }

    /// `x ->` or `( ... ) ->`
    fn lambda_ahead(&self) -> bool {
        if self.no_lambda {
            return false;
        }
        match self.peek() {
            Some(Token::Ident) => self.peek_at(1) == Some(Token::Arrow),
            Some(Token::LParen) => {
                let mut depth = 0usize;
                for (i, lexeme) in self.tokens.iter().enumerate().skip(self.pos) {
                    match lexeme.token {
                        Token::LParen => depth += 1,
                        Token::RParen => {
                            depth -= 1;
                            if depth == 0 {
                                return self.tokens.get(i + 1).map(|l| l.token) == Some(Token::Arrow);
                            }
                        }
                        Token::Semi | Token::LBrace | Token::RBrace => return false,
                        _ => {}
                    }
                }
                false
            }
            _ => false,
        }
    }

    fn lambda(&mut self) -> PResult<NodeId> {
        let start = self.start();
        let mut params = Vec::new();

        if self.at(Token::Ident) {
            let name = self.expect_ident()?;
            params.push(self.untyped_parameter(name, start));
        } else {
            self.expect(Token::LParen)?;
            while !self.at(Token::RParen) {
                let param_start = self.start();
                if self.at(Token::Ident) && matches!(self.peek_at(1), Some(Token::Comma | Token::RParen))
                {
                    let name = self.expect_ident()?;
                    params.push(self.untyped_parameter(name, param_start));
                } else {
                    params.push(self.parameter()?);
                }
                if !self.eat(Token::Comma) {
                    break;
                }
            }
            self.expect(Token::RParen)?;
        }

        self.expect(Token::Arrow)?;
        let body = if self.at(Token::LBrace) {
            self.block()?
        } else {
            self.expression()?
        };
        Ok(self.finish(NodeKind::Lambda { params, body }, start))
    }

    fn untyped_parameter(&mut self, name: String, start: usize) -> NodeId {
        self.finish(
            NodeKind::Parameter {
                annotations: Vec::new(),
                ty: None,
                name,
                varargs: false,
            },
            start,
        )
    }
}

/// Strip whitespace from a type written in expression position
fn compact(text: &str) -> String {
    text.chars().filter(|c| !c.is_whitespace()).collect()
}

fn describe(token: Token) -> String {
    let text = match token {
        Token::LParen => "(",
        Token::RParen => ")",
        Token::LBrace => "{",
        Token::RBrace => "}",
        Token::LBracket => "[",
        Token::RBracket => "]",
        Token::Semi => ";",
        Token::Comma => ",",
        Token::Dot => ".",
        Token::Colon => ":",
        Token::Arrow => "->",
        Token::Lt => "<",
        Token::Gt => ">",
        Token::Assign => "=",
        Token::At => "@",
        Token::Import => "import",
        Token::New => "new",
        Token::While => "while",
        Token::Class => "class",
        Token::Case => "case",
        Token::Switch => "switch",
        Token::Try => "try",
        Token::For => "for",
        other => return format!("{:?}", other).to_lowercase(),
    };
    format!("`{}`", text)
}
