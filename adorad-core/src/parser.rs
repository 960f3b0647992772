//! Recursive-descent parser for the Adorad front end.
//!
//! Every production returns `ParseResult<Option<T>>`:
//!
//! * `Ok(Some(node))` - the production matched,
//! * `Ok(None)`       - it did not apply; the caller tries the next alternative,
//! * `Err(error)`     - the input is malformed and the parse is over.
//!
//! Binary operators are resolved by precedence climbing over
//! [`PRECEDENCE_TABLE`].

use std::mem;
use std::sync::Arc;

use tracing::{debug, trace};

use crate::ast::{
    AstNode, AttributeKind, BinaryOp, Block, EnumDecl, EnumVariant, FuncAttribute, FuncDecl,
    IfExpr, LoopExpr, LoopKind, MatchArm, MatchExpr, MatchPattern, Param, PrefixOp, SourceUnit,
    StructDecl, StructField, TypeExpr, VariableDecl, Visibility,
};
use crate::error::ParseError;
use crate::span::Location;
use crate::token::{Token, TokenKind};

pub type ParseResult<T> = Result<T, ParseError>;

/// Deepest nesting of statements, expressions and types the parser will
/// descend into before giving up.
pub const MAX_NESTING_DEPTH: usize = 64;

/// Parse a token stream produced by [`crate::lexer::tokenize`].
pub fn parse(tokens: Vec<Token>) -> ParseResult<SourceUnit> {
    Parser::new(tokens).parse()
}

/// One row of the binary operator table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperatorPrecedence {
    pub token: TokenKind,
    pub prec: u8,
    pub op: BinaryOp,
}

/// Binary operator precedence, strong to weak. Operators sharing a
/// precedence group left to right.
pub const PRECEDENCE_TABLE: &[OperatorPrecedence] = &[
    OperatorPrecedence { token: TokenKind::Mul, prec: 60, op: BinaryOp::Mul },
    OperatorPrecedence { token: TokenKind::Mod, prec: 60, op: BinaryOp::Mod },
    OperatorPrecedence { token: TokenKind::Div, prec: 60, op: BinaryOp::Div },
    OperatorPrecedence { token: TokenKind::Plus, prec: 50, op: BinaryOp::Add },
    OperatorPrecedence { token: TokenKind::Minus, prec: 50, op: BinaryOp::Sub },
    OperatorPrecedence { token: TokenKind::PlusEq, prec: 50, op: BinaryOp::AddAssign },
    OperatorPrecedence { token: TokenKind::MinusEq, prec: 50, op: BinaryOp::SubAssign },
    OperatorPrecedence { token: TokenKind::Shl, prec: 40, op: BinaryOp::Shl },
    OperatorPrecedence { token: TokenKind::Shr, prec: 40, op: BinaryOp::Shr },
    OperatorPrecedence { token: TokenKind::Lt, prec: 30, op: BinaryOp::Lt },
    OperatorPrecedence { token: TokenKind::Gt, prec: 30, op: BinaryOp::Gt },
    OperatorPrecedence { token: TokenKind::EqEq, prec: 30, op: BinaryOp::Eq },
    OperatorPrecedence { token: TokenKind::Neq, prec: 30, op: BinaryOp::Ne },
    OperatorPrecedence { token: TokenKind::Le, prec: 30, op: BinaryOp::Le },
    OperatorPrecedence { token: TokenKind::Ge, prec: 30, op: BinaryOp::Ge },
    OperatorPrecedence { token: TokenKind::AndAnd, prec: 20, op: BinaryOp::BoolAnd },
    OperatorPrecedence { token: TokenKind::OrOr, prec: 10, op: BinaryOp::BoolOr },
];

/// Look up a token in the precedence table.
///
/// The table is small, so a linear scan is enough.
pub fn lookup_precedence(kind: TokenKind) -> Option<&'static OperatorPrecedence> {
    PRECEDENCE_TABLE.iter().find(|entry| entry.token == kind)
}

fn assignment_op(kind: TokenKind) -> Option<BinaryOp> {
    let op = match kind {
        TokenKind::Eq => BinaryOp::Assign,
        TokenKind::PlusEq => BinaryOp::AddAssign,
        TokenKind::MinusEq => BinaryOp::SubAssign,
        TokenKind::MulEq => BinaryOp::MulAssign,
        TokenKind::DivEq => BinaryOp::DivAssign,
        TokenKind::ModEq => BinaryOp::ModAssign,
        TokenKind::ShlEq => BinaryOp::ShlAssign,
        TokenKind::ShrEq => BinaryOp::ShrAssign,
        TokenKind::AndEq => BinaryOp::AndAssign,
        TokenKind::XorEq => BinaryOp::XorAssign,
        TokenKind::OrEq => BinaryOp::OrAssign,
        _ => return None,
    };
    Some(op)
}

/// Parser state for one compilation unit.
pub struct Parser {
    tokens: Vec<Token>,
    offset: usize,
    is_in_global_context: bool,
    depth: usize,
}

impl Parser {
    /// Take ownership of a token stream. A trailing `Eof` token is added
    /// if the stream does not already end with one.
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if tokens.last().is_none_or(|token| token.kind != TokenKind::Eof) {
            let location = match tokens.last() {
                Some(last) => Location {
                    offset: last.location.offset + last.len,
                    column: last.location.column + last.len as u32,
                    ..last.location.clone()
                },
                None => Location::new(Arc::from("<input>"), 1, 1, 0),
            };
            tokens.push(Token {
                kind: TokenKind::Eof,
                value: String::new(),
                len: 0,
                location,
            });
        }
        Parser {
            tokens,
            offset: 0,
            is_in_global_context: true,
            depth: 0,
        }
    }

    /// Parse the whole unit: top-level declarations until none match,
    /// which must coincide with the end of input.
    pub fn parse(mut self) -> ParseResult<SourceUnit> {
        let mut items = Vec::new();
        while let Some(item) = self.parse_top_level_declaration()? {
            trace!(kind = item.kind_name(), "parsed top-level declaration");
            items.push(item);
        }

        if !self.at(TokenKind::Eof) {
            return Err(self.expected("a top-level declaration"));
        }

        let module_name = items.iter().find_map(|item| match item {
            AstNode::ModuleStatement { name } => Some(name.clone()),
            _ => None,
        });

        let eof = &self.current().location;
        let num_lines = if eof.column > 1 { eof.line } else { eof.line - 1 };

        debug!(
            file = %eof.file,
            module = module_name.as_deref().unwrap_or("<none>"),
            items = items.len(),
            lines = num_lines,
            "parsed compilation unit"
        );

        Ok(SourceUnit {
            module_name,
            num_lines,
            items,
        })
    }

    // ---------------------------------------------------------------------
    // Token cursor
    // ---------------------------------------------------------------------

    fn current(&self) -> &Token {
        &self.tokens[self.offset]
    }

    fn current_kind(&self) -> TokenKind {
        self.current().kind
    }

    /// Kind of the token `n` positions ahead; `Eof` past the end.
    fn peek_kind(&self, n: usize) -> TokenKind {
        self.tokens
            .get(self.offset + n)
            .map_or(TokenKind::Eof, |token| token.kind)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.current_kind() == kind
    }

    /// Advance by `n` tokens and return the new current token, or `None`
    /// (leaving the cursor alone) if that would run past the end.
    pub fn chomp(&mut self, n: usize) -> Option<&Token> {
        if self.offset + n >= self.tokens.len() {
            return None;
        }
        self.offset += n;
        Some(&self.tokens[self.offset])
    }

    /// Consume and return the current token if it has kind `kind`.
    pub fn chomp_if(&mut self, kind: TokenKind) -> Option<Token> {
        if !self.at(kind) || self.offset + 1 >= self.tokens.len() {
            return None;
        }
        let token = self.current().clone();
        self.chomp(1);
        Some(token)
    }

    /// Like `chomp_if`, but a mismatch is a fatal error.
    pub fn expect(&mut self, kind: TokenKind) -> ParseResult<Token> {
        match self.chomp_if(kind) {
            Some(token) => Ok(token),
            None => Err(self.expected(kind.name())),
        }
    }

    fn expect_identifier(&mut self, what: &str) -> ParseResult<String> {
        match self.chomp_if(TokenKind::Identifier) {
            Some(token) => Ok(token.value),
            None => Err(self.expected(what)),
        }
    }

    fn expect_expr(&mut self, what: &str) -> ParseResult<AstNode> {
        match self.parse_expr()? {
            Some(expr) => Ok(expr),
            None => Err(self.expected(what)),
        }
    }

    fn expect_type_expr(&mut self, what: &str) -> ParseResult<TypeExpr> {
        match self.parse_type_expr()? {
            Some(ty) => Ok(ty),
            None => Err(self.expected(what)),
        }
    }

    fn describe_current(&self) -> String {
        let token = self.current();
        match token.kind {
            TokenKind::Identifier | TokenKind::Integer | TokenKind::Float => {
                format!("{} `{}`", token.kind.name(), token.value)
            }
            kind => kind.name().to_string(),
        }
    }

    fn expected(&self, what: &str) -> ParseError {
        ParseError::expected(what, self.describe_current(), self.current().location.clone())
    }

    fn error(&self, message: &str) -> ParseError {
        ParseError::new(message, self.current().location.clone())
    }

    /// Run one recursive production, one level deeper.
    fn nested<T>(&mut self, production: fn(&mut Self) -> ParseResult<T>) -> ParseResult<T> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(self.error("nesting is too deep"));
        }
        self.depth += 1;
        let result = production(self);
        self.depth -= 1;
        result
    }

    // ---------------------------------------------------------------------
    // Declarations
    // ---------------------------------------------------------------------

    /// Parse one top-level construct, or `Ok(None)` when nothing applies.
    pub fn parse_top_level_declaration(&mut self) -> ParseResult<Option<AstNode>> {
        if let Some(module) = self.parse_module_statement()? {
            return Ok(Some(module));
        }
        if let Some(import) = self.parse_import_statement()? {
            return Ok(Some(import));
        }
        if let Some(alias) = self.parse_alias_decl()? {
            return Ok(Some(alias));
        }
        if let Some(comptime) = self.parse_top_level_comptime()? {
            return Ok(Some(comptime));
        }
        if let Some(variable) = self.parse_variable_decl()? {
            return Ok(Some(variable));
        }
        if let Some(func) = self.parse_func_decl()? {
            return Ok(Some(func));
        }
        self.parse_container_decl()
    }

    // module IDENT ;?
    fn parse_module_statement(&mut self) -> ParseResult<Option<AstNode>> {
        if self.chomp_if(TokenKind::Module).is_none() {
            return Ok(None);
        }
        let name = self.expect_identifier("a module name")?;
        self.chomp_if(TokenKind::Semicolon);
        Ok(Some(AstNode::ModuleStatement { name }))
    }

    // import IDENT ;?
    fn parse_import_statement(&mut self) -> ParseResult<Option<AstNode>> {
        if self.chomp_if(TokenKind::Import).is_none() {
            return Ok(None);
        }
        let name = self.expect_identifier("an import name")?;
        self.chomp_if(TokenKind::Semicolon);
        Ok(Some(AstNode::ImportStatement { name }))
    }

    // alias IDENT as IDENT ;?
    fn parse_alias_decl(&mut self) -> ParseResult<Option<AstNode>> {
        if self.chomp_if(TokenKind::Alias).is_none() {
            return Ok(None);
        }
        let original = self.expect_identifier("an identifier after `alias`")?;
        self.expect(TokenKind::As)?;
        let alias = self.expect_identifier(&format!("an alias for `{original}`"))?;
        self.chomp_if(TokenKind::Semicolon);
        Ok(Some(AstNode::AliasDecl { original, alias }))
    }

    /// `@comptime Expr` at module scope. Leaves `@comptime` alone when it
    /// decorates a function or variable declaration.
    fn parse_top_level_comptime(&mut self) -> ParseResult<Option<AstNode>> {
        if !self.at(TokenKind::AttrComptime) {
            return Ok(None);
        }
        let next = self.peek_kind(1);
        if matches!(next, TokenKind::Func | TokenKind::Export)
            || next.is_attribute()
            || self.variable_decl_ahead()
        {
            return Ok(None);
        }
        let expr = self.parse_attribute_expr()?;
        self.chomp_if(TokenKind::Semicolon);
        Ok(Some(expr))
    }

    /// Whether the upcoming tokens start a variable declaration:
    /// `@comptime? export? mutable? (TypeExpr | any) IDENT`.
    fn variable_decl_ahead(&self) -> bool {
        let mut n = 0;
        if self.peek_kind(n) == TokenKind::AttrComptime {
            n += 1;
        }
        if self.peek_kind(n) == TokenKind::Export {
            n += 1;
        }
        match self.peek_kind(n) {
            TokenKind::Mutable
            | TokenKind::Any
            | TokenKind::Question
            | TokenKind::Mul
            | TokenKind::LBracket => true,
            TokenKind::Void => self.peek_kind(n + 1) == TokenKind::Identifier,
            TokenKind::Identifier => {
                let mut k = n + 1;
                while self.peek_kind(k) == TokenKind::Dot
                    && self.peek_kind(k + 1) == TokenKind::Identifier
                {
                    k += 2;
                }
                self.peek_kind(k) == TokenKind::Identifier
            }
            _ => false,
        }
    }

    fn parse_variable_decl(&mut self) -> ParseResult<Option<AstNode>> {
        if !self.variable_decl_ahead() {
            return Ok(None);
        }
        let decl = self.parse_variable_decl_body()?;
        self.chomp_if(TokenKind::Semicolon);
        Ok(Some(decl))
    }

    // @comptime? export? mutable? (TypeExpr / any) IDENT (= Expr)?
    fn parse_variable_decl_body(&mut self) -> ParseResult<AstNode> {
        let is_comptime = self.chomp_if(TokenKind::AttrComptime).is_some();
        let is_export = self.chomp_if(TokenKind::Export).is_some();
        let is_mutable = self.chomp_if(TokenKind::Mutable).is_some();

        let type_expr = if self.chomp_if(TokenKind::Any).is_some() {
            None
        } else {
            Some(self.expect_type_expr(
                "a type. Use `any` to let the compiler infer the type",
            )?)
        };

        let name = self.expect_identifier("a variable name")?;
        let init = if self.chomp_if(TokenKind::Eq).is_some() {
            Some(Box::new(self.expect_expr("an initializer expression")?))
        } else {
            None
        };

        Ok(AstNode::VariableDecl(VariableDecl {
            name,
            type_expr,
            init,
            visibility: visibility(is_export),
            is_mutable,
            is_comptime,
            is_local: !self.is_in_global_context,
        }))
    }

    // Attribute? export? func IDENT? ParamList -> TypeExpr (; / Block)
    fn parse_func_decl(&mut self) -> ParseResult<Option<AstNode>> {
        let starts_func = match self.current_kind() {
            kind if kind.is_attribute() => true,
            TokenKind::Export => self.peek_kind(1) == TokenKind::Func,
            TokenKind::Func => true,
            _ => false,
        };
        if !starts_func {
            return Ok(None);
        }

        let attribute = match self.current_kind() {
            TokenKind::AttrNoReturn => Some(FuncAttribute::NoReturn),
            TokenKind::AttrComptime => Some(FuncAttribute::Comptime),
            TokenKind::AttrInline => Some(FuncAttribute::Inline),
            TokenKind::AttrNoInline => Some(FuncAttribute::NoInline),
            _ => None,
        };
        if attribute.is_some() {
            self.chomp(1);
            if self.current_kind().is_attribute() {
                return Err(self.error("only one attribute allowed on a function declaration"));
            }
        }

        let is_export = self.chomp_if(TokenKind::Export).is_some();
        self.expect(TokenKind::Func)?;
        let name = self.chomp_if(TokenKind::Identifier).map(|token| token.value);
        let (params, is_variadic) = self.parse_param_list()?;

        self.expect(TokenKind::Arrow)?;
        let return_type =
            self.expect_type_expr("a return type. Use `void` if the function returns nothing")?;

        let body = match self.current_kind() {
            TokenKind::Semicolon => {
                self.chomp(1);
                None
            }
            TokenKind::LBrace => Some(self.parse_block(None)?),
            _ => return Err(self.expected("a semicolon or function body")),
        };

        Ok(Some(AstNode::FuncDecl(FuncDecl {
            name,
            params,
            is_variadic,
            return_type,
            body,
            visibility: visibility(is_export),
            attribute,
        })))
    }

    // ( (Param (, Param)* (, ...)?)? ) or ( ... )
    fn parse_param_list(&mut self) -> ParseResult<(Vec<Param>, bool)> {
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        let mut is_variadic = false;

        if self.chomp_if(TokenKind::RParen).is_some() {
            return Ok((params, is_variadic));
        }

        loop {
            if self.chomp_if(TokenKind::Ellipsis).is_some() {
                is_variadic = true;
                break;
            }
            let type_expr = self.expect_type_expr("a parameter type")?;
            let name = self.expect_identifier("a parameter name")?;
            params.push(Param { name, type_expr });
            if self.chomp_if(TokenKind::Comma).is_none() {
                break;
            }
        }

        self.expect(TokenKind::RParen)?;
        Ok((params, is_variadic))
    }

    // export? (struct / enum) IDENT { ... }
    fn parse_container_decl(&mut self) -> ParseResult<Option<AstNode>> {
        let n = usize::from(self.at(TokenKind::Export));
        if !matches!(self.peek_kind(n), TokenKind::Struct | TokenKind::Enum) {
            return Ok(None);
        }

        let is_export = self.chomp_if(TokenKind::Export).is_some();
        let node = if self.chomp_if(TokenKind::Struct).is_some() {
            self.parse_struct_body(visibility(is_export))?
        } else {
            self.expect(TokenKind::Enum)?;
            self.parse_enum_body(visibility(is_export))?
        };
        self.chomp_if(TokenKind::Semicolon);
        Ok(Some(node))
    }

    fn parse_struct_body(&mut self, visibility: Visibility) -> ParseResult<AstNode> {
        let name = self.expect_identifier("a struct name")?;
        self.expect(TokenKind::LBrace)?;

        let mut fields = Vec::new();
        while !self.at(TokenKind::RBrace) {
            let type_expr = self.expect_type_expr("a field type")?;
            let field = self.expect_identifier("a field name")?;
            let default = if self.chomp_if(TokenKind::Eq).is_some() {
                Some(self.expect_expr("a default value")?)
            } else {
                None
            };
            fields.push(StructField {
                name: field,
                type_expr,
                default,
            });
            if self.chomp_if(TokenKind::Comma).is_none() {
                self.chomp_if(TokenKind::Semicolon);
            }
        }

        self.expect(TokenKind::RBrace)?;
        Ok(AstNode::StructDecl(StructDecl {
            name,
            fields,
            visibility,
        }))
    }

    fn parse_enum_body(&mut self, visibility: Visibility) -> ParseResult<AstNode> {
        let name = self.expect_identifier("an enum name")?;
        self.expect(TokenKind::LBrace)?;

        let mut variants = Vec::new();
        while let Some(variant) = self.chomp_if(TokenKind::Identifier) {
            let value = if self.chomp_if(TokenKind::Eq).is_some() {
                Some(self.expect_expr("an enum value")?)
            } else {
                None
            };
            variants.push(EnumVariant {
                name: variant.value,
                value,
            });
            self.chomp_if(TokenKind::Comma);
        }

        self.expect(TokenKind::RBrace)?;
        Ok(AstNode::EnumDecl(EnumDecl {
            name,
            variants,
            visibility,
        }))
    }

    // ---------------------------------------------------------------------
    // Statements
    // ---------------------------------------------------------------------

    /// Parse one statement inside a block. `Ok(None)` lets the block end.
    pub fn parse_statement(&mut self) -> ParseResult<Option<AstNode>> {
        self.nested(Self::parse_statement_inner)
    }

    fn parse_statement_inner(&mut self) -> ParseResult<Option<AstNode>> {
        if let Some(decl) = self.parse_variable_decl()? {
            return Ok(Some(decl));
        }
        if let Some(block) = self.parse_block_expr()? {
            self.chomp_if(TokenKind::Semicolon);
            return Ok(Some(block));
        }
        if let Some(if_expr) = self.parse_if_expr()? {
            return Ok(Some(if_expr));
        }
        if let Some(match_expr) = self.parse_match_expr()? {
            self.chomp_if(TokenKind::Semicolon);
            return Ok(Some(match_expr));
        }
        if let Some(expr) = self.parse_assignment_expr()? {
            self.chomp_if(TokenKind::Semicolon);
            return Ok(Some(expr));
        }
        Ok(None)
    }

    // { Statement* }
    fn parse_block(&mut self, label: Option<String>) -> ParseResult<Block> {
        self.expect(TokenKind::LBrace)?;

        let was_global = mem::replace(&mut self.is_in_global_context, false);
        let mut statements = Vec::new();
        while let Some(statement) = self.parse_statement()? {
            statements.push(statement);
        }
        self.is_in_global_context = was_global;

        self.expect(TokenKind::RBrace)?;
        Ok(Block { label, statements })
    }

    // (IDENT :)? Block
    fn parse_block_expr(&mut self) -> ParseResult<Option<AstNode>> {
        match (self.peek_kind(0), self.peek_kind(1), self.peek_kind(2)) {
            (TokenKind::Identifier, TokenKind::Colon, TokenKind::LBrace) => {
                let label = self.parse_block_label();
                Ok(Some(AstNode::Block(self.parse_block(label)?)))
            }
            (TokenKind::LBrace, _, _) => Ok(Some(AstNode::Block(self.parse_block(None)?))),
            _ => Ok(None),
        }
    }

    /// Consume `IDENT :` if present.
    fn parse_block_label(&mut self) -> Option<String> {
        if self.peek_kind(0) != TokenKind::Identifier || self.peek_kind(1) != TokenKind::Colon {
            return None;
        }
        let label = self.chomp_if(TokenKind::Identifier)?;
        self.chomp_if(TokenKind::Colon);
        Some(label.value)
    }

    // (IDENT :)? (Block / LoopExpr)
    fn parse_labeled_statement(&mut self) -> ParseResult<Option<AstNode>> {
        let label = self.parse_block_label();

        if self.at(TokenKind::LBrace) {
            return Ok(Some(AstNode::Block(self.parse_block(label)?)));
        }

        let has_label = label.is_some();
        if let Some(loop_expr) = self.parse_loop_expr(label)? {
            return Ok(Some(loop_expr));
        }
        if has_label {
            return Err(self.expected("a block or loop statement after the label"));
        }
        Ok(None)
    }

    // if (? Expr )? (Block / AssignmentExpr ;?) (else Statement)?
    fn parse_if_expr(&mut self) -> ParseResult<Option<AstNode>> {
        if self.chomp_if(TokenKind::If).is_none() {
            return Ok(None);
        }

        let lparen = self.chomp_if(TokenKind::LParen).is_some();
        let condition = self.expect_expr("a condition")?;
        let rparen = self.chomp_if(TokenKind::RParen).is_some();
        if lparen && !rparen {
            return Err(self.expected("a closing `)` after the condition"));
        }
        if !lparen && rparen {
            return Err(self.error("unexpected `)` after the condition without an opening `(`"));
        }

        let (then_body, is_block) = match self.parse_block_expr()? {
            Some(block) => (block, true),
            None => match self.parse_assignment_expr()? {
                Some(expr) => (expr, false),
                None => return Err(self.expected("a block or assignment expression")),
            },
        };

        let semicolon = self.chomp_if(TokenKind::Semicolon).is_some();

        let else_body = if self.chomp_if(TokenKind::Else).is_some() {
            match self.parse_statement()? {
                Some(statement) => Some(Box::new(statement)),
                None => return Err(self.expected("a statement after `else`")),
            }
        } else {
            None
        };

        if !is_block && !semicolon && else_body.is_none() {
            return Err(self.expected("`;` or `else` after the if body"));
        }

        Ok(Some(AstNode::IfExpr(IfExpr {
            condition: Box::new(condition),
            then_body: Box::new(then_body),
            else_body,
        })))
    }

    // match Expr { (else / Expr (, Expr)*) => (Block / AssignmentExpr) ,? }
    fn parse_match_expr(&mut self) -> ParseResult<Option<AstNode>> {
        if self.chomp_if(TokenKind::Match).is_none() {
            return Ok(None);
        }

        let subject = self.expect_expr("a match subject")?;
        self.expect(TokenKind::LBrace)?;

        let mut arms = Vec::new();
        while self.chomp_if(TokenKind::RBrace).is_none() {
            let pattern = if self.chomp_if(TokenKind::Else).is_some() {
                MatchPattern::Else
            } else {
                let mut values = vec![self.expect_expr("a match pattern")?];
                while self.chomp_if(TokenKind::Comma).is_some() {
                    values.push(self.expect_expr("a match pattern")?);
                }
                MatchPattern::Values(values)
            };

            self.expect(TokenKind::ArrowFat)?;

            let body = match self.parse_block_expr()? {
                Some(block) => block,
                None => match self.parse_assignment_expr()? {
                    Some(expr) => expr,
                    None => return Err(self.expected("a match arm body")),
                },
            };
            self.chomp_if(TokenKind::Comma);

            arms.push(MatchArm {
                pattern,
                body: Box::new(body),
            });
        }

        Ok(Some(AstNode::MatchExpr(MatchExpr {
            subject: Box::new(subject),
            arms,
        })))
    }

    // @inline? loop LoopHead Block
    fn parse_loop_expr(&mut self, label: Option<String>) -> ParseResult<Option<AstNode>> {
        let is_inline = self.chomp_if(TokenKind::AttrInline).is_some();
        if self.chomp_if(TokenKind::Loop).is_none() {
            if is_inline {
                return Err(self.expected("`loop` after `@inline`"));
            }
            return Ok(None);
        }

        let kind = self.parse_loop_head()?;
        let body = self.parse_block(None)?;

        Ok(Some(AstNode::LoopExpr(LoopExpr {
            label,
            is_inline,
            kind,
            body,
        })))
    }

    fn parse_loop_head(&mut self) -> ParseResult<LoopKind> {
        match (self.peek_kind(0), self.peek_kind(1)) {
            (TokenKind::LBrace, _) => Ok(LoopKind::Infinite),
            (TokenKind::Identifier, TokenKind::In) => {
                let binding = self.expect_identifier("a loop variable")?;
                self.expect(TokenKind::In)?;
                let iterable = self.expect_expr("an expression to iterate over")?;
                Ok(LoopKind::ForIn {
                    binding,
                    iterable: Box::new(iterable),
                })
            }
            (TokenKind::LParen, _) => self.parse_loop_clauses(),
            _ => {
                let condition = self.expect_expr("a loop condition")?;
                Ok(LoopKind::While {
                    condition: Box::new(condition),
                })
            }
        }
    }

    // ( Init? ; Expr? ; AssignmentExpr? )  or  ( Expr )
    fn parse_loop_clauses(&mut self) -> ParseResult<LoopKind> {
        self.expect(TokenKind::LParen)?;

        let init = if self.at(TokenKind::Semicolon) {
            None
        } else if self.variable_decl_ahead() {
            Some(Box::new(self.parse_variable_decl_body()?))
        } else {
            let Some(expr) = self.parse_assignment_expr()? else {
                return Err(self.expected("a loop initializer or condition"));
            };
            if self.chomp_if(TokenKind::RParen).is_some() {
                return Ok(LoopKind::While {
                    condition: Box::new(expr),
                });
            }
            Some(Box::new(expr))
        };
        self.expect(TokenKind::Semicolon)?;

        let condition = if self.at(TokenKind::Semicolon) {
            None
        } else {
            Some(Box::new(self.expect_expr("a loop condition")?))
        };
        self.expect(TokenKind::Semicolon)?;

        let step = if self.at(TokenKind::RParen) {
            None
        } else {
            match self.parse_assignment_expr()? {
                Some(step) => Some(Box::new(step)),
                None => return Err(self.expected("a loop step expression")),
            }
        };
        self.expect(TokenKind::RParen)?;

        Ok(LoopKind::CStyle {
            init,
            condition,
            step,
        })
    }

    // ---------------------------------------------------------------------
    // Expressions
    // ---------------------------------------------------------------------

    // Expr (AssignmentOp Expr)?
    fn parse_assignment_expr(&mut self) -> ParseResult<Option<AstNode>> {
        let Some(lhs) = self.parse_expr()? else {
            return Ok(None);
        };
        let Some(op) = assignment_op(self.current_kind()) else {
            return Ok(Some(lhs));
        };
        self.chomp(1);

        let rhs = self.expect_expr(&format!("an expression after `{}`", op.symbol()))?;
        Ok(Some(AstNode::BinaryOpExpr {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }))
    }

    /// Parse a full binary expression.
    pub fn parse_expr(&mut self) -> ParseResult<Option<AstNode>> {
        self.parse_precedence(0)
    }

    /// Precedence climbing. Once a comparison has been consumed, another
    /// operator from the comparison band in the same chain is rejected.
    fn parse_precedence(&mut self, min_prec: u8) -> ParseResult<Option<AstNode>> {
        let Some(mut lhs) = self.parse_prefix_expr()? else {
            return Ok(None);
        };
        let mut banned_prec = None;

        while let Some(entry) = lookup_precedence(self.current_kind()) {
            if entry.prec < min_prec {
                break;
            }
            if banned_prec == Some(entry.prec) {
                return Err(self.error(
                    "comparison operators cannot be chained; use parentheses to group them",
                ));
            }
            self.chomp(1);

            let Some(rhs) = self.parse_precedence(entry.prec + 1)? else {
                return Err(self.expected(&format!("an expression after `{}`", entry.op.symbol())));
            };
            lhs = AstNode::BinaryOpExpr {
                op: entry.op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };

            if entry.op.is_comparison() {
                banned_prec = Some(entry.prec);
            }
        }

        Ok(Some(lhs))
    }

    // PrefixOp* PrimaryExpr
    fn parse_prefix_expr(&mut self) -> ParseResult<Option<AstNode>> {
        self.nested(Self::parse_prefix_expr_inner)
    }

    fn parse_prefix_expr_inner(&mut self) -> ParseResult<Option<AstNode>> {
        let op = match self.current_kind() {
            TokenKind::KwNot => PrefixOp::BoolNot,
            TokenKind::Not => PrefixOp::Not,
            TokenKind::Minus => PrefixOp::Negate,
            TokenKind::Tilde => PrefixOp::BitNot,
            TokenKind::And => PrefixOp::AddressOf,
            TokenKind::Try => PrefixOp::Try,
            _ => return self.parse_primary_expr(),
        };
        self.chomp(1);

        let Some(expr) = self.parse_prefix_expr()? else {
            return Err(self.expected(&format!("an operand after `{}`", op.symbol())));
        };
        Ok(Some(AstNode::PrefixOpExpr {
            op,
            expr: Box::new(expr),
        }))
    }

    fn parse_primary_expr(&mut self) -> ParseResult<Option<AstNode>> {
        match self.current_kind() {
            TokenKind::If => self.parse_if_expr(),
            TokenKind::Match => self.parse_match_expr(),
            TokenKind::Break => {
                self.chomp(1);
                let label = self.parse_break_label()?;
                let value = self.parse_expr()?.map(Box::new);
                Ok(Some(AstNode::Break { label, value }))
            }
            TokenKind::Continue => {
                self.chomp(1);
                let label = self.parse_break_label()?;
                Ok(Some(AstNode::Continue { label }))
            }
            TokenKind::AttrComptime => Ok(Some(self.parse_attribute_expr()?)),
            TokenKind::Return => {
                self.chomp(1);
                let value = self.parse_expr()?.map(Box::new);
                Ok(Some(AstNode::Return { value }))
            }
            TokenKind::Identifier if self.peek_kind(1) == TokenKind::Colon => {
                self.parse_labeled_statement()
            }
            TokenKind::AttrInline | TokenKind::Loop => self.parse_loop_expr(None),
            TokenKind::LBrace => Ok(Some(AstNode::Block(self.parse_block(None)?))),
            _ => self.parse_atom(),
        }
    }

    // @comptime Expr
    fn parse_attribute_expr(&mut self) -> ParseResult<AstNode> {
        self.expect(TokenKind::AttrComptime)?;
        let expr = self.expect_expr("an expression after `@comptime`")?;
        Ok(AstNode::AttributeExpr {
            kind: AttributeKind::Comptime,
            expr: Box::new(expr),
        })
    }

    // (: IDENT)?
    fn parse_break_label(&mut self) -> ParseResult<Option<String>> {
        if self.chomp_if(TokenKind::Colon).is_none() {
            return Ok(None);
        }
        Ok(Some(self.expect_identifier("a label after `:`")?))
    }

    /// Identifiers, literals and parenthesized expressions, followed by
    /// any call, member or index suffixes.
    fn parse_atom(&mut self) -> ParseResult<Option<AstNode>> {
        let atom = match self.current_kind() {
            TokenKind::Identifier => {
                let token = self.expect(TokenKind::Identifier)?;
                AstNode::Identifier(token.value)
            }
            TokenKind::Integer => {
                let location = self.current().location.clone();
                let token = self.expect(TokenKind::Integer)?;
                match parse_integer(&token.value) {
                    Some(value) => AstNode::IntegerLiteral(value),
                    None => {
                        return Err(ParseError::new(
                            format!("integer literal `{}` does not fit in 64 bits", token.value),
                            location,
                        ));
                    }
                }
            }
            TokenKind::Float => {
                let location = self.current().location.clone();
                let token = self.expect(TokenKind::Float)?;
                match token.value.parse::<f64>() {
                    Ok(value) => AstNode::FloatLiteral(value),
                    Err(_) => {
                        return Err(ParseError::new(
                            format!("invalid float literal `{}`", token.value),
                            location,
                        ));
                    }
                }
            }
            TokenKind::String => {
                let token = self.expect(TokenKind::String)?;
                AstNode::StringLiteral(token.value)
            }
            TokenKind::True | TokenKind::False => {
                let token = self.current().kind;
                self.chomp(1);
                AstNode::BoolLiteral(token == TokenKind::True)
            }
            TokenKind::Null => {
                self.chomp(1);
                AstNode::NullLiteral
            }
            TokenKind::LParen => {
                self.chomp(1);
                let inner = self.expect_expr("an expression after `(`")?;
                self.expect(TokenKind::RParen)?;
                inner
            }
            _ => return Ok(None),
        };
        self.parse_suffixes(atom).map(Some)
    }

    fn parse_suffixes(&mut self, mut expr: AstNode) -> ParseResult<AstNode> {
        loop {
            expr = match self.current_kind() {
                TokenKind::LParen => {
                    self.chomp(1);
                    let args = self.parse_call_args()?;
                    AstNode::CallExpr {
                        callee: Box::new(expr),
                        args,
                    }
                }
                TokenKind::Dot => {
                    self.chomp(1);
                    let member = self.expect_identifier("a member name after `.`")?;
                    AstNode::MemberExpr {
                        object: Box::new(expr),
                        member,
                    }
                }
                TokenKind::LBracket => {
                    self.chomp(1);
                    let index = self.expect_expr("an index expression")?;
                    self.expect(TokenKind::RBracket)?;
                    AstNode::IndexExpr {
                        object: Box::new(expr),
                        index: Box::new(index),
                    }
                }
                _ => return Ok(expr),
            };
        }
    }

    // (Expr (, Expr)*)? )   -- the opening paren is already consumed
    fn parse_call_args(&mut self) -> ParseResult<Vec<AstNode>> {
        let mut args = Vec::new();
        if self.chomp_if(TokenKind::RParen).is_some() {
            return Ok(args);
        }
        loop {
            args.push(self.expect_expr("a call argument")?);
            if self.chomp_if(TokenKind::Comma).is_none() {
                break;
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(args)
    }

    // ---------------------------------------------------------------------
    // Types
    // ---------------------------------------------------------------------

    // ? T / * T / [] T / [Expr] T / void / IDENT (. IDENT)*
    fn parse_type_expr(&mut self) -> ParseResult<Option<TypeExpr>> {
        self.nested(Self::parse_type_expr_inner)
    }

    fn parse_type_expr_inner(&mut self) -> ParseResult<Option<TypeExpr>> {
        let ty = match self.current_kind() {
            TokenKind::Question => {
                self.chomp(1);
                TypeExpr::Optional(Box::new(self.expect_type_expr("a type after `?`")?))
            }
            TokenKind::Mul => {
                self.chomp(1);
                TypeExpr::Pointer(Box::new(self.expect_type_expr("a type after `*`")?))
            }
            TokenKind::LBracket => {
                self.chomp(1);
                if self.chomp_if(TokenKind::RBracket).is_some() {
                    TypeExpr::Slice(Box::new(self.expect_type_expr("a slice element type")?))
                } else {
                    let len = self.expect_expr("an array length")?;
                    self.expect(TokenKind::RBracket)?;
                    TypeExpr::Array {
                        len: Box::new(len),
                        element: Box::new(self.expect_type_expr("an array element type")?),
                    }
                }
            }
            TokenKind::Void => {
                self.chomp(1);
                TypeExpr::Void
            }
            TokenKind::Identifier => {
                let mut path = vec![self.expect_identifier("a type name")?];
                while self.at(TokenKind::Dot) && self.peek_kind(1) == TokenKind::Identifier {
                    self.chomp(1);
                    path.push(self.expect_identifier("a type name")?);
                }
                TypeExpr::Named(path)
            }
            _ => return Ok(None),
        };
        Ok(Some(ty))
    }
}

fn visibility(is_export: bool) -> Visibility {
    if is_export {
        Visibility::Public
    } else {
        Visibility::Private
    }
}

fn parse_integer(text: &str) -> Option<u64> {
    let (digits, radix) = match text.get(..2) {
        Some("0x") => (&text[2..], 16),
        Some("0o") => (&text[2..], 8),
        Some("0b") => (&text[2..], 2),
        _ => (text, 10),
    };
    u64::from_str_radix(digits, radix).ok()
}
