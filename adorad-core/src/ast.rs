//! Abstract syntax tree for the Adorad front end.
//!
//! Every child edge is an owning `Box`/`Vec`, so the tree has no shared
//! or back references. Nodes are built by the parser and are read-only
//! for later stages.
//!
//! `Display` renders nodes as compact s-expressions, e.g. `a + b * c`
//! prints as `(+ a (* b c))`.

use std::fmt;

use serde::Serialize;

/// Result of parsing one compilation unit.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceUnit {
    /// Name given by the first `module` statement, if any.
    pub module_name: Option<String>,
    /// Number of source lines in the unit.
    pub num_lines: u32,
    pub items: Vec<AstNode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Visibility {
    Public,
    Private,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum AstNode {
    // Declarations
    ModuleStatement { name: String },
    ImportStatement { name: String },
    AliasDecl { original: String, alias: String },
    VariableDecl(VariableDecl),
    FuncDecl(FuncDecl),
    StructDecl(StructDecl),
    EnumDecl(EnumDecl),

    // Statements and control flow
    Block(Block),
    IfExpr(IfExpr),
    MatchExpr(MatchExpr),
    LoopExpr(LoopExpr),
    Break {
        label: Option<String>,
        value: Option<Box<AstNode>>,
    },
    Continue {
        label: Option<String>,
    },
    Return {
        value: Option<Box<AstNode>>,
    },

    // Operators
    BinaryOpExpr {
        op: BinaryOp,
        lhs: Box<AstNode>,
        rhs: Box<AstNode>,
    },
    PrefixOpExpr {
        op: PrefixOp,
        expr: Box<AstNode>,
    },
    AttributeExpr {
        kind: AttributeKind,
        expr: Box<AstNode>,
    },
    CallExpr {
        callee: Box<AstNode>,
        args: Vec<AstNode>,
    },
    MemberExpr {
        object: Box<AstNode>,
        member: String,
    },
    IndexExpr {
        object: Box<AstNode>,
        index: Box<AstNode>,
    },

    // Atoms
    Identifier(String),
    IntegerLiteral(u64),
    FloatLiteral(f64),
    StringLiteral(String),
    BoolLiteral(bool),
    NullLiteral,
}

impl AstNode {
    /// Name of the node variant, used in logs and diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            AstNode::ModuleStatement { .. } => "ModuleStatement",
            AstNode::ImportStatement { .. } => "ImportStatement",
            AstNode::AliasDecl { .. } => "AliasDecl",
            AstNode::VariableDecl(_) => "VariableDecl",
            AstNode::FuncDecl(_) => "FuncDecl",
            AstNode::StructDecl(_) => "StructDecl",
            AstNode::EnumDecl(_) => "EnumDecl",
            AstNode::Block(_) => "Block",
            AstNode::IfExpr(_) => "IfExpr",
            AstNode::MatchExpr(_) => "MatchExpr",
            AstNode::LoopExpr(_) => "LoopExpr",
            AstNode::Break { .. } => "Break",
            AstNode::Continue { .. } => "Continue",
            AstNode::Return { .. } => "Return",
            AstNode::BinaryOpExpr { .. } => "BinaryOpExpr",
            AstNode::PrefixOpExpr { .. } => "PrefixOpExpr",
            AstNode::AttributeExpr { .. } => "AttributeExpr",
            AstNode::CallExpr { .. } => "CallExpr",
            AstNode::MemberExpr { .. } => "MemberExpr",
            AstNode::IndexExpr { .. } => "IndexExpr",
            AstNode::Identifier(_) => "Identifier",
            AstNode::IntegerLiteral(_) => "IntegerLiteral",
            AstNode::FloatLiteral(_) => "FloatLiteral",
            AstNode::StringLiteral(_) => "StringLiteral",
            AstNode::BoolLiteral(_) => "BoolLiteral",
            AstNode::NullLiteral => "NullLiteral",
        }
    }

    pub fn is_identifier(&self, name: &str) -> bool {
        matches!(self, AstNode::Identifier(n) if n == name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VariableDecl {
    pub name: String,
    /// `None` when declared with `any` and left to inference.
    pub type_expr: Option<TypeExpr>,
    pub init: Option<Box<AstNode>>,
    pub visibility: Visibility,
    pub is_mutable: bool,
    pub is_comptime: bool,
    /// Declared inside a block rather than at module scope.
    pub is_local: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum FuncAttribute {
    NoReturn,
    Comptime,
    Inline,
    NoInline,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param {
    pub name: String,
    pub type_expr: TypeExpr,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FuncDecl {
    pub name: Option<String>,
    pub params: Vec<Param>,
    pub is_variadic: bool,
    pub return_type: TypeExpr,
    /// `None` for a prototype ending in `;`.
    pub body: Option<Block>,
    pub visibility: Visibility,
    pub attribute: Option<FuncAttribute>,
}

impl FuncDecl {
    pub fn has_attribute(&self, attribute: FuncAttribute) -> bool {
        self.attribute == Some(attribute)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructField {
    pub name: String,
    pub type_expr: TypeExpr,
    pub default: Option<AstNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StructDecl {
    pub name: String,
    pub fields: Vec<StructField>,
    pub visibility: Visibility,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumVariant {
    pub name: String,
    pub value: Option<AstNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnumDecl {
    pub name: String,
    pub variants: Vec<EnumVariant>,
    pub visibility: Visibility,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    pub label: Option<String>,
    pub statements: Vec<AstNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IfExpr {
    pub condition: Box<AstNode>,
    pub then_body: Box<AstNode>,
    pub else_body: Option<Box<AstNode>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum MatchPattern {
    /// The `else` catch-all arm.
    Else,
    Values(Vec<AstNode>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchArm {
    pub pattern: MatchPattern,
    pub body: Box<AstNode>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MatchExpr {
    pub subject: Box<AstNode>,
    pub arms: Vec<MatchArm>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum LoopKind {
    /// `loop { ... }`
    Infinite,
    /// `loop cond { ... }`
    While { condition: Box<AstNode> },
    /// `loop (init; cond; step) { ... }`
    CStyle {
        init: Option<Box<AstNode>>,
        condition: Option<Box<AstNode>>,
        step: Option<Box<AstNode>>,
    },
    /// `loop item in items { ... }`
    ForIn {
        binding: String,
        iterable: Box<AstNode>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoopExpr {
    pub label: Option<String>,
    pub is_inline: bool,
    pub kind: LoopKind,
    pub body: Block,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TypeExpr {
    Void,
    /// A possibly qualified type name, e.g. `std.io.File`.
    Named(Vec<String>),
    Optional(Box<TypeExpr>),
    Pointer(Box<TypeExpr>),
    Slice(Box<TypeExpr>),
    Array {
        len: Box<AstNode>,
        element: Box<TypeExpr>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BinaryOp {
    Mul,
    Mod,
    Div,
    Add,
    Sub,
    Shl,
    Shr,
    Lt,
    Gt,
    Eq,
    Ne,
    Le,
    Ge,
    BoolAnd,
    BoolOr,
    Assign,
    AddAssign,
    SubAssign,
    MulAssign,
    DivAssign,
    ModAssign,
    ShlAssign,
    ShrAssign,
    AndAssign,
    XorAssign,
    OrAssign,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Mul => "*",
            BinaryOp::Mod => "%",
            BinaryOp::Div => "/",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::Lt => "<",
            BinaryOp::Gt => ">",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Le => "<=",
            BinaryOp::Ge => ">=",
            BinaryOp::BoolAnd => "&&",
            BinaryOp::BoolOr => "||",
            BinaryOp::Assign => "=",
            BinaryOp::AddAssign => "+=",
            BinaryOp::SubAssign => "-=",
            BinaryOp::MulAssign => "*=",
            BinaryOp::DivAssign => "/=",
            BinaryOp::ModAssign => "%=",
            BinaryOp::ShlAssign => "<<=",
            BinaryOp::ShrAssign => ">>=",
            BinaryOp::AndAssign => "&=",
            BinaryOp::XorAssign => "^=",
            BinaryOp::OrAssign => "|=",
        }
    }

    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            BinaryOp::Lt | BinaryOp::Gt | BinaryOp::Eq | BinaryOp::Ne | BinaryOp::Le | BinaryOp::Ge
        )
    }

    pub fn is_assignment(self) -> bool {
        matches!(
            self,
            BinaryOp::Assign
                | BinaryOp::AddAssign
                | BinaryOp::SubAssign
                | BinaryOp::MulAssign
                | BinaryOp::DivAssign
                | BinaryOp::ModAssign
                | BinaryOp::ShlAssign
                | BinaryOp::ShrAssign
                | BinaryOp::AndAssign
                | BinaryOp::XorAssign
                | BinaryOp::OrAssign
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PrefixOp {
    /// `not`
    BoolNot,
    /// `!`
    Not,
    /// `-`
    Negate,
    /// `~`
    BitNot,
    /// `&`
    AddressOf,
    /// `try`
    Try,
}

impl PrefixOp {
    pub fn symbol(self) -> &'static str {
        match self {
            PrefixOp::BoolNot => "not",
            PrefixOp::Not => "!",
            PrefixOp::Negate => "-",
            PrefixOp::BitNot => "~",
            PrefixOp::AddressOf => "&",
            PrefixOp::Try => "try",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AttributeKind {
    Comptime,
}

// ---------------------------------------------------------------------
// S-expression rendering
// ---------------------------------------------------------------------

impl fmt::Display for SourceUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for item in &self.items {
            writeln!(f, "{item}")?;
        }
        Ok(())
    }
}

impl fmt::Display for AstNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AstNode::ModuleStatement { name } => write!(f, "(module {name})"),
            AstNode::ImportStatement { name } => write!(f, "(import {name})"),
            AstNode::AliasDecl { original, alias } => write!(f, "(alias {original} {alias})"),
            AstNode::VariableDecl(decl) => write!(f, "{decl}"),
            AstNode::FuncDecl(decl) => write!(f, "{decl}"),
            AstNode::StructDecl(decl) => {
                write!(f, "(struct {}", decl.name)?;
                for field in &decl.fields {
                    write!(f, " ({} {}", field.type_expr, field.name)?;
                    if let Some(default) = &field.default {
                        write!(f, " {default}")?;
                    }
                    write!(f, ")")?;
                }
                write!(f, ")")
            }
            AstNode::EnumDecl(decl) => {
                write!(f, "(enum {}", decl.name)?;
                for variant in &decl.variants {
                    match &variant.value {
                        Some(value) => write!(f, " ({} {value})", variant.name)?,
                        None => write!(f, " {}", variant.name)?,
                    }
                }
                write!(f, ")")
            }
            AstNode::Block(block) => write!(f, "{block}"),
            AstNode::IfExpr(if_expr) => {
                write!(f, "(if {} {}", if_expr.condition, if_expr.then_body)?;
                if let Some(else_body) = &if_expr.else_body {
                    write!(f, " {else_body}")?;
                }
                write!(f, ")")
            }
            AstNode::MatchExpr(match_expr) => {
                write!(f, "(match {}", match_expr.subject)?;
                for arm in &match_expr.arms {
                    match &arm.pattern {
                        MatchPattern::Else => write!(f, " (else")?,
                        MatchPattern::Values(values) => {
                            write!(f, " (")?;
                            write_list(f, values)?;
                        }
                    }
                    write!(f, " => {})", arm.body)?;
                }
                write!(f, ")")
            }
            AstNode::LoopExpr(loop_expr) => write!(f, "{loop_expr}"),
            AstNode::Break { label, value } => {
                write!(f, "(break")?;
                if let Some(label) = label {
                    write!(f, " :{label}")?;
                }
                if let Some(value) = value {
                    write!(f, " {value}")?;
                }
                write!(f, ")")
            }
            AstNode::Continue { label } => match label {
                Some(label) => write!(f, "(continue :{label})"),
                None => write!(f, "(continue)"),
            },
            AstNode::Return { value } => match value {
                Some(value) => write!(f, "(return {value})"),
                None => write!(f, "(return)"),
            },
            AstNode::BinaryOpExpr { op, lhs, rhs } => write!(f, "({} {lhs} {rhs})", op.symbol()),
            AstNode::PrefixOpExpr { op, expr } => write!(f, "({} {expr})", op.symbol()),
            AstNode::AttributeExpr { kind, expr } => match kind {
                AttributeKind::Comptime => write!(f, "(@comptime {expr})"),
            },
            AstNode::CallExpr { callee, args } => {
                write!(f, "(call {callee}")?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                write!(f, ")")
            }
            AstNode::MemberExpr { object, member } => write!(f, "(. {object} {member})"),
            AstNode::IndexExpr { object, index } => write!(f, "([] {object} {index})"),
            AstNode::Identifier(name) => write!(f, "{name}"),
            AstNode::IntegerLiteral(value) => write!(f, "{value}"),
            AstNode::FloatLiteral(value) => write!(f, "{value:?}"),
            AstNode::StringLiteral(value) => write!(f, "{value:?}"),
            AstNode::BoolLiteral(value) => write!(f, "{value}"),
            AstNode::NullLiteral => write!(f, "null"),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, nodes: &[AstNode]) -> fmt::Result {
    for (i, node) in nodes.iter().enumerate() {
        if i > 0 {
            write!(f, " ")?;
        }
        write!(f, "{node}")?;
    }
    Ok(())
}

impl fmt::Display for VariableDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(var")?;
        if self.visibility == Visibility::Public {
            write!(f, " export")?;
        }
        if self.is_comptime {
            write!(f, " comptime")?;
        }
        if self.is_mutable {
            write!(f, " mutable")?;
        }
        match &self.type_expr {
            Some(ty) => write!(f, " {ty}")?,
            None => write!(f, " any")?,
        }
        write!(f, " {}", self.name)?;
        if let Some(init) = &self.init {
            write!(f, " {init}")?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for FuncDecl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(func")?;
        if let Some(attribute) = self.attribute {
            let name = match attribute {
                FuncAttribute::NoReturn => "@noreturn",
                FuncAttribute::Comptime => "@comptime",
                FuncAttribute::Inline => "@inline",
                FuncAttribute::NoInline => "@noinline",
            };
            write!(f, " {name}")?;
        }
        if self.visibility == Visibility::Public {
            write!(f, " export")?;
        }
        if let Some(name) = &self.name {
            write!(f, " {name}")?;
        }
        write!(f, " (")?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "({} {})", param.type_expr, param.name)?;
        }
        if self.is_variadic {
            if !self.params.is_empty() {
                write!(f, " ")?;
            }
            write!(f, "...")?;
        }
        write!(f, ") {}", self.return_type)?;
        if let Some(body) = &self.body {
            write!(f, " {body}")?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for Block {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(block")?;
        if let Some(label) = &self.label {
            write!(f, " {label}:")?;
        }
        for statement in &self.statements {
            write!(f, " {statement}")?;
        }
        write!(f, ")")
    }
}

impl fmt::Display for LoopExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(loop")?;
        if let Some(label) = &self.label {
            write!(f, " {label}:")?;
        }
        if self.is_inline {
            write!(f, " @inline")?;
        }
        match &self.kind {
            LoopKind::Infinite => {}
            LoopKind::While { condition } => write!(f, " (while {condition})")?,
            LoopKind::CStyle {
                init,
                condition,
                step,
            } => {
                write!(f, " (")?;
                for (i, clause) in [init, condition, step].into_iter().enumerate() {
                    if i > 0 {
                        write!(f, "; ")?;
                    }
                    if let Some(clause) = clause {
                        write!(f, "{clause}")?;
                    }
                }
                write!(f, ")")?;
            }
            LoopKind::ForIn { binding, iterable } => write!(f, " ({binding} in {iterable})")?,
        }
        write!(f, " {})", self.body)
    }
}

impl fmt::Display for TypeExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeExpr::Void => write!(f, "void"),
            TypeExpr::Named(path) => write!(f, "{}", path.join(".")),
            TypeExpr::Optional(inner) => write!(f, "?{inner}"),
            TypeExpr::Pointer(inner) => write!(f, "*{inner}"),
            TypeExpr::Slice(inner) => write!(f, "[]{inner}"),
            TypeExpr::Array { len, element } => write!(f, "[{len}]{element}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Box<AstNode> {
        Box::new(AstNode::Identifier(name.to_string()))
    }

    #[test]
    fn renders_nested_binary_operators() {
        let node = AstNode::BinaryOpExpr {
            op: BinaryOp::Add,
            lhs: ident("a"),
            rhs: Box::new(AstNode::BinaryOpExpr {
                op: BinaryOp::Mul,
                lhs: ident("b"),
                rhs: ident("c"),
            }),
        };
        assert_eq!(node.to_string(), "(+ a (* b c))");
        assert_eq!(node.kind_name(), "BinaryOpExpr");
    }

    #[test]
    fn renders_types() {
        let ty = TypeExpr::Optional(Box::new(TypeExpr::Array {
            len: Box::new(AstNode::IntegerLiteral(4)),
            element: Box::new(TypeExpr::Named(vec!["std".into(), "Byte".into()])),
        }));
        assert_eq!(ty.to_string(), "?[4]std.Byte");
    }

    #[test]
    fn operator_classification() {
        assert!(BinaryOp::Le.is_comparison());
        assert!(!BinaryOp::BoolAnd.is_comparison());
        assert!(BinaryOp::ShlAssign.is_assignment());
        assert!(!BinaryOp::Shl.is_assignment());
    }
}
