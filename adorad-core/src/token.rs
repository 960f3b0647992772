//! Token model for the Adorad front end.

use serde::Serialize;

use crate::span::Location;

/// Kind of a token produced by the lexer.
///
/// The lexer does not attach any meaning beyond this classification;
/// the parser decides what a sequence of kinds means.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum TokenKind {
    // Special
    Eof,
    Illegal,
    Newline,

    // Identifiers and literals
    Identifier,
    Integer,
    Float,
    String,

    // Operators
    Eq,         // =
    EqEq,       // ==
    ArrowFat,   // =>
    Plus,       // +
    Incr,       // ++
    PlusEq,     // +=
    Minus,      // -
    Decr,       // --
    Arrow,      // ->
    MinusEq,    // -=
    Mul,        // *
    Pow,        // **
    MulEq,      // *=
    Div,        // /
    SlashSlash, // //
    DivEq,      // /=
    Not,        // !
    Neq,        // !=
    Mod,        // %
    ModMod,     // %%
    ModEq,      // %=
    And,        // &
    AndAnd,     // &&
    AndNot,     // &^
    AndEq,      // &=
    Or,         // |
    OrOr,       // ||
    OrEq,       // |=
    Xor,        // ^
    XorEq,      // ^=
    Question,   // ?
    Lt,         // <
    Le,         // <=
    LArrow,     // <-
    Shl,        // <<
    ShlEq,      // <<=
    Gt,         // >
    Ge,         // >=
    Shr,        // >>
    ShrEq,      // >>=
    Tilde,      // ~
    TildeEq,    // ~=

    // Separators
    Dot,       // .
    DotDot,    // ..
    Ellipsis,  // ...
    Colon,     // :
    Semicolon, // ;
    Comma,     // ,
    Backslash, // \

    // Delimiters
    LBracket, // [
    RBracket, // ]
    LBrace,   // {
    RBrace,   // }
    LParen,   // (
    RParen,   // )

    // Macros and attributes
    Macro,        // @
    AttrComptime, // @comptime
    AttrInline,   // @inline
    AttrNoInline, // @noinline
    AttrNoReturn, // @noreturn

    // Keywords
    Module,
    Import,
    Alias,
    As,
    Export,
    Mutable,
    Any,
    Func,
    Void,
    Struct,
    Enum,
    If,
    Else,
    Match,
    Loop,
    In,
    Break,
    Continue,
    Return,
    KwNot,
    Try,
    True,
    False,
    Null,
}

impl TokenKind {
    /// Look up an identifier-shaped lexeme in the keyword table.
    pub fn keyword(text: &str) -> Option<TokenKind> {
        let kind = match text {
            "module" => TokenKind::Module,
            "import" => TokenKind::Import,
            "alias" => TokenKind::Alias,
            "as" => TokenKind::As,
            "export" => TokenKind::Export,
            "mutable" => TokenKind::Mutable,
            "any" => TokenKind::Any,
            "func" => TokenKind::Func,
            "void" => TokenKind::Void,
            "struct" => TokenKind::Struct,
            "enum" => TokenKind::Enum,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "match" => TokenKind::Match,
            "loop" => TokenKind::Loop,
            "in" => TokenKind::In,
            "break" => TokenKind::Break,
            "continue" => TokenKind::Continue,
            "return" => TokenKind::Return,
            "not" => TokenKind::KwNot,
            "try" => TokenKind::Try,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            _ => return None,
        };
        Some(kind)
    }

    /// Attribute named by the identifier following an `@` sigil.
    pub fn attribute(name: &[u8]) -> Option<TokenKind> {
        match name {
            b"comptime" => Some(TokenKind::AttrComptime),
            b"inline" => Some(TokenKind::AttrInline),
            b"noinline" => Some(TokenKind::AttrNoInline),
            b"noreturn" => Some(TokenKind::AttrNoReturn),
            _ => None,
        }
    }

    pub fn is_attribute(self) -> bool {
        matches!(
            self,
            TokenKind::AttrComptime
                | TokenKind::AttrInline
                | TokenKind::AttrNoInline
                | TokenKind::AttrNoReturn
        )
    }

    /// Tokens that only carry layout information and never reach the parser.
    pub fn is_trivia(self) -> bool {
        matches!(self, TokenKind::Newline)
    }

    /// Human readable name used in diagnostics.
    pub fn name(self) -> &'static str {
        use TokenKind::*;
        match self {
            Eof => "end of file",
            Illegal => "illegal token",
            Newline => "newline",
            Identifier => "identifier",
            Integer => "integer literal",
            Float => "float literal",
            String => "string literal",
            Eq => "`=`",
            EqEq => "`==`",
            ArrowFat => "`=>`",
            Plus => "`+`",
            Incr => "`++`",
            PlusEq => "`+=`",
            Minus => "`-`",
            Decr => "`--`",
            Arrow => "`->`",
            MinusEq => "`-=`",
            Mul => "`*`",
            Pow => "`**`",
            MulEq => "`*=`",
            Div => "`/`",
            SlashSlash => "`//`",
            DivEq => "`/=`",
            Not => "`!`",
            Neq => "`!=`",
            Mod => "`%`",
            ModMod => "`%%`",
            ModEq => "`%=`",
            And => "`&`",
            AndAnd => "`&&`",
            AndNot => "`&^`",
            AndEq => "`&=`",
            Or => "`|`",
            OrOr => "`||`",
            OrEq => "`|=`",
            Xor => "`^`",
            XorEq => "`^=`",
            Question => "`?`",
            Lt => "`<`",
            Le => "`<=`",
            LArrow => "`<-`",
            Shl => "`<<`",
            ShlEq => "`<<=`",
            Gt => "`>`",
            Ge => "`>=`",
            Shr => "`>>`",
            ShrEq => "`>>=`",
            Tilde => "`~`",
            TildeEq => "`~=`",
            Dot => "`.`",
            DotDot => "`..`",
            Ellipsis => "`...`",
            Colon => "`:`",
            Semicolon => "`;`",
            Comma => "`,`",
            Backslash => "`\\`",
            LBracket => "`[`",
            RBracket => "`]`",
            LBrace => "`{`",
            RBrace => "`}`",
            LParen => "`(`",
            RParen => "`)`",
            Macro => "`@`",
            AttrComptime => "`@comptime`",
            AttrInline => "`@inline`",
            AttrNoInline => "`@noinline`",
            AttrNoReturn => "`@noreturn`",
            Module => "`module`",
            Import => "`import`",
            Alias => "`alias`",
            As => "`as`",
            Export => "`export`",
            Mutable => "`mutable`",
            Any => "`any`",
            Func => "`func`",
            Void => "`void`",
            Struct => "`struct`",
            Enum => "`enum`",
            If => "`if`",
            Else => "`else`",
            Match => "`match`",
            Loop => "`loop`",
            In => "`in`",
            Break => "`break`",
            Continue => "`continue`",
            Return => "`return`",
            KwNot => "`not`",
            Try => "`try`",
            True => "`true`",
            False => "`false`",
            Null => "`null`",
        }
    }
}

/// A single token with its kind, payload and location.
///
/// `value` holds the lexeme for identifiers, keywords and operators, the
/// decoded contents for strings, and the error message for `Illegal`
/// tokens. `len` is the number of source bytes the token covers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    pub kind: TokenKind,
    pub value: String,
    pub len: usize,
    pub location: Location,
}

impl Token {
    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind == kind
    }
}
