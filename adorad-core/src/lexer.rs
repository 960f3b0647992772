//! Lexer for the Adorad front end.
//!
//! The lexer works on raw bytes with single-byte (Latin-1) character
//! semantics, so any byte sequence is accepted as input. It hands out one
//! token per `next_token` call. `tokenize` drives it to the
//! end of input and produces the materialized stream the parser consumes.

use std::sync::Arc;

use tracing::{debug, trace};

use crate::error::{LexError, LexErrorKind};
use crate::span::Location;
use crate::token::{Token, TokenKind};

/// Lex a whole source buffer.
///
/// Newline tokens are dropped, the first `Illegal` token is turned into a
/// `LexError`, and the returned vector always ends with one `Eof` token.
pub fn tokenize<S>(file: impl Into<Arc<str>>, source: &S) -> Result<Vec<Token>, LexError>
where
    S: AsRef<[u8]> + ?Sized,
{
    let file = file.into();
    let mut lexer = Lexer::new(file.clone(), source);
    let mut tokens = Vec::new();

    while let Some(token) = lexer.next() {
        match token.kind {
            TokenKind::Illegal => {
                trace!(location = %token.location, message = %token.value, "lexing failed");
                let kind = lexer
                    .last_error()
                    .unwrap_or(LexErrorKind::UnexpectedCharacter);
                return Err(LexError::new(kind, token.location));
            }
            kind if kind.is_trivia() => continue,
            _ => tokens.push(token),
        }
    }

    debug!(file = %file, tokens = tokens.len(), "tokenized source");
    Ok(tokens)
}

/// Streaming lexer over a borrowed buffer.
///
/// The buffer must outlive the lexer. Once the end of input is reached,
/// every further call to `next_token` returns another `Eof` token; the
/// `Iterator` impl stops right after the first one.
pub struct Lexer<'src> {
    file: Arc<str>,
    buffer: &'src [u8],
    offset: usize,
    line: u32,
    column: u32,
    // In-progress token
    start: usize,
    start_line: u32,
    start_column: u32,
    finished: bool,
    error_kind: Option<LexErrorKind>,
}

impl<'src> Lexer<'src> {
    pub fn new<S>(file: impl Into<Arc<str>>, source: &'src S) -> Self
    where
        S: AsRef<[u8]> + ?Sized,
    {
        Lexer {
            file: file.into(),
            buffer: source.as_ref(),
            offset: 0,
            line: 1,
            column: 0,
            start: 0,
            start_line: 1,
            start_column: 1,
            finished: false,
            error_kind: None,
        }
    }

    /// Current byte offset into the buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Current (line, column) counters. The column counts bytes consumed
    /// on the current line, so it is 0 right after a newline.
    pub fn position(&self) -> (u32, u32) {
        (self.line, self.column)
    }

    /// Kind of the most recent `Illegal` token.
    pub fn last_error(&self) -> Option<LexErrorKind> {
        self.error_kind
    }

    pub fn is_eof(&self) -> bool {
        self.offset >= self.buffer.len()
    }

    /// Scan and return the next token.
    pub fn next_token(&mut self) -> Token {
        loop {
            self.skip_whitespace();
            self.begin_token();

            if self.is_eof() {
                return self.finish(TokenKind::Eof, String::new());
            }

            let ch = self.peek_current();
            let next = self.peek(1);
            let token = match ch {
                b'\n' | b'\r' => self.lex_newline(),
                _ if is_comment_start(ch, next) => match self.lex_comment() {
                    Some(illegal) => illegal,
                    None => continue,
                },
                b'"' | b'\'' => self.lex_string(),
                b'@' => self.lex_macro(),
                _ if is_ident_start(ch) => self.lex_identifier(),
                b'0'..=b'9' => self.lex_number(),
                _ if is_operator(ch) => self.lex_operator(),
                _ if is_separator(ch) => self.lex_separator(),
                _ if is_delimiter(ch) => self.lex_delimiter(),
                _ => self.error(LexErrorKind::UnexpectedCharacter),
            };
            return token;
        }
    }

    // ---------------------------------------------------------------------
    // Scanning primitives
    // ---------------------------------------------------------------------

    /// Consume the current byte and return it. Returns 0 at end of input
    /// without moving.
    fn advance(&mut self) -> u8 {
        match self.buffer.get(self.offset) {
            Some(&ch) => {
                self.offset += 1;
                self.column += 1;
                ch
            }
            None => 0,
        }
    }

    /// Look `n` bytes ahead of the cursor; 0 when out of bounds.
    fn peek(&self, n: usize) -> u8 {
        self.buffer.get(self.offset + n).copied().unwrap_or(0)
    }

    fn peek_current(&self) -> u8 {
        self.peek(0)
    }

    /// Consume `ch` if it is the current byte.
    fn eat(&mut self, ch: u8) -> bool {
        if !self.is_eof() && self.peek_current() == ch {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Consume one logical newline (`\n`, `\r` or `\r\n`) at the cursor.
    fn consume_newline(&mut self) {
        if self.advance() == b'\r' && self.peek_current() == b'\n' {
            self.offset += 1;
        }
        self.line += 1;
        self.column = 0;
    }

    /// Consume one byte, treating newlines as a single logical unit.
    fn advance_any(&mut self) {
        match self.peek_current() {
            b'\n' | b'\r' => self.consume_newline(),
            _ => {
                self.advance();
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while matches!(self.peek_current(), b' ' | b'\t' | 0x0b | 0x0c) && !self.is_eof() {
            self.advance();
        }
    }

    fn begin_token(&mut self) {
        self.start = self.offset;
        self.start_line = self.line;
        self.start_column = self.column + 1;
    }

    fn lexeme(&self) -> String {
        latin1(&self.buffer[self.start..self.offset])
    }

    fn finish(&mut self, kind: TokenKind, value: String) -> Token {
        if kind == TokenKind::Eof {
            self.finished = true;
        }
        Token {
            kind,
            value,
            len: self.offset - self.start,
            location: Location::new(
                self.file.clone(),
                self.start_line,
                self.start_column,
                self.start,
            ),
        }
    }

    fn finish_lexeme(&mut self, kind: TokenKind) -> Token {
        let value = self.lexeme();
        self.finish(kind, value)
    }

    /// Produce an `Illegal` token for `kind`, stepping over the offending
    /// byte so the next call makes progress.
    fn error(&mut self, kind: LexErrorKind) -> Token {
        if !self.is_eof() {
            self.advance_any();
        }
        self.error_kind = Some(kind);
        self.finish(TokenKind::Illegal, kind.message().to_string())
    }

    // ---------------------------------------------------------------------
    // Token scanners
    // ---------------------------------------------------------------------

    fn lex_newline(&mut self) -> Token {
        self.consume_newline();
        self.finish_lexeme(TokenKind::Newline)
    }

    /// Skip a comment. Returns an `Illegal` token only for an unterminated
    /// block comment.
    fn lex_comment(&mut self) -> Option<Token> {
        if self.peek_current() == b'/' && self.peek(1) == b'*' {
            self.advance();
            self.advance();
            loop {
                if self.is_eof() {
                    return Some(self.error(LexErrorKind::UnterminatedComment));
                }
                if self.peek_current() == b'*' && self.peek(1) == b'/' {
                    self.advance();
                    self.advance();
                    return None;
                }
                self.advance_any();
            }
        }

        // Line comment: stop in front of the newline so it is lexed on its own.
        while !self.is_eof() && !matches!(self.peek_current(), b'\n' | b'\r') {
            self.advance();
        }
        None
    }

    fn lex_operator(&mut self) -> Token {
        use TokenKind::*;

        let base = self.advance();
        let kind = match base {
            b'=' => self.extend(&[(b'=', EqEq), (b'>', ArrowFat)], Eq),
            b'+' => self.extend(&[(b'+', Incr), (b'=', PlusEq)], Plus),
            b'-' => self.extend(&[(b'-', Decr), (b'>', Arrow), (b'=', MinusEq)], Minus),
            b'*' => self.extend(&[(b'*', Pow), (b'=', MulEq)], Mul),
            b'/' => self.extend(&[(b'/', SlashSlash), (b'=', DivEq)], Div),
            b'!' => self.extend(&[(b'=', Neq)], Not),
            b'%' => self.extend(&[(b'%', ModMod), (b'=', ModEq)], Mod),
            b'&' => self.extend(&[(b'&', AndAnd), (b'^', AndNot), (b'=', AndEq)], And),
            b'|' => self.extend(&[(b'|', OrOr), (b'=', OrEq)], Or),
            b'^' => self.extend(&[(b'=', XorEq)], Xor),
            b'?' => Question,
            b'<' => match self.extend(&[(b'=', Le), (b'-', LArrow), (b'<', Shl)], Lt) {
                Shl => self.extend(&[(b'=', ShlEq)], Shl),
                kind => kind,
            },
            b'>' => match self.extend(&[(b'=', Ge), (b'>', Shr)], Gt) {
                Shr => self.extend(&[(b'=', ShrEq)], Shr),
                kind => kind,
            },
            b'~' => self.extend(&[(b'=', TildeEq)], Tilde),
            _ => return self.error(LexErrorKind::UnexpectedCharacter),
        };
        self.finish_lexeme(kind)
    }

    /// Greedy longest-match step: consume the current byte if it extends
    /// the token, in table order.
    fn extend(&mut self, table: &[(u8, TokenKind)], otherwise: TokenKind) -> TokenKind {
        for &(ch, kind) in table {
            if self.eat(ch) {
                return kind;
            }
        }
        otherwise
    }

    fn lex_separator(&mut self) -> Token {
        let kind = match self.advance() {
            b'.' => {
                if self.eat(b'.') {
                    if self.eat(b'.') {
                        TokenKind::Ellipsis
                    } else {
                        TokenKind::DotDot
                    }
                } else {
                    TokenKind::Dot
                }
            }
            b':' => TokenKind::Colon,
            b';' => TokenKind::Semicolon,
            b',' => TokenKind::Comma,
            b'\\' => TokenKind::Backslash,
            _ => return self.error(LexErrorKind::UnexpectedCharacter),
        };
        self.finish_lexeme(kind)
    }

    fn lex_delimiter(&mut self) -> Token {
        let kind = match self.advance() {
            b'[' => TokenKind::LBracket,
            b']' => TokenKind::RBracket,
            b'{' => TokenKind::LBrace,
            b'}' => TokenKind::RBrace,
            b'(' => TokenKind::LParen,
            b')' => TokenKind::RParen,
            _ => return self.error(LexErrorKind::UnexpectedCharacter),
        };
        self.finish_lexeme(kind)
    }

    /// `@name` for known attributes, otherwise a lone `@` macro sigil.
    fn lex_macro(&mut self) -> Token {
        self.advance();

        let name_len = self.buffer[self.offset..]
            .iter()
            .take_while(|&&ch| is_ident_continue(ch))
            .count();
        let name = &self.buffer[self.offset..self.offset + name_len];

        match TokenKind::attribute(name) {
            Some(kind) => {
                for _ in 0..name_len {
                    self.advance();
                }
                self.finish_lexeme(kind)
            }
            _ => self.finish_lexeme(TokenKind::Macro),
        }
    }

    fn lex_identifier(&mut self) -> Token {
        while !self.is_eof() && is_ident_continue(self.peek_current()) {
            self.advance();
        }
        let text = self.lexeme();
        let kind = TokenKind::keyword(&text).unwrap_or(TokenKind::Identifier);
        self.finish(kind, text)
    }

    fn lex_number(&mut self) -> Token {
        if self.peek_current() == b'0' && matches!(self.peek(1), b'x' | b'o' | b'b') {
            self.advance();
            let radix = match self.advance() {
                b'x' => 16,
                b'o' => 8,
                _ => 2,
            };
            let digits_start = self.offset;
            while !self.is_eof()
                && (self.peek_current() == b'_' || (self.peek_current() as char).is_digit(radix))
            {
                self.advance();
            }
            if !self.buffer[digits_start..self.offset].iter().any(|&ch| ch != b'_') {
                return self.error(LexErrorKind::MissingRadixDigits);
            }
            return self.finish_number(TokenKind::Integer);
        }

        self.eat_digits();

        let mut kind = TokenKind::Integer;
        if self.peek_current() == b'.' && self.peek(1).is_ascii_digit() {
            kind = TokenKind::Float;
            self.advance();
            self.eat_digits();
        }

        if matches!(self.peek_current(), b'e' | b'E') {
            let signed = matches!(self.peek(1), b'+' | b'-');
            let digit_at = if signed { 2 } else { 1 };
            if self.peek(digit_at).is_ascii_digit() {
                kind = TokenKind::Float;
                self.advance();
                if signed {
                    self.advance();
                }
                self.eat_digits();
            }
        }

        self.finish_number(kind)
    }

    fn eat_digits(&mut self) {
        while !self.is_eof() && matches!(self.peek_current(), b'0'..=b'9' | b'_') {
            self.advance();
        }
    }

    fn finish_number(&mut self, kind: TokenKind) -> Token {
        let value = self.lexeme().replace('_', "");
        self.finish(kind, value)
    }

    fn lex_string(&mut self) -> Token {
        let quote = self.advance();
        let mut content = Vec::new();

        loop {
            if self.is_eof() {
                return self.error(LexErrorKind::UnterminatedString);
            }

            let ch = self.peek_current();
            if ch == quote {
                self.advance();
                break;
            }

            match ch {
                b'\\' => {
                    self.advance();
                    if self.is_eof() {
                        return self.error(LexErrorKind::UnterminatedString);
                    }
                    let decoded = match self.peek_current() {
                        b'n' => b'\n',
                        b't' => b'\t',
                        b'r' => b'\r',
                        b'0' => b'\0',
                        b'\\' => b'\\',
                        b'"' => b'"',
                        b'\'' => b'\'',
                        _ => return self.error(LexErrorKind::UnknownEscape),
                    };
                    self.advance();
                    content.push(decoded);
                }
                b'\n' | b'\r' => {
                    let from = self.offset;
                    self.consume_newline();
                    content.extend_from_slice(&self.buffer[from..self.offset]);
                }
                _ => {
                    content.push(self.advance());
                }
            }
        }

        let value = latin1(&content);
        self.finish(TokenKind::String, value)
    }
}

impl Iterator for Lexer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if self.finished {
            return None;
        }
        Some(self.next_token())
    }
}

/// Decode bytes as Latin-1: every byte maps to the code point of the
/// same value.
pub fn latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

fn is_comment_start(c1: u8, c2: u8) -> bool {
    c1 == b'#' || (c1 == b'/' && matches!(c2, b'/' | b'*'))
}

fn is_ident_start(ch: u8) -> bool {
    ch.is_ascii_alphabetic() || ch == b'_'
}

fn is_ident_continue(ch: u8) -> bool {
    is_ident_start(ch) || ch.is_ascii_digit()
}

fn is_operator(ch: u8) -> bool {
    matches!(
        ch,
        b'+' | b'-' | b'*' | b'/' | b'<' | b'>' | b'!' | b'=' | b'|' | b'^' | b'%' | b'~' | b'&' | b'?'
    )
}

fn is_separator(ch: u8) -> bool {
    matches!(ch, b'.' | b':' | b';' | b',' | b'\\')
}

fn is_delimiter(ch: u8) -> bool {
    matches!(ch, b'[' | b']' | b'{' | b'}' | b'(' | b')')
}

#[cfg(test)]
mod tests {
    use super::*;
    use TokenKind::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        tokenize("test.ad", source)
            .expect("lex")
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn every_operator_lexes_to_one_token() {
        let table = [
            ("=", Eq),
            ("==", EqEq),
            ("=>", ArrowFat),
            ("+", Plus),
            ("++", Incr),
            ("+=", PlusEq),
            ("-", Minus),
            ("--", Decr),
            ("->", Arrow),
            ("-=", MinusEq),
            ("*", Mul),
            ("**", Pow),
            ("*=", MulEq),
            ("/", Div),
            ("//", SlashSlash),
            ("/=", DivEq),
            ("!", Not),
            ("!=", Neq),
            ("%", Mod),
            ("%%", ModMod),
            ("%=", ModEq),
            ("&", And),
            ("&&", AndAnd),
            ("&^", AndNot),
            ("&=", AndEq),
            ("|", Or),
            ("||", OrOr),
            ("|=", OrEq),
            ("^", Xor),
            ("^=", XorEq),
            ("?", Question),
            ("<", Lt),
            ("<=", Le),
            ("<-", LArrow),
            ("<<", Shl),
            ("<<=", ShlEq),
            (">", Gt),
            (">=", Ge),
            (">>", Shr),
            (">>=", ShrEq),
            ("~", Tilde),
            ("~=", TildeEq),
        ];

        for (lexeme, kind) in table {
            let mut lexer = Lexer::new("op.ad", lexeme);
            lexer.begin_token();
            let token = lexer.lex_operator();
            assert_eq!(token.kind, kind, "lexeme {lexeme:?}");
            assert_eq!(token.len, lexeme.len(), "lexeme {lexeme:?}");
            assert_eq!(token.value, lexeme);
            assert_eq!(lexer.offset(), lexeme.len(), "lexeme {lexeme:?}");
            assert!(lexer.is_eof());
        }
    }

    #[test]
    fn shift_without_assignment_consumes_two_bytes() {
        let mut lexer = Lexer::new("op.ad", "<<x");
        let token = lexer.next_token();
        assert_eq!(token.kind, Shl);
        assert_eq!(lexer.offset(), 2);
        assert_eq!(lexer.next_token().kind, Identifier);
    }

    #[test]
    fn digraphs_do_not_swallow_following_characters() {
        assert_eq!(kinds("a==b"), vec![Identifier, EqEq, Identifier, Eof]);
        assert_eq!(kinds("x->y"), vec![Identifier, Arrow, Identifier, Eof]);
        assert_eq!(kinds(">>=>"), vec![ShrEq, Gt, Eof]);
        assert_eq!(kinds("+++"), vec![Incr, Plus, Eof]);
    }

    #[test]
    fn separators_and_delimiters() {
        assert_eq!(
            kinds(". .. ... : ; , \\ [ ] { } ( )"),
            vec![
                Dot, DotDot, Ellipsis, Colon, Semicolon, Comma, Backslash, LBracket, RBracket,
                LBrace, RBrace, LParen, RParen, Eof
            ]
        );
    }

    #[test]
    fn crlf_counts_as_one_newline() {
        let mut crlf = Lexer::new("nl.ad", "\r\nx");
        let newline = crlf.next_token();
        assert_eq!(newline.kind, Newline);
        assert_eq!(newline.len, 2);
        assert_eq!(crlf.position(), (2, 0));
        let x_crlf = crlf.next_token();

        let mut lf = Lexer::new("nl.ad", "\nx");
        lf.next_token();
        assert_eq!(lf.position(), (2, 0));
        let x_lf = lf.next_token();

        assert_eq!(x_crlf.location.line, x_lf.location.line);
        assert_eq!(x_crlf.location.column, x_lf.location.column);
        assert_eq!(x_crlf.location.column, 1);
    }

    #[test]
    fn lone_carriage_return_is_a_newline() {
        let tokens = tokenize("nl.ad", "a\rb").expect("lex");
        assert_eq!(tokens[1].location.line, 2);
    }

    #[test]
    fn locations_are_one_based() {
        let tokens = tokenize("loc.ad", "module foo;\n  import bar").expect("lex");
        let import = &tokens[3];
        assert_eq!(import.kind, Import);
        assert_eq!((import.location.line, import.location.column), (2, 3));
        assert_eq!(import.location.offset, 14);
        assert_eq!(&*import.location.file, "loc.ad");
    }

    #[test]
    fn empty_and_truncated_input_never_panics() {
        assert_eq!(kinds(""), vec![Eof]);
        assert_eq!(kinds("<"), vec![Lt, Eof]);
        assert_eq!(kinds("a <"), vec![Identifier, Lt, Eof]);
        assert_eq!(kinds("."), vec![Dot, Eof]);
        assert_eq!(kinds("@"), vec![Macro, Eof]);

        let mut lexer = Lexer::new("eof.ad", "");
        assert_eq!(lexer.next_token().kind, Eof);
        assert_eq!(lexer.next_token().kind, Eof);
    }

    #[test]
    fn iterator_stops_after_eof() {
        let lexer = Lexer::new("it.ad", "a b");
        let all: Vec<_> = lexer.map(|t| t.kind).collect();
        assert_eq!(all, vec![Identifier, Identifier, Eof]);
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_eq!(
            kinds("module import alias as export mutable any func void _x x1"),
            vec![
                Module, Import, Alias, As, Export, Mutable, Any, Func, Void, Identifier,
                Identifier, Eof
            ]
        );
    }

    #[test]
    fn attributes_and_macros() {
        assert_eq!(
            kinds("@comptime @inline @noinline @noreturn @foo"),
            vec![AttrComptime, AttrInline, AttrNoInline, AttrNoReturn, Macro, Identifier, Eof]
        );
        assert_eq!(kinds("@inlined"), vec![Macro, Identifier, Eof]);
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(kinds("a # hash\nb"), vec![Identifier, Identifier, Eof]);
        assert_eq!(kinds("a // line\nb"), vec![Identifier, Identifier, Eof]);
        assert_eq!(kinds("a /* x */ b"), vec![Identifier, Identifier, Eof]);
        assert_eq!(kinds("a /* /* */ b"), vec![Identifier, Identifier, Eof]);
    }

    #[test]
    fn line_comment_leaves_newline_for_its_own_token() {
        let mut lexer = Lexer::new("c.ad", "// note\nx");
        assert_eq!(lexer.next_token().kind, Newline);
        assert_eq!(lexer.next_token().location.line, 2);
    }

    #[test]
    fn block_comment_tracks_lines() {
        let tokens = tokenize("c.ad", "/* one\r\ntwo\n */ x").expect("lex");
        assert_eq!(tokens[0].location.line, 3);
    }

    #[test]
    fn unterminated_block_comment_is_an_error() {
        let err = tokenize("c.ad", "a /* never closed").unwrap_err();
        assert_eq!(err.message, "unterminated block comment");
        assert_eq!(err.location.column, 3);
    }

    #[test]
    fn strings_with_either_quote() {
        let tokens = tokenize("s.ad", r#""double" 'single'"#).expect("lex");
        assert_eq!(tokens[0].kind, String);
        assert_eq!(tokens[0].value, "double");
        assert_eq!(tokens[0].len, 8);
        assert_eq!(tokens[1].value, "single");
    }

    #[test]
    fn string_escapes_are_decoded() {
        let tokens = tokenize("s.ad", r#""a\tb\n\"q\" \\ \0 'x'""#).expect("lex");
        assert_eq!(tokens[0].value, "a\tb\n\"q\" \\ \0 'x'");
    }

    #[test]
    fn unknown_escape_is_an_error() {
        let err = tokenize("s.ad", r#""bad \q""#).unwrap_err();
        assert_eq!(err.message, "unknown escape sequence");
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let err = tokenize("s.ad", "\"open").unwrap_err();
        assert_eq!(err.message, "unterminated string literal");
        let err = tokenize("s.ad", "'open\\").unwrap_err();
        assert_eq!(err.message, "unterminated string literal");
    }

    #[test]
    fn numbers() {
        let tokens = tokenize("n.ad", "42 1_000 3.14 1e9 2.5E-3 0xff 0b1010 0o17 1..2").expect("lex");
        let pairs: Vec<_> = tokens.iter().map(|t| (t.kind, t.value.as_str())).collect();
        assert_eq!(
            pairs,
            vec![
                (Integer, "42"),
                (Integer, "1000"),
                (Float, "3.14"),
                (Float, "1e9"),
                (Float, "2.5E-3"),
                (Integer, "0xff"),
                (Integer, "0b1010"),
                (Integer, "0o17"),
                (Integer, "1"),
                (DotDot, ".."),
                (Integer, "2"),
                (Eof, ""),
            ]
        );
    }

    #[test]
    fn radix_prefix_without_digits_is_an_error() {
        let err = tokenize("n.ad", "0x").unwrap_err();
        assert_eq!(err.message, "expected digits after radix prefix");
    }

    #[test]
    fn unrecognized_character_is_an_error() {
        let err = tokenize("bad.ad", "a = `b`").unwrap_err();
        assert_eq!(err.message, "unrecognized character");
        assert_eq!(err.location.column, 5);
    }

    #[test]
    fn illegal_tokens_still_make_progress() {
        let mut lexer = Lexer::new("bad.ad", "``$x");
        assert_eq!(lexer.next_token().kind, Illegal);
        assert_eq!(lexer.offset(), 1);
        assert_eq!(lexer.next_token().kind, Illegal);
        assert_eq!(lexer.next_token().kind, Illegal);
        assert_eq!(lexer.next_token().kind, Identifier);
        assert_eq!(lexer.next_token().kind, Eof);
    }

    #[test]
    fn utf8_input_is_read_one_byte_per_character() {
        let tokens = tokenize("u.ad", "\"héllo\"").expect("lex");
        assert_eq!(tokens[0].value, "h\u{c3}\u{a9}llo");
        assert_eq!(tokens[0].len, 8);
    }

    #[test]
    fn latin1_comments_and_strings() {
        let source = b"module m # caf\xe9\nstring s = \"na\xefve\"\n";
        let tokens = tokenize("l1.ad", source).expect("lex");
        assert_eq!(
            tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![Module, Identifier, Identifier, Identifier, Eq, String, Eof]
        );
        assert_eq!(tokens[5].value, "na\u{ef}ve");
        assert_eq!(tokens[5].value, "naïve");
    }

    #[test]
    fn non_ascii_byte_outside_strings_is_an_error() {
        let err = tokenize("l1.ad", b"x \xa7 y".as_slice()).unwrap_err();
        assert_eq!(err.kind, LexErrorKind::UnexpectedCharacter);
        assert_eq!(err.location.column, 3);
    }

    #[test]
    fn errors_carry_their_kind() {
        let cases: [(&str, LexErrorKind); 5] = [
            ("a = `b`", LexErrorKind::UnexpectedCharacter),
            ("\"open", LexErrorKind::UnterminatedString),
            ("/* open", LexErrorKind::UnterminatedComment),
            (r#""\q""#, LexErrorKind::UnknownEscape),
            ("0b", LexErrorKind::MissingRadixDigits),
        ];
        for (source, kind) in cases {
            let err = tokenize("k.ad", source).unwrap_err();
            assert_eq!(err.kind, kind, "{source:?}");
            assert_eq!(err.message, kind.message());
        }
    }
}
