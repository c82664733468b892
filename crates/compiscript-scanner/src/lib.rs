//! Lexer for Compiscript source text (§4.6).
//!
//! A single-pass scanner over `&str` producing a flat `Vec<Token>`. Illegal
//! characters push a `SyntaxError` diagnostic and are skipped one byte at a
//! time rather than aborting the whole scan, so the rest of the file still
//! yields useful tokens and diagnostics.

mod token;

pub use token::{Token, TokenKind};

use compiscript_common::{Diagnostic, DiagnosticBag, DiagnosticCode, Span};

pub struct Scanner<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: usize,
    diagnostics: DiagnosticBag,
}

impl<'a> Scanner<'a> {
    pub fn new(source: &'a str) -> Self {
        Self { source, bytes: source.as_bytes(), pos: 0, diagnostics: DiagnosticBag::new() }
    }

    /// Scans the entire source, returning the token stream (always
    /// terminated by `TokenKind::Eof`) and any diagnostics collected.
    pub fn scan(mut self) -> (Vec<Token>, DiagnosticBag) {
        let mut tokens = Vec::new();
        loop {
            self.skip_trivia();
            let start = self.pos;
            let Some(ch) = self.peek() else {
                tokens.push(Token { kind: TokenKind::Eof, span: Span::at(start as u32), text: String::new() });
                break;
            };
            let token = if ch.is_ascii_alphabetic() || ch == '_' {
                self.scan_identifier_or_keyword(start)
            } else if ch.is_ascii_digit() {
                self.scan_number(start)
            } else if ch == '"' {
                self.scan_string(start)
            } else {
                self.scan_operator(start)
            };
            if let Some(token) = token {
                tokens.push(token);
            }
        }
        (tokens, self.diagnostics)
    }

    fn peek(&self) -> Option<char> {
        self.source[self.pos..].chars().next()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.source[self.pos..].chars().nth(offset)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') if self.peek_at(1) == Some('/') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                Some('/') if self.peek_at(1) == Some('*') => {
                    self.bump();
                    self.bump();
                    loop {
                        match self.peek() {
                            None => break,
                            Some('*') if self.peek_at(1) == Some('/') => {
                                self.bump();
                                self.bump();
                                break;
                            }
                            Some(_) => {
                                self.bump();
                            }
                        }
                    }
                }
                _ => break,
            }
        }
    }

    fn scan_identifier_or_keyword(&mut self, start: usize) -> Option<Token> {
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                self.bump();
            } else {
                break;
            }
        }
        let text = self.source[start..self.pos].to_string();
        let kind = TokenKind::keyword_from_str(&text).unwrap_or(TokenKind::Identifier);
        Some(Token { kind, span: Span::new(start as u32, self.pos as u32), text })
    }

    fn scan_number(&mut self, start: usize) -> Option<Token> {
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        let mut is_float = false;
        if self.peek() == Some('.') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            is_float = true;
            self.bump();
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }
        }
        let text = self.source[start..self.pos].to_string();
        let kind = if is_float { TokenKind::FloatLiteral } else { TokenKind::IntLiteral };
        Some(Token { kind, span: Span::new(start as u32, self.pos as u32), text })
    }

    fn scan_string(&mut self, start: usize) -> Option<Token> {
        self.bump(); // opening quote
        let mut value = String::new();
        loop {
            match self.peek() {
                None => {
                    self.diagnostics.error(
                        DiagnosticCode::SyntaxError,
                        "unterminated string literal",
                        Span::new(start as u32, self.pos as u32),
                    );
                    break;
                }
                Some('"') => {
                    self.bump();
                    break;
                }
                Some('\\') => {
                    self.bump();
                    match self.bump() {
                        Some('"') => value.push('"'),
                        Some('\\') => value.push('\\'),
                        Some('n') => value.push('\n'),
                        Some('t') => value.push('\t'),
                        Some(other) => value.push(other),
                        None => {}
                    }
                }
                Some(c) => {
                    value.push(c);
                    self.bump();
                }
            }
        }
        Some(Token { kind: TokenKind::StringLiteral, span: Span::new(start as u32, self.pos as u32), text: value })
    }

    fn scan_operator(&mut self, start: usize) -> Option<Token> {
        let two = |s: &Self| s.source[s.pos..].chars().take(2).collect::<String>();
        let two_char = two(self);
        for (lexeme, kind) in [
            ("==", TokenKind::EqEq),
            ("!=", TokenKind::BangEq),
            ("<=", TokenKind::LtEq),
            (">=", TokenKind::GtEq),
            ("&&", TokenKind::AmpAmp),
            ("||", TokenKind::PipePipe),
        ] {
            if two_char == lexeme {
                self.bump();
                self.bump();
                return Some(Token {
                    kind,
                    span: Span::new(start as u32, self.pos as u32),
                    text: lexeme.to_string(),
                });
            }
        }
        let ch = self.bump()?;
        let kind = match ch {
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '=' => TokenKind::Eq,
            '<' => TokenKind::Lt,
            '>' => TokenKind::Gt,
            '!' => TokenKind::Bang,
            '?' => TokenKind::Question,
            ':' => TokenKind::Colon,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            '.' => TokenKind::Dot,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            other => {
                self.diagnostics.error(
                    DiagnosticCode::SyntaxError,
                    format!("unexpected character '{other}'"),
                    Span::new(start as u32, self.pos as u32),
                );
                return None;
            }
        };
        Some(Token { kind, span: Span::new(start as u32, self.pos as u32), text: ch.to_string() })
    }
}

/// Convenience entry point mirroring `Scanner::new(src).scan()`.
pub fn scan(source: &str) -> (Vec<Token>, Vec<Diagnostic>) {
    let (tokens, diagnostics) = Scanner::new(source).scan();
    (tokens, diagnostics.into_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        let (tokens, _) = scan(src);
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn scans_var_decl() {
        assert_eq!(
            kinds("let x: integer = 10;"),
            vec![
                TokenKind::Let,
                TokenKind::Identifier,
                TokenKind::Colon,
                TokenKind::Integer,
                TokenKind::Eq,
                TokenKind::IntLiteral,
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn scans_float_literal() {
        let (tokens, _) = scan("3.14");
        assert_eq!(tokens[0].kind, TokenKind::FloatLiteral);
        assert_eq!(tokens[0].text, "3.14");
    }

    #[test]
    fn scans_string_with_escapes() {
        let (tokens, _) = scan(r#""hola \"mundo\"""#);
        assert_eq!(tokens[0].kind, TokenKind::StringLiteral);
        assert_eq!(tokens[0].text, "hola \"mundo\"");
    }

    #[test]
    fn skips_line_and_block_comments() {
        assert_eq!(kinds("// hi\n/* block */ true"), vec![TokenKind::True, TokenKind::Eof]);
    }

    #[test]
    fn illegal_character_is_skipped_with_diagnostic() {
        let (tokens, diags) = scan("let x = 1 $ 2;");
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].code, DiagnosticCode::SyntaxError);
        // scanning continues past the illegal character
        assert!(tokens.iter().any(|t| t.kind == TokenKind::IntLiteral && t.text == "2"));
    }

    #[test]
    fn recognizes_two_char_operators() {
        assert_eq!(
            kinds("a == b && c != d"),
            vec![
                TokenKind::Identifier,
                TokenKind::EqEq,
                TokenKind::Identifier,
                TokenKind::AmpAmp,
                TokenKind::Identifier,
                TokenKind::BangEq,
                TokenKind::Identifier,
                TokenKind::Eof,
            ]
        );
    }
}
