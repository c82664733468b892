use compiscript_common::Span;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TokenKind {
    // literals & identifiers
    Identifier,
    IntLiteral,
    FloatLiteral,
    StringLiteral,

    // keywords
    Let,
    Const,
    Function,
    Class,
    Extends,
    New,
    This,
    Return,
    If,
    Else,
    While,
    Do,
    For,
    Foreach,
    In,
    Switch,
    Case,
    Default,
    Break,
    Continue,
    Print,
    True,
    False,
    Null,

    // type keywords
    Integer,
    Float,
    Boolean,
    StringType,
    Void,

    // operators & punctuation
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Eq,
    EqEq,
    BangEq,
    Lt,
    LtEq,
    Gt,
    GtEq,
    AmpAmp,
    PipePipe,
    Bang,
    Question,
    Colon,
    Comma,
    Semicolon,
    Dot,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,

    Eof,
}

impl TokenKind {
    pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
        Some(match s {
            "let" => TokenKind::Let,
            "const" => TokenKind::Const,
            "function" => TokenKind::Function,
            "class" => TokenKind::Class,
            "extends" => TokenKind::Extends,
            "new" => TokenKind::New,
            "this" => TokenKind::This,
            "return" => TokenKind::Return,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "do" => TokenKind::Do,
            "for" => TokenKind::For,
            "foreach" => TokenKind::Foreach,
            "in" => TokenKind::In,
            "switch" => TokenKind::Switch,
            "case" => TokenKind::Case,
            "default" => TokenKind::Default,
            "break" => TokenKind::Break,
            "continue" => TokenKind::Continue,
            "print" => TokenKind::Print,
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            "integer" => TokenKind::Integer,
            "float" => TokenKind::Float,
            "boolean" => TokenKind::Boolean,
            "string" => TokenKind::StringType,
            "void" => TokenKind::Void,
            _ => return None,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    /// The lexeme (string literals hold the already-unescaped value).
    pub text: String,
}
