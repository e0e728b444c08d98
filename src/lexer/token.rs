//! Token definitions for the PHP lexer

use std::fmt;

/// Position in source code
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
    pub line: usize,
    pub column: usize,
}

impl Span {
    pub fn new(start: usize, end: usize, line: usize, column: usize) -> Self {
        Self {
            start,
            end,
            line,
            column,
        }
    }
}

/// Token types for the supported PHP subset
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    // Literals
    Int(i64),
    Float(f64),
    String(String),
    /// Double-quoted string with embedded variables, kept as written
    InterpolatedString(String),

    /// `$name`, stored without the sigil
    Variable(String),
    Identifier(String),

    // Keywords
    Function,
    Fn,
    Use,
    Return,
    If,
    ElseIf,
    Else,
    While,
    For,
    Foreach,
    As,
    Echo,
    Declare,
    New,
    LogicalAnd, // and
    LogicalOr,  // or

    // Operators
    Plus,               // +
    Minus,              // -
    Star,               // *
    StarStar,           // **
    Slash,              // /
    Percent,            // %
    Dot,                // .
    Equal,              // =
    EqualEqual,         // ==
    Identical,          // ===
    NotEqual,           // != or <>
    NotIdentical,       // !==
    Less,               // <
    LessEqual,          // <=
    Greater,            // >
    GreaterEqual,       // >=
    Spaceship,          // <=>
    And,                // &&
    Or,                 // ||
    Not,                // !
    Question,           // ?
    Coalesce,           // ??
    Increment,          // ++
    Decrement,          // --

    // Compound assignment operators
    PlusAssign,     // +=
    MinusAssign,    // -=
    StarAssign,     // *=
    SlashAssign,    // /=
    DotAssign,      // .=
    PercentAssign,  // %=
    CoalesceAssign, // ??=

    // Delimiters
    LeftParen,    // (
    RightParen,   // )
    LeftBrace,    // {
    RightBrace,   // }
    LeftBracket,  // [
    RightBracket, // ]
    Comma,        // ,
    Colon,        // :
    DoubleColon,  // ::
    Semicolon,    // ;
    Arrow,        // ->
    FatArrow,     // =>
    Ellipsis,     // ...
    Ampersand,    // &
    Pipe,         // |

    Eof,
}

impl TokenKind {
    /// PHP keywords are case-insensitive
    pub fn keyword_from_str(s: &str) -> Option<TokenKind> {
        match s.to_ascii_lowercase().as_str() {
            "function" => Some(TokenKind::Function),
            "fn" => Some(TokenKind::Fn),
            "use" => Some(TokenKind::Use),
            "return" => Some(TokenKind::Return),
            "if" => Some(TokenKind::If),
            "elseif" => Some(TokenKind::ElseIf),
            "else" => Some(TokenKind::Else),
            "while" => Some(TokenKind::While),
            "for" => Some(TokenKind::For),
            "foreach" => Some(TokenKind::Foreach),
            "as" => Some(TokenKind::As),
            "echo" => Some(TokenKind::Echo),
            "declare" => Some(TokenKind::Declare),
            "new" => Some(TokenKind::New),
            "and" => Some(TokenKind::LogicalAnd),
            "or" => Some(TokenKind::LogicalOr),
            _ => None,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenKind::Int(n) => write!(f, "{}", n),
            TokenKind::Float(n) => write!(f, "{}", n),
            TokenKind::String(s) => write!(f, "'{}'", s),
            TokenKind::InterpolatedString(s) => write!(f, "\"{}\"", s),
            TokenKind::Variable(name) => write!(f, "${}", name),
            TokenKind::Identifier(s) => write!(f, "{}", s),
            TokenKind::Function => write!(f, "function"),
            TokenKind::Fn => write!(f, "fn"),
            TokenKind::Use => write!(f, "use"),
            TokenKind::Return => write!(f, "return"),
            TokenKind::If => write!(f, "if"),
            TokenKind::ElseIf => write!(f, "elseif"),
            TokenKind::Else => write!(f, "else"),
            TokenKind::While => write!(f, "while"),
            TokenKind::For => write!(f, "for"),
            TokenKind::Foreach => write!(f, "foreach"),
            TokenKind::As => write!(f, "as"),
            TokenKind::Echo => write!(f, "echo"),
            TokenKind::Declare => write!(f, "declare"),
            TokenKind::New => write!(f, "new"),
            TokenKind::LogicalAnd => write!(f, "and"),
            TokenKind::LogicalOr => write!(f, "or"),
            TokenKind::Plus => write!(f, "+"),
            TokenKind::Minus => write!(f, "-"),
            TokenKind::Star => write!(f, "*"),
            TokenKind::StarStar => write!(f, "**"),
            TokenKind::Slash => write!(f, "/"),
            TokenKind::Percent => write!(f, "%"),
            TokenKind::Dot => write!(f, "."),
            TokenKind::Equal => write!(f, "="),
            TokenKind::EqualEqual => write!(f, "=="),
            TokenKind::Identical => write!(f, "==="),
            TokenKind::NotEqual => write!(f, "!="),
            TokenKind::NotIdentical => write!(f, "!=="),
            TokenKind::Less => write!(f, "<"),
            TokenKind::LessEqual => write!(f, "<="),
            TokenKind::Greater => write!(f, ">"),
            TokenKind::GreaterEqual => write!(f, ">="),
            TokenKind::Spaceship => write!(f, "<=>"),
            TokenKind::And => write!(f, "&&"),
            TokenKind::Or => write!(f, "||"),
            TokenKind::Not => write!(f, "!"),
            TokenKind::Question => write!(f, "?"),
            TokenKind::Coalesce => write!(f, "??"),
            TokenKind::Increment => write!(f, "++"),
            TokenKind::Decrement => write!(f, "--"),
            TokenKind::PlusAssign => write!(f, "+="),
            TokenKind::MinusAssign => write!(f, "-="),
            TokenKind::StarAssign => write!(f, "*="),
            TokenKind::SlashAssign => write!(f, "/="),
            TokenKind::DotAssign => write!(f, ".="),
            TokenKind::PercentAssign => write!(f, "%="),
            TokenKind::CoalesceAssign => write!(f, "??="),
            TokenKind::LeftParen => write!(f, "("),
            TokenKind::RightParen => write!(f, ")"),
            TokenKind::LeftBrace => write!(f, "{{"),
            TokenKind::RightBrace => write!(f, "}}"),
            TokenKind::LeftBracket => write!(f, "["),
            TokenKind::RightBracket => write!(f, "]"),
            TokenKind::Comma => write!(f, ","),
            TokenKind::Colon => write!(f, ":"),
            TokenKind::DoubleColon => write!(f, "::"),
            TokenKind::Semicolon => write!(f, ";"),
            TokenKind::Arrow => write!(f, "->"),
            TokenKind::FatArrow => write!(f, "=>"),
            TokenKind::Ellipsis => write!(f, "..."),
            TokenKind::Ampersand => write!(f, "&"),
            TokenKind::Pipe => write!(f, "|"),
            TokenKind::Eof => write!(f, "EOF"),
        }
    }
}

/// A token with its kind and source position
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub lexeme: String,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span, lexeme: String) -> Self {
        Self { kind, span, lexeme }
    }
}
