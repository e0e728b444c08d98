//! PHP Lexer
//!
//! Converts PHP source code into a stream of tokens for parsing.

pub mod token;

pub use token::{Span, Token, TokenKind};

use std::num::IntErrorKind;

use crate::error::{FlowError, FlowResult, SourceLocation};

/// Lexer for PHP source code
pub struct Lexer {
    chars: Vec<char>,
    filename: String,

    // Position tracking
    pos: usize,
    line: usize,
    column: usize,
    start: usize,
    start_line: usize,
    start_column: usize,
}

impl Lexer {
    pub fn new(source: &str, filename: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            filename: filename.to_string(),
            pos: 0,
            line: 1,
            column: 1,
            start: 0,
            start_line: 1,
            start_column: 1,
        }
    }

    /// Tokenize the entire source code
    pub fn tokenize(&mut self) -> FlowResult<Vec<Token>> {
        let mut tokens = Vec::new();

        loop {
            self.skip_whitespace_and_comments()?;

            if self.is_at_end() {
                break;
            }

            self.start = self.pos;
            self.start_line = self.line;
            self.start_column = self.column;

            tokens.push(self.scan_token()?);
        }

        tokens.push(Token::new(
            TokenKind::Eof,
            Span::new(self.pos, self.pos, self.line, self.column),
            String::new(),
        ));

        Ok(tokens)
    }

    fn scan_token(&mut self) -> FlowResult<Token> {
        let c = self.advance();

        let kind = match c {
            // Single character tokens
            '(' => TokenKind::LeftParen,
            ')' => TokenKind::RightParen,
            '{' => TokenKind::LeftBrace,
            '}' => TokenKind::RightBrace,
            '[' => TokenKind::LeftBracket,
            ']' => TokenKind::RightBracket,
            ',' => TokenKind::Comma,
            ':' => {
                if self.match_char(':') {
                    TokenKind::DoubleColon
                } else {
                    TokenKind::Colon
                }
            }
            ';' => TokenKind::Semicolon,

            // Potentially multi-character tokens
            '+' => {
                if self.match_char('+') {
                    TokenKind::Increment
                } else if self.match_char('=') {
                    TokenKind::PlusAssign
                } else {
                    TokenKind::Plus
                }
            }
            '-' => {
                if self.match_char('>') {
                    TokenKind::Arrow
                } else if self.match_char('-') {
                    TokenKind::Decrement
                } else if self.match_char('=') {
                    TokenKind::MinusAssign
                } else {
                    TokenKind::Minus
                }
            }
            '*' => {
                if self.match_char('*') {
                    TokenKind::StarStar
                } else if self.match_char('=') {
                    TokenKind::StarAssign
                } else {
                    TokenKind::Star
                }
            }
            '/' => {
                if self.match_char('=') {
                    TokenKind::SlashAssign
                } else {
                    TokenKind::Slash
                }
            }
            '%' => {
                if self.match_char('=') {
                    TokenKind::PercentAssign
                } else {
                    TokenKind::Percent
                }
            }
            '.' => {
                if self.peek().is_ascii_digit() {
                    self.scan_number(c)?
                } else if self.peek() == '.' && self.peek_next() == '.' {
                    self.advance();
                    self.advance();
                    TokenKind::Ellipsis
                } else if self.match_char('=') {
                    TokenKind::DotAssign
                } else {
                    TokenKind::Dot
                }
            }
            '=' => {
                if self.match_char('=') {
                    if self.match_char('=') {
                        TokenKind::Identical
                    } else {
                        TokenKind::EqualEqual
                    }
                } else if self.match_char('>') {
                    TokenKind::FatArrow
                } else {
                    TokenKind::Equal
                }
            }
            '!' => {
                if self.match_char('=') {
                    if self.match_char('=') {
                        TokenKind::NotIdentical
                    } else {
                        TokenKind::NotEqual
                    }
                } else {
                    TokenKind::Not
                }
            }
            '<' => {
                if self.match_char('=') {
                    if self.match_char('>') {
                        TokenKind::Spaceship
                    } else {
                        TokenKind::LessEqual
                    }
                } else if self.match_char('>') {
                    TokenKind::NotEqual
                } else {
                    TokenKind::Less
                }
            }
            '>' => {
                if self.match_char('=') {
                    TokenKind::GreaterEqual
                } else {
                    TokenKind::Greater
                }
            }
            '?' => {
                if self.match_char('?') {
                    if self.match_char('=') {
                        TokenKind::CoalesceAssign
                    } else {
                        TokenKind::Coalesce
                    }
                } else {
                    TokenKind::Question
                }
            }
            '&' => {
                if self.match_char('&') {
                    TokenKind::And
                } else {
                    TokenKind::Ampersand
                }
            }
            '|' => {
                if self.match_char('|') {
                    TokenKind::Or
                } else {
                    TokenKind::Pipe
                }
            }

            '$' => self.scan_variable()?,

            '\'' => self.scan_single_quoted()?,
            '"' => self.scan_double_quoted()?,

            '0'..='9' => self.scan_number(c)?,

            c if is_identifier_start(c) => self.scan_identifier(c),

            _ => {
                return Err(self.error(&format!("Unexpected character '{}'", c)));
            }
        };

        let lexeme: String = self.chars[self.start..self.pos].iter().collect();
        let span = Span::new(self.start, self.pos, self.start_line, self.start_column);

        Ok(Token::new(kind, span, lexeme))
    }

    fn scan_variable(&mut self) -> FlowResult<TokenKind> {
        if !is_identifier_start(self.peek()) {
            return Err(self.error("Expected variable name after '$'"));
        }

        let first = self.advance();
        let mut name = String::from(first);
        while is_identifier_part(self.peek()) {
            name.push(self.advance());
        }

        Ok(TokenKind::Variable(name))
    }

    fn scan_single_quoted(&mut self) -> FlowResult<TokenKind> {
        let mut value = String::new();

        while !self.is_at_end() && self.peek() != '\'' {
            if self.peek() == '\\' && matches!(self.peek_next(), '\'' | '\\') {
                self.advance();
                value.push(self.advance());
            } else {
                value.push(self.advance());
            }
        }

        if self.is_at_end() {
            return Err(self.error("Unterminated string literal"));
        }

        self.advance(); // Consume closing quote
        Ok(TokenKind::String(value))
    }

    fn scan_double_quoted(&mut self) -> FlowResult<TokenKind> {
        let mut value = String::new();
        let mut interpolated = false;

        while !self.is_at_end() && self.peek() != '"' {
            if self.peek() != '\\' {
                // "$name", "${name}" and "{$name}" embed a variable
                interpolated |= match self.peek() {
                    '$' => is_identifier_start(self.peek_next()) || self.peek_next() == '{',
                    '{' => self.peek_next() == '$',
                    _ => false,
                };
                value.push(self.advance());
                continue;
            }

            self.advance();
            match self.peek() {
                'n' => {
                    self.advance();
                    value.push('\n');
                }
                't' => {
                    self.advance();
                    value.push('\t');
                }
                'r' => {
                    self.advance();
                    value.push('\r');
                }
                '\\' | '"' | '$' => value.push(self.advance()),
                // Unknown escapes are kept verbatim
                _ => value.push('\\'),
            }
        }

        if self.is_at_end() {
            return Err(self.error("Unterminated string literal"));
        }

        self.advance(); // Consume closing quote

        if interpolated {
            Ok(TokenKind::InterpolatedString(value))
        } else {
            Ok(TokenKind::String(value))
        }
    }

    fn scan_number(&mut self, first: char) -> FlowResult<TokenKind> {
        if first == '0' {
            let radix = match (self.peek(), self.peek_next()) {
                ('x' | 'X', c) if c.is_ascii_hexdigit() => Some(16),
                ('o' | 'O', c) if c.is_digit(8) => Some(8),
                ('b' | 'B', c) if c.is_digit(2) => Some(2),
                _ => None,
            };

            if let Some(radix) = radix {
                let prefix = self.advance();
                let digits = self.scan_radix_digits(radix);
                return self.integer_literal(&format!("0{}", prefix), &digits, radix);
            }

            // Legacy octal: a leading zero followed by more digits, unless the
            // literal turns out to be a float such as 01.5
            let more_digits = self.peek().is_ascii_digit()
                || (self.peek() == '_' && self.peek_next().is_ascii_digit());
            if more_digits && !self.float_ahead() {
                let mut digits = String::new();
                self.scan_digits(&mut digits);
                return self.integer_literal("0", &digits, 8);
            }
        }

        let mut num_str = String::from(first);
        let mut is_float = first == '.';

        self.scan_digits(&mut num_str);

        // Decimal part
        if !is_float && self.peek() == '.' && self.peek_next().is_ascii_digit() {
            is_float = true;
            num_str.push(self.advance());
            self.scan_digits(&mut num_str);
        }

        // Exponent
        if matches!(self.peek(), 'e' | 'E') {
            let signed = matches!(self.peek_next(), '+' | '-');
            let digit_at = if signed { self.pos + 2 } else { self.pos + 1 };
            if self.chars.get(digit_at).is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                num_str.push(self.advance());
                if signed {
                    num_str.push(self.advance());
                }
                self.scan_digits(&mut num_str);
            }
        }

        if !is_float {
            // Integer overflow turns into a float, as PHP does
            if let Ok(value) = num_str.parse::<i64>() {
                return Ok(TokenKind::Int(value));
            }
        }

        let value: f64 = num_str
            .parse()
            .map_err(|_| self.error(&format!("Invalid number literal '{}'", num_str)))?;
        Ok(TokenKind::Float(value))
    }

    fn scan_digits(&mut self, out: &mut String) {
        while self.peek().is_ascii_digit()
            || (self.peek() == '_' && self.peek_next().is_ascii_digit())
        {
            let c = self.advance();
            if c != '_' {
                out.push(c);
            }
        }
    }

    fn scan_radix_digits(&mut self, radix: u32) -> String {
        let mut digits = String::new();
        while self.peek().is_digit(radix) || (self.peek() == '_' && self.peek_next().is_digit(radix))
        {
            let c = self.advance();
            if c != '_' {
                digits.push(c);
            }
        }
        digits
    }

    /// Whether the digit run at the cursor continues as a float literal
    fn float_ahead(&self) -> bool {
        let mut i = self.pos;
        while self
            .chars
            .get(i)
            .is_some_and(|&c| c.is_ascii_digit() || c == '_')
        {
            i += 1;
        }

        match self.chars.get(i) {
            Some('.') => self.chars.get(i + 1).is_some_and(|c| c.is_ascii_digit()),
            Some('e' | 'E') => true,
            _ => false,
        }
    }

    fn integer_literal(&self, prefix: &str, digits: &str, radix: u32) -> FlowResult<TokenKind> {
        match i64::from_str_radix(digits, radix) {
            Ok(value) => Ok(TokenKind::Int(value)),
            // Integer overflow turns into a float, as PHP does
            Err(e) if matches!(e.kind(), IntErrorKind::PosOverflow) => {
                let value = digits
                    .chars()
                    .filter_map(|c| c.to_digit(radix))
                    .fold(0.0, |acc, d| acc * f64::from(radix) + f64::from(d));
                Ok(TokenKind::Float(value))
            }
            Err(_) => Err(self.error(&format!(
                "Invalid numeric literal '{}{}'",
                prefix, digits
            ))),
        }
    }

    fn scan_identifier(&mut self, first: char) -> TokenKind {
        let mut name = String::from(first);

        while is_identifier_part(self.peek()) {
            name.push(self.advance());
        }

        TokenKind::keyword_from_str(&name).unwrap_or(TokenKind::Identifier(name))
    }

    fn skip_whitespace_and_comments(&mut self) -> FlowResult<()> {
        loop {
            match self.peek() {
                ' ' | '\t' | '\r' | '\n' => {
                    self.advance();
                }
                '#' => self.skip_line(),
                '/' if self.peek_next() == '/' => self.skip_line(),
                '/' if self.peek_next() == '*' => {
                    self.start = self.pos;
                    self.start_line = self.line;
                    self.start_column = self.column;
                    self.advance(); // Consume /
                    self.advance(); // Consume *

                    loop {
                        if self.is_at_end() {
                            return Err(self.error("Unterminated block comment"));
                        }
                        if self.peek() == '*' && self.peek_next() == '/' {
                            self.advance();
                            self.advance();
                            break;
                        }
                        self.advance();
                    }
                }
                '<' if self.lookahead_is("<?php") => {
                    for _ in 0.."<?php".len() {
                        self.advance();
                    }
                }
                '?' if self.peek_next() == '>' => {
                    self.advance();
                    self.advance();
                }
                _ => return Ok(()),
            }
        }
    }

    fn skip_line(&mut self) {
        while !self.is_at_end() && self.peek() != '\n' {
            self.advance();
        }
    }

    // Helper methods
    fn is_at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn peek(&self) -> char {
        self.chars.get(self.pos).copied().unwrap_or('\0')
    }

    fn peek_next(&self) -> char {
        self.chars.get(self.pos + 1).copied().unwrap_or('\0')
    }

    fn lookahead_is(&self, text: &str) -> bool {
        text.chars()
            .enumerate()
            .all(|(i, c)| self.chars.get(self.pos + i).is_some_and(|&ch| ch == c))
    }

    /// Advances one character, keeping line and column in sync
    fn advance(&mut self) -> char {
        let c = self.chars[self.pos];
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        c
    }

    fn match_char(&mut self, expected: char) -> bool {
        if self.is_at_end() || self.peek() != expected {
            false
        } else {
            self.advance();
            true
        }
    }

    fn error(&self, message: &str) -> FlowError {
        let start = self.start.min(self.chars.len());
        let line_start = self.chars[..start]
            .iter()
            .rposition(|&c| c == '\n')
            .map(|i| i + 1)
            .unwrap_or(0);
        let line_end = self.chars[start..]
            .iter()
            .position(|&c| c == '\n')
            .map(|i| start + i)
            .unwrap_or(self.chars.len());
        let snippet: String = self.chars[line_start..line_end].iter().collect();

        FlowError::syntax_error(
            message,
            SourceLocation::new(&self.filename, self.start_line, self.start_column)
                .with_snippet(&snippet),
        )
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_identifier_part(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(source, "test.php");
        lexer
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_simple_assignment() {
        let tokens = kinds("<?php\n$x = 5;");

        assert!(matches!(&tokens[0], TokenKind::Variable(s) if s == "x"));
        assert!(matches!(tokens[1], TokenKind::Equal));
        assert!(matches!(tokens[2], TokenKind::Int(5)));
        assert!(matches!(tokens[3], TokenKind::Semicolon));
        assert!(matches!(tokens[4], TokenKind::Eof));
    }

    #[test]
    fn test_string_literals() {
        let tokens = kinds(r#"'it\'s' "tab\there" "keep\q""#);

        assert!(matches!(&tokens[0], TokenKind::String(s) if s == "it's"));
        assert!(matches!(&tokens[1], TokenKind::String(s) if s == "tab\there"));
        assert!(matches!(&tokens[2], TokenKind::String(s) if s == "keep\\q"));
    }

    #[test]
    fn test_numbers() {
        let tokens = kinds("42 2.5 .5 1e3 0x1F 1_000");

        assert!(matches!(tokens[0], TokenKind::Int(42)));
        assert!(matches!(tokens[1], TokenKind::Float(f) if (f - 2.5).abs() < f64::EPSILON));
        assert!(matches!(tokens[2], TokenKind::Float(f) if (f - 0.5).abs() < f64::EPSILON));
        assert!(matches!(tokens[3], TokenKind::Float(f) if (f - 1000.0).abs() < f64::EPSILON));
        assert!(matches!(tokens[4], TokenKind::Int(31)));
        assert!(matches!(tokens[5], TokenKind::Int(1000)));
    }

    #[test]
    fn test_prefixed_integers() {
        let tokens = kinds("010 0o17 0b101 0x1_F 0 01.5");

        assert!(matches!(tokens[0], TokenKind::Int(8)));
        assert!(matches!(tokens[1], TokenKind::Int(15)));
        assert!(matches!(tokens[2], TokenKind::Int(5)));
        assert!(matches!(tokens[3], TokenKind::Int(31)));
        assert!(matches!(tokens[4], TokenKind::Int(0)));
        assert!(matches!(tokens[5], TokenKind::Float(f) if (f - 1.5).abs() < f64::EPSILON));
    }

    #[test]
    fn test_overflowing_integers_become_floats() {
        let tokens = kinds("0xFFFFFFFFFFFFFFFF 9223372036854775808");
        let expected = 2f64.powi(64);

        assert!(matches!(tokens[0], TokenKind::Float(f) if (f - expected).abs() < 1e4));
        assert!(matches!(tokens[1], TokenKind::Float(f) if (f - expected / 2.0).abs() < 1e4));
    }

    #[test]
    fn test_invalid_octal_digit() {
        let mut lexer = Lexer::new("$a = 09;", "test.php");
        let err = lexer.tokenize().unwrap_err();

        assert_eq!(err.kind, crate::error::ErrorKind::SyntaxError);
        assert!(err.message.contains("'09'"));
    }

    #[test]
    fn test_interpolated_strings() {
        let tokens = kinds(r#""hello $name" "{$a}" "${b}" "cost \$5" "$5" "plain""#);

        assert!(matches!(&tokens[0], TokenKind::InterpolatedString(s) if s == "hello $name"));
        assert!(matches!(tokens[1], TokenKind::InterpolatedString(_)));
        assert!(matches!(tokens[2], TokenKind::InterpolatedString(_)));
        assert!(matches!(&tokens[3], TokenKind::String(s) if s == "cost $5"));
        assert!(matches!(&tokens[4], TokenKind::String(s) if s == "$5"));
        assert!(matches!(&tokens[5], TokenKind::String(s) if s == "plain"));
    }

    #[test]
    fn test_double_colon() {
        let tokens = kinds("Foo::bar a ? b : c");

        assert!(matches!(tokens[1], TokenKind::DoubleColon));
        assert!(matches!(tokens[6], TokenKind::Colon));
    }

    #[test]
    fn test_operators() {
        let tokens = kinds("=== !== <=> ** ?? ... -> => ++ .=");

        assert_eq!(
            tokens[..10],
            [
                TokenKind::Identical,
                TokenKind::NotIdentical,
                TokenKind::Spaceship,
                TokenKind::StarStar,
                TokenKind::Coalesce,
                TokenKind::Ellipsis,
                TokenKind::Arrow,
                TokenKind::FatArrow,
                TokenKind::Increment,
                TokenKind::DotAssign,
            ]
        );
    }

    #[test]
    fn test_keywords_case_insensitive() {
        let tokens = kinds("FUNCTION Foo");

        assert!(matches!(tokens[0], TokenKind::Function));
        assert!(matches!(&tokens[1], TokenKind::Identifier(s) if s == "Foo"));
    }

    #[test]
    fn test_comments_and_lines() {
        let mut lexer = Lexer::new("<?php\n// one\n# two\n/* three\n */ $a;", "test.php");
        let tokens = lexer.tokenize().unwrap();

        assert!(matches!(&tokens[0].kind, TokenKind::Variable(s) if s == "a"));
        assert_eq!(tokens[0].span.line, 5);
    }

    #[test]
    fn test_unterminated_string() {
        let mut lexer = Lexer::new("$a = 'oops;", "test.php");
        let err = lexer.tokenize().unwrap_err();

        assert_eq!(err.kind, crate::error::ErrorKind::SyntaxError);
        assert!(err.message.contains("Unterminated"));
    }
}
