//! PHP Parser
//!
//! Recursive descent parser for the PHP subset understood by the analyzer

pub mod ast;

pub use ast::*;

use crate::error::{FlowError, FlowResult, SourceLocation};
use crate::lexer::{Span, Token, TokenKind};

const CAST_TYPES: &[&str] = &[
    "int", "integer", "float", "double", "string", "bool", "boolean", "array", "object",
];

/// Parser for PHP source code
pub struct Parser {
    tokens: Vec<Token>,
    current: usize,
}

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens, current: 0 }
    }

    /// Parse the token stream into an AST
    pub fn parse(&mut self) -> FlowResult<Program> {
        let mut statements = Vec::new();

        while !self.is_at_end() {
            if self.check(&TokenKind::Semicolon) {
                self.advance();
                continue;
            }
            statements.push(self.parse_statement()?);
        }

        Ok(Program { statements })
    }

    // ===== Statement Parsing =====

    fn parse_statement(&mut self) -> FlowResult<Statement> {
        match self.peek().kind {
            TokenKind::Function if self.is_function_declaration() => self.parse_function(),
            TokenKind::If => self.parse_if(),
            TokenKind::While => self.parse_while(),
            TokenKind::For => self.parse_for(),
            TokenKind::Foreach => self.parse_foreach(),
            TokenKind::Return => self.parse_return(),
            TokenKind::Echo => self.parse_echo(),
            TokenKind::Declare => self.parse_declare(),
            TokenKind::LeftBrace => {
                let block = self.parse_block()?;
                Ok(Statement::Block(block))
            }
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_expression_statement(&mut self) -> FlowResult<Statement> {
        let start_span = self.peek().span;
        let expr = self.parse_expression()?;
        self.expect_statement_end("Expected ';' after expression")?;

        Ok(Statement::Expression {
            expr,
            span: self.span_from(start_span),
        })
    }

    fn parse_function(&mut self) -> FlowResult<Statement> {
        let start_span = self.advance().span; // Consume 'function'

        // Return by reference: function &name()
        if self.check(&TokenKind::Ampersand) {
            self.advance();
        }

        let name = self.expect_identifier("Expected function name after 'function'")?;

        self.expect(&TokenKind::LeftParen, "Expected '(' after function name")?;
        let params = self.parse_parameters()?;
        self.expect(&TokenKind::RightParen, "Expected ')' after parameters")?;

        let return_type = self.parse_return_type()?;
        let body = self.parse_block()?;

        Ok(Statement::Function {
            name,
            params,
            return_type,
            body,
            span: self.span_from(start_span),
        })
    }

    fn parse_parameters(&mut self) -> FlowResult<Vec<Parameter>> {
        let mut params = Vec::new();

        while !self.check(&TokenKind::RightParen) && !self.is_at_end() {
            let param_span = self.peek().span;

            let type_hint = if self.check(&TokenKind::Question)
                || matches!(self.peek().kind, TokenKind::Identifier(_))
            {
                Some(self.parse_type()?)
            } else {
                None
            };

            let by_ref = if self.check(&TokenKind::Ampersand) {
                self.advance();
                true
            } else {
                false
            };

            let variadic = if self.check(&TokenKind::Ellipsis) {
                self.advance();
                true
            } else {
                false
            };

            let name = match &self.peek().kind {
                TokenKind::Variable(name) => {
                    let name = name.clone();
                    self.advance();
                    name
                }
                _ => return Err(self.error("Expected parameter variable")),
            };

            let default = if self.check(&TokenKind::Equal) {
                self.advance();
                Some(self.parse_expression()?)
            } else {
                None
            };

            params.push(Parameter {
                name,
                type_hint,
                default,
                variadic,
                by_ref,
                span: self.span_from(param_span),
            });

            if !self.check(&TokenKind::Comma) {
                break;
            }
            self.advance();
        }

        Ok(params)
    }

    /// `function name(` or `function &name(`, as opposed to a closure
    fn is_function_declaration(&self) -> bool {
        match self.peek_at(1).kind {
            TokenKind::Identifier(_) => true,
            TokenKind::Ampersand => matches!(self.peek_at(2).kind, TokenKind::Identifier(_)),
            _ => false,
        }
    }

    fn parse_return_type(&mut self) -> FlowResult<Option<String>> {
        if !self.check(&TokenKind::Colon) {
            return Ok(None);
        }
        self.advance();
        Ok(Some(self.parse_type()?))
    }

    /// Type hint, kept verbatim: `int`, `?string`, `int|float`
    fn parse_type(&mut self) -> FlowResult<String> {
        let mut text = String::new();

        if self.check(&TokenKind::Question) {
            self.advance();
            text.push('?');
        }

        text.push_str(&self.expect_identifier("Expected type name")?);

        while self.check(&TokenKind::Pipe) {
            self.advance();
            text.push('|');
            text.push_str(&self.expect_identifier("Expected type name after '|'")?);
        }

        Ok(text)
    }

    fn parse_block(&mut self) -> FlowResult<Block> {
        let start_span = self.peek().span;
        self.expect(&TokenKind::LeftBrace, "Expected '{'")?;

        let mut statements = Vec::new();
        while !self.check(&TokenKind::RightBrace) && !self.is_at_end() {
            if self.check(&TokenKind::Semicolon) {
                self.advance();
                continue;
            }
            statements.push(self.parse_statement()?);
        }

        self.expect(&TokenKind::RightBrace, "Expected '}' after block")?;

        Ok(Block {
            statements,
            span: self.span_from(start_span),
        })
    }

    /// Braced block, or a single statement for brace-less bodies
    fn parse_body(&mut self) -> FlowResult<Block> {
        if self.check(&TokenKind::LeftBrace) {
            return self.parse_block();
        }

        let start_span = self.peek().span;
        let statement = self.parse_statement()?;
        Ok(Block {
            statements: vec![statement],
            span: self.span_from(start_span),
        })
    }

    fn parse_condition(&mut self) -> FlowResult<Expression> {
        self.expect(&TokenKind::LeftParen, "Expected '(' before condition")?;
        let condition = self.parse_expression()?;
        self.expect(&TokenKind::RightParen, "Expected ')' after condition")?;
        Ok(condition)
    }

    fn parse_if(&mut self) -> FlowResult<Statement> {
        let start_span = self.advance().span; // Consume 'if'

        let condition = self.parse_condition()?;
        let then_block = self.parse_body()?;

        let mut else_ifs = Vec::new();
        let mut else_block = None;

        loop {
            if self.check(&TokenKind::ElseIf) {
                self.advance();
                let condition = self.parse_condition()?;
                let block = self.parse_body()?;
                else_ifs.push((condition, block));
            } else if self.check(&TokenKind::Else) {
                self.advance();
                // `else if` nests a full if statement
                else_block = Some(self.parse_body()?);
                break;
            } else {
                break;
            }
        }

        Ok(Statement::If {
            condition,
            then_block,
            else_ifs,
            else_block,
            span: self.span_from(start_span),
        })
    }

    fn parse_while(&mut self) -> FlowResult<Statement> {
        let start_span = self.advance().span; // Consume 'while'

        let condition = self.parse_condition()?;
        let body = self.parse_body()?;

        Ok(Statement::While {
            condition,
            body,
            span: self.span_from(start_span),
        })
    }

    fn parse_for(&mut self) -> FlowResult<Statement> {
        let start_span = self.advance().span; // Consume 'for'

        self.expect(&TokenKind::LeftParen, "Expected '(' after 'for'")?;
        let init = self.parse_expression_list(&TokenKind::Semicolon)?;
        self.expect(&TokenKind::Semicolon, "Expected ';' after for initializer")?;
        let condition = self.parse_expression_list(&TokenKind::Semicolon)?;
        self.expect(&TokenKind::Semicolon, "Expected ';' after for condition")?;
        let step = self.parse_expression_list(&TokenKind::RightParen)?;
        self.expect(&TokenKind::RightParen, "Expected ')' after for clauses")?;

        let body = self.parse_body()?;

        Ok(Statement::For {
            init,
            condition,
            step,
            body,
            span: self.span_from(start_span),
        })
    }

    fn parse_foreach(&mut self) -> FlowResult<Statement> {
        let start_span = self.advance().span; // Consume 'foreach'

        self.expect(&TokenKind::LeftParen, "Expected '(' after 'foreach'")?;
        let subject = self.parse_expression()?;
        self.expect(&TokenKind::As, "Expected 'as' in foreach")?;

        let first = self.parse_foreach_target()?;
        let (key, value) = if self.check(&TokenKind::FatArrow) {
            self.advance();
            (Some(first), self.parse_foreach_target()?)
        } else {
            (None, first)
        };

        self.expect(&TokenKind::RightParen, "Expected ')' after foreach target")?;
        let body = self.parse_body()?;

        Ok(Statement::Foreach {
            subject,
            key,
            value,
            body,
            span: self.span_from(start_span),
        })
    }

    fn parse_foreach_target(&mut self) -> FlowResult<Expression> {
        if self.check(&TokenKind::Ampersand) {
            self.advance();
        }
        self.parse_expression()
    }

    fn parse_return(&mut self) -> FlowResult<Statement> {
        let start_span = self.advance().span; // Consume 'return'

        let value = if self.check(&TokenKind::Semicolon) || self.is_at_end() {
            None
        } else {
            Some(self.parse_expression()?)
        };

        self.expect_statement_end("Expected ';' after return")?;

        Ok(Statement::Return {
            value,
            span: self.span_from(start_span),
        })
    }

    fn parse_echo(&mut self) -> FlowResult<Statement> {
        let start_span = self.advance().span; // Consume 'echo'

        let mut values = vec![self.parse_expression()?];
        while self.check(&TokenKind::Comma) {
            self.advance();
            values.push(self.parse_expression()?);
        }

        self.expect_statement_end("Expected ';' after echo")?;

        Ok(Statement::Echo {
            values,
            span: self.span_from(start_span),
        })
    }

    fn parse_declare(&mut self) -> FlowResult<Statement> {
        let start_span = self.advance().span; // Consume 'declare'

        self.expect(&TokenKind::LeftParen, "Expected '(' after 'declare'")?;
        let mut directives = Vec::new();
        while !self.check(&TokenKind::RightParen) && !self.is_at_end() {
            let name = self.expect_identifier("Expected directive name")?;
            self.expect(&TokenKind::Equal, "Expected '=' after directive name")?;
            let value = self.parse_expression()?;
            directives.push((name, value));

            if !self.check(&TokenKind::Comma) {
                break;
            }
            self.advance();
        }
        self.expect(&TokenKind::RightParen, "Expected ')' after directives")?;
        self.expect_statement_end("Expected ';' after declare")?;

        Ok(Statement::Declare {
            directives,
            span: self.span_from(start_span),
        })
    }

    fn parse_expression_list(&mut self, terminator: &TokenKind) -> FlowResult<Vec<Expression>> {
        let mut expressions = Vec::new();

        while !self.check(terminator) && !self.is_at_end() {
            expressions.push(self.parse_expression()?);
            if !self.check(&TokenKind::Comma) {
                break;
            }
            self.advance();
        }

        Ok(expressions)
    }

    // ===== Expression Parsing =====

    pub fn parse_expression(&mut self) -> FlowResult<Expression> {
        self.parse_low_or()
    }

    /// `or` binds looser than assignment
    fn parse_low_or(&mut self) -> FlowResult<Expression> {
        let mut left = self.parse_low_and()?;

        while self.check(&TokenKind::LogicalOr) {
            self.advance();
            let right = self.parse_low_and()?;
            left = self.binary(left, BinaryOp::Or, right);
        }

        Ok(left)
    }

    fn parse_low_and(&mut self) -> FlowResult<Expression> {
        let mut left = self.parse_assignment()?;

        while self.check(&TokenKind::LogicalAnd) {
            self.advance();
            let right = self.parse_assignment()?;
            left = self.binary(left, BinaryOp::And, right);
        }

        Ok(left)
    }

    fn parse_assignment(&mut self) -> FlowResult<Expression> {
        let start_span = self.peek().span;
        let expr = self.parse_ternary()?;

        if self.check(&TokenKind::Equal) {
            self.advance();
            // Assignment by reference: $a = &$b
            if self.check(&TokenKind::Ampersand) {
                self.advance();
            }
            let value = self.parse_assignment()?;

            return Ok(Expression::Assign {
                target: Box::new(expr),
                value: Box::new(value),
                span: self.span_from(start_span),
            });
        }

        let compound = match self.peek().kind {
            TokenKind::PlusAssign => Some(BinaryOp::Add),
            TokenKind::MinusAssign => Some(BinaryOp::Subtract),
            TokenKind::StarAssign => Some(BinaryOp::Multiply),
            TokenKind::SlashAssign => Some(BinaryOp::Divide),
            TokenKind::PercentAssign => Some(BinaryOp::Modulo),
            TokenKind::DotAssign => Some(BinaryOp::Concat),
            TokenKind::CoalesceAssign => Some(BinaryOp::Coalesce),
            _ => None,
        };

        if let Some(operator) = compound {
            self.advance();
            let value = self.parse_assignment()?;

            return Ok(Expression::CompoundAssign {
                operator,
                target: Box::new(expr),
                value: Box::new(value),
                span: self.span_from(start_span),
            });
        }

        Ok(expr)
    }

    fn parse_ternary(&mut self) -> FlowResult<Expression> {
        let start_span = self.peek().span;
        let condition = self.parse_coalesce()?;

        if !self.check(&TokenKind::Question) {
            return Ok(condition);
        }
        self.advance(); // Consume '?'

        // Short ternary: a ?: b
        let then_branch = if self.check(&TokenKind::Colon) {
            None
        } else {
            Some(Box::new(self.parse_assignment()?))
        };

        self.expect(&TokenKind::Colon, "Expected ':' in ternary expression")?;
        let else_branch = self.parse_assignment()?;

        Ok(Expression::Ternary {
            condition: Box::new(condition),
            then_branch,
            else_branch: Box::new(else_branch),
            span: self.span_from(start_span),
        })
    }

    fn parse_coalesce(&mut self) -> FlowResult<Expression> {
        let left = self.parse_or()?;

        if self.check(&TokenKind::Coalesce) {
            self.advance();
            // Right associative
            let right = self.parse_coalesce()?;
            return Ok(self.binary(left, BinaryOp::Coalesce, right));
        }

        Ok(left)
    }

    fn parse_or(&mut self) -> FlowResult<Expression> {
        let mut left = self.parse_and()?;

        while self.check(&TokenKind::Or) {
            self.advance();
            let right = self.parse_and()?;
            left = self.binary(left, BinaryOp::Or, right);
        }

        Ok(left)
    }

    fn parse_and(&mut self) -> FlowResult<Expression> {
        let mut left = self.parse_equality()?;

        while self.check(&TokenKind::And) {
            self.advance();
            let right = self.parse_equality()?;
            left = self.binary(left, BinaryOp::And, right);
        }

        Ok(left)
    }

    fn parse_equality(&mut self) -> FlowResult<Expression> {
        let mut left = self.parse_comparison()?;

        loop {
            let op = match self.peek().kind {
                TokenKind::EqualEqual => BinaryOp::Equal,
                TokenKind::NotEqual => BinaryOp::NotEqual,
                TokenKind::Identical => BinaryOp::Identical,
                TokenKind::NotIdentical => BinaryOp::NotIdentical,
                TokenKind::Spaceship => BinaryOp::Spaceship,
                _ => break,
            };
            self.advance();

            let right = self.parse_comparison()?;
            left = self.binary(left, op, right);
        }

        Ok(left)
    }

    fn parse_comparison(&mut self) -> FlowResult<Expression> {
        let mut left = self.parse_concat()?;

        loop {
            let op = match self.peek().kind {
                TokenKind::Less => BinaryOp::Less,
                TokenKind::LessEqual => BinaryOp::LessEqual,
                TokenKind::Greater => BinaryOp::Greater,
                TokenKind::GreaterEqual => BinaryOp::GreaterEqual,
                _ => break,
            };
            self.advance();

            let right = self.parse_concat()?;
            left = self.binary(left, op, right);
        }

        Ok(left)
    }

    /// `.` binds looser than `+` and `-`
    fn parse_concat(&mut self) -> FlowResult<Expression> {
        let mut left = self.parse_term()?;

        while self.check(&TokenKind::Dot) {
            self.advance();
            let right = self.parse_term()?;
            left = self.binary(left, BinaryOp::Concat, right);
        }

        Ok(left)
    }

    fn parse_term(&mut self) -> FlowResult<Expression> {
        let mut left = self.parse_factor()?;

        loop {
            let op = match self.peek().kind {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Subtract,
                _ => break,
            };
            self.advance();

            let right = self.parse_factor()?;
            left = self.binary(left, op, right);
        }

        Ok(left)
    }

    fn parse_factor(&mut self) -> FlowResult<Expression> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match self.peek().kind {
                TokenKind::Star => BinaryOp::Multiply,
                TokenKind::Slash => BinaryOp::Divide,
                TokenKind::Percent => BinaryOp::Modulo,
                _ => break,
            };
            self.advance();

            let right = self.parse_unary()?;
            left = self.binary(left, op, right);
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> FlowResult<Expression> {
        let start_span = self.peek().span;

        let operator = match self.peek().kind {
            TokenKind::Not => Some(UnaryOp::Not),
            TokenKind::Minus => Some(UnaryOp::Negate),
            TokenKind::Plus => Some(UnaryOp::Plus),
            _ => None,
        };

        if let Some(operator) = operator {
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expression::Unary {
                operator,
                operand: Box::new(operand),
                span: self.span_from(start_span),
            });
        }

        if matches!(self.peek().kind, TokenKind::Increment | TokenKind::Decrement) {
            let increment = self.advance().kind == TokenKind::Increment;
            let operand = self.parse_unary()?;
            return Ok(Expression::IncDec {
                increment,
                prefix: true,
                operand: Box::new(operand),
                span: self.span_from(start_span),
            });
        }

        if let Some(target) = self.cast_ahead() {
            self.advance(); // (
            self.advance(); // type
            self.advance(); // )
            let value = self.parse_unary()?;
            return Ok(Expression::Cast {
                target,
                value: Box::new(value),
                span: self.span_from(start_span),
            });
        }

        self.parse_power()
    }

    /// `(int)` style cast at the current position
    fn cast_ahead(&self) -> Option<String> {
        if !self.check(&TokenKind::LeftParen) {
            return None;
        }
        match (&self.peek_at(1).kind, &self.peek_at(2).kind) {
            (TokenKind::Identifier(name), TokenKind::RightParen) => {
                let lowered = name.to_ascii_lowercase();
                CAST_TYPES.contains(&lowered.as_str()).then_some(lowered)
            }
            _ => None,
        }
    }

    fn parse_power(&mut self) -> FlowResult<Expression> {
        let base = self.parse_postfix()?;

        if self.check(&TokenKind::StarStar) {
            self.advance();
            // Right associative, and binds tighter than a unary minus on its left
            let exponent = self.parse_unary()?;
            return Ok(self.binary(base, BinaryOp::Power, exponent));
        }

        Ok(base)
    }

    fn parse_postfix(&mut self) -> FlowResult<Expression> {
        let start_span = self.peek().span;
        let mut expr = self.parse_primary()?;

        loop {
            if self.check(&TokenKind::LeftParen) {
                self.advance();
                let arguments = self.parse_arguments()?;
                self.expect(&TokenKind::RightParen, "Expected ')' after arguments")?;

                let callee = match expr {
                    Expression::Constant { name, .. } => Callee::Name(name),
                    other => Callee::Dynamic(Box::new(other)),
                };

                expr = Expression::Call {
                    callee,
                    arguments,
                    span: self.span_from(start_span),
                };
            } else if self.check(&TokenKind::LeftBracket) {
                self.advance();
                let index = if self.check(&TokenKind::RightBracket) {
                    None
                } else {
                    Some(Box::new(self.parse_expression()?))
                };
                self.expect(&TokenKind::RightBracket, "Expected ']' after index")?;

                expr = Expression::Index {
                    base: Box::new(expr),
                    index,
                    span: self.span_from(start_span),
                };
            } else if self.check(&TokenKind::Arrow) {
                self.advance();
                let member = self.expect_identifier("Expected member name after '->'")?;

                if self.check(&TokenKind::LeftParen) {
                    self.advance();
                    let arguments = self.parse_arguments()?;
                    self.expect(&TokenKind::RightParen, "Expected ')' after arguments")?;

                    expr = Expression::MethodCall {
                        object: Box::new(expr),
                        method: member,
                        arguments,
                        span: self.span_from(start_span),
                    };
                } else {
                    expr = Expression::Property {
                        object: Box::new(expr),
                        property: member,
                        span: self.span_from(start_span),
                    };
                }
            } else if self.check(&TokenKind::DoubleColon) {
                let class = match expr {
                    Expression::Constant { name, .. } => name,
                    _ => return Err(self.error("Expected class name before '::'")),
                };
                self.advance();
                expr = self.parse_static_member(class, start_span)?;
            } else if matches!(self.peek().kind, TokenKind::Increment | TokenKind::Decrement) {
                let increment = self.advance().kind == TokenKind::Increment;
                expr = Expression::IncDec {
                    increment,
                    prefix: false,
                    operand: Box::new(expr),
                    span: self.span_from(start_span),
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn parse_arguments(&mut self) -> FlowResult<Vec<Argument>> {
        let mut args = Vec::new();

        while !self.check(&TokenKind::RightParen) && !self.is_at_end() {
            let arg_span = self.peek().span;

            // Named argument: name: expr
            let name = match (&self.peek().kind, &self.peek_at(1).kind) {
                (TokenKind::Identifier(name), TokenKind::Colon) => {
                    let name = name.clone();
                    self.advance();
                    self.advance();
                    Some(name)
                }
                _ => None,
            };

            let unpack = if self.check(&TokenKind::Ellipsis) {
                self.advance();
                true
            } else {
                false
            };

            let value = self.parse_expression()?;
            args.push(Argument {
                name,
                value,
                unpack,
                span: self.span_from(arg_span),
            });

            if !self.check(&TokenKind::Comma) {
                break;
            }
            self.advance();
        }

        Ok(args)
    }

    fn parse_primary(&mut self) -> FlowResult<Expression> {
        let token = self.advance();
        let span = token.span;

        match token.kind {
            TokenKind::Variable(name) => Ok(Expression::Variable { name, span }),
            TokenKind::Int(value) => Ok(Expression::Int { value, span }),
            TokenKind::Float(value) => Ok(Expression::Float { value, span }),
            TokenKind::String(value) => Ok(Expression::String { value, span }),
            TokenKind::InterpolatedString(raw) => Ok(Expression::Interpolated { raw, span }),

            TokenKind::Function => self.parse_closure(span),
            TokenKind::Fn => self.parse_arrow_function(span),

            TokenKind::LeftBracket => self.parse_array_items(&TokenKind::RightBracket, span),

            TokenKind::Identifier(name) => {
                if name.eq_ignore_ascii_case("array") && self.check(&TokenKind::LeftParen) {
                    self.advance();
                    return self.parse_array_items(&TokenKind::RightParen, span);
                }
                // static function () {...} and static fn () => ...
                if name.eq_ignore_ascii_case("static") {
                    match self.peek().kind {
                        TokenKind::Function => {
                            self.advance();
                            return self.parse_closure(span);
                        }
                        TokenKind::Fn => {
                            self.advance();
                            return self.parse_arrow_function(span);
                        }
                        _ => {}
                    }
                }
                Ok(Expression::Constant { name, span })
            }

            TokenKind::New => {
                let class = self.expect_identifier("Expected class name after 'new'")?;
                let arguments = if self.check(&TokenKind::LeftParen) {
                    self.advance();
                    let arguments = self.parse_arguments()?;
                    self.expect(&TokenKind::RightParen, "Expected ')' after arguments")?;
                    arguments
                } else {
                    Vec::new()
                };

                Ok(Expression::New {
                    class,
                    arguments,
                    span: self.span_from(span),
                })
            }

            // Parentheses leave no node behind
            TokenKind::LeftParen => {
                let inner = self.parse_expression()?;
                self.expect(&TokenKind::RightParen, "Expected ')' after expression")?;
                Ok(inner)
            }

            _ => Err(FlowError::syntax_error(
                &format!("Expected expression, found '{}'", token.kind),
                SourceLocation::new("", span.line, span.column).with_snippet(&token.lexeme),
            )),
        }
    }

    /// Closure after its `function` keyword: (params) use ($vars): Type { body }
    fn parse_closure(&mut self, start_span: Span) -> FlowResult<Expression> {
        if self.check(&TokenKind::Ampersand) {
            self.advance();
        }

        self.expect(&TokenKind::LeftParen, "Expected '(' after 'function'")?;
        let params = self.parse_parameters()?;
        self.expect(&TokenKind::RightParen, "Expected ')' after parameters")?;

        let mut uses = Vec::new();
        if self.check(&TokenKind::Use) {
            self.advance();
            self.expect(&TokenKind::LeftParen, "Expected '(' after 'use'")?;

            while !self.check(&TokenKind::RightParen) && !self.is_at_end() {
                if self.check(&TokenKind::Ampersand) {
                    self.advance();
                }
                let name = match &self.peek().kind {
                    TokenKind::Variable(name) => name.clone(),
                    _ => return Err(self.error("Expected variable in closure 'use' list")),
                };
                self.advance();
                uses.push(name);

                if !self.check(&TokenKind::Comma) {
                    break;
                }
                self.advance();
            }

            self.expect(&TokenKind::RightParen, "Expected ')' after 'use' list")?;
        }

        self.parse_return_type()?;
        let body = self.parse_block()?;

        Ok(Expression::Closure {
            params,
            uses,
            body,
            span: self.span_from(start_span),
        })
    }

    /// Arrow function after its `fn` keyword: (params): Type => expr
    fn parse_arrow_function(&mut self, start_span: Span) -> FlowResult<Expression> {
        if self.check(&TokenKind::Ampersand) {
            self.advance();
        }

        self.expect(&TokenKind::LeftParen, "Expected '(' after 'fn'")?;
        let params = self.parse_parameters()?;
        self.expect(&TokenKind::RightParen, "Expected ')' after parameters")?;
        self.parse_return_type()?;
        self.expect(&TokenKind::FatArrow, "Expected '=>' after arrow function parameters")?;

        let body_start = self.peek().span;
        let value = self.parse_expression()?;
        let body_span = self.span_from(body_start);

        Ok(Expression::Closure {
            params,
            uses: Vec::new(),
            body: Block {
                statements: vec![Statement::Return {
                    value: Some(value),
                    span: body_span,
                }],
                span: body_span,
            },
            span: self.span_from(start_span),
        })
    }

    /// Member after `Class::`: a static property, method call or constant
    fn parse_static_member(&mut self, class: String, start_span: Span) -> FlowResult<Expression> {
        let member = self.advance();

        if let TokenKind::Variable(property) = member.kind {
            return Ok(Expression::StaticProperty {
                class,
                property,
                span: self.span_from(start_span),
            });
        }

        // Keywords are valid member names: Foo::new(), Foo::class
        if !member
            .lexeme
            .starts_with(|c: char| c.is_alphabetic() || c == '_')
        {
            return Err(FlowError::syntax_error(
                "Expected member name after '::'",
                SourceLocation::new("", member.span.line, member.span.column)
                    .with_snippet(&member.lexeme),
            ));
        }

        if self.check(&TokenKind::LeftParen) {
            self.advance();
            let arguments = self.parse_arguments()?;
            self.expect(&TokenKind::RightParen, "Expected ')' after arguments")?;

            return Ok(Expression::StaticCall {
                class,
                method: member.lexeme,
                arguments,
                span: self.span_from(start_span),
            });
        }

        Ok(Expression::ClassConstant {
            class,
            name: member.lexeme,
            span: self.span_from(start_span),
        })
    }

    fn parse_array_items(&mut self, close: &TokenKind, start_span: Span) -> FlowResult<Expression> {
        let mut items = Vec::new();

        while !self.check(close) && !self.is_at_end() {
            let item_span = self.peek().span;

            if self.check(&TokenKind::Ampersand) || self.check(&TokenKind::Ellipsis) {
                self.advance();
            }

            let first = self.parse_expression()?;
            let (key, value) = if self.check(&TokenKind::FatArrow) {
                self.advance();
                if self.check(&TokenKind::Ampersand) {
                    self.advance();
                }
                (Some(first), self.parse_expression()?)
            } else {
                (None, first)
            };

            items.push(ArrayItem {
                key,
                value,
                span: self.span_from(item_span),
            });

            if !self.check(&TokenKind::Comma) {
                break;
            }
            self.advance();
        }

        self.expect(close, "Expected end of array literal")?;

        Ok(Expression::Array {
            items,
            span: self.span_from(start_span),
        })
    }

    // ===== Helper Methods =====

    fn binary(&self, left: Expression, operator: BinaryOp, right: Expression) -> Expression {
        let span = Span::new(
            left.span().start,
            right.span().end,
            left.span().line,
            left.span().column,
        );

        Expression::Binary {
            left: Box::new(left),
            operator,
            right: Box::new(right),
            span,
        }
    }

    /// Span from `start` up to the last consumed token
    fn span_from(&self, start: Span) -> Span {
        Span::new(
            start.start,
            self.previous().span.end,
            start.line,
            start.column,
        )
    }

    fn is_at_end(&self) -> bool {
        matches!(self.peek().kind, TokenKind::Eof)
    }

    fn peek(&self) -> &Token {
        self.peek_at(0)
    }

    /// Token `offset` positions ahead, clamped to the trailing EOF
    fn peek_at(&self, offset: usize) -> &Token {
        let last = self.tokens.len().saturating_sub(1);
        &self.tokens[(self.current + offset).min(last)]
    }

    fn previous(&self) -> &Token {
        &self.tokens[self.current.saturating_sub(1)]
    }

    fn advance(&mut self) -> Token {
        if !self.is_at_end() {
            self.current += 1;
        }
        self.previous().clone()
    }

    fn check(&self, kind: &TokenKind) -> bool {
        if self.is_at_end() {
            false
        } else {
            std::mem::discriminant(&self.peek().kind) == std::mem::discriminant(kind)
        }
    }

    fn expect(&mut self, kind: &TokenKind, message: &str) -> FlowResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error(message))
        }
    }

    /// `;` or end of input (a closing `?>` also ends a statement)
    fn expect_statement_end(&mut self, message: &str) -> FlowResult<()> {
        if self.check(&TokenKind::Semicolon) {
            self.advance();
            Ok(())
        } else if self.is_at_end() {
            Ok(())
        } else {
            Err(self.error(message))
        }
    }

    fn expect_identifier(&mut self, message: &str) -> FlowResult<String> {
        if let TokenKind::Identifier(name) = &self.peek().kind {
            let name = name.clone();
            self.advance();
            Ok(name)
        } else {
            Err(self.error(message))
        }
    }

    fn error(&self, message: &str) -> FlowError {
        let token = self.peek();
        FlowError::syntax_error(
            message,
            SourceLocation::new("", token.span.line, token.span.column).with_snippet(&token.lexeme),
        )
    }
}

/// Lex and parse `source` in one step
pub fn parse_source(source: &str, filename: &str) -> FlowResult<Program> {
    let mut lexer = crate::lexer::Lexer::new(source, filename);
    let tokens = lexer.tokenize()?;
    let mut parser = Parser::new(tokens);
    parser.parse()
}
