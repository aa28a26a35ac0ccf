//! FILENAME: core/parser/src/parser.rs
//! PURPOSE: Recursive descent parser that converts a stream of Tokens into an AST.
//! CONTEXT: This is the second stage of the parsing pipeline. It takes tokens
//! from the Lexer and builds an Expression tree that the Formula module evaluates.
//!
//! GRAMMAR:
//!   expression     --> comparison
//!   comparison     --> additive ( ("=" | "<>" | "<" | ">" | "<=" | ">=") additive )*
//!   additive       --> multiplicative ( ("+" | "-") multiplicative )*
//!   multiplicative --> unary ( ("*" | "/") unary )*
//!   unary          --> "-" unary | power
//!   power          --> primary ( "^" unary )?
//!   primary        --> NUMBER | TRUE | FALSE | cell_or_range | function_call | "(" expression ")"
//!   cell_or_range  --> CELL_REF (":" CELL_REF)?
//!   function_call  --> IDENTIFIER "(" arguments? ")"
//!   arguments      --> expression ("," expression)*

use crate::ast::{BinaryOperator, BuiltinFunction, Expression, UnaryOperator};
use crate::lexer::Lexer;
use crate::token::Token;

/// Parser errors with descriptive messages.
#[derive(Debug, PartialEq, Clone)]
pub struct ParseError {
    pub message: String,
}

impl ParseError {
    pub fn new(message: impl Into<String>) -> Self {
        ParseError {
            message: message.into(),
        }
    }
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Parse error: {}", self.message)
    }
}

impl std::error::Error for ParseError {}

pub type ParseResult<T> = Result<T, ParseError>;

/// The Parser struct holds the lexer and current token state.
pub struct Parser<'a> {
    lexer: Lexer<'a>,
    current_token: Token,
}

impl<'a> Parser<'a> {
    /// Creates a new parser from an input string.
    /// Automatically advances to the first token.
    pub fn new(input: &'a str) -> Self {
        let mut lexer = Lexer::new(input);
        let current_token = lexer.next_token();
        Parser {
            lexer,
            current_token,
        }
    }

    /// Parses the entire input and returns the AST.
    pub fn parse(&mut self) -> ParseResult<Expression> {
        if self.current_token == Token::EOF {
            return Err(ParseError::new("Empty expression"));
        }

        let expr = self.parse_expression()?;

        if self.current_token != Token::EOF {
            return Err(ParseError::new(format!(
                "Unexpected token after expression: {:?}",
                self.current_token
            )));
        }

        Ok(expr)
    }

    fn advance(&mut self) {
        self.current_token = self.lexer.next_token();
    }

    fn expect(&mut self, expected: Token) -> ParseResult<()> {
        if self.current_token == expected {
            self.advance();
            Ok(())
        } else {
            Err(ParseError::new(format!(
                "Expected {:?}, found {:?}",
                expected, self.current_token
            )))
        }
    }

    fn parse_expression(&mut self) -> ParseResult<Expression> {
        self.parse_comparison()
    }

    /// Parses comparison expressions (=, <>, <, >, <=, >=).
    fn parse_comparison(&mut self) -> ParseResult<Expression> {
        let mut left = self.parse_additive()?;

        loop {
            let op = match &self.current_token {
                Token::Equals => BinaryOperator::Equal,
                Token::NotEqual => BinaryOperator::NotEqual,
                Token::LessThan => BinaryOperator::LessThan,
                Token::GreaterThan => BinaryOperator::GreaterThan,
                Token::LessEqual => BinaryOperator::LessEqual,
                Token::GreaterEqual => BinaryOperator::GreaterEqual,
                _ => break,
            };

            self.advance();
            let right = self.parse_additive()?;

            left = Expression::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// Parses additive expressions (+ and -).
    fn parse_additive(&mut self) -> ParseResult<Expression> {
        let mut left = self.parse_multiplicative()?;

        loop {
            let op = match &self.current_token {
                Token::Plus => BinaryOperator::Add,
                Token::Minus => BinaryOperator::Subtract,
                _ => break,
            };

            self.advance();
            let right = self.parse_multiplicative()?;

            left = Expression::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// Parses multiplicative expressions (* and /).
    fn parse_multiplicative(&mut self) -> ParseResult<Expression> {
        let mut left = self.parse_unary()?;

        loop {
            let op = match &self.current_token {
                Token::Asterisk => BinaryOperator::Multiply,
                Token::Slash => BinaryOperator::Divide,
                _ => break,
            };

            self.advance();
            let right = self.parse_unary()?;

            left = Expression::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }

        Ok(left)
    }

    /// Parses unary expressions (negation).
    fn parse_unary(&mut self) -> ParseResult<Expression> {
        if self.current_token == Token::Minus {
            self.advance();
            let operand = self.parse_unary()?;
            return Ok(Expression::UnaryOp {
                op: UnaryOperator::Negate,
                operand: Box::new(operand),
            });
        }

        self.parse_power()
    }

    /// Parses power/exponentiation expressions (^).
    fn parse_power(&mut self) -> ParseResult<Expression> {
        let left = self.parse_primary()?;

        if self.current_token == Token::Caret {
            self.advance();
            let right = self.parse_unary()?;

            return Ok(Expression::BinaryOp {
                left: Box::new(left),
                op: BinaryOperator::Power,
                right: Box::new(right),
            });
        }

        Ok(left)
    }

    /// Parses primary expressions (literals, cell refs, function calls, parentheses).
    fn parse_primary(&mut self) -> ParseResult<Expression> {
        match self.current_token.clone() {
            Token::Number(n) => {
                self.advance();
                Ok(Expression::Literal(n))
            }

            Token::Identifier(name) => {
                self.advance();

                if name == "TRUE" {
                    return Ok(Expression::Literal(1.0));
                }
                if name == "FALSE" {
                    return Ok(Expression::Literal(0.0));
                }

                // Function call: IDENTIFIER "("
                if self.current_token == Token::LParen {
                    return self.parse_function_call(name);
                }

                // Otherwise this identifier must be a cell reference.
                let (col, row) = Self::split_cell_reference(&name)?;

                if self.current_token == Token::Colon {
                    self.advance();
                    let end_name = match self.current_token.clone() {
                        Token::Identifier(n) => {
                            self.advance();
                            n
                        }
                        other => {
                            return Err(ParseError::new(format!(
                                "Expected cell reference after ':', found {:?}",
                                other
                            )))
                        }
                    };
                    let (end_col, end_row) = Self::split_cell_reference(&end_name)?;
                    return Ok(Expression::Range {
                        start: Box::new(Expression::CellRef { col, row }),
                        end: Box::new(Expression::CellRef { col: end_col, row: end_row }),
                    });
                }

                Ok(Expression::CellRef { col, row })
            }

            Token::LParen => {
                self.advance();
                let expr = self.parse_expression()?;
                self.expect(Token::RParen)?;
                Ok(expr)
            }

            Token::EOF => Err(ParseError::new("Unexpected end of expression")),

            Token::Illegal(ch) => Err(ParseError::new(format!("Illegal character: {}", ch))),

            token => Err(ParseError::new(format!("Unexpected token: {:?}", token))),
        }
    }

    fn parse_function_call(&mut self, name: String) -> ParseResult<Expression> {
        let func = BuiltinFunction::from_name(&name);

        self.advance(); // consume '('

        let mut args = Vec::new();

        if self.current_token == Token::RParen {
            self.advance();
            return Ok(Expression::FunctionCall { func, args });
        }

        args.push(self.parse_expression()?);

        while self.current_token == Token::Comma {
            self.advance();
            args.push(self.parse_expression()?);
        }

        self.expect(Token::RParen)?;

        Ok(Expression::FunctionCall { func, args })
    }

    /// Splits a cell reference string like "A1" or "AA100" into column and row parts.
    fn split_cell_reference(identifier: &str) -> ParseResult<(String, u32)> {
        let col_part: String = identifier
            .chars()
            .take_while(|c| c.is_ascii_alphabetic())
            .collect();
        let row_part: &str = &identifier[col_part.len()..];

        if col_part.is_empty() {
            return Err(ParseError::new(format!(
                "'{}' is not a valid cell reference",
                identifier
            )));
        }
        if row_part.is_empty() || !row_part.chars().all(|c| c.is_ascii_digit()) {
            return Err(ParseError::new(format!(
                "'{}' is not a valid cell reference",
                identifier
            )));
        }

        let row: u32 = row_part
            .parse()
            .map_err(|_| ParseError::new(format!("Row number out of range in '{}'", identifier)))?;
        if row == 0 {
            return Err(ParseError::new("Row number must be >= 1"));
        }

        Ok((col_part, row))
    }
}

/// Convenience function: parses a formula body (without the leading `=`)
/// into an `Expression`.
pub fn parse(input: &str) -> ParseResult<Expression> {
    Parser::new(input).parse()
}
