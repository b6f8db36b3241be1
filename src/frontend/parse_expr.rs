// src/frontend/parse_expr.rs
//! Expressions: precedence climbing over the binary operators, the
//! postfix chain (cast, access, index, call) and primaries.

use crate::errors::ParserError;
use crate::frontend::ast::*;
use crate::frontend::parser::Parser;
use crate::frontend::{Token, TokenType};

fn binary_op(ty: TokenType) -> Option<BinaryOp> {
    match ty {
        TokenType::EqEq => Some(BinaryOp::Eq),
        TokenType::Lt => Some(BinaryOp::Lt),
        TokenType::LtEq => Some(BinaryOp::Le),
        TokenType::Plus => Some(BinaryOp::Add),
        TokenType::Minus => Some(BinaryOp::Sub),
        TokenType::Star => Some(BinaryOp::Mul),
        TokenType::Slash => Some(BinaryOp::Div),
        _ => None,
    }
}

fn parse_integer(token: &Token) -> Result<u64, ParserError> {
    token.lexeme.parse().map_err(|_| ParserError::InvalidNumber {
        span: token.span.into(),
    })
}

fn parse_scalar(token: &Token) -> Result<f64, ParserError> {
    token.lexeme.parse().map_err(|_| ParserError::InvalidNumber {
        span: token.span.into(),
    })
}

impl Parser<'_> {
    /// Parse a binary expression, consuming operators that bind
    /// tighter than `min_prec`. Left associative at every level.
    pub(super) fn expression(&mut self, min_prec: u8) -> Result<Expr, ParserError> {
        let mut lhs = self.postfix()?;
        loop {
            let ty = self.current().ty;
            if ty.precedence() <= min_prec {
                return Ok(lhs);
            }
            let Some(op) = binary_op(ty) else {
                return Ok(lhs);
            };
            self.advance();
            let rhs = self.expression(ty.precedence())?;
            let span = lhs.span.merge(rhs.span);
            lhs = Expr {
                kind: ExprKind::Binary(Box::new(BinaryExpr { op, lhs, rhs })),
                span,
            };
        }
    }

    fn postfix(&mut self) -> Result<Expr, ParserError> {
        let mut value = self.primary()?;
        loop {
            match self.current().ty {
                TokenType::KwAs => {
                    self.advance();
                    let ty = self.type_expr()?;
                    let span = value.span.merge(ty.span);
                    value = Expr {
                        kind: ExprKind::Cast(Box::new(CastExpr { value, ty })),
                        span,
                    };
                }
                TokenType::Dot => {
                    self.advance();
                    let member_token = self.consume(TokenType::Identifier, "identifier")?;
                    let member = self.intern(&member_token.lexeme);
                    let span = value.span.merge(member_token.span);
                    value = Expr {
                        kind: ExprKind::Access(Box::new(AccessExpr {
                            value,
                            member,
                            member_span: member_token.span,
                        })),
                        span,
                    };
                }
                TokenType::LBracket => {
                    self.advance();
                    let index_token = self.consume(TokenType::Integer, "integer")?;
                    let index = parse_integer(&index_token)?;
                    let close = self.consume(TokenType::RBracket, "]")?;
                    let span = value.span.merge(close.span);
                    value = Expr {
                        kind: ExprKind::Index(Box::new(IndexExpr {
                            value,
                            index,
                            index_span: index_token.span,
                        })),
                        span,
                    };
                }
                TokenType::LParen => {
                    self.advance();
                    let mut arguments = Vec::new();
                    while !self.check(TokenType::RParen) {
                        arguments.push(self.expression(0)?);
                        if !self.check(TokenType::RParen) {
                            self.consume(TokenType::Comma, ",")?;
                        }
                    }
                    let close = self.consume(TokenType::RParen, ")")?;
                    let span = value.span.merge(close.span);
                    value = Expr {
                        kind: ExprKind::Call(Box::new(CallExpr {
                            callee: value,
                            arguments,
                        })),
                        span,
                    };
                }
                _ => return Ok(value),
            }
        }
    }

    fn primary(&mut self) -> Result<Expr, ParserError> {
        match self.current().ty {
            TokenType::Integer => {
                let token = self.advance().clone();
                let value = parse_integer(&token)?;
                Ok(Expr {
                    kind: ExprKind::Integer(value),
                    span: token.span,
                })
            }
            TokenType::Scalar => {
                let token = self.advance().clone();
                let value = parse_scalar(&token)?;
                Ok(Expr {
                    kind: ExprKind::Scalar(value),
                    span: token.span,
                })
            }
            TokenType::Identifier => {
                let token = self.advance().clone();
                let name = self.intern(&token.lexeme);
                Ok(Expr {
                    kind: ExprKind::Name(name),
                    span: token.span,
                })
            }
            TokenType::LBrace => self.object_literal(),
            TokenType::LBracket => self.tuple_literal(),
            TokenType::KwSyscall => self.syscall_expression(),
            TokenType::LParen => {
                self.advance();
                let expr = self.expression(0)?;
                self.consume(TokenType::RParen, ")")?;
                Ok(expr)
            }
            _ => Err(self.expected_expression()),
        }
    }

    /// `{name: expr, ...}` with shorthand members: `{x}` is `{x: x}`
    fn object_literal(&mut self) -> Result<Expr, ParserError> {
        let open = self.advance().span;
        let mut members: Vec<ObjectLiteralMember> = Vec::new();
        while !self.check(TokenType::RBrace) {
            let name_token = self.consume(TokenType::Identifier, "identifier")?;
            let name = self.intern(&name_token.lexeme);
            if members.iter().any(|member| member.name == name) {
                return Err(ParserError::DuplicateProperty {
                    name: name_token.lexeme,
                    span: name_token.span.into(),
                });
            }
            let value = if self.match_token(TokenType::Colon) {
                self.expression(0)?
            } else {
                Expr {
                    kind: ExprKind::Name(name),
                    span: name_token.span,
                }
            };
            let span = name_token.span.merge(value.span);
            members.push(ObjectLiteralMember { name, value, span });
            if !self.check(TokenType::RBrace) {
                self.consume(TokenType::Comma, ",")?;
            }
        }
        let close = self.consume(TokenType::RBrace, "}")?;
        Ok(Expr {
            kind: ExprKind::Object(members),
            span: open.merge(close.span),
        })
    }

    fn tuple_literal(&mut self) -> Result<Expr, ParserError> {
        let open = self.advance().span;
        let mut values = Vec::new();
        while !self.check(TokenType::RBracket) {
            values.push(self.expression(0)?);
            if !self.check(TokenType::RBracket) {
                self.consume(TokenType::Comma, ",")?;
            }
        }
        let close = self.consume(TokenType::RBracket, "]")?;
        Ok(Expr {
            kind: ExprKind::Tuple(values),
            span: open.merge(close.span),
        })
    }

    fn syscall_expression(&mut self) -> Result<Expr, ParserError> {
        let keyword = self.advance().span;
        self.consume(TokenType::LParen, "(")?;
        let mut arguments = Vec::new();
        while !self.check(TokenType::RParen) {
            arguments.push(self.expression(0)?);
            if !self.check(TokenType::RParen) {
                self.consume(TokenType::Comma, ",")?;
            }
        }
        let close = self.consume(TokenType::RParen, ")")?;
        Ok(Expr {
            kind: ExprKind::Syscall(arguments),
            span: keyword.merge(close.span),
        })
    }
}
