// src/frontend/parse_stmt.rs
//! Statements: blocks, local declarations, return, if/else chains and
//! expression statements.

use crate::errors::ParserError;
use crate::frontend::ast::*;
use crate::frontend::parser::Parser;
use crate::frontend::TokenType;

impl Parser<'_> {
    pub(super) fn statement(&mut self) -> Result<Stmt, ParserError> {
        if self.check(TokenType::KwReturn) {
            Ok(Stmt::Return(self.return_stmt()?))
        } else if self.check(TokenType::KwIf) {
            Ok(Stmt::If(self.if_stmt()?))
        } else if (self.check(TokenType::KwLet) || self.check(TokenType::KwConst))
            && self.peek_next().ty == TokenType::Identifier
        {
            Ok(Stmt::Let(self.let_stmt()?))
        } else {
            Ok(Stmt::Expr(self.expr_stmt()?))
        }
    }

    /// Parse a braced block scope. Exports are rejected inside blocks
    /// by the statement loop, so the collected list is always empty.
    pub(super) fn block(&mut self) -> Result<Block, ParserError> {
        let open = self.consume(TokenType::LBrace, "{")?;
        let (mut block, _exports) = self.scope_statements(false)?;
        let close = self.consume(TokenType::RBrace, "}")?;
        block.span = open.span.merge(close.span);
        Ok(block)
    }

    fn let_stmt(&mut self) -> Result<LetStmt, ParserError> {
        let constant = self.check(TokenType::KwConst);
        let keyword = self.advance().span;
        let name_token = self.consume(TokenType::Identifier, "identifier")?;
        let name = self.intern(&name_token.lexeme);
        self.consume(TokenType::Eq, "=")?;
        let value = self.expression(0)?;
        let semi = self.consume(TokenType::Semicolon, ";")?;
        Ok(LetStmt {
            name,
            constant,
            value,
            span: keyword.merge(semi.span),
        })
    }

    /// `return` always carries a value; bare returns do not parse
    fn return_stmt(&mut self) -> Result<ReturnStmt, ParserError> {
        let keyword = self.advance().span;
        let value = self.expression(0)?;
        let semi = self.consume(TokenType::Semicolon, ";")?;
        Ok(ReturnStmt {
            value,
            span: keyword.merge(semi.span),
        })
    }

    /// Parse `if (cond) { ... }` with any number of `else if` arms and
    /// an optional trailing `else`. Parentheses and braces are both
    /// mandatory.
    fn if_stmt(&mut self) -> Result<IfStmt, ParserError> {
        let keyword = self.advance().span;
        self.consume(TokenType::LParen, "(")?;
        let condition = self.expression(0)?;
        self.consume(TokenType::RParen, ")")?;
        let body = self.block()?;

        let mut alternatives = Vec::new();
        let mut span = keyword.merge(body.span);
        while self.check(TokenType::KwElse) {
            let else_span = self.advance().span;
            let condition = if self.match_token(TokenType::KwIf) {
                self.consume(TokenType::LParen, "(")?;
                let condition = self.expression(0)?;
                self.consume(TokenType::RParen, ")")?;
                Some(condition)
            } else {
                None
            };
            let body = self.block()?;
            let alternative_span = else_span.merge(body.span);
            let done = condition.is_none();
            span = span.merge(alternative_span);
            alternatives.push(Alternative {
                condition,
                body,
                span: alternative_span,
            });
            if done {
                break;
            }
        }

        Ok(IfStmt {
            condition,
            body,
            alternatives,
            span,
        })
    }

    fn expr_stmt(&mut self) -> Result<ExprStmt, ParserError> {
        let expr = self.expression(0)?;
        let semi = self.consume(TokenType::Semicolon, ";")?;
        let span = expr.span.merge(semi.span);
        Ok(ExprStmt { expr, span })
    }
}
