// src/frontend/parse_type.rs
//! Type expressions: named types, `ptr[T]`, object types and tuples.

use crate::errors::ParserError;
use crate::frontend::ast::*;
use crate::frontend::parser::Parser;
use crate::frontend::TokenType;

impl Parser<'_> {
    pub(super) fn type_expr(&mut self) -> Result<TypeExpr, ParserError> {
        match self.current().ty {
            TokenType::KwPtr => {
                let keyword = self.advance().span;
                self.consume(TokenType::LBracket, "[")?;
                let pointee = self.type_expr()?;
                let close = self.consume(TokenType::RBracket, "]")?;
                Ok(TypeExpr {
                    kind: TypeExprKind::Pointer(Box::new(pointee)),
                    span: keyword.merge(close.span),
                })
            }
            TokenType::LBrace => self.object_type(),
            TokenType::LBracket => self.tuple_type(),
            _ => {
                let token = self.consume(TokenType::Identifier, "identifier")?;
                let name = self.intern(&token.lexeme);
                Ok(TypeExpr {
                    kind: TypeExprKind::Named(name),
                    span: token.span,
                })
            }
        }
    }

    /// `{visibility name: T, ...}` where visibility is one of the
    /// spellings `public`, `private` or `readonly` and defaults to
    /// public. The spellings are not keywords, so a member cannot
    /// itself be named after one.
    fn object_type(&mut self) -> Result<TypeExpr, ParserError> {
        let open = self.advance().span;
        let mut members: Vec<ObjectTypeMember> = Vec::new();
        while !self.check(TokenType::RBrace) {
            let visibility = self.member_visibility();
            let name_token = self.consume(TokenType::Identifier, "identifier")?;
            let name = self.intern(&name_token.lexeme);
            if members.iter().any(|member| member.name == name) {
                return Err(ParserError::DuplicateProperty {
                    name: name_token.lexeme,
                    span: name_token.span.into(),
                });
            }
            self.consume(TokenType::Colon, ":")?;
            let ty = self.type_expr()?;
            let span = name_token.span.merge(ty.span);
            members.push(ObjectTypeMember {
                visibility,
                name,
                ty,
                span,
            });
            if !self.check(TokenType::RBrace) {
                self.consume(TokenType::Comma, ",")?;
            }
        }
        let close = self.consume(TokenType::RBrace, "}")?;
        Ok(TypeExpr {
            kind: TypeExprKind::Object(members),
            span: open.merge(close.span),
        })
    }

    fn member_visibility(&mut self) -> Visibility {
        if self.check(TokenType::Identifier) {
            let visibility = match self.current().lexeme.as_str() {
                "public" => Some(Visibility::Public),
                "private" => Some(Visibility::Private),
                "readonly" => Some(Visibility::Readonly),
                _ => None,
            };
            if let Some(visibility) = visibility {
                self.advance();
                return visibility;
            }
        }
        Visibility::Public
    }

    fn tuple_type(&mut self) -> Result<TypeExpr, ParserError> {
        let open = self.advance().span;
        let mut members = Vec::new();
        while !self.check(TokenType::RBracket) {
            members.push(self.type_expr()?);
            if !self.check(TokenType::RBracket) {
                self.consume(TokenType::Comma, ",")?;
            }
        }
        let close = self.consume(TokenType::RBracket, "]")?;
        Ok(TypeExpr {
            kind: TypeExprKind::Tuple(members),
            span: open.merge(close.span),
        })
    }
}
