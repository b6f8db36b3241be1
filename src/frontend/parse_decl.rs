// src/frontend/parse_decl.rs
//! Scope layout: the statement loop shared by module bodies and
//! braced blocks, plus import, function and type declarations.

use crate::errors::ParserError;
use crate::frontend::ast::*;
use crate::frontend::parser::Parser;
use crate::frontend::TokenType;

impl Parser<'_> {
    /// Parse statements until the end of the enclosing scope.
    ///
    /// Module scopes run to `Eof`, blocks to the closing brace. Import
    /// statements are only legal while nothing but imports (and stray
    /// semicolons) have been seen, and only at module scope. Exports
    /// may prefix function and type declarations at module scope.
    pub(super) fn scope_statements(
        &mut self,
        module: bool,
    ) -> Result<(Block, Vec<Export>), ParserError> {
        let start = self.current().span;
        let mut types = Vec::new();
        let mut functions = Vec::new();
        let mut statements = Vec::new();
        let mut exports = Vec::new();
        let mut importing = module;

        while !self.check(TokenType::Eof) && !self.check(TokenType::RBrace) {
            if self.match_token(TokenType::Semicolon) {
                continue;
            }

            if self.check(TokenType::KwImport) {
                if !importing {
                    return Err(ParserError::ImportNotAtModuleHead {
                        span: self.current().span.into(),
                    });
                }
                self.import_statements(&mut statements)?;
                continue;
            }

            importing = false;

            let exported = if self.check(TokenType::KwExport) {
                let span = self.advance().span;
                if !module {
                    return Err(ParserError::ExportOutsideModule { span: span.into() });
                }
                true
            } else {
                false
            };

            if self.check(TokenType::KwFunction) {
                let function = self.function_decl()?;
                if exported {
                    exports.push(Export {
                        name: function.name,
                        span: function.span,
                    });
                }
                functions.push(function);
            } else if self.check(TokenType::KwType) && self.peek_next().ty == TokenType::Identifier
            {
                let decl = self.type_decl()?;
                if exported {
                    exports.push(Export {
                        name: decl.name,
                        span: decl.span,
                    });
                }
                types.push(decl);
            } else {
                if exported {
                    return Err(ParserError::InvalidExport {
                        span: self.current().span.into(),
                    });
                }
                statements.push(self.statement()?);
            }
        }

        let span = start.merge(self.previous().span);
        Ok((
            Block {
                types,
                functions,
                statements,
                span,
            },
            exports,
        ))
    }

    /// Parse one import statement into its flattened form.
    ///
    /// `import * as name from 'path';` produces a single module import;
    /// `import {a, b as c} from 'path';` produces one binding import
    /// per name, all sharing the path.
    fn import_statements(&mut self, statements: &mut Vec<Stmt>) -> Result<(), ParserError> {
        let keyword = self.advance().span;

        if self.match_token(TokenType::Star) {
            self.consume(TokenType::KwAs, "as")?;
            let name_token = self.consume(TokenType::Identifier, "identifier")?;
            let name = self.intern(&name_token.lexeme);
            self.expect_from()?;
            let from = self.consume(TokenType::Str, "string")?;
            let semi = self.consume(TokenType::Semicolon, ";")?;
            statements.push(Stmt::Import(ImportStmt {
                target: ImportTarget::Module(name),
                from: from.lexeme,
                span: keyword.merge(semi.span),
            }));
            return Ok(());
        }

        self.consume(TokenType::LBrace, "{")?;
        let mut bindings = Vec::new();
        while !self.check(TokenType::RBrace) {
            let name_token = self.consume(TokenType::Identifier, "identifier")?;
            let name = self.intern(&name_token.lexeme);
            let alias = if self.match_token(TokenType::KwAs) {
                let alias_token = self.consume(TokenType::Identifier, "identifier")?;
                self.intern(&alias_token.lexeme)
            } else {
                name
            };
            bindings.push((name, alias));
            if !self.check(TokenType::RBrace) {
                self.consume(TokenType::Comma, ",")?;
            }
        }
        self.consume(TokenType::RBrace, "}")?;
        self.expect_from()?;
        let from = self.consume(TokenType::Str, "string")?;
        let semi = self.consume(TokenType::Semicolon, ";")?;

        let span = keyword.merge(semi.span);
        for (name, alias) in bindings {
            statements.push(Stmt::Import(ImportStmt {
                target: ImportTarget::Binding { name, alias },
                from: from.lexeme.clone(),
                span,
            }));
        }
        Ok(())
    }

    /// `from` is not a keyword; it is matched by spelling here only
    fn expect_from(&mut self) -> Result<(), ParserError> {
        if self.check(TokenType::Identifier) && self.current().lexeme == "from" {
            self.advance();
            Ok(())
        } else {
            Err(ParserError::ExpectedToken {
                expected: "from".to_string(),
                found: self.found(),
                span: self.current().span.into(),
            })
        }
    }

    fn function_decl(&mut self) -> Result<FunctionDecl, ParserError> {
        let keyword = self.consume(TokenType::KwFunction, "function")?;
        let name_token = self.consume(TokenType::Identifier, "identifier")?;
        let name = self.intern(&name_token.lexeme);

        self.consume(TokenType::LParen, "(")?;
        let mut parameters = Vec::new();
        while !self.check(TokenType::RParen) {
            let param_token = self.consume(TokenType::Identifier, "identifier")?;
            let param_name = self.intern(&param_token.lexeme);
            self.consume(TokenType::Colon, ":")?;
            let ty = self.type_expr()?;
            let span = param_token.span.merge(ty.span);
            parameters.push(Parameter {
                name: param_name,
                ty,
                span,
            });
            if !self.check(TokenType::RParen) {
                self.consume(TokenType::Comma, ",")?;
            }
        }
        self.consume(TokenType::RParen, ")")?;

        let return_type = if self.match_token(TokenType::Colon) {
            Some(self.type_expr()?)
        } else {
            None
        };

        let body = self.block()?;
        let span = keyword.span.merge(body.span);
        Ok(FunctionDecl {
            name,
            parameters,
            return_type,
            body,
            span,
        })
    }

    fn type_decl(&mut self) -> Result<TypeDecl, ParserError> {
        let keyword = self.consume(TokenType::KwType, "type")?;
        let name_token = self.consume(TokenType::Identifier, "identifier")?;
        let name = self.intern(&name_token.lexeme);
        self.consume(TokenType::Eq, "=")?;
        let ty = self.type_expr()?;
        let semi = self.consume(TokenType::Semicolon, ";")?;
        Ok(TypeDecl {
            name,
            ty,
            span: keyword.span.merge(semi.span),
        })
    }
}
