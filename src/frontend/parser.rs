// src/frontend/parser.rs

use crate::errors::ParserError;
use crate::frontend::ast::*;
use crate::frontend::{Interner, Token, TokenType};

/// Recursive-descent parser over a pre-lexed token stream.
///
/// The grammar is split across sibling modules: declarations and scope
/// layout in `parse_decl`, statements in `parse_stmt`, expressions in
/// `parse_expr` and type expressions in `parse_type`.
pub struct Parser<'a> {
    pub(super) tokens: Vec<Token>,
    pub(super) cursor: usize,
    pub(super) interner: &'a mut Interner,
}

impl<'a> Parser<'a> {
    /// The token stream must end with an `Eof` token, as produced by
    /// `lexer::tokenize`.
    pub fn new(tokens: Vec<Token>, interner: &'a mut Interner) -> Self {
        Self {
            tokens,
            cursor: 0,
            interner,
        }
    }

    /// Parse a whole module: imports first, then declarations and
    /// statements in any order, with exports collected along the way.
    pub fn parse_module(&mut self) -> Result<ModuleAst, ParserError> {
        let (block, exports) = self.scope_statements(true)?;
        if !self.check(TokenType::Eof) {
            // A stray closing brace at module scope falls out of the
            // statement loop; report it as a failed expression.
            return Err(self.expected_expression());
        }
        Ok(ModuleAst { block, exports })
    }

    pub(super) fn current(&self) -> &Token {
        &self.tokens[self.cursor]
    }

    pub(super) fn previous(&self) -> &Token {
        &self.tokens[self.cursor.saturating_sub(1)]
    }

    pub(super) fn peek_next(&self) -> &Token {
        self.tokens
            .get(self.cursor + 1)
            .unwrap_or_else(|| self.current())
    }

    /// Advance past the current token and return it. Stops at `Eof`.
    pub(super) fn advance(&mut self) -> &Token {
        let index = self.cursor;
        if self.tokens[index].ty != TokenType::Eof {
            self.cursor += 1;
        }
        &self.tokens[index]
    }

    pub(super) fn check(&self, ty: TokenType) -> bool {
        self.current().ty == ty
    }

    /// Consume the current token if it matches, otherwise leave it
    pub(super) fn match_token(&mut self, ty: TokenType) -> bool {
        if self.check(ty) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Require a token of the given type and return it, or fail with
    /// the conventional expected/found message.
    pub(super) fn consume(&mut self, ty: TokenType, expected: &str) -> Result<Token, ParserError> {
        if self.check(ty) {
            Ok(self.advance().clone())
        } else {
            Err(ParserError::ExpectedToken {
                expected: expected.to_string(),
                found: self.found(),
                span: self.current().span.into(),
            })
        }
    }

    /// How the current token reads in an error message
    pub(super) fn found(&self) -> String {
        let token = self.current();
        if token.ty == TokenType::Eof {
            token.ty.as_str().to_string()
        } else {
            token.lexeme.clone()
        }
    }

    pub(super) fn intern(&mut self, text: &str) -> Symbol {
        self.interner.intern(text)
    }

    pub(super) fn expected_expression(&self) -> ParserError {
        ParserError::ExpectedExpression {
            span: self.current().span.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frontend::lexer::tokenize;

    fn parse_source(source: &str) -> Result<ModuleAst, ParserError> {
        let tokens = tokenize(source).unwrap();
        let mut interner = Interner::new();
        let mut parser = Parser::new(tokens, &mut interner);
        parser.parse_module()
    }

    fn parse_expr_source(source: &str) -> Expr {
        let tokens = tokenize(source).unwrap();
        let mut interner = Interner::new();
        let mut parser = Parser::new(tokens, &mut interner);
        parser.expression(0).unwrap()
    }

    #[test]
    fn parse_int_literal() {
        let expr = parse_expr_source("42");
        match expr.kind {
            ExprKind::Integer(n) => assert_eq!(n, 42),
            _ => panic!("expected integer literal"),
        }
    }

    #[test]
    fn parse_scalar_literal() {
        let expr = parse_expr_source("3.25");
        match expr.kind {
            ExprKind::Scalar(n) => assert!((n - 3.25).abs() < f64::EPSILON),
            _ => panic!("expected scalar literal"),
        }
    }

    #[test]
    fn parse_precedence() {
        // 1 + 2 * 3 should be 1 + (2 * 3)
        let expr = parse_expr_source("1 + 2 * 3");
        match expr.kind {
            ExprKind::Binary(bin) => {
                assert_eq!(bin.op, BinaryOp::Add);
                match bin.rhs.kind {
                    ExprKind::Binary(inner) => assert_eq!(inner.op, BinaryOp::Mul),
                    _ => panic!("expected binary on right"),
                }
            }
            _ => panic!("expected binary"),
        }
    }

    #[test]
    fn parse_left_associative() {
        // 1 - 2 - 3 should be (1 - 2) - 3
        let expr = parse_expr_source("1 - 2 - 3");
        match expr.kind {
            ExprKind::Binary(bin) => {
                assert_eq!(bin.op, BinaryOp::Sub);
                match bin.lhs.kind {
                    ExprKind::Binary(inner) => assert_eq!(inner.op, BinaryOp::Sub),
                    _ => panic!("expected binary on left"),
                }
            }
            _ => panic!("expected binary"),
        }
    }

    #[test]
    fn parse_comparison_binds_looser_than_sum() {
        // a < b + 1 should be a < (b + 1)
        let expr = parse_expr_source("a < b + 1");
        match expr.kind {
            ExprKind::Binary(bin) => {
                assert_eq!(bin.op, BinaryOp::Lt);
                assert!(matches!(bin.rhs.kind, ExprKind::Binary(_)));
            }
            _ => panic!("expected binary"),
        }
    }

    #[test]
    fn parse_cast_postfix() {
        let expr = parse_expr_source("discriminant as u8");
        match expr.kind {
            ExprKind::Cast(cast) => {
                assert!(matches!(cast.value.kind, ExprKind::Name(_)));
                assert!(matches!(cast.ty.kind, TypeExprKind::Named(_)));
            }
            _ => panic!("expected cast"),
        }
    }

    #[test]
    fn parse_postfix_chain() {
        // Access then index then call, left to right
        let expr = parse_expr_source("state.handlers[0](1)");
        match expr.kind {
            ExprKind::Call(call) => {
                assert_eq!(call.arguments.len(), 1);
                assert!(matches!(call.callee.kind, ExprKind::Index(_)));
            }
            _ => panic!("expected call"),
        }
    }

    #[test]
    fn parse_index_requires_integer_literal() {
        let tokens = tokenize("pair[i]").unwrap();
        let mut interner = Interner::new();
        let mut parser = Parser::new(tokens, &mut interner);
        let result = parser.expression(0);
        assert!(matches!(result, Err(ParserError::ExpectedToken { .. })));
    }

    #[test]
    fn parse_object_literal_shorthand() {
        let expr = parse_expr_source("{x, y: 2}");
        match expr.kind {
            ExprKind::Object(members) => {
                assert_eq!(members.len(), 2);
                assert!(matches!(members[0].value.kind, ExprKind::Name(_)));
                assert!(matches!(members[1].value.kind, ExprKind::Integer(2)));
            }
            _ => panic!("expected object literal"),
        }
    }

    #[test]
    fn parse_duplicate_literal_property() {
        let tokens = tokenize("{x: 1, x: 2}").unwrap();
        let mut interner = Interner::new();
        let mut parser = Parser::new(tokens, &mut interner);
        let result = parser.expression(0);
        assert!(matches!(
            result,
            Err(ParserError::DuplicateProperty { name, .. }) if name == "x"
        ));
    }

    #[test]
    fn parse_module_layout() {
        let module = parse_source(
            "function main(): s64 { return 0; }\n\
             type Pair = [u64, u64];\n\
             let answer = 42;",
        )
        .unwrap();
        assert_eq!(module.block.functions.len(), 1);
        assert_eq!(module.block.types.len(), 1);
        assert_eq!(module.block.statements.len(), 1);
        assert!(module.exports.is_empty());
    }

    #[test]
    fn parse_function_parameters() {
        let module = parse_source("function add(a: u64, b: u64): u64 { return a + b; }").unwrap();
        let function = &module.block.functions[0];
        assert_eq!(function.parameters.len(), 2);
        assert!(function.return_type.is_some());
        assert_eq!(function.body.statements.len(), 1);
    }

    #[test]
    fn parse_exported_declarations() {
        let module = parse_source(
            "export function exit(status: s32) { syscall(60, status); }\n\
             export type Status = s32;",
        )
        .unwrap();
        assert_eq!(module.exports.len(), 2);
    }

    #[test]
    fn parse_export_of_statement_rejected() {
        let result = parse_source("export let x = 1;");
        assert!(matches!(result, Err(ParserError::InvalidExport { .. })));
    }

    #[test]
    fn parse_export_inside_block_rejected() {
        let result = parse_source("function f() { export function g() {} }");
        assert!(matches!(result, Err(ParserError::ExportOutsideModule { .. })));
    }

    #[test]
    fn parse_module_import() {
        let module = parse_source("import * as sys from './sys.spn';").unwrap();
        assert_eq!(module.block.statements.len(), 1);
        match &module.block.statements[0] {
            Stmt::Import(import) => {
                assert!(matches!(import.target, ImportTarget::Module(_)));
                assert_eq!(import.from, "./sys.spn");
            }
            _ => panic!("expected import"),
        }
    }

    #[test]
    fn parse_bound_imports_flatten() {
        let module = parse_source("import {exit, write as put} from './sys.spn';").unwrap();
        assert_eq!(module.block.statements.len(), 2);
        for statement in &module.block.statements {
            match statement {
                Stmt::Import(import) => {
                    assert!(matches!(import.target, ImportTarget::Binding { .. }));
                    assert_eq!(import.from, "./sys.spn");
                }
                _ => panic!("expected import"),
            }
        }
    }

    #[test]
    fn parse_import_after_statement_rejected() {
        let result = parse_source("let x = 1;\nimport * as sys from './sys.spn';");
        assert!(matches!(
            result,
            Err(ParserError::ImportNotAtModuleHead { .. })
        ));
    }

    #[test]
    fn parse_semicolons_do_not_end_imports() {
        let module = parse_source(";;\nimport * as sys from './sys.spn';").unwrap();
        assert_eq!(module.block.statements.len(), 1);
    }

    #[test]
    fn parse_if_else_chain() {
        let module = parse_source(
            "if (a == 1) { b; } else if (a == 2) { c; } else { d; }",
        );
        let module = module.unwrap();
        match &module.block.statements[0] {
            Stmt::If(stmt) => {
                assert_eq!(stmt.alternatives.len(), 2);
                assert!(stmt.alternatives[0].condition.is_some());
                assert!(stmt.alternatives[1].condition.is_none());
            }
            _ => panic!("expected if statement"),
        }
    }

    #[test]
    fn parse_let_and_const() {
        let module = parse_source("let a = 1; const b = 2;").unwrap();
        match (&module.block.statements[0], &module.block.statements[1]) {
            (Stmt::Let(a), Stmt::Let(b)) => {
                assert!(!a.constant);
                assert!(b.constant);
            }
            _ => panic!("expected let statements"),
        }
    }

    #[test]
    fn parse_let_without_name_is_expression() {
        // Without a following identifier, `let` reaches the expression
        // parser and fails there
        let result = parse_source("let = 5;");
        assert!(matches!(result, Err(ParserError::ExpectedExpression { .. })));
    }

    #[test]
    fn parse_return_statement() {
        let module = parse_source("function f(): s32 { return 1; }").unwrap();
        let body = &module.block.functions[0].body;
        assert!(matches!(body.statements[0], Stmt::Return(_)));
    }

    #[test]
    fn parse_return_requires_value() {
        let result = parse_source("function f(): u64 { return; }");
        assert!(matches!(result, Err(ParserError::ExpectedExpression { .. })));
    }

    #[test]
    fn parse_missing_semicolon() {
        let result = parse_source("let x = 1");
        assert!(matches!(
            result,
            Err(ParserError::ExpectedToken { expected, .. }) if expected == ";"
        ));
    }

    #[test]
    fn parse_type_expressions() {
        let module = parse_source(
            "type Byte = u8;\n\
             type Buffer = ptr[u8];\n\
             type Pair = [u64, u64];\n\
             type Point = {x: f64, private tag: u8};",
        )
        .unwrap();
        assert_eq!(module.block.types.len(), 4);
        match &module.block.types[3].ty.kind {
            TypeExprKind::Object(members) => {
                assert_eq!(members[0].visibility, Visibility::Public);
                assert_eq!(members[1].visibility, Visibility::Private);
            }
            _ => panic!("expected object type"),
        }
    }

    #[test]
    fn parse_duplicate_type_property() {
        let result = parse_source("type T = {x: u8, x: u16};");
        assert!(matches!(result, Err(ParserError::DuplicateProperty { .. })));
    }

    #[test]
    fn parse_trailing_commas() {
        assert!(parse_source("type Pair = [u64, u64,];").is_ok());
        assert!(parse_source("let p = {x: 1,};").is_ok());
    }

    #[test]
    fn parse_trailing_comma_in_call() {
        let expr = parse_expr_source("f(1, 2,)");
        match expr.kind {
            ExprKind::Call(call) => assert_eq!(call.arguments.len(), 2),
            _ => panic!("expected call"),
        }
    }
}
