// src/frontend/ast.rs

use crate::frontend::Span;

/// Unique identifier for symbols (interned strings)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Symbol(pub u32);

/// Member visibility in an object type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    Public,
    Private,
    Readonly,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Public => "public",
            Self::Private => "private",
            Self::Readonly => "readonly",
        }
    }
}

/// A parsed module: statement block plus the names it exports
#[derive(Debug, Clone)]
pub struct ModuleAst {
    pub block: Block,
    pub exports: Vec<Export>,
}

/// An exported declaration, by name
#[derive(Debug, Clone)]
pub struct Export {
    pub name: Symbol,
    pub span: Span,
}

/// Statement block with hoisted type and function declarations
#[derive(Debug, Clone)]
pub struct Block {
    pub types: Vec<TypeDecl>,
    pub functions: Vec<FunctionDecl>,
    pub statements: Vec<Stmt>,
    pub span: Span,
}

/// Type alias declaration: type Name = T;
#[derive(Debug, Clone)]
pub struct TypeDecl {
    pub name: Symbol,
    pub ty: TypeExpr,
    pub span: Span,
}

/// Function declaration
#[derive(Debug, Clone)]
pub struct FunctionDecl {
    pub name: Symbol,
    pub parameters: Vec<Parameter>,
    pub return_type: Option<TypeExpr>,
    pub body: Block,
    pub span: Span,
}

/// Function parameter: name: T
#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: Symbol,
    pub ty: TypeExpr,
    pub span: Span,
}

/// Type expression
#[derive(Debug, Clone)]
pub struct TypeExpr {
    pub kind: TypeExprKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum TypeExprKind {
    /// A bound type name
    Named(Symbol),
    /// ptr[T]
    Pointer(Box<TypeExpr>),
    /// { visibility name: T, ... }
    Object(Vec<ObjectTypeMember>),
    /// [T, U, ...]
    Tuple(Vec<TypeExpr>),
}

/// One member of an object type
#[derive(Debug, Clone)]
pub struct ObjectTypeMember {
    pub visibility: Visibility,
    pub name: Symbol,
    pub ty: TypeExpr,
    pub span: Span,
}

/// Statements
#[derive(Debug, Clone)]
pub enum Stmt {
    Import(ImportStmt),
    Let(LetStmt),
    Return(ReturnStmt),
    If(IfStmt),
    Expr(ExprStmt),
}

/// A single import binding. A brace import with several names parses
/// into one of these per name, all sharing the same source path.
#[derive(Debug, Clone)]
pub struct ImportStmt {
    pub target: ImportTarget,
    /// Import path as written; the module loader rewrites this in place
    /// to the resolved path so later passes can map it to a module.
    pub from: String,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum ImportTarget {
    /// import * as name from '...';
    Module(Symbol),
    /// import {name} or {name as alias} from '...';
    Binding { name: Symbol, alias: Symbol },
}

/// Local declaration: let x = expr; or const x = expr;
#[derive(Debug, Clone)]
pub struct LetStmt {
    pub name: Symbol,
    pub constant: bool,
    pub value: Expr,
    pub span: Span,
}

/// Return statement (a value is always required)
#[derive(Debug, Clone)]
pub struct ReturnStmt {
    pub value: Expr,
    pub span: Span,
}

/// If statement with any number of else-if/else alternatives
#[derive(Debug, Clone)]
pub struct IfStmt {
    pub condition: Expr,
    pub body: Block,
    pub alternatives: Vec<Alternative>,
    pub span: Span,
}

/// else-if (with condition) or trailing else (without)
#[derive(Debug, Clone)]
pub struct Alternative {
    pub condition: Option<Expr>,
    pub body: Block,
    pub span: Span,
}

/// Expression statement
#[derive(Debug, Clone)]
pub struct ExprStmt {
    pub expr: Expr,
    pub span: Span,
}

/// Expressions
#[derive(Debug, Clone)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum ExprKind {
    /// Integer literal (digits only; the sign-free value)
    Integer(u64),
    /// Scalar literal (digits '.' digits)
    Scalar(f64),
    /// A bound name
    Name(Symbol),
    /// Object literal: { x: 1, y } (shorthand members become Name values)
    Object(Vec<ObjectLiteralMember>),
    /// Tuple literal: [1, 2]
    Tuple(Vec<Expr>),
    /// syscall(number, args...)
    Syscall(Vec<Expr>),
    /// Binary operation
    Binary(Box<BinaryExpr>),
    /// expr as T
    Cast(Box<CastExpr>),
    /// expr.member
    Access(Box<AccessExpr>),
    /// expr[index] with an integer literal index
    Index(Box<IndexExpr>),
    /// callee(args...)
    Call(Box<CallExpr>),
}

/// One member of an object literal
#[derive(Debug, Clone)]
pub struct ObjectLiteralMember {
    pub name: Symbol,
    pub value: Expr,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub struct BinaryExpr {
    pub op: BinaryOp,
    pub lhs: Expr,
    pub rhs: Expr,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Lt,
    Le,
    Eq,
}

#[derive(Debug, Clone)]
pub struct CastExpr {
    pub value: Expr,
    pub ty: TypeExpr,
}

#[derive(Debug, Clone)]
pub struct AccessExpr {
    pub value: Expr,
    pub member: Symbol,
    pub member_span: Span,
}

#[derive(Debug, Clone)]
pub struct IndexExpr {
    pub value: Expr,
    pub index: u64,
    pub index_span: Span,
}

#[derive(Debug, Clone)]
pub struct CallExpr {
    pub callee: Expr,
    pub arguments: Vec<Expr>,
}
