// src/errors/sema.rs
//! Semantic analysis and lowering errors (E2xxx).

#![allow(unused_assignments)] // False positives from thiserror derive

use miette::{Diagnostic, SourceSpan};
use thiserror::Error;

#[derive(Error, Debug, Diagnostic, Clone)]
pub enum SemanticError {
    #[error("undefined reference to unbound name '{name}'")]
    #[diagnostic(code(E2001))]
    UnboundName {
        name: String,
        #[label("not bound in any enclosing scope")]
        span: SourceSpan,
    },

    #[error("cannot bind to builtin name '{name}'")]
    #[diagnostic(code(E2002))]
    ReservedName {
        name: String,
        #[label("builtin name")]
        span: SourceSpan,
    },

    #[error("name '{name}' is already bound in this scope")]
    #[diagnostic(code(E2003))]
    NameCollision {
        name: String,
        #[label("rebound here")]
        span: SourceSpan,
    },

    #[error("name '{name}' does not refer to a type")]
    #[diagnostic(code(E2004))]
    NotAType {
        name: String,
        #[label("not a type")]
        span: SourceSpan,
    },

    #[error("unable to determine type of {literal} literal")]
    #[diagnostic(
        code(E2005),
        help("literals take their type from context; cast it or use it where a type is expected")
    )]
    AmbiguousLiteral {
        literal: &'static str,
        #[label("needs type context")]
        span: SourceSpan,
    },

    #[error("expected {expected} {what}, found {found}")]
    #[diagnostic(code(E2006))]
    LiteralArity {
        expected: usize,
        found: usize,
        what: &'static str,
        #[label("in this literal")]
        span: SourceSpan,
    },

    #[error("expected property '{expected}' but found '{found}'")]
    #[diagnostic(
        code(E2007),
        help("object literal members are matched to the expected type by position")
    )]
    FieldNameMismatch {
        expected: String,
        found: String,
        #[label("property out of order")]
        span: SourceSpan,
    },

    #[error("tuple index out of bounds")]
    #[diagnostic(code(E2008))]
    IndexOutOfBounds {
        #[label("no member at this index")]
        span: SourceSpan,
    },

    #[error("expected at least one argument")]
    #[diagnostic(code(E2009))]
    SyscallNoArguments {
        #[label("syscall needs a number")]
        span: SourceSpan,
    },

    #[error("expected the first argument of a syscall to be an integer literal")]
    #[diagnostic(code(E2010))]
    SyscallNumberNotLiteral {
        #[label("not a literal number")]
        span: SourceSpan,
    },

    #[error("unsupported syscall {number}")]
    #[diagnostic(code(E2011))]
    UnsupportedSyscall {
        number: u64,
        #[label("unknown to the target platform")]
        span: SourceSpan,
    },

    #[error("expected {expected} arguments, but found {found}")]
    #[diagnostic(code(E2012))]
    ArityMismatch {
        expected: usize,
        found: usize,
        #[label("wrong number of arguments")]
        span: SourceSpan,
    },

    #[error("type '{ty}' is not callable")]
    #[diagnostic(code(E2013))]
    NotCallable {
        ty: String,
        #[label("not a function")]
        span: SourceSpan,
    },

    #[error("module does not export the name '{name}'")]
    #[diagnostic(code(E2014))]
    UnknownExport {
        name: String,
        #[label("not exported")]
        span: SourceSpan,
    },

    #[error("property '{name}' does not exist in type '{ty}'")]
    #[diagnostic(code(E2015))]
    UnknownField {
        name: String,
        ty: String,
        #[label("unknown property")]
        span: SourceSpan,
    },

    #[error("type mismatch between left and right-hand sides")]
    #[diagnostic(code(E2016))]
    OperandMismatch {
        #[label("operands disagree")]
        span: SourceSpan,
    },

    #[error("type '{ty}' is not arithmetic")]
    #[diagnostic(code(E2017))]
    NotArithmetic {
        ty: String,
        #[label("cannot do arithmetic here")]
        span: SourceSpan,
    },

    #[error("cannot use type '{ty}' to construct another type because it has private properties")]
    #[diagnostic(code(E2018))]
    PrivateConversion {
        ty: String,
        #[label("source type has private properties")]
        span: SourceSpan,
    },

    #[error("cannot construct type '{ty}' because it has private properties")]
    #[diagnostic(code(E2019))]
    PrivateConstruction {
        ty: String,
        #[label("target type has private properties")]
        span: SourceSpan,
    },

    #[error("expected type '{expected}' but found '{found}'")]
    #[diagnostic(code(E2020))]
    TypeMismatch {
        expected: String,
        found: String,
        #[label("no conversion applies")]
        span: SourceSpan,
    },

    #[error("invalid context for return statement")]
    #[diagnostic(code(E2021))]
    ReturnOutsideFunction {
        #[label("no enclosing function")]
        span: SourceSpan,
    },

    #[error("cannot instantiate local variable with type '{ty}'")]
    #[diagnostic(code(E2022))]
    InvalidLocalType {
        ty: String,
        #[label("value has no storable type")]
        span: SourceSpan,
    },

    #[error("cannot capture binding '{name}' from an enclosing function")]
    #[diagnostic(
        code(E2023),
        help("functions close over nothing; pass the value as a parameter instead")
    )]
    CapturedBinding {
        name: String,
        #[label("defined in an outer function")]
        span: SourceSpan,
    },

    #[error("unsupported construct: {detail}")]
    #[diagnostic(code(E2999))]
    Unsupported {
        detail: String,
        #[label("no lowering rule for this")]
        span: SourceSpan,
    },
}
