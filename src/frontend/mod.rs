// src/frontend/mod.rs
pub mod ast;
pub mod intern;
pub mod lexer;
mod parse_decl;
mod parse_expr;
mod parse_stmt;
mod parse_type;
pub mod parser;
pub mod token;

pub use intern::Interner;
pub use lexer::tokenize;
pub use parser::Parser;
pub use token::{Span, Token, TokenType};
