// src/commands/mod.rs
//! One module per CLI subcommand.

pub mod check;
pub mod common;
pub mod compile;
pub mod inspect;
