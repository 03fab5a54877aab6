//! Documentation comment IDs and cref references.
//!
//! Text such as `M:Demo.Widget.Resize(System.Int32,System.Int32)` or
//! `Widget.Resize(int, int)` is lexed and parsed into a [`ast::Reference`],
//! resolved against a [`catalog::SymbolCatalog`] by [`resolver::Resolver`],
//! and any catalog member can be turned back into its one canonical ID by
//! [`encoder::Encoder`]. [`hiding`] merges inherited members and records
//! which ones a derived type hides.

pub mod ast;
pub mod catalog;
pub mod commands;
pub mod config;
pub mod diagnostics;
pub mod encoder;
pub mod error;
pub mod hiding;
pub mod lexer;
pub mod parser;
pub mod resolver;
pub mod scanner;
#[cfg(test)]
mod testing;
pub mod types;
