//! Runtime engine for table-driven LR parsing.
//!
//! This crate executes a grammar that was compiled elsewhere: given a
//! [`CompiledSpec`] (action table, goto table, productions with semantic
//! handlers), a [`Parser`] consumes classified terminal symbols one at a
//! time via [`Parser::token`], is terminated via [`Parser::eoi`], and
//! yields a single derivation result or fails at the first invalid token.
//!
//! Automaton construction, conflict resolution and lexical analysis are
//! out of scope; the specification is consumed read-only and may be shared
//! across any number of parser instances.
#![warn(missing_docs)]

pub mod parser;
pub mod spec;
pub mod symbol;

pub use parser::{Parser, ParserError};
pub use spec::{Action, CompiledSpec, Production, Reduced, SpecBuilder, State};
pub use symbol::{Symbol, SymbolId};
