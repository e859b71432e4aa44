//! LTL backend.
//!
//! An invariant's formula is parsed, negated and compiled into a Büchi
//! automaton. The graph is searched for a path whose word, padded at
//! TERMINAL with a letter on which every atom is false, the automaton
//! accepts.

pub mod buchi;
pub mod checker;
pub mod error;
pub mod formula;
pub mod parser;

pub use buchi::{Buchi, BuchiState};
pub use checker::{LtlChecker, ViolationAutomaton};
pub use error::{LtlError, LtlResult};
pub use formula::{Formula, Nnf};
pub use parser::{Lexer, ParseError, Parser, Token, TokenKind};
