//! LTL formula syntax trees and negation normal form.

use crate::parser::{ParseError, Parser};
use std::fmt;

/// Parsed LTL formula. Atoms name event types.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Formula {
    True,
    False,
    Atom(String),
    Not(Box<Formula>),
    And(Box<Formula>, Box<Formula>),
    Or(Box<Formula>, Box<Formula>),
    Implies(Box<Formula>, Box<Formula>),
    Next(Box<Formula>),
    Until(Box<Formula>, Box<Formula>),
    Release(Box<Formula>, Box<Formula>),
    Always(Box<Formula>),
    Eventually(Box<Formula>),
}

impl Formula {
    pub fn parse(source: &str) -> Result<Self, ParseError> {
        Parser::new(source)?.parse()
    }

    pub fn negate(self) -> Self {
        Formula::Not(Box::new(self))
    }

    /// Push negations down to the atoms.
    ///
    /// `[]f` becomes `false R f`, `<>f` becomes `true U f`, and `->` is
    /// rewritten through disjunction.
    pub fn to_nnf(&self) -> Nnf {
        nnf(self, false)
    }
}

fn nnf(f: &Formula, negated: bool) -> Nnf {
    let boxed = |g: &Formula, n: bool| Box::new(nnf(g, n));
    match (f, negated) {
        (Formula::True, false) | (Formula::False, true) => Nnf::True,
        (Formula::True, true) | (Formula::False, false) => Nnf::False,
        (Formula::Atom(name), _) => Nnf::Lit {
            atom: name.clone(),
            positive: !negated,
        },
        (Formula::Not(g), _) => nnf(g, !negated),
        (Formula::And(l, r), false) | (Formula::Or(l, r), true) => {
            Nnf::And(boxed(l, negated), boxed(r, negated))
        }
        (Formula::Or(l, r), false) | (Formula::And(l, r), true) => {
            Nnf::Or(boxed(l, negated), boxed(r, negated))
        }
        (Formula::Implies(l, r), false) => Nnf::Or(boxed(l, true), boxed(r, false)),
        (Formula::Implies(l, r), true) => Nnf::And(boxed(l, false), boxed(r, true)),
        (Formula::Next(g), _) => Nnf::Next(boxed(g, negated)),
        (Formula::Until(l, r), false) | (Formula::Release(l, r), true) => {
            Nnf::Until(boxed(l, negated), boxed(r, negated))
        }
        (Formula::Release(l, r), false) | (Formula::Until(l, r), true) => {
            Nnf::Release(boxed(l, negated), boxed(r, negated))
        }
        (Formula::Always(g), false) | (Formula::Eventually(g), true) => {
            Nnf::Release(Box::new(Nnf::False), boxed(g, negated))
        }
        (Formula::Eventually(g), false) | (Formula::Always(g), true) => {
            Nnf::Until(Box::new(Nnf::True), boxed(g, negated))
        }
    }
}

impl fmt::Display for Formula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Formula::True => write!(f, "true"),
            Formula::False => write!(f, "false"),
            Formula::Atom(name) => write!(f, "did({})", name),
            Formula::Not(g) => write!(f, "!{}", g),
            Formula::Next(g) => write!(f, "X({})", g),
            Formula::Always(g) => write!(f, "[]{}", g),
            Formula::Eventually(g) => write!(f, "<>{}", g),
            Formula::And(l, r) => write!(f, "({} && {})", l, r),
            Formula::Or(l, r) => write!(f, "({} || {})", l, r),
            Formula::Implies(l, r) => write!(f, "({} -> {})", l, r),
            Formula::Until(l, r) => write!(f, "({} U {})", l, r),
            Formula::Release(l, r) => write!(f, "({} R {})", l, r),
        }
    }
}

/// Formula in negation normal form: negation only on atoms, no derived
/// operators.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Nnf {
    True,
    False,
    Lit { atom: String, positive: bool },
    And(Box<Nnf>, Box<Nnf>),
    Or(Box<Nnf>, Box<Nnf>),
    Next(Box<Nnf>),
    Until(Box<Nnf>, Box<Nnf>),
    Release(Box<Nnf>, Box<Nnf>),
}
