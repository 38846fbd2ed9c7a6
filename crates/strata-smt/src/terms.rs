use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::backends::smtlib_printer::to_smtlib;

/// Abstract SMT term representation, solver-agnostic.
///
/// Terms are immutable values. Equality and hashing are structural, so two
/// independently built copies of the same formula are the same set element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum SmtTerm {
    /// Variable reference by name.
    Var(String),
    /// Integer literal.
    IntLit(i64),
    /// Boolean literal.
    BoolLit(bool),

    // Arithmetic
    Add(Box<SmtTerm>, Box<SmtTerm>),
    Sub(Box<SmtTerm>, Box<SmtTerm>),
    Mul(Box<SmtTerm>, Box<SmtTerm>),

    // Comparison
    Eq(Box<SmtTerm>, Box<SmtTerm>),
    Lt(Box<SmtTerm>, Box<SmtTerm>),
    Le(Box<SmtTerm>, Box<SmtTerm>),
    Gt(Box<SmtTerm>, Box<SmtTerm>),
    Ge(Box<SmtTerm>, Box<SmtTerm>),

    // Boolean logic
    And(Vec<SmtTerm>),
    Or(Vec<SmtTerm>),
    Not(Box<SmtTerm>),
    Implies(Box<SmtTerm>, Box<SmtTerm>),

    // If-then-else
    Ite(Box<SmtTerm>, Box<SmtTerm>, Box<SmtTerm>),
}

#[allow(clippy::should_implement_trait)]
impl SmtTerm {
    pub fn var(name: impl Into<String>) -> Self {
        SmtTerm::Var(name.into())
    }

    pub fn int(n: i64) -> Self {
        SmtTerm::IntLit(n)
    }

    pub fn bool(b: bool) -> Self {
        SmtTerm::BoolLit(b)
    }

    pub fn add(self, other: SmtTerm) -> Self {
        SmtTerm::Add(Box::new(self), Box::new(other))
    }

    pub fn sub(self, other: SmtTerm) -> Self {
        SmtTerm::Sub(Box::new(self), Box::new(other))
    }

    pub fn mul(self, other: SmtTerm) -> Self {
        SmtTerm::Mul(Box::new(self), Box::new(other))
    }

    pub fn eq(self, other: SmtTerm) -> Self {
        SmtTerm::Eq(Box::new(self), Box::new(other))
    }

    pub fn lt(self, other: SmtTerm) -> Self {
        SmtTerm::Lt(Box::new(self), Box::new(other))
    }

    pub fn le(self, other: SmtTerm) -> Self {
        SmtTerm::Le(Box::new(self), Box::new(other))
    }

    pub fn gt(self, other: SmtTerm) -> Self {
        SmtTerm::Gt(Box::new(self), Box::new(other))
    }

    pub fn ge(self, other: SmtTerm) -> Self {
        SmtTerm::Ge(Box::new(self), Box::new(other))
    }

    pub fn and(terms: Vec<SmtTerm>) -> Self {
        SmtTerm::And(terms)
    }

    pub fn or(terms: Vec<SmtTerm>) -> Self {
        SmtTerm::Or(terms)
    }

    pub fn not(self) -> Self {
        SmtTerm::Not(Box::new(self))
    }

    pub fn implies(self, other: SmtTerm) -> Self {
        SmtTerm::Implies(Box::new(self), Box::new(other))
    }

    pub fn ite(cond: SmtTerm, then: SmtTerm, els: SmtTerm) -> Self {
        SmtTerm::Ite(Box::new(cond), Box::new(then), Box::new(els))
    }

    /// Logical negation that cancels an outer negation instead of stacking
    /// a second one, so `negate(negate(a)) == a` structurally.
    pub fn negate(&self) -> Self {
        match self {
            SmtTerm::Not(inner) => (**inner).clone(),
            SmtTerm::BoolLit(b) => SmtTerm::BoolLit(!b),
            other => other.clone().not(),
        }
    }

    /// Rewrite variable names through `map`; names absent from the map are
    /// kept as they are.
    pub fn rename_vars(&self, map: &HashMap<String, String>) -> Self {
        self.map_vars(&|name| map.get(name).cloned())
    }

    /// Names of all variables occurring in the term, sorted.
    pub fn free_vars(&self) -> BTreeSet<&str> {
        let mut out = BTreeSet::new();
        self.collect_vars(&mut out);
        out
    }

    fn collect_vars<'a>(&'a self, out: &mut BTreeSet<&'a str>) {
        match self {
            SmtTerm::Var(name) => {
                out.insert(name.as_str());
            }
            SmtTerm::IntLit(_) | SmtTerm::BoolLit(_) => {}
            SmtTerm::Add(lhs, rhs)
            | SmtTerm::Sub(lhs, rhs)
            | SmtTerm::Mul(lhs, rhs)
            | SmtTerm::Eq(lhs, rhs)
            | SmtTerm::Lt(lhs, rhs)
            | SmtTerm::Le(lhs, rhs)
            | SmtTerm::Gt(lhs, rhs)
            | SmtTerm::Ge(lhs, rhs)
            | SmtTerm::Implies(lhs, rhs) => {
                lhs.collect_vars(out);
                rhs.collect_vars(out);
            }
            SmtTerm::And(terms) | SmtTerm::Or(terms) => {
                for t in terms {
                    t.collect_vars(out);
                }
            }
            SmtTerm::Not(inner) => inner.collect_vars(out),
            SmtTerm::Ite(cond, then, els) => {
                cond.collect_vars(out);
                then.collect_vars(out);
                els.collect_vars(out);
            }
        }
    }

    fn map_vars(&self, f: &dyn Fn(&str) -> Option<String>) -> Self {
        let bin = |lhs: &SmtTerm, rhs: &SmtTerm| (Box::new(lhs.map_vars(f)), Box::new(rhs.map_vars(f)));
        match self {
            SmtTerm::Var(name) => SmtTerm::Var(f(name).unwrap_or_else(|| name.clone())),
            SmtTerm::IntLit(n) => SmtTerm::IntLit(*n),
            SmtTerm::BoolLit(b) => SmtTerm::BoolLit(*b),
            SmtTerm::Add(lhs, rhs) => {
                let (l, r) = bin(lhs, rhs);
                SmtTerm::Add(l, r)
            }
            SmtTerm::Sub(lhs, rhs) => {
                let (l, r) = bin(lhs, rhs);
                SmtTerm::Sub(l, r)
            }
            SmtTerm::Mul(lhs, rhs) => {
                let (l, r) = bin(lhs, rhs);
                SmtTerm::Mul(l, r)
            }
            SmtTerm::Eq(lhs, rhs) => {
                let (l, r) = bin(lhs, rhs);
                SmtTerm::Eq(l, r)
            }
            SmtTerm::Lt(lhs, rhs) => {
                let (l, r) = bin(lhs, rhs);
                SmtTerm::Lt(l, r)
            }
            SmtTerm::Le(lhs, rhs) => {
                let (l, r) = bin(lhs, rhs);
                SmtTerm::Le(l, r)
            }
            SmtTerm::Gt(lhs, rhs) => {
                let (l, r) = bin(lhs, rhs);
                SmtTerm::Gt(l, r)
            }
            SmtTerm::Ge(lhs, rhs) => {
                let (l, r) = bin(lhs, rhs);
                SmtTerm::Ge(l, r)
            }
            SmtTerm::Implies(lhs, rhs) => {
                let (l, r) = bin(lhs, rhs);
                SmtTerm::Implies(l, r)
            }
            SmtTerm::And(terms) => SmtTerm::And(terms.iter().map(|t| t.map_vars(f)).collect()),
            SmtTerm::Or(terms) => SmtTerm::Or(terms.iter().map(|t| t.map_vars(f)).collect()),
            SmtTerm::Not(inner) => SmtTerm::Not(Box::new(inner.map_vars(f))),
            SmtTerm::Ite(cond, then, els) => SmtTerm::Ite(
                Box::new(cond.map_vars(f)),
                Box::new(then.map_vars(f)),
                Box::new(els.map_vars(f)),
            ),
        }
    }
}

impl fmt::Display for SmtTerm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&to_smtlib(self))
    }
}
