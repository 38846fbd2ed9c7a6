#![allow(dead_code)]

use std::collections::BTreeMap;

use strata_pdr::cancel::CancellationToken;
use strata_pdr::transition::SymbolicTransitionSystem;
use strata_smt::solver::{SatResult, SmtSolver};
use strata_smt::sorts::SmtSort;
use strata_smt::terms::SmtTerm;
use thiserror::Error;

pub const DOMAIN_MIN: i64 = -8;
pub const DOMAIN_MAX: i64 = 16;

#[derive(Debug, Error)]
pub enum BoundedSolverError {
    #[error("unknown variable '{0}'")]
    UnknownVariable(String),
    #[error("ill-sorted term: {0}")]
    SortMismatch(String),
    #[error("pop without matching push")]
    EmptyStack,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Value {
    Int(i64),
    Bool(bool),
}

/// Decides queries by enumerating every assignment of the free variables,
/// integers ranging over `DOMAIN_MIN..=DOMAIN_MAX`. Exact for the small
/// counters used in these tests, and it records the scope stack so tests
/// can check that nothing leaks.
pub struct BoundedSolver {
    declared: BTreeMap<String, SmtSort>,
    scopes: Vec<Vec<SmtTerm>>,
    pub check_calls: usize,
    pub answer_unknown: bool,
    cancel_after: Option<(usize, CancellationToken)>,
}

impl Default for BoundedSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl BoundedSolver {
    pub fn new() -> Self {
        Self {
            declared: BTreeMap::new(),
            scopes: vec![Vec::new()],
            check_calls: 0,
            answer_unknown: false,
            cancel_after: None,
        }
    }

    /// Cancel `token` once `checks` queries have been answered.
    pub fn cancel_after_checks(&mut self, checks: usize, token: CancellationToken) {
        self.cancel_after = Some((checks, token));
    }

    pub fn depth(&self) -> usize {
        self.scopes.len() - 1
    }

    pub fn assertion_count(&self) -> usize {
        self.scopes.iter().map(Vec::len).sum()
    }

    fn decide(&self) -> Result<bool, BoundedSolverError> {
        let assertions: Vec<&SmtTerm> = self.scopes.iter().flatten().collect();
        let mut vars: Vec<(&str, SmtSort)> = Vec::new();
        for term in &assertions {
            for var in term.free_vars() {
                if vars.iter().any(|(v, _)| *v == var) {
                    continue;
                }
                let sort = self
                    .declared
                    .get(var)
                    .ok_or_else(|| BoundedSolverError::UnknownVariable(var.to_string()))?;
                vars.push((var, *sort));
            }
        }
        let mut env = BTreeMap::new();
        search(&assertions, &vars, &mut env)
    }
}

fn search<'t>(
    assertions: &[&SmtTerm],
    vars: &[(&'t str, SmtSort)],
    env: &mut BTreeMap<&'t str, Value>,
) -> Result<bool, BoundedSolverError> {
    let Some((&(name, sort), rest)) = vars.split_first() else {
        for term in assertions {
            if !eval_bool(term, env)? {
                return Ok(false);
            }
        }
        return Ok(true);
    };
    let candidates: Vec<Value> = match sort {
        SmtSort::Bool => vec![Value::Bool(false), Value::Bool(true)],
        SmtSort::Int => (DOMAIN_MIN..=DOMAIN_MAX).map(Value::Int).collect(),
    };
    for value in candidates {
        env.insert(name, value);
        if search(assertions, rest, env)? {
            return Ok(true);
        }
    }
    env.remove(name);
    Ok(false)
}

fn eval(term: &SmtTerm, env: &BTreeMap<&str, Value>) -> Result<Value, BoundedSolverError> {
    let int = |t: &SmtTerm| eval_int(t, env);
    Ok(match term {
        SmtTerm::Var(name) => *env
            .get(name.as_str())
            .ok_or_else(|| BoundedSolverError::UnknownVariable(name.clone()))?,
        SmtTerm::IntLit(n) => Value::Int(*n),
        SmtTerm::BoolLit(b) => Value::Bool(*b),
        SmtTerm::Add(a, b) => Value::Int(int(a)?.saturating_add(int(b)?)),
        SmtTerm::Sub(a, b) => Value::Int(int(a)?.saturating_sub(int(b)?)),
        SmtTerm::Mul(a, b) => Value::Int(int(a)?.saturating_mul(int(b)?)),
        SmtTerm::Lt(a, b) => Value::Bool(int(a)? < int(b)?),
        SmtTerm::Le(a, b) => Value::Bool(int(a)? <= int(b)?),
        SmtTerm::Gt(a, b) => Value::Bool(int(a)? > int(b)?),
        SmtTerm::Ge(a, b) => Value::Bool(int(a)? >= int(b)?),
        SmtTerm::Eq(a, b) => Value::Bool(eval(a, env)? == eval(b, env)?),
        SmtTerm::And(terms) => {
            let mut all = true;
            for t in terms {
                all &= eval_bool(t, env)?;
            }
            Value::Bool(all)
        }
        SmtTerm::Or(terms) => {
            let mut any = false;
            for t in terms {
                any |= eval_bool(t, env)?;
            }
            Value::Bool(any)
        }
        SmtTerm::Not(inner) => Value::Bool(!eval_bool(inner, env)?),
        SmtTerm::Implies(a, b) => Value::Bool(!eval_bool(a, env)? || eval_bool(b, env)?),
        SmtTerm::Ite(c, t, e) => {
            if eval_bool(c, env)? {
                eval(t, env)?
            } else {
                eval(e, env)?
            }
        }
    })
}

fn eval_int(term: &SmtTerm, env: &BTreeMap<&str, Value>) -> Result<i64, BoundedSolverError> {
    match eval(term, env)? {
        Value::Int(n) => Ok(n),
        Value::Bool(_) => Err(BoundedSolverError::SortMismatch(term.to_string())),
    }
}

fn eval_bool(term: &SmtTerm, env: &BTreeMap<&str, Value>) -> Result<bool, BoundedSolverError> {
    match eval(term, env)? {
        Value::Bool(b) => Ok(b),
        Value::Int(_) => Err(BoundedSolverError::SortMismatch(term.to_string())),
    }
}

impl SmtSolver for BoundedSolver {
    type Error = BoundedSolverError;

    fn declare_var(&mut self, name: &str, sort: &SmtSort) -> Result<(), Self::Error> {
        self.declared.insert(name.to_string(), *sort);
        Ok(())
    }

    fn assert(&mut self, term: &SmtTerm) -> Result<(), Self::Error> {
        match self.scopes.last_mut() {
            Some(scope) => {
                scope.push(term.clone());
                Ok(())
            }
            None => Err(BoundedSolverError::EmptyStack),
        }
    }

    fn push(&mut self) -> Result<(), Self::Error> {
        self.scopes.push(Vec::new());
        Ok(())
    }

    fn pop(&mut self) -> Result<(), Self::Error> {
        if self.scopes.len() <= 1 {
            return Err(BoundedSolverError::EmptyStack);
        }
        self.scopes.pop();
        Ok(())
    }

    fn check_sat(&mut self) -> Result<SatResult, Self::Error> {
        self.check_calls += 1;
        if let Some((after, token)) = &self.cancel_after {
            if self.check_calls >= *after {
                token.cancel("test cancellation");
            }
        }
        if self.answer_unknown {
            return Ok(SatResult::Unknown("bounded solver: forced unknown".into()));
        }
        if self.decide()? {
            Ok(SatResult::Sat)
        } else {
            Ok(SatResult::Unsat)
        }
    }

    fn reset(&mut self) -> Result<(), Self::Error> {
        self.declared.clear();
        self.scopes = vec![Vec::new()];
        Ok(())
    }
}

pub fn x() -> SmtTerm {
    SmtTerm::var("x")
}

pub fn x_next() -> SmtTerm {
    SmtTerm::var("x_next")
}

pub fn int(n: i64) -> SmtTerm {
    SmtTerm::int(n)
}

/// A single integer counter `x`.
pub fn counter_system(
    init: SmtTerm,
    property: SmtTerm,
    transition: SmtTerm,
) -> SymbolicTransitionSystem {
    SymbolicTransitionSystem::new(vec![("x".into(), SmtSort::Int)], init, property, transition)
        .unwrap()
}

/// `x = 0`, `x < 10`, `x' = x + 1`.
pub fn bounded_counter() -> SymbolicTransitionSystem {
    counter_system(
        x().eq(int(0)),
        x().lt(int(10)),
        x_next().eq(x().add(int(1))),
    )
}

/// `x = 0`, `x < 10`, and a transition that lets `x'` take any value.
pub fn havoc_counter() -> SymbolicTransitionSystem {
    counter_system(x().eq(int(0)), x().lt(int(10)), SmtTerm::bool(true))
}
