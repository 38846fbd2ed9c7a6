use std::collections::HashMap;

use thiserror::Error;
use z3::SatResult as Z3SatResult;

use crate::solver::{SatResult, SmtSolver};
use crate::sorts::SmtSort;
use crate::terms::SmtTerm;

#[derive(Debug, Error)]
pub enum Z3Error {
    #[error("Unknown variable: {0}")]
    UnknownVariable(String),
    #[error("Sort mismatch in {0}")]
    SortMismatch(&'static str),
}

pub struct Z3Solver {
    solver: z3::Solver,
    int_vars: HashMap<String, z3::ast::Int>,
    bool_vars: HashMap<String, z3::ast::Bool>,
    params: Option<z3::Params>,
}

enum Z3Term {
    Int(z3::ast::Int),
    Bool(z3::ast::Bool),
}

impl Z3Term {
    fn into_int(self, context: &'static str) -> Result<z3::ast::Int, Z3Error> {
        match self {
            Z3Term::Int(i) => Ok(i),
            Z3Term::Bool(_) => Err(Z3Error::SortMismatch(context)),
        }
    }

    fn into_bool(self, context: &'static str) -> Result<z3::ast::Bool, Z3Error> {
        match self {
            Z3Term::Bool(b) => Ok(b),
            Z3Term::Int(_) => Err(Z3Error::SortMismatch(context)),
        }
    }
}

impl Z3Solver {
    pub fn new() -> Self {
        Self {
            solver: z3::Solver::new(),
            int_vars: HashMap::new(),
            bool_vars: HashMap::new(),
            params: None,
        }
    }

    /// A solver whose individual checks give up after `timeout_secs`
    /// (reported as `SatResult::Unknown`). Zero disables the limit.
    pub fn with_timeout_secs(timeout_secs: u64) -> Self {
        let mut solver = Self::new();
        if timeout_secs == 0 {
            return solver;
        }
        let timeout_ms = u32::try_from(timeout_secs.saturating_mul(1000)).unwrap_or(u32::MAX);
        let mut params = z3::Params::new();
        params.set_u32("timeout", timeout_ms);
        solver.solver.set_params(&params);
        solver.params = Some(params);
        solver
    }

    fn ints(
        &self,
        lhs: &SmtTerm,
        rhs: &SmtTerm,
        context: &'static str,
    ) -> Result<(z3::ast::Int, z3::ast::Int), Z3Error> {
        Ok((
            self.translate(lhs)?.into_int(context)?,
            self.translate(rhs)?.into_int(context)?,
        ))
    }

    fn bools(
        &self,
        terms: &[SmtTerm],
        context: &'static str,
    ) -> Result<Vec<z3::ast::Bool>, Z3Error> {
        terms
            .iter()
            .map(|t| self.translate(t).and_then(|z| z.into_bool(context)))
            .collect()
    }

    fn translate(&self, term: &SmtTerm) -> Result<Z3Term, Z3Error> {
        Ok(match term {
            SmtTerm::Var(name) => {
                if let Some(v) = self.int_vars.get(name) {
                    Z3Term::Int(v.clone())
                } else if let Some(v) = self.bool_vars.get(name) {
                    Z3Term::Bool(v.clone())
                } else {
                    return Err(Z3Error::UnknownVariable(name.clone()));
                }
            }
            SmtTerm::IntLit(n) => Z3Term::Int(z3::ast::Int::from_i64(*n)),
            SmtTerm::BoolLit(b) => Z3Term::Bool(z3::ast::Bool::from_bool(*b)),
            SmtTerm::Add(lhs, rhs) => {
                let (l, r) = self.ints(lhs, rhs, "+")?;
                Z3Term::Int(&l + &r)
            }
            SmtTerm::Sub(lhs, rhs) => {
                let (l, r) = self.ints(lhs, rhs, "-")?;
                Z3Term::Int(&l - &r)
            }
            SmtTerm::Mul(lhs, rhs) => {
                let (l, r) = self.ints(lhs, rhs, "*")?;
                Z3Term::Int(&l * &r)
            }
            SmtTerm::Eq(lhs, rhs) => match (self.translate(lhs)?, self.translate(rhs)?) {
                (Z3Term::Int(l), Z3Term::Int(r)) => Z3Term::Bool(l.eq(&r)),
                (Z3Term::Bool(l), Z3Term::Bool(r)) => Z3Term::Bool(l.eq(&r)),
                _ => return Err(Z3Error::SortMismatch("=")),
            },
            SmtTerm::Lt(lhs, rhs) => {
                let (l, r) = self.ints(lhs, rhs, "<")?;
                Z3Term::Bool(l.lt(&r))
            }
            SmtTerm::Le(lhs, rhs) => {
                let (l, r) = self.ints(lhs, rhs, "<=")?;
                Z3Term::Bool(l.le(&r))
            }
            SmtTerm::Gt(lhs, rhs) => {
                let (l, r) = self.ints(lhs, rhs, ">")?;
                Z3Term::Bool(l.gt(&r))
            }
            SmtTerm::Ge(lhs, rhs) => {
                let (l, r) = self.ints(lhs, rhs, ">=")?;
                Z3Term::Bool(l.ge(&r))
            }
            SmtTerm::And(terms) => {
                let bools = self.bools(terms, "and")?;
                let refs: Vec<&z3::ast::Bool> = bools.iter().collect();
                Z3Term::Bool(z3::ast::Bool::and(&refs))
            }
            SmtTerm::Or(terms) => {
                let bools = self.bools(terms, "or")?;
                let refs: Vec<&z3::ast::Bool> = bools.iter().collect();
                Z3Term::Bool(z3::ast::Bool::or(&refs))
            }
            SmtTerm::Not(inner) => Z3Term::Bool(self.translate(inner)?.into_bool("not")?.not()),
            SmtTerm::Implies(lhs, rhs) => {
                let l = self.translate(lhs)?.into_bool("=>")?;
                let r = self.translate(rhs)?.into_bool("=>")?;
                Z3Term::Bool(l.implies(&r))
            }
            SmtTerm::Ite(cond, then, els) => {
                let c = self.translate(cond)?.into_bool("ite")?;
                match (self.translate(then)?, self.translate(els)?) {
                    (Z3Term::Int(t), Z3Term::Int(e)) => Z3Term::Int(c.ite(&t, &e)),
                    (Z3Term::Bool(t), Z3Term::Bool(e)) => Z3Term::Bool(c.ite(&t, &e)),
                    _ => return Err(Z3Error::SortMismatch("ite")),
                }
            }
        })
    }
}

impl Default for Z3Solver {
    fn default() -> Self {
        Self::new()
    }
}

impl SmtSolver for Z3Solver {
    type Error = Z3Error;

    fn declare_var(&mut self, name: &str, sort: &SmtSort) -> Result<(), Z3Error> {
        match sort {
            SmtSort::Int => {
                self.int_vars
                    .insert(name.to_string(), z3::ast::Int::new_const(name));
            }
            SmtSort::Bool => {
                self.bool_vars
                    .insert(name.to_string(), z3::ast::Bool::new_const(name));
            }
        }
        Ok(())
    }

    fn assert(&mut self, term: &SmtTerm) -> Result<(), Z3Error> {
        let z3_term = self.translate(term)?.into_bool("assert")?;
        self.solver.assert(&z3_term);
        Ok(())
    }

    fn push(&mut self) -> Result<(), Z3Error> {
        self.solver.push();
        Ok(())
    }

    fn pop(&mut self) -> Result<(), Z3Error> {
        self.solver.pop(1);
        Ok(())
    }

    fn check_sat(&mut self) -> Result<SatResult, Z3Error> {
        Ok(match self.solver.check() {
            Z3SatResult::Sat => SatResult::Sat,
            Z3SatResult::Unsat => SatResult::Unsat,
            Z3SatResult::Unknown => SatResult::Unknown(
                self.solver
                    .get_reason_unknown()
                    .unwrap_or_else(|| "Z3 returned unknown".to_string()),
            ),
        })
    }

    fn reset(&mut self) -> Result<(), Z3Error> {
        self.solver.reset();
        // Z3 may drop per-solver parameters on reset; reapply timeout if configured.
        if let Some(params) = &self.params {
            self.solver.set_params(params);
        }
        self.int_vars.clear();
        self.bool_vars.clear();
        Ok(())
    }
}
