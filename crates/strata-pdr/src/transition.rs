//! Transition systems over integer and boolean state variables.

use std::collections::{BTreeSet, HashMap};

use strata_smt::sorts::SmtSort;
use strata_smt::terms::SmtTerm;
use thiserror::Error;

/// Suffix appended to a state variable to name its next-state copy.
pub const PRIMED_SUFFIX: &str = "_next";

/// The symbolic system a frame set reasons about.
///
/// `initial_condition` and `safety_property` range over unprimed state
/// variables; `transition_relation` relates unprimed to primed ones.
pub trait TransitionSystem {
    fn initial_condition(&self) -> &SmtTerm;
    fn safety_property(&self) -> &SmtTerm;
    fn transition_relation(&self) -> &SmtTerm;
    /// Rename primed state variables to their unprimed names.
    fn as_unprimed(&self, term: &SmtTerm) -> SmtTerm;
    /// Rename unprimed state variables to their primed names.
    fn as_primed(&self, term: &SmtTerm) -> SmtTerm;
    /// Every variable a solver must declare, unprimed and primed.
    fn declarations(&self) -> &[(String, SmtSort)];
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("state variable '{0}' is declared twice")]
    DuplicateVariable(String),
    #[error("primed name '{primed}' of '{var}' clashes with another state variable")]
    PrimedNameClash { var: String, primed: String },
    #[error("{formula} mentions undeclared variable '{var}'")]
    UndeclaredVariable { formula: &'static str, var: String },
}

#[derive(Debug, Clone)]
pub struct SymbolicTransitionSystem {
    init: SmtTerm,
    property: SmtTerm,
    transition: SmtTerm,
    declarations: Vec<(String, SmtSort)>,
    to_primed: HashMap<String, String>,
    to_unprimed: HashMap<String, String>,
}

pub fn primed_name(var: &str) -> String {
    format!("{var}{PRIMED_SUFFIX}")
}

fn check_vars(
    formula: &'static str,
    term: &SmtTerm,
    allowed: &BTreeSet<&str>,
) -> Result<(), TransitionError> {
    match term.free_vars().into_iter().find(|v| !allowed.contains(v)) {
        Some(var) => Err(TransitionError::UndeclaredVariable {
            formula,
            var: var.to_string(),
        }),
        None => Ok(()),
    }
}

impl SymbolicTransitionSystem {
    pub fn new(
        state_vars: Vec<(String, SmtSort)>,
        init: SmtTerm,
        property: SmtTerm,
        transition: SmtTerm,
    ) -> Result<Self, TransitionError> {
        let mut to_primed = HashMap::with_capacity(state_vars.len());
        let mut to_unprimed = HashMap::with_capacity(state_vars.len());
        for (name, _) in &state_vars {
            if to_primed.insert(name.clone(), primed_name(name)).is_some() {
                return Err(TransitionError::DuplicateVariable(name.clone()));
            }
        }
        for (name, primed) in &to_primed {
            if to_primed.contains_key(primed) {
                return Err(TransitionError::PrimedNameClash {
                    var: name.clone(),
                    primed: primed.clone(),
                });
            }
            to_unprimed.insert(primed.clone(), name.clone());
        }

        let unprimed: BTreeSet<&str> = to_primed.keys().map(String::as_str).collect();
        let mut both = unprimed.clone();
        both.extend(to_unprimed.keys().map(String::as_str));
        check_vars("initial condition", &init, &unprimed)?;
        check_vars("safety property", &property, &unprimed)?;
        check_vars("transition relation", &transition, &both)?;

        let mut declarations = state_vars.clone();
        declarations.extend(
            state_vars
                .iter()
                .map(|(name, sort)| (primed_name(name), *sort)),
        );

        Ok(Self {
            init,
            property,
            transition,
            declarations,
            to_primed,
            to_unprimed,
        })
    }
}

impl TransitionSystem for SymbolicTransitionSystem {
    fn initial_condition(&self) -> &SmtTerm {
        &self.init
    }

    fn safety_property(&self) -> &SmtTerm {
        &self.property
    }

    fn transition_relation(&self) -> &SmtTerm {
        &self.transition
    }

    fn as_unprimed(&self, term: &SmtTerm) -> SmtTerm {
        term.rename_vars(&self.to_unprimed)
    }

    fn as_primed(&self, term: &SmtTerm) -> SmtTerm {
        term.rename_vars(&self.to_primed)
    }

    fn declarations(&self) -> &[(String, SmtSort)] {
        &self.declarations
    }
}
