use crate::sorts::SmtSort;
use crate::terms::SmtTerm;

/// Print an SmtTerm as SMT-LIB2 format.
pub fn to_smtlib(term: &SmtTerm) -> String {
    match term {
        SmtTerm::Var(name) => name.clone(),
        SmtTerm::IntLit(n) if *n < 0 => format!("(- {})", n.unsigned_abs()),
        SmtTerm::IntLit(n) => n.to_string(),
        SmtTerm::BoolLit(b) => b.to_string(),
        SmtTerm::Add(lhs, rhs) => binary("+", lhs, rhs),
        SmtTerm::Sub(lhs, rhs) => binary("-", lhs, rhs),
        SmtTerm::Mul(lhs, rhs) => binary("*", lhs, rhs),
        SmtTerm::Eq(lhs, rhs) => binary("=", lhs, rhs),
        SmtTerm::Lt(lhs, rhs) => binary("<", lhs, rhs),
        SmtTerm::Le(lhs, rhs) => binary("<=", lhs, rhs),
        SmtTerm::Gt(lhs, rhs) => binary(">", lhs, rhs),
        SmtTerm::Ge(lhs, rhs) => binary(">=", lhs, rhs),
        SmtTerm::Implies(lhs, rhs) => binary("=>", lhs, rhs),
        SmtTerm::And(terms) => nary("and", "true", terms),
        SmtTerm::Or(terms) => nary("or", "false", terms),
        SmtTerm::Not(inner) => format!("(not {})", to_smtlib(inner)),
        SmtTerm::Ite(cond, then, els) => format!(
            "(ite {} {} {})",
            to_smtlib(cond),
            to_smtlib(then),
            to_smtlib(els)
        ),
    }
}

fn binary(op: &str, lhs: &SmtTerm, rhs: &SmtTerm) -> String {
    format!("({op} {} {})", to_smtlib(lhs), to_smtlib(rhs))
}

fn nary(op: &str, neutral: &str, terms: &[SmtTerm]) -> String {
    match terms {
        [] => neutral.to_string(),
        [single] => to_smtlib(single),
        _ => {
            let inner: Vec<String> = terms.iter().map(to_smtlib).collect();
            format!("({op} {})", inner.join(" "))
        }
    }
}

/// Print a sort as SMT-LIB2 format.
pub fn sort_to_smtlib(sort: &SmtSort) -> &'static str {
    match sort {
        SmtSort::Bool => "Bool",
        SmtSort::Int => "Int",
    }
}

/// Render a declaration followed by one `assert` per term, as a standalone
/// SMT-LIB2 script ending in `(check-sat)`.
pub fn to_smtlib_script(declarations: &[(String, SmtSort)], assertions: &[SmtTerm]) -> String {
    let mut out = String::new();
    for (name, sort) in declarations {
        out.push_str(&format!(
            "(declare-fun {name} () {})\n",
            sort_to_smtlib(sort)
        ));
    }
    for term in assertions {
        out.push_str(&format!("(assert {})\n", to_smtlib(term)));
    }
    out.push_str("(check-sat)\n");
    out
}
