//! Bound propagation over hard constraints.
//!
//! Repeatedly computes the reachable range `[lo, hi]` of each constraint's
//! left-hand side given the current variable domains, and fixes every
//! free variable whose opposite value would push the range out of the
//! feasible side. Stops at a fixpoint or on a proven conflict.
//!
//! The same ranges give an objective lower bound: every soft term costs at
//! least the penalty of its smallest reachable violation.

use super::model::{Comparison, CpModel, LinearExpr};

/// Outcome of presolve.
#[derive(Debug, Clone)]
pub(crate) struct Presolved {
    /// Value of each variable after propagation (`None` = still free).
    pub values: Vec<Option<bool>>,
    /// Lower bound on the objective.
    pub lower_bound: i64,
    /// Variables fixed by propagation (not counting model fixings).
    pub propagated: usize,
}

/// Range of `expr` under partial assignment `values`.
pub(crate) fn expr_range(expr: &LinearExpr, values: &[Option<bool>]) -> (i64, i64) {
    let mut lo = 0;
    let mut hi = 0;
    for &(var, c) in expr.terms() {
        match values[var.index()] {
            Some(true) => {
                lo += c;
                hi += c;
            }
            Some(false) => {}
            None if c > 0 => hi += c,
            None => lo += c,
        }
    }
    (lo, hi)
}

/// Runs propagation. `Err` names the constraint proven unsatisfiable.
pub(crate) fn presolve(model: &CpModel) -> Result<Presolved, String> {
    if let Some(conflict) = model.contradictions().first() {
        return Err(conflict.clone());
    }

    let mut values: Vec<Option<bool>> = model.fixings().to_vec();
    let mut propagated = 0;
    let mut changed = true;

    while changed {
        changed = false;
        for c in model.constraints() {
            let (lo, hi) = expr_range(&c.expr, &values);
            if c.cmp.min_violation(lo, hi, c.rhs) > 0 {
                return Err(format!(
                    "{}: reachable range [{lo}, {hi}] cannot satisfy {:?} {}",
                    c.name, c.cmp, c.rhs
                ));
            }

            let upper = matches!(c.cmp, Comparison::LessOrEqual | Comparison::Equal);
            let lower = matches!(c.cmp, Comparison::GreaterOrEqual | Comparison::Equal);

            for &(var, coeff) in c.expr.terms() {
                if values[var.index()].is_some() {
                    continue;
                }
                // Raising lhs by |coeff| from `lo` must stay <= rhs.
                if upper && lo + coeff.abs() > c.rhs {
                    values[var.index()] = Some(coeff < 0);
                    propagated += 1;
                    changed = true;
                    continue;
                }
                // Lowering lhs by |coeff| from `hi` must stay >= rhs.
                if lower && hi - coeff.abs() < c.rhs {
                    values[var.index()] = Some(coeff > 0);
                    propagated += 1;
                    changed = true;
                }
            }
        }
    }

    let lower_bound = model
        .soft_terms()
        .iter()
        .map(|t| {
            let (lo, hi) = expr_range(&t.expr, &values);
            t.penalty.cost(t.cmp.min_violation(lo, hi, t.rhs))
        })
        .sum();

    Ok(Presolved {
        values,
        lower_bound,
        propagated,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cp::model::Penalty;

    #[test]
    fn test_propagates_at_most() {
        let mut m = CpModel::new("m");
        let a = m.new_bool_var("a");
        let b = m.new_bool_var("b");
        m.fix(a, true);
        m.add_at_most("a+b<=1", &[a, b], 1);

        let p = presolve(&m).unwrap();
        assert_eq!(p.values[b.index()], Some(false));
        assert_eq!(p.propagated, 1);
    }

    #[test]
    fn test_propagates_chain() {
        let mut m = CpModel::new("m");
        let vars: Vec<_> = (0..4).map(|i| m.new_bool_var(format!("x{i}"))).collect();
        m.fix(vars[0], false);
        // x0 + x1 >= 1 forces x1, then x1 + x2 <= 1 forces !x2
        m.add_at_least("c1", &[vars[0], vars[1]], 1);
        m.add_at_most("c2", &[vars[1], vars[2]], 1);

        let p = presolve(&m).unwrap();
        assert_eq!(p.values[vars[1].index()], Some(true));
        assert_eq!(p.values[vars[2].index()], Some(false));
        assert_eq!(p.values[vars[3].index()], None);
    }

    #[test]
    fn test_detects_infeasible_cardinality() {
        let mut m = CpModel::new("m");
        let vars: Vec<_> = (0..5).map(|i| m.new_bool_var(format!("x{i}"))).collect();
        m.fix(vars[0], false);
        m.fix(vars[1], false);
        m.add_exactly("row", &vars, 4);

        let err = presolve(&m).unwrap_err();
        assert!(err.starts_with("row"));
    }

    #[test]
    fn test_negative_coefficients() {
        let mut m = CpModel::new("m");
        let x = m.new_bool_var("x");
        let y = m.new_bool_var("y");
        // x - y >= 1 forces x = 1, y = 0
        m.add_linear(
            "diff",
            LinearExpr::new().with_term(x, 1).with_term(y, -1),
            Comparison::GreaterOrEqual,
            1,
        );
        let p = presolve(&m).unwrap();
        assert_eq!(p.values[x.index()], Some(true));
        assert_eq!(p.values[y.index()], Some(false));
    }

    #[test]
    fn test_lower_bound_counts_unavoidable_cost() {
        let mut m = CpModel::new("m");
        let x = m.new_bool_var("x");
        let y = m.new_bool_var("y");
        m.fix(x, false);
        m.add_soft(
            "need_two",
            "x+y>=2",
            LinearExpr::sum([x, y]),
            Comparison::GreaterOrEqual,
            2,
            Penalty::PerUnit(10),
        );
        let p = presolve(&m).unwrap();
        assert_eq!(p.lower_bound, 10);
    }
}
