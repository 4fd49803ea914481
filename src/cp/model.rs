//! Boolean constraint model.
//!
//! A `CpModel` holds boolean decision variables, hard linear constraints
//! over them, and soft terms. A soft term compares a linear expression to a
//! bound; the amount by which it misses the bound is an implicit
//! non-negative penalty variable, and its cost under a [`Penalty`] schedule
//! enters the single objective to minimize.
//!
//! The model says nothing about how it is solved. Any [`CpSolver`](super::CpSolver)
//! can consume it.

use serde::{Deserialize, Serialize};

/// Handle to a boolean decision variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BoolVar(pub(crate) usize);

impl BoolVar {
    /// Position of this variable in the model (and in solution vectors).
    #[inline]
    pub fn index(self) -> usize {
        self.0
    }
}

/// Linear expression `Σ coeff · var` over boolean variables.
///
/// Repeated variables are merged into a single term.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    terms: Vec<(BoolVar, i64)>,
}

impl LinearExpr {
    /// Creates an empty expression (constant zero).
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of variables, each with coefficient 1.
    pub fn sum(vars: impl IntoIterator<Item = BoolVar>) -> Self {
        let mut expr = Self::new();
        for var in vars {
            expr.add_term(var, 1);
        }
        expr
    }

    /// Adds a term (builder style).
    pub fn with_term(mut self, var: BoolVar, coeff: i64) -> Self {
        self.add_term(var, coeff);
        self
    }

    /// Adds `coeff · var`, merging with an existing term for `var`.
    pub fn add_term(&mut self, var: BoolVar, coeff: i64) {
        if coeff == 0 {
            return;
        }
        if let Some(pos) = self.terms.iter().position(|(v, _)| *v == var) {
            self.terms[pos].1 += coeff;
            if self.terms[pos].1 == 0 {
                self.terms.swap_remove(pos);
            }
        } else {
            self.terms.push((var, coeff));
        }
    }

    /// The (variable, coefficient) terms.
    pub fn terms(&self) -> &[(BoolVar, i64)] {
        &self.terms
    }

    /// Whether the expression has no terms.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// Evaluates the expression against a full assignment.
    pub fn evaluate(&self, values: &[bool]) -> i64 {
        self.terms
            .iter()
            .filter(|(v, _)| values[v.0])
            .map(|(_, c)| c)
            .sum()
    }
}

/// Relation between an expression and its bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparison {
    /// `expr <= rhs`
    LessOrEqual,
    /// `expr >= rhs`
    GreaterOrEqual,
    /// `expr == rhs`
    Equal,
}

impl Comparison {
    /// How far `lhs` is from satisfying the relation (0 when satisfied).
    #[inline]
    pub fn violation(self, lhs: i64, rhs: i64) -> i64 {
        match self {
            Comparison::LessOrEqual => (lhs - rhs).max(0),
            Comparison::GreaterOrEqual => (rhs - lhs).max(0),
            Comparison::Equal => (lhs - rhs).abs(),
        }
    }

    /// Smallest violation reachable when `lhs` can take any value in `[lo, hi]`.
    pub fn min_violation(self, lo: i64, hi: i64, rhs: i64) -> i64 {
        match self {
            Comparison::LessOrEqual => (lo - rhs).max(0),
            Comparison::GreaterOrEqual => (rhs - hi).max(0),
            Comparison::Equal => {
                if rhs < lo {
                    lo - rhs
                } else if rhs > hi {
                    rhs - hi
                } else {
                    0
                }
            }
        }
    }
}

/// A hard linear constraint.
#[derive(Debug, Clone)]
pub struct LinearConstraint {
    /// Diagnostic name (e.g. `"headcount[2024-03-06]"`).
    pub name: String,
    /// Left-hand side.
    pub expr: LinearExpr,
    /// Relation.
    pub cmp: Comparison,
    /// Right-hand side.
    pub rhs: i64,
}

/// Cost schedule applied to a soft term's violation amount.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Penalty {
    /// `weight` per unit of violation.
    PerUnit(i64),
    /// `weight` once, whenever the term is violated at all.
    Flat(i64),
    /// `steps[v - 1]` for a violation `v <= steps.len()`, then
    /// `overflow_per_unit` for every unit beyond the last step.
    Tiered {
        /// Cost of a violation of exactly 1, 2, … units.
        steps: Vec<i64>,
        /// Added cost per unit past the last step.
        overflow_per_unit: i64,
    },
}

impl Penalty {
    /// Cost of a violation amount. Non-decreasing in `violation`.
    pub fn cost(&self, violation: i64) -> i64 {
        if violation <= 0 {
            return 0;
        }
        match self {
            Penalty::PerUnit(w) => w * violation,
            Penalty::Flat(w) => *w,
            Penalty::Tiered {
                steps,
                overflow_per_unit,
            } => {
                let v = violation as usize;
                if v <= steps.len() {
                    steps[v - 1]
                } else {
                    let last = steps.last().copied().unwrap_or(0);
                    last + (v - steps.len()) as i64 * overflow_per_unit
                }
            }
        }
    }
}

/// A soft term: penalized, never forbidden.
#[derive(Debug, Clone)]
pub struct SoftTerm {
    /// Name of the rule that registered this term.
    pub rule: &'static str,
    /// Diagnostic name of the individual term.
    pub name: String,
    /// Expression compared to `rhs`.
    pub expr: LinearExpr,
    /// Relation that is preferred to hold.
    pub cmp: Comparison,
    /// Bound.
    pub rhs: i64,
    /// Cost schedule of the violation amount.
    pub penalty: Penalty,
}

impl SoftTerm {
    /// Cost of this term under a full assignment.
    pub fn cost(&self, values: &[bool]) -> i64 {
        let lhs = self.expr.evaluate(values);
        self.penalty.cost(self.cmp.violation(lhs, self.rhs))
    }
}

/// Result of checking an assignment against a model.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelEvaluation {
    /// Names of violated hard constraints (including contradicted fixings).
    pub violated: Vec<String>,
    /// Objective value (sum of soft term costs).
    pub objective: i64,
}

impl ModelEvaluation {
    /// Whether every hard constraint holds.
    pub fn is_feasible(&self) -> bool {
        self.violated.is_empty()
    }
}

/// A boolean constraint model with a minimized soft objective.
#[derive(Debug, Clone)]
pub struct CpModel {
    name: String,
    var_names: Vec<String>,
    fixed: Vec<Option<bool>>,
    contradictions: Vec<String>,
    constraints: Vec<LinearConstraint>,
    soft_terms: Vec<SoftTerm>,
}

impl CpModel {
    /// Creates an empty model.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            var_names: Vec::new(),
            fixed: Vec::new(),
            contradictions: Vec::new(),
            constraints: Vec::new(),
            soft_terms: Vec::new(),
        }
    }

    /// Model name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Creates a new boolean variable.
    pub fn new_bool_var(&mut self, name: impl Into<String>) -> BoolVar {
        self.var_names.push(name.into());
        self.fixed.push(None);
        BoolVar(self.var_names.len() - 1)
    }

    /// Forces a variable to a value.
    ///
    /// Fixing an already-fixed variable to the opposite value makes the
    /// model infeasible.
    pub fn fix(&mut self, var: BoolVar, value: bool) {
        match self.fixed[var.0] {
            Some(existing) if existing != value => {
                self.contradictions
                    .push(format!("fix({}) contradicts earlier fixing", self.var_names[var.0]));
            }
            _ => self.fixed[var.0] = Some(value),
        }
    }

    /// Adds a hard constraint `expr cmp rhs`.
    pub fn add_linear(
        &mut self,
        name: impl Into<String>,
        expr: LinearExpr,
        cmp: Comparison,
        rhs: i64,
    ) {
        self.constraints.push(LinearConstraint {
            name: name.into(),
            expr,
            cmp,
            rhs,
        });
    }

    /// Exactly `k` of `vars` are true.
    pub fn add_exactly(&mut self, name: impl Into<String>, vars: &[BoolVar], k: i64) {
        self.add_linear(name, LinearExpr::sum(vars.iter().copied()), Comparison::Equal, k);
    }

    /// At most `k` of `vars` are true.
    pub fn add_at_most(&mut self, name: impl Into<String>, vars: &[BoolVar], k: i64) {
        self.add_linear(
            name,
            LinearExpr::sum(vars.iter().copied()),
            Comparison::LessOrEqual,
            k,
        );
    }

    /// At least `k` of `vars` are true.
    pub fn add_at_least(&mut self, name: impl Into<String>, vars: &[BoolVar], k: i64) {
        self.add_linear(
            name,
            LinearExpr::sum(vars.iter().copied()),
            Comparison::GreaterOrEqual,
            k,
        );
    }

    /// Adds a soft term owned by `rule`.
    pub fn add_soft(
        &mut self,
        rule: &'static str,
        name: impl Into<String>,
        expr: LinearExpr,
        cmp: Comparison,
        rhs: i64,
        penalty: Penalty,
    ) {
        self.soft_terms.push(SoftTerm {
            rule,
            name: name.into(),
            expr,
            cmp,
            rhs,
            penalty,
        });
    }

    /// Number of variables.
    pub fn var_count(&self) -> usize {
        self.var_names.len()
    }

    /// Number of hard constraints.
    pub fn constraint_count(&self) -> usize {
        self.constraints.len()
    }

    /// Number of soft terms.
    pub fn soft_term_count(&self) -> usize {
        self.soft_terms.len()
    }

    /// Name of a variable.
    pub fn var_name(&self, var: BoolVar) -> &str {
        &self.var_names[var.0]
    }

    /// Value a variable was fixed to, if any.
    pub fn fixed_value(&self, var: BoolVar) -> Option<bool> {
        self.fixed[var.0]
    }

    pub(crate) fn fixings(&self) -> &[Option<bool>] {
        &self.fixed
    }

    pub(crate) fn contradictions(&self) -> &[String] {
        &self.contradictions
    }

    /// Hard constraints.
    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    /// Soft terms.
    pub fn soft_terms(&self) -> &[SoftTerm] {
        &self.soft_terms
    }

    /// Checks a full assignment: violated hard constraints and objective.
    pub fn evaluate(&self, values: &[bool]) -> ModelEvaluation {
        let mut violated: Vec<String> = self.contradictions.clone();

        for (i, fixed) in self.fixed.iter().enumerate() {
            if let Some(v) = fixed {
                if values[i] != *v {
                    violated.push(format!("fixed {}", self.var_names[i]));
                }
            }
        }

        for c in &self.constraints {
            let lhs = c.expr.evaluate(values);
            if c.cmp.violation(lhs, c.rhs) > 0 {
                violated.push(c.name.clone());
            }
        }

        let objective = self.soft_terms.iter().map(|t| t.cost(values)).sum();

        ModelEvaluation {
            violated,
            objective,
        }
    }

    /// Objective cost per rule for a full assignment (rules with zero cost omitted).
    pub fn objective_breakdown(&self, values: &[bool]) -> Vec<(&'static str, i64)> {
        let mut breakdown: Vec<(&'static str, i64)> = Vec::new();
        for term in &self.soft_terms {
            let cost = term.cost(values);
            if cost == 0 {
                continue;
            }
            match breakdown.iter_mut().find(|(rule, _)| *rule == term.rule) {
                Some(entry) => entry.1 += cost,
                None => breakdown.push((term.rule, cost)),
            }
        }
        breakdown
    }
}
