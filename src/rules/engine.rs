//! Rule set composition.

use std::sync::Arc;

use super::{ObjectiveAccumulator, SoftRule};
use crate::cp::CpModel;

/// Number of terms each rule registered.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSummary {
    /// `(rule name, term count)` in application order.
    pub terms: Vec<(&'static str, usize)>,
}

impl RuleSummary {
    /// Total terms registered.
    pub fn total(&self) -> usize {
        self.terms.iter().map(|(_, n)| n).sum()
    }

    /// Terms registered by one rule.
    pub fn count(&self, rule: &str) -> usize {
        self.terms
            .iter()
            .filter(|(name, _)| *name == rule)
            .map(|(_, n)| n)
            .sum()
    }
}

/// An ordered, composable set of soft rules over layout `C`.
///
/// # Example
/// ```
/// use u_roster::rules::{RuleSet, WorkGrid};
/// use u_roster::rules::offday::{IsolatedWorkDay, SoftLeaveRest};
///
/// let rules: RuleSet<WorkGrid<'_>> = RuleSet::new()
///     .with_rule(IsolatedWorkDay { weight: 1 })
///     .with_rule(SoftLeaveRest { weight: 5 });
/// assert_eq!(rules.names(), vec!["isolated_work_day", "soft_leave_rest"]);
/// ```
pub struct RuleSet<C> {
    rules: Vec<Arc<dyn SoftRule<C>>>,
}

impl<C> Default for RuleSet<C> {
    fn default() -> Self {
        Self { rules: Vec::new() }
    }
}

impl<C> Clone for RuleSet<C> {
    fn clone(&self) -> Self {
        Self {
            rules: self.rules.clone(),
        }
    }
}

impl<C> RuleSet<C> {
    /// Creates an empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a rule.
    pub fn with_rule<R: SoftRule<C> + 'static>(mut self, rule: R) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    /// Number of rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether the set is empty.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rule names, in order.
    pub fn names(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Applies every rule to `input`, adding terms to `model`.
    pub fn apply(&self, input: &C, model: &mut CpModel) -> RuleSummary {
        let mut acc = ObjectiveAccumulator::new(model);
        let mut summary = RuleSummary::default();
        for rule in &self.rules {
            acc.begin(rule.name());
            rule.apply(input, &mut acc);
            summary.terms.push((rule.name(), acc.added()));
        }
        summary
    }
}

impl<C> std::fmt::Debug for RuleSet<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RuleSet")
            .field("rules", &self.names())
            .finish()
    }
}
