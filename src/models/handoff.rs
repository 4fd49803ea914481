//! Shift handoff rules.
//!
//! A handoff rule forbids one shift type on the day directly following
//! another. This encodes the minimum rest between shifts: after a night
//! shift a worker cannot start a day or evening shift the next morning.

use serde::{Deserialize, Serialize};

use super::ShiftType;

/// Set of forbidden (today, tomorrow) shift pairs.
///
/// # Example
/// ```
/// use u_roster::models::{HandoffRules, ShiftType};
///
/// let rules = HandoffRules::standard();
/// assert!(!rules.allows(ShiftType::Night, ShiftType::Day));
/// assert!(rules.allows(ShiftType::Day, ShiftType::Night));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandoffRules {
    forbidden: Vec<(ShiftType, ShiftType)>,
}

impl HandoffRules {
    /// No forbidden pairs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Night → Day, Night → Evening and Evening → Day are forbidden.
    pub fn standard() -> Self {
        Self::new()
            .with_forbidden(ShiftType::Night, ShiftType::Day)
            .with_forbidden(ShiftType::Night, ShiftType::Evening)
            .with_forbidden(ShiftType::Evening, ShiftType::Day)
    }

    /// Forbids `to` on the day after `from`.
    pub fn with_forbidden(mut self, from: ShiftType, to: ShiftType) -> Self {
        self.forbid(from, to);
        self
    }

    /// Forbids `to` on the day after `from`.
    pub fn forbid(&mut self, from: ShiftType, to: ShiftType) {
        if !self.forbidden.contains(&(from, to)) {
            self.forbidden.push((from, to));
        }
    }

    /// Whether `to` may follow `from` on consecutive days.
    pub fn allows(&self, from: ShiftType, to: ShiftType) -> bool {
        !self.forbidden.contains(&(from, to))
    }

    /// Forbidden pairs.
    pub fn forbidden_pairs(&self) -> &[(ShiftType, ShiftType)] {
        &self.forbidden
    }

    /// Number of forbidden pairs.
    pub fn len(&self) -> usize {
        self.forbidden.len()
    }

    /// Whether no pair is forbidden.
    pub fn is_empty(&self) -> bool {
        self.forbidden.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_rules() {
        let rules = HandoffRules::standard();
        assert_eq!(rules.len(), 3);
        assert!(!rules.allows(ShiftType::Night, ShiftType::Evening));
        assert!(!rules.allows(ShiftType::Evening, ShiftType::Day));
        assert!(rules.allows(ShiftType::Night, ShiftType::Night));
        assert!(rules.allows(ShiftType::Night, ShiftType::Off));
        assert!(rules.allows(ShiftType::Evening, ShiftType::Night));
    }

    #[test]
    fn test_forbid_is_idempotent() {
        let mut rules = HandoffRules::new();
        rules.forbid(ShiftType::Night, ShiftType::Day);
        rules.forbid(ShiftType::Night, ShiftType::Day);
        assert_eq!(rules.len(), 1);
        assert!(HandoffRules::new().is_empty());
    }
}
