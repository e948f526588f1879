use serde::{Deserialize, Serialize};

use crate::values::Quantity;

/// Unique identifier for an instrument
///
/// This provides a stable reference to an instrument that can be stored
/// in orders and used as map keys. Matching is exact and case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstrumentId(pub String);

impl InstrumentId {
    /// Create a new instrument ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for InstrumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for InstrumentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for InstrumentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Menu section an instrument belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Chicken,
    Beef,
    Misc,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Chicken => write!(f, "Chicken"),
            Category::Beef => write!(f, "Beef"),
            Category::Misc => write!(f, "Misc"),
        }
    }
}

/// A tradable meal with a finite house-issued supply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    pub id: InstrumentId,
    pub category: Category,
    /// Shares the house can still sell through the offering
    pub house_supply: Quantity,
}

impl Instrument {
    pub fn new(id: impl Into<InstrumentId>, category: Category, house_supply: Quantity) -> Self {
        Self {
            id: id.into(),
            category,
            house_supply,
        }
    }

    pub fn symbol(&self) -> &str {
        self.id.as_str()
    }

    /// Take `quantity` shares out of the house supply.
    ///
    /// Returns false and leaves the supply untouched if not enough remain.
    pub fn issue(&mut self, quantity: Quantity) -> bool {
        match self.house_supply.checked_sub(quantity) {
            Some(left) => {
                self.house_supply = left;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_decrements_supply() {
        let mut meal = Instrument::new("Teriyaki Chicken", Category::Chicken, 500);

        assert!(meal.issue(10));
        assert_eq!(meal.house_supply, 490);

        assert!(meal.issue(490));
        assert_eq!(meal.house_supply, 0);
    }

    #[test]
    fn test_issue_rejects_oversell() {
        let mut meal = Instrument::new("Lamb Korma", Category::Beef, 5);

        assert!(!meal.issue(6));
        assert_eq!(meal.house_supply, 5);
    }
}
