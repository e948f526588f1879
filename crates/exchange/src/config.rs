//! Configuration loading for the dining exchange
//!
//! Supports JSON configuration files for:
//! - The participant roster and who holds the admin role
//! - Starting balance and house supply for lazily created records
//! - The offering price schedule
//! - The instrument catalog
//! - Trading policy switches
//!
//! Every field has a default, so `{}` is a valid file describing the
//! sixteen-friend game.

use chrono::Duration;
use dinex_clock::OfferingSchedule;
use dinex_core::{Account, Category, Instrument, InstrumentId, Price, Quantity, Role};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Root configuration for a market
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Everyone allowed to trade
    #[serde(default = "default_participants")]
    pub participants: Vec<String>,

    /// Roster members holding the admin role
    #[serde(default = "default_admins")]
    pub admins: Vec<String>,

    /// Cash credited to an account when it is first created
    #[serde(default = "default_initial_balance")]
    pub initial_balance: Price,

    /// Offering supply of an instrument when it is first created
    #[serde(default = "default_house_supply")]
    pub house_supply: Quantity,

    #[serde(default)]
    pub offering: OfferingConfig,

    #[serde(default)]
    pub policy: TradingPolicy,

    /// Tradable instruments; names match exactly
    #[serde(default = "default_catalog")]
    pub catalog: Vec<CatalogEntry>,

    /// Default length of the trade history query
    #[serde(default = "default_trade_history_limit")]
    pub trade_history_limit: usize,
}

/// Offering price curve
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfferingConfig {
    pub start_price: Price,
    pub decay_rate: Price,
    pub decay_interval_ms: i64,
}

impl Default for OfferingConfig {
    fn default() -> Self {
        Self {
            start_price: Decimal::from(200),
            decay_rate: Decimal::ONE,
            decay_interval_ms: 3_000,
        }
    }
}

impl OfferingConfig {
    pub fn schedule(&self) -> OfferingSchedule {
        OfferingSchedule {
            start_price: self.start_price,
            decay_rate: self.decay_rate,
            decay_interval: Duration::milliseconds(self.decay_interval_ms),
        }
    }
}

/// Switches for market behaviour that differs between games
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingPolicy {
    /// Accept sells flagged as short without any position check
    #[serde(default = "default_true")]
    pub allow_short_selling: bool,
}

impl Default for TradingPolicy {
    fn default() -> Self {
        Self {
            allow_short_selling: true,
        }
    }
}

/// One tradable instrument
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub category: Category,
}

impl CatalogEntry {
    pub fn new(name: impl Into<String>, category: Category) -> Self {
        Self {
            name: name.into(),
            category,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_participants() -> Vec<String> {
    [
        "Josh", "Jack", "Levi", "Shap", "Eitan", "Jonny", "Fisher", "Isaac", "Charlie", "James",
        "Max", "Matan", "Sam", "Noah", "Jamie", "Oliver",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_admins() -> Vec<String> {
    vec!["Josh".to_string()]
}

fn default_initial_balance() -> Price {
    Decimal::from(10_000)
}

fn default_house_supply() -> Quantity {
    500
}

fn default_trade_history_limit() -> usize {
    20
}

fn default_catalog() -> Vec<CatalogEntry> {
    const CHICKEN: &[&str] = &[
        "Teriyaki Chicken",
        "North African Chicken",
        "Chicken Chimichurri",
        "Chicken Tostada",
        "BBQ Chicken Drumsticks",
        "Chicken Fried Rice",
        "Chicken Dakota",
        "Chicken Bahn Mi Sandwich",
        "BBQ Chicken on White Bun",
        "Lebanese Chicken",
        "Herb Baked Chicken Thighs",
        "Roasted Chicken",
        "Italian Chicken",
        "Taco Chicken",
        "Schwarma Pita Folds",
        "Gyro Chicken",
    ];
    const BEEF: &[&str] = &[
        "Beef and Three Mushroom Goulash",
        "Korean Chuck Eye",
        "Slow Roasted Chuck Eye",
        "Beef Stew",
        "Beef Mostaccioli",
        "Sloppy Joes",
        "Beef Bulgogi",
        "Sloppy Joe on Pretzel Bun",
        "Roast Beef Chipotle on Baguette",
        "Beef Hot Dogs",
        "Corned Beef Sandwich",
        "Corned Beef",
        "Hamburger on Pretzel Bun",
        "Lamb Gyro",
        "Lamb Korma",
        "Lamb Meatballs w/ Green Harissa Sauce",
    ];
    const MISC: &[&str] = &[
        "Turkey Chipotle on Baguette",
        "Turkey Dogs",
        "Kosher Deli",
        "Salmon Chimmichuri",
        "Honey Glazed Salmon",
        "Whitefish RAS AL HANOUT",
        "UNIT CHOICE MEAL",
        "Roasted Turkey Breast",
        "Brown Sugar Oatmeal",
        "Scrambled Eggs",
    ];

    let section = |names: &'static [&'static str], category: Category| {
        names.iter().map(move |name| CatalogEntry::new(*name, category))
    };
    section(CHICKEN, Category::Chicken)
        .chain(section(BEEF, Category::Beef))
        .chain(section(MISC, Category::Misc))
        .collect()
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            participants: default_participants(),
            admins: default_admins(),
            initial_balance: default_initial_balance(),
            house_supply: default_house_supply(),
            offering: OfferingConfig::default(),
            policy: TradingPolicy::default(),
            catalog: default_catalog(),
            trade_history_limit: default_trade_history_limit(),
        }
    }
}

impl MarketConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(|e| ConfigError::Io {
            path: path.as_ref().display().to_string(),
            source: e,
        })?;

        Self::from_json(&content)
    }

    /// Parse and validate configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the configuration is internally consistent
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.participants.is_empty() {
            return Err(ConfigError::Invalid("participant roster is empty".into()));
        }
        let mut seen = HashSet::new();
        for name in &self.participants {
            if name.trim().is_empty() {
                return Err(ConfigError::Invalid("participant name is empty".into()));
            }
            if !seen.insert(name.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate participant: {}", name)));
            }
        }
        for admin in &self.admins {
            if !seen.contains(admin.as_str()) {
                return Err(ConfigError::Invalid(format!("admin not in roster: {}", admin)));
            }
        }

        if self.catalog.is_empty() {
            return Err(ConfigError::Invalid("catalog is empty".into()));
        }
        let mut names = HashSet::new();
        for entry in &self.catalog {
            if entry.name.trim().is_empty() {
                return Err(ConfigError::Invalid("catalog entry has no name".into()));
            }
            if !names.insert(entry.name.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate meal: {}", entry.name)));
            }
        }

        if self.initial_balance < Decimal::ZERO {
            return Err(ConfigError::Invalid("initial balance is negative".into()));
        }
        if self.offering.start_price <= Decimal::ZERO {
            return Err(ConfigError::Invalid("offering start price must be positive".into()));
        }
        if self.offering.decay_rate < Decimal::ZERO {
            return Err(ConfigError::Invalid("offering decay rate is negative".into()));
        }
        if self.offering.decay_interval_ms <= 0 {
            return Err(ConfigError::Invalid("offering decay interval must be positive".into()));
        }
        Ok(())
    }

    pub fn is_participant(&self, username: &str) -> bool {
        self.participants.iter().any(|p| p == username)
    }

    /// Role the roster assigns, or None for names outside it
    pub fn role_of(&self, username: &str) -> Option<Role> {
        if !self.is_participant(username) {
            return None;
        }
        if self.admins.iter().any(|a| a == username) {
            Some(Role::Admin)
        } else {
            Some(Role::Participant)
        }
    }

    pub fn catalog_entry(&self, name: &str) -> Option<&CatalogEntry> {
        self.catalog.iter().find(|entry| entry.name == name)
    }

    /// Account as it looks before its first trade
    pub fn new_account(&self, username: &str) -> Account {
        let role = self.role_of(username).unwrap_or_default();
        Account::new(username, role, self.initial_balance)
    }

    /// Instrument as it looks before its first offering sale
    pub fn new_instrument(&self, entry: &CatalogEntry) -> Instrument {
        Instrument::new(InstrumentId::new(&entry.name), entry.category, self.house_supply)
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_defaults_describe_the_sixteen_friend_game() {
        let config = MarketConfig::default();

        assert_eq!(config.participants.len(), 16);
        assert_eq!(config.catalog.len(), 42);
        assert_eq!(config.initial_balance, dec!(10000));
        assert_eq!(config.house_supply, 500);
        assert_eq!(config.trade_history_limit, 20);
        assert!(config.policy.allow_short_selling);
        assert!(config.validate().is_ok());

        let schedule = config.offering.schedule();
        assert_eq!(schedule, OfferingSchedule::default());
    }

    #[test]
    fn test_catalog_categories() {
        let config = MarketConfig::default();
        let count = |c: Category| config.catalog.iter().filter(|e| e.category == c).count();

        assert_eq!(count(Category::Chicken), 16);
        assert_eq!(count(Category::Beef), 16);
        assert_eq!(count(Category::Misc), 10);
        assert_eq!(
            config.catalog_entry("Beef Stew").map(|e| e.category),
            Some(Category::Beef)
        );
        assert!(config.catalog_entry("beef stew").is_none());
    }

    #[test]
    fn test_roles_from_roster() {
        let config = MarketConfig::default();

        assert_eq!(config.role_of("Josh"), Some(Role::Admin));
        assert_eq!(config.role_of("Sam"), Some(Role::Participant));
        assert_eq!(config.role_of("Mallory"), None);
        assert_eq!(config.new_account("Josh").role, Role::Admin);
    }

    #[test]
    fn test_empty_json_is_default_game() {
        let config = MarketConfig::from_json("{}").unwrap();
        assert_eq!(config.participants, MarketConfig::default().participants);
        assert_eq!(config.catalog.len(), 42);
    }

    #[test]
    fn test_partial_json() {
        let json = r#"{
            "participants": ["Ann", "Ben"],
            "admins": ["Ben"],
            "initial_balance": "500",
            "catalog": [{"name": "Soup", "category": "Misc"}],
            "policy": {"allow_short_selling": false}
        }"#;
        let config = MarketConfig::from_json(json).unwrap();

        assert_eq!(config.role_of("Ben"), Some(Role::Admin));
        assert_eq!(config.initial_balance, dec!(500));
        assert_eq!(config.catalog.len(), 1);
        assert!(!config.policy.allow_short_selling);
        assert_eq!(config.house_supply, 500);
    }

    #[test]
    fn test_validation_errors() {
        let mut config = MarketConfig::default();
        config.admins.push("Mallory".into());
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = MarketConfig::default();
        config.catalog.push(CatalogEntry::new("Beef Stew", Category::Beef));
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = MarketConfig::default();
        config.offering.decay_interval_ms = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));

        let mut config = MarketConfig::default();
        config.participants.clear();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_parse_error() {
        assert!(matches!(
            MarketConfig::from_json("{not json"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = MarketConfig::from_file("/nonexistent/dinex.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
