use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::instruments::InstrumentId;
use crate::values::{Price, Shares};

/// Capabilities attached to an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Role {
    #[default]
    Participant,
    /// May start the offering clock
    Admin,
}

impl Role {
    pub fn can_start_offering(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// Participant account: cash balance and per-instrument holdings
///
/// Positions are signed; a negative value is a synthetic short with no
/// borrow behind it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub username: String,
    pub role: Role,
    pub balance: Decimal,
    #[serde(default)]
    pub positions: BTreeMap<InstrumentId, Shares>,
}

impl Account {
    pub fn new(username: impl Into<String>, role: Role, balance: Decimal) -> Self {
        Self {
            username: username.into(),
            role,
            balance,
            positions: BTreeMap::new(),
        }
    }

    /// Signed holding of an instrument (zero if never traded)
    pub fn position(&self, instrument_id: &InstrumentId) -> Shares {
        self.positions.get(instrument_id).copied().unwrap_or(0)
    }

    /// Whether the balance covers a cash outlay
    pub fn can_afford(&self, cost: Price) -> bool {
        self.balance >= cost
    }

    /// Debit cash and add shares (buying side of a trade)
    ///
    /// The account is left untouched if either figure would overflow.
    pub fn apply_purchase(
        &mut self,
        instrument_id: &InstrumentId,
        shares: Shares,
        cost: Price,
    ) -> Result<(), AccountError> {
        let balance = self.balance.checked_sub(cost).ok_or(AccountError::BalanceOverflow)?;
        let position = self
            .position(instrument_id)
            .checked_add(shares)
            .ok_or(AccountError::PositionOverflow)?;
        self.balance = balance;
        self.positions.insert(instrument_id.clone(), position);
        Ok(())
    }

    /// Credit cash and remove shares (selling side of a trade)
    ///
    /// The account is left untouched if either figure would overflow.
    pub fn apply_sale(
        &mut self,
        instrument_id: &InstrumentId,
        shares: Shares,
        proceeds: Price,
    ) -> Result<(), AccountError> {
        let balance = self.balance.checked_add(proceeds).ok_or(AccountError::BalanceOverflow)?;
        let position = self
            .position(instrument_id)
            .checked_sub(shares)
            .ok_or(AccountError::PositionOverflow)?;
        self.balance = balance;
        self.positions.insert(instrument_id.clone(), position);
        Ok(())
    }

    /// Holdings that are not flat, in instrument order
    pub fn open_positions(&self) -> impl Iterator<Item = (&InstrumentId, Shares)> {
        self.positions
            .iter()
            .filter(|(_, shares)| **shares != 0)
            .map(|(id, shares)| (id, *shares))
    }
}

/// Account update errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccountError {
    BalanceOverflow,
    PositionOverflow,
}

impl std::fmt::Display for AccountError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BalanceOverflow => write!(f, "Balance out of range"),
            Self::PositionOverflow => write!(f, "Position out of range"),
        }
    }
}

impl std::error::Error for AccountError {}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_purchase_and_sale() {
        let stew = InstrumentId::from("Beef Stew");
        let mut account = Account::new("Josh", Role::Participant, dec!(10000));

        account.apply_purchase(&stew, 10, dec!(2000)).unwrap();
        assert_eq!(account.balance, dec!(8000));
        assert_eq!(account.position(&stew), 10);
        assert!(account.can_afford(dec!(8000)));
        assert!(!account.can_afford(dec!(8000.01)));

        account.apply_sale(&stew, 4, dec!(400)).unwrap();
        assert_eq!(account.balance, dec!(8400));
        assert_eq!(account.position(&stew), 6);
    }

    #[test]
    fn test_short_goes_negative() {
        let eggs = InstrumentId::from("Scrambled Eggs");
        let mut account = Account::new("Sam", Role::Participant, dec!(0));

        account.apply_sale(&eggs, 10, dec!(100)).unwrap();
        assert_eq!(account.position(&eggs), -10);
        assert_eq!(account.balance, dec!(100));
    }

    #[test]
    fn test_open_positions_skip_flat() {
        let stew = InstrumentId::from("Beef Stew");
        let eggs = InstrumentId::from("Scrambled Eggs");
        let mut account = Account::new("Max", Role::Participant, dec!(1000));

        account.apply_purchase(&stew, 2, dec!(10)).unwrap();
        account.apply_sale(&stew, 2, dec!(10)).unwrap();
        account.apply_purchase(&eggs, 1, dec!(5)).unwrap();

        let open: Vec<_> = account.open_positions().collect();
        assert_eq!(open, vec![(&eggs, 1)]);
    }

    #[test]
    fn test_overflow_leaves_account_untouched() {
        let stew = InstrumentId::from("Beef Stew");
        let mut account = Account::new("Levi", Role::Participant, dec!(10));

        assert_eq!(
            account.apply_sale(&stew, 1, Decimal::MAX),
            Err(AccountError::BalanceOverflow)
        );
        account.apply_sale(&stew, Shares::MAX, dec!(1)).unwrap();
        assert_eq!(
            account.apply_sale(&stew, 2, dec!(1)),
            Err(AccountError::PositionOverflow)
        );
        assert_eq!(account.balance, dec!(11));
        assert_eq!(account.position(&stew), -Shares::MAX);
    }

    #[test]
    fn test_admin_role() {
        assert!(Role::Admin.can_start_offering());
        assert!(!Role::Participant.can_start_offering());
    }
}
