// 💰 Credit Ledger - session-scoped consumable balance
//
// Invariant: balance never goes below zero. Consumption clamps, grants are
// uncapped (saturating at the integer limit).

use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreditLedger {
    balance: u32,
}

impl CreditLedger {
    pub fn new(starting_balance: u32) -> Self {
        CreditLedger {
            balance: starting_balance,
        }
    }

    /// Reset the balance (every new session)
    pub fn initialize(&mut self, starting_balance: u32) {
        self.balance = starting_balance;
    }

    pub fn balance(&self) -> u32 {
        self.balance
    }

    pub fn has_credit(&self) -> bool {
        self.balance > 0
    }

    /// Spend one credit unless the holder is exempt. Returns the new balance.
    pub fn consume(&mut self, exempt_unlimited: bool) -> u32 {
        if !exempt_unlimited {
            self.balance = self.balance.saturating_sub(1);
            debug!(balance = self.balance, "credit consumed");
        }
        self.balance
    }

    pub fn grant(&mut self, amount: u32) -> u32 {
        self.balance = self.balance.saturating_add(amount);
        self.balance
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_consume_clamps_at_zero() {
        let mut ledger = CreditLedger::new(2);
        assert_eq!(ledger.consume(false), 1);
        assert_eq!(ledger.consume(false), 0);
        for _ in 0..5 {
            assert_eq!(ledger.consume(false), 0);
        }
        assert!(!ledger.has_credit());
    }

    #[test]
    fn test_exempt_consume_is_noop() {
        let mut ledger = CreditLedger::new(3);
        assert_eq!(ledger.consume(true), 3);
        assert_eq!(ledger.balance(), 3);
    }

    #[test]
    fn test_grant_and_initialize() {
        let mut ledger = CreditLedger::new(0);
        assert_eq!(ledger.grant(10), 10);
        assert_eq!(ledger.grant(5), 15);

        ledger.initialize(10);
        assert_eq!(ledger.balance(), 10);

        ledger.initialize(u32::MAX);
        assert_eq!(ledger.grant(1), u32::MAX);
    }
}
