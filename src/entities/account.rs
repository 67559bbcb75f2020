// 🔑 Generated Account Entity - time-boxed identity + secret pairs
//
// "An account is a VALUE: once generated it never changes, it only disappears"
//
// - Created by `AccountRegistry::generate(kind)` with an expiry computed from
//   the plan's duration table (lifetime accounts never expire)
// - Destroyed by explicit deletion or by the expiry sweep
// - Registry order is most-recent-first

use crate::identity::Identity;
use crate::plan::PlanKind;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Mail domain for synthesized identities
pub const GENERATED_DOMAIN: &str = "generated.studio";

// ============================================================================
// GENERATED ACCOUNT
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedAccount {
    pub identity: Identity,

    /// Shared demo secret (identical for every generated account)
    pub secret: String,

    pub plan: PlanKind,

    /// `None` = lifetime-class, never expires
    pub expires_at: Option<DateTime<Utc>>,
}

impl GeneratedAccount {
    /// Still alive at `now`? Expiry is inclusive: `expires_at == now` is expired.
    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map_or(true, |expires_at| expires_at > now)
    }

    pub fn time_remaining(&self, now: DateTime<Utc>) -> TimeRemaining {
        match self.expires_at {
            None => TimeRemaining::Never,
            Some(expires_at) if expires_at <= now => TimeRemaining::Expired,
            Some(expires_at) => TimeRemaining::Left(expires_at - now),
        }
    }
}

// ============================================================================
// TIME REMAINING (display projection)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeRemaining {
    Never,
    Expired,
    Left(Duration),
}

impl fmt::Display for TimeRemaining {
    /// Two most significant units: "3d 4h", "4h 12m", "12m 5s", "5s"
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let left = match self {
            TimeRemaining::Never => return f.write_str("never expires"),
            TimeRemaining::Expired => return f.write_str("expired"),
            TimeRemaining::Left(left) => *left,
        };

        let days = left.num_days();
        let hours = left.num_hours() % 24;
        let minutes = left.num_minutes() % 60;
        let seconds = left.num_seconds() % 60;

        if days > 0 {
            write!(f, "{}d {}h", days, hours)
        } else if hours > 0 {
            write!(f, "{}h {}m", hours, minutes)
        } else if minutes > 0 {
            write!(f, "{}m {}s", minutes, seconds)
        } else {
            write!(f, "{}s", seconds)
        }
    }
}

// ============================================================================
// SWEEP OUTCOME
// ============================================================================

/// Result of one expiry pass: who was evicted, how many remain
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    pub expired: Vec<GeneratedAccount>,
    pub survivors: usize,
}

impl SweepOutcome {
    pub fn expired_identities(&self) -> impl Iterator<Item = &Identity> {
        self.expired.iter().map(|account| &account.identity)
    }

    pub fn evicted(&self, identity: &Identity) -> bool {
        self.expired_identities().any(|expired| expired == identity)
    }
}

// ============================================================================
// ACCOUNT REGISTRY
// ============================================================================

/// Sole owner of all generated accounts (in memory, most-recent-first)
#[derive(Debug, Clone, Default)]
pub struct AccountRegistry {
    accounts: Vec<GeneratedAccount>,
}

impl AccountRegistry {
    /// Create new empty registry
    pub fn new() -> Self {
        AccountRegistry {
            accounts: Vec::new(),
        }
    }

    /// Generate and register a new account of `kind`, created at `now`
    ///
    /// The identity is `<kind>-<n>@generated.studio` where `n` is one more than
    /// the number of live accounts of that kind. Deleting an account and
    /// generating again can therefore reissue an identity that was handed out
    /// before; lookups then resolve to the newest record.
    pub fn generate(&mut self, kind: PlanKind, now: DateTime<Utc>, secret: &str) -> GeneratedAccount {
        let sequence = self.count_by_plan(kind) + 1;
        let account = GeneratedAccount {
            identity: Identity::new(format!("{}-{}@{}", kind.key(), sequence, GENERATED_DOMAIN)),
            secret: secret.to_string(),
            plan: kind,
            expires_at: kind.duration().map(|duration| now + duration),
        };

        self.accounts.insert(0, account.clone());
        account
    }

    /// Remove every record with this identity. Returns whether anything was removed.
    pub fn delete(&mut self, identity: &Identity) -> bool {
        let before = self.accounts.len();
        self.accounts.retain(|account| &account.identity != identity);
        self.accounts.len() != before
    }

    /// Evict every account whose expiry is at or before `now`
    pub fn sweep_expired(&mut self, now: DateTime<Utc>) -> SweepOutcome {
        let (survivors, expired): (Vec<_>, Vec<_>) = std::mem::take(&mut self.accounts)
            .into_iter()
            .partition(|account| account.is_live_at(now));

        self.accounts = survivors;
        SweepOutcome {
            expired,
            survivors: self.accounts.len(),
        }
    }

    /// Find account by identity (newest record wins)
    pub fn find_by_identity(&self, identity: &Identity) -> Option<&GeneratedAccount> {
        self.accounts.iter().find(|account| &account.identity == identity)
    }

    /// Get all accounts, most recent first
    pub fn all_accounts(&self) -> &[GeneratedAccount] {
        &self.accounts
    }

    pub fn count(&self) -> usize {
        self.accounts.len()
    }

    pub fn count_by_plan(&self, kind: PlanKind) -> usize {
        self.accounts.iter().filter(|account| account.plan == kind).count()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Drop everything (fresh demo session)
    pub fn clear(&mut self) {
        self.accounts.clear();
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const SECRET: &str = "password123";

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_generate_lifetime_never_expires() {
        let mut registry = AccountRegistry::new();
        let account = registry.generate(PlanKind::Lifetime, t0(), SECRET);

        assert_eq!(account.expires_at, None);
        assert_eq!(account.secret, SECRET);

        let outcome = registry.sweep_expired(t0() + Duration::days(365 * 100));
        assert!(outcome.expired.is_empty());
        assert_eq!(outcome.survivors, 1);
    }

    #[test]
    fn test_generate_one_day_expiry_boundary() {
        let mut registry = AccountRegistry::new();
        let account = registry.generate(PlanKind::OneDay, t0(), SECRET);
        let expires_at = t0() + Duration::milliseconds(86_400_000);
        assert_eq!(account.expires_at, Some(expires_at));

        let outcome = registry.sweep_expired(expires_at - Duration::milliseconds(1));
        assert!(outcome.expired.is_empty());
        assert_eq!(registry.count(), 1);

        let outcome = registry.sweep_expired(expires_at + Duration::milliseconds(1));
        assert!(outcome.evicted(&account.identity));
        assert_eq!(outcome.survivors, 0);
        assert!(registry.find_by_identity(&account.identity).is_none());
    }

    #[test]
    fn test_generate_sequence_and_order() {
        let mut registry = AccountRegistry::new();
        let first = registry.generate(PlanKind::Weekly, t0(), SECRET);
        let second = registry.generate(PlanKind::Weekly, t0(), SECRET);
        let monthly = registry.generate(PlanKind::Monthly, t0(), SECRET);

        assert_eq!(first.identity.as_str(), "weekly-1@generated.studio");
        assert_eq!(second.identity.as_str(), "weekly-2@generated.studio");
        assert_eq!(monthly.identity.as_str(), "monthly-1@generated.studio");

        // Most recent first
        let order: Vec<&str> = registry.all_accounts().iter().map(|a| a.identity.as_str()).collect();
        assert_eq!(
            order,
            vec![
                "monthly-1@generated.studio",
                "weekly-2@generated.studio",
                "weekly-1@generated.studio",
            ]
        );
    }

    #[test]
    fn test_identity_reissued_after_delete() {
        let mut registry = AccountRegistry::new();
        let first = registry.generate(PlanKind::TwoDays, t0(), SECRET);
        let second = registry.generate(PlanKind::TwoDays, t0(), SECRET);

        assert!(registry.delete(&first.identity));
        let third = registry.generate(PlanKind::TwoDays, t0(), SECRET);

        // count(2-days) was 1 → sequence 2 again
        assert_eq!(third.identity, second.identity);
        assert_eq!(registry.count(), 2);
    }

    #[test]
    fn test_delete_missing_is_noop() {
        let mut registry = AccountRegistry::new();
        registry.generate(PlanKind::Yearly, t0(), SECRET);

        assert!(!registry.delete(&Identity::new("nobody@generated.studio")));
        assert_eq!(registry.count(), 1);
    }

    #[test]
    fn test_sweep_keeps_unexpired_and_lifetime() {
        let mut registry = AccountRegistry::new();
        let day = registry.generate(PlanKind::OneDay, t0(), SECRET);
        registry.generate(PlanKind::ThreeDays, t0(), SECRET);
        registry.generate(PlanKind::Lifetime, t0(), SECRET);

        let outcome = registry.sweep_expired(t0() + Duration::days(2));
        let expired: Vec<&Identity> = outcome.expired_identities().collect();
        assert_eq!(expired, vec![&day.identity]);
        assert_eq!(outcome.survivors, 2);
    }

    #[test]
    fn test_time_remaining_display() {
        let mut registry = AccountRegistry::new();
        let weekly = registry.generate(PlanKind::Weekly, t0(), SECRET);
        let lifetime = registry.generate(PlanKind::Lifetime, t0(), SECRET);

        let at = |d: Duration| weekly.time_remaining(t0() + d).to_string();
        assert_eq!(at(Duration::zero()), "7d 0h");
        assert_eq!(at(Duration::days(6) + Duration::hours(20)), "4h 0m");
        assert_eq!(at(Duration::days(7) - Duration::seconds(125)), "2m 5s");
        assert_eq!(at(Duration::days(7) - Duration::seconds(9)), "9s");
        assert_eq!(at(Duration::days(7)), "expired");
        assert_eq!(lifetime.time_remaining(t0()).to_string(), "never expires");
    }
}
