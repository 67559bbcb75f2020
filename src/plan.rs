// 🎟️ Plans - subscription tiers and the plan resolver
//
// A plan is never stored per user. It is derived on demand from:
//   1. allow-list membership (top tier)
//   2. a generated-account record for the identity (that account's label)
//   3. otherwise: basic

use crate::entities::AccountRegistry;
use crate::identity::Identity;
use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// PLAN KIND (generatable subscriptions)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlanKind {
    #[serde(rename = "1-day")]
    OneDay,
    #[serde(rename = "2-days")]
    TwoDays,
    #[serde(rename = "3-days")]
    ThreeDays,
    #[serde(rename = "weekly")]
    Weekly,
    #[serde(rename = "monthly")]
    Monthly,
    #[serde(rename = "yearly")]
    Yearly,
    /// Never expires
    #[serde(rename = "lifetime")]
    Lifetime,
}

impl PlanKind {
    pub const ALL: [PlanKind; 7] = [
        PlanKind::OneDay,
        PlanKind::TwoDays,
        PlanKind::ThreeDays,
        PlanKind::Weekly,
        PlanKind::Monthly,
        PlanKind::Yearly,
        PlanKind::Lifetime,
    ];

    /// Stable machine key (used in generated identities and on the wire)
    pub fn key(&self) -> &'static str {
        match self {
            PlanKind::OneDay => "1-day",
            PlanKind::TwoDays => "2-days",
            PlanKind::ThreeDays => "3-days",
            PlanKind::Weekly => "weekly",
            PlanKind::Monthly => "monthly",
            PlanKind::Yearly => "yearly",
            PlanKind::Lifetime => "lifetime",
        }
    }

    /// Human label shown next to the account
    pub fn label(&self) -> &'static str {
        match self {
            PlanKind::OneDay => "1 Day",
            PlanKind::TwoDays => "2 Days",
            PlanKind::ThreeDays => "3 Days",
            PlanKind::Weekly => "Weekly",
            PlanKind::Monthly => "Monthly",
            PlanKind::Yearly => "Yearly",
            PlanKind::Lifetime => "Lifetime",
        }
    }

    /// Validity window; `None` = non-expiring
    pub fn duration(&self) -> Option<Duration> {
        match self {
            PlanKind::OneDay => Some(Duration::days(1)),
            PlanKind::TwoDays => Some(Duration::days(2)),
            PlanKind::ThreeDays => Some(Duration::days(3)),
            PlanKind::Weekly => Some(Duration::days(7)),
            PlanKind::Monthly => Some(Duration::days(30)),
            PlanKind::Yearly => Some(Duration::days(365)),
            PlanKind::Lifetime => None,
        }
    }

    pub fn from_key(key: &str) -> Option<PlanKind> {
        PlanKind::ALL.into_iter().find(|kind| kind.key() == key)
    }
}

// ============================================================================
// PLAN (resolved entitlement)
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Plan {
    /// Metered: every editing operation costs one credit
    Basic,
    Subscribed(PlanKind),
}

impl Plan {
    /// The distinguished top-tier plan granted by the allow-list
    pub const TOP_TIER: Plan = Plan::Subscribed(PlanKind::Lifetime);

    /// Any paid plan exempts the holder from credit consumption
    pub fn is_unlimited(&self) -> bool {
        !matches!(self, Plan::Basic)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Plan::Basic => "Basic",
            Plan::Subscribed(kind) => kind.label(),
        }
    }
}

impl fmt::Display for Plan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ============================================================================
// ALLOW LIST
// ============================================================================

/// Fixed set of identities entitled to the top tier
#[derive(Debug, Clone, Default)]
pub struct AllowList {
    identities: Vec<Identity>,
}

impl AllowList {
    pub fn new<I, S>(identities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        AllowList {
            identities: identities.into_iter().map(Identity::new).collect(),
        }
    }

    pub fn contains(&self, identity: &Identity) -> bool {
        self.identities.contains(identity)
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }
}

// ============================================================================
// PLAN RESOLVER
// ============================================================================

/// Derive the plan for an identity. Pure and total.
///
/// Allow-list membership wins over a generated-account record.
pub fn resolve_plan(
    identity: Option<&Identity>,
    allow_list: &AllowList,
    accounts: &AccountRegistry,
) -> Plan {
    let Some(identity) = identity else {
        return Plan::Basic;
    };

    if allow_list.contains(identity) {
        return Plan::TOP_TIER;
    }

    accounts
        .find_by_identity(identity)
        .map(|account| Plan::Subscribed(account.plan))
        .unwrap_or(Plan::Basic)
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn allow_list() -> AllowList {
        AllowList::new(["lifetime@user.com", "lifetime1@user.com"])
    }

    #[test]
    fn test_plan_kind_durations() {
        assert_eq!(PlanKind::OneDay.duration(), Some(Duration::days(1)));
        assert_eq!(PlanKind::Weekly.duration(), Some(Duration::days(7)));
        assert_eq!(PlanKind::Yearly.duration(), Some(Duration::days(365)));
        assert_eq!(PlanKind::Lifetime.duration(), None);
    }

    #[test]
    fn test_plan_kind_keys_round_trip() {
        for kind in PlanKind::ALL {
            assert_eq!(PlanKind::from_key(kind.key()), Some(kind));
        }
        assert_eq!(PlanKind::from_key("fortnightly"), None);

        let parsed: PlanKind = serde_json::from_str("\"3-days\"").unwrap();
        assert_eq!(parsed, PlanKind::ThreeDays);
    }

    #[test]
    fn test_resolve_without_identity_is_basic() {
        let registry = AccountRegistry::new();
        assert_eq!(resolve_plan(None, &allow_list(), &registry), Plan::Basic);
    }

    #[test]
    fn test_resolve_allow_listed_identity() {
        let registry = AccountRegistry::new();
        let identity = Identity::new("Lifetime1@User.com");
        assert_eq!(
            resolve_plan(Some(&identity), &allow_list(), &registry),
            Plan::TOP_TIER
        );
    }

    #[test]
    fn test_resolve_generated_account_plan() {
        let mut registry = AccountRegistry::new();
        let account = registry.generate(PlanKind::Monthly, Utc::now(), "password123");

        assert_eq!(
            resolve_plan(Some(&account.identity), &allow_list(), &registry),
            Plan::Subscribed(PlanKind::Monthly)
        );
    }

    #[test]
    fn test_resolve_unknown_identity_is_basic() {
        let registry = AccountRegistry::new();
        let identity = Identity::new("user@example.com");
        let plan = resolve_plan(Some(&identity), &allow_list(), &registry);
        assert_eq!(plan, Plan::Basic);
        assert!(!plan.is_unlimited());
    }
}
