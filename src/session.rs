// 🧭 Session - the aggregate root and its page-guard invariant
//
// Exactly one live session per process. It is replaced wholesale on login,
// logout and self-deletion; every replacement mints a new SessionToken.

use crate::editing::EditOperation;
use crate::entities::TaskEngine;
use crate::identity::{Identity, SessionToken};
use crate::ledger::CreditLedger;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

// ============================================================================
// PAGES
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Page {
    Login,
    Register,
    Pricing,
    Editor,
    Merge,
    Settings,
    Tasks,
    Generator,
}

impl Page {
    pub const ALL: [Page; 8] = [
        Page::Login,
        Page::Register,
        Page::Pricing,
        Page::Editor,
        Page::Merge,
        Page::Settings,
        Page::Tasks,
        Page::Generator,
    ];

    /// Default surface for a signed-in identity
    pub const DEFAULT_AUTHENTICATED: Page = Page::Editor;

    pub fn title(&self) -> &'static str {
        match self {
            Page::Login => "Sign In",
            Page::Register => "Register",
            Page::Pricing => "Pricing",
            Page::Editor => "Editor",
            Page::Merge => "Merge",
            Page::Settings => "Settings",
            Page::Tasks => "Tasks",
            Page::Generator => "Generator",
        }
    }

    /// Requires a signed-in identity
    pub fn is_gated(&self) -> bool {
        matches!(
            self,
            Page::Editor | Page::Merge | Page::Settings | Page::Tasks | Page::Generator
        )
    }

    /// Only reachable while signed out
    pub fn is_sign_in_surface(&self) -> bool {
        matches!(self, Page::Login | Page::Register)
    }
}

/// Page-guard invariant. Given who is signed in and where they are, return
/// where they are allowed to be.
///
/// - signed out + gated page        → Login
/// - signed in + Login/Register     → Editor
/// - Generator without top identity → Editor
pub fn guard_page(signed_in: bool, is_canonical: bool, page: Page) -> Page {
    if !signed_in {
        return if page.is_gated() { Page::Login } else { page };
    }
    if page.is_sign_in_surface() {
        return Page::DEFAULT_AUTHENTICATED;
    }
    if page == Page::Generator && !is_canonical {
        return Page::DEFAULT_AUTHENTICATED;
    }
    page
}

// ============================================================================
// SESSION AGGREGATE
// ============================================================================

#[derive(Debug, Clone)]
pub struct Session {
    pub token: SessionToken,
    pub identity: Option<Identity>,
    pub current_page: Page,
    pub ledger: CreditLedger,
    pub tasks: TaskEngine,

    /// Operations with a remote call in flight (re-submission is blocked)
    pub pending: HashSet<EditOperation>,
}

impl Session {
    /// Signed-out session sitting on the login surface
    pub fn signed_out(tasks: TaskEngine) -> Self {
        Session {
            token: SessionToken::mint(),
            identity: None,
            current_page: Page::Login,
            ledger: CreditLedger::new(0),
            tasks,
            pending: HashSet::new(),
        }
    }

    /// Fresh session for `identity`: full starting balance, every task available
    pub fn signed_in(identity: Identity, starting_credits: u32, mut tasks: TaskEngine) -> Self {
        tasks.reset();

        Session {
            token: SessionToken::mint(),
            identity: Some(identity),
            current_page: Page::DEFAULT_AUTHENTICATED,
            ledger: CreditLedger::new(starting_credits),
            tasks,
            pending: HashSet::new(),
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.identity.is_some()
    }

    pub fn is_pending(&self, operation: EditOperation) -> bool {
        self.pending.contains(&operation)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signed_out_gated_pages_redirect_to_login() {
        for page in Page::ALL {
            let guarded = guard_page(false, false, page);
            if page.is_gated() {
                assert_eq!(guarded, Page::Login, "{:?}", page);
            } else {
                assert_eq!(guarded, page, "{:?}", page);
            }
        }
    }

    #[test]
    fn test_signed_in_leaves_sign_in_surfaces() {
        assert_eq!(guard_page(true, false, Page::Login), Page::Editor);
        assert_eq!(guard_page(true, false, Page::Register), Page::Editor);
        assert_eq!(guard_page(true, false, Page::Tasks), Page::Tasks);
        assert_eq!(guard_page(true, false, Page::Pricing), Page::Pricing);
    }

    #[test]
    fn test_generator_reserved_for_canonical_identity() {
        assert_eq!(guard_page(true, false, Page::Generator), Page::Editor);
        assert_eq!(guard_page(true, true, Page::Generator), Page::Generator);
    }

    #[test]
    fn test_sessions_get_fresh_tokens() {
        let out = Session::signed_out(TaskEngine::default());
        let signed_in = Session::signed_in(Identity::new("user@example.com"), 10, TaskEngine::default());

        assert_ne!(out.token, signed_in.token);
        assert_eq!(out.current_page, Page::Login);
        assert_eq!(signed_in.ledger.balance(), 10);
        assert!(signed_in.is_signed_in());
        assert!(!out.is_signed_in());
    }
}
