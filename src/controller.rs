// 🎛️ Session Controller - sole writer of session state
//
// Every user intent and the periodic expiry sweep enter here. Each handler
// runs to completion against `&mut self`, then `reconcile()` re-applies the
// page guard, so the invariant holds after every mutation.
//
// Composition:
//   SessionController
//     ├── AllowList + AccountRegistry → resolve_plan
//     ├── Session (identity, page, CreditLedger, TaskEngine, pending edits)
//     ├── Authenticator (black box)
//     └── Clock

use crate::auth::{Authenticator, DemoAuthenticator, PasswordChange, RegistrationForm};
use crate::clock::Clock;
use crate::config::Config;
use crate::editing::{EditJob, EditOperation, EditOutcome, EditRequest, EditTicket, ImageData};
use crate::entities::{AccountRegistry, GeneratedAccount, PerformOutcome, Task, TaskEngine};
use crate::error::{CredentialError, GenerationError, ValidationError};
use crate::identity::{Identity, SessionToken};
use crate::plan::{resolve_plan, AllowList, Plan, PlanKind};
use crate::session::{guard_page, Page, Session};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

// ============================================================================
// READ-ONLY PROJECTIONS
// ============================================================================

/// Everything a front end needs to render one frame
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub identity: Option<Identity>,
    pub page: Page,
    pub plan: Plan,
    pub plan_label: &'static str,
    pub unlimited: bool,
    pub credits: u32,
    pub can_generate_accounts: bool,
    pub tasks: Vec<Task>,
    pub rating_prompt: Option<String>,
    pub pending: Vec<EditOperation>,

    /// Only populated for the canonical top-tier identity
    pub accounts: Vec<AccountView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AccountView {
    pub identity: Identity,
    pub secret: String,
    pub plan: PlanKind,
    pub plan_label: &'static str,
    pub expires_at: Option<DateTime<Utc>>,
    pub time_remaining: String,
}

impl AccountView {
    fn new(account: &GeneratedAccount, now: DateTime<Utc>) -> Self {
        AccountView {
            identity: account.identity.clone(),
            secret: account.secret.clone(),
            plan: account.plan,
            plan_label: account.plan.label(),
            expires_at: account.expires_at,
            time_remaining: account.time_remaining(now).to_string(),
        }
    }
}

/// What one sweep tick did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub evicted: Vec<Identity>,
    pub forced_logout: bool,
}

// ============================================================================
// SESSION CONTROLLER
// ============================================================================

pub struct SessionController {
    starting_credits: u32,
    canonical: Identity,
    generated_secret: String,

    allow_list: AllowList,
    authenticator: Box<dyn Authenticator>,
    clock: Arc<dyn Clock>,

    accounts: AccountRegistry,
    session: Session,
}

impl SessionController {
    pub fn new(config: &Config, clock: Arc<dyn Clock>) -> Self {
        let allow_list = AllowList::new(&config.allow_list);
        let authenticator = DemoAuthenticator::new(
            allow_list.clone(),
            Identity::new(&config.demo_identity),
            config.demo_secret.clone(),
        );

        SessionController {
            starting_credits: config.starting_credits,
            canonical: Identity::new(&config.canonical_identity),
            generated_secret: config.generated_secret.clone(),
            allow_list,
            authenticator: Box::new(authenticator),
            clock,
            accounts: AccountRegistry::new(),
            session: Session::signed_out(TaskEngine::default()),
        }
    }

    /// Swap the credential check (tests, alternative back ends)
    pub fn with_authenticator(mut self, authenticator: Box<dyn Authenticator>) -> Self {
        self.authenticator = authenticator;
        self
    }

    // ------------------------------------------------------------------------
    // Projections
    // ------------------------------------------------------------------------

    pub fn identity(&self) -> Option<&Identity> {
        self.session.identity.as_ref()
    }

    pub fn current_page(&self) -> Page {
        self.session.current_page
    }

    pub fn session_token(&self) -> SessionToken {
        self.session.token
    }

    pub fn plan(&self) -> Plan {
        resolve_plan(self.identity(), &self.allow_list, &self.accounts)
    }

    pub fn is_unlimited(&self) -> bool {
        self.plan().is_unlimited()
    }

    /// Signed in as the one identity allowed to use the generator
    pub fn is_canonical(&self) -> bool {
        self.identity() == Some(&self.canonical)
    }

    pub fn balance(&self) -> u32 {
        self.session.ledger.balance()
    }

    pub fn tasks(&self) -> &[Task] {
        self.session.tasks.tasks()
    }

    pub fn rating_prompt(&self) -> Option<&str> {
        self.session.tasks.rating_prompt()
    }

    pub fn accounts(&self) -> &AccountRegistry {
        &self.accounts
    }

    pub fn is_pending(&self, operation: EditOperation) -> bool {
        self.session.is_pending(operation)
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn view(&self) -> SessionView {
        let plan = self.plan();
        let now = self.now();
        let accounts = if self.is_canonical() {
            self.accounts
                .all_accounts()
                .iter()
                .map(|account| AccountView::new(account, now))
                .collect()
        } else {
            Vec::new()
        };

        let mut pending: Vec<EditOperation> = self.session.pending.iter().copied().collect();
        pending.sort_by_key(|operation| operation.as_str());

        SessionView {
            identity: self.session.identity.clone(),
            page: self.session.current_page,
            plan,
            plan_label: plan.label(),
            unlimited: plan.is_unlimited(),
            credits: self.balance(),
            can_generate_accounts: self.is_canonical(),
            tasks: self.tasks().to_vec(),
            rating_prompt: self.rating_prompt().map(str::to_string),
            pending,
            accounts,
        }
    }

    // ------------------------------------------------------------------------
    // Identity intents
    // ------------------------------------------------------------------------

    /// Check credentials, then start a session.
    ///
    /// Generated accounts sign in with their own secret while they are live.
    pub fn sign_in(&mut self, identity: &str, secret: &str) -> Result<(), CredentialError> {
        let identity = Identity::new(identity);
        let now = self.now();

        let generated = self
            .accounts
            .find_by_identity(&identity)
            .is_some_and(|account| account.is_live_at(now) && account.secret == secret);

        if !generated && !self.authenticator.authenticate(&identity, secret) {
            info!(identity = %identity, "sign-in rejected");
            return Err(CredentialError::InvalidCredentials);
        }

        self.login(identity);
        Ok(())
    }

    /// Validate a registration form and sign the new identity in
    ///
    /// Top-tier and generated identities already exist and cannot be claimed.
    pub fn register(&mut self, form: &RegistrationForm) -> Result<(), CredentialError> {
        let identity = form.validate()?;
        if identity == self.canonical
            || self.allow_list.contains(&identity)
            || self.accounts.find_by_identity(&identity).is_some()
        {
            warn!(identity = %identity, "registration for existing identity refused");
            return Err(CredentialError::IdentityTaken);
        }
        info!(identity = %identity, "registered");
        self.login(identity);
        Ok(())
    }

    /// Validate a password change for the signed-in identity (not stored)
    pub fn change_password(&self, change: &PasswordChange) -> Result<&'static str, CredentialError> {
        if self.identity().is_none() {
            return Err(CredentialError::InvalidCredentials);
        }
        change.validate()?;
        info!(identity = ?self.identity(), "password change accepted");
        Ok("Password changed successfully!")
    }

    /// Start a fresh session for an already-validated identity.
    ///
    /// The generated-account registry survives only when signing in as the
    /// canonical identity or as one of the generated accounts themselves.
    pub fn login(&mut self, identity: Identity) {
        let keeps_registry =
            identity == self.canonical || self.accounts.find_by_identity(&identity).is_some();
        if !keeps_registry && !self.accounts.is_empty() {
            debug!(cleared = self.accounts.count(), "fresh demo session, clearing generated accounts");
            self.accounts.clear();
        }

        let tasks = self.session.tasks.clone();
        self.session = Session::signed_in(identity, self.starting_credits, tasks);
        info!(identity = ?self.identity(), plan = %self.plan(), token = %self.session.token, "signed in");
        self.reconcile();
    }

    pub fn logout(&mut self) {
        let previous = self.session.identity.take();
        self.end_session();
        info!(identity = ?previous, "signed out");
    }

    /// Account self-deletion: ends the session but leaves any generated
    /// account record in the registry
    pub fn delete_session(&mut self) {
        let previous = self.session.identity.take();
        self.end_session();
        info!(identity = ?previous, "session deleted");
    }

    fn end_session(&mut self) {
        let mut tasks = self.session.tasks.clone();
        tasks.reset();
        self.session = Session::signed_out(tasks);
        self.reconcile();
    }

    /// Request a page; the guard decides where we actually land
    pub fn navigate(&mut self, page: Page) -> Page {
        self.session.current_page = page;
        self.reconcile();
        if self.session.current_page != page {
            debug!(requested = ?page, landed = ?self.session.current_page, "navigation redirected");
        }
        self.session.current_page
    }

    // ------------------------------------------------------------------------
    // Generated accounts (canonical identity only)
    // ------------------------------------------------------------------------

    /// Generate an account. Anyone but the canonical identity is redirected
    /// to the editor instead.
    pub fn generate_account(&mut self, kind: PlanKind) -> Option<GeneratedAccount> {
        if !self.is_canonical() {
            self.deny_generator();
            return None;
        }

        let account = self.accounts.generate(kind, self.now(), &self.generated_secret);
        info!(identity = %account.identity, plan = kind.key(), expires_at = ?account.expires_at, "account generated");
        self.reconcile();
        Some(account)
    }

    /// Explicit registry deletion (distinct from ending a session)
    pub fn delete_account(&mut self, identity: &Identity) -> bool {
        if !self.is_canonical() {
            self.deny_generator();
            return false;
        }

        let removed = self.accounts.delete(identity);
        if removed {
            info!(identity = %identity, "account deleted");
        }
        self.reconcile();
        removed
    }

    fn deny_generator(&mut self) {
        if self.session.is_signed_in() {
            self.session.current_page = Page::DEFAULT_AUTHENTICATED;
        }
        self.reconcile();
    }

    // ------------------------------------------------------------------------
    // Tasks
    // ------------------------------------------------------------------------

    pub fn perform_task(&mut self, task_id: &str) -> PerformOutcome {
        if !self.session.is_signed_in() {
            return PerformOutcome::Ignored;
        }
        self.session.tasks.perform(task_id)
    }

    pub fn submit_rating(&mut self, rating: u8) -> Result<PerformOutcome, ValidationError> {
        if !self.session.is_signed_in() {
            return Err(ValidationError::NotSignedIn);
        }
        self.session.tasks.submit_rating(rating)
    }

    pub fn cancel_rating(&mut self) {
        self.session.tasks.cancel_rating();
    }

    pub fn claim_task(&mut self, task_id: &str) -> Option<u32> {
        if !self.session.is_signed_in() {
            return None;
        }
        let Session { tasks, ledger, .. } = &mut self.session;
        tasks.claim(task_id, ledger)
    }

    // ------------------------------------------------------------------------
    // Expiry sweep
    // ------------------------------------------------------------------------

    /// One sweep tick: evict expired accounts and, if the active identity was
    /// among them, force a logout in the same tick
    pub fn tick(&mut self) -> SweepReport {
        let now = self.now();
        let outcome = self.accounts.sweep_expired(now);
        if outcome.expired.is_empty() {
            return SweepReport::default();
        }

        let evicted: Vec<Identity> = outcome.expired_identities().cloned().collect();
        debug!(evicted = evicted.len(), survivors = outcome.survivors, "expired accounts swept");

        let forced_logout = self
            .identity()
            .is_some_and(|identity| outcome.evicted(identity));
        if forced_logout {
            warn!(identity = ?self.identity(), "active account expired, forcing logout");
            self.logout();
        }

        SweepReport { evicted, forced_logout }
    }

    // ------------------------------------------------------------------------
    // Editing operations
    // ------------------------------------------------------------------------

    /// Admit an edit/merge request. On success the operation is marked
    /// pending and the returned job must be run and handed back to
    /// `complete_edit` with its ticket.
    pub fn begin_edit(&mut self, request: EditRequest) -> Result<(EditTicket, EditJob), ValidationError> {
        let operation = request.operation();
        if !self.session.is_signed_in() {
            return Err(ValidationError::NotSignedIn);
        }

        let job = request.into_job()?;

        if self.session.is_pending(operation) {
            return Err(ValidationError::AlreadyPending(operation));
        }
        if !self.is_unlimited() && !self.session.ledger.has_credit() {
            return Err(ValidationError::InsufficientCredits);
        }

        self.session.pending.insert(operation);
        let ticket = EditTicket {
            operation,
            token: self.session.token,
        };
        debug!(operation = %operation, token = %ticket.token, "edit admitted");
        Ok((ticket, job))
    }

    /// Apply the collaborator's answer for a ticket.
    ///
    /// A ticket from a session that is no longer live is discarded without
    /// touching any state.
    pub fn complete_edit(
        &mut self,
        ticket: EditTicket,
        result: Result<ImageData, GenerationError>,
    ) -> EditOutcome {
        if ticket.token != self.session.token {
            debug!(operation = %ticket.operation, token = %ticket.token, "stale completion discarded");
            return EditOutcome::Discarded;
        }

        self.session.pending.remove(&ticket.operation);
        match result {
            Ok(image) => {
                let unlimited = self.is_unlimited();
                let balance = self.session.ledger.consume(unlimited);
                info!(operation = %ticket.operation, image = %image.fingerprint(), balance, "edit delivered");
                EditOutcome::Delivered(image)
            }
            Err(err) => {
                warn!(operation = %ticket.operation, error = %err, "edit failed");
                let verb = match ticket.operation {
                    EditOperation::Edit => "Edit",
                    EditOperation::Merge => "Merge",
                };
                EditOutcome::Failed {
                    message: format!("{} failed: {}", verb, err),
                }
            }
        }
    }

    /// Release an admitted ticket whose request will never complete.
    ///
    /// Token-checked like `complete_edit`; consumes nothing.
    pub fn abandon_edit(&mut self, ticket: EditTicket) -> bool {
        if ticket.token != self.session.token {
            return false;
        }
        let released = self.session.pending.remove(&ticket.operation);
        if released {
            debug!(operation = %ticket.operation, token = %ticket.token, "edit abandoned");
        }
        released
    }

    // ------------------------------------------------------------------------
    // Invariants
    // ------------------------------------------------------------------------

    fn reconcile(&mut self) {
        self.session.current_page = guard_page(
            self.session.is_signed_in(),
            self.is_canonical(),
            self.session.current_page,
        );
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::entities::TaskStatus;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap()
    }

    fn controller() -> (SessionController, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(t0()));
        (SessionController::new(&Config::default(), clock.clone()), clock)
    }

    fn png() -> ImageData {
        ImageData::new(vec![1, 2, 3], "image/png")
    }

    fn edit_request(prompt: &str) -> EditRequest {
        EditRequest::Edit {
            image: Some(png()),
            prompt: prompt.to_string(),
        }
    }

    #[test]
    fn test_starts_signed_out_on_login() {
        let (ctl, _) = controller();
        assert_eq!(ctl.identity(), None);
        assert_eq!(ctl.current_page(), Page::Login);
        assert_eq!(ctl.plan(), Plan::Basic);
    }

    #[test]
    fn test_login_resets_credits_and_tasks() {
        let (mut ctl, _) = controller();
        ctl.login(Identity::new("user@example.com"));
        ctl.perform_task("1");
        ctl.claim_task("1");
        assert_eq!(ctl.balance(), 15);

        ctl.logout();
        ctl.login(Identity::new("user@example.com"));
        assert_eq!(ctl.balance(), 10);
        assert!(ctl.tasks().iter().all(|t| t.status == TaskStatus::Available));
        assert_eq!(ctl.current_page(), Page::Editor);
    }

    #[test]
    fn test_canonical_generates_weekly_account() {
        let (mut ctl, _) = controller();
        ctl.login(Identity::new("lifetime@user.com"));
        assert_eq!(ctl.navigate(Page::Generator), Page::Generator);

        let account = ctl.generate_account(PlanKind::Weekly).unwrap();
        assert_eq!(ctl.accounts().count(), 1);
        assert_eq!(account.plan, PlanKind::Weekly);
        assert_eq!(account.expires_at, Some(t0() + Duration::days(7)));

        let view = ctl.view();
        assert_eq!(view.accounts.len(), 1);
        assert_eq!(view.accounts[0].plan_label, "Weekly");
        assert_eq!(view.accounts[0].time_remaining, "7d 0h");
    }

    #[test]
    fn test_non_canonical_redirected_from_generator() {
        let (mut ctl, _) = controller();
        ctl.login(Identity::new("lifetime3@user.com"));
        assert_eq!(ctl.plan(), Plan::TOP_TIER);

        assert_eq!(ctl.navigate(Page::Generator), Page::Editor);

        ctl.navigate(Page::Tasks);
        assert_eq!(ctl.generate_account(PlanKind::Monthly), None);
        assert_eq!(ctl.current_page(), Page::Editor);
        assert!(ctl.accounts().is_empty());
    }

    #[test]
    fn test_signed_out_navigation_guard() {
        let (mut ctl, _) = controller();
        assert_eq!(ctl.navigate(Page::Tasks), Page::Login);
        assert_eq!(ctl.navigate(Page::Pricing), Page::Pricing);
        assert_eq!(ctl.navigate(Page::Register), Page::Register);

        ctl.login(Identity::new("user@example.com"));
        assert_eq!(ctl.navigate(Page::Register), Page::Editor);
    }

    #[test]
    fn test_expired_active_account_forces_logout() {
        let (mut ctl, clock) = controller();
        ctl.login(Identity::new("lifetime@user.com"));
        let account = ctl.generate_account(PlanKind::OneDay).unwrap();

        ctl.logout();
        ctl.sign_in(account.identity.as_str(), "password123").unwrap();
        assert_eq!(ctl.plan(), Plan::Subscribed(PlanKind::OneDay));
        ctl.navigate(Page::Tasks);

        clock.advance(Duration::hours(23));
        assert_eq!(ctl.tick(), SweepReport::default());
        assert_eq!(ctl.identity(), Some(&account.identity));

        clock.advance(Duration::hours(1));
        let report = ctl.tick();
        assert!(report.forced_logout);
        assert_eq!(report.evicted, vec![account.identity.clone()]);
        assert_eq!(ctl.identity(), None);
        assert_eq!(ctl.current_page(), Page::Login);

        // No longer addressable for sign-in
        assert_eq!(
            ctl.sign_in(account.identity.as_str(), "password123"),
            Err(CredentialError::InvalidCredentials)
        );
    }

    #[test]
    fn test_sweep_of_other_accounts_keeps_session() {
        let (mut ctl, clock) = controller();
        ctl.login(Identity::new("lifetime@user.com"));
        ctl.generate_account(PlanKind::OneDay);
        ctl.generate_account(PlanKind::Lifetime);

        clock.advance(Duration::days(2));
        let report = ctl.tick();
        assert_eq!(report.evicted.len(), 1);
        assert!(!report.forced_logout);
        assert!(ctl.is_canonical());
        assert_eq!(ctl.accounts().count(), 1);
    }

    #[test]
    fn test_login_clears_registry_for_fresh_identity() {
        let (mut ctl, _) = controller();
        ctl.login(Identity::new("lifetime@user.com"));
        let account = ctl.generate_account(PlanKind::Yearly).unwrap();
        ctl.generate_account(PlanKind::Monthly);

        // Signing into a generated account keeps the registry
        ctl.logout();
        ctl.login(account.identity.clone());
        assert_eq!(ctl.accounts().count(), 2);

        // An unrelated identity starts a fresh demo session
        ctl.logout();
        ctl.login(Identity::new("user@example.com"));
        assert!(ctl.accounts().is_empty());
    }

    #[test]
    fn test_delete_session_keeps_account_record() {
        let (mut ctl, _) = controller();
        ctl.login(Identity::new("lifetime@user.com"));
        let account = ctl.generate_account(PlanKind::Weekly).unwrap();

        ctl.logout();
        ctl.login(account.identity.clone());
        ctl.delete_session();

        assert_eq!(ctl.identity(), None);
        assert_eq!(ctl.current_page(), Page::Login);
        assert!(ctl.accounts().find_by_identity(&account.identity).is_some());
    }

    #[test]
    fn test_delete_account_is_canonical_only() {
        let (mut ctl, _) = controller();
        ctl.login(Identity::new("lifetime@user.com"));
        let account = ctl.generate_account(PlanKind::ThreeDays).unwrap();

        ctl.logout();
        ctl.login(account.identity.clone());
        assert!(!ctl.delete_account(&account.identity));
        assert_eq!(ctl.accounts().count(), 1);

        ctl.logout();
        ctl.login(Identity::new("lifetime@user.com"));
        assert!(ctl.delete_account(&account.identity));
        assert!(!ctl.delete_account(&account.identity));
        assert!(ctl.accounts().is_empty());
    }

    #[test]
    fn test_sign_in_checks_credentials() {
        let (mut ctl, _) = controller();
        assert_eq!(ctl.sign_in("user@example.com", "nope"), Err(CredentialError::InvalidCredentials));
        assert_eq!(ctl.identity(), None);

        ctl.sign_in("USER@example.com", "password123").unwrap();
        assert_eq!(ctl.identity(), Some(&Identity::new("user@example.com")));
        assert_eq!(ctl.plan(), Plan::Basic);
    }

    #[test]
    fn test_register_signs_in_basic_identity() {
        let (mut ctl, _) = controller();
        let form = RegistrationForm {
            identity: "new@example.com".to_string(),
            secret: "longenough".to_string(),
            confirm: "longenough".to_string(),
        };
        ctl.register(&form).unwrap();
        assert_eq!(ctl.plan(), Plan::Basic);
        assert_eq!(ctl.balance(), 10);
        assert_eq!(ctl.current_page(), Page::Editor);
    }

    #[test]
    fn test_register_refuses_existing_identities() {
        let (mut ctl, _) = controller();
        let form = |identity: &str| RegistrationForm {
            identity: identity.to_string(),
            secret: "longenough".to_string(),
            confirm: "longenough".to_string(),
        };

        ctl.login(Identity::new("lifetime@user.com"));
        let generated = ctl.generate_account(PlanKind::Weekly).unwrap().identity.clone();
        ctl.logout();

        assert_eq!(ctl.register(&form("lifetime@user.com")), Err(CredentialError::IdentityTaken));
        assert_eq!(ctl.register(&form("LIFETIME3@user.com")), Err(CredentialError::IdentityTaken));
        assert_eq!(ctl.register(&form(generated.as_str())), Err(CredentialError::IdentityTaken));
        assert!(ctl.identity().is_none());
        assert_eq!(ctl.plan(), Plan::Basic);
    }

    #[test]
    fn test_empty_prompt_is_rejected_without_state_change() {
        let (mut ctl, _) = controller();
        ctl.login(Identity::new("user@example.com"));
        let token = ctl.session_token();

        assert_eq!(ctl.begin_edit(edit_request("")).unwrap_err(), ValidationError::MissingEditInput);
        assert_eq!(ctl.balance(), 10);
        assert!(!ctl.is_pending(EditOperation::Edit));
        assert_eq!(ctl.session_token(), token);
    }

    #[test]
    fn test_successful_edit_consumes_exactly_one_credit() {
        let (mut ctl, _) = controller();
        ctl.login(Identity::new("user@example.com"));

        let (ticket, _job) = ctl.begin_edit(edit_request("add a hat")).unwrap();
        assert!(ctl.is_pending(EditOperation::Edit));
        assert_eq!(
            ctl.begin_edit(edit_request("again")).unwrap_err(),
            ValidationError::AlreadyPending(EditOperation::Edit)
        );

        // Merge is independent of a pending edit
        let merge = EditRequest::Merge {
            first: Some(png()),
            second: Some(png()),
            prompt: "blend".to_string(),
        };
        assert!(ctl.begin_edit(merge).is_ok());

        assert_eq!(ctl.complete_edit(ticket, Ok(png())), EditOutcome::Delivered(png()));
        assert_eq!(ctl.balance(), 9);
        assert!(!ctl.is_pending(EditOperation::Edit));
    }

    #[test]
    fn test_failed_edit_consumes_nothing() {
        let (mut ctl, _) = controller();
        ctl.login(Identity::new("user@example.com"));

        let (ticket, _) = ctl.begin_edit(edit_request("add a hat")).unwrap();
        let outcome = ctl.complete_edit(ticket, Err(GenerationError::NoImage));
        assert_eq!(
            outcome,
            EditOutcome::Failed {
                message: "Edit failed: no image data found in the service response".to_string()
            }
        );
        assert_eq!(ctl.balance(), 10);
        assert!(!ctl.is_pending(EditOperation::Edit));
    }

    #[test]
    fn test_stale_completion_is_discarded() {
        let (mut ctl, _) = controller();
        ctl.login(Identity::new("user@example.com"));
        let (ticket, _) = ctl.begin_edit(edit_request("add a hat")).unwrap();

        // Same identity, new session
        ctl.logout();
        ctl.login(Identity::new("user@example.com"));
        let (fresh_ticket, _) = ctl.begin_edit(edit_request("add a scarf")).unwrap();

        assert_eq!(ctl.complete_edit(ticket, Ok(png())), EditOutcome::Discarded);
        assert_eq!(ctl.balance(), 10);
        assert!(ctl.is_pending(EditOperation::Edit));

        assert!(matches!(ctl.complete_edit(fresh_ticket, Ok(png())), EditOutcome::Delivered(_)));
        assert_eq!(ctl.balance(), 9);
    }

    #[test]
    fn test_out_of_credits_blocks_metered_but_not_unlimited() {
        let mut config = Config::default();
        config.starting_credits = 0;
        let mut ctl = SessionController::new(&config, Arc::new(ManualClock::new(t0())));

        ctl.login(Identity::new("user@example.com"));
        assert_eq!(
            ctl.begin_edit(edit_request("add a hat")).unwrap_err(),
            ValidationError::InsufficientCredits
        );

        ctl.logout();
        ctl.login(Identity::new("lifetime@user.com"));
        let (ticket, _) = ctl.begin_edit(edit_request("add a hat")).unwrap();
        assert!(matches!(ctl.complete_edit(ticket, Ok(png())), EditOutcome::Delivered(_)));
        assert_eq!(ctl.balance(), 0);
    }

    #[test]
    fn test_abandoned_edit_releases_pending_without_charge() {
        let (mut ctl, _) = controller();
        ctl.login(Identity::new("user@example.com"));

        let (ticket, _) = ctl.begin_edit(edit_request("add a hat")).unwrap();
        assert!(ctl.abandon_edit(ticket));
        assert!(!ctl.is_pending(EditOperation::Edit));
        assert_eq!(ctl.balance(), 10);
        assert!(ctl.begin_edit(edit_request("add a hat")).is_ok());

        // A ticket from an earlier session touches nothing
        ctl.logout();
        ctl.login(Identity::new("user@example.com"));
        let (_fresh, _) = ctl.begin_edit(edit_request("scarf")).unwrap();
        assert!(!ctl.abandon_edit(ticket));
        assert!(ctl.is_pending(EditOperation::Edit));
    }

    #[test]
    fn test_edit_requires_sign_in() {
        let (mut ctl, _) = controller();
        assert_eq!(ctl.begin_edit(edit_request("hat")).unwrap_err(), ValidationError::NotSignedIn);
    }

    #[test]
    fn test_rating_task_through_controller() {
        let (mut ctl, _) = controller();
        ctl.login(Identity::new("user@example.com"));

        assert_eq!(ctl.perform_task("3"), PerformOutcome::RatingRequested);
        assert_eq!(ctl.view().rating_prompt.as_deref(), Some("3"));
        assert_eq!(ctl.submit_rating(5), Ok(PerformOutcome::Completed));
        assert_eq!(ctl.claim_task("3"), Some(10));
        assert_eq!(ctl.claim_task("3"), None);
        assert_eq!(ctl.balance(), 20);
    }

    #[test]
    fn test_view_hides_accounts_from_non_canonical() {
        let (mut ctl, _) = controller();
        ctl.login(Identity::new("lifetime@user.com"));
        let account = ctl.generate_account(PlanKind::Lifetime).unwrap();

        ctl.logout();
        ctl.login(account.identity.clone());
        let view = ctl.view();
        assert!(view.accounts.is_empty());
        assert!(!view.can_generate_accounts);
        assert_eq!(view.plan_label, "Lifetime");
        assert!(view.unlimited);
    }

    #[test]
    fn test_change_password() {
        let (mut ctl, _) = controller();
        let change = PasswordChange {
            current: "password123".to_string(),
            new: "brand-new-secret".to_string(),
            confirm: "brand-new-secret".to_string(),
        };
        assert_eq!(ctl.change_password(&change), Err(CredentialError::InvalidCredentials));

        ctl.login(Identity::new("user@example.com"));
        assert!(ctl.change_password(&change).is_ok());
    }
}
