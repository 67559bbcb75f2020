// 🔐 Authentication - black-box credential check + form validation
//
// Nothing here stores or hashes credentials. The authenticator answers
// accept/reject for a submitted identity + secret; registration and password
// change only validate their forms.

use crate::error::CredentialError;
use crate::identity::Identity;
use crate::plan::AllowList;

/// Minimum secret length for registration and password change
pub const MIN_SECRET_LEN: usize = 8;

// ============================================================================
// AUTHENTICATOR
// ============================================================================

pub trait Authenticator: Send + Sync {
    fn authenticate(&self, identity: &Identity, secret: &str) -> bool;
}

/// Demo authenticator: allow-listed identities plus one demo user, all
/// sharing a single demo secret
#[derive(Debug, Clone)]
pub struct DemoAuthenticator {
    allow_list: AllowList,
    demo_identity: Identity,
    secret: String,
}

impl DemoAuthenticator {
    pub fn new(allow_list: AllowList, demo_identity: Identity, secret: impl Into<String>) -> Self {
        DemoAuthenticator {
            allow_list,
            demo_identity,
            secret: secret.into(),
        }
    }
}

impl Authenticator for DemoAuthenticator {
    fn authenticate(&self, identity: &Identity, secret: &str) -> bool {
        let known = self.allow_list.contains(identity) || identity == &self.demo_identity;
        known && secret == self.secret
    }
}

// ============================================================================
// REGISTRATION
// ============================================================================

#[derive(Debug, Clone)]
pub struct RegistrationForm {
    pub identity: String,
    pub secret: String,
    pub confirm: String,
}

impl RegistrationForm {
    /// Check the form; on success yields the identity to sign in as
    pub fn validate(&self) -> Result<Identity, CredentialError> {
        let identity = Identity::new(&self.identity);
        if identity.is_empty() {
            return Err(CredentialError::MissingIdentity);
        }
        check_new_secret(&self.secret, &self.confirm)?;
        Ok(identity)
    }
}

// ============================================================================
// PASSWORD CHANGE
// ============================================================================

#[derive(Debug, Clone)]
pub struct PasswordChange {
    pub current: String,
    pub new: String,
    pub confirm: String,
}

impl PasswordChange {
    pub fn validate(&self) -> Result<(), CredentialError> {
        check_new_secret(&self.new, &self.confirm)
    }
}

fn check_new_secret(secret: &str, confirm: &str) -> Result<(), CredentialError> {
    if secret != confirm {
        return Err(CredentialError::PasswordMismatch);
    }
    if secret.chars().count() < MIN_SECRET_LEN {
        return Err(CredentialError::PasswordTooShort { min: MIN_SECRET_LEN });
    }
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
