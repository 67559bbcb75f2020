//! Error taxonomy.
//!
//! - [`ValidationError`]: rejected synchronously, nothing mutated, fix the input.
//! - [`CredentialError`]: sign-in / registration / password-change rejections.
//! - [`GenerationError`]: the remote image collaborator failed; surfaced verbatim.
//!
//! Entitlement denial is not an error (it is a redirect) and a stale remote
//! completion is not an error either (it is silently discarded).

use crate::editing::EditOperation;
use thiserror::Error;

/// Precondition failures on user intents.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Sign in to use the editor.")]
    NotSignedIn,

    #[error("Upload an image and describe the edit.")]
    MissingEditInput,

    #[error("Upload both images and describe the merge.")]
    MissingMergeInput,

    #[error("Not enough credits. Complete some tasks to earn more!")]
    InsufficientCredits,

    #[error("A {0} request is already in progress.")]
    AlreadyPending(EditOperation),

    #[error("Rating must be between 1 and 5 (got {0}).")]
    InvalidRating(u8),
}

/// Credential-related rejections.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CredentialError {
    #[error("Incorrect email or password.")]
    InvalidCredentials,

    #[error("Email is required.")]
    MissingIdentity,

    #[error("Passwords do not match.")]
    PasswordMismatch,

    #[error("Password must be at least {min} characters.")]
    PasswordTooShort { min: usize },

    #[error("An account with this email already exists.")]
    IdentityTaken,
}

/// Failures of the remote image-generation collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("API key is missing. Set API_KEY in the environment.")]
    MissingApiKey,

    #[error("request to image service failed: {0}")]
    Transport(String),

    #[error("image service returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("no image data found in the service response")]
    NoImage,

    #[error("image payload could not be decoded: {0}")]
    InvalidPayload(String),
}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        GenerationError::Transport(err.to_string())
    }
}
