// Studio Pass - Core Library
// Session, entitlement and credit model for the demo image editor.
// Exposes all modules for use in the TUI, the API server, and tests

pub mod identity;
pub mod clock;
pub mod plan;
pub mod entities;       // Generated accounts + reward tasks
pub mod ledger;
pub mod error;
pub mod auth;
pub mod editing;
pub mod session;
pub mod config;
pub mod controller;     // Sole writer of session state
pub mod gemini;         // Remote image collaborator
pub mod runtime;        // Shared controller, sweep task, edit driver

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use identity::{Identity, SessionToken};
pub use clock::{Clock, ManualClock, SystemClock};
pub use plan::{resolve_plan, AllowList, Plan, PlanKind};
pub use entities::{
    AccountRegistry, GeneratedAccount, SweepOutcome, TimeRemaining,
    PerformOutcome, Task, TaskEngine, TaskKind, TaskStatus,
};
pub use ledger::CreditLedger;
pub use error::{CredentialError, GenerationError, ValidationError};
pub use auth::{Authenticator, DemoAuthenticator, PasswordChange, RegistrationForm};
pub use editing::{
    EditJob, EditOperation, EditOutcome, EditRequest, EditTicket,
    ImageData, ImageGenerator,
};
pub use session::{guard_page, Page, Session};
pub use config::{Config, GeneratorConfig, ServerConfig};
pub use controller::{AccountView, SessionController, SessionView, SweepReport};
pub use gemini::GeminiGenerator;
pub use runtime::{request_edit, shared, spawn_expiry_sweep, SharedController};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
