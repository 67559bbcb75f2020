// Entity Models
//
// - GeneratedAccount: time-boxed identity owned by the AccountRegistry
// - Task: reward task driven by the TaskEngine

pub mod account;
pub mod task;

pub use account::{AccountRegistry, GeneratedAccount, SweepOutcome, TimeRemaining, GENERATED_DOMAIN};
pub use task::{default_tasks, PerformOutcome, Task, TaskEngine, TaskKind, TaskStatus};
