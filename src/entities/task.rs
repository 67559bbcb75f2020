// 🎁 Reward Tasks - one-shot actions that pay out credits
//
// Lifecycle per task (forward only, never reversible):
//
//     available ──perform──▶ claimable ──claim──▶ claimed
//
// The rating task does not go straight to claimable: performing it opens a
// rating prompt, and only a submitted rating (1-5) fires the transition.

use crate::error::ValidationError;
use crate::ledger::CreditLedger;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

// ============================================================================
// TASK STATUS
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Available,
    Claimable,
    Claimed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    /// Performing it completes it
    Simple,
    /// Completes only after a rating is supplied
    Rating,
}

// ============================================================================
// TASK ENTITY
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,

    /// Credits granted on claim (always positive)
    pub reward: u32,

    pub kind: TaskKind,
    pub status: TaskStatus,
}

impl Task {
    pub fn new(id: &str, title: &str, description: &str, reward: u32, kind: TaskKind) -> Self {
        Task {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            reward,
            kind,
            status: TaskStatus::Available,
        }
    }
}

/// Tasks every session starts with
pub fn default_tasks() -> Vec<Task> {
    vec![
        Task::new("1", "Share the site", "Share the site with a friend and earn a bonus.", 5, TaskKind::Simple),
        Task::new("2", "Follow us", "Follow our official accounts on social media.", 3, TaskKind::Simple),
        Task::new("3", "Rate the app", "Support us with a rating.", 10, TaskKind::Rating),
    ]
}

// ============================================================================
// PERFORM OUTCOME
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformOutcome {
    /// available → claimable
    Completed,
    /// Rating prompt opened; nothing transitions until a rating arrives
    RatingRequested,
    /// Unknown task or not `available`
    Ignored,
}

// ============================================================================
// TASK ENGINE
// ============================================================================

#[derive(Debug, Clone)]
pub struct TaskEngine {
    catalog: Vec<Task>,
    tasks: Vec<Task>,

    /// Task awaiting a rating, if the prompt is open
    rating_prompt: Option<String>,
}

impl TaskEngine {
    pub fn new(catalog: Vec<Task>) -> Self {
        let mut engine = TaskEngine {
            tasks: Vec::new(),
            catalog,
            rating_prompt: None,
        };
        engine.reset();
        engine
    }

    /// Every task back to `available` (session start)
    pub fn reset(&mut self) {
        self.tasks = self
            .catalog
            .iter()
            .cloned()
            .map(|mut task| {
                task.status = TaskStatus::Available;
                task
            })
            .collect();
        self.rating_prompt = None;
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, task_id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == task_id)
    }

    pub fn status(&self, task_id: &str) -> Option<TaskStatus> {
        self.get(task_id).map(|task| task.status)
    }

    pub fn rating_prompt(&self) -> Option<&str> {
        self.rating_prompt.as_deref()
    }

    /// Perform a task. Only `available` tasks react.
    pub fn perform(&mut self, task_id: &str) -> PerformOutcome {
        let Some(task) = self.tasks.iter_mut().find(|task| task.id == task_id) else {
            return PerformOutcome::Ignored;
        };
        if task.status != TaskStatus::Available {
            return PerformOutcome::Ignored;
        }

        match task.kind {
            TaskKind::Simple => {
                task.status = TaskStatus::Claimable;
                debug!(task = %task.id, "task completed");
                PerformOutcome::Completed
            }
            TaskKind::Rating => {
                self.rating_prompt = Some(task.id.clone());
                PerformOutcome::RatingRequested
            }
        }
    }

    /// Supply the rating for the open prompt. The value is logged, not kept.
    pub fn submit_rating(&mut self, rating: u8) -> Result<PerformOutcome, ValidationError> {
        if !(1..=5).contains(&rating) {
            return Err(ValidationError::InvalidRating(rating));
        }
        let Some(task_id) = self.rating_prompt.take() else {
            return Ok(PerformOutcome::Ignored);
        };

        info!(task = %task_id, rating, "rating submitted");
        match self.tasks.iter_mut().find(|task| task.id == task_id) {
            Some(task) if task.status == TaskStatus::Available => {
                task.status = TaskStatus::Claimable;
                Ok(PerformOutcome::Completed)
            }
            _ => Ok(PerformOutcome::Ignored),
        }
    }

    /// Close the rating prompt without completing anything
    pub fn cancel_rating(&mut self) {
        self.rating_prompt = None;
    }

    /// Claim a `claimable` task: grant its reward, mark it `claimed`.
    ///
    /// Anything else is a silent no-op. Returns the granted reward.
    pub fn claim(&mut self, task_id: &str, ledger: &mut CreditLedger) -> Option<u32> {
        let task = self
            .tasks
            .iter_mut()
            .find(|task| task.id == task_id && task.status == TaskStatus::Claimable)?;

        ledger.grant(task.reward);
        task.status = TaskStatus::Claimed;
        info!(task = %task.id, reward = task.reward, balance = ledger.balance(), "reward claimed");
        Some(task.reward)
    }
}

impl Default for TaskEngine {
    fn default() -> Self {
        Self::new(default_tasks())
    }
}

// ============================================================================
// TESTS
// ============================================================================
