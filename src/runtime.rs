// ⚡ Runtime - the event loop side of the controller
//
// The controller lives behind one async mutex. Every intent, every sweep tick
// and every completion takes the lock, runs to completion, and releases it, so
// handlers are atomic with respect to each other. The lock is never held
// across the remote call.

use crate::controller::{SessionController, SweepReport};
use crate::editing::{EditOutcome, EditRequest, EditTicket, ImageGenerator};
use crate::error::ValidationError;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

pub type SharedController = Arc<Mutex<SessionController>>;

pub fn shared(controller: SessionController) -> SharedController {
    Arc::new(Mutex::new(controller))
}

/// Run the expiry sweep every `period` for as long as the task lives
pub fn spawn_expiry_sweep(controller: SharedController, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            let report: SweepReport = controller.lock().await.tick();
            if report.forced_logout {
                info!(evicted = report.evicted.len(), "sweep ended the active session");
            } else if !report.evicted.is_empty() {
                debug!(evicted = report.evicted.len(), "sweep evicted accounts");
            }
        }
    })
}

/// Admit, run and complete one edit/merge request.
///
/// Validation failures return before any remote call. Remote failures and
/// stale completions come back as an `EditOutcome`. If the future is dropped
/// while the remote call is in flight, the operation is released again.
pub async fn request_edit(
    controller: &SharedController,
    generator: &dyn ImageGenerator,
    request: EditRequest,
) -> Result<EditOutcome, ValidationError> {
    let (ticket, job) = controller.lock().await.begin_edit(request)?;
    let mut in_flight = InFlight {
        controller: controller.clone(),
        ticket: Some(ticket),
    };

    let result = job.run(generator).await;

    let mut ctl = controller.lock().await;
    in_flight.ticket = None;
    Ok(ctl.complete_edit(ticket, result))
}

/// Abandons its ticket on drop unless the request completed
struct InFlight {
    controller: SharedController,
    ticket: Option<EditTicket>,
}

impl Drop for InFlight {
    fn drop(&mut self) {
        let Some(ticket) = self.ticket.take() else {
            return;
        };
        debug!(operation = %ticket.operation, "request dropped in flight");

        if let Ok(mut ctl) = self.controller.try_lock() {
            ctl.abandon_edit(ticket);
        } else if let Ok(handle) = Handle::try_current() {
            let controller = self.controller.clone();
            handle.spawn(async move {
                controller.lock().await.abandon_edit(ticket);
            });
        } else {
            warn!(operation = %ticket.operation, "no runtime to release dropped request");
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
