use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::domain::{Message, MessageId};
use crate::error::{QueueError, Result};
use crate::ports::{IdGenerator, Store};
use crate::queue::{RetryDecision, WorkQueue};

/// Processes one checked-out message.
///
/// `Ok` acks the message; `Err` rolls it back and the queue's retry policy
/// decides whether it is retried or blocked.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    async fn handle(&self, message: &Message) -> std::result::Result<(), String>;
}

/// What a single `run_once` cycle did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Nothing pending (or the popped id was discarded).
    Idle,

    /// A single-consumer queue already has a message in flight.
    Busy,

    Acked(MessageId),

    /// Handler failed; `None` means the message was no longer in flight.
    RolledBack(MessageId, Option<RetryDecision>),
}

/// Run one get -> handle -> ack/rollback cycle.
pub async fn run_once<S, G>(
    queue: &WorkQueue<S, G>,
    handler: &dyn MessageHandler,
) -> Result<CycleOutcome>
where
    S: Store,
    G: IdGenerator,
{
    let message = match queue.get().await {
        Ok(Some(message)) => message,
        Ok(None) => return Ok(CycleOutcome::Idle),
        Err(QueueError::AlreadyProcessing { .. }) => return Ok(CycleOutcome::Busy),
        Err(e) => return Err(e),
    };

    match handler.handle(&message).await {
        Ok(()) => {
            queue.ack(message.id()).await?;
            Ok(CycleOutcome::Acked(message.id().clone()))
        }
        Err(reason) => {
            warn!(queue = %queue.name(), id = %message.id(), %reason, "handler failed");
            let decision = queue.rollback(message.id()).await?;
            Ok(CycleOutcome::RolledBack(message.id().clone(), decision))
        }
    }
}

/// Lower bound on the pause after a busy or failed cycle, so a queue
/// configured with `wait = 0` does not spin.
const MIN_IDLE_BACKOFF: Duration = Duration::from_millis(50);

fn idle_backoff(wait: Duration) -> Duration {
    wait.max(MIN_IDLE_BACKOFF)
}

/// Worker group handle.
/// - `request_shutdown` stops every worker after its current cycle
/// - `shutdown_and_join` also waits for them to exit
pub struct WorkerGroup {
    shutdown_tx: watch::Sender<bool>,
    joins: Vec<JoinHandle<()>>,
}

impl WorkerGroup {
    /// Spawn `n` workers consuming from `queue`.
    pub fn spawn<S, G>(
        n: usize,
        queue: Arc<WorkQueue<S, G>>,
        handler: Arc<dyn MessageHandler>,
    ) -> Self
    where
        S: Store + 'static,
        G: IdGenerator + 'static,
    {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let mut joins = Vec::with_capacity(n);
        for worker_id in 0..n {
            let q = Arc::clone(&queue);
            let h = Arc::clone(&handler);
            let mut rx = shutdown_rx.clone();

            let join = tokio::spawn(async move {
                worker_loop(worker_id, q, h, &mut rx).await;
            });
            joins.push(join);
        }

        Self { shutdown_tx, joins }
    }

    /// Ask every worker to stop. Messages already checked out are still
    /// acked or rolled back.
    pub fn request_shutdown(&self) {
        // receivers may already be gone
        let _ = self.shutdown_tx.send(true);
    }

    pub async fn shutdown_and_join(self) {
        self.request_shutdown();
        for j in self.joins {
            let _ = j.await;
        }
    }
}

async fn worker_loop<S, G>(
    worker_id: usize,
    queue: Arc<WorkQueue<S, G>>,
    handler: Arc<dyn MessageHandler>,
    shutdown_rx: &mut watch::Receiver<bool>,
) where
    S: Store,
    G: IdGenerator,
{
    let backoff = idle_backoff(queue.config().wait);
    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        // `get` is not cancellation safe, so shutdown is only observed
        // between cycles and during backoff.
        let idle = match run_once(queue.as_ref(), handler.as_ref()).await {
            Ok(CycleOutcome::Busy) => true,
            Ok(outcome) => {
                debug!(worker_id, queue = %queue.name(), ?outcome, "cycle finished");
                false
            }
            Err(e) => {
                error!(worker_id, queue = %queue.name(), error = %e, "queue operation failed");
                true
            }
        };

        if idle {
            tokio::select! {
                _ = shutdown_rx.changed() => {}
                _ = tokio::time::sleep(backoff) => {}
            }
        }
    }
    debug!(worker_id, queue = %queue.name(), "worker stopped");
}
