//! Hand-off between the engine and the host's asynchronous persistence
//! callback.
//!
//! The engine never awaits anything itself. `GanttEngine::end_drag` returns
//! an owned [`UpdateRequest`]; the host runs it through [`run_update`] or an
//! [`UpdateDispatcher`] and feeds the [`UpdateOutcome`] back through
//! `GanttEngine::settle_update`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use log::{debug, warn};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::model::{NodeId, Record};

pub type UpdateFuture = Pin<Box<dyn Future<Output = anyhow::Result<bool>> + Send + 'static>>;

/// Host-side persistence. Resolves to `true` to accept the new dates.
pub trait UpdateHandler: Send + Sync {
    fn update(&self, record: Record, start_date: String, end_date: String) -> UpdateFuture;
}

impl<F, Fut> UpdateHandler for F
where
    F: Fn(Record, String, String) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<bool>> + Send + 'static,
{
    fn update(&self, record: Record, start_date: String, end_date: String) -> UpdateFuture {
        Box::pin(self(record, start_date, end_date))
    }
}

/// Dates a finished drag wants persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateRequest {
    pub id: Uuid,
    /// Data generation the request was made against.
    pub generation: u64,
    pub node: NodeId,
    pub record: Record,
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Accepted,
    Rejected,
    /// The callback errored or panicked.
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub id: Uuid,
    pub generation: u64,
    pub resolution: Resolution,
}

impl UpdateOutcome {
    pub fn for_request(request: &UpdateRequest, resolution: Resolution) -> Self {
        Self {
            id: request.id,
            generation: request.generation,
            resolution,
        }
    }
}

/// Await the host callback for one request. Never fails: errors become
/// `Resolution::Failed`.
pub async fn run_update(handler: &dyn UpdateHandler, request: &UpdateRequest) -> UpdateOutcome {
    let future = handler.update(
        request.record.clone(),
        request.start_date.clone(),
        request.end_date.clone(),
    );
    let resolution = match future.await {
        Ok(true) => Resolution::Accepted,
        Ok(false) => Resolution::Rejected,
        Err(e) => {
            warn!("update callback failed for {:?}: {e:#}", request.node);
            Resolution::Failed(e.to_string())
        }
    };
    UpdateOutcome::for_request(request, resolution)
}

/// Runs update callbacks on a tokio runtime and queues their outcomes for a
/// synchronous UI loop to drain.
pub struct UpdateDispatcher {
    runtime: tokio::runtime::Handle,
    handler: Arc<dyn UpdateHandler>,
    tx: mpsc::UnboundedSender<UpdateOutcome>,
    rx: mpsc::UnboundedReceiver<UpdateOutcome>,
    on_settled: Option<Arc<dyn Fn() + Send + Sync>>,
    in_flight: usize,
}

impl UpdateDispatcher {
    pub fn new(runtime: tokio::runtime::Handle, handler: Arc<dyn UpdateHandler>) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            runtime,
            handler,
            tx,
            rx,
            on_settled: None,
            in_flight: 0,
        }
    }

    /// Called from the worker after each outcome is queued, e.g. to wake
    /// the UI.
    pub fn on_settled(mut self, notify: impl Fn() + Send + Sync + 'static) -> Self {
        self.on_settled = Some(Arc::new(notify));
        self
    }

    pub fn dispatch(&mut self, request: UpdateRequest) {
        let handler = Arc::clone(&self.handler);
        let tx = self.tx.clone();
        let notify = self.on_settled.clone();
        self.in_flight += 1;
        debug!("dispatching update {} for {:?}", request.id, request.node);
        self.runtime.spawn(async move {
            let fallback = UpdateOutcome::for_request(&request, Resolution::Failed(String::new()));
            // A panicking callback must still settle, or the bar stays busy.
            let outcome = match tokio::spawn(async move { run_update(handler.as_ref(), &request).await }).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    warn!("update callback panicked: {e}");
                    UpdateOutcome {
                        resolution: Resolution::Failed(e.to_string()),
                        ..fallback
                    }
                }
            };
            if tx.send(outcome).is_ok() {
                if let Some(notify) = notify {
                    notify();
                }
            }
        });
    }

    /// Next settled outcome, if any. Does not block.
    pub fn try_next(&mut self) -> Option<UpdateOutcome> {
        let outcome = self.rx.try_recv().ok()?;
        self.in_flight = self.in_flight.saturating_sub(1);
        Some(outcome)
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn request() -> UpdateRequest {
        UpdateRequest {
            id: Uuid::new_v4(),
            generation: 3,
            node: NodeId(0),
            record: Record::new(),
            start_date: "2024-01-02 00:00:00".to_string(),
            end_date: "2024-01-06 23:59:59".to_string(),
        }
    }

    #[tokio::test]
    async fn closures_are_handlers() {
        let accept_weekdays = |_: Record, start: String, _: String| async move {
            Ok::<_, anyhow::Error>(!start.starts_with("2024-01-06"))
        };
        let req = request();
        let outcome = run_update(&accept_weekdays, &req).await;
        assert_eq!(outcome.resolution, Resolution::Accepted);
        assert_eq!(outcome.id, req.id);
        assert_eq!(outcome.generation, 3);
    }

    #[tokio::test]
    async fn errors_become_failures() {
        let broken = |_: Record, _: String, _: String| async move {
            Err::<bool, _>(anyhow::anyhow!("backend offline"))
        };
        let outcome = run_update(&broken, &request()).await;
        assert_eq!(outcome.resolution, Resolution::Failed("backend offline".to_string()));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn dispatcher_queues_outcomes() {
        let handler: Arc<dyn UpdateHandler> = Arc::new(|_: Record, _: String, _: String| async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            Ok::<_, anyhow::Error>(false)
        });
        let mut dispatcher = UpdateDispatcher::new(tokio::runtime::Handle::current(), handler);
        let req = request();
        dispatcher.dispatch(req.clone());
        assert_eq!(dispatcher.in_flight(), 1);

        let mut outcome = None;
        for _ in 0..200 {
            if let Some(o) = dispatcher.try_next() {
                outcome = Some(o);
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        let outcome = outcome.expect("outcome settled");
        assert_eq!(outcome.id, req.id);
        assert_eq!(outcome.resolution, Resolution::Rejected);
        assert_eq!(dispatcher.in_flight(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn panicking_callback_still_settles() {
        let handler: Arc<dyn UpdateHandler> = Arc::new(|_: Record, start: String, _: String| async move {
            if !start.is_empty() {
                panic!("boom");
            }
            Ok::<_, anyhow::Error>(true)
        });
        let mut dispatcher = UpdateDispatcher::new(tokio::runtime::Handle::current(), handler);
        dispatcher.dispatch(request());

        let mut outcome = None;
        for _ in 0..200 {
            if let Some(o) = dispatcher.try_next() {
                outcome = Some(o);
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        assert!(matches!(outcome.map(|o| o.resolution), Some(Resolution::Failed(_))));
    }
}
