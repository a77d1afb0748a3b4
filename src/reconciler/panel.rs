use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinHandle};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Loading,
    Success,
    Failed,
}

/// What a panel currently shows.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelState<T> {
    pub phase: Phase,
    pub result: Option<T>,
    pub error: Option<String>,
}

impl<T> Default for PanelState<T> {
    fn default() -> Self {
        Self {
            phase: Phase::Idle,
            result: None,
            error: None,
        }
    }
}

impl<T> PanelState<T> {
    pub fn is_loading(&self) -> bool {
        self.phase == Phase::Loading
    }
}

/// Identity of one initiated request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Ticket(u64);

struct Shared<T> {
    name: &'static str,
    state: watch::Sender<PanelState<T>>,
    latest: AtomicU64,
    in_flight: Mutex<Option<AbortHandle>>,
}

/// State of one estimation panel.
///
/// Every request takes a [`Ticket`] when it starts; a response is applied
/// only if no newer request has started since. Starting a request through
/// [`Panel::spawn`] also aborts the previous in-flight one.
pub struct Panel<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for Panel<T> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<T> Panel<T>
where
    T: Clone + Send + Sync + 'static,
{
    pub fn new(name: &'static str) -> Self {
        let (state, _) = watch::channel(PanelState::default());
        Self {
            shared: Arc::new(Shared {
                name,
                state,
                latest: AtomicU64::new(0),
                in_flight: Mutex::new(None),
            }),
        }
    }

    pub fn snapshot(&self) -> PanelState<T> {
        self.shared.state.borrow().clone()
    }

    /// Receives every state change of this panel.
    pub fn subscribe(&self) -> watch::Receiver<PanelState<T>> {
        self.shared.state.subscribe()
    }

    /// Enters `Loading`. The previous result stays visible until replaced.
    pub fn begin(&self) -> Ticket {
        let mut ticket = Ticket(0);
        self.shared.state.send_modify(|state| {
            ticket = Ticket(self.shared.latest.fetch_add(1, Ordering::SeqCst) + 1);
            state.phase = Phase::Loading;
            state.error = None;
        });
        debug!("[{}] request #{} started", self.shared.name, ticket.0);
        ticket
    }

    /// Applies the outcome of `ticket`'s request. Returns `false` when a
    /// newer request has started and the outcome was discarded.
    pub fn resolve(&self, ticket: Ticket, outcome: Result<T, String>) -> bool {
        let applied = self.shared.state.send_if_modified(|state| {
            if self.shared.latest.load(Ordering::SeqCst) != ticket.0 {
                return false;
            }
            match outcome {
                Ok(result) => {
                    state.phase = Phase::Success;
                    state.result = Some(result);
                    state.error = None;
                }
                Err(message) => {
                    state.phase = Phase::Failed;
                    state.result = None;
                    state.error = Some(message);
                }
            }
            true
        });
        if !applied {
            debug!("[{}] discarded stale response #{}", self.shared.name, ticket.0);
        }
        applied
    }

    /// Shows `message` without touching the held result or any request in
    /// flight. Used for failures that happen before a request is issued.
    pub fn report_error(&self, message: impl Into<String>) {
        let message = message.into();
        self.shared.state.send_modify(|state| {
            state.phase = Phase::Failed;
            state.error = Some(message);
        });
    }

    /// Starts `work` as the panel's current request.
    ///
    /// The returned handle resolves to whether the outcome was applied.
    pub fn spawn<F>(&self, work: F) -> JoinHandle<bool>
    where
        F: Future<Output = Result<T, String>> + Send + 'static,
    {
        // Ticket order and in-flight order must agree, so both are taken
        // under the same lock.
        let mut in_flight = self.in_flight();
        let ticket = self.begin();
        let panel = self.clone();
        let handle = tokio::spawn(async move {
            let outcome = work.await;
            panel.resolve(ticket, outcome)
        });

        if let Some(previous) = in_flight.replace(handle.abort_handle()) {
            previous.abort();
        }
        handle
    }

    /// Aborts the in-flight request, if any, and makes sure nothing that is
    /// already running can still land.
    pub fn cancel(&self) {
        let mut in_flight = self.in_flight();
        self.shared.latest.fetch_add(1, Ordering::SeqCst);
        if let Some(handle) = in_flight.take() {
            handle.abort();
            debug!("[{}] in-flight request cancelled", self.shared.name);
        }
    }

    fn in_flight(&self) -> MutexGuard<'_, Option<AbortHandle>> {
        self.shared
            .in_flight
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
