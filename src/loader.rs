//! History/Tips Loader
//!
//! Supplementary read-only lists, fetched once per mount on a best-effort
//! basis: a failed fetch leaves an empty list and is never shown to the user.

use std::fmt::Display;
use std::future::Future;
use tokio::sync::OnceCell;
use tracing::debug;

use crate::api::{BackendClient, HistoryEntry};

pub struct Auxiliary<T> {
    name: &'static str,
    items: OnceCell<Vec<T>>,
}

pub type TipsLoader = Auxiliary<String>;
pub type HistoryLoader = Auxiliary<HistoryEntry>;

impl<T> Auxiliary<T> {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            items: OnceCell::new(),
        }
    }

    /// Runs `fetch` on the first call only; later calls return the stored
    /// list without touching the network.
    pub async fn load<F, Fut, E>(&self, fetch: F) -> &[T]
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<T>, E>>,
        E: Display,
    {
        self.items
            .get_or_init(|| async {
                match fetch().await {
                    Ok(items) => {
                        debug!("Loaded {} {} entries", items.len(), self.name);
                        items
                    }
                    Err(e) => {
                        debug!("Ignoring {} load failure: {}", self.name, e);
                        Vec::new()
                    }
                }
            })
            .await
    }

    /// The loaded list; empty until the load has finished.
    pub fn items(&self) -> &[T] {
        self.items.get().map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn is_loaded(&self) -> bool {
        self.items.initialized()
    }
}

impl TipsLoader {
    pub fn tips() -> Self {
        Self::new("tips")
    }

    pub async fn fetch(&self, client: &BackendClient) -> &[String] {
        self.load(|| client.tips()).await
    }
}

impl HistoryLoader {
    pub fn history() -> Self {
        Self::new("history")
    }

    pub async fn fetch(&self, client: &BackendClient) -> &[HistoryEntry] {
        self.load(|| client.history()).await
    }
}
