//! Single-record load lifecycle, used for the user profile

use std::sync::Arc;

use tokio::sync::watch;

use crate::error::CatalogError;
use crate::model::ResourceSource;

use super::pagination::{CancelGuard, FetchOutcome};

#[derive(Clone, Debug)]
pub struct ResourceState<T> {
    pub value: Option<T>,
    pub loading: bool,
    pub error: Option<CatalogError>,
}

impl<T> Default for ResourceState<T> {
    fn default() -> Self {
        Self {
            value: None,
            loading: false,
            error: None,
        }
    }
}

pub struct ResourceController<T> {
    name: &'static str,
    source: Arc<dyn ResourceSource<T>>,
    state: watch::Sender<ResourceState<T>>,
}

impl<T: Clone + Send + Sync + 'static> ResourceController<T> {
    pub fn new(name: &'static str, source: Arc<dyn ResourceSource<T>>) -> Self {
        let (state, _) = watch::channel(ResourceState::default());
        Self {
            name,
            source,
            state,
        }
    }

    pub fn state(&self) -> ResourceState<T> {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<ResourceState<T>> {
        self.state.subscribe()
    }

    /// Fetch the record. A failed refresh keeps the last good value.
    pub async fn load(&self) -> FetchOutcome {
        let started = self.state.send_if_modified(|state| {
            if state.loading {
                return false;
            }
            state.loading = true;
            state.error = None;
            true
        });
        if !started {
            tracing::debug!(resource = self.name, "Load dropped, fetch already in flight");
            return FetchOutcome::Rejected;
        }

        let guard = CancelGuard::new(|| {
            tracing::debug!(resource = self.name, "Load cancelled before completion");
            self.state.send_modify(|state| state.loading = false);
        });
        let result = self.source.fetch().await;
        guard.disarm();

        match result {
            Ok(value) => {
                self.state.send_modify(|state| {
                    state.value = Some(value);
                    state.loading = false;
                });
                tracing::info!(resource = self.name, "Resource loaded");
                FetchOutcome::Applied { count: 1 }
            }
            Err(e) => {
                tracing::error!(resource = self.name, error = %e, "Failed to load resource");
                self.state.send_modify(|state| {
                    state.loading = false;
                    state.error = Some(e.clone());
                });
                FetchOutcome::Failed(e)
            }
        }
    }
}
