//! Application state.

use aula_core::Engine;
use std::sync::Arc;
use tokio::sync::Semaphore;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    /// Concurrency limiter: model inference is long and blocks a worker for
    /// its full duration, so admissions are bounded.
    pub request_semaphore: Arc<Semaphore>,
}

impl AppState {
    pub fn new(engine: Engine) -> Self {
        let max_concurrent = std::env::var("AULA_MAX_CONCURRENT_REQUESTS")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(8);

        Self {
            engine: Arc::new(engine),
            request_semaphore: Arc::new(Semaphore::new(max_concurrent)),
        }
    }

    /// Acquire a permit before starting model work.
    pub async fn acquire_permit(&self) -> tokio::sync::SemaphorePermit<'_> {
        self.request_semaphore
            .acquire()
            .await
            .expect("semaphore is never closed")
    }
}
