//! Test doubles shared by the timezone unit tests.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::instrument::WithSubscriber;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, SubscriberExt};
use tracing_subscriber::Layer;

use super::{RegistryError, TimezoneInfo, TimezoneRegistry};

// ---

pub struct MockRegistry {
    // ---
    zone: Option<&'static str>,
    now: Option<DateTime<Utc>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last: Mutex<Option<String>>,
}

impl MockRegistry {
    // ---
    pub fn with_zone(zone: &'static str) -> Self {
        Self {
            zone: Some(zone),
            now: None,
            delay: None,
            calls: AtomicUsize::new(0),
            last: Mutex::new(None),
        }
    }

    pub fn unreachable() -> Self {
        Self {
            zone: None,
            ..Self::with_zone("UTC")
        }
    }

    pub fn delayed(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn at(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_experiment(&self) -> Option<String> {
        self.last.lock().unwrap().clone()
    }
}

#[async_trait]
impl TimezoneRegistry for MockRegistry {
    async fn get_timezone_info(&self, experiment_id: &str) -> Result<TimezoneInfo, RegistryError> {
        // ---
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last.lock().unwrap() = Some(experiment_id.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.zone {
            Some(zone) => TimezoneInfo::at(zone, self.now.unwrap_or_else(Utc::now)),
            None => Err(RegistryError::Backend("connection refused".to_string())),
        }
    }
}

// ---

struct WarnCounter(Arc<AtomicUsize>);

impl<S: Subscriber> Layer<S> for WarnCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::WARN {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

/// Drive `fut` and report how many WARN events it emitted.
pub async fn count_warnings<F: Future>(fut: F) -> (F::Output, usize) {
    // ---
    let counter = Arc::new(AtomicUsize::new(0));
    let subscriber = tracing_subscriber::registry().with(WarnCounter(counter.clone()));
    let out = fut.with_subscriber(subscriber).await;
    (out, counter.load(Ordering::SeqCst))
}
