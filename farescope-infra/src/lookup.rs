use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use farescope_core::{FlightProvider, Location, LocationQuery};
use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::app_config::LookupConfig;

#[derive(Debug, Clone, PartialEq)]
pub enum LookupState {
    Idle,
    TooShort,
    Loading,
    Ready(Vec<Location>),
    NoMatches,
    Failed(String),
}

/// Latest lookup outcome, tagged with the keystroke that produced it.
#[derive(Debug, Clone, PartialEq)]
pub struct LookupSnapshot {
    pub sequence: u64,
    pub keyword: String,
    pub state: LookupState,
}

/// Debounced type-ahead over `FlightProvider::search_locations`.
///
/// Each call to [`LocationLookup::input`] supersedes the previous one: the
/// pending timer is aborted and only the newest sequence number may publish.
/// Must be driven from inside a tokio runtime.
pub struct LocationLookup {
    provider: Arc<dyn FlightProvider>,
    delay: Duration,
    min_keyword_length: usize,
    latest: Arc<AtomicU64>,
    pending: Mutex<Option<JoinHandle<()>>>,
    state: Arc<watch::Sender<LookupSnapshot>>,
}

impl LocationLookup {
    pub fn new(provider: Arc<dyn FlightProvider>, config: &LookupConfig) -> Self {
        let (state, _) = watch::channel(LookupSnapshot {
            sequence: 0,
            keyword: String::new(),
            state: LookupState::Idle,
        });
        Self {
            provider,
            delay: Duration::from_millis(config.debounce_millis),
            min_keyword_length: config.min_keyword_length,
            latest: Arc::new(AtomicU64::new(0)),
            pending: Mutex::new(None),
            state: Arc::new(state),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<LookupSnapshot> {
        self.state.subscribe()
    }

    pub fn current(&self) -> LookupSnapshot {
        self.state.borrow().clone()
    }

    /// Records a keystroke and returns its sequence number.
    pub fn input(&self, text: &str) -> u64 {
        let sequence = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(previous) = self.pending.lock().take() {
            previous.abort();
        }

        let keyword = text.trim().to_string();
        if keyword.chars().count() < self.min_keyword_length {
            let state = if keyword.is_empty() {
                LookupState::Idle
            } else {
                LookupState::TooShort
            };
            publish(&self.state, &self.latest, sequence, &keyword, state);
            return sequence;
        }

        let provider = self.provider.clone();
        let latest = self.latest.clone();
        let state = self.state.clone();
        let delay = self.delay;

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if latest.load(Ordering::SeqCst) != sequence {
                return;
            }
            publish(&state, &latest, sequence, &keyword, LookupState::Loading);

            let result = match LocationQuery::new(Some(&keyword)) {
                Ok(query) => provider.search_locations(&query).await,
                Err(e) => Err(e),
            };
            let outcome = match result {
                Ok(locations) if locations.is_empty() => LookupState::NoMatches,
                Ok(locations) => LookupState::Ready(locations),
                Err(e) => {
                    tracing::warn!("Location lookup for '{}' failed: {}", keyword, e);
                    LookupState::Failed(e.to_string())
                }
            };
            publish(&state, &latest, sequence, &keyword, outcome);
        });

        *self.pending.lock() = Some(handle);
        sequence
    }
}

impl Drop for LocationLookup {
    fn drop(&mut self) {
        if let Some(pending) = self.pending.get_mut().take() {
            pending.abort();
        }
    }
}

/// Writes `state` only if `sequence` is still the newest keystroke.
fn publish(
    sender: &watch::Sender<LookupSnapshot>,
    latest: &AtomicU64,
    sequence: u64,
    keyword: &str,
    state: LookupState,
) -> bool {
    sender.send_if_modified(|current| {
        if latest.load(Ordering::SeqCst) != sequence || current.sequence > sequence {
            return false;
        }
        *current = LookupSnapshot {
            sequence,
            keyword: keyword.to_string(),
            state,
        };
        true
    })
}
