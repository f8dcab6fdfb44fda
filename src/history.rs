use crate::scoring::ScoreResult;
use crate::store::{KeyValueStore, StoreError};
use tracing::{debug, warn};

/// Most results kept in the history log.
pub const MAX_HISTORY: usize = 5;

/// Storage key the history list lives under.
pub const HISTORY_KEY: &str = "mentorbridge_typing_history";

/// Past results, most recent first, never longer than [`MAX_HISTORY`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryLog {
    entries: Vec<ScoreResult>,
}

impl HistoryLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a log from stored entries (most recent first), keeping the newest ones.
    pub fn from_entries(mut entries: Vec<ScoreResult>) -> Self {
        entries.truncate(MAX_HISTORY);
        Self { entries }
    }

    /// A new log with `result` in front and the oldest entry evicted past capacity.
    pub fn append(&self, result: ScoreResult) -> HistoryLog {
        let mut entries = Vec::with_capacity(MAX_HISTORY);
        entries.push(result);
        entries.extend(self.entries.iter().take(MAX_HISTORY - 1).cloned());
        Self { entries }
    }

    pub fn entries(&self) -> &[ScoreResult] {
        &self.entries
    }

    pub fn latest(&self) -> Option<&ScoreResult> {
        self.entries.first()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ScoreResult> {
        self.entries.iter()
    }

    pub fn average_wpm(&self) -> Option<f64> {
        mean(self.entries.iter().map(|r| r.wpm as f64))
    }

    pub fn average_accuracy(&self) -> Option<f64> {
        mean(self.entries.iter().map(|r| r.accuracy as f64))
    }
}

impl<'a> IntoIterator for &'a HistoryLog {
    type Item = &'a ScoreResult;
    type IntoIter = std::slice::Iter<'a, ScoreResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    match count {
        positive if positive > 0 => Some(sum / count as f64),
        _ => None,
    }
}

/// Loads and saves the history log as one JSON list under [`HISTORY_KEY`].
pub struct HistoryStore {
    store: Box<dyn KeyValueStore>,
}

impl HistoryStore {
    pub fn new(store: Box<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// The stored log, or an empty one when nothing usable is stored.
    pub fn load(&self) -> HistoryLog {
        let raw = match self.store.get(HISTORY_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return HistoryLog::new(),
            Err(e) => {
                warn!(error = %e, "history unavailable, starting empty");
                return HistoryLog::new();
            }
        };

        match serde_json::from_str::<Vec<ScoreResult>>(&raw) {
            Ok(entries) => {
                debug!(entries = entries.len(), "loaded typing history");
                HistoryLog::from_entries(entries)
            }
            Err(e) => {
                warn!(error = %e, "stored history is corrupt, starting empty");
                HistoryLog::new()
            }
        }
    }

    /// Writes the whole log. Failures are logged and otherwise ignored.
    pub fn persist(&self, log: &HistoryLog) {
        if let Err(e) = self.try_persist(log) {
            warn!(error = %e, "failed to persist typing history");
        }
    }

    pub fn try_persist(&self, log: &HistoryLog) -> Result<(), StoreError> {
        let data = serde_json::to_string(log.entries())
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        self.store.set(HISTORY_KEY, &data)
    }

    pub fn clear(&self) -> Result<(), StoreError> {
        self.store.delete(HISTORY_KEY)
    }
}

impl std::fmt::Debug for HistoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HistoryStore")
            .field("key", &HISTORY_KEY)
            .finish()
    }
}
