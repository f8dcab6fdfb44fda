use serde::{Deserialize, Serialize};

/// Characters counted as one word when estimating speed.
pub const CHARS_PER_WORD: f64 = 5.0;

/// Floor on elapsed minutes so an instant completion reports a large but finite speed.
pub const MIN_ELAPSED_MINUTES: f64 = 0.01;

#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub enum CharOutcome {
    Correct,
    Incorrect,
    Pending,
}

/// Speed and accuracy of one finished attempt.
#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub struct Score {
    pub wpm: u32,
    pub accuracy: u8,
}

impl Score {
    pub fn dated(self, date: impl Into<String>) -> ScoreResult {
        ScoreResult {
            wpm: self.wpm,
            accuracy: self.accuracy,
            date: date.into(),
        }
    }
}

/// A score as it is shown and persisted in the history log.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreResult {
    pub wpm: u32,
    pub accuracy: u8,
    pub date: String,
}

impl ScoreResult {
    pub fn score(&self) -> Score {
        Score {
            wpm: self.wpm,
            accuracy: self.accuracy,
        }
    }
}

/// Scores a submission against its reference text.
///
/// Speed is `(submitted chars / 5) / max(elapsed_minutes, 0.01)` rounded.
/// Accuracy only credits characters equal to the reference at the same
/// position, over the reference length.
pub fn score(reference: &str, submitted: &str, elapsed_minutes: f64) -> Score {
    Score {
        wpm: words_per_minute(submitted.chars().count(), elapsed_minutes),
        accuracy: accuracy_percent(reference, submitted),
    }
}

pub fn words_per_minute(chars_typed: usize, elapsed_minutes: f64) -> u32 {
    // f64::max ignores NaN
    let minutes = elapsed_minutes.max(MIN_ELAPSED_MINUTES);
    ((chars_typed as f64 / CHARS_PER_WORD) / minutes).round() as u32
}

pub fn accuracy_percent(reference: &str, submitted: &str) -> u8 {
    let total = reference.chars().count();
    if total == 0 {
        return if submitted.is_empty() { 100 } else { 0 };
    }

    // round(100 * matches / total) in integers, halves round up
    let matches = matching_positions(reference, submitted);
    ((200 * matches + total) / (2 * total)) as u8
}

pub fn matching_positions(reference: &str, submitted: &str) -> usize {
    reference
        .chars()
        .zip(submitted.chars())
        .filter(|(expected, typed)| expected == typed)
        .count()
}

/// Per-character state of `input` against `reference`, one entry per reference character.
pub fn compare(reference: &str, input: &str) -> Vec<CharOutcome> {
    let mut typed = input.chars();
    reference
        .chars()
        .map(|expected| match typed.next() {
            Some(c) if c == expected => CharOutcome::Correct,
            Some(_) => CharOutcome::Incorrect,
            None => CharOutcome::Pending,
        })
        .collect()
}
