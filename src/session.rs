use crate::feedback::{summary_text, FeedbackReply, FeedbackRequest, FeedbackSink};
use crate::history::{HistoryLog, HistoryStore};
use crate::samples::SampleProvider;
use crate::scoring::{compare, score, CharOutcome, ScoreResult};
use crate::timer::{elapsed_minutes_since, Clock, SessionTimer, SystemClock};
use chrono::{DateTime, Local};
use std::time::SystemTime;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    InProgress,
    Finished,
}

/// Coaching message state for the current attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedbackState {
    Idle,
    Loading,
    Ready(String),
}

/// What an input event did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    Ignored,
    Started,
    Progress,
    Finished(ScoreResult),
}

/// One typing attempt at a time, plus the history that outlives attempts.
pub struct TypingSession {
    samples: SampleProvider,
    clock: Box<dyn Clock>,
    history_store: HistoryStore,
    history: HistoryLog,
    feedback_sink: Box<dyn FeedbackSink>,
    reference: String,
    reference_len: usize,
    input: String,
    timer: SessionTimer,
    phase: Phase,
    result: Option<ScoreResult>,
    feedback: FeedbackState,
    generation: u64,
}

impl TypingSession {
    /// Loads history and draws the first reference text.
    pub fn new(
        mut samples: SampleProvider,
        history_store: HistoryStore,
        feedback_sink: Box<dyn FeedbackSink>,
    ) -> Self {
        let reference = samples.next();
        let history = history_store.load();

        Self {
            samples,
            clock: Box::new(SystemClock),
            history_store,
            history,
            feedback_sink,
            reference_len: reference.chars().count(),
            reference,
            input: String::new(),
            timer: SessionTimer::new(),
            phase: Phase::Idle,
            result: None,
            feedback: FeedbackState::Idle,
            generation: 0,
        }
    }

    pub fn with_clock(mut self, clock: Box<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Finished
    }

    pub fn started_at(&self) -> Option<SystemTime> {
        self.timer.started_at()
    }

    pub fn result(&self) -> Option<&ScoreResult> {
        self.result.as_ref()
    }

    pub fn feedback(&self) -> &FeedbackState {
        &self.feedback
    }

    pub fn history(&self) -> &HistoryLog {
        &self.history
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Seconds since the first keystroke, frozen once the attempt is over.
    pub fn elapsed_secs(&self) -> f64 {
        match (self.timer.started_at(), self.phase) {
            (Some(start), Phase::InProgress) => self
                .clock
                .now()
                .duration_since(start)
                .unwrap_or_default()
                .as_secs_f64(),
            _ => 0.0,
        }
    }

    /// Live per-character comparison of the input against the reference.
    pub fn comparison(&self) -> Vec<CharOutcome> {
        compare(&self.reference, &self.input)
    }

    /// Replaces the whole input, as a text field change would.
    pub fn set_input(&mut self, value: &str) -> Transition {
        if self.phase == Phase::Finished {
            return Transition::Ignored;
        }

        let value: String = value.chars().take(self.reference_len).collect();
        let typed = value.chars().count();

        let transition = match self.phase {
            Phase::Idle if typed == 0 => return Transition::Ignored,
            Phase::Idle => {
                let start = self.timer.mark_start(self.clock.now());
                debug!(generation = self.generation, ?start, "typing started");
                self.phase = Phase::InProgress;
                Transition::Started
            }
            _ => Transition::Progress,
        };

        self.input = value;

        if typed == self.reference_len {
            return Transition::Finished(self.finish());
        }
        transition
    }

    pub fn write(&mut self, c: char) -> Transition {
        let mut value = self.input.clone();
        value.push(c);
        self.set_input(&value)
    }

    pub fn backspace(&mut self) -> Transition {
        if self.input.is_empty() {
            return Transition::Ignored;
        }
        let mut value = self.input.clone();
        value.pop();
        self.set_input(&value)
    }

    fn finish(&mut self) -> ScoreResult {
        let end = self.clock.now();
        let start = self.timer.started_at().unwrap_or(end);
        let minutes = elapsed_minutes_since(start, end);

        let result = score(&self.reference, &self.input, minutes).dated(date_label(end));
        info!(
            generation = self.generation,
            wpm = result.wpm,
            accuracy = result.accuracy,
            "typing test finished"
        );

        self.history = self.history.append(result.clone());
        self.history_store.persist(&self.history);

        self.phase = Phase::Finished;
        self.result = Some(result.clone());
        self.feedback = FeedbackState::Loading;
        self.feedback_sink.submit(FeedbackRequest {
            generation: self.generation,
            summary: summary_text(&result.score(), &self.reference),
        });

        result
    }

    /// Stores a coaching reply if it belongs to the current finished attempt.
    pub fn apply_feedback(&mut self, reply: FeedbackReply) -> bool {
        if reply.generation != self.generation || self.phase != Phase::Finished {
            debug!(
                reply_generation = reply.generation,
                current_generation = self.generation,
                "dropping stale feedback"
            );
            return false;
        }

        self.feedback = FeedbackState::Ready(reply.message);
        true
    }

    /// Starts over with a freshly drawn reference text.
    pub fn restart(&mut self) {
        let reference = self.samples.next();
        self.begin(reference);
    }

    /// Starts over on the same reference text.
    pub fn retry(&mut self) {
        let reference = self.reference.clone();
        self.begin(reference);
    }

    fn begin(&mut self, reference: String) {
        self.reference_len = reference.chars().count();
        self.reference = reference;
        self.input.clear();
        self.timer.reset();
        self.phase = Phase::Idle;
        self.result = None;
        self.feedback = FeedbackState::Idle;
        self.generation += 1;
    }
}

impl std::fmt::Debug for TypingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TypingSession")
            .field("reference", &self.reference)
            .field("input", &self.input)
            .field("phase", &self.phase)
            .field("generation", &self.generation)
            .field("result", &self.result)
            .field("feedback", &self.feedback)
            .finish()
    }
}

/// Calendar date of `at` in local time, `M/D/YYYY`.
pub fn date_label(at: SystemTime) -> String {
    DateTime::<Local>::from(at).format("%-m/%-d/%Y").to_string()
}
