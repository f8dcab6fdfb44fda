use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent};

use crate::feedback::FeedbackReply;

/// Unified event type consumed by the app runner
#[derive(Clone, Debug)]
pub enum CoachEvent {
    Key(KeyEvent),
    Resize,
    Tick,
    Feedback(FeedbackReply),
}

impl From<FeedbackReply> for CoachEvent {
    fn from(reply: FeedbackReply) -> Self {
        CoachEvent::Feedback(reply)
    }
}

/// Source of app events (keyboard, resize, feedback replies)
pub trait CoachEventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<CoachEvent, RecvTimeoutError>;
}

/// Production event source: a crossterm reader thread plus any other producers
/// holding a [`Sender`] from [`CrosstermEventSource::sender`].
pub struct CrosstermEventSource {
    tx: Sender<CoachEvent>,
    rx: Receiver<CoachEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        let reader_tx = tx.clone();

        std::thread::spawn(move || loop {
            let evt = match event::read() {
                Ok(CtEvent::Key(key)) => CoachEvent::Key(key),
                Ok(CtEvent::Resize(_, _)) => CoachEvent::Resize,
                Ok(_) => continue,
                Err(_) => break,
            };
            if reader_tx.send(evt).is_err() {
                break;
            }
        });

        Self { tx, rx }
    }

    pub fn sender(&self) -> Sender<CoachEvent> {
        self.tx.clone()
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl CoachEventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<CoachEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Configurable ticker interface
pub trait Ticker: Send + Sync + 'static {
    fn interval(&self) -> Duration;
}

/// Fixed interval ticker
#[derive(Clone, Copy, Debug)]
pub struct FixedTicker {
    interval: Duration,
}

impl FixedTicker {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }
}

impl Ticker for FixedTicker {
    fn interval(&self) -> Duration {
        self.interval
    }
}

/// Channel-fed event source for tests
pub struct TestEventSource {
    rx: Receiver<CoachEvent>,
}

impl TestEventSource {
    pub fn new(rx: Receiver<CoachEvent>) -> Self {
        Self { rx }
    }
}

impl CoachEventSource for TestEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<CoachEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }
}

/// Runner that advances the application one event/tick at a time
pub struct Runner<E: CoachEventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: CoachEventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    /// Blocks up to tick interval and returns the next event, or Tick on timeout
    pub fn step(&self) -> CoachEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => CoachEvent::Tick,
        }
    }
}
