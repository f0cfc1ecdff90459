use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use crossterm::event::{self, Event as CtEvent, KeyEvent, KeyEventKind};

/// Events the typing loop reacts to.
#[derive(Clone, Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Resize,
    /// A generated challenge or coach text finished on its worker thread.
    TextReady,
    Tick,
}

/// Lets a generator thread interrupt the loop instead of waiting for the next tick.
#[derive(Clone, Debug)]
pub struct Waker {
    tx: Sender<AppEvent>,
}

impl Waker {
    pub fn new(tx: Sender<AppEvent>) -> Self {
        Self { tx }
    }

    /// Returns false once the loop has gone away.
    pub fn wake(&self) -> bool {
        self.tx.send(AppEvent::TextReady).is_ok()
    }
}

/// Source of terminal events (keyboard, resize, etc.)
pub trait EventSource: Send + 'static {
    /// Block for up to `timeout` waiting for an event.
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError>;

    /// Handle for pushing `TextReady` into this source, when it accepts one.
    fn waker(&self) -> Option<Waker> {
        None
    }
}

/// Crossterm reader thread feeding keys and resizes.
pub struct CrosstermEventSource {
    tx: Sender<AppEvent>,
    rx: Receiver<AppEvent>,
}

impl CrosstermEventSource {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        let reader_tx = tx.clone();

        std::thread::spawn(move || loop {
            match event::read() {
                // key release events would double every keystroke on some terminals
                Ok(CtEvent::Key(key)) if key.kind != KeyEventKind::Release => {
                    if reader_tx.send(AppEvent::Key(key)).is_err() {
                        break;
                    }
                }
                Ok(CtEvent::Resize(_, _)) => {
                    if reader_tx.send(AppEvent::Resize).is_err() {
                        break;
                    }
                }
                Ok(_) => {}
                Err(_) => break,
            }
        });

        Self { tx, rx }
    }
}

impl Default for CrosstermEventSource {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSource for CrosstermEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    fn waker(&self) -> Option<Waker> {
        Some(Waker::new(self.tx.clone()))
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

/// Channel-fed event source for tests and headless runs
pub struct ChannelEventSource {
    rx: Receiver<AppEvent>,
    waker: Option<Waker>,
}

impl ChannelEventSource {
    pub fn new(rx: Receiver<AppEvent>) -> Self {
        Self { rx, waker: None }
    }

    /// Generator threads will post `TextReady` through `tx`.
    pub fn with_waker(mut self, tx: Sender<AppEvent>) -> Self {
        self.waker = Some(Waker::new(tx));
        self
    }
}

impl EventSource for ChannelEventSource {
    fn recv_timeout(&self, timeout: Duration) -> Result<AppEvent, RecvTimeoutError> {
        self.rx.recv_timeout(timeout)
    }

    fn waker(&self) -> Option<Waker> {
        self.waker.clone()
    }
}

/// Runner that advances the application one event/tick at a time
pub struct Runner<E: EventSource, T: Ticker> {
    event_source: E,
    ticker: T,
}

impl<E: EventSource, T: Ticker> Runner<E, T> {
    pub fn new(event_source: E, ticker: T) -> Self {
        Self {
            event_source,
            ticker,
        }
    }

    pub fn waker(&self) -> Option<Waker> {
        self.event_source.waker()
    }

    /// Blocks up to tick interval and returns the next event, or Tick on timeout
    pub fn step(&self) -> AppEvent {
        match self.event_source.recv_timeout(self.ticker.interval()) {
            Ok(ev) => ev,
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => AppEvent::Tick,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn test_step_returns_tick_on_timeout() {
        let (_tx, rx) = mpsc::channel();
        let es = ChannelEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(1));
        let runner = Runner::new(es, ticker);

        match runner.step() {
            AppEvent::Tick => {}
            _ => panic!("expected Tick on timeout"),
        }
    }

    #[test]
    fn test_step_passes_through_events() {
        let (tx, rx) = mpsc::channel();
        tx.send(AppEvent::Resize).unwrap();
        let es = ChannelEventSource::new(rx);
        let ticker = FixedTicker::new(Duration::from_millis(10));
        let runner = Runner::new(es, ticker);

        match runner.step() {
            AppEvent::Resize => {}
            _ => panic!("expected Resize event"),
        }
    }

    #[test]
    fn test_waker_interrupts_step_before_tick() {
        let (tx, rx) = mpsc::channel();
        let es = ChannelEventSource::new(rx).with_waker(tx);
        let runner = Runner::new(es, FixedTicker::new(Duration::from_secs(30)));

        let waker = runner.waker().unwrap();
        let handle = std::thread::spawn(move || waker.wake());
        assert!(handle.join().unwrap());

        match runner.step() {
            AppEvent::TextReady => {}
            other => panic!("expected TextReady, got {other:?}"),
        }
    }

    #[test]
    fn test_plain_channel_source_has_no_waker() {
        let (_tx, rx) = mpsc::channel();
        let runner = Runner::new(
            ChannelEventSource::new(rx),
            FixedTicker::new(Duration::from_millis(1)),
        );
        assert!(runner.waker().is_none());
    }
}
