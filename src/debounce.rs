use std::time::{Duration, Instant};

/// Trailing-edge debouncer polled on the tick cadence. `trigger` marks work
/// as wanted; `should_execute` reports true once the quiet period since the
/// last trigger has elapsed, then clears the pending flag.
#[derive(Debug)]
pub struct Debouncer {
  delay: Duration,
  last_event: Option<Instant>,
  pending: bool,
}

impl Debouncer {
  pub fn new(delay_ms: u64) -> Self {
    Self { delay: Duration::from_millis(delay_ms), last_event: None, pending: false }
  }

  pub fn trigger(&mut self) {
    self.last_event = Some(Instant::now());
    self.pending = true;
  }

  pub fn should_execute(&mut self) -> bool {
    if !self.pending {
      return false;
    }
    match self.last_event {
      Some(at) if at.elapsed() >= self.delay => {
        self.pending = false;
        true
      },
      _ => false,
    }
  }

  pub fn reset(&mut self) {
    self.pending = false;
    self.last_event = None;
  }

  pub fn is_pending(&self) -> bool {
    self.pending
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn executes_once_after_the_quiet_period() {
    let mut d = Debouncer::new(0);
    assert!(!d.should_execute());
    d.trigger();
    assert!(d.should_execute());
    assert!(!d.should_execute());
  }

  #[test]
  fn retrigger_restarts_the_window() {
    let mut d = Debouncer::new(60_000);
    d.trigger();
    assert!(d.is_pending());
    assert!(!d.should_execute());
    d.reset();
    assert!(!d.is_pending());
  }
}
