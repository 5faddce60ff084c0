//! Input coalescing for high-frequency wheel and scroll events.
//!
//! Both limiters are driven by caller-supplied instants, so the engine stays
//! synchronous and tests need no real clock.

use std::time::{Duration, Instant};

/// Leading- and trailing-edge throttle. The first event of a burst passes
/// immediately; later ones are merged and released at most once per
/// interval, and the last one is never dropped.
#[derive(Debug)]
pub struct Throttle<T> {
    interval: Duration,
    last_fire: Option<Instant>,
    pending: Option<T>,
    merge: fn(T, T) -> T,
}

impl<T> Throttle<T> {
    /// Coalesced events keep only the latest value.
    pub fn new(interval: Duration) -> Self {
        Self::merging(interval, |_, latest| latest)
    }

    /// Coalesced events are folded with `merge`, e.g. summing wheel deltas.
    pub fn merging(interval: Duration, merge: fn(T, T) -> T) -> Self {
        Self {
            interval,
            last_fire: None,
            pending: None,
            merge,
        }
    }

    /// Returns the value to apply now, or `None` if it was held back.
    pub fn submit(&mut self, value: T, now: Instant) -> Option<T> {
        let value = match self.pending.take() {
            Some(held) => (self.merge)(held, value),
            None => value,
        };
        match self.last_fire {
            Some(last) if now.saturating_duration_since(last) < self.interval => {
                self.pending = Some(value);
                None
            }
            _ => {
                self.last_fire = Some(now);
                Some(value)
            }
        }
    }

    /// Trailing edge: releases the held value once the interval has passed.
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        let last = self.last_fire?;
        if self.pending.is_some() && now.saturating_duration_since(last) >= self.interval {
            self.last_fire = Some(now);
            return self.pending.take();
        }
        None
    }

    /// When `poll` will next have something to release.
    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref()?;
        self.last_fire.map(|last| last + self.interval)
    }
}

/// Trailing-edge debounce: fires once input has been quiet for the interval.
#[derive(Debug)]
pub struct Debounce<T> {
    interval: Duration,
    pending: Option<(T, Instant)>,
}

impl<T> Debounce<T> {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            pending: None,
        }
    }

    pub fn submit(&mut self, value: T, now: Instant) {
        self.pending = Some((value, now + self.interval));
    }

    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match &self.pending {
            Some((_, due)) if now >= *due => self.pending.take().map(|(value, _)| value),
            _ => None,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(_, due)| *due)
    }
}
