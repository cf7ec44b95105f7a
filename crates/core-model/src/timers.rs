//! Deadline timers driven by `tick`.
//!
//! A display never sleeps or spawns; the host calls `tick` whenever it
//! likes (the demo binary does so from a tokio interval) and the display
//! fires whatever expired. `next_deadline` tells a host how long it may
//! sleep. Time is read through [`Clock`] so tests advance it by hand.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

pub trait Clock: Send {
    fn now(&self) -> Instant;
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Clone, Debug)]
pub struct ManualClock {
    base: Instant,
    offset_ms: Arc<AtomicU64>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            base: Instant::now(),
            offset_ms: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.offset_ms.fetch_add(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        self.base + Duration::from_millis(self.offset_ms.load(Ordering::SeqCst))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TimerKind {
    TextBlink,
    CursorBlink,
    /// Re-arms the bell after a ring.
    BellEnable,
    /// Restores the swapped colors of a visual bell.
    VisualBell,
    SizeHint,
    TripleClick,
}

impl TimerKind {
    const ALL: [TimerKind; 6] = [
        TimerKind::TextBlink,
        TimerKind::CursorBlink,
        TimerKind::BellEnable,
        TimerKind::VisualBell,
        TimerKind::SizeHint,
        TimerKind::TripleClick,
    ];

    fn slot(self) -> usize {
        self as usize
    }
}

#[derive(Clone, Copy, Debug)]
struct Deadline {
    at: Instant,
    period: Option<Duration>,
}

#[derive(Debug, Default)]
pub struct Timers {
    slots: [Option<Deadline>; 6],
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// (Re)start a repeating timer; the first expiry is one period away.
    pub fn start_periodic(&mut self, kind: TimerKind, period_ms: u64, now: Instant) {
        let period = Duration::from_millis(period_ms.max(1));
        self.slots[kind.slot()] = Some(Deadline {
            at: now + period,
            period: Some(period),
        });
    }

    /// (Re)start a one-shot timer.
    pub fn start_once(&mut self, kind: TimerKind, delay_ms: u64, now: Instant) {
        self.slots[kind.slot()] = Some(Deadline {
            at: now + Duration::from_millis(delay_ms),
            period: None,
        });
    }

    pub fn stop(&mut self, kind: TimerKind) {
        self.slots[kind.slot()] = None;
    }

    pub fn is_active(&self, kind: TimerKind) -> bool {
        self.slots[kind.slot()].is_some()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.slots.iter().flatten().map(|d| d.at).min()
    }

    /// Timers due at `now`, in declaration order. A periodic timer fires once
    /// per call however many periods were missed and is rescheduled past
    /// `now`; one-shots are disarmed.
    pub fn expire(&mut self, now: Instant) -> Vec<TimerKind> {
        let mut fired = Vec::new();
        for kind in TimerKind::ALL {
            let slot = &mut self.slots[kind.slot()];
            let Some(deadline) = slot else { continue };
            if deadline.at > now {
                continue;
            }
            fired.push(kind);
            let period = deadline.period;
            match period {
                Some(period) => {
                    while deadline.at <= now {
                        deadline.at += period;
                    }
                }
                None => *slot = None,
            }
        }
        fired
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_shot_fires_once() {
        let clock = ManualClock::new();
        let mut t = Timers::new();
        t.start_once(TimerKind::BellEnable, 500, clock.now());
        clock.advance(499);
        assert!(t.expire(clock.now()).is_empty());
        clock.advance(1);
        assert_eq!(t.expire(clock.now()), vec![TimerKind::BellEnable]);
        assert!(!t.is_active(TimerKind::BellEnable));
        assert_eq!(t.next_deadline(), None);
    }

    #[test]
    fn periodic_skips_missed_periods() {
        let clock = ManualClock::new();
        let mut t = Timers::new();
        let start = clock.now();
        t.start_periodic(TimerKind::TextBlink, 100, start);
        clock.advance(350);
        assert_eq!(t.expire(clock.now()), vec![TimerKind::TextBlink]);
        assert_eq!(t.next_deadline(), Some(start + Duration::from_millis(400)));
        t.stop(TimerKind::TextBlink);
        assert_eq!(t.next_deadline(), None);
    }

    #[test]
    fn next_deadline_is_earliest() {
        let clock = ManualClock::new();
        let now = clock.now();
        let mut t = Timers::new();
        t.start_periodic(TimerKind::CursorBlink, 1000, now);
        t.start_once(TimerKind::TripleClick, 400, now);
        assert_eq!(t.next_deadline(), Some(now + Duration::from_millis(400)));
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let a = ManualClock::new();
        let b = a.clone();
        let before = b.now();
        a.advance(20);
        assert_eq!(b.now() - before, Duration::from_millis(20));
    }
}
