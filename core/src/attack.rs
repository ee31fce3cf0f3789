//! Attack-mode state machine
//!
//! Tracks the inbound connection rate and owns the process-wide
//! "under attack" flag consumed by every check. Connection handlers call
//! [`AttackTracker::record_connection`] once per admission attempt; a
//! periodic task calls [`AttackTracker::reset_tick`] every reset interval.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

use log::{debug, info};

/// Connection-rate tracker with a two-state attack flag.
///
/// Attack mode activates synchronously the moment the per-window counter
/// reaches the threshold, so it applies to the very connection that tripped
/// it. It deactivates only on a reset tick that observed a calm window;
/// never mid-window.
#[derive(Debug)]
pub struct AttackTracker {
    /// Connections seen since the last reset tick
    connection_counter: AtomicU32,

    /// Whether attack mode is currently active
    under_attack: AtomicBool,

    /// Connections per window that activate attack mode; updatable on
    /// configuration reload
    threshold: AtomicU32,
}

impl AttackTracker {
    pub fn new(threshold: u32) -> Self {
        Self {
            connection_counter: AtomicU32::new(0),
            under_attack: AtomicBool::new(false),
            threshold: AtomicU32::new(threshold),
        }
    }

    /// Record one connection attempt. Safe to call from any number of
    /// concurrent connection handlers; never blocks.
    pub fn record_connection(&self) {
        let count = self.connection_counter.fetch_add(1, Ordering::AcqRel) + 1;
        if count >= self.threshold() && !self.under_attack.swap(true, Ordering::AcqRel) {
            info!("Attack mode activated ({count} connections in the current window)");
        }
    }

    /// Whether attack mode is currently active.
    pub fn is_under_attack(&self) -> bool {
        self.under_attack.load(Ordering::Acquire)
    }

    /// Periodic window boundary: resets the counter and, if the elapsed
    /// window stayed below the threshold, deactivates attack mode.
    ///
    /// An increment racing with the swap is attributed to either window;
    /// the tracker is a heuristic, not an exact rate limiter.
    pub fn reset_tick(&self) {
        let seen = self.connection_counter.swap(0, Ordering::AcqRel);
        if seen < self.threshold() && self.under_attack.swap(false, Ordering::AcqRel) {
            info!("Attack mode deactivated ({seen} connections in the last window)");
        } else if seen >= self.threshold() {
            debug!("Attack window elapsed with {seen} connections, staying in attack mode");
        }
    }

    /// Connections recorded in the current window, for status reporting.
    pub fn current_window_count(&self) -> u32 {
        self.connection_counter.load(Ordering::Acquire)
    }

    /// Apply a reloaded threshold; takes effect from the next connection.
    pub fn set_threshold(&self, threshold: u32) {
        self.threshold.store(threshold, Ordering::Release);
    }

    fn threshold(&self) -> u32 {
        self.threshold.load(Ordering::Acquire)
    }
}
