use crate::timer::{Scheduler, TimerId};
use std::time::{Duration, Instant};

pub const TOAST_LIFETIME: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub id: u64,
    pub message: String,
    timer: TimerId,
}

/// Short-lived notifications, each dismissed by its own timeout.
#[derive(Debug, Default)]
pub struct Toasts {
    next_id: u64,
    visible: Vec<Toast>,
    timers: Scheduler<u64>,
}

impl Toasts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: impl Into<String>, now: Instant) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        let timer = self.timers.schedule(now + TOAST_LIFETIME, id);
        self.visible.push(Toast {
            id,
            message: message.into(),
            timer,
        });
        id
    }

    /// Drops a toast before its timeout; its timer is cancelled.
    pub fn dismiss(&mut self, id: u64) -> bool {
        let Some(pos) = self.visible.iter().position(|t| t.id == id) else {
            return false;
        };
        let toast = self.visible.remove(pos);
        self.timers.cancel(toast.timer);
        true
    }

    pub fn tick(&mut self, now: Instant) {
        for expired in self.timers.poll(now) {
            self.visible.retain(|t| t.id != expired);
        }
    }

    pub fn visible(&self) -> &[Toast] {
        &self.visible
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }
}
