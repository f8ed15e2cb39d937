use std::time::{Duration, Instant};

/// What a timer does when it fires
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKind {
    /// Move to the next passage, but only if still on the given attempt
    AutoAdvance { attempt: u64 },
    /// Hand keyboard focus back to the text input
    Focus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

#[derive(Debug)]
struct Pending {
    id: TimerId,
    kind: TimerKind,
    due_at: Instant,
}

/// One-shot, cancellable timers polled from the event loop tick
#[derive(Debug, Default)]
pub struct Scheduler {
    next_id: u64,
    pending: Vec<Pending>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schedule(&mut self, kind: TimerKind, delay: Duration, now: Instant) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.pending.push(Pending {
            id,
            kind,
            due_at: now + delay,
        });
        id
    }

    /// Drop a pending timer; false if it already fired or was cancelled
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.pending.len();
        self.pending.retain(|p| p.id != id);
        self.pending.len() != before
    }

    /// Remove and return timers due at `now`, earliest first
    pub fn due(&mut self, now: Instant) -> Vec<TimerKind> {
        let mut fired: Vec<Pending> = Vec::new();
        let mut i = 0;
        while i < self.pending.len() {
            if self.pending[i].due_at <= now {
                fired.push(self.pending.remove(i));
            } else {
                i += 1;
            }
        }
        fired.sort_by_key(|p| (p.due_at, p.id.0));
        fired.into_iter().map(|p| p.kind).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
