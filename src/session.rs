use std::time::Instant;

use chrono::{DateTime, Local};

use crate::catalog::Category;
use crate::metrics;

/// Where the current attempt stands, derived from its time marks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    NotStarted,
    InProgress,
    Completed,
}

/// Recorded result of one completed attempt
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryEntry {
    pub speed_cpm: f64,
    pub accuracy_pct: f64,
    pub category: Category,
    pub passage_index: usize,
    pub completed_at: DateTime<Local>,
}

#[derive(Debug, Clone)]
pub struct SessionState {
    pub category: Category,
    pub passage_index: usize,
    pub input: String,
    pub start_mark: Option<Instant>,
    pub end_mark: Option<Instant>,
    /// Bumped every time a new attempt begins, so timers armed for an
    /// earlier attempt can be told apart.
    pub attempt: u64,
    // Cumulative across categories
    pub history: Vec<HistoryEntry>,
    pub average_speed: Option<f64>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new(Category::default())
    }
}

impl SessionState {
    pub fn new(category: Category) -> Self {
        Self {
            category,
            passage_index: 0,
            input: String::new(),
            start_mark: None,
            end_mark: None,
            attempt: 0,
            history: Vec::new(),
            average_speed: None,
        }
    }

    pub fn phase(&self) -> Phase {
        match (self.start_mark, self.end_mark) {
            (_, Some(_)) => Phase::Completed,
            (Some(_), None) => Phase::InProgress,
            (None, None) => Phase::NotStarted,
        }
    }

    pub fn is_completed(&self) -> bool {
        self.phase() == Phase::Completed
    }

    /// Drop the buffer and marks and begin a fresh attempt
    pub fn clear_attempt(&mut self) {
        self.input.clear();
        self.start_mark = None;
        self.end_mark = None;
        self.attempt += 1;
    }

    pub fn record(&mut self, entry: HistoryEntry) {
        self.history.push(entry);
        let speeds: Vec<f64> = self.history.iter().map(|h| h.speed_cpm).collect();
        self.average_speed = metrics::mean(&speeds);
    }
}
