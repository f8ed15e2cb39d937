//! Pure derivations of typing progress from a target passage, the typed
//! buffer and the attempt's time marks.
//!
//! Comparison is positional over chars. Nothing here can fail: missing
//! prerequisites yield `None` (or `0.0` for accuracy on an empty buffer).

use std::time::Instant;

/// How a single target character should be rendered
#[derive(Clone, Debug, Copy, PartialEq, Eq)]
pub enum CharClass {
    Untyped,
    Correct,
    Incorrect,
}

/// Positions where the typed char matches the target; anything past the
/// shorter of the two never counts.
pub fn correct_count(target: &str, input: &str) -> usize {
    target
        .chars()
        .zip(input.chars())
        .filter(|(expected, typed)| expected == typed)
        .count()
}

/// Exact equality, length included. A prefix is not complete.
pub fn is_completed(target: &str, input: &str) -> bool {
    target == input
}

pub fn elapsed_secs(start: Option<Instant>, end: Option<Instant>) -> Option<f64> {
    match (start, end) {
        (Some(start), Some(end)) => {
            Some(end.saturating_duration_since(start).as_millis() as f64 / 1000.0)
        }
        _ => None,
    }
}

/// Characters per minute over the whole passage, unrounded
pub fn speed_cpm(target_len: usize, elapsed_secs: Option<f64>) -> Option<f64> {
    match elapsed_secs {
        Some(secs) if secs > 0.0 => Some(target_len as f64 / secs * 60.0),
        _ => None,
    }
}

/// Share of typed characters that are correct, rounded to one decimal.
/// The denominator is what was typed, so over-typing lowers accuracy.
pub fn accuracy_pct(target: &str, input: &str) -> f64 {
    let typed = input.chars().count();
    if typed == 0 {
        return 0.0;
    }
    round_tenth(correct_count(target, input) as f64 / typed as f64 * 100.0)
}

pub fn classify(target: &str, input: &str) -> Vec<CharClass> {
    let mut typed = input.chars();
    target
        .chars()
        .map(|expected| match typed.next() {
            None => CharClass::Untyped,
            Some(c) if c == expected => CharClass::Correct,
            Some(_) => CharClass::Incorrect,
        })
        .collect()
}

pub fn round_tenth(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn mean(data: &[f64]) -> Option<f64> {
    let sum = data.iter().sum::<f64>();
    let count = data.len();

    match count {
        positive if positive > 0 => Some(sum / count as f64),
        _ => None,
    }
}

/// Readouts for the current attempt, recomputed on every render
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub typed: usize,
    pub total: usize,
    pub correct: usize,
    pub accuracy_pct: f64,
    pub completed: bool,
    pub elapsed_secs: Option<f64>,
    /// Rounded to one decimal
    pub speed_cpm: Option<f64>,
}

impl Snapshot {
    pub fn compute(
        target: &str,
        input: &str,
        start: Option<Instant>,
        end: Option<Instant>,
    ) -> Self {
        let total = target.chars().count();
        let elapsed = elapsed_secs(start, end);

        Self {
            typed: input.chars().count(),
            total,
            correct: correct_count(target, input),
            accuracy_pct: accuracy_pct(target, input),
            completed: is_completed(target, input),
            elapsed_secs: elapsed,
            speed_cpm: speed_cpm(total, elapsed).map(round_tenth),
        }
    }
}
