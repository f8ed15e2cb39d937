//! The typing session state machine.
//!
//! [`transition`] is a pure reducer: it mutates a [`SessionState`] in
//! response to one [`Event`] and returns the side effects the caller has to
//! carry out. [`SessionController`] is that caller; it owns the timers and
//! the completion notifier.

use std::time::{Duration, Instant};

use chrono::Local;
use tracing::{debug, info};

use crate::catalog::{Catalog, Category, Passage};
use crate::metrics::{self, Snapshot};
use crate::notify::Notifier;
use crate::scheduler::{Scheduler, TimerId, TimerKind};
use crate::session::{HistoryEntry, Phase, SessionState};

pub const AUTO_ADVANCE_DELAY: Duration = Duration::from_secs(2);
pub const RESET_FOCUS_DELAY: Duration = Duration::ZERO;
pub const ADVANCE_FOCUS_DELAY: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// The whole input buffer after a keystroke, deletion or paste
    Edit(String),
    Reset,
    Advance,
    SwitchCategory(Category),
    /// Delayed advance armed when `attempt` was completed
    AutoAdvance { attempt: u64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    Notify,
    ScheduleAutoAdvance { attempt: u64, delay: Duration },
    CancelAutoAdvance,
    Focus { delay: Duration },
}

pub fn transition(
    state: &mut SessionState,
    catalog: &Catalog,
    event: Event,
    now: Instant,
) -> Vec<Effect> {
    match event {
        Event::Edit(value) => edit(state, catalog, value, now),
        Event::Reset => {
            state.clear_attempt();
            debug!(attempt = state.attempt, "attempt reset");
            vec![
                Effect::CancelAutoAdvance,
                Effect::Focus {
                    delay: RESET_FOCUS_DELAY,
                },
            ]
        }
        Event::Advance => advance(state, catalog),
        Event::SwitchCategory(category) => {
            state.category = category;
            state.passage_index = 0;
            state.clear_attempt();
            debug!(%category, "category switched");
            vec![Effect::CancelAutoAdvance]
        }
        Event::AutoAdvance { attempt } => {
            if attempt != state.attempt || !state.is_completed() {
                debug!(
                    armed_for = attempt,
                    current = state.attempt,
                    "stale auto-advance ignored"
                );
                return vec![];
            }
            advance(state, catalog)
        }
    }
}

fn edit(state: &mut SessionState, catalog: &Catalog, value: String, now: Instant) -> Vec<Effect> {
    if state.is_completed() {
        debug!("edit rejected, attempt already completed");
        return vec![];
    }
    let Some(target) = catalog.passage(state.category, state.passage_index) else {
        return vec![];
    };

    let mut effects = Vec::new();

    if state.start_mark.is_none() && !value.is_empty() {
        state.start_mark = Some(now);
    }

    if metrics::is_completed(&target.text, &value) {
        state.end_mark = Some(now);
        effects.push(Effect::Notify);

        let elapsed = metrics::elapsed_secs(state.start_mark, state.end_mark);
        let accuracy_pct = metrics::accuracy_pct(&target.text, &value);
        match metrics::speed_cpm(target.char_len(), elapsed) {
            Some(speed) => {
                let speed_cpm = metrics::round_tenth(speed);
                info!(
                    category = %state.category,
                    passage = state.passage_index,
                    speed_cpm,
                    accuracy_pct,
                    "attempt completed"
                );
                state.record(HistoryEntry {
                    speed_cpm,
                    accuracy_pct,
                    category: state.category,
                    passage_index: state.passage_index,
                    completed_at: Local::now(),
                });
            }
            None => {
                debug!("attempt completed without measurable time, not recorded");
            }
        }

        if !catalog.is_last(state.category, state.passage_index) {
            effects.push(Effect::ScheduleAutoAdvance {
                attempt: state.attempt,
                delay: AUTO_ADVANCE_DELAY,
            });
        }
    }

    state.input = value;
    effects
}

fn advance(state: &mut SessionState, catalog: &Catalog) -> Vec<Effect> {
    if catalog.is_last(state.category, state.passage_index) {
        debug!(passage = state.passage_index, "already at the last passage");
        return vec![];
    }
    state.passage_index += 1;
    state.clear_attempt();
    debug!(passage = state.passage_index, "advanced");
    vec![
        Effect::CancelAutoAdvance,
        Effect::Focus {
            delay: ADVANCE_FOCUS_DELAY,
        },
    ]
}

/// What a tick changed, so the caller knows whether to redraw or refocus
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    pub advanced: bool,
    pub focus_input: bool,
}

/// Runs the state machine and carries out its effects
pub struct SessionController<N: Notifier> {
    state: SessionState,
    catalog: Catalog,
    notifier: N,
    scheduler: Scheduler,
    // ids are never reused, so a token for an already fired timer is inert
    auto_advance: Option<TimerId>,
    focus_timer: Option<TimerId>,
    focus_requested: bool,
}

impl<N: Notifier> SessionController<N> {
    pub fn new(catalog: Catalog, category: Category, notifier: N) -> Self {
        Self {
            state: SessionState::new(category),
            catalog,
            notifier,
            scheduler: Scheduler::new(),
            auto_advance: None,
            focus_timer: None,
            focus_requested: false,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    pub fn phase(&self) -> Phase {
        self.state.phase()
    }

    pub fn current_passage(&self) -> &Passage {
        // passage_index only ever moves within the category's bounds
        &self.catalog.passages(self.state.category)[self.state.passage_index]
    }

    pub fn is_last_passage(&self) -> bool {
        self.catalog
            .is_last(self.state.category, self.state.passage_index)
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::compute(
            &self.current_passage().text,
            &self.state.input,
            self.state.start_mark,
            self.state.end_mark,
        )
    }

    pub fn dispatch(&mut self, event: Event, now: Instant) {
        let effects = transition(&mut self.state, &self.catalog, event, now);
        for effect in effects {
            self.apply(effect, now);
        }
    }

    pub fn edit(&mut self, value: String, now: Instant) {
        self.dispatch(Event::Edit(value), now)
    }

    pub fn reset(&mut self, now: Instant) {
        self.dispatch(Event::Reset, now)
    }

    pub fn advance(&mut self, now: Instant) {
        self.dispatch(Event::Advance, now)
    }

    pub fn switch_category(&mut self, category: Category, now: Instant) {
        self.dispatch(Event::SwitchCategory(category), now)
    }

    /// Fire whatever timers are due at `now`
    pub fn tick(&mut self, now: Instant) -> TickOutcome {
        let mut outcome = TickOutcome::default();
        for timer in self.scheduler.due(now) {
            match timer {
                TimerKind::AutoAdvance { attempt } => {
                    let before = self.state.passage_index;
                    self.dispatch(Event::AutoAdvance { attempt }, now);
                    outcome.advanced |= self.state.passage_index != before;
                }
                TimerKind::Focus => self.focus_requested = true,
            }
        }
        outcome.focus_input = self.take_focus_request();
        outcome
    }

    pub fn take_focus_request(&mut self) -> bool {
        std::mem::take(&mut self.focus_requested)
    }

    /// Drop pending timers so nothing fires against a torn down session
    pub fn shutdown(&mut self) {
        self.scheduler.clear();
        self.auto_advance = None;
        self.focus_timer = None;
    }

    fn apply(&mut self, effect: Effect, now: Instant) {
        match effect {
            Effect::Notify => {
                if let Err(e) = self.notifier.notify() {
                    debug!(error = %e, "completion notification failed");
                }
            }
            Effect::ScheduleAutoAdvance { attempt, delay } => {
                self.cancel_auto_advance();
                self.auto_advance = Some(self.scheduler.schedule(
                    TimerKind::AutoAdvance { attempt },
                    delay,
                    now,
                ));
            }
            Effect::CancelAutoAdvance => self.cancel_auto_advance(),
            Effect::Focus { delay } => {
                if let Some(id) = self.focus_timer.take() {
                    self.scheduler.cancel(id);
                }
                self.focus_timer = Some(self.scheduler.schedule(TimerKind::Focus, delay, now));
            }
        }
    }

    fn cancel_auto_advance(&mut self) {
        if let Some(id) = self.auto_advance.take() {
            self.scheduler.cancel(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::RecordingNotifier;
    use assert_matches::assert_matches;

    fn passage(text: &str) -> Passage {
        Passage {
            text: text.to_string(),
            source: "test".to_string(),
        }
    }

    fn small_catalog() -> Catalog {
        Catalog::from_passages(
            vec![passage("ab"), passage("cd")],
            vec![passage("xy")],
        )
        .unwrap()
    }

    fn controller() -> SessionController<RecordingNotifier> {
        SessionController::new(
            small_catalog(),
            Category::Chinese,
            RecordingNotifier::default(),
        )
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_first_edit_stamps_start() {
        let catalog = small_catalog();
        let mut state = SessionState::default();
        let t0 = Instant::now();

        let effects = transition(&mut state, &catalog, Event::Edit("a".into()), t0);

        assert!(effects.is_empty());
        assert_eq!(state.start_mark, Some(t0));
        assert_eq!(state.phase(), Phase::InProgress);
        assert_eq!(state.input, "a");
    }

    #[test]
    fn test_empty_edit_does_not_start() {
        let catalog = small_catalog();
        let mut state = SessionState::default();

        transition(&mut state, &catalog, Event::Edit(String::new()), Instant::now());

        assert_eq!(state.phase(), Phase::NotStarted);
    }

    #[test]
    fn test_start_mark_stamped_once() {
        let catalog = small_catalog();
        let mut state = SessionState::default();
        let t0 = Instant::now();

        transition(&mut state, &catalog, Event::Edit("a".into()), t0);
        transition(&mut state, &catalog, Event::Edit("ax".into()), t0 + ms(10));
        transition(&mut state, &catalog, Event::Edit(String::new()), t0 + ms(20));
        transition(&mut state, &catalog, Event::Edit("a".into()), t0 + ms(30));

        assert_eq!(state.start_mark, Some(t0));
        assert_eq!(state.phase(), Phase::InProgress);
    }

    #[test]
    fn test_scenario_ab() {
        let catalog = small_catalog();
        let mut state = SessionState::default();
        let t0 = Instant::now();

        transition(&mut state, &catalog, Event::Edit("a".into()), t0);
        let snap = Snapshot::compute("ab", &state.input, state.start_mark, state.end_mark);
        assert_eq!((snap.correct, snap.accuracy_pct, snap.completed), (1, 100.0, false));

        transition(&mut state, &catalog, Event::Edit("ax".into()), t0 + ms(500));
        let snap = Snapshot::compute("ab", &state.input, state.start_mark, state.end_mark);
        assert_eq!((snap.correct, snap.accuracy_pct, snap.completed), (1, 50.0, false));

        let effects = transition(&mut state, &catalog, Event::Edit("ab".into()), t0 + ms(1000));
        let snap = Snapshot::compute("ab", &state.input, state.start_mark, state.end_mark);
        assert_eq!((snap.correct, snap.accuracy_pct, snap.completed), (2, 100.0, true));

        assert_eq!(state.end_mark, Some(t0 + ms(1000)));
        assert_eq!(state.history.len(), 1);
        assert_eq!(state.history[0].speed_cpm, 120.0);
        assert_eq!(state.history[0].accuracy_pct, 100.0);
        assert_eq!(state.average_speed, Some(120.0));
        assert_eq!(
            effects,
            vec![
                Effect::Notify,
                Effect::ScheduleAutoAdvance {
                    attempt: 0,
                    delay: AUTO_ADVANCE_DELAY
                }
            ]
        );
    }

    #[test]
    fn test_edits_rejected_once_completed() {
        let catalog = small_catalog();
        let mut state = SessionState::default();
        let t0 = Instant::now();

        transition(&mut state, &catalog, Event::Edit("a".into()), t0);
        transition(&mut state, &catalog, Event::Edit("ab".into()), t0 + ms(100));
        let effects = transition(&mut state, &catalog, Event::Edit("abc".into()), t0 + ms(200));

        assert!(effects.is_empty());
        assert_eq!(state.input, "ab");
        assert_eq!(state.end_mark, Some(t0 + ms(100)));
        assert_eq!(state.start_mark, Some(t0));
        assert_eq!(state.history.len(), 1);
    }

    #[test]
    fn test_paste_whole_passage_in_one_edit() {
        let catalog = small_catalog();
        let mut state = SessionState::default();
        let t0 = Instant::now();

        let effects = transition(&mut state, &catalog, Event::Edit("ab".into()), t0);

        assert!(state.is_completed());
        assert_eq!(state.start_mark, state.end_mark);
        // zero elapsed time has no speed, so nothing is recorded
        assert!(state.history.is_empty());
        assert_eq!(state.average_speed, None);
        assert_matches!(effects.as_slice(), [Effect::Notify, Effect::ScheduleAutoAdvance { .. }]);
    }

    #[test]
    fn test_completion_on_last_passage_does_not_schedule() {
        let catalog = small_catalog();
        let mut state = SessionState::new(Category::English);
        let t0 = Instant::now();

        transition(&mut state, &catalog, Event::Edit("x".into()), t0);
        let effects = transition(&mut state, &catalog, Event::Edit("xy".into()), t0 + ms(600));

        assert_eq!(effects, vec![Effect::Notify]);
        assert!(state.is_completed());
    }

    #[test]
    fn test_reset_mid_attempt() {
        let catalog = small_catalog();
        let mut state = SessionState::default();
        let t0 = Instant::now();

        transition(&mut state, &catalog, Event::Edit("a".into()), t0);
        let effects = transition(&mut state, &catalog, Event::Reset, t0 + ms(50));

        assert!(state.input.is_empty());
        assert_eq!(state.phase(), Phase::NotStarted);
        assert!(state.history.is_empty());
        assert_eq!(state.passage_index, 0);
        assert_eq!(
            effects,
            vec![
                Effect::CancelAutoAdvance,
                Effect::Focus {
                    delay: RESET_FOCUS_DELAY
                }
            ]
        );
    }

    #[test]
    fn test_advance_from_last_is_noop() {
        let catalog = small_catalog();
        let mut state = SessionState::new(Category::English);
        state.input.push('x');

        let effects = transition(&mut state, &catalog, Event::Advance, Instant::now());

        assert!(effects.is_empty());
        assert_eq!(state.passage_index, 0);
        assert_eq!(state.input, "x");
    }

    #[test]
    fn test_advance_clears_attempt() {
        let catalog = small_catalog();
        let mut state = SessionState::default();
        let t0 = Instant::now();
        transition(&mut state, &catalog, Event::Edit("a".into()), t0);

        let effects = transition(&mut state, &catalog, Event::Advance, t0 + ms(10));

        assert_eq!(state.passage_index, 1);
        assert_eq!(state.phase(), Phase::NotStarted);
        assert!(state.input.is_empty());
        assert_matches!(effects.as_slice(), [Effect::CancelAutoAdvance, Effect::Focus { .. }]);
    }

    #[test]
    fn test_switch_category_keeps_history() {
        let catalog = small_catalog();
        let mut state = SessionState::default();
        let t0 = Instant::now();
        transition(&mut state, &catalog, Event::Edit("a".into()), t0);
        transition(&mut state, &catalog, Event::Edit("ab".into()), t0 + ms(100));
        transition(&mut state, &catalog, Event::Advance, t0 + ms(200));
        transition(&mut state, &catalog, Event::Edit("c".into()), t0 + ms(300));

        transition(
            &mut state,
            &catalog,
            Event::SwitchCategory(Category::English),
            t0 + ms(400),
        );

        assert_eq!(state.category, Category::English);
        assert_eq!(state.passage_index, 0);
        assert!(state.input.is_empty());
        assert_eq!(state.phase(), Phase::NotStarted);
        assert_eq!(state.history.len(), 1);
    }

    #[test]
    fn test_stale_auto_advance_ignored() {
        let catalog = small_catalog();
        let mut state = SessionState::default();
        let t0 = Instant::now();
        transition(&mut state, &catalog, Event::Edit("a".into()), t0);
        transition(&mut state, &catalog, Event::Edit("ab".into()), t0 + ms(100));
        let armed = state.attempt;
        transition(&mut state, &catalog, Event::Reset, t0 + ms(200));

        let effects = transition(
            &mut state,
            &catalog,
            Event::AutoAdvance { attempt: armed },
            t0 + ms(2100),
        );

        assert!(effects.is_empty());
        assert_eq!(state.passage_index, 0);
    }

    #[test]
    fn test_controller_auto_advances_after_delay() {
        let mut c = controller();
        let t0 = Instant::now();

        c.edit("a".into(), t0);
        c.edit("ab".into(), t0 + ms(1000));
        assert_eq!(c.notifier().calls, 1);
        assert_eq!(c.scheduler().len(), 1);

        assert_eq!(c.tick(t0 + ms(2999)), TickOutcome::default());
        assert_eq!(c.state().passage_index, 0);

        let outcome = c.tick(t0 + ms(3000));
        assert!(outcome.advanced);
        assert_eq!(c.state().passage_index, 1);
        assert_eq!(c.phase(), Phase::NotStarted);

        let outcome = c.tick(t0 + ms(3100));
        assert!(outcome.focus_input);
        assert!(!outcome.advanced);
    }

    #[test]
    fn test_manual_advance_cancels_pending_auto_advance() {
        let mut c = controller();
        let t0 = Instant::now();

        c.edit("a".into(), t0);
        c.edit("ab".into(), t0 + ms(500));
        c.advance(t0 + ms(600));
        assert_eq!(c.state().passage_index, 1);

        c.tick(t0 + ms(5000));
        assert_eq!(c.state().passage_index, 1);
    }

    #[test]
    fn test_switch_category_cancels_pending_auto_advance() {
        let mut c = controller();
        let t0 = Instant::now();

        c.edit("a".into(), t0);
        c.edit("ab".into(), t0 + ms(500));
        c.switch_category(Category::Chinese, t0 + ms(600));

        let outcome = c.tick(t0 + ms(5000));
        assert!(!outcome.advanced);
        assert_eq!(c.state().passage_index, 0);
        assert_eq!(c.state().history.len(), 1);
    }

    #[test]
    fn test_reset_drops_armed_timer_and_keeps_one_focus() {
        let mut c = controller();
        let t0 = Instant::now();

        c.edit("a".into(), t0);
        c.edit("ab".into(), t0 + ms(500));
        assert_eq!(c.scheduler().len(), 1);

        c.reset(t0 + ms(600));
        c.reset(t0 + ms(700));
        assert_eq!(c.scheduler().len(), 1);

        let outcome = c.tick(t0 + ms(5000));
        assert!(outcome.focus_input);
        assert!(!outcome.advanced);
        assert!(c.scheduler().is_empty());
    }

    #[test]
    fn test_fired_timer_does_not_cancel_the_next_one() {
        let mut c = controller();
        let t0 = Instant::now();

        c.edit("a".into(), t0);
        c.edit("ab".into(), t0 + ms(500));
        assert!(c.tick(t0 + ms(2500)).advanced);
        c.tick(t0 + ms(2600));

        c.edit("c".into(), t0 + ms(3000));
        c.edit("cd".into(), t0 + ms(3500));
        assert_eq!(c.state().passage_index, 1);
        // last passage: no auto-advance is armed
        assert!(c.scheduler().is_empty());

        c.reset(t0 + ms(3600));
        assert_eq!(c.scheduler().len(), 1);
    }

    #[test]
    fn test_notification_failure_is_swallowed() {
        let mut c = SessionController::new(
            small_catalog(),
            Category::Chinese,
            RecordingNotifier::failing(),
        );
        let t0 = Instant::now();

        c.edit("a".into(), t0);
        c.edit("ab".into(), t0 + ms(400));

        assert_eq!(c.notifier().calls, 1);
        assert!(c.state().is_completed());
        assert_eq!(c.state().history.len(), 1);
    }

    #[test]
    fn test_notify_once_per_completion() {
        let mut c = controller();
        let t0 = Instant::now();

        c.edit("a".into(), t0);
        c.edit("ab".into(), t0 + ms(400));
        c.edit("ab".into(), t0 + ms(450));
        c.edit("abc".into(), t0 + ms(500));

        assert_eq!(c.notifier().calls, 1);
    }

    #[test]
    fn test_reset_requests_focus_on_next_tick() {
        let mut c = controller();
        let t0 = Instant::now();

        c.edit("a".into(), t0);
        c.reset(t0 + ms(10));

        assert!(c.tick(t0 + ms(10)).focus_input);
        assert!(!c.tick(t0 + ms(20)).focus_input);
    }

    #[test]
    fn test_average_speed_over_several_passages() {
        let mut c = controller();
        let t0 = Instant::now();

        c.edit("a".into(), t0);
        c.edit("ab".into(), t0 + ms(1000)); // 120 cpm
        c.advance(t0 + ms(1100));
        c.edit("c".into(), t0 + ms(2000));
        c.edit("cd".into(), t0 + ms(2500)); // 240 cpm

        assert_eq!(c.state().history.len(), 2);
        assert_eq!(c.state().average_speed, Some(180.0));
    }

    #[test]
    fn test_shutdown_drops_timers() {
        let mut c = controller();
        let t0 = Instant::now();
        c.edit("a".into(), t0);
        c.edit("ab".into(), t0 + ms(100));

        c.shutdown();

        assert!(c.scheduler().is_empty());
        assert!(!c.tick(t0 + ms(5000)).advanced);
    }
}
