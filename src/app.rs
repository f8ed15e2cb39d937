use std::time::Instant;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use tracing::debug;

use crate::catalog::{Catalog, Category};
use crate::config::{Config, Theme};
use crate::controller::SessionController;
use crate::notify::{Notifier, TerminalBell};
use crate::runtime::AppEvent;

/// Which part of the screen receives keystrokes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Input,
    Settings,
}

pub struct App<N: Notifier = TerminalBell> {
    pub controller: SessionController<N>,
    pub focus: Focus,
    pub show_source: bool,
    pub theme: Theme,
    pub should_quit: bool,
}

impl<N: Notifier> App<N> {
    pub fn new(catalog: Catalog, config: &Config, notifier: N) -> Self {
        Self {
            controller: SessionController::new(catalog, config.category, notifier),
            focus: Focus::Input,
            show_source: config.show_source,
            theme: config.theme,
            should_quit: false,
        }
    }

    /// Route one runtime event. Returns true when the screen should be redrawn.
    pub fn handle_event(&mut self, event: AppEvent, now: Instant) -> bool {
        match event {
            AppEvent::Key(key) => {
                self.on_key(key, now);
                true
            }
            AppEvent::Paste(text) => {
                self.focus = Focus::Input;
                self.on_paste(&text, now);
                true
            }
            AppEvent::Resize => true,
            AppEvent::Tick => {
                let outcome = self.controller.tick(now);
                let refocus = outcome.focus_input && self.focus != Focus::Input;
                if outcome.focus_input {
                    self.focus = Focus::Input;
                }
                outcome.advanced || refocus
            }
        }
    }

    pub fn on_key(&mut self, key: KeyEvent, now: Instant) {
        let ctrl = is_control_chord(&key);

        match key.code {
            KeyCode::Esc => self.quit(),
            KeyCode::Char('c') if ctrl => self.quit(),
            KeyCode::Tab => {
                self.focus = match self.focus {
                    Focus::Input => Focus::Settings,
                    Focus::Settings => Focus::Input,
                };
            }
            KeyCode::Left => self.controller.reset(now),
            KeyCode::Right => {
                // the next-passage action is only offered once the passage is done
                if self.controller.state().is_completed() {
                    self.controller.advance(now);
                }
            }
            _ => match self.focus {
                Focus::Settings => self.on_settings_key(key, now),
                Focus::Input => self.on_input_key(key, now),
            },
        }
    }

    fn on_settings_key(&mut self, key: KeyEvent, now: Instant) {
        if let Some(category) = self.category_for_key(key.code) {
            self.switch_category(category, now);
            return;
        }
        match key.code {
            KeyCode::Char('s') => self.show_source = !self.show_source,
            KeyCode::Char('t') => self.theme = self.theme.toggled(),
            KeyCode::Char(_) | KeyCode::Backspace => {
                // any other key goes back to typing, and is typed
                self.focus = Focus::Input;
                self.on_input_key(key, now);
            }
            _ => {}
        }
    }

    fn on_input_key(&mut self, key: KeyEvent, now: Instant) {
        let ctrl = is_control_chord(&key);
        let mut buffer = self.controller.state().input.clone();

        match key.code {
            KeyCode::Char('u') if ctrl => buffer.clear(),
            KeyCode::Char(_) if ctrl => return,
            KeyCode::Char(c) => buffer.push(c),
            KeyCode::Backspace => {
                if buffer.pop().is_none() {
                    return;
                }
            }
            _ => return,
        }

        self.controller.edit(buffer, now);
    }

    fn on_paste(&mut self, text: &str, now: Instant) {
        // single line input, line breaks are dropped like a text field would
        let pasted: String = text.chars().filter(|c| *c != '\n' && *c != '\r').collect();
        if pasted.is_empty() {
            return;
        }
        let mut buffer = self.controller.state().input.clone();
        buffer.push_str(&pasted);
        self.controller.edit(buffer, now);
    }

    /// Digit keys pick categories in catalog order, starting at 1
    fn category_for_key(&self, code: KeyCode) -> Option<Category> {
        let KeyCode::Char(c) = code else {
            return None;
        };
        let slot = c.to_digit(10)?.checked_sub(1)?;
        self.controller
            .catalog()
            .list_categories()
            .get(slot as usize)
            .copied()
    }

    fn switch_category(&mut self, category: Category, now: Instant) {
        self.controller.switch_category(category, now);
    }

    pub fn quit(&mut self) {
        debug!("quit requested");
        self.controller.shutdown();
        self.should_quit = true;
    }

    /// Current preferences, as they would be written back to the config file
    pub fn config(&self, mute: bool) -> Config {
        Config {
            category: self.controller.state().category,
            show_source: self.show_source,
            theme: self.theme,
            mute,
        }
    }
}

/// Ctrl chords, but not AltGr, which Windows reports as Ctrl+Alt
fn is_control_chord(key: &KeyEvent) -> bool {
    key.modifiers.contains(KeyModifiers::CONTROL) && !key.modifiers.contains(KeyModifiers::ALT)
}
