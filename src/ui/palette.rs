use ratatui::style::{Color, Modifier, Style};

use crate::config::Theme;
use crate::metrics::CharClass;

/// Colors for one theme
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub bg: Color,
    pub fg: Color,
    pub muted: Color,
    pub correct: Color,
    pub incorrect: Color,
    pub accent: Color,
    pub done: Color,
    pub finale: Color,
}

impl Palette {
    pub fn for_theme(theme: Theme) -> Self {
        match theme {
            Theme::Dark => Self {
                bg: Color::Black,
                fg: Color::White,
                muted: Color::DarkGray,
                correct: Color::Green,
                incorrect: Color::Red,
                accent: Color::LightBlue,
                done: Color::LightGreen,
                finale: Color::LightMagenta,
            },
            Theme::Light => Self {
                bg: Color::White,
                fg: Color::Black,
                muted: Color::Gray,
                correct: Color::Green,
                incorrect: Color::Red,
                accent: Color::Blue,
                done: Color::Green,
                finale: Color::Magenta,
            },
        }
    }

    pub fn base(&self) -> Style {
        Style::default().fg(self.fg).bg(self.bg)
    }

    pub fn dim(&self) -> Style {
        self.base().fg(self.muted)
    }

    pub fn bold(&self) -> Style {
        self.base().add_modifier(Modifier::BOLD)
    }

    pub fn char_style(&self, class: CharClass) -> Style {
        match class {
            CharClass::Untyped => self.dim(),
            CharClass::Correct => self.base().fg(self.correct),
            CharClass::Incorrect => self
                .base()
                .fg(self.incorrect)
                .add_modifier(Modifier::UNDERLINED),
        }
    }
}
