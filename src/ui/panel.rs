use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};

use crate::catalog::Category;
use crate::config::Theme;
use crate::session::SessionState;
use crate::ui::palette::Palette;

pub const PANEL_WIDTH: u16 = 34;
const RECENT_ENTRIES: usize = 5;

/// Side panel with text selection, display toggles and the speed history
pub struct SettingsPanel<'a> {
    pub categories: &'a [Category],
    pub state: &'a SessionState,
    pub show_source: bool,
    pub theme: Theme,
    pub palette: Palette,
}

impl SettingsPanel<'_> {
    pub fn lines(&self) -> Vec<Line<'static>> {
        let p = &self.palette;
        let heading = p.bold().add_modifier(Modifier::UNDERLINED);
        let mut lines = vec![Line::from(Span::styled("Text", heading))];

        for (idx, category) in self.categories.iter().enumerate() {
            let style = if *category == self.state.category {
                p.bold().fg(p.accent)
            } else {
                p.base()
            };
            lines.push(Line::from(Span::styled(
                format!("({}) {}", idx + 1, category.label()),
                style,
            )));
        }

        lines.push(Line::default());
        lines.push(Line::from(Span::styled("Display", heading)));
        lines.push(Line::from(Span::styled(
            format!(
                "(s) source: {}",
                if self.show_source { "shown" } else { "hidden" }
            ),
            p.base(),
        )));
        lines.push(Line::from(Span::styled(
            format!("(t) theme: {} -> {}", self.theme, self.theme.toggled()),
            p.base(),
        )));

        if let Some(avg) = self.state.average_speed {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled("Average speed", heading)));
            lines.push(Line::from(Span::styled(format!("{avg:.1} cpm"), p.bold())));
        }

        if !self.state.history.is_empty() {
            lines.push(Line::default());
            lines.push(Line::from(Span::styled("Recent", heading)));
            for entry in self.state.history.iter().rev().take(RECENT_ENTRIES) {
                lines.push(Line::from(Span::styled(
                    format!(
                        "{} {:>2} {:>6.1} cpm {:>5.1}%",
                        entry.completed_at.format("%H:%M"),
                        entry.passage_index + 1,
                        entry.speed_cpm,
                        entry.accuracy_pct
                    ),
                    p.dim(),
                )));
            }
        }

        lines
    }
}

impl Widget for SettingsPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .borders(Borders::ALL)
            .title(" settings (tab) ")
            .style(self.palette.base());
        Paragraph::new(self.lines())
            .block(block)
            .wrap(Wrap { trim: true })
            .render(area, buf);
    }
}
