pub mod palette;
pub mod panel;

use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

use crate::app::{App, Focus};
use crate::metrics::{self, Snapshot};
use crate::notify::Notifier;
use crate::ui::palette::Palette;
use crate::ui::panel::{SettingsPanel, PANEL_WIDTH};

const HORIZONTAL_MARGIN: u16 = 4;
const VERTICAL_MARGIN: u16 = 1;
const MIN_WIDTH_FOR_PANEL: u16 = PANEL_WIDTH + 30;

pub fn draw<N: Notifier>(app: &App<N>, f: &mut Frame) {
    f.render_widget(app, f.area());
}

impl<N: Notifier> Widget for &App<N> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let palette = Palette::for_theme(self.theme);
        Block::default().style(palette.base()).render(area, buf);

        let main_area = if self.focus == Focus::Settings && area.width >= MIN_WIDTH_FOR_PANEL {
            let columns = Layout::default()
                .direction(Direction::Horizontal)
                .constraints([Constraint::Min(1), Constraint::Length(PANEL_WIDTH)])
                .split(area);
            SettingsPanel {
                categories: self.controller.catalog().list_categories(),
                state: self.controller.state(),
                show_source: self.show_source,
                theme: self.theme,
                palette,
            }
            .render(columns[1], buf);
            columns[0]
        } else {
            area
        };

        render_practice(self, palette, main_area, buf);
    }
}

fn render_practice<N: Notifier>(app: &App<N>, palette: Palette, area: Rect, buf: &mut Buffer) {
    let controller = &app.controller;
    let state = controller.state();
    let passage = controller.current_passage();
    let snapshot = controller.snapshot();
    let is_last = controller.is_last_passage();

    let spans: Vec<Span> = passage
        .text
        .chars()
        .zip(metrics::classify(&passage.text, &state.input))
        .map(|(c, class)| Span::styled(c.to_string(), palette.char_style(class)))
        .collect();
    let target = Paragraph::new(Line::from(spans)).wrap(Wrap { trim: false });

    // word wrap can need more rows than width / inner_width
    let inner_width = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
    let target_lines = target.line_count(inner_width).clamp(1, u16::MAX as usize) as u16;
    let source_lines = if app.show_source { 1 } else { 0 };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1),            // title
            Constraint::Length(1),            // passage counter
            Constraint::Length(source_lines), // attribution
            Constraint::Length(1),            // padding
            Constraint::Length(target_lines), // target text
            Constraint::Length(1),            // padding
            Constraint::Length(3),            // input box
            Constraint::Length(5),            // readouts
            Constraint::Length(2),            // completion banner
            Constraint::Min(0),
            Constraint::Length(1), // legend
        ])
        .split(area);

    Paragraph::new(Span::styled("typing practice", palette.bold()))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);

    Paragraph::new(Span::styled(
        format!(
            "{} | passage {} / {}",
            state.category.label(),
            state.passage_index + 1,
            controller.catalog().len(state.category)
        ),
        palette.dim(),
    ))
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    if app.show_source {
        Paragraph::new(Span::styled(
            format!("source: {}", passage.source),
            palette.dim().add_modifier(Modifier::ITALIC),
        ))
        .alignment(Alignment::Center)
        .render(chunks[2], buf);
    }

    target
        .alignment(if target_lines == 1 {
            Alignment::Center
        } else {
            Alignment::Left
        })
        .render(chunks[4], buf);

    render_input(app, palette, snapshot.completed, chunks[6], buf);

    Paragraph::new(readout_lines(&snapshot, state.average_speed, palette))
        .alignment(Alignment::Center)
        .render(chunks[7], buf);

    if snapshot.completed {
        Paragraph::new(banner_lines(&snapshot, is_last, palette))
            .alignment(Alignment::Center)
            .render(chunks[8], buf);
    }

    Paragraph::new(Span::styled(
        legend(snapshot.completed && !is_last, app.focus),
        palette.dim().add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(chunks[10], buf);
}

fn render_input<N: Notifier>(
    app: &App<N>,
    palette: Palette,
    completed: bool,
    area: Rect,
    buf: &mut Buffer,
) {
    let input = &app.controller.state().input;
    let border_style = if completed {
        palette.dim()
    } else if app.focus == Focus::Input {
        palette.base().fg(palette.accent)
    } else {
        palette.base()
    };

    let mut spans = Vec::new();
    if input.is_empty() && !completed {
        spans.push(Span::styled(
            "start typing...",
            palette.dim().add_modifier(Modifier::ITALIC),
        ));
    } else {
        // keep the tail visible when the buffer is wider than the box
        let room = area.width.saturating_sub(3) as usize;
        spans.push(Span::styled(
            visible_tail(input, room).to_string(),
            if completed { palette.dim() } else { palette.base() },
        ));
    }
    if app.focus == Focus::Input && !completed {
        spans.push(Span::styled(
            " ",
            palette.base().add_modifier(Modifier::REVERSED),
        ));
    }

    Paragraph::new(Line::from(spans))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style),
        )
        .render(area, buf);
}

/// Longest suffix of `text` that fits in `width` terminal columns
fn visible_tail(text: &str, width: usize) -> &str {
    if text.width() <= width {
        return text;
    }
    let mut used = 0;
    let mut start = text.len();
    for (idx, c) in text.char_indices().rev() {
        let w = unicode_width::UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > width {
            break;
        }
        used += w;
        start = idx;
    }
    &text[start..]
}

fn readout_lines(snapshot: &Snapshot, average: Option<f64>, palette: Palette) -> Vec<Line<'static>> {
    let mut lines = vec![
        Line::from(Span::styled(
            format!("progress: {} / {}", snapshot.typed, snapshot.total),
            palette.base(),
        )),
        Line::from(Span::styled(
            format!("correct: {}", snapshot.correct),
            palette.base(),
        )),
        Line::from(Span::styled(
            format!("accuracy: {:.1}%", snapshot.accuracy_pct),
            palette.base(),
        )),
    ];
    if let Some(speed) = snapshot.speed_cpm {
        lines.push(Line::from(Span::styled(
            format!("speed: {speed:.1} cpm"),
            palette.bold(),
        )));
    }
    if let Some(avg) = average {
        lines.push(Line::from(Span::styled(
            format!("average: {avg:.1} cpm"),
            palette.base(),
        )));
    }
    lines
}

fn banner_lines(snapshot: &Snapshot, is_last: bool, palette: Palette) -> Vec<Line<'static>> {
    let mut summary = String::from("done!");
    if let Some(secs) = snapshot.elapsed_secs {
        summary.push_str(&format!(" time: {secs:.2} s,"));
    }
    summary.push_str(&format!(" accuracy: {:.1}%", snapshot.accuracy_pct));
    if let Some(speed) = snapshot.speed_cpm {
        summary.push_str(&format!(", speed: {speed:.1} cpm"));
    }

    let follow_up = if is_last {
        Span::styled(
            "every passage in this category is complete!",
            palette.bold().fg(palette.finale),
        )
    } else {
        Span::styled(
            "next passage in 2 seconds...",
            palette.bold().fg(palette.accent),
        )
    };

    vec![
        Line::from(Span::styled(summary, palette.bold().fg(palette.done))),
        Line::from(follow_up),
    ]
}

fn legend(can_advance: bool, focus: Focus) -> String {
    let mut keys = vec!["(←) reset"];
    if can_advance {
        keys.push("(→) next");
    }
    keys.push(match focus {
        Focus::Input => "(tab) settings",
        Focus::Settings => "(tab) back to typing",
    });
    keys.push("(esc) quit");
    keys.iter().join(" / ")
}
