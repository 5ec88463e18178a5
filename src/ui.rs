use std::time::Instant;

use itertools::Itertools;
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use qscout::widget::{Widget as FormWidget, WidgetState};

use crate::{App, AppState};

const HORIZONTAL_MARGIN: u16 = 2;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .horizontal_margin(HORIZONTAL_MARGIN)
            .constraints([
                Constraint::Length(2), // header
                Constraint::Min(1),    // form body
                Constraint::Length(3), // hints + diagnostics
            ])
            .split(area);

        render_header(self, chunks[0], buf);
        render_body(self, chunks[1], buf);
        render_footer(self, chunks[2], buf);

        match self.state {
            AppState::Editing => {}
            AppState::Payload => render_payload_popup(self, area, buf),
            AppState::ConfirmReset => render_confirm_popup(area, buf),
        }
    }
}

fn render_header(app: &App, area: Rect, buf: &mut Buffer) {
    let header = Paragraph::new(Span::styled(
        app.form.page_title.clone(),
        Style::default()
            .fg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    ))
    .alignment(Alignment::Center);
    header.render(area, buf);
}

fn render_body(app: &App, area: Rect, buf: &mut Buffer) {
    let now = Instant::now();
    let (lines, focused_line) = form_lines(app, now);

    // Keep the focused line in view.
    let height = area.height as usize;
    let skip = match focused_line {
        Some(line) if height > 0 && line >= height => line + 1 - height,
        _ => 0,
    };

    let visible: Vec<Line> = lines.into_iter().skip(skip).take(height.max(1)).collect();
    Paragraph::new(visible).render(area, buf);
}

/// All body lines plus the index of the focused widget's line.
fn form_lines(app: &App, now: Instant) -> (Vec<Line<'static>>, Option<usize>) {
    let section_style = Style::default()
        .fg(Color::Magenta)
        .add_modifier(Modifier::BOLD);
    let title_style = Style::default().add_modifier(Modifier::DIM);
    let focused_style = Style::default()
        .fg(Color::Yellow)
        .add_modifier(Modifier::BOLD);

    let mut lines = vec![];
    let mut focused_line = None;
    let mut index = 0usize;

    for section in &app.form.sections {
        lines.push(Line::from(Span::styled(
            section.name.clone(),
            section_style,
        )));

        for widget in &section.widgets {
            let focused = index == app.focus;
            if focused {
                focused_line = Some(lines.len());
            }

            let marker = if focused { "› " } else { "  " };
            let label_style = if focused { focused_style } else { title_style };

            lines.push(Line::from(vec![
                Span::styled(marker.to_string(), label_style),
                Span::styled(format!("{:<24}", widget.spec.title), label_style),
                value_span(widget, focused, now),
            ]));

            index += 1;
        }
        lines.push(Line::from(""));
    }

    (lines, focused_line)
}

fn value_span(widget: &FormWidget, focused: bool, now: Instant) -> Span<'static> {
    let style = if focused {
        Style::default().add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };

    let text = match &widget.state {
        WidgetState::Text { value, .. } | WidgetState::Number { value, .. } => value.clone(),
        WidgetState::Counter {
            value, min, max, ..
        }
        | WidgetState::Range {
            value, min, max, ..
        } => format!("{value}  [{min}..{max}]"),
        WidgetState::Boolean { checked, .. } => {
            (if *checked { "[x]" } else { "[ ]" }).to_string()
        }
        WidgetState::Select {
            choices, selected, ..
        } => match selected {
            Some(i) => choices[*i].label.clone(),
            None => "(none)".to_string(),
        },
        WidgetState::MultiSelect {
            choices,
            selected,
            cursor,
            ..
        } => choices
            .iter()
            .enumerate()
            .map(|(i, choice)| {
                let mark = if selected[i] { "[x]" } else { "[ ]" };
                if focused && i == *cursor {
                    format!("›{mark} {}", choice.label)
                } else {
                    format!(" {mark} {}", choice.label)
                }
            })
            .join(" "),
        WidgetState::Image { source, value } => {
            value.clone().unwrap_or_else(|| source.clone())
        }
        WidgetState::Timer(timer) => {
            let marker = if timer.is_running() { "●" } else { "○" };
            return Span::styled(
                format!(
                    "{} {}  {} ({})",
                    marker,
                    timer.current_display(now),
                    timer.cumulative_display(),
                    timer.laps().len()
                ),
                if timer.is_running() {
                    style.fg(Color::Green)
                } else {
                    style
                },
            );
        }
    };

    Span::styled(text, style)
}

fn render_footer(app: &App, area: Rect, buf: &mut Buffer) {
    let hint_style = Style::default()
        .fg(Color::Gray)
        .add_modifier(Modifier::ITALIC);

    let widget_hint = app
        .focused_widget()
        .map(|w| match &w.state {
            WidgetState::Text { .. } | WidgetState::Number { .. } => "type to edit, (bksp) erase",
            WidgetState::Counter { .. } | WidgetState::Range { .. } => "(←/→) or (-/+) adjust",
            WidgetState::Boolean { .. } => "(space) toggle",
            WidgetState::Select { .. } => "(←/→) choose",
            WidgetState::MultiSelect { .. } => "(←/→) move, (space) toggle",
            WidgetState::Image { .. } => "",
            WidgetState::Timer(_) => "(space) start/stop, (enter/l) lap, (r) zero",
        })
        .unwrap_or("");

    let mut lines = vec![
        Line::from(Span::styled(
            format!("(↑/↓) field  (^g) payload  (^r) reset  (esc) quit   {widget_hint}"),
            hint_style,
        )),
    ];

    // Most recent diagnostic wins the footer slot.
    if let Some(diag) = app.diagnostics.last().or(app.form.warnings.last()) {
        lines.push(Line::from(Span::styled(
            diag.clone(),
            Style::default().fg(Color::Red),
        )));
    }

    Paragraph::new(lines)
        .block(Block::default().borders(Borders::TOP))
        .render(area, buf);
}

fn render_payload_popup(app: &App, area: Rect, buf: &mut Buffer) {
    let payload = app.payload.as_deref().unwrap_or("");

    let width = (payload.width() as u16 + 6)
        .clamp(30, area.width.saturating_sub(4).max(30));
    let inner_width = width.saturating_sub(2).max(1) as usize;
    let height = (payload.width() / inner_width + 5) as u16;
    let popup = centered_rect(area, width, height.max(5).min(area.height));

    let lines = vec![
        Line::from(Span::styled(
            payload.to_string(),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "scan me, then (esc) to close",
            Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::ITALIC),
        )),
    ];

    Clear.render(popup, buf);
    Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("QR payload"),
        )
        .render(popup, buf);
}

fn render_confirm_popup(area: Rect, buf: &mut Buffer) {
    let popup = centered_rect(area, 44.min(area.width), 5.min(area.height));

    let lines = vec![
        Line::from("Are you sure you want to reset the form?"),
        Line::from(""),
        Line::from(Span::styled(
            "(y) reset  (any other key) cancel",
            Style::default()
                .fg(Color::Gray)
                .add_modifier(Modifier::ITALIC),
        )),
    ];

    Clear.render(popup, buf);
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL).title("Reset"))
        .render(popup, buf);
}

fn centered_rect(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}
