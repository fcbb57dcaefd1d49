use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Paragraph, Wrap};

use forge_core::JobState;

use crate::app::{App, EditorMode};

const ACCENT: Color = Color::Cyan;
const ERROR_COLOR: Color = Color::Red;
const RESPONSE_COLOR: Color = Color::Green;
const DIM: Style = Style::new().fg(Color::DarkGray);
const BOLD: Style = Style::new().add_modifier(Modifier::BOLD);

pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let input_height = calculate_input_height(app, area.width);
    let suggestions_height = if app.show_suggestions {
        app.suggestions().len() as u16 + 1
    } else {
        0
    };
    let chunks = Layout::vertical([
        Constraint::Length(1), // header
        Constraint::Min(1),
        Constraint::Length(suggestions_height),
        Constraint::Length(3), // status
        Constraint::Length(1), // separator
        Constraint::Length(input_height),
    ])
    .split(area);

    render_header(frame, app, chunks[0]);
    render_body(frame, app, chunks[1]);
    if app.show_suggestions {
        render_suggestions(frame, app, chunks[2]);
    }
    render_status(frame, app, chunks[3]);
    render_separator(frame, chunks[4]);
    render_input(frame, app, chunks[5]);
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::styled("Forge Studio  ", BOLD.fg(ACCENT))];
    for mode in EditorMode::ALL {
        let style = if mode == app.mode {
            BOLD.fg(Color::Black).bg(ACCENT)
        } else {
            DIM
        };
        spans.push(Span::styled(format!(" {} ", mode.label()), style));
        spans.push(Span::raw(" "));
    }
    if let Some(session) = app.session() {
        spans.push(Span::styled(
            format!("  {} <{}>", session.identity.name, session.identity.email),
            DIM,
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_body(frame: &mut Frame, app: &App, area: Rect) {
    let lines = match app.mode {
        EditorMode::Photo => photo_lines(app),
        EditorMode::Generation => generation_lines(app),
        EditorMode::Video => video_lines(app),
    };
    frame.render_widget(
        Paragraph::new(Text::from(lines)).wrap(Wrap { trim: false }),
        area,
    );
}

fn setting(label: &str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{label:<12}"), DIM),
        Span::raw(value),
    ])
}

fn photo_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled("Images", BOLD))];

    if app.subjects.is_empty() {
        lines.push(Line::from(Span::styled(
            "  No images yet. Open some with :open <file> [file...]",
            DIM,
        )));
    }
    let active = app.subjects.active_index();
    for (index, subject) in app.subjects.iter().enumerate() {
        let marker = if Some(index) == active { ">" } else { " " };
        let history = &subject.history;
        let mut spans = vec![
            Span::styled(format!("{marker} {}. ", index + 1), Style::new().fg(ACCENT)),
            Span::raw(subject.name.clone()),
            Span::styled(
                format!(
                    "  {}  edit {}/{}",
                    subject.mime_type,
                    history.current_index() + 1,
                    history.len()
                ),
                DIM,
            ),
        ];
        if history.is_edited() {
            spans.push(Span::styled("  edited", Style::new().fg(RESPONSE_COLOR)));
        }
        lines.push(Line::from(spans));
    }

    lines.push(Line::raw(""));
    lines.push(setting("Model", app.model().name.to_string()));
    let adjustments = app.adjustments;
    lines.push(setting(
        "Adjust",
        format!(
            "brightness {:+}  contrast {:+}  saturation {:+}",
            adjustments.brightness, adjustments.contrast, adjustments.saturation
        ),
    ));
    if let Some(subject) = app.subjects.active() {
        let history = &subject.history;
        let undo = if history.can_undo() { "Ctrl-Z undo" } else { "" };
        let redo = if history.can_redo() { "Ctrl-Y redo" } else { "" };
        lines.push(setting("History", format!("{undo}  {redo}").trim().to_string()));
    }
    lines
}

fn generation_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines = vec![
        setting("Images", app.generate.count.to_string()),
        setting("Aspect", app.generate.aspect_ratio.as_str().to_string()),
        Line::raw(""),
    ];

    if app.busy {
        lines.push(Line::from(Span::styled("Generating...", Style::new().fg(ACCENT))));
    } else if app.gallery.is_empty() {
        lines.push(Line::from(Span::styled(
            "Describe an image and press Enter.",
            DIM,
        )));
    }
    for (index, image) in app.gallery.images().iter().enumerate() {
        let approx = image.encoded().len() * 3 / 4;
        lines.push(Line::from(vec![
            Span::styled(format!("  {}. ", index + 1), Style::new().fg(ACCENT)),
            Span::raw(format!("generated image ({} KiB)", approx / 1024)),
        ]));
    }
    lines
}

fn video_lines(app: &App) -> Vec<Line<'static>> {
    let settings = app.video_settings;
    let mut lines = vec![
        setting("Duration", format!("{}s", settings.duration_secs)),
        setting("Quality", settings.quality.to_string()),
        setting("Style", settings.style.to_string()),
        setting("Effect", settings.effect.to_string()),
        setting(
            "Start image",
            app.start_image
                .as_ref()
                .map(|image| image.name.clone())
                .unwrap_or_else(|| "none".to_string()),
        ),
        Line::raw(""),
    ];

    let job = app.video.job();
    let state = match job.state() {
        JobState::Idle => "idle".to_string(),
        JobState::Submitting => "submitting".to_string(),
        JobState::Polling => format!("waiting for the provider ({} checks)", job.polls()),
        JobState::Succeeded => "ready".to_string(),
        JobState::Failed => "failed".to_string(),
    };
    lines.push(setting("Job", state));
    if let Some(video) = job.result() {
        lines.push(setting("Video", video.path().display().to_string()));
    }
    lines
}

fn render_suggestions(frame: &mut Frame, app: &App, area: Rect) {
    let mut lines = vec![Line::from(Span::styled(
        "Suggestions (:suggest <n> to use)",
        BOLD,
    ))];
    for (index, suggestion) in app.suggestions().iter().enumerate() {
        lines.push(Line::from(vec![
            Span::styled(format!("{:>3}. ", index + 1), Style::new().fg(ACCENT)),
            Span::raw(*suggestion),
        ]));
    }
    frame.render_widget(Paragraph::new(Text::from(lines)), area);
}

fn render_status(frame: &mut Frame, app: &App, area: Rect) {
    let line = if let Some(error) = &app.error {
        Line::from(Span::styled(error.clone(), Style::new().fg(ERROR_COLOR)))
    } else if let Some(message) = app.loading_message() {
        Line::from(Span::styled(message, Style::new().fg(ACCENT)))
    } else if app.busy {
        Line::from(Span::styled("Working...", Style::new().fg(ACCENT)))
    } else if let Some(text) = &app.response_text {
        Line::from(vec![
            Span::styled("AI: ", BOLD.fg(RESPONSE_COLOR)),
            Span::raw(text.clone()),
        ])
    } else if let Some(notice) = &app.notice {
        Line::from(Span::raw(notice.clone()))
    } else {
        Line::from(Span::styled(
            "Tab switch mode  F1 suggestions  :help commands  Ctrl-C quit",
            DIM,
        ))
    };
    frame.render_widget(Paragraph::new(line).wrap(Wrap { trim: true }), area);
}

fn render_separator(frame: &mut Frame, area: Rect) {
    let line = Line::from(Span::styled("─".repeat(area.width as usize), DIM));
    frame.render_widget(Paragraph::new(line), area);
}

fn render_input(frame: &mut Frame, app: &App, area: Rect) {
    let input_text = if app.input.is_empty() {
        let hint = match app.mode {
            EditorMode::Photo => "> Describe an edit, or :open <file>",
            EditorMode::Generation => "> Describe the image to generate",
            EditorMode::Video => "> Describe the video to generate",
        };
        Text::from(Span::styled(hint, DIM))
    } else {
        let mut lines: Vec<Line> = Vec::new();
        for (i, text_line) in app.input.lines().enumerate() {
            let prefix = if i == 0 { "> " } else { "  " };
            lines.push(Line::from(vec![
                Span::styled(prefix, DIM),
                Span::raw(text_line.to_string()),
            ]));
        }
        Text::from(lines)
    };

    frame.render_widget(Paragraph::new(input_text).wrap(Wrap { trim: false }), area);

    let inner_width = area.width.saturating_sub(2) as usize;
    let (cursor_row, cursor_col) = cursor_position(&app.input, app.cursor_pos, inner_width);
    frame.set_cursor_position((area.x + 2 + cursor_col as u16, area.y + cursor_row as u16));
}

fn calculate_input_height(app: &App, width: u16) -> u16 {
    let inner_width = width.saturating_sub(2).max(1) as usize;
    let line_count = if app.input.is_empty() {
        1
    } else {
        app.input
            .lines()
            .map(|line| {
                let len = line.chars().count().max(1);
                len.div_ceil(inner_width) as u16
            })
            .sum::<u16>()
            .max(1)
    };
    line_count.clamp(1, 6)
}

fn cursor_position(input: &str, byte_pos: usize, width: usize) -> (usize, usize) {
    let width = width.max(1);
    let before_cursor = &input[..byte_pos.min(input.len())];
    let mut row = 0;
    let mut col = 0;

    for ch in before_cursor.chars() {
        if ch == '\n' {
            row += 1;
            col = 0;
        } else {
            col += 1;
            if col >= width {
                row += 1;
                col = 0;
            }
        }
    }

    (row, col)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_wraps_at_width() {
        assert_eq!(cursor_position("abcdef", 6, 4), (1, 2));
        assert_eq!(cursor_position("ab\ncd", 5, 10), (1, 2));
        assert_eq!(cursor_position("héllo", 3, 10), (0, 2));
    }
}
