use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget, Wrap},
};
use unicode_width::UnicodeWidthStr;

use mentortype::scoring::CharOutcome;
use mentortype::session::{FeedbackState, Phase};

use crate::App;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        match self.session.phase() {
            Phase::Idle | Phase::InProgress => render_typing(self, area, buf),
            Phase::Finished => render_results(self, area, buf),
        }
    }
}

fn render_typing(app: &App, area: Rect, buf: &mut Buffer) {
    let session = &app.session;
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let green_bold_style = Style::default().patch(bold_style).fg(Color::Green);
    let red_bold_style = Style::default()
        .patch(bold_style)
        .fg(Color::Red)
        .bg(Color::Rgb(80, 20, 20));
    let dim_bold_style = Style::default()
        .patch(bold_style)
        .add_modifier(Modifier::DIM);
    let underlined_dim_bold_style = Style::default()
        .patch(dim_bold_style)
        .add_modifier(Modifier::UNDERLINED);

    let reference = session.reference();
    let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
    let prompt_occupied_lines = if reference.width() <= max_chars_per_line as usize {
        1
    } else {
        ((reference.width() as f64 / max_chars_per_line as f64).ceil() + 1.0) as u16
    };
    let padding = area.height.saturating_sub(prompt_occupied_lines + 4) / 2;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(padding),
            Constraint::Length(2),
            Constraint::Length(prompt_occupied_lines),
            Constraint::Min(0),
            Constraint::Length(1),
        ])
        .split(area);

    let mut cursor_drawn = false;
    let spans = reference
        .chars()
        .zip(session.comparison())
        .map(|(expected, outcome)| match outcome {
            CharOutcome::Correct => Span::styled(expected.to_string(), green_bold_style),
            CharOutcome::Incorrect => Span::styled(
                match expected {
                    ' ' => "·".to_owned(),
                    c => c.to_string(),
                },
                red_bold_style,
            ),
            CharOutcome::Pending if !cursor_drawn => {
                cursor_drawn = true;
                Span::styled(expected.to_string(), underlined_dim_bold_style)
            }
            CharOutcome::Pending => Span::styled(expected.to_string(), dim_bold_style),
        })
        .collect::<Vec<Span>>();

    Paragraph::new(Line::from(spans))
        .alignment(if prompt_occupied_lines == 1 {
            Alignment::Center
        } else {
            Alignment::Left
        })
        .wrap(Wrap { trim: true })
        .render(chunks[2], buf);

    let status = match session.phase() {
        Phase::Idle => "start typing to begin".to_string(),
        _ => format!("{:.1}s", session.elapsed_secs()),
    };
    Paragraph::new(Span::styled(status, dim_bold_style))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);

    Paragraph::new(Span::styled(
        "(←) retry / (→) new sentence / (esc)ape",
        Style::default().add_modifier(Modifier::ITALIC),
    ))
    .render(chunks[4], buf);
}

fn render_results(app: &App, area: Rect, buf: &mut Buffer) {
    let session = &app.session;
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // stats
            Constraint::Length(1), // padding
            Constraint::Min(4),    // feedback
            Constraint::Length(9), // history
            Constraint::Length(1), // legend
        ])
        .split(area);

    if let Some(result) = session.result() {
        Paragraph::new(Line::from(vec![
            Span::styled(format!("{} wpm", result.wpm), bold_style.fg(Color::Cyan)),
            Span::raw("   "),
            Span::styled(
                format!("{}% acc", result.accuracy),
                bold_style.fg(Color::Yellow),
            ),
        ]))
        .alignment(Alignment::Center)
        .render(chunks[0], buf);
    }

    let feedback = match session.feedback() {
        FeedbackState::Ready(message) => Span::raw(message.clone()),
        FeedbackState::Loading => Span::styled("thinking…", italic_style.add_modifier(Modifier::DIM)),
        FeedbackState::Idle => Span::raw(""),
    };
    Paragraph::new(Line::from(feedback))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Mentor feedback ({})", app.language)),
        )
        .wrap(Wrap { trim: true })
        .render(chunks[2], buf);

    let mut lines: Vec<Line> = session
        .history()
        .iter()
        .map(|r| Line::from(format!("{:<12} {:>4} WPM / {:>3}%", r.date, r.wpm, r.accuracy)))
        .collect();
    if let (Some(wpm), Some(acc)) = (
        session.history().average_wpm(),
        session.history().average_accuracy(),
    ) {
        lines.push(Line::from(Span::styled(
            format!("average {wpm:.0} WPM / {acc:.0}%"),
            italic_style,
        )));
    }
    Paragraph::new(lines)
        .block(Block::default().borders(Borders::ALL).title("Recent history"))
        .render(chunks[3], buf);

    Paragraph::new(Span::styled("(r)etry / (n)ew / (esc)ape", italic_style))
        .render(chunks[4], buf);
}
