//! Frame rendering
//!
//! Pure function of the view state: reads `App`, writes the frame buffer.

use ratatui::layout::{Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, BorderType, Borders, Paragraph};
use ratatui::Frame;

use crate::app::{App, Focus};
use crate::widgets::{ScrollView, PLACEHOLDER};

const ACCENT: Color = Color::Rgb(0x7C, 0x3A, 0xED);
const MUTED: Color = Color::Rgb(0x66, 0x66, 0x66);
const SERIAL_TITLE: Color = Color::Rgb(0xFB, 0xBF, 0x24);
const LOG_TITLE: Color = Color::Rgb(0x10, 0xB9, 0x81);
const INPUT_TITLE: Color = Color::Rgb(0xF5, 0x9E, 0x0B);
const HELP: Color = Color::Rgb(0x6B, 0x72, 0x80);

const HELP_TEXT: &str = "Tab: Switch focus • Enter: Send message • Ctrl+C/Esc: Quit";

pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),                         // spacer
            Constraint::Length(1),                         // log title
            Constraint::Length(app.log().height() + 2),    // log box
            Constraint::Length(1),                         // serial title
            Constraint::Length(app.serial().height() + 2), // serial box
            Constraint::Length(1),                         // input title
            Constraint::Length(3),                         // input box
            Constraint::Length(1),                         // help
            Constraint::Min(0),
        ])
        .split(area);

    frame.render_widget(title("System Logs", LOG_TITLE), rows[1]);
    render_view(frame, app.log(), app.focus() == Focus::Log, boxed(rows[2], app.log().width()));

    frame.render_widget(
        title(format!("Serial I/O  {}", app.label()), SERIAL_TITLE),
        rows[3],
    );
    render_view(
        frame,
        app.serial(),
        app.focus() == Focus::Serial,
        boxed(rows[4], app.serial().width()),
    );

    frame.render_widget(title("Send Data:", INPUT_TITLE), rows[5]);
    render_input(frame, app, boxed(rows[6], app.input().width().saturating_add(3)));

    let help = Paragraph::new(HELP_TEXT).style(
        Style::default()
            .fg(HELP)
            .add_modifier(Modifier::ITALIC),
    );
    frame.render_widget(help, rows[7]);
}

fn title(text: impl Into<String>, color: Color) -> Paragraph<'static> {
    Paragraph::new(text.into()).style(
        Style::default()
            .fg(color)
            .add_modifier(Modifier::BOLD),
    )
}

fn border(focused: bool) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(if focused { ACCENT } else { MUTED }))
}

/// Box of `inner_width` plus borders, clipped to the row
fn boxed(row: Rect, inner_width: u16) -> Rect {
    Rect {
        width: row.width.min(inner_width.saturating_add(2)),
        ..row
    }
}

fn render_view(frame: &mut Frame, view: &ScrollView, focused: bool, area: Rect) {
    let lines: Vec<Line> = view.visible_lines().into_iter().map(Line::from).collect();
    frame.render_widget(Paragraph::new(lines).block(border(focused)), area);
}

fn render_input(frame: &mut Frame, app: &App, area: Rect) {
    let input = app.input();
    let focused = input.is_focused();

    let paragraph = if input.is_empty() {
        Paragraph::new(PLACEHOLDER).style(Style::default().fg(MUTED))
    } else {
        Paragraph::new(input.visible().0)
    };
    frame.render_widget(paragraph.block(border(focused)), area);

    if focused && area.width > 2 && area.height > 2 {
        let (_, column) = input.visible();
        let x = (area.x + 1 + column).min(area.x + area.width - 2);
        frame.set_cursor_position(Position::new(x, area.y + 1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::AppEvent;
    use bytes::Bytes;
    use ratatui::backend::TestBackend;
    use ratatui::buffer::Buffer;
    use ratatui::Terminal;
    use tokio_util::sync::CancellationToken;

    fn draw(app: &App, width: u16, height: u16) -> Buffer {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| render(frame, app)).unwrap();
        terminal.backend().buffer().clone()
    }

    fn screen_text(buffer: &Buffer) -> String {
        let area = buffer.area;
        let mut out = String::new();
        for y in 0..area.height {
            for x in 0..area.width {
                out.push_str(buffer[(x, y)].symbol());
            }
            out.push('\n');
        }
        out
    }

    fn sample_app() -> App {
        let mut app = App::new(None, CancellationToken::new(), "/dev/ttyUSB0 @ 115200 8N1");
        app.handle(AppEvent::Resize { width: 80, height: 40 });
        app.handle(AppEvent::Serial(Bytes::from_static(b"device ready\r\n")));
        app.handle(AppEvent::Log(Bytes::from_static(b"INFO link opened\n")));
        app
    }

    #[test]
    fn test_render_is_pure() {
        let app = sample_app();
        let first = draw(&app, 80, 40);
        let second = draw(&app, 80, 40);
        assert_eq!(first, second);
    }

    #[test]
    fn test_render_shows_sections() {
        let app = sample_app();
        let text = screen_text(&draw(&app, 80, 40));

        assert!(text.contains("System Logs"));
        assert!(text.contains("INFO link opened"));
        assert!(text.contains("Serial I/O  /dev/ttyUSB0 @ 115200 8N1"));
        assert!(text.contains("device ready"));
        assert!(text.contains("Send Data:"));
        assert!(text.contains(PLACEHOLDER));
        assert!(text.contains("Ctrl+C/Esc: Quit"));
    }

    #[test]
    fn test_render_tiny_terminal_does_not_panic() {
        let app = sample_app();
        let _ = draw(&app, 4, 3);
    }
}
