use std::io;
use std::time::Duration;

use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::Line;
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, TableState};
use ratatui::{Frame, Terminal};
use serde_json::Value;

use crate::error::{CfctlError, Result};

enum Mode {
    Normal,
    Filtering,
}

/// Interactive paged table over already sorted/limited/projected records,
/// per spec §4.7: `j`/`k` row navigation, `l`/`h` page navigation, `/` to
/// enter a substring search, `c` to clear it, `q`/`Esc` to exit.
pub struct TableView {
    columns: Vec<String>,
    rows: Vec<Value>,
    page: usize,
    page_size: usize,
    state: TableState,
    filter: String,
    mode: Mode,
}

impl TableView {
    pub fn new(columns: Vec<String>, rows: Vec<Value>, page_size: usize) -> Self {
        let mut state = TableState::default();
        if !rows.is_empty() {
            state.select(Some(0));
        }
        TableView {
            columns,
            rows,
            page: 0,
            page_size: page_size.max(1),
            state,
            filter: String::new(),
            mode: Mode::Normal,
        }
    }

    fn filtered(&self) -> Vec<&Value> {
        if self.filter.is_empty() {
            self.rows.iter().collect()
        } else {
            let needle = self.filter.to_lowercase();
            self.rows
                .iter()
                .filter(|r| r.to_string().to_lowercase().contains(&needle))
                .collect()
        }
    }

    fn total_pages(&self, filtered_len: usize) -> usize {
        filtered_len.div_ceil(self.page_size).max(1)
    }

    fn visible(&self) -> Vec<&Value> {
        let filtered = self.filtered();
        let start = self.page * self.page_size;
        filtered.into_iter().skip(start).take(self.page_size).collect()
    }

    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode().map_err(io_err)?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture).map_err(io_err)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend).map_err(io_err)?;

        let result = self.event_loop(&mut terminal);

        disable_raw_mode().map_err(io_err)?;
        execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture).map_err(io_err)?;
        terminal.show_cursor().map_err(io_err)?;

        result
    }

    fn event_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        loop {
            terminal.draw(|f| self.draw(f)).map_err(io_err)?;

            if !event::poll(Duration::from_millis(200)).map_err(io_err)? {
                continue;
            }

            if let Event::Key(key) = event::read().map_err(io_err)? {
                match self.mode {
                    Mode::Filtering => match key.code {
                        KeyCode::Enter | KeyCode::Esc => self.mode = Mode::Normal,
                        KeyCode::Backspace => {
                            self.filter.pop();
                        }
                        KeyCode::Char(c) => self.filter.push(c),
                        _ => {}
                    },
                    Mode::Normal => match key.code {
                        KeyCode::Char('q') | KeyCode::Esc => return Ok(()),
                        KeyCode::Char('j') => self.move_selection(1),
                        KeyCode::Char('k') => self.move_selection(-1),
                        KeyCode::Char('l') => self.next_page(),
                        KeyCode::Char('h') => self.prev_page(),
                        KeyCode::Char('/') => {
                            self.filter.clear();
                            self.mode = Mode::Filtering;
                        }
                        KeyCode::Char('c') => {
                            self.filter.clear();
                            self.page = 0;
                        }
                        _ => {}
                    },
                }
            }
        }
    }

    fn move_selection(&mut self, delta: i64) {
        let len = self.visible().len();
        if len == 0 {
            self.state.select(None);
            return;
        }
        let current = self.state.selected().unwrap_or(0) as i64;
        let next = (current + delta).clamp(0, len as i64 - 1);
        self.state.select(Some(next as usize));
    }

    /// Advance one page. Clamps at the last page; does not wrap.
    fn next_page(&mut self) {
        let total = self.total_pages(self.filtered().len());
        if self.page + 1 < total {
            self.page += 1;
            self.state.select(Some(0));
        }
    }

    /// Retreat one page. Clamps at the first page; does not wrap.
    fn prev_page(&mut self) {
        if self.page > 0 {
            self.page -= 1;
            self.state.select(Some(0));
        }
    }

    fn draw(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(1), Constraint::Length(1)])
            .split(f.area());

        let filtered_len = self.filtered().len();
        let visible = self.visible();
        let header = Row::new(self.columns.iter().map(|c| Cell::from(c.as_str())))
            .style(Style::default().add_modifier(Modifier::BOLD));

        let rows: Vec<Row> = visible
            .iter()
            .map(|record| {
                Row::new(self.columns.iter().map(|col| {
                    let text = cell_text(record, col);
                    let mut cell = Cell::from(text.clone());
                    if let Some(color) = status_color(&text) {
                        cell = cell.style(Style::default().fg(color));
                    }
                    cell
                }))
            })
            .collect();

        let widths: Vec<Constraint> = self
            .columns
            .iter()
            .map(|_| Constraint::Ratio(1, self.columns.len().max(1) as u32))
            .collect();

        let table = Table::new(rows, widths)
            .header(header)
            .block(Block::default().borders(Borders::ALL).title("cfctl"))
            .row_highlight_style(Style::default().add_modifier(Modifier::REVERSED));

        f.render_stateful_widget(table, chunks[0], &mut self.state);

        let total_pages = self.total_pages(filtered_len);
        let status = match self.mode {
            Mode::Filtering => format!("/{}", self.filter),
            Mode::Normal => format!(
                "page {}/{} · {} items · search: {} · j/k move · l/h page · / search · c clear · q quit",
                self.page + 1,
                total_pages,
                filtered_len,
                if self.filter.is_empty() { "(none)" } else { &self.filter },
            ),
        };
        f.render_widget(Paragraph::new(Line::from(status)), chunks[1]);
    }
}

/// Color hint for `status`/`state`-shaped string cells, per spec §4.7.
fn status_color(text: &str) -> Option<Color> {
    match text {
        "SUCCESS" => Some(Color::Green),
        "FAILURE" => Some(Color::Red),
        "PENDING" => Some(Color::Yellow),
        "RUNNING" => Some(Color::Blue),
        _ => None,
    }
}

fn cell_text(record: &Value, column: &str) -> String {
    match record.get(column) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

fn io_err(e: impl std::fmt::Display) -> CfctlError {
    CfctlError::Transport(format!("terminal error: {e}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn visible_without_filter_is_all_rows_on_one_page() {
        let view = TableView::new(
            vec!["name".into()],
            vec![serde_json::json!({"name": "a"}), serde_json::json!({"name": "b"})],
            15,
        );
        assert_eq!(view.visible().len(), 2);
    }

    #[test]
    fn visible_with_filter_matches_substring() {
        let mut view = TableView::new(
            vec!["name".into()],
            vec![serde_json::json!({"name": "alpha"}), serde_json::json!({"name": "beta"})],
            15,
        );
        view.filter = "alp".into();
        assert_eq!(view.visible().len(), 1);
    }

    #[test]
    fn move_selection_clamps_to_bounds() {
        let mut view = TableView::new(
            vec!["name".into()],
            vec![serde_json::json!({"name": "a"}), serde_json::json!({"name": "b"})],
            15,
        );
        view.move_selection(-5);
        assert_eq!(view.state.selected(), Some(0));
        view.move_selection(5);
        assert_eq!(view.state.selected(), Some(1));
    }

    #[test]
    fn cell_text_renders_non_string_values() {
        let record = serde_json::json!({"count": 3});
        assert_eq!(cell_text(&record, "count"), "3");
        assert_eq!(cell_text(&record, "missing"), "");
    }

    #[test]
    fn paginates_with_given_page_size() {
        let rows: Vec<Value> = (0..5).map(|i| serde_json::json!({"name": format!("r{i}")})).collect();
        let mut view = TableView::new(vec!["name".into()], rows, 2);
        assert_eq!(view.visible().len(), 2);
        assert_eq!(view.total_pages(5), 3);

        view.next_page();
        assert_eq!(view.page, 1);
        let visible: Vec<String> = view.visible().iter().map(|r| r["name"].as_str().unwrap().to_string()).collect();
        assert_eq!(visible, vec!["r2".to_string(), "r3".to_string()]);
    }

    #[test]
    fn page_navigation_clamps_without_wrapping() {
        let rows: Vec<Value> = (0..3).map(|i| serde_json::json!({"name": format!("r{i}")})).collect();
        let mut view = TableView::new(vec!["name".into()], rows, 2);

        view.prev_page();
        assert_eq!(view.page, 0, "prev_page must not wrap below the first page");

        view.next_page();
        assert_eq!(view.page, 1);
        view.next_page();
        assert_eq!(view.page, 1, "next_page must not wrap past the last page");
    }

    #[test]
    fn status_color_matches_known_states() {
        assert_eq!(status_color("SUCCESS"), Some(Color::Green));
        assert_eq!(status_color("FAILURE"), Some(Color::Red));
        assert_eq!(status_color("PENDING"), Some(Color::Yellow));
        assert_eq!(status_color("RUNNING"), Some(Color::Blue));
        assert_eq!(status_color("other"), None);
    }
}
