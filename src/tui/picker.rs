#![forbid(unsafe_code)]

use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};

use crate::error::LisaError;
use crate::tui;

#[derive(Debug, Clone)]
pub struct PickerItem {
    pub title: String,
    pub preview: String,
}

/// Lets the user choose one item. Esc, `q` and Ctrl-C cancel.
pub fn pick_one(title: &str, items: &[PickerItem]) -> Result<usize, LisaError> {
    if items.is_empty() {
        return Err(LisaError::Other(
            "no items available for selection".to_owned(),
        ));
    }
    if !tui::is_tty() {
        return Err(LisaError::Other(
            "interactive selection requires a TTY".to_owned(),
        ));
    }

    let terminal = tui::init_terminal()?;
    let mut guard = TerminalGuard {
        terminal: Some(terminal),
    };
    let mut state = PickerState::new(items);

    loop {
        let terminal = guard
            .terminal
            .as_mut()
            .ok_or_else(|| LisaError::Other("terminal unavailable".to_owned()))?;
        terminal
            .draw(|f| draw_ui(f, title, items, &mut state))
            .map_err(|e| LisaError::Other(format!("failed to draw picker: {e}")))?;

        if event::poll(Duration::from_millis(50))
            .map_err(|e| LisaError::Other(format!("event poll failed: {e}")))?
            && let Event::Key(key) =
                event::read().map_err(|e| LisaError::Other(format!("event read failed: {e}")))?
            && key.kind == KeyEventKind::Press
            && let Some(idx) = state.handle_key(key)?
        {
            return Ok(idx);
        }
    }
}

/// Selection and filter state, kept apart from drawing so key handling can
/// be exercised without a terminal.
#[derive(Debug)]
struct PickerState {
    lower_titles: Vec<String>,
    query: String,
    filtered: Vec<usize>,
    list: ListState,
}

impl PickerState {
    fn new(items: &[PickerItem]) -> Self {
        let mut list = ListState::default();
        list.select(Some(0));
        Self {
            lower_titles: items.iter().map(|i| i.title.to_lowercase()).collect(),
            query: String::new(),
            filtered: (0..items.len()).collect(),
            list,
        }
    }

    fn selected(&self) -> usize {
        self.list.selected().unwrap_or(0)
    }

    fn current(&self) -> Option<usize> {
        self.filtered.get(self.selected()).copied()
    }

    /// Returns the chosen item index once the user accepts.
    fn handle_key(&mut self, key: KeyEvent) -> Result<Option<usize>, LisaError> {
        if key.modifiers.contains(KeyModifiers::CONTROL) && matches!(key.code, KeyCode::Char('c')) {
            return Err(LisaError::Cancelled);
        }

        let last = self.filtered.len().saturating_sub(1);
        match key.code {
            KeyCode::Esc => return Err(LisaError::Cancelled),
            KeyCode::Char('q') if self.query.is_empty() => return Err(LisaError::Cancelled),
            KeyCode::Enter => return Ok(self.current()),
            KeyCode::Up => self.list.select(Some(self.selected().saturating_sub(1))),
            KeyCode::Down => self.list.select(Some((self.selected() + 1).min(last))),
            KeyCode::Home => self.list.select(Some(0)),
            KeyCode::End => self.list.select(Some(last)),
            KeyCode::Backspace => {
                self.query.pop();
                self.refilter();
            }
            KeyCode::Char(c)
                if !key.modifiers.contains(KeyModifiers::CONTROL)
                    && !key.modifiers.contains(KeyModifiers::ALT) =>
            {
                self.query.push(c);
                self.refilter();
            }
            _ => {}
        }
        Ok(None)
    }

    fn refilter(&mut self) {
        let q = self.query.to_lowercase();
        self.filtered = self
            .lower_titles
            .iter()
            .enumerate()
            .filter_map(|(i, t)| t.contains(&q).then_some(i))
            .collect();
        if self.filtered.is_empty() {
            self.filtered = (0..self.lower_titles.len()).collect();
        }
        self.list.select(Some(0));
    }
}

fn draw_ui(f: &mut Frame<'_>, title: &str, items: &[PickerItem], state: &mut PickerState) {
    let area = f.area();
    let outer = Block::default().title(title).borders(Borders::ALL);
    let inner = outer.inner(area);
    f.render_widget(outer, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(1), Constraint::Length(1)])
        .split(inner);
    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(chunks[0]);

    let list_items: Vec<ListItem> = state
        .filtered
        .iter()
        .map(|&idx| ListItem::new(Line::from(items[idx].title.clone())))
        .collect();
    let list = List::new(list_items)
        .block(Block::default().borders(Borders::ALL).title("Commands"))
        .highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol(">");
    f.render_stateful_widget(list, body[0], &mut state.list);

    let preview = state
        .current()
        .map(|i| items[i].preview.clone())
        .unwrap_or_default();
    let preview = Paragraph::new(preview)
        .block(Block::default().borders(Borders::ALL).title("Help"))
        .wrap(Wrap { trim: false });
    f.render_widget(preview, body[1]);

    let bottom = Paragraph::new(Line::from(vec![
        Span::styled("Filter: ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(state.query.as_str()),
        Span::raw("  "),
        Span::styled(
            "↑/↓ move • Enter select • Esc quit",
            Style::default().fg(Color::DarkGray),
        ),
    ]));
    f.render_widget(bottom, chunks[1]);
}

struct TerminalGuard {
    terminal: Option<tui::Terminal>,
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        if let Some(terminal) = self.terminal.take() {
            let _ = tui::restore_terminal(terminal);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items() -> Vec<PickerItem> {
        ["add", "list", "remove"]
            .into_iter()
            .map(|t| PickerItem {
                title: t.to_owned(),
                preview: String::new(),
            })
            .collect()
    }

    fn press(state: &mut PickerState, code: KeyCode) -> Result<Option<usize>, LisaError> {
        state.handle_key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn arrows_move_and_enter_accepts() {
        let mut state = PickerState::new(&items());
        assert_eq!(press(&mut state, KeyCode::Down).unwrap(), None);
        assert_eq!(press(&mut state, KeyCode::Down).unwrap(), None);
        assert_eq!(press(&mut state, KeyCode::Down).unwrap(), None);
        assert_eq!(press(&mut state, KeyCode::Enter).unwrap(), Some(2));
    }

    #[test]
    fn typing_filters_the_list() {
        let mut state = PickerState::new(&items());
        press(&mut state, KeyCode::Char('r')).unwrap();
        press(&mut state, KeyCode::Char('e')).unwrap();
        assert_eq!(press(&mut state, KeyCode::Enter).unwrap(), Some(2));

        press(&mut state, KeyCode::Backspace).unwrap();
        press(&mut state, KeyCode::Backspace).unwrap();
        assert_eq!(press(&mut state, KeyCode::Enter).unwrap(), Some(0));
    }

    #[test]
    fn escape_cancels() {
        let mut state = PickerState::new(&items());
        assert!(matches!(
            press(&mut state, KeyCode::Esc),
            Err(LisaError::Cancelled)
        ));
    }
}
