#![forbid(unsafe_code)]

pub mod picker;

use std::io;
use std::io::IsTerminal as _;

use crate::error::LisaError;

pub type Terminal = ratatui::Terminal<ratatui::backend::CrosstermBackend<io::Stdout>>;

#[must_use]
pub fn is_tty() -> bool {
    io::stdin().is_terminal() && io::stdout().is_terminal()
}

pub fn init_terminal() -> Result<Terminal, LisaError> {
    use crossterm::terminal::enable_raw_mode;
    use ratatui::backend::CrosstermBackend;

    enable_raw_mode().map_err(|e| LisaError::Other(format!("failed to enable raw mode: {e}")))?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen)
        .map_err(|e| LisaError::Other(format!("failed to enter alt screen: {e}")))?;
    let backend = CrosstermBackend::new(stdout);
    ratatui::Terminal::new(backend)
        .map_err(|e| LisaError::Other(format!("failed to create terminal: {e}")))
}

pub fn restore_terminal(mut terminal: Terminal) -> Result<(), LisaError> {
    use crossterm::terminal::disable_raw_mode;

    disable_raw_mode()
        .map_err(|e| LisaError::Other(format!("failed to disable raw mode: {e}")))?;
    crossterm::execute!(
        terminal.backend_mut(),
        crossterm::terminal::LeaveAlternateScreen
    )
    .map_err(|e| LisaError::Other(format!("failed to leave alt screen: {e}")))?;
    terminal
        .show_cursor()
        .map_err(|e| LisaError::Other(format!("failed to show cursor: {e}")))?;
    Ok(())
}
