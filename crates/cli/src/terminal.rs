//! Terminal mode guard for crossterm
//!
//! Ensures the terminal is restored to normal mode on drop (even on panic).

use std::io;

use anyhow::Result;
use crossterm::execute;
use crossterm::terminal::{self, EnterAlternateScreen, LeaveAlternateScreen};

/// Guard that enables raw mode and the alternate screen, restoring both on drop.
///
/// # Example
/// ```no_run
/// let _guard = TerminalGuard::enable()?;
/// // Terminal is now in raw mode on the alternate screen
/// // ... draw frames ...
/// // Normal mode and the main screen come back when the guard is dropped
/// # Ok::<(), anyhow::Error>(())
/// ```
pub struct TerminalGuard;

impl TerminalGuard {
    /// Enable raw mode and switch to the alternate screen.
    ///
    /// If switching screens fails, raw mode is turned back off before the
    /// error is returned.
    pub fn enable() -> Result<Self> {
        terminal::enable_raw_mode()?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = terminal::disable_raw_mode();
            return Err(e.into());
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        // Best-effort restore - ignore errors during cleanup
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        let _ = terminal::disable_raw_mode();
    }
}
