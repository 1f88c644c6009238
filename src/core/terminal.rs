//! Terminal capability consumed by the line editor.

use std::io;

use crate::core::input::KeyEvent;

/// Absolute, 0-based screen coordinate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScreenPos {
    pub column: usize,
    pub row: usize,
}

impl ScreenPos {
    pub fn new(column: usize, row: usize) -> Self {
        Self { column, row }
    }
}

/// Minimal terminal interface for the editor.
///
/// Implementations are owned exclusively by one prompt loop; nothing here is shared
/// across threads.
pub trait Terminal {
    /// Put the device into the mode the editor needs (raw input, paste reporting).
    fn start(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Restore the device to the state `start` found it in.
    fn stop(&mut self) -> io::Result<()> {
        Ok(())
    }

    /// Terminal dimensions.
    fn columns(&self) -> u16;
    fn rows(&self) -> u16;

    /// Current cursor location.
    fn cursor_position(&mut self) -> io::Result<ScreenPos>;

    /// Move the cursor. Fails with `InvalidInput` when the target is off-grid.
    fn set_cursor_position(&mut self, column: usize, row: usize) -> io::Result<()>;

    /// Write raw text at the cursor. `'\n'` moves to column 0 of the next row.
    fn write(&mut self, data: &str);

    /// Block until one key is available. `UnexpectedEof` once input is closed.
    fn read_key(&mut self) -> io::Result<KeyEvent>;

    /// Whether another key is already buffered, without blocking.
    fn key_available(&mut self) -> bool;
}

/// Check a cursor target against the current grid.
pub(crate) fn check_bounds(column: usize, row: usize, columns: u16, rows: u16) -> io::Result<()> {
    if column >= columns as usize || row >= rows as usize {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("cursor target ({column}, {row}) outside {columns}x{rows} terminal"),
        ));
    }
    Ok(())
}

/// RAII guard that stops the terminal on drop.
pub struct TerminalGuard<T: Terminal> {
    terminal: T,
    stopped: bool,
}

impl<T: Terminal> TerminalGuard<T> {
    /// Start `terminal` and take ownership of it.
    pub fn start(mut terminal: T) -> io::Result<Self> {
        terminal.start()?;
        Ok(Self {
            terminal,
            stopped: false,
        })
    }

    /// Access the wrapped terminal.
    pub fn terminal_mut(&mut self) -> &mut T {
        &mut self.terminal
    }

    /// Stop the terminal now instead of at drop.
    pub fn finish(mut self) -> io::Result<()> {
        self.stopped = true;
        self.terminal.stop()
    }
}

impl<T: Terminal> Drop for TerminalGuard<T> {
    fn drop(&mut self) {
        if !self.stopped {
            let _ = self.terminal.stop();
        }
    }
}
