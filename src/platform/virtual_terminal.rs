//! Headless terminal: a character grid with a scripted key queue.
//!
//! Mirrors xterm output semantics closely enough for cursor bookkeeping to be
//! checked exactly: deferred wrap in the last column, `'\n'` returning to column 0,
//! scrolling when the bottom row overflows, and off-grid cursor moves rejected.

use std::collections::VecDeque;
use std::io;

use crate::core::input::KeyEvent;
use crate::core::terminal::{check_bounds, ScreenPos, Terminal};

/// Scripted input item.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Scripted {
    Key(KeyEvent),
    /// Change the grid size when this point of the script is reached.
    Resize { columns: u16, rows: u16 },
}

#[derive(Debug, Clone)]
pub struct VirtualTerminal {
    columns: u16,
    rows: u16,
    cells: Vec<Vec<char>>,
    column: usize,
    row: usize,
    pending_wrap: bool,
    script: VecDeque<Scripted>,
    /// Keys still in the script count as "already queued" for `key_available`.
    report_queued_keys: bool,
    scrolled: usize,
    output: String,
}

impl VirtualTerminal {
    pub fn new(columns: u16, rows: u16) -> Self {
        let columns = columns.max(1);
        let rows = rows.max(1);
        Self {
            columns,
            rows,
            cells: vec![vec![' '; columns as usize]; rows as usize],
            column: 0,
            row: 0,
            pending_wrap: false,
            script: VecDeque::new(),
            report_queued_keys: true,
            scrolled: 0,
            output: String::new(),
        }
    }

    /// Queue keys to be returned by `read_key`.
    pub fn push_keys<I>(&mut self, keys: I)
    where
        I: IntoIterator<Item = KeyEvent>,
    {
        self.script.extend(keys.into_iter().map(Scripted::Key));
    }

    /// Queue one printable key per character of `text`.
    pub fn type_text(&mut self, text: &str) {
        self.push_keys(text.chars().map(KeyEvent::char));
    }

    /// Resize the grid once every key queued so far has been read.
    pub fn push_resize(&mut self, columns: u16, rows: u16) {
        self.script.push_back(Scripted::Resize { columns, rows });
    }

    /// When disabled, `key_available` reports `false` even with keys left in the
    /// script, modelling a typist who is slower than the redraw.
    pub fn set_report_queued_keys(&mut self, enabled: bool) {
        self.report_queued_keys = enabled;
    }

    pub fn resize(&mut self, columns: u16, rows: u16) {
        let columns = columns.max(1);
        let rows = rows.max(1);
        let mut cells = vec![vec![' '; columns as usize]; rows as usize];
        for (row, line) in self.cells.iter().enumerate().take(rows as usize) {
            for (column, ch) in line.iter().enumerate().take(columns as usize) {
                cells[row][column] = *ch;
            }
        }
        self.cells = cells;
        self.columns = columns;
        self.rows = rows;
        self.column = self.column.min(columns as usize - 1);
        self.row = self.row.min(rows as usize - 1);
        self.pending_wrap = false;
    }

    /// Place the cursor without going through the capability checks.
    pub fn move_cursor(&mut self, column: usize, row: usize) {
        self.column = column.min(self.columns as usize - 1);
        self.row = row.min(self.rows as usize - 1);
        self.pending_wrap = false;
    }

    pub fn cursor(&self) -> ScreenPos {
        ScreenPos::new(self.column, self.row)
    }

    /// Row contents with trailing blanks removed.
    pub fn row_text(&self, row: usize) -> String {
        self.cells
            .get(row)
            .map(|line| line.iter().collect::<String>().trim_end().to_string())
            .unwrap_or_default()
    }

    /// All rows, trailing blanks removed.
    pub fn screen(&self) -> Vec<String> {
        (0..self.rows as usize).map(|row| self.row_text(row)).collect()
    }

    /// Number of rows scrolled off the top so far.
    pub fn scrolled(&self) -> usize {
        self.scrolled
    }

    /// Everything written since the last call.
    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    pub fn pending_keys(&self) -> usize {
        self.script
            .iter()
            .filter(|item| matches!(item, Scripted::Key(_)))
            .count()
    }

    fn line_feed(&mut self) {
        if self.row + 1 < self.rows as usize {
            self.row += 1;
            return;
        }
        self.cells.remove(0);
        self.cells.push(vec![' '; self.columns as usize]);
        self.scrolled += 1;
    }

    fn put_char(&mut self, ch: char) {
        if self.pending_wrap {
            self.column = 0;
            self.line_feed();
            self.pending_wrap = false;
        }
        self.cells[self.row][self.column] = ch;
        if self.column + 1 == self.columns as usize {
            self.pending_wrap = true;
        } else {
            self.column += 1;
        }
    }
}

impl Terminal for VirtualTerminal {
    fn columns(&self) -> u16 {
        self.columns
    }

    fn rows(&self) -> u16 {
        self.rows
    }

    fn cursor_position(&mut self) -> io::Result<ScreenPos> {
        Ok(self.cursor())
    }

    fn set_cursor_position(&mut self, column: usize, row: usize) -> io::Result<()> {
        check_bounds(column, row, self.columns, self.rows)?;
        self.column = column;
        self.row = row;
        self.pending_wrap = false;
        Ok(())
    }

    fn write(&mut self, data: &str) {
        self.output.push_str(data);
        for ch in data.chars() {
            match ch {
                '\n' => {
                    self.column = 0;
                    self.pending_wrap = false;
                    self.line_feed();
                }
                '\r' => {
                    self.column = 0;
                    self.pending_wrap = false;
                }
                ch if ch.is_control() => {}
                ch => self.put_char(ch),
            }
        }
    }

    fn read_key(&mut self) -> io::Result<KeyEvent> {
        loop {
            match self.script.pop_front() {
                Some(Scripted::Key(key)) => return Ok(key),
                Some(Scripted::Resize { columns, rows }) => self.resize(columns, rows),
                None => {
                    return Err(io::Error::new(
                        io::ErrorKind::UnexpectedEof,
                        "scripted input exhausted",
                    ))
                }
            }
        }
    }

    fn key_available(&mut self) -> bool {
        self.report_queued_keys && self.pending_keys() > 0
    }
}
