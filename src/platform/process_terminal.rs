//! Raw-mode terminal on the process's stdin/stdout.

use std::collections::VecDeque;
use std::io;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::core::input::{parse_key, KeyCode, KeyEvent};
use crate::core::terminal::{check_bounds, ScreenPos, Terminal};
use crate::platform::stdin_buffer::{StdinBuffer, StdinEvent};

#[cfg(unix)]
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
#[cfg(unix)]
use std::thread::{self, JoinHandle};

#[cfg(unix)]
use libc::{self, c_int};
#[cfg(unix)]
use signal_hook::iterator::Signals;

const PASTE_ON: &str = "\x1b[?2004h";
const PASTE_OFF: &str = "\x1b[?2004l";
const CURSOR_QUERY: &str = "\x1b[6n";
const CURSOR_REPORT_TIMEOUT: Duration = Duration::from_millis(500);

/// Parse a DSR cursor report `ESC [ row ; col R` into a 0-based position.
fn parse_cursor_report(seq: &str) -> Option<ScreenPos> {
    let body = seq.strip_prefix("\x1b[")?.strip_suffix('R')?;
    let (row, column) = body.split_once(';')?;
    let row: usize = row.parse().ok()?;
    let column: usize = column.parse().ok()?;
    Some(ScreenPos::new(column.checked_sub(1)?, row.checked_sub(1)?))
}

/// One key per pasted character; CR, LF and CRLF each become Enter.
fn paste_keys(content: &str) -> Vec<KeyEvent> {
    let normalized = content.replace("\r\n", "\n").replace('\r', "\n");
    normalized
        .chars()
        .filter_map(|ch| match ch {
            '\n' => Some(KeyEvent::plain(KeyCode::Enter)),
            ch if ch.is_control() => None,
            ch => Some(KeyEvent::char(ch)),
        })
        .collect()
}

/// Raw output uses no OPOST translation, so line feeds need an explicit CR.
fn translate_newlines(data: &str) -> String {
    data.replace('\n', "\r\n")
}

#[cfg(unix)]
fn wait_writable(fd: c_int) -> io::Result<()> {
    let mut fds = libc::pollfd {
        fd,
        events: libc::POLLOUT,
        revents: 0,
    };
    loop {
        let result = unsafe { libc::poll(&mut fds, 1, -1) };
        if result < 0 {
            let err = io::Error::last_os_error();
            if err.kind() == io::ErrorKind::Interrupted {
                continue;
            }
            return Err(err);
        }
        if result == 0 {
            continue;
        }
        if (fds.revents & libc::POLLOUT) != 0 {
            return Ok(());
        }
        return Err(io::Error::other(format!(
            "poll(POLLOUT) returned revents=0x{:x}",
            fds.revents
        )));
    }
}

#[cfg(unix)]
fn write_all_fd_with<FWrite, FWait>(
    fd: c_int,
    bytes: &[u8],
    mut write_once: FWrite,
    mut wait_writable: FWait,
) -> io::Result<()>
where
    FWrite: FnMut(c_int, &[u8]) -> io::Result<usize>,
    FWait: FnMut(c_int) -> io::Result<()>,
{
    let mut written = 0;
    while written < bytes.len() {
        match write_once(fd, &bytes[written..]) {
            Ok(0) => {
                return Err(io::Error::new(io::ErrorKind::WriteZero, "write returned 0"));
            }
            Ok(count) => {
                if count > bytes.len() - written {
                    return Err(io::Error::other("write returned more bytes than requested"));
                }
                written += count;
            }
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => wait_writable(fd)?,
            Err(err) => return Err(err),
        }
    }
    Ok(())
}

#[cfg(unix)]
fn write_fd(fd: c_int, data: &str) -> io::Result<()> {
    if data.is_empty() {
        return Ok(());
    }
    write_all_fd_with(
        fd,
        data.as_bytes(),
        |fd, buf| {
            let result = unsafe { libc::write(fd, buf.as_ptr() as *const libc::c_void, buf.len()) };
            if result < 0 {
                Err(io::Error::last_os_error())
            } else {
                Ok(result as usize)
            }
        },
        wait_writable,
    )
}

#[cfg(unix)]
fn read_winsize(fd: c_int) -> Option<(u16, u16)> {
    let mut size = libc::winsize {
        ws_row: 0,
        ws_col: 0,
        ws_xpixel: 0,
        ws_ypixel: 0,
    };
    let result = unsafe { libc::ioctl(fd, libc::TIOCGWINSZ, &mut size) };
    if result == 0 && size.ws_col > 0 && size.ws_row > 0 {
        Some((size.ws_col, size.ws_row))
    } else {
        None
    }
}

#[cfg(unix)]
fn poll_readable(fd: c_int, timeout_ms: i32) -> bool {
    let mut fds = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    let result = unsafe { libc::poll(&mut fds, 1, timeout_ms) };
    result > 0 && (fds.revents & (libc::POLLIN | libc::POLLHUP)) != 0
}

#[cfg(unix)]
fn get_termios(fd: c_int) -> io::Result<libc::termios> {
    let mut termios = unsafe { std::mem::zeroed::<libc::termios>() };
    let result = unsafe { libc::tcgetattr(fd, &mut termios) };
    if result != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(termios)
}

#[cfg(unix)]
fn set_termios(fd: c_int, termios: &libc::termios) -> io::Result<()> {
    let result = unsafe { libc::tcsetattr(fd, libc::TCSANOW, termios) };
    if result != 0 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

/// Snapshot that puts the terminal back the way `start` found it, usable from a signal
/// thread.
#[cfg(unix)]
#[derive(Clone, Copy)]
pub struct TerminalRestore {
    stdin_fd: c_int,
    stdout_fd: c_int,
    original: Option<libc::termios>,
}

#[cfg(unix)]
impl TerminalRestore {
    /// Best-effort: errors are ignored.
    pub fn restore(&self) {
        let _ = write_fd(self.stdout_fd, PASTE_OFF);
        if let Some(original) = self.original.as_ref() {
            let _ = set_termios(self.stdin_fd, original);
        }
    }
}

#[cfg(unix)]
pub struct ProcessTerminal {
    stdin_fd: c_int,
    stdout_fd: c_int,
    original_termios: Option<libc::termios>,
    stdin_buffer: StdinBuffer,
    keys: VecDeque<KeyEvent>,
    cursor_report: Option<ScreenPos>,
    write_log_path: Option<PathBuf>,
    write_log_failed: bool,
}

#[cfg(unix)]
impl ProcessTerminal {
    pub fn new() -> Self {
        Self {
            stdin_fd: libc::STDIN_FILENO,
            stdout_fd: libc::STDOUT_FILENO,
            original_termios: None,
            stdin_buffer: StdinBuffer::default(),
            keys: VecDeque::new(),
            cursor_report: None,
            write_log_path: None,
            write_log_failed: false,
        }
    }

    /// Append everything written to the terminal to `path`.
    pub fn with_write_log(mut self, path: Option<PathBuf>) -> Self {
        self.write_log_path = path;
        self
    }

    pub fn restore_handle(&self) -> TerminalRestore {
        TerminalRestore {
            stdin_fd: self.stdin_fd,
            stdout_fd: self.stdout_fd,
            original: self.original_termios,
        }
    }

    fn enable_raw_mode(&mut self) -> io::Result<()> {
        let original = match self.original_termios {
            Some(original) => original,
            None => {
                let original = get_termios(self.stdin_fd)?;
                self.original_termios = Some(original);
                original
            }
        };
        let mut raw = original;
        unsafe {
            libc::cfmakeraw(&mut raw);
        }
        set_termios(self.stdin_fd, &raw)
    }

    fn restore_raw_mode(&mut self) -> io::Result<()> {
        if let Some(original) = self.original_termios.as_ref() {
            set_termios(self.stdin_fd, original)?;
        }
        Ok(())
    }

    fn write_control(&mut self, data: &str) {
        if let Err(err) = write_fd(self.stdout_fd, data) {
            log::error!("terminal write failed: {err}");
        }
    }

    fn log_output(&mut self, data: &str) {
        if self.write_log_failed {
            return;
        }
        if let Some(path) = self.write_log_path.as_deref() {
            if let Err(err) = crate::logging::append_raw(path, data) {
                log::warn!("disabling write log {}: {err}", path.display());
                self.write_log_failed = true;
            }
        }
    }

    /// Read whatever stdin has within `timeout_ms` (negative blocks) and decode it.
    fn fill(&mut self, timeout_ms: i32) -> io::Result<()> {
        let timeout = self.stdin_buffer.next_timeout_ms(Instant::now(), timeout_ms);
        let events = if poll_readable(self.stdin_fd, timeout) {
            let mut buf = [0u8; 4096];
            let read = unsafe {
                libc::read(
                    self.stdin_fd,
                    buf.as_mut_ptr() as *mut libc::c_void,
                    buf.len(),
                )
            };
            if read < 0 {
                let err = io::Error::last_os_error();
                if err.kind() == io::ErrorKind::Interrupted {
                    return Ok(());
                }
                return Err(err);
            }
            if read == 0 {
                return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "stdin closed"));
            }
            self.stdin_buffer.process(&buf[..read as usize])
        } else {
            self.stdin_buffer.flush_due(Instant::now())
        };
        for event in events {
            self.queue_event(event);
        }
        Ok(())
    }

    fn queue_event(&mut self, event: StdinEvent) {
        match event {
            StdinEvent::Data(seq) => {
                if let Some(pos) = parse_cursor_report(&seq) {
                    self.cursor_report = Some(pos);
                } else if let Some(key) = parse_key(&seq) {
                    self.keys.push_back(key);
                } else {
                    log::trace!("ignoring unrecognised input {seq:?}");
                }
            }
            StdinEvent::Paste(content) => self.keys.extend(paste_keys(&content)),
        }
    }
}

#[cfg(unix)]
impl Default for ProcessTerminal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
impl Terminal for ProcessTerminal {
    fn start(&mut self) -> io::Result<()> {
        self.enable_raw_mode()?;
        self.write_control(PASTE_ON);
        Ok(())
    }

    fn stop(&mut self) -> io::Result<()> {
        self.write_control(PASTE_OFF);
        // Drop unread input so it does not leak to the shell.
        let _ = unsafe { libc::tcflush(self.stdin_fd, libc::TCIFLUSH) };
        self.stdin_buffer.clear();
        self.restore_raw_mode()
    }

    fn columns(&self) -> u16 {
        read_winsize(self.stdout_fd)
            .map(|(cols, _)| cols)
            .unwrap_or(80)
    }

    fn rows(&self) -> u16 {
        read_winsize(self.stdout_fd)
            .map(|(_, rows)| rows)
            .unwrap_or(24)
    }

    fn cursor_position(&mut self) -> io::Result<ScreenPos> {
        self.cursor_report = None;
        self.write_control(CURSOR_QUERY);
        let deadline = Instant::now() + CURSOR_REPORT_TIMEOUT;
        loop {
            if let Some(pos) = self.cursor_report.take() {
                return Ok(pos);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Err(io::Error::new(
                    io::ErrorKind::TimedOut,
                    "terminal did not answer the cursor position query",
                ));
            }
            self.fill(remaining.as_millis().max(1) as i32)?;
        }
    }

    fn set_cursor_position(&mut self, column: usize, row: usize) -> io::Result<()> {
        check_bounds(column, row, self.columns(), self.rows())?;
        write_fd(self.stdout_fd, &format!("\x1b[{};{}H", row + 1, column + 1))
    }

    fn write(&mut self, data: &str) {
        self.write_control(&translate_newlines(data));
        self.log_output(data);
    }

    fn read_key(&mut self) -> io::Result<KeyEvent> {
        loop {
            if let Some(key) = self.keys.pop_front() {
                return Ok(key);
            }
            self.fill(-1)?;
        }
    }

    fn key_available(&mut self) -> bool {
        if self.keys.is_empty() && poll_readable(self.stdin_fd, 0) {
            if let Err(err) = self.fill(0) {
                log::debug!("input check failed: {err}");
            }
        }
        !self.keys.is_empty() || self.stdin_buffer.has_pending()
    }
}

/// Stops the signal thread on drop.
#[cfg(unix)]
pub struct SignalHookGuard {
    handle: signal_hook::iterator::Handle,
    thread: Option<JoinHandle<()>>,
}

#[cfg(unix)]
impl Drop for SignalHookGuard {
    fn drop(&mut self) {
        self.handle.close();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Run `cleanup` once on the first SIGTERM or SIGHUP, passing the signal number.
#[cfg(unix)]
pub fn install_signal_handlers<F>(cleanup: F) -> io::Result<SignalHookGuard>
where
    F: Fn(c_int) + Send + Sync + 'static,
{
    let ran = Arc::new(AtomicBool::new(false));
    let mut signals = Signals::new([libc::SIGTERM, libc::SIGHUP])?;
    let handle = signals.handle();
    let thread = thread::spawn(move || {
        for signal in signals.forever() {
            if !ran.swap(true, Ordering::SeqCst) {
                cleanup(signal);
            }
        }
    });
    Ok(SignalHookGuard {
        handle,
        thread: Some(thread),
    })
}

#[cfg(not(unix))]
pub struct ProcessTerminal;

#[cfg(not(unix))]
impl ProcessTerminal {
    pub fn new() -> Self {
        Self
    }

    pub fn with_write_log(self, _path: Option<PathBuf>) -> Self {
        self
    }
}

#[cfg(not(unix))]
impl Default for ProcessTerminal {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(not(unix))]
fn unsupported() -> io::Error {
    io::Error::new(
        io::ErrorKind::Unsupported,
        "interactive prompt requires a unix terminal",
    )
}

#[cfg(not(unix))]
impl Terminal for ProcessTerminal {
    fn start(&mut self) -> io::Result<()> {
        Err(unsupported())
    }

    fn columns(&self) -> u16 {
        80
    }

    fn rows(&self) -> u16 {
        24
    }

    fn cursor_position(&mut self) -> io::Result<ScreenPos> {
        Err(unsupported())
    }

    fn set_cursor_position(&mut self, _column: usize, _row: usize) -> io::Result<()> {
        Err(unsupported())
    }

    fn write(&mut self, _data: &str) {}

    fn read_key(&mut self) -> io::Result<KeyEvent> {
        Err(unsupported())
    }

    fn key_available(&mut self) -> bool {
        false
    }
}
