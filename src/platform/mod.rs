//! Terminal implementations.

pub mod process_terminal;
pub mod stdin_buffer;
pub mod virtual_terminal;

#[cfg(unix)]
pub use process_terminal::{install_signal_handlers, SignalHookGuard, TerminalRestore};
pub use process_terminal::ProcessTerminal;
pub use virtual_terminal::VirtualTerminal;
