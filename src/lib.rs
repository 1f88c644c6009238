//! Interactive terminal line editor.
//!
//! A prompt loop that edits one line at a time in place: cursor movement, multi-line
//! input with wrapping, history recall, and Tab completion over a caller-supplied
//! candidate set. Committed lines go to a [`Dispatcher`], whose response is printed.
//!
//! # Public API Overview
//! - [`run`] drives the process terminal until the dispatcher returns [`QUIT`] or the
//!   user presses Escape twice.
//! - [`Prompt`] runs the same loop on any [`Terminal`], e.g. a [`VirtualTerminal`].
//! - [`CommandTable`] is a ready-made name-to-handler dispatcher.

pub mod config;
pub mod dispatch;
pub mod error;
pub mod logging;

pub mod core;
pub mod platform;
pub mod render;
pub mod runtime;

pub use crate::config::{EnvConfig, PromptOptions};
pub use crate::core::input::{parse_key, KeyCode, KeyEvent, Modifiers};
pub use crate::core::terminal::{ScreenPos, Terminal, TerminalGuard};
pub use crate::dispatch::{CommandTable, Dispatcher, QUIT};
pub use crate::error::{CompletionError, RenderError};
pub use crate::platform::{ProcessTerminal, VirtualTerminal};
pub use crate::runtime::{ExitReason, Prompt};

/// Run the prompt on the process terminal.
///
/// Blocks until the dispatcher answers [`QUIT`] or input closes. A double Escape
/// restores the terminal and exits the process with status 0.
pub fn run<D>(dispatcher: D, prompt: &str, startup_message: &str, candidates: Option<Vec<String>>)
where
    D: Dispatcher,
{
    let env = EnvConfig::from_env();
    if let Err(err) = logging::init(&env) {
        eprintln!("interactive prompt: cannot open log file: {err}");
    }
    let options = PromptOptions::new(prompt, startup_message)
        .with_candidates(candidates.unwrap_or_default())
        .apply_env(&env);
    if run_with_options(dispatcher, options, &env) == ExitReason::Escaped {
        std::process::exit(0);
    }
}

/// [`run`] without the process exit, for callers that want the [`ExitReason`].
pub fn run_with_options<D>(mut dispatcher: D, options: PromptOptions, env: &EnvConfig) -> ExitReason
where
    D: Dispatcher,
{
    let terminal = ProcessTerminal::new().with_write_log(env.write_log.clone());
    let mut guard = match TerminalGuard::start(terminal) {
        Ok(guard) => guard,
        Err(err) => {
            log::error!("cannot enter raw mode: {err}");
            eprintln!("interactive prompt: cannot enter raw mode: {err}");
            return ExitReason::InputClosed;
        }
    };

    #[cfg(unix)]
    let _signals = {
        let restore = guard.terminal_mut().restore_handle();
        match platform::install_signal_handlers(move |signal| {
            restore.restore();
            std::process::exit(128 + signal);
        }) {
            Ok(signals) => Some(signals),
            Err(err) => {
                log::warn!("signal handlers not installed: {err}");
                None
            }
        }
    };

    let reason = Prompt::new(options).run(guard.terminal_mut(), &mut dispatcher);
    if let Err(err) = guard.finish() {
        log::error!("terminal restore failed: {err}");
    }
    reason
}
