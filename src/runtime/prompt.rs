//! Prompt run loop: one session per line, committed lines go to the dispatcher.

use crate::config::PromptOptions;
use crate::core::history::History;
use crate::core::terminal::Terminal;
use crate::dispatch::Dispatcher;
use crate::runtime::session::{LineSession, Step};

/// Why [`Prompt::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    /// The dispatcher answered with the quit sentinel.
    Quit,
    /// Escape pressed twice in a row.
    Escaped,
    /// Reading a key failed, usually because input was closed.
    InputClosed,
}

enum LineOutcome {
    Committed(Vec<char>),
    Ended(ExitReason),
}

/// Owns the history for the lifetime of one embedding application.
#[derive(Debug)]
pub struct Prompt {
    options: PromptOptions,
    history: History,
}

impl Prompt {
    pub fn new(options: PromptOptions) -> Self {
        Self {
            options,
            history: History::new(),
        }
    }

    pub fn options(&self) -> &PromptOptions {
        &self.options
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Print the startup message, then read and dispatch lines until told to stop.
    pub fn run<T, D>(&mut self, term: &mut T, dispatcher: &mut D) -> ExitReason
    where
        T: Terminal,
        D: Dispatcher + ?Sized,
    {
        if !self.options.startup_message.is_empty() {
            term.write(&self.options.startup_message);
            term.write("\n");
        }

        loop {
            let buffer = match self.read_line(term) {
                LineOutcome::Committed(buffer) => buffer,
                LineOutcome::Ended(reason) => {
                    log::debug!("prompt loop ended: {reason:?}");
                    return reason;
                }
            };

            let line: String = buffer.iter().collect();
            if line.trim().is_empty() {
                continue;
            }
            if self.history.record_if_new(&buffer) {
                log::debug!("history now holds {} entries", self.history.len());
            }

            let response = dispatcher.dispatch(&line, &buffer, &self.options.candidates);
            if PromptOptions::is_quit(&response) {
                term.write(&self.options.farewell);
                term.write("\n");
                return ExitReason::Quit;
            }
            term.write(&response);
        }
    }

    fn read_line<T: Terminal>(&mut self, term: &mut T) -> LineOutcome {
        self.history.reset_browse();
        let mut session = LineSession::begin(term, &self.options.prompt);
        loop {
            let key = match term.read_key() {
                Ok(key) => key,
                Err(err) => {
                    log::info!("input closed: {err}");
                    session.finish(term);
                    return LineOutcome::Ended(ExitReason::InputClosed);
                }
            };
            match session.handle_key(term, key, &self.options, &mut self.history) {
                Step::Continue => {}
                Step::Commit => {
                    session.finish(term);
                    return LineOutcome::Committed(session.into_buffer());
                }
                Step::Exit => {
                    session.finish(term);
                    return LineOutcome::Ended(ExitReason::Escaped);
                }
            }
        }
    }
}
