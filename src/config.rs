//! Environment and embedding configuration.

use std::env;
use std::path::PathBuf;

use crate::dispatch::QUIT;

pub const DEFAULT_FAREWELL: &str = "GoodBye!";
pub const DEFAULT_ESCAPE_WARNING: &str = "Press Escape again to exit.";

/// Settings read from the process environment.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    /// Raw terminal output is appended to this file.
    pub write_log: Option<PathBuf>,
    /// Diagnostic log file.
    pub log_file: Option<PathBuf>,
    pub debug: bool,
    pub no_paste_detect: bool,
}

impl EnvConfig {
    pub fn from_env() -> Self {
        Self {
            write_log: env_string_opt("PROMPT_WRITE_LOG").map(PathBuf::from),
            log_file: env_string_opt("PROMPT_LOG").map(PathBuf::from),
            debug: env_flag("PROMPT_DEBUG"),
            no_paste_detect: env_flag("PROMPT_NO_PASTE_DETECT"),
        }
    }
}

fn env_flag(key: &str) -> bool {
    env::var(key).map(|value| value == "1").unwrap_or(false)
}

fn env_string_opt(key: &str) -> Option<String> {
    env::var(key).ok().and_then(|value| {
        if value.trim().is_empty() {
            None
        } else {
            Some(value)
        }
    })
}

/// What the embedding application controls about a prompt run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptOptions {
    pub prompt: String,
    pub startup_message: String,
    /// Tab-completion candidates; empty disables completion.
    pub candidates: Vec<String>,
    /// Written when the dispatcher answers with [`QUIT`].
    pub farewell: String,
    pub escape_warning: String,
    /// Treat Enter as a soft newline while more input is already queued.
    pub paste_detection: bool,
}

impl PromptOptions {
    pub fn new(prompt: impl Into<String>, startup_message: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            startup_message: startup_message.into(),
            candidates: Vec::new(),
            farewell: DEFAULT_FAREWELL.to_string(),
            escape_warning: DEFAULT_ESCAPE_WARNING.to_string(),
            paste_detection: true,
        }
    }

    pub fn with_candidates<I, S>(mut self, candidates: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.candidates = candidates.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_farewell(mut self, farewell: impl Into<String>) -> Self {
        self.farewell = farewell.into();
        self
    }

    pub fn with_paste_detection(mut self, enabled: bool) -> Self {
        self.paste_detection = enabled;
        self
    }

    /// Fold environment overrides in.
    pub fn apply_env(mut self, config: &EnvConfig) -> Self {
        if config.no_paste_detect {
            self.paste_detection = false;
        }
        self
    }

    /// Whether `response` asks the prompt loop to stop.
    pub fn is_quit(response: &str) -> bool {
        response == QUIT
    }
}
