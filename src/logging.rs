//! Diagnostic log sink.
//!
//! The library logs through the `log` facade. Output never goes to the terminal being
//! edited; `init` routes it to the file named by `PROMPT_LOG`, or nowhere.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;

use log::LevelFilter;

use crate::config::EnvConfig;

/// Install the file logger. `Ok(false)` when no log file is configured or a logger is
/// already installed.
pub fn init(config: &EnvConfig) -> io::Result<bool> {
    let Some(path) = config.log_file.as_deref() else {
        return Ok(false);
    };
    let file = open_log(path)?;
    let installed = env_logger::Builder::new()
        .filter_level(level_for(config))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} {:<5} {}: {}",
                buf.timestamp_millis(),
                record.level(),
                record.target(),
                record.args()
            )
        })
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()
        .is_ok();
    Ok(installed)
}

fn level_for(config: &EnvConfig) -> LevelFilter {
    if config.debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

fn open_log(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

/// Append raw terminal output to `path`.
pub(crate) fn append_raw(path: &Path, data: &str) -> io::Result<()> {
    let mut file = open_log(path)?;
    file.write_all(data.as_bytes())
}
