use thiserror::Error;

/// Failure while querying or moving the terminal during a redraw.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("terminal I/O failed while {operation}: {source}")]
    Terminal {
        operation: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("cursor target ({column}, {row}) is outside the {columns}x{rows} terminal")]
    OutOfBounds {
        column: usize,
        row: usize,
        columns: u16,
        rows: u16,
    },
}

impl RenderError {
    pub(crate) fn terminal(operation: &'static str) -> impl FnOnce(std::io::Error) -> Self {
        move |source| RenderError::Terminal { operation, source }
    }
}

/// Completion search outcome that leaves the buffer untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompletionError {
    #[error("no completion candidate matches '{fragment}'")]
    NoMatch { fragment: String },
}
