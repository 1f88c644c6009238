//! Line sessions and the prompt loop.

pub mod prompt;
pub mod session;

pub use prompt::{ExitReason, Prompt};
pub use session::{LineSession, Step};
