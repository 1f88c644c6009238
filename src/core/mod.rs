//! Terminal-independent editing model.

pub mod completion;
pub mod geometry;
pub mod history;
pub mod input;
pub mod state;
pub mod terminal;
