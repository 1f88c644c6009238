//! Drawing the input line.

pub mod renderer;

pub use renderer::LineRenderer;
