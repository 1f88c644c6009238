//! Line renderer: redraws the input buffer in place below its prompt.

use std::iter;

use crate::core::geometry::{rendered_rows, screen_offset, wrap_column};
use crate::core::state::SessionState;
use crate::core::terminal::{ScreenPos, Terminal};
use crate::error::RenderError;

/// Extra blanks written past the cleared content.
pub const CLEAR_MARGIN: usize = 5;

/// Tracks what is on screen for the current line so it can be blanked exactly.
#[derive(Debug, Default)]
pub struct LineRenderer {
    drawn: Vec<char>,
}

impl LineRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer content as last written to the terminal.
    pub fn drawn(&self) -> &[char] {
        &self.drawn
    }

    /// Start a new line: ensure column 0, write the prompt, and return the fresh state.
    pub fn begin_line<T: Terminal>(
        &mut self,
        term: &mut T,
        prompt: &str,
    ) -> Result<SessionState, RenderError> {
        self.drawn.clear();
        let mut pos = term
            .cursor_position()
            .map_err(RenderError::terminal("reading the cursor"))?;
        if pos.column != 0 {
            term.write("\n");
            pos = term
                .cursor_position()
                .map_err(RenderError::terminal("reading the cursor"))?;
        }
        term.write(prompt);
        Ok(SessionState::new(prompt.chars().count(), pos.row))
    }

    /// Blank the drawn content, hard newlines kept, plus up to [`CLEAR_MARGIN`] cells that
    /// stay on the row where the content ends.
    pub fn clear_line<T: Terminal>(
        &mut self,
        term: &mut T,
        state: &SessionState,
    ) -> Result<(), RenderError> {
        let width = term.columns() as usize;
        let start = screen_offset(&self.drawn, 0, state.prompt_width, width);
        let end = screen_offset(&self.drawn, self.drawn.len(), state.prompt_width, width);
        move_to(term, start.column, state.anchor.row + start.row)?;

        let pad = CLEAR_MARGIN.min(width - end.column);
        let blanks: String = self
            .drawn
            .iter()
            .map(|&ch| if ch == '\n' { '\n' } else { ' ' })
            .chain(iter::repeat(' ').take(pad))
            .collect();
        term.write(&blanks);
        Ok(())
    }

    /// Write `buffer` from the anchor and place the cursor at `state.cursor`.
    ///
    /// When the content or the cursor would land below the bottom row the screen is
    /// scrolled by exactly the overflow and the draw is retried once.
    pub fn rewrite_line<T: Terminal>(
        &mut self,
        term: &mut T,
        state: &mut SessionState,
        buffer: &[char],
    ) -> Result<(), RenderError> {
        self.rewrite_line_with_scroll(term, state, buffer, true)
    }

    fn rewrite_line_with_scroll<T: Terminal>(
        &mut self,
        term: &mut T,
        state: &mut SessionState,
        buffer: &[char],
        may_scroll: bool,
    ) -> Result<(), RenderError> {
        let width = term.columns() as usize;
        let height = term.rows() as usize;
        let cursor = screen_offset(buffer, state.cursor, state.prompt_width, width);
        let end = screen_offset(buffer, buffer.len(), state.prompt_width, width);

        let lowest = state.anchor.row + cursor.row.max(end.row);
        if lowest >= height {
            if may_scroll {
                self.scroll_buffer(term, state, lowest + 1 - height)?;
                return self.rewrite_line_with_scroll(term, state, buffer, false);
            }
            log::debug!(
                "line needs {} rows but the terminal has {height}; clamping cursor",
                lowest + 1 - state.anchor.row
            );
        }

        let start = screen_offset(buffer, 0, state.prompt_width, width);
        move_to(term, start.column, state.anchor.row + start.row)?;
        term.write(&buffer.iter().collect::<String>());
        self.drawn = buffer.to_vec();

        let row = (state.anchor.row + cursor.row).min(height.saturating_sub(1));
        move_to(term, wrap_column(cursor.column as isize, width), row)
    }

    /// Clear whatever is drawn, then draw `buffer`.
    pub fn redraw<T: Terminal>(
        &mut self,
        term: &mut T,
        state: &mut SessionState,
        buffer: &[char],
    ) -> Result<(), RenderError> {
        self.clear_line(term, state)?;
        self.rewrite_line(term, state, buffer)
    }

    /// Move the terminal cursor to `state.cursor` without rewriting content.
    pub fn place_cursor<T: Terminal>(
        &mut self,
        term: &mut T,
        state: &mut SessionState,
        buffer: &[char],
    ) -> Result<(), RenderError> {
        let width = term.columns() as usize;
        let height = term.rows() as usize;
        let cursor = screen_offset(buffer, state.cursor, state.prompt_width, width);
        let row = state.anchor.row + cursor.row;
        if row >= height {
            return self.rewrite_line(term, state, buffer);
        }
        move_to(term, wrap_column(cursor.column as isize, width), row)
    }

    /// Push the visible region up by `lines` rows and follow with the anchor.
    fn scroll_buffer<T: Terminal>(
        &mut self,
        term: &mut T,
        state: &mut SessionState,
        lines: usize,
    ) -> Result<(), RenderError> {
        let height = term.rows() as usize;
        move_to(term, 0, height.saturating_sub(1))?;
        term.write(&"\n".repeat(lines));
        state.anchor.row = state.anchor.row.saturating_sub(lines);
        log::debug!("scrolled {lines} row(s); anchor now at row {}", state.anchor.row);
        Ok(())
    }

    /// Leave the cursor at column 0 of the first row below the drawn block.
    pub fn move_below<T: Terminal>(
        &mut self,
        term: &mut T,
        state: &SessionState,
        buffer: &[char],
    ) -> Result<(), RenderError> {
        let width = term.columns() as usize;
        let height = term.rows() as usize;
        let rows = rendered_rows(buffer, state.prompt_width, width);
        let last = (state.anchor.row + rows - 1).min(height.saturating_sub(1));
        move_to(term, 0, last)?;
        term.write("\n");
        Ok(())
    }

    /// Print `notice` under the block, then redraw prompt and buffer on a fresh row.
    pub fn relocate<T: Terminal>(
        &mut self,
        term: &mut T,
        state: &mut SessionState,
        buffer: &[char],
        prompt: &str,
        notice: &str,
    ) -> Result<(), RenderError> {
        self.move_below(term, state, buffer)?;
        term.write(notice);
        term.write("\n");
        let pos = term
            .cursor_position()
            .map_err(RenderError::terminal("reading the cursor"))?;
        state.anchor = ScreenPos::new(state.prompt_width, pos.row);
        term.write(prompt);
        self.drawn.clear();
        self.rewrite_line(term, state, buffer)
    }
}

fn move_to<T: Terminal>(term: &mut T, column: usize, row: usize) -> Result<(), RenderError> {
    let columns = term.columns();
    let rows = term.rows();
    if column >= columns as usize || row >= rows as usize {
        return Err(RenderError::OutOfBounds {
            column,
            row,
            columns,
            rows,
        });
    }
    term.set_cursor_position(column, row)
        .map_err(RenderError::terminal("moving the cursor"))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::LineRenderer;
    use crate::core::terminal::{ScreenPos, Terminal};
    use crate::error::RenderError;
    use crate::platform::virtual_terminal::VirtualTerminal;

    const PROMPT: &str = "prompt> ";

    fn chars(text: &str) -> Vec<char> {
        text.chars().collect()
    }

    #[test]
    fn begin_line_writes_prompt_on_fresh_row() {
        let mut term = VirtualTerminal::new(20, 5);
        term.write("banner");
        let mut renderer = LineRenderer::new();
        let state = renderer.begin_line(&mut term, PROMPT).expect("begin");
        assert_eq!(state.anchor, ScreenPos::new(8, 1));
        assert_eq!(term.screen()[..2], ["banner".to_string(), "prompt>".to_string()]);
        assert_eq!(term.cursor(), ScreenPos::new(8, 1));
    }

    #[test]
    fn rewrite_places_cursor_after_wrap() {
        let mut term = VirtualTerminal::new(10, 5);
        let mut renderer = LineRenderer::new();
        let mut state = renderer.begin_line(&mut term, PROMPT).expect("begin");
        let buffer = chars("hello");
        state.cursor = buffer.len();
        renderer
            .rewrite_line(&mut term, &mut state, &buffer)
            .expect("rewrite");
        assert_eq!(term.row_text(0), "prompt> he");
        assert_eq!(term.row_text(1), "llo");
        assert_eq!(term.cursor(), ScreenPos::new(3, 1));
    }

    #[test]
    fn clear_blanks_previous_multiline_content() {
        let mut term = VirtualTerminal::new(20, 5);
        let mut renderer = LineRenderer::new();
        let mut state = renderer.begin_line(&mut term, PROMPT).expect("begin");
        let long = chars("ab\ncdef");
        state.cursor = long.len();
        renderer.rewrite_line(&mut term, &mut state, &long).expect("draw");

        let short = chars("abcdef");
        state.cursor = 2;
        renderer.redraw(&mut term, &mut state, &short).expect("redraw");
        assert_eq!(term.row_text(0), "prompt> abcdef");
        assert_eq!(term.row_text(1), "");
        assert_eq!(term.cursor(), ScreenPos::new(10, 0));
    }

    #[test]
    fn overflow_scrolls_and_moves_anchor_up() {
        let mut term = VirtualTerminal::new(10, 3);
        term.write("one\ntwo\n");
        let mut renderer = LineRenderer::new();
        let mut state = renderer.begin_line(&mut term, PROMPT).expect("begin");
        assert_eq!(state.anchor.row, 2);

        let buffer = chars("hello");
        state.cursor = buffer.len();
        renderer
            .rewrite_line(&mut term, &mut state, &buffer)
            .expect("rewrite");
        assert_eq!(state.anchor.row, 1);
        assert_eq!(term.screen(), vec!["two", "prompt> he", "llo"]);
        assert_eq!(term.cursor(), ScreenPos::new(3, 2));
        assert_eq!(term.scrolled(), 1);
    }

    #[test]
    fn exact_fill_at_bottom_scrolls_for_the_cursor_row() {
        let mut term = VirtualTerminal::new(10, 2);
        term.write("x\n");
        let mut renderer = LineRenderer::new();
        let mut state = renderer.begin_line(&mut term, PROMPT).expect("begin");
        let buffer = chars("ab");
        state.cursor = buffer.len();
        renderer
            .rewrite_line(&mut term, &mut state, &buffer)
            .expect("rewrite");
        assert_eq!(state.anchor.row, 0);
        assert_eq!(term.screen(), vec!["prompt> ab", ""]);
        assert_eq!(term.cursor(), ScreenPos::new(0, 1));
    }

    #[test]
    fn shrunk_terminal_reports_out_of_bounds() {
        let mut term = VirtualTerminal::new(20, 5);
        term.write("\n\n\n\n");
        let mut renderer = LineRenderer::new();
        let mut state = renderer.begin_line(&mut term, PROMPT).expect("begin");
        let buffer = chars("abc");
        state.cursor = buffer.len();
        renderer.rewrite_line(&mut term, &mut state, &buffer).expect("draw");

        term.resize(20, 3);
        let err = renderer
            .clear_line(&mut term, &state)
            .expect_err("anchor row is gone");
        assert!(matches!(
            err,
            RenderError::OutOfBounds { row: 4, rows: 3, .. }
        ));
    }

    #[test]
    fn relocate_prints_notice_and_redraws_below() {
        let mut term = VirtualTerminal::new(30, 6);
        let mut renderer = LineRenderer::new();
        let mut state = renderer.begin_line(&mut term, PROMPT).expect("begin");
        let buffer = chars("abc");
        state.cursor = 1;
        renderer.rewrite_line(&mut term, &mut state, &buffer).expect("draw");

        renderer
            .relocate(&mut term, &mut state, &buffer, PROMPT, "heads up")
            .expect("relocate");
        assert_eq!(
            term.screen()[..3],
            [
                "prompt> abc".to_string(),
                "heads up".to_string(),
                "prompt> abc".to_string()
            ]
        );
        assert_eq!(state.anchor, ScreenPos::new(8, 2));
        assert_eq!(term.cursor(), ScreenPos::new(9, 2));
    }
}
