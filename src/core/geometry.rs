//! Logical-index to screen-coordinate translation.
//!
//! Offsets are relative to the start of the prompt row: column 0 is the first prompt
//! cell, row 0 is the anchor row. One `char` occupies one column.

use crate::core::terminal::ScreenPos;

/// Number of hard newlines in `buffer[..min(pos + 1, len)]`.
///
/// Zero means `pos` sits on the prompt-prefixed first logical line.
pub fn line_index_at(buffer: &[char], pos: usize) -> usize {
    let end = pos.saturating_add(1).min(buffer.len());
    buffer[..end].iter().filter(|&&ch| ch == '\n').count()
}

/// Column and logical line of `pos`, ignoring terminal width.
///
/// The column restarts at 0 after each hard newline; on logical line 0 it is offset by
/// the prompt length. Returns `(column, line)`.
pub fn relative_position(buffer: &[char], pos: usize, prompt_len: usize) -> (usize, usize) {
    let end = pos.min(buffer.len());
    let mut column = 0;
    let mut line = 0;
    for &ch in &buffer[..end] {
        if ch == '\n' {
            line += 1;
            column = 0;
        } else {
            column += 1;
        }
    }
    if line == 0 {
        column += prompt_len;
    }
    (column, line)
}

/// Wrap arithmetic for a position on the first logical line.
pub fn wrap_position(pos: usize, prompt_len: usize, width: usize) -> ScreenPos {
    let width = width.max(1);
    let absolute = pos + prompt_len;
    ScreenPos::new(absolute % width, absolute / width)
}

/// Screen offset of `pos`, combining hard newlines and width wrapping.
///
/// Follows xterm's deferred wrap: a character written into the last column parks the
/// cursor there and the wrap happens on the next printable character, so a hard newline
/// right after an exactly-filled row does not open an empty row. A cursor that ends
/// parked is reported at column 0 of the next row. Without embedded newlines this equals
/// [`wrap_position`].
pub fn screen_offset(buffer: &[char], pos: usize, prompt_len: usize, width: usize) -> ScreenPos {
    let width = width.max(1);
    let end = pos.min(buffer.len());
    let start = wrap_position(0, prompt_len, width);
    let (mut column, mut row) = (start.column, start.row);
    let mut pending_wrap = false;
    for &ch in &buffer[..end] {
        if ch == '\n' {
            column = 0;
            row += 1;
            pending_wrap = false;
            continue;
        }
        if pending_wrap {
            column = 0;
            row += 1;
            pending_wrap = false;
        }
        if column + 1 == width {
            pending_wrap = true;
        } else {
            column += 1;
        }
    }
    if pending_wrap {
        ScreenPos::new(0, row + 1)
    } else {
        ScreenPos::new(column, row)
    }
}

/// Rows occupied by the prompt plus the whole buffer, cursor-at-end row included.
pub fn rendered_rows(buffer: &[char], prompt_len: usize, width: usize) -> usize {
    screen_offset(buffer, buffer.len(), prompt_len, width).row + 1
}

/// Floor-modulo that never yields a negative column.
pub fn wrap_column(column: isize, width: usize) -> usize {
    let width = width.max(1) as isize;
    (((column % width) + width) % width) as usize
}
