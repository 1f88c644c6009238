//! Per-line keystroke state machine.

use crate::config::PromptOptions;
use crate::core::completion::{fragment_before, CompletionCycle, Direction};
use crate::core::history::{ForwardRecall, History};
use crate::core::input::{KeyCode, KeyEvent};
use crate::core::state::SessionState;
use crate::core::terminal::Terminal;
use crate::error::RenderError;
use crate::render::renderer::LineRenderer;

/// What the prompt loop should do after a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Continue,
    /// Plain Enter: the buffer is final.
    Commit,
    /// Second consecutive Escape.
    Exit,
}

/// Active Tab cycle and the text it last put into the buffer.
#[derive(Debug)]
struct Completing {
    cycle: CompletionCycle,
    inserted: String,
}

/// One input line from prompt to commit.
#[derive(Debug)]
pub struct LineSession {
    buffer: Vec<char>,
    state: SessionState,
    completing: Option<Completing>,
    renderer: LineRenderer,
}

impl LineSession {
    /// Write the prompt on a fresh row and capture the anchor.
    ///
    /// If the cursor cannot be located the prompt is still written and the bottom row is
    /// assumed.
    pub fn begin<T: Terminal>(term: &mut T, prompt: &str) -> Self {
        let mut renderer = LineRenderer::new();
        let state = match renderer.begin_line(term, prompt) {
            Ok(state) => state,
            Err(err) => {
                log::warn!("starting line without a cursor position: {err}");
                term.write("\n");
                term.write(prompt);
                SessionState::new(
                    prompt.chars().count(),
                    (term.rows() as usize).saturating_sub(1),
                )
            }
        };
        Self {
            buffer: Vec::new(),
            state,
            completing: None,
            renderer,
        }
    }

    pub fn buffer(&self) -> &[char] {
        &self.buffer
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_completing(&self) -> bool {
        self.completing.is_some()
    }

    pub fn into_buffer(self) -> Vec<char> {
        self.buffer
    }

    /// Park the cursor on the row below the line so output starts clean.
    pub fn finish<T: Terminal>(&mut self, term: &mut T) {
        if let Err(err) = self.renderer.move_below(term, &self.state, &self.buffer) {
            log::warn!("could not move below the input line: {err}");
            term.write("\n");
        }
    }

    pub fn handle_key<T: Terminal>(
        &mut self,
        term: &mut T,
        key: KeyEvent,
        options: &PromptOptions,
        history: &mut History,
    ) -> Step {
        let step = match self.apply(term, key, options, history) {
            Ok(step) => step,
            Err(err) => {
                self.report(term, options, &err);
                Step::Continue
            }
        };
        if key.code != KeyCode::Tab {
            self.completing = None;
        }
        self.state.last_key = Some(key);
        step
    }

    fn apply<T: Terminal>(
        &mut self,
        term: &mut T,
        key: KeyEvent,
        options: &PromptOptions,
        history: &mut History,
    ) -> Result<Step, RenderError> {
        let ctrl_char = |ch: char| key.modifiers.ctrl && key.code == KeyCode::Char(ch);
        match key.code {
            KeyCode::Left => {
                if self.state.cursor > 0 {
                    self.state.cursor -= 1;
                    self.place_cursor(term)?;
                }
            }
            KeyCode::Right => {
                if self.state.cursor < self.buffer.len() {
                    self.state.cursor += 1;
                    self.place_cursor(term)?;
                }
            }
            KeyCode::Home => self.move_to(term, 0)?,
            KeyCode::Char(_) if ctrl_char('h') => self.move_to(term, 0)?,
            KeyCode::End => self.move_to(term, self.buffer.len())?,
            KeyCode::Char(_) if ctrl_char('e') => self.move_to(term, self.buffer.len())?,
            KeyCode::Delete => {
                if self.state.cursor < self.buffer.len() {
                    self.buffer.remove(self.state.cursor);
                    self.redraw(term)?;
                }
            }
            KeyCode::Backspace => {
                if self.state.cursor > 0 {
                    self.state.cursor -= 1;
                    self.buffer.remove(self.state.cursor);
                    self.redraw(term)?;
                }
            }
            KeyCode::Up => {
                if let Some(entry) = history.recall_backward() {
                    self.replace_buffer(term, entry)?;
                }
            }
            KeyCode::Down => match history.recall_forward() {
                ForwardRecall::Entry(entry) => self.replace_buffer(term, entry)?,
                ForwardRecall::Fresh => self.replace_buffer(term, Vec::new())?,
            },
            KeyCode::Tab => {
                if !options.candidates.is_empty() {
                    self.complete(term, &options.candidates, key)?;
                }
            }
            KeyCode::Enter => {
                let soft = key.modifiers.shift
                    || key.modifiers.alt
                    || (options.paste_detection && term.key_available());
                if !soft {
                    log::debug!("commit {} char(s)", self.buffer.len());
                    return Ok(Step::Commit);
                }
                self.insert(term, '\n')?;
            }
            KeyCode::Escape => {
                if self.state.repeated(&key) {
                    return Ok(Step::Exit);
                }
                self.renderer.relocate(
                    term,
                    &mut self.state,
                    &self.buffer,
                    &options.prompt,
                    &options.escape_warning,
                )?;
            }
            KeyCode::Char(_) => {
                if let Some(ch) = key.printable() {
                    self.insert(term, ch)?;
                }
            }
        }
        Ok(Step::Continue)
    }

    fn complete<T: Terminal>(
        &mut self,
        term: &mut T,
        candidates: &[String],
        key: KeyEvent,
    ) -> Result<(), RenderError> {
        let continuing = self.completing.is_some()
            && self.state.last_key.is_some_and(|last| last.code == KeyCode::Tab);
        if !continuing {
            let fragment = fragment_before(&self.buffer, self.state.cursor);
            self.completing = Some(Completing {
                cycle: CompletionCycle::new(candidates, &fragment),
                inserted: fragment,
            });
        }
        let Some(completing) = self.completing.as_mut() else {
            return Ok(());
        };

        let next = completing
            .cycle
            .next_match(Direction::from_shift(key.modifiers.shift))
            .map(str::to_string);
        let candidate = match next {
            Ok(candidate) => candidate,
            Err(err) => {
                log::debug!("{err}");
                self.completing = None;
                return Ok(());
            }
        };

        let start = self.state.cursor - completing.inserted.chars().count();
        let tail = self.buffer.split_off(self.state.cursor);
        self.buffer.truncate(start);
        self.buffer.extend(candidate.chars());
        self.buffer.extend(tail);
        self.state.cursor = start + candidate.chars().count();
        log::debug!("completion {:?} -> {candidate:?}", completing.cycle.fragment());
        completing.inserted = candidate;
        self.redraw(term)
    }

    fn insert<T: Terminal>(&mut self, term: &mut T, ch: char) -> Result<(), RenderError> {
        self.buffer.insert(self.state.cursor, ch);
        self.state.cursor += 1;
        self.redraw(term)
    }

    fn replace_buffer<T: Terminal>(
        &mut self,
        term: &mut T,
        buffer: Vec<char>,
    ) -> Result<(), RenderError> {
        self.buffer = buffer;
        self.state.cursor = self.buffer.len();
        self.redraw(term)
    }

    fn move_to<T: Terminal>(&mut self, term: &mut T, cursor: usize) -> Result<(), RenderError> {
        self.state.cursor = cursor;
        self.place_cursor(term)
    }

    fn place_cursor<T: Terminal>(&mut self, term: &mut T) -> Result<(), RenderError> {
        self.renderer
            .place_cursor(term, &mut self.state, &self.buffer)
    }

    fn redraw<T: Terminal>(&mut self, term: &mut T) -> Result<(), RenderError> {
        self.renderer.redraw(term, &mut self.state, &self.buffer)
    }

    /// Log a render failure and show it under the line, then redraw the line below it.
    fn report<T: Terminal>(&mut self, term: &mut T, options: &PromptOptions, err: &RenderError) {
        log::warn!("render failed: {err}");
        let notice = format!("display error: {err}");
        if let Err(again) = self.renderer.relocate(
            term,
            &mut self.state,
            &self.buffer,
            &options.prompt,
            &notice,
        ) {
            log::warn!("could not redraw after render failure: {again}");
        }
    }
}
