//! Key decoding: raw terminal sequences to typed key events.

use std::fmt;

const MOD_SHIFT: u8 = 1;
const MOD_ALT: u8 = 2;
const MOD_CTRL: u8 = 4;
const LOCK_MASK: u8 = 64 + 128;

const CODEPOINT_ESCAPE: i32 = 27;
const CODEPOINT_TAB: i32 = 9;
const CODEPOINT_ENTER: i32 = 13;
const CODEPOINT_BACKSPACE: i32 = 127;
const CODEPOINT_KP_ENTER: i32 = 57414;

const ARROW_UP: i32 = -1;
const ARROW_DOWN: i32 = -2;
const ARROW_RIGHT: i32 = -3;
const ARROW_LEFT: i32 = -4;

const KEY_DELETE: i32 = -10;
const KEY_HOME: i32 = -14;
const KEY_END: i32 = -15;

/// Symbolic key identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Char(char),
    Left,
    Right,
    Up,
    Down,
    Home,
    End,
    Delete,
    Backspace,
    Enter,
    Escape,
    Tab,
}

/// Modifier set carried by a key event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Modifiers {
    pub shift: bool,
    pub alt: bool,
    pub ctrl: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        alt: false,
        ctrl: false,
    };
    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        alt: false,
        ctrl: false,
    };
    pub const ALT: Modifiers = Modifiers {
        shift: false,
        alt: true,
        ctrl: false,
    };
    pub const CTRL: Modifiers = Modifiers {
        shift: false,
        alt: false,
        ctrl: true,
    };

    fn from_bits(bits: u8) -> Self {
        let bits = bits & !LOCK_MASK;
        Self {
            shift: bits & MOD_SHIFT != 0,
            alt: bits & MOD_ALT != 0,
            ctrl: bits & MOD_CTRL != 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        !self.shift && !self.alt && !self.ctrl
    }
}

/// One decoded keystroke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeyEvent {
    pub code: KeyCode,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(code: KeyCode, modifiers: Modifiers) -> Self {
        Self { code, modifiers }
    }

    pub fn plain(code: KeyCode) -> Self {
        Self::new(code, Modifiers::NONE)
    }

    pub fn char(ch: char) -> Self {
        Self::plain(KeyCode::Char(ch))
    }

    pub fn ctrl(ch: char) -> Self {
        Self::new(KeyCode::Char(ch), Modifiers::CTRL)
    }

    /// Character this key inserts into the buffer, if any.
    pub fn printable(&self) -> Option<char> {
        match self.code {
            KeyCode::Char(ch) if !self.modifiers.ctrl && !self.modifiers.alt && !ch.is_control() => {
                Some(ch)
            }
            _ => None,
        }
    }

    /// Same physical key, ignoring modifiers.
    pub fn same_key(&self, other: &KeyEvent) -> bool {
        self.code == other.code
    }
}

/// Canonical key id, e.g. `shift+enter`, `ctrl+h`, `left`, `a`.
impl fmt::Display for KeyEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.modifiers.shift {
            f.write_str("shift+")?;
        }
        if self.modifiers.ctrl {
            f.write_str("ctrl+")?;
        }
        if self.modifiers.alt {
            f.write_str("alt+")?;
        }
        match self.code {
            KeyCode::Char(' ') => f.write_str("space"),
            KeyCode::Char(ch) => write!(f, "{ch}"),
            KeyCode::Left => f.write_str("left"),
            KeyCode::Right => f.write_str("right"),
            KeyCode::Up => f.write_str("up"),
            KeyCode::Down => f.write_str("down"),
            KeyCode::Home => f.write_str("home"),
            KeyCode::End => f.write_str("end"),
            KeyCode::Delete => f.write_str("delete"),
            KeyCode::Backspace => f.write_str("backspace"),
            KeyCode::Enter => f.write_str("enter"),
            KeyCode::Escape => f.write_str("escape"),
            KeyCode::Tab => f.write_str("tab"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ParsedCsiSequence {
    codepoint: i32,
    modifier: u8,
    release: bool,
}

/// Decode one complete input sequence. Returns `None` for sequences with no key meaning
/// (mouse reports, key releases, unknown escapes).
pub fn parse_key(data: &str) -> Option<KeyEvent> {
    if let Some(parsed) = parse_csi_sequence(data) {
        if parsed.release {
            return None;
        }
        return key_from_codepoint(parsed.codepoint, Modifiers::from_bits(parsed.modifier));
    }

    if let Some(event) = parse_modify_other_keys(data) {
        return Some(event);
    }

    if let Some(code) = legacy_sequence_key(data) {
        return Some(code);
    }

    match data {
        "\x1b" => return Some(KeyEvent::plain(KeyCode::Escape)),
        "\t" => return Some(KeyEvent::plain(KeyCode::Tab)),
        "\x1b[Z" => return Some(KeyEvent::new(KeyCode::Tab, Modifiers::SHIFT)),
        "\r" | "\n" | "\x1bOM" => return Some(KeyEvent::plain(KeyCode::Enter)),
        "\x1b\r" | "\x1b\n" => return Some(KeyEvent::new(KeyCode::Enter, Modifiers::ALT)),
        "\x7f" => return Some(KeyEvent::plain(KeyCode::Backspace)),
        "\x1b\x7f" => return Some(KeyEvent::new(KeyCode::Backspace, Modifiers::ALT)),
        // BS arrives for Ctrl-H on most terminals; Backspace itself sends DEL.
        "\x08" => return Some(KeyEvent::ctrl('h')),
        _ => {}
    }

    let mut chars = data.chars();
    let first = chars.next()?;
    let rest = chars.as_str();

    if first == '\x1b' {
        let mut tail = rest.chars();
        let ch = tail.next()?;
        if tail.next().is_some() {
            return None;
        }
        return match ch {
            '\x01'..='\x1a' => {
                let letter = (ch as u8 + 96) as char;
                Some(KeyEvent::new(
                    KeyCode::Char(letter),
                    Modifiers {
                        shift: false,
                        alt: true,
                        ctrl: true,
                    },
                ))
            }
            ch if !ch.is_control() => Some(KeyEvent::new(KeyCode::Char(ch), Modifiers::ALT)),
            _ => None,
        };
    }

    if !rest.is_empty() {
        return None;
    }

    match first {
        '\x01'..='\x1a' => Some(KeyEvent::ctrl((first as u8 + 96) as char)),
        ch if ch.is_control() => None,
        ch => Some(KeyEvent::char(ch)),
    }
}

fn key_from_codepoint(codepoint: i32, modifiers: Modifiers) -> Option<KeyEvent> {
    let code = match codepoint {
        CODEPOINT_ESCAPE => KeyCode::Escape,
        CODEPOINT_TAB => KeyCode::Tab,
        CODEPOINT_ENTER | CODEPOINT_KP_ENTER => KeyCode::Enter,
        CODEPOINT_BACKSPACE => KeyCode::Backspace,
        KEY_DELETE => KeyCode::Delete,
        KEY_HOME => KeyCode::Home,
        KEY_END => KeyCode::End,
        ARROW_UP => KeyCode::Up,
        ARROW_DOWN => KeyCode::Down,
        ARROW_LEFT => KeyCode::Left,
        ARROW_RIGHT => KeyCode::Right,
        cp if cp >= 32 => KeyCode::Char(char::from_u32(cp as u32)?),
        _ => return None,
    };
    Some(KeyEvent::new(code, modifiers))
}

fn parse_event_release(event_type: Option<&str>) -> bool {
    matches!(event_type.and_then(|value| value.parse::<u8>().ok()), Some(3))
}

fn split_modifier(mod_part: &str) -> (u8, bool) {
    let (mod_value, event_value) = match mod_part.split_once(':') {
        Some((left, right)) => (left, Some(right)),
        None => (mod_part, None),
    };
    let mod_value = mod_value.parse::<u8>().unwrap_or(1);
    (mod_value.saturating_sub(1), parse_event_release(event_value))
}

/// Kitty CSI-u, `CSI n ~` and `CSI 1;m X` forms.
fn parse_csi_sequence(data: &str) -> Option<ParsedCsiSequence> {
    let stripped = data.strip_prefix("\x1b[")?;

    if let Some(body) = stripped.strip_suffix('u') {
        let (code_part, mod_part) = match body.split_once(';') {
            Some((left, right)) => (left, Some(right)),
            None => (body, None),
        };
        let codepoint = code_part.split(':').next()?.parse::<i32>().ok()?;
        let (modifier, release) = mod_part.map(split_modifier).unwrap_or((0, false));
        return Some(ParsedCsiSequence {
            codepoint,
            modifier,
            release,
        });
    }

    if let Some(body) = stripped.strip_suffix('~') {
        let mut parts = body.split(';');
        let num_part = parts.next()?;
        let mod_part = parts.next();
        if parts.next().is_some() {
            return None;
        }
        let codepoint = match num_part.parse::<i32>().ok()? {
            1 | 7 => KEY_HOME,
            3 => KEY_DELETE,
            4 | 8 => KEY_END,
            _ => return None,
        };
        let (modifier, release) = mod_part.map(split_modifier).unwrap_or((0, false));
        return Some(ParsedCsiSequence {
            codepoint,
            modifier,
            release,
        });
    }

    let stripped = stripped.strip_prefix("1;")?;
    if stripped.len() < 2 {
        return None;
    }
    let (mod_part, tail) = stripped.split_at(stripped.len() - 1);
    let codepoint = match tail {
        "A" => ARROW_UP,
        "B" => ARROW_DOWN,
        "C" => ARROW_RIGHT,
        "D" => ARROW_LEFT,
        "H" => KEY_HOME,
        "F" => KEY_END,
        _ => return None,
    };
    let (modifier, release) = split_modifier(mod_part);
    Some(ParsedCsiSequence {
        codepoint,
        modifier,
        release,
    })
}

/// xterm `modifyOtherKeys`: `CSI 27 ; mod ; keycode ~`.
fn parse_modify_other_keys(data: &str) -> Option<KeyEvent> {
    let body = data.strip_prefix("\x1b[27;")?.strip_suffix('~')?;
    let mut parts = body.split(';');
    let mod_value = parts.next()?.parse::<u8>().ok()?;
    let keycode = parts.next()?.parse::<i32>().ok()?;
    if parts.next().is_some() {
        return None;
    }
    key_from_codepoint(keycode, Modifiers::from_bits(mod_value.saturating_sub(1)))
}

fn legacy_sequence_key(data: &str) -> Option<KeyEvent> {
    let code = match data {
        "\x1b[A" | "\x1bOA" => KeyCode::Up,
        "\x1b[B" | "\x1bOB" => KeyCode::Down,
        "\x1b[C" | "\x1bOC" => KeyCode::Right,
        "\x1b[D" | "\x1bOD" => KeyCode::Left,
        "\x1b[H" | "\x1bOH" => KeyCode::Home,
        "\x1b[F" | "\x1bOF" => KeyCode::End,
        "\x1b[a" => return Some(KeyEvent::new(KeyCode::Up, Modifiers::SHIFT)),
        "\x1b[b" => return Some(KeyEvent::new(KeyCode::Down, Modifiers::SHIFT)),
        "\x1b[c" => return Some(KeyEvent::new(KeyCode::Right, Modifiers::SHIFT)),
        "\x1b[d" => return Some(KeyEvent::new(KeyCode::Left, Modifiers::SHIFT)),
        "\x1bOa" => return Some(KeyEvent::new(KeyCode::Up, Modifiers::CTRL)),
        "\x1bOb" => return Some(KeyEvent::new(KeyCode::Down, Modifiers::CTRL)),
        "\x1bOc" => return Some(KeyEvent::new(KeyCode::Right, Modifiers::CTRL)),
        "\x1bOd" => return Some(KeyEvent::new(KeyCode::Left, Modifiers::CTRL)),
        "\x1b[3$" => return Some(KeyEvent::new(KeyCode::Delete, Modifiers::SHIFT)),
        "\x1b[3^" => return Some(KeyEvent::new(KeyCode::Delete, Modifiers::CTRL)),
        "\x1b[7$" => return Some(KeyEvent::new(KeyCode::Home, Modifiers::SHIFT)),
        "\x1b[8$" => return Some(KeyEvent::new(KeyCode::End, Modifiers::SHIFT)),
        "\x1b[7^" => return Some(KeyEvent::new(KeyCode::Home, Modifiers::CTRL)),
        "\x1b[8^" => return Some(KeyEvent::new(KeyCode::End, Modifiers::CTRL)),
        _ => return None,
    };
    Some(KeyEvent::plain(code))
}
