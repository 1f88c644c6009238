//! Hand-off of committed lines to the embedding application.

use std::fmt;

/// Response that ends the prompt loop.
pub const QUIT: &str = "quit";

/// Runs every registered command in order.
pub const REGRESS: &str = "Regress";

/// Receives each committed, non-blank line and returns text to print.
///
/// Returning [`QUIT`] ends the loop. Other responses are written verbatim, so they
/// normally end with `'\n'`.
pub trait Dispatcher {
    fn dispatch(&mut self, line: &str, buffer: &[char], candidates: &[String]) -> String;
}

impl<F> Dispatcher for F
where
    F: FnMut(&str, &[char], &[String]) -> String,
{
    fn dispatch(&mut self, line: &str, buffer: &[char], candidates: &[String]) -> String {
        self(line, buffer, candidates)
    }
}

type Handler = Box<dyn FnMut() -> String>;

/// Ordered mapping of command names to handlers.
///
/// A handler returns whatever it wants printed before the `"<name> executed."` line.
#[derive(Default)]
pub struct CommandTable {
    commands: Vec<(String, Handler)>,
}

impl CommandTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `name`, replacing an existing handler of the same name.
    pub fn register<F>(&mut self, name: impl Into<String>, handler: F) -> &mut Self
    where
        F: FnMut() -> String + 'static,
    {
        let name = name.into();
        let handler: Handler = Box::new(handler);
        match self.commands.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => slot.1 = handler,
            None => self.commands.push((name, handler)),
        }
        self
    }

    /// Names in registration order, for use as completion candidates.
    pub fn names(&self) -> Vec<String> {
        self.commands.iter().map(|(name, _)| name.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    fn run(&mut self, name: &str) -> Option<String> {
        let (name, handler) = self.commands.iter_mut().find(|(known, _)| known == name)?;
        let mut output = handler();
        output.push_str(&format!("{name} executed.\n"));
        Some(output)
    }
}

impl fmt::Debug for CommandTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandTable")
            .field("commands", &self.names())
            .finish()
    }
}

impl Dispatcher for CommandTable {
    fn dispatch(&mut self, line: &str, _buffer: &[char], _candidates: &[String]) -> String {
        let command = line.trim();
        if command.eq_ignore_ascii_case(QUIT) {
            return QUIT.to_string();
        }
        if command == REGRESS {
            let mut output = String::new();
            for name in self.names() {
                if let Some(ran) = self.run(&name) {
                    output.push_str(&ran);
                }
            }
            output.push_str("completed regression\n");
            return output;
        }
        self.run(command)
            .unwrap_or_else(|| format!("{command} not found.\n"))
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use pretty_assertions::assert_eq;

    use super::{CommandTable, Dispatcher, QUIT};

    fn table() -> CommandTable {
        let mut table = CommandTable::new();
        table
            .register("HelloWorld", || "Hello World!\n".to_string())
            .register("GoodbyeWorld", || "Goodbye World!\n".to_string());
        table
    }

    fn send(dispatcher: &mut impl Dispatcher, line: &str) -> String {
        let buffer: Vec<char> = line.chars().collect();
        dispatcher.dispatch(line, &buffer, &[])
    }

    #[test]
    fn known_command_runs_handler() {
        let mut table = table();
        assert_eq!(
            send(&mut table, "HelloWorld"),
            "Hello World!\nHelloWorld executed.\n"
        );
    }

    #[test]
    fn unknown_command_is_reported() {
        let mut table = table();
        assert_eq!(send(&mut table, "helloworld"), "helloworld not found.\n");
    }

    #[test]
    fn quit_is_case_insensitive() {
        let mut table = table();
        assert_eq!(send(&mut table, "QUIT"), QUIT);
        assert_eq!(send(&mut table, " quit "), QUIT);
    }

    #[test]
    fn regress_runs_every_handler_in_order() {
        let mut table = table();
        assert_eq!(
            send(&mut table, "Regress"),
            "Hello World!\nHelloWorld executed.\nGoodbye World!\nGoodbyeWorld executed.\ncompleted regression\n"
        );
    }

    #[test]
    fn register_replaces_same_name() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let mut table = table();
        table.register("HelloWorld", move || {
            counter.set(counter.get() + 1);
            String::new()
        });
        assert_eq!(table.names(), vec!["HelloWorld", "GoodbyeWorld"]);
        send(&mut table, "HelloWorld");
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn closures_are_dispatchers() {
        let mut echo = |line: &str, buffer: &[char], candidates: &[String]| {
            format!("{line}:{}:{}\n", buffer.len(), candidates.len())
        };
        let candidates = vec!["a".to_string()];
        assert_eq!(echo.dispatch("hi", &['h', 'i'], &candidates), "hi:2:1\n");
    }
}
