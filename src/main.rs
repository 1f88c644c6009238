use interactive_prompt::CommandTable;

const PROMPT: &str = "prompt> ";
const STARTUP: &str = "You can \"Regress\" all methods or Tab to cycle through and auto-complete method handles. Type \"quit\" to quit.";

fn demo_commands() -> CommandTable {
    let mut table = CommandTable::new();
    table
        .register("HelloWorld", || "Hello World!\n".to_string())
        .register("GoodbyeWorld", || "Goodbye World!\n".to_string())
        .register("ThisMethod", || {
            "You called this method (\"ThisMethod\")!\n".to_string()
        });
    table
}

fn main() {
    let table = demo_commands();
    let candidates = table.names();
    interactive_prompt::run(table, PROMPT, STARTUP, Some(candidates));
}
