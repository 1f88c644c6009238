
use pretty_assertions::assert_eq;

use interactive_prompt::core::history::History;
use interactive_prompt::runtime::{LineSession, Step};
use interactive_prompt::{
    CommandTable, ExitReason, Prompt, PromptOptions, ScreenPos, VirtualTerminal,
};

fn options() -> PromptOptions {
    PromptOptions::new("prompt> ", "ready").with_candidates(["get", "got", "gone"])
}

fn scripted(columns: u16, rows: u16, script: &str) -> VirtualTerminal {
    let mut term = VirtualTerminal::new(columns, rows);
    term.push_keys(fixture::keys(script));
    term
}

/// Run the prompt with a dispatcher that records each line and prints nothing.
fn run_recording(term: &mut VirtualTerminal, prompt: &mut Prompt) -> (ExitReason, Vec<String>) {
    let mut seen = Vec::new();
    let mut dispatcher = |line: &str, _buffer: &[char], _candidates: &[String]| {
        seen.push(line.to_string());
        String::new()
    };
    let reason = prompt.run(term, &mut dispatcher);
    (reason, seen)
}

fn session_text(session: &LineSession) -> String {
    session.buffer().iter().collect()
}

#[test]
fn typed_line_is_committed_verbatim() {
    let mut term = scripted(40, 8, "hello <enter>");
    let mut prompt = Prompt::new(options());
    let (reason, seen) = run_recording(&mut term, &mut prompt);

    assert_eq!(reason, ExitReason::InputClosed);
    assert_eq!(seen, vec!["hello"]);
    assert_eq!(term.screen()[..3], ["ready", "prompt> hello", "prompt>"]);
}

#[test]
fn unicode_and_spaces_round_trip() {
    let mut term = scripted(40, 8, "héllo\\swörld! <enter>");
    let mut prompt = Prompt::new(options());
    let (_, seen) = run_recording(&mut term, &mut prompt);
    assert_eq!(seen, vec!["héllo wörld!"]);
}

#[test]
fn left_then_right_restores_cursor() {
    let mut term = scripted(40, 8, "abcd <left> <left> <left> <right> <right> <left> X <enter>");
    let mut prompt = Prompt::new(options());
    let (_, seen) = run_recording(&mut term, &mut prompt);
    assert_eq!(seen, vec!["abXcd"]);
}

#[test]
fn edit_then_insert_lands_after_inserted_char() {
    let options = options();
    let mut history = History::new();
    let mut term = VirtualTerminal::new(40, 8);
    let mut session = LineSession::begin(&mut term, &options.prompt);
    for key in fixture::keys("abc <left> <left> <right> X") {
        assert_eq!(
            session.handle_key(&mut term, key, &options, &mut history),
            Step::Continue
        );
    }
    assert_eq!(session_text(&session), "abXc");
    assert_eq!(session.state().cursor, 3);
    assert_eq!(term.cursor(), ScreenPos::new(11, 0));
}

#[test]
fn shift_enter_keeps_newline_in_committed_line() {
    let mut term = scripted(40, 8, "a <s-enter> b <enter>");
    let mut prompt = Prompt::new(options());
    let (_, seen) = run_recording(&mut term, &mut prompt);
    assert_eq!(seen, vec!["a\nb"]);
    assert_eq!(term.screen()[1..4], ["prompt> a", "b", "prompt>"]);
}

#[test]
fn recalled_entry_edits_do_not_touch_history() {
    let mut term = scripted(
        40,
        12,
        "one <enter> <up> <bs> x <enter> <up> <up> <enter>",
    );
    term.set_report_queued_keys(false);
    let mut prompt = Prompt::new(options());
    let (_, seen) = run_recording(&mut term, &mut prompt);

    assert_eq!(seen, vec!["one", "onx", "one"]);
    let stored: Vec<String> = prompt
        .history()
        .entries()
        .map(|entry| entry.iter().collect())
        .collect();
    assert_eq!(stored, vec!["one", "onx"]);
}

#[test]
fn down_past_newest_entry_gives_empty_line() {
    let mut term = scripted(40, 12, "one <enter> <up> <down> two <enter>");
    term.set_report_queued_keys(false);
    let mut prompt = Prompt::new(options());
    let (_, seen) = run_recording(&mut term, &mut prompt);
    assert_eq!(seen, vec!["one", "two"]);
}

#[test]
fn up_with_empty_history_changes_nothing() {
    let options = options();
    let mut history = History::new();
    let mut term = VirtualTerminal::new(40, 8);
    let mut session = LineSession::begin(&mut term, &options.prompt);
    for key in fixture::keys("ab <left> <up>") {
        session.handle_key(&mut term, key, &options, &mut history);
    }
    assert_eq!(session_text(&session), "ab");
    assert_eq!(session.state().cursor, 1);
    assert_eq!(term.row_text(0), "prompt> ab");
}

#[test]
fn tab_cycles_candidates_in_order() {
    let options = options();
    let mut history = History::new();
    let mut term = VirtualTerminal::new(40, 8);
    let mut session = LineSession::begin(&mut term, &options.prompt);
    for key in fixture::keys("g") {
        session.handle_key(&mut term, key, &options, &mut history);
    }

    let mut shown = Vec::new();
    for key in fixture::keys("<tab> <tab> <tab> <tab> <tab>") {
        session.handle_key(&mut term, key, &options, &mut history);
        shown.push(session_text(&session));
    }
    assert_eq!(shown, vec!["get", "got", "gone", "g", "get"]);

    for key in fixture::keys("<tab> <s-tab>") {
        session.handle_key(&mut term, key, &options, &mut history);
    }
    assert_eq!(session_text(&session), "get");
}

#[test]
fn completed_word_is_committed() {
    let mut term = scripted(40, 8, "run\\sgo <tab> <enter>");
    let mut prompt = Prompt::new(options());
    let (_, seen) = run_recording(&mut term, &mut prompt);
    assert_eq!(seen, vec!["run got"]);
}

#[test]
fn wrap_puts_cursor_on_second_row() {
    let options = options();
    let mut history = History::new();
    let mut term = VirtualTerminal::new(10, 5);
    let mut session = LineSession::begin(&mut term, &options.prompt);
    for key in fixture::keys("hello") {
        session.handle_key(&mut term, key, &options, &mut history);
    }
    assert_eq!(term.cursor(), ScreenPos::new(3, 1));
    assert_eq!(term.screen()[..2], ["prompt> he", "llo"]);
}

#[test]
fn double_escape_ends_the_loop() {
    let mut term = scripted(40, 8, "ab <esc> <esc>");
    let mut prompt = Prompt::new(options());
    let (reason, seen) = run_recording(&mut term, &mut prompt);

    assert_eq!(reason, ExitReason::Escaped);
    assert!(seen.is_empty());
    assert_eq!(
        term.screen()[1..4],
        ["prompt> ab", "Press Escape again to exit.", "prompt> ab"]
    );
}

#[test]
fn single_escape_keeps_session_open() {
    let mut term = scripted(40, 8, "ab <esc> c <enter>");
    let mut prompt = Prompt::new(options());
    let (reason, seen) = run_recording(&mut term, &mut prompt);
    assert_eq!(reason, ExitReason::InputClosed);
    assert_eq!(seen, vec!["abc"]);
}

#[test]
fn queued_input_turns_enter_into_newline() {
    let mut term = scripted(40, 8, "ls <enter> pwd <enter>");
    let mut prompt = Prompt::new(options());
    let (_, seen) = run_recording(&mut term, &mut prompt);
    assert_eq!(seen, vec!["ls\npwd"]);

    let mut term = scripted(40, 8, "ls <enter> pwd <enter>");
    let mut prompt = Prompt::new(options().with_paste_detection(false));
    let (_, seen) = run_recording(&mut term, &mut prompt);
    assert_eq!(seen, vec!["ls", "pwd"]);
}

#[test]
fn blank_lines_are_not_dispatched_or_recorded() {
    let mut term = scripted(40, 12, "\\s\\s <enter> <enter> x <enter>");
    term.set_report_queued_keys(false);
    let mut prompt = Prompt::new(options());
    let (_, seen) = run_recording(&mut term, &mut prompt);
    assert_eq!(seen, vec!["x"]);
    assert_eq!(prompt.history().len(), 1);
}

#[test]
fn quit_response_prints_farewell() {
    let mut table = CommandTable::new();
    table.register("HelloWorld", || "Hello World!\n".to_string());
    let mut term = scripted(40, 12, "HelloWorld <enter> nope <enter> quit <enter> after <enter>");
    term.set_report_queued_keys(false);
    let mut prompt = Prompt::new(options().with_candidates(table.names()));

    let reason = prompt.run(&mut term, &mut table);
    assert_eq!(reason, ExitReason::Quit);
    assert_eq!(
        term.screen()[..8],
        [
            "ready",
            "prompt> HelloWorld",
            "Hello World!",
            "HelloWorld executed.",
            "prompt> nope",
            "nope not found.",
            "prompt> quit",
            "GoodBye!"
        ]
    );
    assert_eq!(term.pending_keys(), 6);
}

#[test]
fn output_at_bottom_scrolls_the_screen() {
    let mut term = scripted(20, 3, "a <enter> b <enter> c <enter>");
    term.set_report_queued_keys(false);
    let mut prompt = Prompt::new(options());
    let mut dispatcher =
        |_line: &str, _buffer: &[char], _candidates: &[String]| "ok\n".to_string();
    let reason = prompt.run(&mut term, &mut dispatcher);

    assert_eq!(reason, ExitReason::InputClosed);
    assert_eq!(term.screen(), vec!["ok", "prompt>", ""]);
    assert!(term.scrolled() > 0);
}
