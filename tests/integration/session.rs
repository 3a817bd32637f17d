//! The runtime session and REPL driving the demo program.

use calltrace_console::{ConsoleConfig, DisplayMode};
use calltrace_foundation::{Result, Value};
use calltrace_runtime::{Command, LineEditor, ReadResult, Repl, Session, SessionConfig};
use calltrace_weaver::{Blacklist, WeaverConfig};

struct Script {
    lines: std::vec::IntoIter<String>,
}

impl Script {
    fn new(lines: &[&str]) -> Self {
        Self {
            lines: lines
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .into_iter(),
        }
    }
}

impl LineEditor for Script {
    fn read_line(&mut self, _prompt: &str) -> Result<ReadResult> {
        Ok(self.lines.next().map_or(ReadResult::Eof, ReadResult::Line))
    }

    fn add_history(&mut self, _line: &str) {}

    fn set_completions(&mut self, _words: Vec<String>) {}
}

fn stack_config() -> SessionConfig {
    SessionConfig {
        console: ConsoleConfig::new().with_mode(DisplayMode::Stack),
        ..SessionConfig::default()
    }
}

#[test]
fn every_scenario_runs_under_instrumentation() {
    let mut session = Session::new(SessionConfig::default()).unwrap();
    session.weave();
    for scenario in &calltrace_runtime::demo::SCENARIOS {
        let result = session.run(scenario.name);
        assert_eq!(result.is_err(), scenario.name == "fail", "{}", scenario.name);
    }
    assert!(session.console().frame_count() > 30);
    assert_eq!(session.weaver().call_depth(), 0);
}

#[test]
fn recursive_handler_is_cut_short() {
    let mut session = Session::new(stack_config()).unwrap();
    session.weave();
    session.run("recurse").unwrap();
    let lines = session.console().show();
    assert!(lines.starts_with("+ 1 ~*** recursion, stopping(1)"));
}

#[test]
fn blacklisted_helpers_are_not_traced() {
    let config = SessionConfig {
        weaver: WeaverConfig::new().with_blacklist_pattern("^app\\.util"),
        ..SessionConfig::default()
    };
    let mut session = Session::new(config).unwrap();
    session.weave();
    session.run("burst").unwrap();
    assert_eq!(session.console().frame_count(), 0);
    assert!(session.weaver().interception("app.util.trim").is_none());

    session.weave_with(Some(Blacklist::new()), None);
    session.run("burst").unwrap();
    assert_eq!(session.console().frame_count(), 20);
}

#[test]
fn shallow_weave_misses_nested_members() {
    let mut session = Session::new(SessionConfig::default()).unwrap();
    let report = session.weave_with(None, Some(1));
    assert_eq!(report.wrapped, 0);
    assert_eq!(session.weave_with(None, Some(2)).wrapped, 0);
    assert_eq!(session.weave_with(None, Some(3)).wrapped, 7);
    assert_eq!(session.weaver().max_depth(), 3);
    assert!(session.weaver().interception("app.mail.Folder.open").is_none());
}

#[test]
fn scripted_repl_session() {
    let session = Session::new(stack_config()).unwrap();
    let mut repl = Repl::with_editor(
        Script::new(&["weave", "run inbox", "show", "expand-all 1", "verbose on", "quit"]),
        session,
    )
    .without_banner();
    repl.run().unwrap();

    let console = repl.session().console();
    assert!(console.verbosity().detailed);
    let lines = console.lines();
    assert!(lines[0].starts_with("- 1 ~onInboxClick"));
    assert!(lines.iter().any(|l| l.contains("app.mail.parse")));
}

#[test]
fn repl_commands_report_state() {
    let session = Session::new(SessionConfig::default()).unwrap();
    let mut repl = Repl::with_editor(Script::new(&[]), session);
    repl.execute(Command::Weave(None)).unwrap();
    assert_eq!(
        repl.execute(Command::Run("compose".into())).unwrap(),
        Some(format!("=> {}", Value::Bool(true)))
    );
    repl.execute(Command::Annotate("sent".into())).unwrap();
    let shown = repl.execute(Command::Show).unwrap().unwrap();
    assert!(shown.ends_with("***** sent *****"));
}
