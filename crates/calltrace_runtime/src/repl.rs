//! The interactive trace console.

use std::fmt::{self, Write as _};
use std::io::{self, Write};

use calltrace_console::{DisplayMode, FrameId};
use calltrace_foundation::Result;
use thiserror::Error;

use crate::demo::SCENARIOS;
use crate::editor::{LineEditor, ReadResult, RustylineEditor};
use crate::session::{Session, SessionConfig};

const DEFAULT_HOT_LIMIT: usize = 10;

const COMMAND_WORDS: &[&str] = &[
    "help", "weave", "scenarios", "run", "show", "stack", "verbose", "tedious", "pause", "clear",
    "expand", "expand-all", "annotate", "hot", "table", "status", "quit", "exit", "on", "off",
];

// =============================================================================
// Commands
// =============================================================================

/// A parsed REPL command.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// List the commands.
    Help,
    /// Weave the program namespace, optionally with a new depth limit.
    Weave(Option<usize>),
    /// List the scenarios.
    Scenarios,
    /// Run a scenario.
    Run(String),
    /// Render pending output.
    Show,
    /// Switch stack mode on or off.
    Stack(bool),
    /// Switch composite enumeration on or off.
    Verbose(bool),
    /// Switch untruncated output on or off.
    Tedious(bool),
    /// Pause or resume trace intake.
    Pause(bool),
    /// Discard the trace.
    Clear,
    /// Toggle one frame.
    Expand(FrameId),
    /// Expand a frame and everything below it.
    ExpandAll(FrameId),
    /// Attach a note to the latest frames.
    Annotate(String),
    /// Show the most frequently called functions.
    Hot(usize),
    /// List the interception table.
    Table,
    /// Show the status line.
    Status,
    /// Leave the REPL.
    Quit,
}

/// A line that does not parse as a [`Command`].
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    /// The first word is not a command.
    #[error("unknown command: {0} (type `help` for a list)")]
    Unknown(String),
    /// The command's arguments are missing or malformed.
    #[error("usage: {0}")]
    Usage(&'static str),
}

impl Command {
    /// Parses one input line.
    ///
    /// # Errors
    ///
    /// Returns an error for unknown commands or malformed arguments.
    pub fn parse(line: &str) -> std::result::Result<Self, CommandError> {
        let line = line.trim();
        let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
        let rest = rest.trim();

        let command = match word {
            "help" | "?" => Self::Help,
            "weave" => Self::Weave(optional_number(rest, "weave [max-depth]")?),
            "scenarios" => Self::Scenarios,
            "run" if !rest.is_empty() => Self::Run(rest.to_string()),
            "run" => return Err(CommandError::Usage("run <scenario>")),
            "show" => Self::Show,
            "stack" => Self::Stack(switch(rest, "stack on|off")?),
            "verbose" => Self::Verbose(switch(rest, "verbose on|off")?),
            "tedious" => Self::Tedious(switch(rest, "tedious on|off")?),
            "pause" => Self::Pause(switch(rest, "pause on|off")?),
            "clear" => Self::Clear,
            "expand" => Self::Expand(number(rest, "expand <frame>")?),
            "expand-all" => Self::ExpandAll(number(rest, "expand-all <frame>")?),
            "annotate" if !rest.is_empty() => Self::Annotate(rest.to_string()),
            "annotate" => return Err(CommandError::Usage("annotate <text>")),
            "hot" => Self::Hot(optional_number(rest, "hot [count]")?.unwrap_or(DEFAULT_HOT_LIMIT)),
            "table" => Self::Table,
            "status" => Self::Status,
            "quit" | "exit" => Self::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(command)
    }
}

fn switch(arg: &str, usage: &'static str) -> std::result::Result<bool, CommandError> {
    match arg {
        "on" | "true" | "1" => Ok(true),
        "off" | "false" | "0" => Ok(false),
        _ => Err(CommandError::Usage(usage)),
    }
}

fn number(arg: &str, usage: &'static str) -> std::result::Result<usize, CommandError> {
    arg.parse().map_err(|_| CommandError::Usage(usage))
}

fn optional_number(arg: &str, usage: &'static str) -> std::result::Result<Option<usize>, CommandError> {
    if arg.is_empty() {
        Ok(None)
    } else {
        number(arg, usage).map(Some)
    }
}

// =============================================================================
// REPL
// =============================================================================

/// The interactive REPL.
pub struct Repl<E: LineEditor = RustylineEditor> {
    /// The line editor for input.
    editor: E,

    /// The traced program and its console.
    session: Session,

    /// Whether to show the welcome banner.
    show_banner: bool,

    /// Primary prompt.
    prompt: String,
}

impl Repl<RustylineEditor> {
    /// Creates a new REPL with the default rustyline editor.
    ///
    /// # Errors
    ///
    /// Returns an error if the editor fails to initialize or the session
    /// configuration is invalid.
    pub fn new(config: SessionConfig) -> Result<Self> {
        let editor = RustylineEditor::new()?;
        Ok(Self::with_editor(editor, Session::new(config)?))
    }
}

impl<E: LineEditor> Repl<E> {
    /// Creates a new REPL with the given editor and session.
    pub fn with_editor(mut editor: E, session: Session) -> Self {
        let mut words: Vec<String> = COMMAND_WORDS.iter().map(ToString::to_string).collect();
        words.extend(SCENARIOS.iter().map(|s| s.name.to_string()));
        editor.set_completions(words);
        Self {
            editor,
            session,
            show_banner: true,
            prompt: "trace> ".to_string(),
        }
    }

    /// Disables the welcome banner.
    #[must_use]
    pub fn without_banner(mut self) -> Self {
        self.show_banner = false;
        self
    }

    /// Sets the primary prompt.
    #[must_use]
    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    /// Returns a reference to the session.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Returns a mutable reference to the session.
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Runs the REPL loop.
    ///
    /// # Errors
    ///
    /// Returns an error if reading input fails fatally.
    pub fn run(&mut self) -> Result<()> {
        if self.show_banner {
            self.print_banner();
        }

        while self.read_eval_print()? {}

        println!("\nGoodbye!");
        Ok(())
    }

    /// Executes one read-eval-print iteration.
    ///
    /// Returns `Ok(true)` to continue, `Ok(false)` to exit.
    fn read_eval_print(&mut self) -> Result<bool> {
        if self.session.console().poll() {
            if let Some(status) = self.session.status() {
                println!("\x1b[2m{status}\x1b[0m");
            }
        }

        let input = match self.editor.read_line(&self.prompt)? {
            ReadResult::Line(line) => line,
            ReadResult::Interrupted => {
                println!();
                return Ok(true);
            }
            ReadResult::Eof => return Ok(false),
        };

        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Ok(true);
        }
        self.editor.add_history(trimmed);

        match Command::parse(trimmed) {
            Ok(Command::Quit) => return Ok(false),
            Ok(command) => match self.execute(command) {
                Ok(Some(output)) if !output.is_empty() => println!("{output}"),
                Ok(_) => {}
                Err(e) => self.print_error(&e),
            },
            Err(e) => self.print_error(&e),
        }
        Ok(true)
    }

    /// Executes a command and returns the text to print, if any.
    ///
    /// # Errors
    ///
    /// Propagates failures raised by a scenario.
    pub fn execute(&mut self, command: Command) -> Result<Option<String>> {
        let output = match command {
            Command::Help => Some(help_text()),
            Command::Weave(depth) => {
                let report = self.session.weave_with(None, depth);
                Some(format!(
                    "woven: {} wrapped, {} visited, {} skipped, {} faulted",
                    report.wrapped, report.visited, report.skipped, report.faulted
                ))
            }
            Command::Scenarios => Some(
                SCENARIOS
                    .iter()
                    .map(|s| format!("  {:<10} {}", s.name, s.description))
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            Command::Run(name) => {
                let value = self.session.run(&name)?;
                Some(format!("=> {value}"))
            }
            Command::Show => Some(self.session.console().show()),
            Command::Stack(on) => {
                self.session.console().set_stack_mode(on);
                Some(self.session.console().lines().join("\n"))
            }
            Command::Verbose(on) => {
                self.session.console().set_detailed(on);
                Some(self.session.console().lines().join("\n"))
            }
            Command::Tedious(on) => {
                self.session.console().set_exhaustive(on);
                Some(self.session.console().lines().join("\n"))
            }
            Command::Pause(on) => {
                self.session.console().pause(on);
                Some(if on { "intake paused" } else { "intake resumed" }.to_string())
            }
            Command::Clear => {
                self.session.clear();
                None
            }
            Command::Expand(id) => Some(self.expand(id, false)),
            Command::ExpandAll(id) => Some(self.expand(id, true)),
            Command::Annotate(text) => {
                self.session.annotate(text);
                None
            }
            Command::Hot(limit) => Some(
                self.session
                    .console()
                    .hot_functions(limit)
                    .iter()
                    .map(|(name, count)| format!("{count:>6}  {name}"))
                    .collect::<Vec<_>>()
                    .join("\n"),
            ),
            Command::Table => Some(self.table()),
            Command::Status => {
                let frames = self.session.console().frame_count();
                Some(
                    self.session
                        .status()
                        .unwrap_or_else(|| calltrace_console::status_text(frames)),
                )
            }
            Command::Quit => None,
        };
        Ok(output)
    }

    fn expand(&self, id: FrameId, all: bool) -> String {
        let console = self.session.console();
        let accepted = if all { console.expand_all(id) } else { console.toggle(id) };
        if accepted {
            console.lines().join("\n")
        } else if console.mode() == DisplayMode::Flat {
            "expansion needs stack mode (`stack on`)".to_string()
        } else {
            format!("no frame {id}")
        }
    }

    fn table(&self) -> String {
        let mut out = String::new();
        for entry in self.session.weaver().interceptions() {
            let _ = writeln!(out, "  {}", entry.name);
        }
        let blacklist = self.session.weaver().blacklist();
        if !blacklist.is_empty() {
            let patterns: Vec<&str> = blacklist.patterns().collect();
            let _ = write!(out, "blacklist: {}", patterns.join(", "));
        }
        out.trim_end().to_string()
    }

    /// Prints an error to stderr.
    #[allow(clippy::unused_self)]
    fn print_error(&self, error: &dyn fmt::Display) {
        eprintln!("\x1b[31mError: {error}\x1b[0m");
    }

    /// Prints the welcome banner.
    #[allow(clippy::unused_self)]
    fn print_banner(&self) {
        println!("\x1b[1;36m");
        println!("            _ _ _                       ");
        println!("   ___ __ _| | | |_ _ __ __ _  ___ ___  ");
        println!("  / __/ _` | | | __| '__/ _` |/ __/ _ \\ ");
        println!(" | (_| (_| | | | |_| | | (_| | (_|  __/ ");
        println!("  \\___\\__,_|_|_|\\__|_|  \\__,_|\\___\\___| ");
        println!("\x1b[0m");
        println!("Welcome to calltrace v{}", env!("CARGO_PKG_VERSION"));
        println!("Type `help` for commands. Use Ctrl+D to exit.\n");

        let _ = io::stdout().flush();
    }
}

fn help_text() -> String {
    "\x1b[1mCommands:\x1b[0m
    weave [max-depth]     Instrument the program namespace
    scenarios             List scenarios
    run <scenario>        Run a scenario
    show                  Render pending trace output
    stack on|off          Nested call tree or flat call list
    verbose on|off        Enumerate object members in arguments
    tedious on|off        Do not truncate long arguments
    pause on|off          Stop or resume recording
    clear                 Discard the trace
    expand <frame>        Toggle a frame (stack mode)
    expand-all <frame>    Open a frame and everything below it
    annotate <text>       Attach a note to the latest frames
    hot [count]           Most frequently called functions
    table                 Woven functions and blacklist
    status                Number of frames traced
    quit                  Leave"
        .to_string()
}
