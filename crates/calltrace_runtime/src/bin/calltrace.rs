//! calltrace CLI entry point.

use calltrace_console::{ConsoleConfig, DisplayMode, Verbosity};
use calltrace_runtime::demo::SCENARIOS;
use calltrace_runtime::{Repl, Session, SessionConfig};
use calltrace_weaver::WeaverConfig;
use std::env;
use std::io::{self, IsTerminal};
use std::process::ExitCode;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

/// CLI configuration parsed from arguments.
#[derive(Default)]
struct CliConfig {
    batch_mode: bool,
    show_help: bool,
    show_version: bool,
    stack: bool,
    verbose: bool,
    tedious: bool,
    max_depth: Option<usize>,
    blacklist: Vec<String>,
}

impl CliConfig {
    fn session_config(&self) -> SessionConfig {
        let mut weaver = WeaverConfig::new();
        for pattern in &self.blacklist {
            weaver = weaver.with_blacklist_pattern(pattern.clone());
        }
        if let Some(depth) = self.max_depth {
            weaver = weaver.with_max_depth(depth);
        }

        let mode = if self.stack { DisplayMode::Stack } else { DisplayMode::Flat };
        let console = ConsoleConfig::new()
            .with_mode(mode)
            .with_verbosity(Verbosity {
                detailed: self.verbose,
                exhaustive: self.tedious,
            })
            .with_color(!self.batch_mode && io::stdout().is_terminal());

        SessionConfig { weaver, console }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "warn".into()))
        .with(fmt::layer().with_writer(io::stderr))
        .init();

    let args: Vec<String> = env::args().collect();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31mError: {e}\x1b[0m");
            ExitCode::FAILURE
        }
    }
}

fn parse_args(args: Vec<String>) -> Result<CliConfig, Box<dyn std::error::Error>> {
    let mut config = CliConfig::default();

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "-h" | "--help" => config.show_help = true,
            "-V" | "--version" => config.show_version = true,
            "-b" | "--batch" => config.batch_mode = true,
            "--stack" => config.stack = true,
            "--verbose" => config.verbose = true,
            "--tedious" => config.tedious = true,
            "--max-depth" => {
                i += 1;
                if i >= args.len() {
                    return Err("--max-depth requires a value".into());
                }
                let depth: usize = args[i]
                    .parse()
                    .map_err(|_| format!("invalid --max-depth value: {}", args[i]))?;
                if depth == 0 {
                    return Err("--max-depth must be at least 1".into());
                }
                config.max_depth = Some(depth);
            }
            "--blacklist" => {
                i += 1;
                if i >= args.len() {
                    return Err("--blacklist requires a pattern".into());
                }
                config.blacklist.push(args[i].clone());
            }
            arg => {
                return Err(format!("unknown option: {arg}").into());
            }
        }
        i += 1;
    }

    Ok(config)
}

fn run(args: Vec<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = parse_args(args)?;

    if config.show_help {
        print_help();
        return Ok(());
    }

    if config.show_version {
        println!("calltrace {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    if config.batch_mode {
        run_batch(config.session_config())?;
        return Ok(());
    }

    let mut repl = Repl::new(config.session_config())?;
    repl.run()?;
    Ok(())
}

/// Weaves the demo program, runs every scenario, and prints the trace.
fn run_batch(config: SessionConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut session = Session::new(config)?;
    let report = session.weave();
    eprintln!(
        "\x1b[33mwoven: {} wrapped, {} skipped, {} faulted\x1b[0m",
        report.wrapped, report.skipped, report.faulted
    );

    for scenario in &SCENARIOS {
        if let Err(e) = session.run(scenario.name) {
            eprintln!("\x1b[31m{}: {e}\x1b[0m", scenario.name);
        }
        session.annotate(format!("end of {}", scenario.name));
    }

    let console = session.console();
    if console.mode() == DisplayMode::Stack {
        let top = console.model().children(calltrace_console::ROOT).to_vec();
        for id in top {
            console.expand_all(id);
        }
    }
    println!("{}", console.show());
    println!("{}", calltrace_console::status_text(console.frame_count()));
    Ok(())
}

fn print_help() {
    println!(
        "\x1b[1mcalltrace\x1b[0m - Function call tracer with a live call-tree console

\x1b[1mUSAGE:\x1b[0m
    calltrace [OPTIONS]

\x1b[1mOPTIONS:\x1b[0m
    -h, --help           Print help information
    -V, --version        Print version information
    -b, --batch          Weave, run every scenario, print the trace and exit

\x1b[1mTRACE OPTIONS:\x1b[0m
    --stack              Show the nested call tree instead of a flat list
    --verbose            Enumerate object members in arguments
    --tedious            Do not truncate long arguments
    --max-depth N        Limit how deep weaving descends (default 100)
    --blacklist RE       Never weave members whose qualified name matches RE
                         (may be repeated)

\x1b[1mEXAMPLES:\x1b[0m
    calltrace                               Start interactive console
    calltrace -b --stack                    Print the full call tree
    calltrace --blacklist '^app\\.util'      Skip the util helpers

\x1b[1mREPL COMMANDS:\x1b[0m
    weave                Instrument the demo program
    run <scenario>       Run a scenario (see `scenarios`)
    show                 Render pending trace output
    help                 List every command
    Ctrl+D               Exit REPL

\x1b[1mENVIRONMENT:\x1b[0m
    RUST_LOG             Log filter for diagnostics on stderr (default warn)"
    );
}
