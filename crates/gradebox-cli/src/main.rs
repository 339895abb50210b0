//! gradebox CLI - drive one program the way the grading harness does

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use gradebox::{FileMode, HarnessEnv, Launch, TempFiles, Timeout, read_lines};

/// Exit code when a read or wait times out, as timeout(1) uses.
const TIMEOUT_EXIT: u8 = 124;

#[derive(Parser)]
#[command(name = "gradebox")]
#[command(author, version, about = "Black-box process harness for grading submissions")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a program, feed it input and echo its output lines
    Run {
        /// Seconds allowed for each output line
        #[arg(short, long, default_value = "30")]
        timeout: u64,

        /// Seconds allowed for the program to exit after its output ends
        #[arg(short, long, default_value = "2")]
        wait: u64,

        /// File whose lines are sent to the program's stdin
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Program to run (defaults to $SUBMISSIONPATH)
        #[arg(last = true)]
        command: Vec<String>,
    },

    /// Create a temp file and print its path
    Tmpfile {
        /// File contents
        content: String,

        /// Access mode
        #[arg(short, long, value_enum, default_value = "rw")]
        mode: Mode,

        /// Directory (defaults to $TMPDIR)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Mode {
    Rw,
    Ro,
    Wo,
}

impl From<Mode> for FileMode {
    fn from(mode: Mode) -> Self {
        match mode {
            Mode::Rw => Self::ReadWrite,
            Mode::Ro => Self::ReadOnly,
            Mode::Wo => Self::WriteOnly,
        }
    }
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("gradebox=info".parse()?),
        )
        .init();

    let cli = Cli::parse();
    let env = HarnessEnv::from_env();

    match cli.command {
        Commands::Run {
            timeout,
            wait,
            input,
            command,
        } => run(&env, command, input, timeout, wait),

        Commands::Tmpfile { content, mode, dir } => {
            let files = match dir {
                Some(dir) => TempFiles::new(dir),
                None => env.temp_files(),
            };
            let file = files.create(content.as_bytes(), mode.into())?;
            println!("{}", file.path().display());
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn run(
    env: &HarnessEnv,
    command: Vec<String>,
    input: Option<PathBuf>,
    timeout: u64,
    wait: u64,
) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let mut command = command.into_iter();
    let launch = match command.next() {
        Some(program) => Launch::new(program).args(command),
        None => env.launch(),
    };
    let program = launch.program.clone();
    let mut child = launch.spawn()?;
    tracing::info!(pid = child.pid(), program = %program.display(), "started");

    if let Some(path) = input {
        for line in read_lines(&path)? {
            child.send_line(&line)?;
        }
    }
    child.close_input();

    loop {
        match child.read_line(Timeout::secs(timeout)) {
            Ok(Some(line)) => println!("{line}"),
            Ok(None) => break,
            Err(e) if e.is_timeout() => {
                tracing::warn!(pid = child.pid(), timeout, "no output line in time");
                return Ok(ExitCode::from(TIMEOUT_EXIT));
            }
            Err(e) => return Err(e.into()),
        }
    }

    match child.wait(Timeout::secs(wait)) {
        Ok(exit) => {
            tracing::info!(pid = child.pid(), %exit, "finished");
            Ok(ExitCode::from(exit.code() as u8))
        }
        Err(e) if e.is_timeout() => {
            tracing::warn!(pid = child.pid(), wait, "program did not exit in time");
            Ok(ExitCode::from(TIMEOUT_EXIT))
        }
        Err(e) => Err(e.into()),
    }
}
