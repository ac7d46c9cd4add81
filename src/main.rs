//! Purpose: `tabio` CLI entry point: wires one backend into one pipeline run.
//! Role: Binary crate root; parses args, runs commands, emits JSON on stdout.
//! Invariants: `copy` runs exactly one `Pipeline::execute` with the identity transform.
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
//! Invariants: Tracing goes to stderr; stdout carries only command output.
#![allow(clippy::result_large_err)]
use std::error::Error as StdError;
use std::io::{self, IsTerminal};
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum, ValueHint, error::ErrorKind as ClapErrorKind};
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

mod command_dispatch;

use tabio::api::{
    ColumnarBackend, Error, ErrorKind, Location, PartitionedBackend, PartitionedOptions,
    Pipeline, RecordBackend, TableBackend, TableLike, identity, to_exit_code,
};

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }

    fn with_code(exit_code: i32) -> Self {
        Self { exit_code }
    }
}

fn main() {
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err((err, color_mode)) => {
            emit_error(&err, color_mode);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, (Error, ColorMode)> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    (
                        Error::new(ErrorKind::Io)
                            .with_message("failed to write help")
                            .with_source(io_err),
                        ColorMode::Auto,
                    )
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome::with_code(exit_code));
            }
            _ => {
                return Err((
                    Error::new(ErrorKind::Usage)
                        .with_message(clap_error_summary(&err))
                        .with_hint("Try `tabio --help`."),
                    ColorMode::Auto,
                ));
            }
        },
    };

    init_tracing();
    let color_mode = cli.color;
    command_dispatch::dispatch_command(cli.command).map_err(|err| (err, color_mode))
}

#[derive(Parser)]
#[command(
    name = "tabio",
    version,
    about = "Read, transform, and write comma-separated tables through pluggable backends",
    long_about = None,
    after_help = r#"EXAMPLES
  $ tabio copy in.csv out.csv
  $ tabio copy --backend partitioned --partitions 8 in.csv out_dir
  $ tabio inspect in.csv

NOTES
  - Rows whose field count differs from the header are dropped on read
  - Writing a table with no rows fails with exit code 4
  - Set RUST_LOG=debug for backend and pipeline events on stderr"#,
    arg_required_else_help = true
)]
struct Cli {
    #[arg(
        long,
        default_value = "auto",
        value_enum,
        help = "Colorize stderr diagnostics: auto|always|never"
    )]
    color: ColorMode,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum BackendKind {
    Records,
    Columnar,
    Partitioned,
}

#[derive(clap::Args, Clone, Debug)]
struct BackendArgs {
    #[arg(long, value_enum, default_value = "records", help = "Table backend to use")]
    backend: BackendKind,
    #[arg(
        long,
        help = "Partition count for the partitioned backend",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    partitions: Option<u64>,
}

#[derive(Subcommand)]
enum Command {
    #[command(
        about = "Copy a table through one pipeline run",
        after_help = r#"EXAMPLES
  $ tabio copy people.csv people.clean.csv
  $ tabio copy --backend columnar people.csv out.csv
  $ tabio copy --backend partitioned people.csv out_dir   # writes out_dir/part-00000.csv"#
    )]
    Copy {
        #[arg(help = "Input location", value_hint = ValueHint::FilePath)]
        input: PathBuf,
        #[arg(help = "Output location (replaced if it exists)", value_hint = ValueHint::AnyPath)]
        output: PathBuf,
        #[command(flatten)]
        backend: BackendArgs,
    },
    #[command(
        about = "Read a table and print its shape as JSON",
        after_help = r#"EXAMPLES
  $ tabio inspect people.csv
  # {"location":"people.csv","backend":"records","schema":["name","city"],"records":2,"duplicate_fields":[]}"#
    )]
    Inspect {
        #[arg(help = "Input location", value_hint = ValueHint::FilePath)]
        input: PathBuf,
        #[command(flatten)]
        backend: BackendArgs,
    },
    #[command(about = "Generate shell completion scripts")]
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

fn partitioned_options(args: &BackendArgs) -> Result<PartitionedOptions, Error> {
    let Some(partitions) = args.partitions else {
        return Ok(PartitionedOptions::default());
    };
    if args.backend != BackendKind::Partitioned {
        return Err(Error::new(ErrorKind::Usage)
            .with_message("--partitions only applies to the partitioned backend")
            .with_hint("Add --backend partitioned, or drop --partitions."));
    }
    let partitions = usize::try_from(partitions).map_err(|_| {
        Error::new(ErrorKind::Usage).with_message("--partitions is too large")
    })?;
    Ok(PartitionedOptions::new(partitions))
}

fn copy_with<B: TableBackend>(backend: B, input: &Location, output: &Location) -> Result<B, Error> {
    let pipeline = Pipeline::new(backend, identity::<B::Table>);
    pipeline.execute(input, output)?;
    Ok(pipeline.into_backend())
}

fn inspect_with<B: TableBackend>(backend: &B, input: &Location) -> Result<Value, Error> {
    let table = backend.read(input)?;
    let schema = table.schema();
    let duplicates = schema.map(|schema| schema.duplicate_fields()).unwrap_or_default();
    Ok(json!({
        "location": input.to_string(),
        "backend": backend.name(),
        "schema": schema,
        "records": table.record_count(),
        "duplicate_fields": duplicates,
    }))
}

fn emit_json(value: Value) {
    let json = serde_json::to_string(&value)
        .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string());
    println!("{json}");
}

fn emit_error(err: &Error, color_mode: ColorMode) {
    let report = ErrorReport::new(err);
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", report.to_text(color_mode.use_color(is_tty)));
        return;
    }
    let json = serde_json::to_string(&report.to_json()).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

/// One failed command, rendered either as a JSON envelope or as terminal text.
struct ErrorReport<'a> {
    err: &'a Error,
    causes: Vec<String>,
}

impl<'a> ErrorReport<'a> {
    fn new(err: &'a Error) -> Self {
        let mut causes = Vec::new();
        let mut cur = err.source();
        while let Some(source) = cur {
            causes.push(source.to_string());
            cur = source.source();
        }
        Self { err, causes }
    }

    fn message(&self) -> &str {
        if let Some(message) = self.err.message() {
            return message;
        }
        match self.err.kind() {
            ErrorKind::Internal => "internal error",
            ErrorKind::Usage => "usage error",
            ErrorKind::NotFound => "table location not found",
            ErrorKind::EmptyTable => "table has no records",
            ErrorKind::Permission => "permission denied",
            ErrorKind::Io => "i/o error",
        }
    }

    fn to_json(&self) -> Value {
        let mut inner = Map::new();
        inner.insert("kind".to_string(), json!(format!("{:?}", self.err.kind())));
        inner.insert("message".to_string(), json!(self.message()));
        inner.insert("exit_code".to_string(), json!(to_exit_code(self.err.kind())));
        if let Some(hint) = self.err.hint() {
            inner.insert("hint".to_string(), json!(hint));
        }
        if let Some(path) = self.err.path() {
            inner.insert("path".to_string(), json!(path.display().to_string()));
        }
        if let Some(record) = self.err.record() {
            inner.insert("record".to_string(), json!(record));
        }
        if !self.causes.is_empty() {
            inner.insert("causes".to_string(), json!(self.causes));
        }
        let mut outer = Map::new();
        outer.insert("error".to_string(), Value::Object(inner));
        Value::Object(outer)
    }

    // Location details are indented under the message; the hint closes the report.
    fn to_text(&self, use_color: bool) -> String {
        let mut lines = vec![format!(
            "{} {}",
            Label::Error.paint("error:", use_color),
            self.message()
        )];
        if let Some(path) = self.err.path() {
            lines.push(format!(
                "  {} {}",
                Label::Detail.paint("path:", use_color),
                path.display()
            ));
        }
        if let Some(record) = self.err.record() {
            lines.push(format!(
                "  {} {record}",
                Label::Detail.paint("record:", use_color)
            ));
        }
        for cause in &self.causes {
            lines.push(format!(
                "  {} {cause}",
                Label::Detail.paint("caused by:", use_color)
            ));
        }
        if let Some(hint) = self.err.hint() {
            lines.push(format!("{} {hint}", Label::Hint.paint("hint:", use_color)));
        }
        lines.join("\n")
    }
}

#[derive(Copy, Clone, Debug)]
enum Label {
    Error,
    Detail,
    Hint,
}

impl Label {
    fn paint(self, text: &str, enabled: bool) -> String {
        if !enabled {
            return text.to_string();
        }
        let code = match self {
            Label::Error => "1;31",
            Label::Detail => "2",
            Label::Hint => "33",
        };
        format!("\u{1b}[{code}m{text}\u{1b}[0m")
    }
}

fn clap_error_summary(err: &clap::Error) -> String {
    err.to_string()
        .lines()
        .map(str::trim)
        .find(|line| !line.is_empty())
        .map(|line| line.strip_prefix("error:").unwrap_or(line).trim().to_string())
        .unwrap_or_else(|| "invalid arguments".to_string())
}

#[cfg(test)]
mod tests {
    use super::{
        BackendArgs, BackendKind, Error, ErrorKind, ErrorReport, partitioned_options,
    };

    #[test]
    fn error_json_carries_context() {
        let err = Error::new(ErrorKind::EmptyTable)
            .with_message("cannot write a table with no records")
            .with_path("out.csv");
        let value = ErrorReport::new(&err).to_json();
        let inner = value.get("error").expect("error object");
        assert_eq!(inner["kind"], "EmptyTable");
        assert_eq!(inner["message"], "cannot write a table with no records");
        assert_eq!(inner["exit_code"], 4);
        assert_eq!(inner["path"], "out.csv");
        assert!(inner.get("record").is_none());
        assert!(inner.get("causes").is_none());
    }

    #[test]
    fn error_text_without_color_is_plain() {
        let err = Error::new(ErrorKind::NotFound).with_hint("check the path");
        let text = ErrorReport::new(&err).to_text(false);
        assert_eq!(text, "error: table location not found\nhint: check the path");
    }

    #[test]
    fn error_text_lists_path_record_and_causes() {
        let err = Error::new(ErrorKind::Usage)
            .with_message("record has 1 values but schema has 2 fields")
            .with_path("in.csv")
            .with_record(3)
            .with_source(std::io::Error::other("short row"))
            .with_hint("fix the row");
        let report = ErrorReport::new(&err);
        assert_eq!(
            report.to_text(false),
            "error: record has 1 values but schema has 2 fields\n  path: in.csv\n  record: 3\n  caused by: short row\nhint: fix the row"
        );
        assert_eq!(report.to_json()["error"]["record"], 3);
        assert_eq!(report.to_json()["error"]["causes"], serde_json::json!(["short row"]));
    }

    #[test]
    fn partitions_flag_requires_partitioned_backend() {
        let args = BackendArgs {
            backend: BackendKind::Records,
            partitions: Some(3),
        };
        let err = partitioned_options(&args).expect_err("mismatch");
        assert_eq!(err.kind(), ErrorKind::Usage);

        let args = BackendArgs {
            backend: BackendKind::Partitioned,
            partitions: Some(3),
        };
        assert_eq!(partitioned_options(&args).expect("options").partitions, 3);
    }
}
