//! Purpose: Hold top-level CLI command dispatch for `tabio`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Backend selection happens here and nowhere else.
//! Invariants: Engine sessions are closed before the command returns.

use super::*;

use clap::CommandFactory;

pub(super) fn dispatch_command(command: Command) -> Result<RunOutcome, Error> {
    match command {
        Command::Completion { shell } => {
            let mut cmd = Cli::command();
            clap_complete::aot::generate(shell, &mut cmd, "tabio", &mut io::stdout());
            Ok(RunOutcome::ok())
        }
        Command::Copy {
            input,
            output,
            backend,
        } => {
            let input = Location::from(input);
            let output = Location::from(output);
            let options = partitioned_options(&backend)?;
            let name = match backend.backend {
                BackendKind::Records => copy_with(RecordBackend::new(), &input, &output)?.name(),
                BackendKind::Columnar => {
                    copy_with(ColumnarBackend::new(), &input, &output)?.name()
                }
                BackendKind::Partitioned => {
                    let engine = copy_with(PartitionedBackend::new(options), &input, &output)?;
                    let name = engine.name();
                    engine.close()?;
                    name
                }
            };
            emit_json(json!({
                "input": input.to_string(),
                "output": output.to_string(),
                "backend": name,
            }));
            Ok(RunOutcome::ok())
        }
        Command::Inspect { input, backend } => {
            let input = Location::from(input);
            let options = partitioned_options(&backend)?;
            let value = match backend.backend {
                BackendKind::Records => inspect_with(&RecordBackend::new(), &input)?,
                BackendKind::Columnar => inspect_with(&ColumnarBackend::new(), &input)?,
                BackendKind::Partitioned => {
                    let engine = PartitionedBackend::new(options);
                    let value = inspect_with(&engine, &input)?;
                    engine.close()?;
                    value
                }
            };
            emit_json(value);
            Ok(RunOutcome::ok())
        }
    }
}
