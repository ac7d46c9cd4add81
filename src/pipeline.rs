//! Purpose: Read → transform → write orchestration over one injected backend.
//! Exports: `Pipeline`, `Transform`, `identity`.
//! Role: The unit a consuming application runs; knows nothing about table layout.
//! Invariants: The backend and transform are fixed at construction.
//! Invariants: `execute` keeps no state between calls; any failure aborts that call.
use tracing::{debug, info};

use crate::backend::{Location, TableBackend};
use crate::core::error::Error;
use crate::core::table::TableLike;

/// Turns the table read from the input into the table written to the output.
///
/// Implemented for any `Fn(T) -> Result<T, Error>`, so closures and plain
/// functions can be passed to [`Pipeline::new`] directly.
pub trait Transform<T> {
    fn apply(&self, table: T) -> Result<T, Error>;
}

impl<T, F> Transform<T> for F
where
    F: Fn(T) -> Result<T, Error>,
{
    fn apply(&self, table: T) -> Result<T, Error> {
        self(table)
    }
}

/// Pass-through transform.
pub fn identity<T>(table: T) -> Result<T, Error> {
    Ok(table)
}

pub struct Pipeline<B, X> {
    backend: B,
    transform: X,
}

impl<B, X> Pipeline<B, X>
where
    B: TableBackend,
    X: Transform<B::Table>,
{
    pub fn new(backend: B, transform: X) -> Self {
        Self { backend, transform }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Hand the backend back, e.g. to close an engine session explicitly.
    pub fn into_backend(self) -> B {
        self.backend
    }

    pub fn execute(&self, input: &Location, output: &Location) -> Result<(), Error> {
        let backend = self.backend.name();
        let table_in = self.backend.read(input)?;
        debug!(backend, %input, records = table_in.record_count(), "pipeline read input");

        let table_out = self.transform.apply(table_in)?;
        let records = table_out.record_count();
        debug!(backend, records, "pipeline transformed table");

        self.backend.write(table_out, output)?;
        info!(backend, %input, %output, records, "pipeline finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{Pipeline, identity};
    use crate::backend::{Location, RecordBackend};
    use crate::core::error::{Error, ErrorKind};
    use crate::core::table::{Record, Table};

    #[test]
    fn identity_copies_filtered_rows() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = Location::new(dir.path().join("in.csv"));
        let output = Location::new(dir.path().join("out.csv"));
        std::fs::write(input.as_path(), "a,b,c\n1,2,3\n4,5\n6,7,8\n").expect("seed");

        Pipeline::new(RecordBackend::new(), identity::<Table>)
            .execute(&input, &output)
            .expect("execute");
        assert_eq!(
            std::fs::read_to_string(output.as_path()).expect("output"),
            "a,b,c\n1,2,3\n6,7,8\n"
        );
    }

    #[test]
    fn transform_errors_abort_before_write() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = Location::new(dir.path().join("in.csv"));
        let output = Location::new(dir.path().join("out.csv"));
        std::fs::write(input.as_path(), "a\n1\n").expect("seed");

        let pipeline = Pipeline::new(RecordBackend::new(), |_: Table| -> Result<Table, Error> {
            Err(Error::new(ErrorKind::Usage).with_message("rejected"))
        });
        let err = pipeline.execute(&input, &output).expect_err("transform");
        assert_eq!(err.kind(), ErrorKind::Usage);
        assert!(!output.as_path().exists());
    }

    #[test]
    fn transform_producing_no_records_is_empty_table() {
        let dir = tempfile::tempdir().expect("tempdir");
        let input = Location::new(dir.path().join("in.csv"));
        let output = Location::new(dir.path().join("out.csv"));
        std::fs::write(input.as_path(), "a\n1\n").expect("seed");

        let drop_all = |table: Table| {
            let (schema, _) = table.into_parts();
            match schema {
                Some(schema) => Table::new(schema, Vec::<Record>::new()),
                None => Ok(Table::empty()),
            }
        };
        let err = Pipeline::new(RecordBackend::new(), drop_all)
            .execute(&input, &output)
            .expect_err("empty");
        assert_eq!(err.kind(), ErrorKind::EmptyTable);
        assert!(!output.as_path().exists());
    }

    #[test]
    fn missing_input_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = Pipeline::new(RecordBackend::new(), identity::<Table>)
            .execute(
                &Location::new(dir.path().join("missing.csv")),
                &Location::new(dir.path().join("out.csv")),
            )
            .expect_err("missing");
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn execute_is_repeatable() {
        let dir = tempfile::tempdir().expect("tempdir");
        let pipeline = Pipeline::new(RecordBackend::new(), identity::<Table>);
        for name in ["one", "two"] {
            let input = Location::new(dir.path().join(format!("{name}.csv")));
            let output = Location::new(dir.path().join(format!("{name}.out.csv")));
            std::fs::write(input.as_path(), format!("k\n{name}\n")).expect("seed");
            pipeline.execute(&input, &output).expect("execute");
            assert_eq!(
                std::fs::read_to_string(output.as_path()).expect("output"),
                format!("k\n{name}\n")
            );
        }
    }
}
