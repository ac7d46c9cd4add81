//! Purpose: The read/write capability contract shared by all table backends.
//! Exports: `TableBackend`, `Location`, and the concrete backends.
//! Role: Seam that lets `Pipeline` stay agnostic of the table representation.
//! Invariants: Each call opens and releases its location before returning.
//! Invariants: Backends hold no per-location state between calls.

mod columnar;
mod partitioned;
mod records;

use std::fmt;
use std::path::{Path, PathBuf};

use crate::core::error::Error;
use crate::core::table::TableLike;

pub use columnar::{ColumnarBackend, ColumnarTable};
pub use partitioned::{EngineSession, PartitionedBackend, PartitionedOptions, PartitionedTable};
pub use records::RecordBackend;

/// Addressable resource a table is read from or written to.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Location(PathBuf);

impl Location {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn as_path(&self) -> &Path {
        &self.0
    }
}

impl From<PathBuf> for Location {
    fn from(path: PathBuf) -> Self {
        Self(path)
    }
}

impl From<&Path> for Location {
    fn from(path: &Path) -> Self {
        Self(path.to_path_buf())
    }
}

impl From<&str> for Location {
    fn from(path: &str) -> Self {
        Self(PathBuf::from(path))
    }
}

impl AsRef<Path> for Location {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Read a table from a location and write one back.
///
/// `Table` is the backend's own in-memory representation; `write` consumes it.
pub trait TableBackend {
    type Table: TableLike;

    fn name(&self) -> &'static str;

    fn read(&self, location: &Location) -> Result<Self::Table, Error>;

    fn write(&self, table: Self::Table, location: &Location) -> Result<(), Error>;
}

impl<B: TableBackend + ?Sized> TableBackend for Box<B> {
    type Table = B::Table;

    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn read(&self, location: &Location) -> Result<Self::Table, Error> {
        (**self).read(location)
    }

    fn write(&self, table: Self::Table, location: &Location) -> Result<(), Error> {
        (**self).write(table, location)
    }
}

#[cfg(test)]
mod tests {
    use super::{Location, RecordBackend, TableBackend};
    use crate::core::table::Table;

    #[test]
    fn boxed_backend_is_a_backend() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("t.csv");
        std::fs::write(&path, "a\n1\n2\n").expect("seed");

        let backend: Box<dyn TableBackend<Table = Table>> = Box::new(RecordBackend::new());
        let table = backend.read(&Location::from(path.as_path())).expect("read");
        assert_eq!(backend.name(), "records");
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn location_displays_path() {
        let location = Location::from("data/in.csv");
        assert_eq!(location.to_string(), "data/in.csv");
        assert_eq!(location.as_path(), std::path::Path::new("data/in.csv"));
    }
}
