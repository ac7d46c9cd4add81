//! Purpose: Partitioned table backend with an engine-style session and directory output.
//! Exports: `PartitionedBackend`, `PartitionedOptions`, `PartitionedTable`, `EngineSession`.
//! Role: Models a distributed dataframe engine: data lives in partitions, output is a directory.
//! Invariants: Partitions are contiguous slices of the source rows; coalescing restores order.
//! Invariants: A write produces exactly one `part-00000.csv` (with header) plus `_SUCCESS`.
//! Invariants: A write replaces prior output only after the new output is fully staged.
//! Invariants: The session belongs to one backend; closing it makes further calls fail.
use std::cell::{Cell, RefCell};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};

use super::{Location, TableBackend};
use crate::core::error::{Error, ErrorKind};
use crate::core::file;
use crate::core::table::{Record, Schema, Table, TableLike};

pub const PART_FILE: &str = "part-00000.csv";
pub const SUCCESS_MARKER: &str = "_SUCCESS";

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct PartitionedOptions {
    pub partitions: usize,
}

impl PartitionedOptions {
    pub fn new(partitions: usize) -> Self {
        Self { partitions }
    }
}

impl Default for PartitionedOptions {
    fn default() -> Self {
        Self { partitions: 4 }
    }
}

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct PartitionedTable {
    schema: Option<Schema>,
    partitions: Vec<Vec<Record>>,
}

impl PartitionedTable {
    /// Split `table` into at most `partitions` contiguous, non-empty chunks.
    pub fn from_table(table: Table, partitions: usize) -> Self {
        let (schema, records) = table.into_parts();
        let partitions = partitions.max(1);
        let chunk = records.len().div_ceil(partitions).max(1);
        let mut out = Vec::with_capacity(partitions);
        let mut records = records.into_iter().peekable();
        while records.peek().is_some() {
            out.push(records.by_ref().take(chunk).collect());
        }
        Self {
            schema,
            partitions: out,
        }
    }

    pub fn partitions(&self) -> &[Vec<Record>] {
        &self.partitions
    }

    pub fn num_partitions(&self) -> usize {
        self.partitions.len()
    }

    pub fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    /// Apply `f` to every partition independently, keeping the schema.
    ///
    /// Records returned by `f` must match the schema width.
    pub fn map_partitions<F>(self, mut f: F) -> Result<Self, Error>
    where
        F: FnMut(Vec<Record>) -> Vec<Record>,
    {
        let width = self.schema.as_ref().map(Schema::len);
        let partitions: Vec<Vec<Record>> = self.partitions.into_iter().map(&mut f).collect();
        if let Some(width) = width {
            let bad = partitions.iter().flatten().position(|record| record.len() != width);
            if let Some(idx) = bad {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(format!("record does not have {width} values"))
                    .with_record(idx as u64));
            }
        } else if partitions.iter().any(|partition| !partition.is_empty()) {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("cannot add records to a table without a schema"));
        }
        Ok(Self {
            schema: self.schema,
            partitions,
        })
    }

    /// Merge all partitions into one row table, in partition order.
    pub fn coalesce(self) -> Table {
        let records: Vec<Record> = self.partitions.into_iter().flatten().collect();
        match self.schema {
            Some(schema) => Table::from_parts(schema, records),
            None => Table::empty(),
        }
    }
}

impl TableLike for PartitionedTable {
    fn schema(&self) -> Option<&Schema> {
        self.schema.as_ref()
    }

    fn record_count(&self) -> usize {
        self.partitions.iter().map(Vec::len).sum()
    }
}

/// Engine session owned by a single [`PartitionedBackend`].
///
/// Tracks staging directories created by writes so that `close` (or drop)
/// can sweep anything a failed write left behind.
#[derive(Debug)]
pub struct EngineSession {
    id: String,
    options: PartitionedOptions,
    staged: RefCell<Vec<PathBuf>>,
    writes: Cell<u64>,
    closed: Cell<bool>,
}

impl EngineSession {
    fn start(options: PartitionedOptions) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|duration| duration.as_nanos())
            .unwrap_or_default();
        let id = format!("{}-{nanos}", std::process::id());
        debug!(session = %id, partitions = options.partitions, "engine session started");
        Self {
            id,
            options,
            staged: RefCell::new(Vec::new()),
            writes: Cell::new(0),
            closed: Cell::new(false),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn options(&self) -> PartitionedOptions {
        self.options
    }

    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }

    fn ensure_open(&self) -> Result<(), Error> {
        if self.closed.get() {
            return Err(Error::new(ErrorKind::Usage)
                .with_message("engine session is closed")
                .with_hint("Create a new backend; sessions cannot be reopened."));
        }
        Ok(())
    }

    // Staging lives beside the output so the final rename stays on one filesystem.
    fn staging_dir(&self, output: &Path) -> Result<PathBuf, Error> {
        let name = output
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| file::not_a_table(output))?;
        let seq = self.writes.get() + 1;
        self.writes.set(seq);
        let staging_name = format!(".{name}.tabio-{}-{seq}", self.id);
        let dir = output
            .parent()
            .unwrap_or_else(|| Path::new(""))
            .join(staging_name);
        fs::create_dir(&dir).map_err(|err| {
            Error::from_io(err, &dir).with_message("cannot create staging directory")
        })?;
        self.staged.borrow_mut().push(dir.clone());
        Ok(dir)
    }

    fn release(&self, dir: &Path) {
        self.staged.borrow_mut().retain(|staged| staged != dir);
    }

    // A staging dir that cannot be removed now stays tracked for `close`.
    fn discard(&self, dir: &Path) {
        match file::remove_existing(dir) {
            Ok(()) => self.release(dir),
            Err(err) => {
                warn!(path = %dir.display(), error = %err, "failed to discard staging directory");
            }
        }
    }

    /// Staging directories created by failed writes that are still on disk.
    pub fn pending_staging(&self) -> Vec<PathBuf> {
        self.staged.borrow().clone()
    }

    /// Tear down the session, removing leftover staging directories.
    pub fn close(&self) -> Result<(), Error> {
        if self.closed.replace(true) {
            return Ok(());
        }
        let staged = std::mem::take(&mut *self.staged.borrow_mut());
        let mut first_err = None;
        for dir in staged {
            if let Err(err) = file::remove_existing(&dir) {
                warn!(path = %dir.display(), "failed to remove staging directory");
                first_err.get_or_insert(err);
            }
        }
        debug!(session = %self.id, "engine session closed");
        first_err.map_or(Ok(()), Err)
    }
}

impl Drop for EngineSession {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

#[derive(Debug)]
pub struct PartitionedBackend {
    session: EngineSession,
}

impl PartitionedBackend {
    pub fn new(options: PartitionedOptions) -> Self {
        Self {
            session: EngineSession::start(options),
        }
    }

    pub fn session(&self) -> &EngineSession {
        &self.session
    }

    pub fn close(self) -> Result<(), Error> {
        self.session.close()
    }

    fn read_table(&self, path: &Path) -> Result<Table, Error> {
        if !path.is_dir() {
            return file::read_table(path);
        }
        let mut parts = Vec::new();
        let entries = fs::read_dir(path).map_err(|err| {
            Error::from_io(err, path).with_message("cannot list table directory")
        })?;
        for entry in entries {
            let entry = entry.map_err(|err| {
                Error::from_io(err, path).with_message("cannot list table directory")
            })?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if name.starts_with("part-") && name.ends_with(".csv") {
                parts.push(entry.path());
            }
        }
        parts.sort();

        let mut schema: Option<Schema> = None;
        let mut records = Vec::new();
        for part in &parts {
            let (part_schema, part_records) = file::read_table(part)?.into_parts();
            let Some(part_schema) = part_schema else { continue };
            match &schema {
                None => schema = Some(part_schema),
                Some(existing) if *existing != part_schema => {
                    return Err(Error::new(ErrorKind::Usage)
                        .with_message("part files disagree on header")
                        .with_path(part));
                }
                Some(_) => {}
            }
            records.extend(part_records);
        }
        debug!(path = %path.display(), parts = parts.len(), "read partitioned directory");
        Ok(match schema {
            Some(schema) => Table::from_parts(schema, records),
            None => Table::empty(),
        })
    }
}

impl Default for PartitionedBackend {
    fn default() -> Self {
        Self::new(PartitionedOptions::default())
    }
}

impl TableBackend for PartitionedBackend {
    type Table = PartitionedTable;

    fn name(&self) -> &'static str {
        "partitioned"
    }

    /// Read a single file, or a directory of `part-*.csv` files in name order.
    fn read(&self, location: &Location) -> Result<PartitionedTable, Error> {
        self.session.ensure_open()?;
        let table = self.read_table(location.as_path())?;
        let table = PartitionedTable::from_table(table, self.session.options.partitions);
        debug!(
            %location,
            partitions = table.num_partitions(),
            records = table.record_count(),
            "read partitioned table"
        );
        Ok(table)
    }

    fn write(&self, table: PartitionedTable, location: &Location) -> Result<(), Error> {
        self.session.ensure_open()?;
        let output = location.as_path();
        if table.record_count() == 0 {
            return Err(Error::new(ErrorKind::EmptyTable)
                .with_message("cannot write a table with no records")
                .with_path(output));
        }
        let partitions = table.num_partitions();
        let table = table.coalesce();

        let staging = self.session.staging_dir(output)?;
        if let Err(err) = stage(&staging, &table).and_then(|()| publish(&staging, output)) {
            self.session.discard(&staging);
            return Err(err);
        }
        self.session.release(&staging);

        debug!(%location, partitions, records = table.len(), "wrote partitioned table");
        Ok(())
    }
}

fn stage(dir: &Path, table: &Table) -> Result<(), Error> {
    file::write_table(&dir.join(PART_FILE), table)?;
    file::write_bytes(&dir.join(SUCCESS_MARKER), b"")
}

fn publish(staging: &Path, output: &Path) -> Result<(), Error> {
    file::remove_existing(output)?;
    fs::rename(staging, output).map_err(|err| {
        Error::from_io(err, output).with_message("cannot move staged output into place")
    })
}
