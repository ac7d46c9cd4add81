//! Purpose: Define the stable public Rust API boundary for tabio.
//! Exports: Table model, codec entry points, backends, pipeline, and errors.
//! Role: Public, additive-only surface used by the CLI and embedders.
//! Invariants: Everything a caller needs to run a pipeline is reachable from here.

#[doc(hidden)]
pub use crate::core::error::to_exit_code;
pub use crate::core::codec::{decode, decode_reader, decode_str, encode, encode_to_string};
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::table::{Record, Schema, Table, TableLike};
pub use crate::backend::{
    ColumnarBackend, ColumnarTable, EngineSession, Location, PartitionedBackend,
    PartitionedOptions, PartitionedTable, RecordBackend, TableBackend,
};
pub use crate::pipeline::{Pipeline, Transform, identity};
