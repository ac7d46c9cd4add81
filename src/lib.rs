//! Purpose: Library crate behind the `tabio` CLI: table model, text codec, backends, pipeline.
//! Exports: `api` (stable surface), plus `core`, `backend`, and `pipeline` modules.
//! Role: Lets applications plug a backend and a transform into a read/transform/write run.
//! Invariants: Core modules prefer explicit inputs/outputs over hidden state.
//! Invariants: No process-wide state; engine sessions belong to their backend.
pub mod api;
pub mod backend;
pub mod core;
pub mod pipeline;
