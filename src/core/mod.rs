// Core modules implementing the table model, text codec, file access, and error modeling.
pub mod codec;
pub mod error;
pub mod file;
pub mod table;
