//! Application documents and the assembler that fills them from installed
//! capabilities.

mod assembler;
mod document;
mod repo;
mod value;
mod workflow;

pub use assembler::Assembler;
pub use document::{Application, ComponentDocument, Entry, Fields, TYPE_KEY};
pub use repo::AppfileRepo;
pub use value::{Inputs, RawInput, Value, coerce};
pub use workflow::AppWorkflow;
