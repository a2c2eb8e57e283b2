pub mod casino;
pub mod execution;

pub use execution::{Failure, Instruction, Key, Output, Value};
