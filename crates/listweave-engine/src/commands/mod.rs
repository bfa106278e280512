//! Structural editing commands over the list model.

pub mod indent;

pub use indent::{IndentCommand, IndentDirection};
