pub mod commands;
pub mod conversion;
mod engine;
pub mod model;
pub mod view;

// Re-export key types for easier usage
pub use commands::{IndentCommand, IndentDirection};
pub use conversion::{ReconcileReport, RenderMode};
pub use engine::Engine;
pub use model::{AttrValue, Block, BlockId, BlockKind, ListType, Model, Transaction};
pub use view::{Mapper, ViewId, ViewKind, ViewTree};
