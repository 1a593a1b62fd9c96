//! The virtual folder/file tree: node model, path resolution, chain
//! building, the snapshot store, structured-text export and the flattened
//! view used for rendering.

pub mod builder;
pub mod export;
pub mod node;
pub mod resolve;
pub mod store;
pub mod view;

pub use export::to_structured_text;
pub use node::{Node, NodeId, Snapshot};
pub use store::{AddOutcome, TreeStore};
pub use view::{FlatItem, TreeView};
