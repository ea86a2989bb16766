//! Lineage Core: family graph model, relationship rules, tree file codec and layout

pub mod codec;
pub mod config;
pub mod diff;
pub mod editor;
pub mod error;
pub mod graph;
pub mod ids;
pub mod layout;
pub mod model;
pub mod ordering;
pub mod outline;
pub mod rules;


#[cfg(test)]
pub mod test_utils;

pub use model::{NodeId, NodeKind, Gender, Position, PersonNode, Edge, AttributeUpdate};
pub use graph::{Graph, project_edges};
pub use error::TreeError;
pub use ids::{IdGenerator, UuidIds, SequentialIds};
pub use diff::{GraphDiff, DiffEngine};
pub use editor::FamilyTree;
pub use codec::{TreeRow, TreeRecord, ImportedTree, export_rows, import_rows, write_tree, read_tree, parse_records};
pub use layout::layout;
pub use ordering::normalize;
pub use outline::render_outline;
pub use config::{LineageConfig, LayoutConfig, IdScheme, ConfigError, CONFIG_FILE};
