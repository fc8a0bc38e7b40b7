//! Reader and writer of Rafter's binary files: component definitions, rails and levels.
//!
//! Everything is built out of tagged nodes, see [`node`].

pub mod defs;
pub mod level;
pub mod node;
pub mod rail;

pub use defs::{
    peek_definition_name, read_definition, write_definition, Definition, DefinitionError,
};
pub use level::{EntityDef, LevelDef, RawDefinition};
pub use node::NodeName;
pub use rail::RailDef;
