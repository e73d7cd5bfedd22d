//! Reactor Data -- data-driven loading for the reactor engine.
//!
//! Reaction tables and engine configuration are plain data files in RON,
//! TOML or JSON; the format follows the extension. The standard reaction
//! table ships embedded in the crate.
//!
//! ```text
//! reactions.ron -> ReactionTableData -> ReactionGraphBuilder -> ReactionGraph
//! lab.toml      -> LabConfig (serde defaults) -> validate_config
//! ```

pub mod config;
pub mod loader;
pub mod schema;
pub mod standard;

pub use config::{ConfigError, validate_config};
pub use loader::{
    DataLoadError, Format, load_config, load_reaction_graph, parse_reaction_table,
};
pub use standard::standard_reaction_graph;
