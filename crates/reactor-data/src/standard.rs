//! The built-in reaction table.

use crate::loader::{DataLoadError, Format, build_reaction_graph, deserialize_str};
use crate::schema::ReactionTableData;
use reactor_core::reaction::ReactionGraph;
use std::path::Path;

const STANDARD_TABLE: &str = include_str!("../data/reactions.ron");

/// Build the standard graph: base minerals, hydroxide, the catalyst `G`,
/// and the tier 1 to 3 compounds.
pub fn standard_reaction_graph() -> Result<ReactionGraph, DataLoadError> {
    let origin = Path::new("data/reactions.ron");
    let table: ReactionTableData = deserialize_str(STANDARD_TABLE, Format::Ron, origin)?;
    build_reaction_graph(&table, origin)
}
