//! Serde structs for reaction table files.
//!
//! A table lists optional raw compounds (to fix their ids and make
//! compounds that appear in no reaction known by name) followed by the
//! reactions. Reagents are written as a two-element tuple in RON and a
//! two-element array in TOML and JSON.

use serde::Deserialize;

// ===========================================================================
// Reaction table
// ===========================================================================

/// A complete reaction table file.
#[derive(Debug, Clone, Deserialize)]
pub struct ReactionTableData {
    /// Compounds registered before any reaction, in id order.
    #[serde(default)]
    pub compounds: Vec<String>,
    pub reactions: Vec<ReactionData>,
}

/// One reagent pair and the product it yields.
#[derive(Debug, Clone, Deserialize)]
pub struct ReactionData {
    pub reagents: (String, String),
    pub product: String,
}
