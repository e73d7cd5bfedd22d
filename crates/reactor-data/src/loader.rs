//! Loading pipeline: detects the file format, deserializes, resolves names
//! and builds engine types.
//!
//! # Architecture
//!
//! 1. [`detect_format`] picks RON, TOML or JSON from the file extension.
//! 2. [`deserialize_str`] parses the text into a schema struct.
//! 3. [`build_reaction_graph`] registers compounds and reactions on a
//!    [`ReactionGraphBuilder`] and validates the result.

use crate::config::{ConfigError, validate_config};
use crate::schema::ReactionTableData;
use reactor_core::config::LabConfig;
use reactor_core::reaction::{GraphError, ReactionGraph, ReactionGraphBuilder};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};
use tracing::debug;

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// A reaction names the same compound as reagent and product, or two
    /// reactions share a product.
    #[error("invalid reaction table in {file}: {source}")]
    Graph {
        file: PathBuf,
        #[source]
        source: GraphError,
    },

    /// The configuration parsed but holds unusable values.
    #[error("invalid configuration in {file}: {source}")]
    Config {
        file: PathBuf,
        #[source]
        source: ConfigError,
    },

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// Deserialization
// ===========================================================================

/// Deserialize text in the given format. `origin` only labels errors.
pub fn deserialize_str<T: DeserializeOwned>(
    content: &str,
    format: Format,
    origin: &Path,
) -> Result<T, DataLoadError> {
    let parse_error = |detail: String| DataLoadError::Parse {
        file: origin.to_path_buf(),
        detail,
    };
    match format {
        Format::Ron => ron::from_str(content).map_err(|e| parse_error(e.to_string())),
        Format::Json => serde_json::from_str(content).map_err(|e| parse_error(e.to_string())),
        Format::Toml => toml::from_str(content).map_err(|e| parse_error(e.to_string())),
    }
}

/// Read a file and deserialize it according to its format (detected from extension).
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;
    deserialize_str(&content, format, path)
}

// ===========================================================================
// Reaction graph
// ===========================================================================

/// Resolve a parsed table into a validated graph.
pub fn build_reaction_graph(
    table: &ReactionTableData,
    origin: &Path,
) -> Result<ReactionGraph, DataLoadError> {
    let mut builder = ReactionGraphBuilder::new();
    for name in &table.compounds {
        builder.register_compound(name);
    }
    for reaction in &table.reactions {
        let (a, b) = &reaction.reagents;
        builder.reaction(a, b, &reaction.product);
    }
    let graph = builder.build().map_err(|source| DataLoadError::Graph {
        file: origin.to_path_buf(),
        source,
    })?;
    debug!(
        file = %origin.display(),
        compounds = graph.compound_count(),
        reactions = graph.reactions().len(),
        "built reaction graph"
    );
    Ok(graph)
}

/// Parse reaction table text and build its graph.
pub fn parse_reaction_table(content: &str, format: Format) -> Result<ReactionGraph, DataLoadError> {
    let origin = Path::new("<inline>");
    let table: ReactionTableData = deserialize_str(content, format, origin)?;
    build_reaction_graph(&table, origin)
}

/// Load a reaction table file and build its graph.
pub fn load_reaction_graph(path: &Path) -> Result<ReactionGraph, DataLoadError> {
    let table: ReactionTableData = deserialize_file(path)?;
    build_reaction_graph(&table, path)
}

// ===========================================================================
// Configuration
// ===========================================================================

/// Load and validate an engine configuration file. Missing fields take
/// their defaults.
pub fn load_config(path: &Path) -> Result<LabConfig, DataLoadError> {
    let config: LabConfig = deserialize_file(path)?;
    validate_config(&config).map_err(|source| DataLoadError::Config {
        file: path.to_path_buf(),
        source,
    })?;
    debug!(file = %path.display(), "loaded engine configuration");
    Ok(config)
}

// ===========================================================================
// Tests
// ===========================================================================
