//! The static reaction graph and the dependency resolver built on it.
//!
//! A [`ReactionGraph`] maps reagent pairs to the compound they produce. It is
//! assembled through a [`ReactionGraphBuilder`], validated once, and never
//! mutated afterwards. Resolution is pure: [`ReactionGraph::find_direct_reagents`]
//! answers "what is this made of", and [`ReactionGraph::build_reaction_chain`]
//! expands a target into the ordered list of syntheses needed to reach it.

use crate::id::CompoundId;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One edge of the graph: `reagents.0 + reagents.1 -> product`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub reagents: (CompoundId, CompoundId),
    pub product: CompoundId,
}

/// One resolved step of a reaction chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainStep {
    pub product: CompoundId,
    pub reagents: (CompoundId, CompoundId),
    /// Position in the chain. Lower runs first.
    pub priority: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("invalid compound reference: {0:?}")]
    InvalidCompoundRef(CompoundId),
    #[error("compound {0} is produced by more than one reaction")]
    DuplicateProduct(String),
    #[error("compound {0} is listed as its own reagent")]
    SelfReaction(String),
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for an immutable [`ReactionGraph`].
#[derive(Debug, Default)]
pub struct ReactionGraphBuilder {
    names: Vec<String>,
    name_to_id: HashMap<String, CompoundId>,
    reactions: Vec<Reaction>,
}

impl ReactionGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a compound by name. Registering the same name twice returns
    /// the existing id.
    pub fn register_compound(&mut self, name: &str) -> CompoundId {
        if let Some(id) = self.name_to_id.get(name) {
            return *id;
        }
        let id = CompoundId(self.names.len() as u32);
        self.names.push(name.to_string());
        self.name_to_id.insert(name.to_string(), id);
        id
    }

    /// Register a reaction between already-registered compounds.
    pub fn register_reaction(&mut self, a: CompoundId, b: CompoundId, product: CompoundId) {
        self.reactions.push(Reaction {
            reagents: (a, b),
            product,
        });
    }

    /// Register a reaction by compound names, registering unknown names.
    pub fn reaction(&mut self, a: &str, b: &str, product: &str) -> &mut Self {
        let a = self.register_compound(a);
        let b = self.register_compound(b);
        let product = self.register_compound(product);
        self.register_reaction(a, b, product);
        self
    }

    pub fn compound_id(&self, name: &str) -> Option<CompoundId> {
        self.name_to_id.get(name).copied()
    }

    /// Validate and freeze the graph.
    pub fn build(self) -> Result<ReactionGraph, GraphError> {
        let count = self.names.len();
        let name_of = |id: CompoundId| self.names[id.0 as usize].clone();
        let mut by_product = HashMap::new();

        for (index, reaction) in self.reactions.iter().enumerate() {
            let (a, b) = reaction.reagents;
            for id in [a, b, reaction.product] {
                if id.0 as usize >= count {
                    return Err(GraphError::InvalidCompoundRef(id));
                }
            }
            if a == reaction.product || b == reaction.product {
                return Err(GraphError::SelfReaction(name_of(reaction.product)));
            }
            if by_product.insert(reaction.product, index).is_some() {
                return Err(GraphError::DuplicateProduct(name_of(reaction.product)));
            }
        }

        Ok(ReactionGraph {
            names: self.names,
            name_to_id: self.name_to_id,
            reactions: self.reactions,
            by_product,
        })
    }
}

// ---------------------------------------------------------------------------
// ReactionGraph
// ---------------------------------------------------------------------------

/// Immutable reaction graph. Frozen after `build()`.
#[derive(Debug, Clone)]
pub struct ReactionGraph {
    names: Vec<String>,
    name_to_id: HashMap<String, CompoundId>,
    reactions: Vec<Reaction>,
    by_product: HashMap<CompoundId, usize>,
}

impl ReactionGraph {
    pub fn compound_id(&self, name: &str) -> Option<CompoundId> {
        self.name_to_id.get(name).copied()
    }

    pub fn compound_name(&self, id: CompoundId) -> Option<&str> {
        self.names.get(id.0 as usize).map(String::as_str)
    }

    /// Name for logs and messages; falls back to the raw id.
    pub fn display_name(&self, id: CompoundId) -> String {
        self.compound_name(id)
            .map(str::to_string)
            .unwrap_or_else(|| format!("#{}", id.0))
    }

    pub fn contains(&self, id: CompoundId) -> bool {
        (id.0 as usize) < self.names.len()
    }

    pub fn compound_count(&self) -> usize {
        self.names.len()
    }

    pub fn reactions(&self) -> &[Reaction] {
        &self.reactions
    }

    /// The reagent pair producing `product`, or `None` for raw materials.
    pub fn find_direct_reagents(&self, product: CompoundId) -> Option<(CompoundId, CompoundId)> {
        self.by_product
            .get(&product)
            .map(|&index| self.reactions[index].reagents)
    }

    pub fn is_synthesizable(&self, compound: CompoundId) -> bool {
        self.by_product.contains_key(&compound)
    }

    /// The product of combining `a` and `b`, in either order.
    pub fn product_of(&self, a: CompoundId, b: CompoundId) -> Option<CompoundId> {
        self.reactions
            .iter()
            .find(|r| r.reagents == (a, b) || r.reagents == (b, a))
            .map(|r| r.product)
    }

    /// Expand `product` into the syntheses needed to make it.
    ///
    /// A reagent is expanded first only if `available(reagent)` is below
    /// `threshold` and the reagent is itself synthesizable. Steps are emitted
    /// deepest dependency first; each compound appears at most once. Raw
    /// materials yield an empty chain.
    pub fn build_reaction_chain<F>(
        &self,
        product: CompoundId,
        available: F,
        threshold: u32,
    ) -> Vec<ChainStep>
    where
        F: Fn(CompoundId) -> u32,
    {
        let mut chain = Vec::new();
        let mut visited = HashSet::new();
        self.expand(product, &available, threshold, &mut visited, &mut chain);
        chain
    }

    fn expand<F>(
        &self,
        product: CompoundId,
        available: &F,
        threshold: u32,
        visited: &mut HashSet<CompoundId>,
        chain: &mut Vec<ChainStep>,
    ) where
        F: Fn(CompoundId) -> u32,
    {
        if !visited.insert(product) {
            return;
        }
        let Some((a, b)) = self.find_direct_reagents(product) else {
            return;
        };
        for reagent in [a, b] {
            if available(reagent) < threshold && self.is_synthesizable(reagent) {
                self.expand(reagent, available, threshold, visited, chain);
            }
        }
        chain.push(ChainStep {
            product,
            reagents: (a, b),
            priority: chain.len() as u32,
        });
    }
}
