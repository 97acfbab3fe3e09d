//! Genotype space: the graph the walker moves on.
//!
//! Nodes are genotypes indexed `0..len()`, each carrying an opaque
//! sequence label and the non-empty, ordered list of phenotypes it
//! expresses. Undirected edges are single point mutations.
//!
//! # Example
//!
//! ```rust
//! use qwalk_sim::genotype::{Genotype, GenotypeSpace};
//!
//! let mut space = GenotypeSpace::new("toy");
//! let a = space.add_genotype(Genotype::new("AA", ["p"])).unwrap();
//! let b = space.add_genotype(Genotype::new("AB", ["q"])).unwrap();
//! space.add_mutation(a, b).unwrap();
//! assert_eq!(space.len(), 2);
//! assert_eq!(space.degree(a).unwrap(), 1);
//! ```

use std::collections::BTreeSet;

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use crate::error::{SimError, SimResult};

/// A single genotype.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genotype {
    /// Opaque sequence label.
    pub sequence: String,
    /// Phenotypes expressed, primary first.
    #[serde(alias = "phenotypeName")]
    pub phenotypes: Vec<String>,
}

impl Genotype {
    /// Create a genotype from a sequence and its phenotypes.
    pub fn new<S: Into<String>>(
        sequence: impl Into<String>,
        phenotypes: impl IntoIterator<Item = S>,
    ) -> Self {
        Self {
            sequence: sequence.into(),
            phenotypes: phenotypes.into_iter().map(Into::into).collect(),
        }
    }

    /// The first listed phenotype.
    pub fn primary_phenotype(&self) -> Option<&str> {
        self.phenotypes.first().map(String::as_str)
    }
}

/// On-disk JSON layout of a genotype space.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenotypeSpaceFile {
    /// Space name; scopes persisted documents.
    pub name: String,
    /// Genotypes in index order.
    pub nodes: Vec<Genotype>,
    /// Mutation edges as `[u, v]` index pairs.
    #[serde(default)]
    pub edges: Vec<(usize, usize)>,
}

/// An immutable-after-construction genotype graph.
#[derive(Debug, Clone)]
pub struct GenotypeSpace {
    name: String,
    graph: UnGraph<Genotype, ()>,
}

impl GenotypeSpace {
    /// Create an empty space.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            graph: UnGraph::default(),
        }
    }

    /// Build a space from a node list and an edge list.
    pub fn from_parts(
        name: impl Into<String>,
        nodes: impl IntoIterator<Item = Genotype>,
        edges: impl IntoIterator<Item = (usize, usize)>,
    ) -> SimResult<Self> {
        let mut space = Self::new(name);
        for genotype in nodes {
            space.add_genotype(genotype)?;
        }
        for (a, b) in edges {
            space.add_mutation(a, b)?;
        }
        Ok(space)
    }

    /// Parse the JSON layout described by [`GenotypeSpaceFile`].
    pub fn from_json_str(json: &str) -> SimResult<Self> {
        let file: GenotypeSpaceFile = serde_json::from_str(json)
            .map_err(|e| SimError::InvalidGenotypeSpace(e.to_string()))?;
        Self::from_parts(file.name, file.nodes, file.edges)
    }

    /// Export to the JSON layout.
    pub fn to_file(&self) -> GenotypeSpaceFile {
        GenotypeSpaceFile {
            name: self.name.clone(),
            nodes: self.graph.node_weights().cloned().collect(),
            edges: self.edges().collect(),
        }
    }

    /// Add a genotype and return its index.
    pub fn add_genotype(&mut self, genotype: Genotype) -> SimResult<usize> {
        if genotype.phenotypes.is_empty() {
            return Err(SimError::InvalidGenotypeSpace(format!(
                "genotype {} ('{}') expresses no phenotype",
                self.graph.node_count(),
                genotype.sequence
            )));
        }
        Ok(self.graph.add_node(genotype).index())
    }

    /// Connect two genotypes by a mutation.
    ///
    /// Repeated edges (in either direction) collapse to one.
    pub fn add_mutation(&mut self, a: usize, b: usize) -> SimResult<()> {
        let na = self.node(a)?;
        let nb = self.node(b)?;
        if a == b {
            return Err(SimError::InvalidGenotypeSpace(format!(
                "self-mutation on genotype {a}"
            )));
        }
        self.graph.update_edge(na, nb, ());
        Ok(())
    }

    /// Space name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of genotypes.
    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    /// True if the space has no genotypes.
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    /// Number of mutation edges.
    pub fn num_mutations(&self) -> usize {
        self.graph.edge_count()
    }

    /// The genotype at `index`.
    pub fn genotype(&self, index: usize) -> SimResult<&Genotype> {
        let node = self.node(index)?;
        self.graph
            .node_weight(node)
            .ok_or(SimError::GenotypeOutOfRange {
                index,
                size: self.len(),
            })
    }

    /// Phenotypes expressed by the genotype at `index`.
    pub fn phenotypes_of(&self, index: usize) -> SimResult<&[String]> {
        Ok(&self.genotype(index)?.phenotypes)
    }

    /// Indices one mutation away from `index`.
    pub fn neighbors(&self, index: usize) -> SimResult<Vec<usize>> {
        let node = self.node(index)?;
        let mut out: Vec<usize> = self.graph.neighbors(node).map(|n| n.index()).collect();
        out.sort_unstable();
        Ok(out)
    }

    /// Number of neighbours of `index`.
    pub fn degree(&self, index: usize) -> SimResult<usize> {
        let node = self.node(index)?;
        Ok(self.graph.edges(node).count())
    }

    /// All edges as `(u, v)` with `u < v`.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.graph.edge_references().map(|e| {
            let (a, b) = (e.source().index(), e.target().index());
            (a.min(b), a.max(b))
        })
    }

    /// Every phenotype expressed anywhere in the space, sorted.
    pub fn phenotype_names(&self) -> Vec<String> {
        self.graph
            .node_weights()
            .flat_map(|g| g.phenotypes.iter().cloned())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    fn node(&self, index: usize) -> SimResult<NodeIndex> {
        if index < self.graph.node_count() {
            Ok(NodeIndex::new(index))
        } else {
            Err(SimError::GenotypeOutOfRange {
                index,
                size: self.graph.node_count(),
            })
        }
    }
}
