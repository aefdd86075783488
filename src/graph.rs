//! The algorithm graph: registration-ordered dataflow scheduling.
//!
//! Algorithms are registered against (family, property-name) nodes with a
//! direction tag; the graph tracks, per node, which algorithms consume and
//! which produce it, and executes a round strictly in registration order —
//! there is no topological reordering, callers register producers before
//! their consumers. Completing a round yields the [`MeshUpdated`] token that
//! unlocks every [`crate::ids::future::FutureItemRange`] filled during it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::family::{Family, FamilyId};
use crate::ids::future::MeshUpdated;
use crate::mesh_error::MeshPropsError;

/// Declaration of a property an algorithm reads.
#[derive(Clone, Debug)]
pub struct InProperty {
    family: Family,
    name: String,
}

impl InProperty {
    /// Declare `name` on `family` as consumed.
    pub fn new(family: &Family, name: impl Into<String>) -> Self {
        Self {
            family: family.clone(),
            name: name.into(),
        }
    }
}

/// Declaration of a property an algorithm produces.
#[derive(Clone, Debug)]
pub struct OutProperty {
    family: Family,
    name: String,
}

impl OutProperty {
    /// Declare `name` on `family` as produced.
    pub fn new(family: &Family, name: impl Into<String>) -> Self {
        Self {
            family: family.clone(),
            name: name.into(),
        }
    }
}

type AlgorithmBody = Rc<RefCell<dyn FnMut() -> Result<(), MeshPropsError>>>;

#[derive(Clone)]
struct AlgorithmEntry {
    id: usize,
    body: AlgorithmBody,
}

/// Node identity: family identity plus property name. The In/Out direction
/// of a declaration selects which of the node's two lists the algorithm
/// joins.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct NodeKey {
    family: FamilyId,
    property: String,
}

#[derive(Clone, Debug, Default)]
struct NodeAlgorithms {
    producers: Vec<usize>,
    consumers: Vec<usize>,
}

/// Registration-ordered scheduler over property nodes.
///
/// Cloning a graph duplicates the registration bookkeeping only: the clone
/// owns an independent algorithm list (clearing one leaves the other
/// runnable) while the callables and the families/properties they captured
/// stay shared — running the clone's algorithms mutates the same underlying
/// storage as the original would.
#[derive(Clone, Default)]
pub struct AlgorithmGraph {
    name: String,
    algorithms: Vec<AlgorithmEntry>,
    nodes: HashMap<NodeKey, NodeAlgorithms>,
    next_algorithm_id: usize,
}

impl AlgorithmGraph {
    /// Create an empty graph.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Graph name.
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Register an algorithm against its declared input and output nodes.
    ///
    /// The callable carries the property handles it resolved at registration
    /// time; the graph never inspects them. Returns the algorithm's id within
    /// this graph.
    pub fn add_algorithm<F>(
        &mut self,
        inputs: impl IntoIterator<Item = InProperty>,
        outputs: impl IntoIterator<Item = OutProperty>,
        body: F,
    ) -> usize
    where
        F: FnMut() -> Result<(), MeshPropsError> + 'static,
    {
        let id = self.next_algorithm_id;
        self.next_algorithm_id += 1;
        for input in inputs {
            log::trace!(
                "graph `{}`: algorithm {id} consumes `{}`/`{}`",
                self.name,
                input.family.name(),
                input.name
            );
            self.node_entry(&input.family, input.name).consumers.push(id);
        }
        for output in outputs {
            log::trace!(
                "graph `{}`: algorithm {id} produces `{}`/`{}`",
                self.name,
                output.family.name(),
                output.name
            );
            self.node_entry(&output.family, output.name).producers.push(id);
        }
        self.algorithms.push(AlgorithmEntry {
            id,
            body: Rc::new(RefCell::new(body)),
        });
        id
    }

    /// Run every registered algorithm once, in registration order, then
    /// clear the registration list.
    ///
    /// A second call performs no work until new algorithms are registered.
    /// The node map is retained for inspection, with no algorithms attached.
    ///
    /// # Errors
    /// The first algorithm error aborts the remaining sequence; the
    /// registration list is left as-is (no rollback).
    pub fn apply_algorithms(&mut self) -> Result<MeshUpdated, MeshPropsError> {
        self.run_registered()?;
        self.algorithms.clear();
        Ok(MeshUpdated(()))
    }

    /// Run every registered algorithm once without clearing, so the same
    /// round can be re-run or extended before a later
    /// [`apply_algorithms`](Self::apply_algorithms).
    pub fn apply_and_keep_algorithms(&mut self) -> Result<MeshUpdated, MeshPropsError> {
        self.run_registered()?;
        Ok(MeshUpdated(()))
    }

    /// Number of currently registered algorithms.
    #[inline]
    pub fn nb_algorithms(&self) -> usize {
        self.algorithms.len()
    }

    /// How many registered algorithms consume `property` of `family`.
    ///
    /// An algorithm declaring the node twice counts twice.
    pub fn nb_consuming_algorithms(&self, family: &Family, property: &str) -> usize {
        self.node(family, property)
            .map_or(0, |node| node.consumers.len())
    }

    /// How many registered algorithms produce `property` of `family`.
    pub fn nb_producing_algorithms(&self, family: &Family, property: &str) -> usize {
        self.node(family, property)
            .map_or(0, |node| node.producers.len())
    }

    fn node(&self, family: &Family, property: &str) -> Option<&NodeAlgorithms> {
        self.nodes.get(&NodeKey {
            family: family.id(),
            property: property.to_owned(),
        })
    }

    fn node_entry(&mut self, family: &Family, property: String) -> &mut NodeAlgorithms {
        self.nodes
            .entry(NodeKey {
                family: family.id(),
                property,
            })
            .or_default()
    }

    fn run_registered(&mut self) -> Result<(), MeshPropsError> {
        let count = self.algorithms.len();
        log::debug!("graph `{}`: applying {count} algorithms", self.name);
        for (position, entry) in self.algorithms.iter().enumerate() {
            log::debug!(
                "graph `{}`: running algorithm {} ({}/{count})",
                self.name,
                entry.id,
                position + 1
            );
            (&mut *entry.body.borrow_mut())()?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for AlgorithmGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlgorithmGraph")
            .field("name", &self.name)
            .field("nb_algorithms", &self.algorithms.len())
            .field("nb_nodes", &self.nodes.len())
            .finish()
    }
}
