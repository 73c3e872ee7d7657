//! Dependency graph used to order the classes of a model.
//!
//! Generators emit classes in model order and expect every class to come after the classes it
//! needs: its enclosing class, its bases and the classes it default-constructs by value in
//! constructor default arguments. [`ClassGraph`] records those "must come before" edges and
//! produces an order that honors them.
//!
//! # Core Components
//!
//! - [`ClassGraph`]: Directed graph over [`MetaClassRc`] nodes with cycle reporting
//! - [`sort_classes`]: Builds the graph for a class list and sorts it
//!
//! # Ordering
//!
//! Among the classes that are ready at any point, the one registered first is emitted first, so
//! unrelated classes keep their declaration order.
//!
//! # Thread Safety
//!
//! Construction and sorting are single-threaded.

use std::{
    cmp::Reverse,
    collections::{BinaryHeap, HashMap, HashSet},
    sync::Arc,
};

use crate::{
    meta::{MetaClass, MetaClassRc},
    Error::CyclicDependency,
    Result,
};

fn node_key(class: &MetaClass) -> usize {
    std::ptr::from_ref(class) as usize
}

/// A directed graph of classes. An edge `a -> b` means `a` must be emitted before `b`.
#[derive(Default)]
pub struct ClassGraph {
    /// Nodes in insertion order
    nodes: Vec<MetaClassRc>,
    /// Maps a class allocation to its node index
    index: HashMap<usize, usize>,
    /// Maps a node to the nodes that must come after it
    dependents: Vec<HashSet<usize>>,
}

impl ClassGraph {
    /// Create an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node. Adding the same class twice returns the existing index.
    pub fn add_node(&mut self, class: &MetaClassRc) -> usize {
        let key = node_key(class);
        if let Some(&index) = self.index.get(&key) {
            return index;
        }
        let index = self.nodes.len();
        self.nodes.push(class.clone());
        self.dependents.push(HashSet::new());
        self.index.insert(key, index);
        index
    }

    /// Returns true if `class` is a node.
    #[must_use]
    pub fn contains(&self, class: &MetaClass) -> bool {
        self.index.contains_key(&node_key(class))
    }

    /// Require `before` to be emitted before `after`.
    ///
    /// Edges between classes that are not nodes and self edges are ignored.
    ///
    /// # Returns
    ///
    /// True if the edge was recorded.
    pub fn add_edge(&mut self, before: &MetaClass, after: &MetaClass) -> bool {
        let (Some(&from), Some(&to)) = (
            self.index.get(&node_key(before)),
            self.index.get(&node_key(after)),
        ) else {
            return false;
        };
        if from == to {
            return false;
        }
        self.dependents[from].insert(to);
        true
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Return the nodes so that every edge points forward.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::CyclicDependency`] naming the classes of one cycle if the edges
    /// cannot all be honored.
    pub fn topological_order(&self) -> Result<Vec<MetaClassRc>> {
        let mut in_degree = vec![0usize; self.nodes.len()];
        for dependents in &self.dependents {
            for &dependent in dependents {
                in_degree[dependent] += 1;
            }
        }

        let mut ready: BinaryHeap<Reverse<usize>> = in_degree
            .iter()
            .enumerate()
            .filter(|(_, degree)| **degree == 0)
            .map(|(index, _)| Reverse(index))
            .collect();

        let mut order = Vec::with_capacity(self.nodes.len());
        while let Some(Reverse(index)) = ready.pop() {
            order.push(self.nodes[index].clone());
            for &dependent in &self.dependents[index] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    ready.push(Reverse(dependent));
                }
            }
        }

        if order.len() != self.nodes.len() {
            self.check_circular_dependencies()?;
            return Err(CyclicDependency(
                "Unable to resolve class order, possible circular dependency".to_string(),
            ));
        }
        Ok(order)
    }

    /// Fails with the first cycle found.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::CyclicDependency`] describing the cycle as `A -> B -> A`.
    pub fn check_circular_dependencies(&self) -> Result<()> {
        let mut visited = HashSet::new();
        let mut stack = Vec::new();
        for index in 0..self.nodes.len() {
            if !visited.contains(&index) {
                self.detect_cycle(index, &mut visited, &mut stack)?;
            }
        }
        Ok(())
    }

    fn detect_cycle(
        &self,
        index: usize,
        visited: &mut HashSet<usize>,
        stack: &mut Vec<usize>,
    ) -> Result<()> {
        visited.insert(index);
        stack.push(index);

        let mut dependents: Vec<usize> = self.dependents[index].iter().copied().collect();
        dependents.sort_unstable();
        for dependent in dependents {
            if let Some(position) = stack.iter().position(|&node| node == dependent) {
                let mut names: Vec<&str> = stack[position..]
                    .iter()
                    .map(|&node| self.nodes[node].qualified_name())
                    .collect();
                names.push(self.nodes[dependent].qualified_name());
                return Err(CyclicDependency(names.join(" -> ")));
            }
            if !visited.contains(&dependent) {
                self.detect_cycle(dependent, visited, stack)?;
            }
        }

        stack.pop();
        Ok(())
    }
}

/// Sort `classes` so that each class follows its enclosing class, its bases and the classes
/// whose by-value default construction its constructors rely on. Interfaces are dropped from
/// the result.
///
/// ## Arguments
/// * 'classes' - The classes to order, in registration order
///
/// # Errors
///
/// Returns [`crate::Error::CyclicDependency`] if the dependencies form a cycle.
pub fn sort_classes(classes: &[MetaClassRc]) -> Result<Vec<MetaClassRc>> {
    Ok(order_classes(classes)?
        .into_iter()
        .filter(|class| !class.is_interface())
        .collect())
}

/// Like [`sort_classes`], keeping interfaces.
pub(crate) fn order_classes(classes: &[MetaClassRc]) -> Result<Vec<MetaClassRc>> {
    let mut graph = ClassGraph::new();
    for class in classes {
        graph.add_node(class);
    }

    for class in classes {
        if let Some(enclosing) = class.enclosing_class() {
            graph.add_edge(&enclosing, class);
        }

        let bases = class
            .base_class()
            .into_iter()
            .chain(class.interfaces())
            .chain(class.template_base_class());
        for base in bases {
            graph.add_edge(&base, class);
        }

        for constructor in class.constructors() {
            for argument in &constructor.arguments {
                if argument.original_default_value.is_none() || !argument.argument_type.is_value() {
                    continue;
                }
                let entry = argument.argument_type.type_entry();
                if !entry.is_complex() || Arc::ptr_eq(entry, class.type_entry()) {
                    continue;
                }
                let Some(argument_class) = classes
                    .iter()
                    .find(|candidate| Arc::ptr_eq(candidate.type_entry(), entry))
                else {
                    continue;
                };
                if argument_class
                    .enclosing_class()
                    .is_some_and(|enclosing| Arc::ptr_eq(&enclosing, class))
                {
                    continue;
                }
                graph.add_edge(argument_class, class);
            }
        }
    }

    graph.topological_order()
}
