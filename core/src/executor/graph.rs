use std::collections::{HashMap, HashSet, VecDeque};

use crate::error::{DefinitionError, ExecutorError};

use super::types::{Target, TargetId};

/// Anything that can look targets up by identity (build definitions, tests).
pub trait TargetSource {
    fn target(&mut self, id: &TargetId) -> Result<Target, DefinitionError>;
}

impl TargetSource for HashMap<TargetId, Target> {
    fn target(&mut self, id: &TargetId) -> Result<Target, DefinitionError> {
        self.get(id)
            .cloned()
            .ok_or_else(|| DefinitionError::UnknownTarget(id.to_string()))
    }
}

/// Dependency closure of a set of requested targets.
#[derive(Debug, Clone)]
pub struct TargetGraph {
    /// Target nodes: id -> Target
    nodes: HashMap<TargetId, Target>,

    /// Requested roots, in request order
    requested: Vec<TargetId>,

    /// Discovery order (for stable iteration)
    insertion_order: Vec<TargetId>,
}

impl TargetGraph {
    /// Build a graph from already materialised targets; every target is a root.
    pub fn from_targets(targets: Vec<(TargetId, Target)>) -> Result<Self, ExecutorError> {
        let mut nodes = HashMap::new();
        let mut insertion_order = Vec::new();

        for (id, target) in targets {
            if nodes.contains_key(&id) {
                return Err(DefinitionError::DuplicateTarget {
                    path: id.path().to_path_buf(),
                    name: id.target().to_string(),
                }
                .into());
            }
            insertion_order.push(id.clone());
            nodes.insert(id, target);
        }

        Ok(Self {
            nodes,
            requested: insertion_order.clone(),
            insertion_order,
        })
    }

    /// Load the requested targets and, transitively, everything they depend on.
    pub fn resolve<S: TargetSource + ?Sized>(
        source: &mut S,
        requested: &[TargetId],
    ) -> Result<Self, ExecutorError> {
        let mut nodes = HashMap::new();
        let mut insertion_order = Vec::new();
        let mut queue: VecDeque<(TargetId, Option<TargetId>)> =
            requested.iter().map(|id| (id.clone(), None)).collect();

        while let Some((id, parent)) = queue.pop_front() {
            if nodes.contains_key(&id) {
                continue;
            }

            let target = match (source.target(&id), parent) {
                (Ok(target), _) => target,
                (Err(DefinitionError::UnknownTarget(_)), Some(parent)) => {
                    return Err(ExecutorError::DependencyNotFound {
                        target: parent.to_string(),
                        missing_dep: id.to_string(),
                    });
                }
                (Err(e), _) => return Err(e.into()),
            };

            for dep in target.dependencies() {
                if !nodes.contains_key(dep) {
                    queue.push_back((dep.clone(), Some(id.clone())));
                }
            }

            tracing::trace!(target_id = %id, deps = target.dependencies().len(), "target resolved");
            insertion_order.push(id.clone());
            nodes.insert(id, target);
        }

        let mut requested_unique = Vec::new();
        for id in requested {
            if !requested_unique.contains(id) {
                requested_unique.push(id.clone());
            }
        }

        Ok(Self {
            nodes,
            requested: requested_unique,
            insertion_order,
        })
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, id: &TargetId) -> Option<&Target> {
        self.nodes.get(id)
    }

    pub fn requested(&self) -> &[TargetId] {
        &self.requested
    }

    /// Check every dependency exists and there are no cycles.
    pub fn validate(&self) -> Result<(), ExecutorError> {
        for id in &self.insertion_order {
            for dep in self.nodes[id].dependencies() {
                if !self.nodes.contains_key(dep) {
                    return Err(ExecutorError::DependencyNotFound {
                        target: id.to_string(),
                        missing_dep: dep.to_string(),
                    });
                }
            }
        }

        if let Some(cycle) = self.detect_cycle() {
            return Err(ExecutorError::CircularDependency(cycle));
        }

        Ok(())
    }

    /// Dependency-first order: every target appears after all of its
    /// dependencies. Stable: roots in request order, dependencies in
    /// declared order.
    ///
    /// Assumes [`validate`](Self::validate) passed.
    pub fn execution_order(&self) -> Vec<TargetId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        let mut visited = HashSet::new();

        for root in &self.requested {
            self.post_order(root, &mut visited, &mut order);
        }

        order
    }

    fn post_order(
        &self,
        id: &TargetId,
        visited: &mut HashSet<TargetId>,
        order: &mut Vec<TargetId>,
    ) {
        if !visited.insert(id.clone()) {
            return;
        }
        let Some(target) = self.nodes.get(id) else {
            return;
        };
        for dep in target.dependencies() {
            self.post_order(dep, visited, order);
        }
        order.push(id.clone());
    }

    /// Detect circular dependencies using DFS
    ///
    /// # Time Complexity
    ///
    /// O(V + E) where V = number of targets, E = number of dependencies
    fn detect_cycle(&self) -> Option<String> {
        let mut visited = HashSet::new();
        let mut stack = Vec::new();

        for id in &self.insertion_order {
            if !visited.contains(id) && self.dfs_cycle(id, &mut visited, &mut stack) {
                return Some(format_cycle_path(&stack));
            }
        }

        None
    }

    fn dfs_cycle(
        &self,
        node: &TargetId,
        visited: &mut HashSet<TargetId>,
        stack: &mut Vec<TargetId>,
    ) -> bool {
        visited.insert(node.clone());
        stack.push(node.clone());

        if let Some(target) = self.nodes.get(node) {
            for dep in target.dependencies() {
                // Dependency already on the current path: cycle
                if let Some(pos) = stack.iter().position(|x| x == dep) {
                    stack.push(dep.clone());
                    *stack = stack[pos..].to_vec();
                    return true;
                }

                if !visited.contains(dep) && self.dfs_cycle(dep, visited, stack) {
                    return true;
                }
            }
        }

        stack.pop();
        false
    }
}

fn format_cycle_path(stack: &[TargetId]) -> String {
    stack
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}
