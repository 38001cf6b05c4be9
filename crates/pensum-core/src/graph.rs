//! Prerequisite graph queries over petgraph::DiGraphMap

use crate::model::{Course, CourseId};
use petgraph::algo::{has_path_connecting, is_cyclic_directed};
use petgraph::graphmap::DiGraphMap;
use std::collections::BTreeSet;

/// Read-only reachability snapshot of the prerequisite relation.
///
/// An edge `a -> b` means "b must be completed before a". The snapshot is
/// rebuilt from the store for each query; at catalog scale that is cheaper
/// than keeping a second mutable copy of the edge sets in sync.
pub struct PrereqGraph {
    inner: DiGraphMap<CourseId, ()>,
}

impl std::fmt::Debug for PrereqGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrereqGraph")
            .field("course_count", &self.inner.node_count())
            .field("edge_count", &self.inner.edge_count())
            .finish()
    }
}

impl PrereqGraph {
    /// Build the snapshot from the current course rows.
    pub fn from_courses<'a, I>(courses: I) -> Self
    where
        I: IntoIterator<Item = &'a Course>,
    {
        let mut inner = DiGraphMap::new();
        for course in courses {
            inner.add_node(course.id);
            for prereq in &course.prerequisites {
                inner.add_edge(course.id, *prereq, ());
            }
        }
        PrereqGraph { inner }
    }

    /// Would adding `candidate` as a prerequisite of `course` close a cycle?
    ///
    /// Self-reference is a cycle immediately. Otherwise the edge is illegal
    /// exactly when `course` is already reachable from `candidate` along
    /// prerequisite edges: `course` would then depend on something that
    /// depends on `course`. The traversal covers every edge reachable from
    /// the candidate, visiting each node at most once.
    pub fn would_create_cycle(&self, course: CourseId, candidate: CourseId) -> bool {
        if course == candidate {
            return true;
        }
        has_path_connecting(&self.inner, candidate, course, None)
    }

    /// Global acyclicity check over the whole snapshot.
    pub fn is_acyclic(&self) -> bool {
        !is_cyclic_directed(&self.inner)
    }

    /// Every course reachable from `course` along prerequisite edges,
    /// excluding `course` itself.
    pub fn transitive_prerequisites(&self, course: CourseId) -> BTreeSet<CourseId> {
        let mut reached = BTreeSet::new();
        if !self.inner.contains_node(course) {
            return reached;
        }
        let mut to_visit = vec![course];
        while let Some(current) = to_visit.pop() {
            for next in self.inner.neighbors(current) {
                if next != course && reached.insert(next) {
                    to_visit.push(next);
                }
            }
        }
        reached
    }

    pub fn course_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }
}
