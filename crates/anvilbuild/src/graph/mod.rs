// anvil: The target-graph build runner.
// Copyright (C) 2024 International Digital Economy Academy
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
//
// For inquiries, you can contact us via e-mail at jichuruanjian@idea.edu.cn.

//! The target graph: every target known to one project, its own and the
//! imported ones.
//!
//! Structural problems that can be seen from a single declaration (blank
//! names, a name declared twice in the same file) are rejected as soon as
//! the target is added. Problems that need the whole graph (missing
//! dependencies, cycles) are left to [`crate::sequence`], because a
//! dependency may well be supplied by a unit that is merged later.

mod merge;
mod model;

use indexmap::{IndexMap, IndexSet};
use log::{debug, warn};
use petgraph::{
    algo::has_path_connecting,
    dot::Dot,
    graph::DiGraph,
    prelude::DiGraphMap,
};
use slotmap::SlotMap;

use crate::model::{Origin, Target, TargetDecl, TargetId, UnitId};

pub use model::{AddOutcome, GraphError, InvalidNameReason, MergeOptions, MergeOutcome};

#[derive(Debug, Clone)]
pub struct TargetGraph {
    /// The unit this graph was declared in.
    unit: UnitId,
    targets: SlotMap<TargetId, Target>,
    /// Name index, in declaration order.
    by_name: IndexMap<String, TargetId>,
    /// Every unit whose targets are part of this graph, including `unit`.
    units: IndexSet<UnitId>,
}

impl TargetGraph {
    pub fn new(unit: UnitId) -> Self {
        let mut units = IndexSet::new();
        units.insert(unit.clone());
        Self {
            unit,
            targets: SlotMap::with_key(),
            by_name: IndexMap::new(),
            units,
        }
    }

    pub fn unit(&self) -> &UnitId {
        &self.unit
    }

    pub fn contains_unit(&self, unit: &UnitId) -> bool {
        self.units.contains(unit)
    }

    pub fn units(&self) -> impl Iterator<Item = &UnitId> {
        self.units.iter()
    }

    /// Declare a target that belongs to this graph's own unit.
    pub fn add_local(&mut self, decl: TargetDecl) -> Result<TargetId, GraphError> {
        let origin = Origin::local(self.unit.clone());
        self.add_target(decl, origin).map(AddOutcome::id)
    }

    /// Add a target declared in `origin`.
    ///
    /// - A blank name, or a blank dependency name, is rejected.
    /// - Declaring the same name twice within one unit is an error.
    /// - A local definition overrides an imported one, with a warning.
    /// - Otherwise the definition already present wins and the new one is
    ///   dropped.
    pub fn add_target(&mut self, decl: TargetDecl, origin: Origin) -> Result<AddOutcome, GraphError> {
        check_decl_names(&decl.name, &decl.depends)?;
        self.units.insert(origin.unit.clone());

        let Some(&id) = self.by_name.get(&decl.name) else {
            debug!("Adding target `{}` from {}", decl.name, origin.unit);
            let name = decl.name.clone();
            let id = self.targets.insert(Target::from_decl(decl, origin));
            self.by_name.insert(name, id);
            return Ok(AddOutcome::Added(id));
        };

        let existing = &self.targets[id];
        if existing.origin.unit == origin.unit {
            return Err(GraphError::DuplicateTarget {
                name: decl.name,
                unit: origin.unit,
            });
        }

        if existing.origin.imported && !origin.imported {
            warn!(
                "Target `{}` from {} overrides the one imported from {}",
                decl.name, origin.unit, existing.origin.unit
            );
            self.targets[id] = Target::from_decl(decl, origin);
            Ok(AddOutcome::Replaced(id))
        } else {
            debug!(
                "Target `{}` already defined in {}, ignoring the definition from {}",
                decl.name, existing.origin.unit, origin.unit
            );
            Ok(AddOutcome::Ignored(id))
        }
    }

    /// Check that no target or dependency reference in the graph is blank.
    pub fn validate_names_non_empty(&self) -> Result<(), GraphError> {
        for target in self.targets() {
            check_decl_names(&target.name, &target.depends)?;
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    pub fn id_of(&self, name: &str) -> Option<TargetId> {
        self.by_name.get(name).copied()
    }

    pub fn get(&self, name: &str) -> Option<&Target> {
        self.id_of(name).map(|id| &self.targets[id])
    }

    pub fn target(&self, id: TargetId) -> &Target {
        &self.targets[id]
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// Target names in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.by_name.keys().map(String::as_str)
    }

    /// Targets in declaration order.
    pub fn targets(&self) -> impl Iterator<Item = &Target> {
        self.by_name.values().map(|&id| &self.targets[id])
    }

    /// Whether `target` depends on `dependency`, directly or transitively,
    /// through static dependency edges. A target never depends on itself
    /// for the purpose of this query.
    pub fn depends_on(&self, target: &str, dependency: &str) -> bool {
        let (Some(from), Some(to)) = (self.id_of(target), self.id_of(dependency)) else {
            return false;
        };
        if from == to {
            return false;
        }
        has_path_connecting(&self.dependency_graph(), from, to, None)
    }

    fn dependency_graph(&self) -> DiGraphMap<TargetId, ()> {
        let mut g = DiGraphMap::new();
        for (name, &id) in &self.by_name {
            g.add_node(id);
            for dep in self.targets[id].depends() {
                match self.id_of(dep) {
                    Some(dep_id) => {
                        g.add_edge(id, dep_id, ());
                    }
                    None => debug!("`{}` depends on unknown target `{}`", name, dep),
                }
            }
        }
        g
    }

    /// Render the graph in graphviz format. Edges point from a target to its
    /// dependencies and are labelled with their declared position.
    pub fn to_dot(&self) -> String {
        let mut g: DiGraph<&str, usize> = DiGraph::new();
        let nodes: IndexMap<&str, _> = self
            .names()
            .map(|name| (name, g.add_node(name)))
            .collect();
        for target in self.targets() {
            for (i, dep) in target.depends().iter().enumerate() {
                if let (Some(&from), Some(&to)) = (nodes.get(target.name()), nodes.get(dep.as_str())) {
                    g.add_edge(from, to, i);
                }
            }
        }
        format!("{}", Dot::new(&g))
    }
}

fn check_decl_names(name: &str, depends: &[String]) -> Result<(), GraphError> {
    if name.trim().is_empty() {
        return Err(GraphError::InvalidTargetName {
            target: name.to_owned(),
            reason: InvalidNameReason::EmptyName,
        });
    }
    if depends.iter().any(|d| d.trim().is_empty()) {
        return Err(GraphError::InvalidTargetName {
            target: name.to_owned(),
            reason: InvalidNameReason::EmptyDependency,
        });
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use expect_test::expect;
    use test_log::test;

    use super::*;

    fn unit(name: &str) -> UnitId {
        UnitId::new(name)
    }

    #[test]
    fn test_blank_target_name_rejected() {
        let mut g = TargetGraph::new(unit("main"));
        let err = g.add_local(TargetDecl::new("")).unwrap_err();
        assert!(matches!(
            err,
            GraphError::InvalidTargetName {
                reason: InvalidNameReason::EmptyName,
                ..
            }
        ));
        let err = g.add_local(TargetDecl::new("  ")).unwrap_err();
        expect!["Target name must not be empty"].assert_eq(&err.to_string());
        assert!(g.is_empty());
    }

    #[test]
    fn test_blank_dependency_rejected() {
        let mut g = TargetGraph::new(unit("main"));
        let err = g
            .add_local(TargetDecl::new("compile").depends(["init", ""]))
            .unwrap_err();
        expect!["Syntax error: the dependency list of target `compile` contains an empty name"]
            .assert_eq(&err.to_string());
    }

    #[test]
    fn test_undefined_dependency_allowed_at_declaration() {
        let mut g = TargetGraph::new(unit("main"));
        g.add_local(TargetDecl::new("compile").depends(["not-yet"]))
            .unwrap();
        assert!(g.contains("compile"));
        assert!(g.validate_names_non_empty().is_ok());
    }

    #[test]
    fn test_duplicate_in_same_unit() {
        let mut g = TargetGraph::new(unit("main"));
        g.add_local(TargetDecl::new("a")).unwrap();
        let err = g.add_local(TargetDecl::new("a")).unwrap_err();
        expect!["Duplicate target `a` in main"].assert_eq(&err.to_string());
    }

    #[test]
    fn test_local_overrides_imported() {
        let mut g = TargetGraph::new(unit("main"));
        let imported = g
            .add_target(
                TargetDecl::new("build").description("imported"),
                Origin::imported(unit("lib")),
            )
            .unwrap();
        assert!(matches!(imported, AddOutcome::Added(_)));

        let local = g
            .add_local(TargetDecl::new("build").description("local"))
            .unwrap();
        assert_eq!(local, imported.id());
        assert_eq!(g.get("build").unwrap().description(), Some("local"));
        assert!(!g.get("build").unwrap().origin().imported);
        assert_eq!(g.len(), 1);
    }

    #[test]
    fn test_imported_does_not_override() {
        let mut g = TargetGraph::new(unit("main"));
        g.add_local(TargetDecl::new("build").description("local"))
            .unwrap();
        let outcome = g
            .add_target(
                TargetDecl::new("build").description("imported"),
                Origin::imported(unit("lib")),
            )
            .unwrap();
        assert!(matches!(outcome, AddOutcome::Ignored(_)));
        assert_eq!(g.get("build").unwrap().description(), Some("local"));

        // the first import wins over a later one
        g.add_target(TargetDecl::new("dist"), Origin::imported(unit("a")))
            .unwrap();
        let outcome = g
            .add_target(TargetDecl::new("dist"), Origin::imported(unit("b")))
            .unwrap();
        assert!(matches!(outcome, AddOutcome::Ignored(_)));
        assert_eq!(g.get("dist").unwrap().origin().unit, unit("a"));
    }

    #[test]
    fn test_depends_on_is_transitive() {
        let mut g = TargetGraph::new(unit("main"));
        g.add_local(TargetDecl::new("a")).unwrap();
        g.add_local(TargetDecl::new("b").depends(["a"])).unwrap();
        g.add_local(TargetDecl::new("c").depends(["b", "missing"]))
            .unwrap();
        assert!(g.depends_on("c", "a"));
        assert!(g.depends_on("b", "a"));
        assert!(!g.depends_on("a", "c"));
        assert!(!g.depends_on("a", "a"));
        assert!(!g.depends_on("c", "missing"));
    }

    #[test]
    fn test_names_keep_declaration_order() {
        let mut g = TargetGraph::new(unit("main"));
        for name in ["zeta", "alpha", "mid"] {
            g.add_local(TargetDecl::new(name)).unwrap();
        }
        expect![[r#"["zeta", "alpha", "mid"]"#]]
            .assert_eq(&format!("{:?}", g.names().collect::<Vec<_>>()));
    }

    #[test]
    fn test_to_dot_mentions_edges() {
        let mut g = TargetGraph::new(unit("main"));
        g.add_local(TargetDecl::new("a")).unwrap();
        g.add_local(TargetDecl::new("c")).unwrap();
        g.add_local(TargetDecl::new("b").depends(["a", "c"])).unwrap();
        let dot = g.to_dot();
        assert!(dot.starts_with("digraph"));
        assert!(dot.contains("2 -> 0 [ label = \"0\" ]"));
        assert!(dot.contains("2 -> 1 [ label = \"1\" ]"));
    }
}
