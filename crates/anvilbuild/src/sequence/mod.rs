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

//! Turning an invocation list into an execution plan.
//!
//! Each requested name is visited depth-first, dependencies in their declared
//! order, and a target is appended to the plan once all of its dependencies
//! are. A target that is already part of the plan is never visited again, so
//! shared dependencies run once and later requests reuse earlier work.
//! Guards play no role here: they are evaluated when the plan runs.

mod model;

use indexmap::IndexSet;
use log::{debug, trace};
use slotmap::SecondaryMap;

use crate::{graph::TargetGraph, model::TargetId};

pub use model::{ExecutionPlan, SequenceError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum VisitState {
    #[default]
    Unvisited,
    InProgress,
    Done,
}

pub struct Sequencer<'a> {
    graph: &'a TargetGraph,
}

impl<'a> Sequencer<'a> {
    pub fn new(graph: &'a TargetGraph) -> Self {
        Self { graph }
    }

    /// Compute the execution plan of `invocation`.
    ///
    /// Fails on the first undefined target or cycle met along the way; no
    /// partial plan is returned.
    pub fn plan<S: AsRef<str>>(&self, invocation: &[S]) -> Result<ExecutionPlan, SequenceError> {
        let requested: Vec<String> = invocation.iter().map(|s| s.as_ref().to_owned()).collect();
        debug!("Planning invocation {:?}", requested);

        let mut walk = Walk::new(self.graph);
        for name in &requested {
            walk.visit(name)?;
        }
        let names = walk
            .order
            .iter()
            .map(|&id| self.graph.target(id).name().to_owned())
            .collect();
        debug!("Planned {} targets", walk.order.len());
        Ok(ExecutionPlan {
            requested,
            order: walk.order,
            names,
        })
    }

    /// Walk every target of the graph, in declaration order, reporting the
    /// first undefined dependency or cycle anywhere in it.
    pub fn verify_whole_graph(&self) -> Result<ExecutionPlan, SequenceError> {
        let all: Vec<&str> = self.graph.names().collect();
        self.plan(all.as_slice())
    }
}

enum WorkStackItem<'s> {
    /// Resolve a name and descend into it.
    Visit {
        name: &'s str,
        referrer: Option<TargetId>,
    },
    /// All dependencies of the target are planned.
    Exit(TargetId),
}

struct Walk<'g> {
    graph: &'g TargetGraph,
    state: SecondaryMap<TargetId, VisitState>,
    /// Targets currently in progress, outermost first.
    path: IndexSet<TargetId>,
    order: Vec<TargetId>,
}

impl<'g> Walk<'g> {
    fn new(graph: &'g TargetGraph) -> Self {
        Self {
            graph,
            state: SecondaryMap::new(),
            path: IndexSet::new(),
            order: vec![],
        }
    }

    fn state(&self, id: TargetId) -> VisitState {
        self.state.get(id).copied().unwrap_or_default()
    }

    fn visit<'s>(&mut self, root: &'s str) -> Result<(), SequenceError>
    where
        'g: 's,
    {
        debug_assert!(self.path.is_empty(), "DFS starting with non-empty path");
        let mut stack = vec![WorkStackItem::Visit {
            name: root,
            referrer: None,
        }];

        while let Some(item) = stack.pop() {
            let (name, referrer) = match item {
                WorkStackItem::Exit(id) => {
                    let popped = self.path.pop();
                    debug_assert_eq!(popped, Some(id), "DFS path mismatch");
                    self.state.insert(id, VisitState::Done);
                    self.order.push(id);
                    trace!("Planned `{}`", self.graph.target(id).name());
                    continue;
                }
                WorkStackItem::Visit { name, referrer } => (name, referrer),
            };

            let Some(id) = self.graph.id_of(name) else {
                return Err(SequenceError::UndefinedTarget {
                    target: name.to_owned(),
                    referrer: referrer.map(|r| self.graph.target(r).name().to_owned()),
                });
            };

            match self.state(id) {
                VisitState::Done => continue,
                VisitState::InProgress => return Err(self.cycle_error(id)),
                VisitState::Unvisited => {}
            }

            self.state.insert(id, VisitState::InProgress);
            self.path.insert(id);
            stack.push(WorkStackItem::Exit(id));

            // Reversed, so that dependencies are popped in declared order
            let target = self.graph.target(id);
            for dep in target.depends().iter().rev() {
                stack.push(WorkStackItem::Visit {
                    name: dep.as_str(),
                    referrer: Some(id),
                });
            }
        }
        Ok(())
    }

    fn cycle_error(&self, reentered: TargetId) -> SequenceError {
        let start = self.path.get_index_of(&reentered).unwrap_or(0);
        let path = self
            .path
            .iter()
            .skip(start)
            .chain([&reentered])
            .map(|&id| self.graph.target(id).name().to_owned())
            .collect();
        SequenceError::CyclicDependency { path }
    }
}

#[cfg(test)]
mod test {
    use expect_test::expect;
    use test_log::test;

    use super::*;
    use crate::model::{TargetDecl, UnitId};

    fn graph(decls: &[(&str, &[&str])]) -> TargetGraph {
        let mut g = TargetGraph::new(UnitId::new("test"));
        for (name, deps) in decls {
            g.add_local(TargetDecl::new(*name).depends(deps.iter().copied()))
                .unwrap();
        }
        g
    }

    fn plan_names(g: &TargetGraph, invocation: &[&str]) -> Vec<String> {
        Sequencer::new(g)
            .plan(invocation)
            .unwrap()
            .names()
            .map(str::to_owned)
            .collect()
    }

    #[test]
    fn test_declared_dependency_order() {
        let g = graph(&[
            ("A", &[]),
            ("B", &["A"]),
            ("C", &["B"]),
            ("D", &["C", "B", "A"]),
        ]);
        expect![[r#"["A", "B", "C", "D"]"#]].assert_eq(&format!("{:?}", plan_names(&g, &["D"])));
    }

    #[test]
    fn test_diamond_runs_shared_dependency_once() {
        let g = graph(&[
            ("init", &[]),
            ("left", &["init"]),
            ("right", &["init"]),
            ("top", &["left", "right"]),
        ]);
        expect![[r#"["init", "left", "right", "top"]"#]]
            .assert_eq(&format!("{:?}", plan_names(&g, &["top"])));
    }

    #[test]
    fn test_multiple_requests_keep_order_and_reuse() {
        let g = graph(&[
            ("init", &[]),
            ("compile", &["init"]),
            ("test", &["compile"]),
            ("docs", &["init"]),
        ]);
        expect![[r#"["init", "docs", "compile", "test"]"#]]
            .assert_eq(&format!("{:?}", plan_names(&g, &["docs", "test"])));
        expect![[r#"["init", "compile"]"#]]
            .assert_eq(&format!("{:?}", plan_names(&g, &["compile", "init", "compile"])));

        let plan = Sequencer::new(&g).plan(&["docs", "docs"]).unwrap();
        assert_eq!(plan.requested(), ["docs", "docs"]);
        assert_eq!(plan.len(), 2);
    }

    #[test]
    fn test_self_dependency() {
        let g = graph(&[("A", &["A"])]);
        let err = Sequencer::new(&g).plan(&["A"]).unwrap_err();
        assert_eq!(
            err,
            SequenceError::CyclicDependency {
                path: vec!["A".into(), "A".into()]
            }
        );
        expect!["Circular dependency: A -> A"].assert_eq(&err.to_string());
    }

    #[test]
    fn test_mutual_recursion() {
        let g = graph(&[("A", &["B"]), ("B", &["A"])]);
        let err = Sequencer::new(&g).plan(&["A"]).unwrap_err();
        expect!["Circular dependency: A -> B -> A"].assert_eq(&err.to_string());
    }

    #[test]
    fn test_cycle_path_starts_at_reentered_target() {
        let g = graph(&[("top", &["a"]), ("a", &["b"]), ("b", &["c"]), ("c", &["a"])]);
        let err = Sequencer::new(&g).plan(&["top"]).unwrap_err();
        expect!["Circular dependency: a -> b -> c -> a"].assert_eq(&err.to_string());
    }

    #[test]
    fn test_undefined_targets() {
        let g = graph(&[("compile", &["init", "missing"]), ("init", &[])]);
        let err = Sequencer::new(&g).plan(&["compile"]).unwrap_err();
        expect!["Target `missing` does not exist in the project. It is used from target `compile`"]
            .assert_eq(&err.to_string());

        let err = Sequencer::new(&g).plan(&["nope"]).unwrap_err();
        assert_eq!(
            err,
            SequenceError::UndefinedTarget {
                target: "nope".into(),
                referrer: None
            }
        );
    }

    #[test]
    fn test_unreachable_problems_do_not_matter() {
        let g = graph(&[("ok", &[]), ("broken", &["broken"])]);
        assert_eq!(plan_names(&g, &["ok"]), ["ok"]);
        let err = Sequencer::new(&g).verify_whole_graph().unwrap_err();
        expect!["Circular dependency: broken -> broken"].assert_eq(&err.to_string());
    }

    #[test]
    fn test_guards_do_not_affect_plan() {
        let mut g = TargetGraph::new(UnitId::new("test"));
        g.add_local(TargetDecl::new("guarded").if_cond("never.set"))
            .unwrap();
        g.add_local(TargetDecl::new("main").depends(["guarded"]))
            .unwrap();
        assert_eq!(plan_names(&g, &["main"]), ["guarded", "main"]);
    }

    #[test]
    fn test_verify_whole_graph_order() {
        let g = graph(&[("b", &["a"]), ("a", &[]), ("c", &[])]);
        let plan = Sequencer::new(&g).verify_whole_graph().unwrap();
        assert_eq!(plan.names().collect::<Vec<_>>(), ["a", "b", "c"]);
    }
}
