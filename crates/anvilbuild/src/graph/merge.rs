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

//! Merging an imported graph into the importing one.

use log::{debug, info};

use super::{AddOutcome, GraphError, MergeOptions, MergeOutcome, TargetGraph};
use crate::model::{Origin, Target, TargetDecl};

impl TargetGraph {
    /// Incorporate the targets of `other` into this graph.
    ///
    /// Every merged target is tagged as imported, so local definitions of
    /// this graph override it, while it never overrides anything already
    /// present. With a prefix, each merged target is also registered as
    /// `prefix.name`. The alias keeps the dependency list untouched, so a
    /// dependency on a sibling resolves to whatever definition the plain name
    /// ends up with, including a local override. The alias stays reachable
    /// even when the plain name has been overridden.
    ///
    /// Merging a unit that is already part of this graph is a no-op, which
    /// makes diamond-shaped imports harmless.
    pub fn merge(
        &mut self,
        other: TargetGraph,
        opts: &MergeOptions,
    ) -> Result<MergeOutcome, GraphError> {
        if self.units.contains(&other.unit) {
            info!("Skipped already imported unit {}", other.unit);
            return Ok(MergeOutcome::AlreadyImported);
        }
        debug!(
            "Merging {} targets from {} (prefix: {:?})",
            other.len(),
            other.unit,
            opts.prefix
        );

        let known = self.units.clone();
        let mut targets = 0;
        let mut aliases = 0;

        for target in other.targets() {
            if known.contains(&target.origin.unit) {
                debug!(
                    "Skipping target `{}`: {} is already part of the graph",
                    target.name, target.origin.unit
                );
                continue;
            }

            let mut origin = Origin::imported(target.origin.unit.clone());
            origin.basedir = target.origin.basedir.clone();
            if opts.isolate_scope && origin.basedir.is_none() {
                origin.basedir = opts.basedir.clone();
            }

            let decl = redeclare(target);
            if !matches!(
                self.add_target(decl.clone(), origin.clone())?,
                AddOutcome::Ignored(_)
            ) {
                targets += 1;
            }

            if let Some(prefix) = &opts.prefix {
                let mut alias = decl;
                alias.name = format!("{}.{}", prefix, alias.name);
                if !matches!(self.add_target(alias, origin)?, AddOutcome::Ignored(_)) {
                    aliases += 1;
                }
            }
        }

        self.units.extend(other.units.iter().cloned());
        Ok(MergeOutcome::Merged { targets, aliases })
    }
}

fn redeclare(target: &Target) -> TargetDecl {
    TargetDecl {
        name: target.name.clone(),
        depends: target.depends.clone(),
        guards: target.guards.clone(),
        description: target.description.clone(),
        work: target.work.clone(),
    }
}

#[cfg(test)]
mod test {
    use std::path::PathBuf;

    use expect_test::expect;
    use test_log::test;

    use super::*;
    use crate::model::UnitId;

    fn lib_graph() -> TargetGraph {
        let mut lib = TargetGraph::new(UnitId::new("lib"));
        lib.add_local(TargetDecl::new("init")).unwrap();
        lib.add_local(TargetDecl::new("compile").depends(["init", "setup"]))
            .unwrap();
        lib
    }

    #[test]
    fn test_merge_plain() {
        let mut main = TargetGraph::new(UnitId::new("main"));
        main.add_local(TargetDecl::new("setup")).unwrap();
        let outcome = main.merge(lib_graph(), &MergeOptions::default()).unwrap();
        assert_eq!(
            outcome,
            MergeOutcome::Merged {
                targets: 2,
                aliases: 0
            }
        );
        expect![[r#"["setup", "init", "compile"]"#]]
            .assert_eq(&format!("{:?}", main.names().collect::<Vec<_>>()));
        assert!(main.get("compile").unwrap().origin().imported);
        assert!(main.contains_unit(&UnitId::new("lib")));
    }

    #[test]
    fn test_merge_with_prefix_keeps_dependencies() {
        let mut main = TargetGraph::new(UnitId::new("main"));
        let outcome = main
            .merge(
                lib_graph(),
                &MergeOptions {
                    prefix: Some("lib".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(
            outcome,
            MergeOutcome::Merged {
                targets: 2,
                aliases: 2
            }
        );
        assert_eq!(main.get("compile").unwrap().depends(), ["init", "setup"]);
        assert_eq!(
            main.get("lib.compile").unwrap().depends(),
            ["init", "setup"]
        );
    }

    #[test]
    fn test_override_keeps_alias_reachable() {
        let mut main = TargetGraph::new(UnitId::new("main"));
        main.merge(
            lib_graph(),
            &MergeOptions {
                prefix: Some("lib".into()),
                ..Default::default()
            },
        )
        .unwrap();
        let outcome = main
            .add_local(TargetDecl::new("compile").depends(["lib.compile"]))
            .unwrap();
        assert_eq!(Some(outcome), main.id_of("compile"));
        assert!(!main.get("compile").unwrap().origin().imported);
        assert!(main.get("lib.compile").unwrap().origin().imported);
    }

    #[test]
    fn test_overridden_hook_is_used_by_alias() {
        let mut main = TargetGraph::new(UnitId::new("main"));
        main.merge(
            lib_graph(),
            &MergeOptions {
                prefix: Some("lib".into()),
                ..Default::default()
            },
        )
        .unwrap();
        main.add_local(TargetDecl::new("init")).unwrap();
        main.add_local(TargetDecl::new("setup")).unwrap();

        let init = main.id_of("init").unwrap();
        assert!(!main.target(init).origin().imported);
        // `lib.compile` still names plain `init`, which is now the local one
        assert!(main.depends_on("lib.compile", "init"));
        assert!(!main.depends_on("lib.compile", "lib.init"));
    }

    #[test]
    fn test_reimport_is_noop() {
        let mut main = TargetGraph::new(UnitId::new("main"));
        main.merge(lib_graph(), &MergeOptions::default()).unwrap();
        let outcome = main.merge(lib_graph(), &MergeOptions::default()).unwrap();
        assert_eq!(outcome, MergeOutcome::AlreadyImported);
        assert_eq!(main.len(), 2);
    }

    #[test]
    fn test_diamond_import_through_nested_graph() {
        // main imports a and b, both of which import lib
        let mut a = TargetGraph::new(UnitId::new("a"));
        a.add_local(TargetDecl::new("a")).unwrap();
        a.merge(lib_graph(), &MergeOptions::default()).unwrap();

        let mut b = TargetGraph::new(UnitId::new("b"));
        b.add_local(TargetDecl::new("b")).unwrap();
        b.merge(lib_graph(), &MergeOptions::default()).unwrap();

        let mut main = TargetGraph::new(UnitId::new("main"));
        main.merge(a, &MergeOptions::default()).unwrap();
        let outcome = main.merge(b, &MergeOptions::default()).unwrap();
        assert_eq!(
            outcome,
            MergeOutcome::Merged {
                targets: 1,
                aliases: 0
            }
        );
        expect![[r#"["a", "init", "compile", "b"]"#]]
            .assert_eq(&format!("{:?}", main.names().collect::<Vec<_>>()));
    }

    #[test]
    fn test_isolated_merge_records_basedir() {
        let mut main = TargetGraph::new(UnitId::new("main"));
        main.merge(
            lib_graph(),
            &MergeOptions {
                isolate_scope: true,
                basedir: Some(PathBuf::from("/work/lib")),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(
            main.get("init").unwrap().basedir(),
            Some(std::path::Path::new("/work/lib"))
        );
    }
}
