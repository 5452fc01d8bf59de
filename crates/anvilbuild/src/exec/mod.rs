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

//! Running an execution plan.
//!
//! The executor plans the invocation first, so that an undefined target or a
//! cycle aborts the run before any work item has run. Guards are evaluated
//! per target right before it would run, against the scope as earlier
//! targets left it.

pub(crate) mod guard;
pub mod invoke;
mod listener;
mod model;
mod work;

use std::path::{Path, PathBuf};

use anvilutil::{
    common::{PROPERTY_BASEDIR, PROPERTY_FILE, PROPERTY_INVOKED_TARGETS, PROPERTY_PROJECT_NAME},
    scope::Scope,
};
use indexmap::IndexSet;
use log::{debug, info};

use crate::{load::ProjectLoader, model::TargetId, project::Project, sequence::Sequencer};

pub use listener::{BuildListener, ConsoleListener, Event, RecordingListener};
pub use model::{BuildError, RecursionKind, RunReport, SkipReason};
pub use work::{TaskContext, WorkItem};

/// How deep nested invocations may go before the run is aborted.
pub const DEFAULT_MAX_DEPTH: usize = 64;

pub struct Executor<'a> {
    project: &'a Project,
    listener: &'a mut dyn BuildListener,
    loader: Option<&'a ProjectLoader>,
    basedir: Option<PathBuf>,
    keep_going: bool,
    depth: usize,
    max_depth: usize,
}

impl<'a> Executor<'a> {
    pub fn new(project: &'a Project, listener: &'a mut dyn BuildListener) -> Self {
        Self {
            project,
            listener,
            loader: None,
            basedir: None,
            keep_going: false,
            depth: 0,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Keep running targets that do not depend on a failed one.
    pub fn keep_going(mut self, keep_going: bool) -> Self {
        self.keep_going = keep_going;
        self
    }

    /// Run in `basedir` instead of the project's own base directory.
    pub fn basedir(mut self, basedir: impl Into<PathBuf>) -> Self {
        self.basedir = Some(basedir.into());
        self
    }

    /// Load nested projects through `loader`, sharing its cache.
    pub fn loader(mut self, loader: &'a ProjectLoader) -> Self {
        self.loader = Some(loader);
        self
    }

    /// Abort nested invocations that go deeper than `max_depth`.
    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub(crate) fn depth(mut self, depth: usize) -> Self {
        self.depth = depth;
        self
    }

    /// Run `invocation` against `scope`. An empty invocation runs the
    /// project's default target.
    pub fn run<S: AsRef<str>>(
        mut self,
        scope: &mut Scope,
        invocation: &[S],
    ) -> Result<RunReport, BuildError> {
        let project = self.project;
        if self.depth == 0 {
            self.listener.build_started(project);
        } else {
            self.listener.subbuild_started(project);
        }

        let result = self.run_inner(scope, invocation);

        let error = result.as_ref().err();
        if self.depth == 0 {
            self.listener.build_finished(project, error);
        } else {
            self.listener.subbuild_finished(project, error);
        }
        result
    }

    fn run_inner<S: AsRef<str>>(
        &mut self,
        scope: &mut Scope,
        invocation: &[S],
    ) -> Result<RunReport, BuildError> {
        let project = self.project;
        let targets: Vec<String> = if invocation.is_empty() {
            match &project.default_target {
                Some(default) => vec![default.clone()],
                None => {
                    return Err(BuildError::NoTarget {
                        project: project.display_name().to_owned(),
                    });
                }
            }
        } else {
            invocation.iter().map(|s| s.as_ref().to_owned()).collect()
        };

        let basedir = self
            .basedir
            .clone()
            .unwrap_or_else(|| project.basedir.clone());
        prime_scope(project, scope, &basedir, &targets)?;

        let plan = Sequencer::new(&project.graph).plan(targets.as_slice())?;
        info!(
            "Running {} in {}: {}",
            project.display_name(),
            basedir.display(),
            plan.names().collect::<Vec<_>>().join(", ")
        );

        let fallback_loader;
        let loader = match self.loader {
            Some(loader) => loader,
            None => {
                fallback_loader = ProjectLoader::new();
                &fallback_loader
            }
        };

        let mut report = RunReport::default();
        let mut failed: IndexSet<TargetId> = IndexSet::new();

        for &id in plan.targets() {
            let target = project.graph.target(id);

            // keep-going: a target whose dependency failed cannot run
            let failed_dep = target.depends().iter().find(|dep| {
                project
                    .graph
                    .id_of(dep)
                    .is_some_and(|dep_id| failed.contains(&dep_id))
            });
            if let Some(dep) = failed_dep {
                let reason = SkipReason::DependencyFailed(dep.clone());
                debug!("Skipping `{}`: {}", target.name(), reason);
                self.listener.target_skipped(target, &reason);
                report.skipped.push((target.name().to_owned(), reason));
                failed.insert(id);
                continue;
            }

            if let Some(reason) = guard::evaluate(target.guards(), scope)? {
                debug!("Skipping `{}`: {}", target.name(), reason);
                self.listener.target_skipped(target, &reason);
                report.skipped.push((target.name().to_owned(), reason));
                continue;
            }

            self.listener.target_started(target);
            let target_basedir = target.basedir().unwrap_or(&basedir);
            let result = self.run_work(project, id, scope, loader, target_basedir);
            self.listener.target_finished(target, result.as_ref().err());

            match result {
                Ok(()) => report.executed.push(target.name().to_owned()),
                Err(e) if self.keep_going => {
                    info!("Target `{}` failed, continuing: {:?}", target.name(), e);
                    failed.insert(id);
                }
                Err(e) => return Err(e),
            }
        }

        if failed.is_empty() {
            Ok(report)
        } else {
            // Only the targets that failed on their own, not the skipped dependents
            let skipped: IndexSet<&str> = report
                .skipped
                .iter()
                .map(|(name, _)| name.as_str())
                .collect();
            let failed = failed
                .iter()
                .map(|&id| project.graph.target(id).name())
                .filter(|name| !skipped.contains(name))
                .map(str::to_owned)
                .collect();
            Err(BuildError::KeepGoing { failed })
        }
    }

    fn run_work(
        &mut self,
        project: &Project,
        id: TargetId,
        scope: &mut Scope,
        loader: &ProjectLoader,
        basedir: &Path,
    ) -> Result<(), BuildError> {
        let target = project.graph.target(id);
        for item in target.work() {
            let mut cx = TaskContext {
                project,
                target,
                task: item.kind(),
                scope: &mut *scope,
                listener: &mut *self.listener,
                loader,
                basedir,
                keep_going: self.keep_going,
                depth: self.depth,
                max_depth: self.max_depth,
            };
            item.execute(&mut cx)
                .map_err(|source| BuildError::TaskFailed {
                    target: target.name().to_owned(),
                    task: item.kind().to_owned(),
                    source,
                })?;
        }
        Ok(())
    }
}

/// Set the properties every run starts with: the built-in ones first, then
/// the project's own, each expanded against what is set so far.
fn prime_scope(
    project: &Project,
    scope: &mut Scope,
    basedir: &Path,
    targets: &[String],
) -> Result<(), BuildError> {
    scope.set_property(PROPERTY_BASEDIR, basedir.display().to_string());
    if let Some(file) = &project.file {
        scope.set_property(PROPERTY_FILE, file.display().to_string());
    }
    if let Some(name) = &project.name {
        scope.set_property(PROPERTY_PROJECT_NAME, name.clone());
    }
    scope.set_property(PROPERTY_INVOKED_TARGETS, targets.join(","));

    for (name, value) in &project.properties {
        let value = scope.expand(value)?;
        scope.set_property(name.clone(), value);
    }
    Ok(())
}
