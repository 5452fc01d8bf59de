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

use std::{
    fmt,
    path::{Path, PathBuf},
};

use anvilutil::scope::Scope;

use super::BuildListener;
use crate::{load::ProjectLoader, model::Target, project::Project};

/// One unit of work inside a target.
///
/// Work items see the run only through the [`TaskContext`] they are handed:
/// the property and reference scope, the listener, and enough of the
/// surroundings to start a nested invocation.
pub trait WorkItem: fmt::Debug {
    /// Short name used in messages, like `echo`.
    fn kind(&self) -> &str;

    fn execute(&self, cx: &mut TaskContext<'_>) -> anyhow::Result<()>;
}

pub struct TaskContext<'a> {
    pub(crate) project: &'a Project,
    pub(crate) target: &'a Target,
    pub(crate) task: &'a str,
    pub(crate) scope: &'a mut Scope,
    pub(crate) listener: &'a mut dyn BuildListener,
    pub(crate) loader: &'a ProjectLoader,
    pub(crate) basedir: &'a Path,
    pub(crate) keep_going: bool,
    /// Number of nested invocations between the top-level run and here.
    pub(crate) depth: usize,
    pub(crate) max_depth: usize,
}

impl TaskContext<'_> {
    pub fn project(&self) -> &Project {
        self.project
    }

    pub fn target(&self) -> &Target {
        self.target
    }

    pub fn scope(&self) -> &Scope {
        self.scope
    }

    pub fn scope_mut(&mut self) -> &mut Scope {
        self.scope
    }

    pub fn basedir(&self) -> &Path {
        self.basedir
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Expand property references in `value` against the current scope.
    pub fn expand(&self, value: &str) -> anyhow::Result<String> {
        Ok(self.scope.expand(value)?)
    }

    /// Resolve a path relative to the base directory of the running target.
    pub fn resolve_path(&self, path: impl AsRef<Path>) -> PathBuf {
        self.basedir.join(path)
    }

    /// Report a message through the listener, tagged with this task.
    pub fn log(&mut self, message: &str) {
        self.listener.message(self.target, self.task, message);
    }
}
