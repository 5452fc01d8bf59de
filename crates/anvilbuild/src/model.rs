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
    rc::Rc,
};

use crate::exec::WorkItem;

slotmap::new_key_type! {
    /// An unique identifier pointing to a target within one [`crate::graph::TargetGraph`].
    pub struct TargetId;
}

/// The declaring unit of a target, usually the canonical path of the project
/// file it was written in.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UnitId(String);

impl UnitId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn from_path(path: &Path) -> Self {
        Self(path.display().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Where a target definition comes from. The graph uses this to decide
/// whether a redefinition is an error, an override, or ignored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Origin {
    pub unit: UnitId,
    /// Whether the target reached the graph through an import.
    pub imported: bool,
    /// Set for targets of an import that asked for its own base directory.
    pub basedir: Option<PathBuf>,
}

impl Origin {
    pub fn local(unit: UnitId) -> Self {
        Self {
            unit,
            imported: false,
            basedir: None,
        }
    }

    pub fn imported(unit: UnitId) -> Self {
        Self {
            unit,
            imported: true,
            basedir: None,
        }
    }
}

/// The `if`/`unless` conditions of a target. They are evaluated right
/// before the target would run and only decide whether its work items
/// execute; a guarded target always keeps its place in the plan.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Guards {
    pub if_cond: Option<String>,
    pub unless_cond: Option<String>,
}

/// A target as declared, before it is placed into a graph.
#[derive(Clone, Debug, Default)]
pub struct TargetDecl {
    pub name: String,
    pub depends: Vec<String>,
    pub guards: Guards,
    pub description: Option<String>,
    pub work: Vec<Rc<dyn WorkItem>>,
}

impl TargetDecl {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn depends<I, S>(mut self, depends: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.depends.extend(depends.into_iter().map(Into::into));
        self
    }

    pub fn if_cond(mut self, cond: impl Into<String>) -> Self {
        self.guards.if_cond = Some(cond.into());
        self
    }

    pub fn unless_cond(mut self, cond: impl Into<String>) -> Self {
        self.guards.unless_cond = Some(cond.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn work(mut self, item: impl WorkItem + 'static) -> Self {
        self.work.push(Rc::new(item));
        self
    }
}

/// A named unit of work placed in a graph.
#[derive(Clone, Debug)]
pub struct Target {
    pub(crate) name: String,
    pub(crate) depends: Vec<String>,
    pub(crate) guards: Guards,
    pub(crate) description: Option<String>,
    pub(crate) work: Vec<Rc<dyn WorkItem>>,
    pub(crate) origin: Origin,
}

impl Target {
    pub(crate) fn from_decl(decl: TargetDecl, origin: Origin) -> Self {
        Self {
            name: decl.name,
            depends: decl.depends,
            guards: decl.guards,
            description: decl.description,
            work: decl.work,
            origin,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Dependency names, in declared order.
    pub fn depends(&self) -> &[String] {
        &self.depends
    }

    pub fn guards(&self) -> &Guards {
        &self.guards
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn work(&self) -> &[Rc<dyn WorkItem>] {
        &self.work
    }

    pub fn origin(&self) -> &Origin {
        &self.origin
    }

    /// The base directory this target runs in, if its import pinned one.
    pub fn basedir(&self) -> Option<&Path> {
        self.origin.basedir.as_deref()
    }
}
