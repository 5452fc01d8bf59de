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

use std::path::PathBuf;

use indexmap::IndexMap;

use crate::{graph::TargetGraph, model::UnitId};

/// A loaded project: its target graph plus the settings that apply to a run
/// of it.
#[derive(Debug, Clone)]
pub struct Project {
    pub name: Option<String>,
    /// The project file, absent for projects assembled in memory.
    pub file: Option<PathBuf>,
    /// Directory that relative paths of the project resolve against.
    pub basedir: PathBuf,
    pub default_target: Option<String>,
    pub description: Option<String>,
    pub graph: TargetGraph,
    /// Project-level properties, set in order before any target runs.
    pub properties: IndexMap<String, String>,
}

impl Project {
    pub fn new(graph: TargetGraph, basedir: impl Into<PathBuf>) -> Self {
        Self {
            name: None,
            file: None,
            basedir: basedir.into(),
            default_target: None,
            description: None,
            graph,
            properties: IndexMap::new(),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_default_target(mut self, target: impl Into<String>) -> Self {
        self.default_target = Some(target.into());
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    /// The declaring unit of the project's own targets.
    pub fn unit(&self) -> &UnitId {
        self.graph.unit()
    }

    /// A name for messages: the project name if any, the unit otherwise.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.unit().as_str())
    }

    /// Whether both projects were read from the same project file.
    pub fn is_same_unit(&self, other: &Project) -> bool {
        self.unit() == other.unit()
    }
}
