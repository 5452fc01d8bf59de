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

use crate::model::{TargetId, UnitId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvalidNameReason {
    EmptyName,
    EmptyDependency,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("{}", invalid_name_message(.target, .reason))]
    InvalidTargetName {
        target: String,
        reason: InvalidNameReason,
    },

    #[error("Duplicate target `{name}` in {unit}")]
    DuplicateTarget { name: String, unit: UnitId },
}

fn invalid_name_message(target: &str, reason: &InvalidNameReason) -> String {
    match reason {
        InvalidNameReason::EmptyName => "Target name must not be empty".to_string(),
        InvalidNameReason::EmptyDependency => format!(
            "Syntax error: the dependency list of target `{}` contains an empty name",
            target
        ),
    }
}

/// What happened to a target handed to [`super::TargetGraph::add_target`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// The name was new.
    Added(TargetId),
    /// The new definition overrode an imported one.
    Replaced(TargetId),
    /// An earlier definition takes precedence; the new one was dropped.
    Ignored(TargetId),
}

impl AddOutcome {
    /// The id under which the name is now stored.
    pub fn id(self) -> TargetId {
        match self {
            AddOutcome::Added(id) | AddOutcome::Replaced(id) | AddOutcome::Ignored(id) => id,
        }
    }
}

/// Knobs for [`super::TargetGraph::merge`].
#[derive(Debug, Clone, Default)]
pub struct MergeOptions {
    /// Also register every merged target as `prefix.name`.
    pub prefix: Option<String>,
    /// Run the merged targets in their own base directory.
    pub isolate_scope: bool,
    /// The base directory of the merged unit, used with `isolate_scope`.
    pub basedir: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Merged { targets: usize, aliases: usize },
    /// The unit was merged before; nothing changed.
    AlreadyImported,
}
