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

use crate::model::TargetId;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum SequenceError {
    #[error("{}", undefined_message(.target, .referrer))]
    UndefinedTarget {
        target: String,
        /// The target whose dependency list names `target`, or `None` when
        /// it was requested directly.
        referrer: Option<String>,
    },

    #[error("Circular dependency: {}", .path.join(" -> "))]
    CyclicDependency {
        /// The cycle, starting and ending with the same target.
        path: Vec<String>,
    },
}

fn undefined_message(target: &str, referrer: &Option<String>) -> String {
    match referrer {
        Some(referrer) => format!(
            "Target `{}` does not exist in the project. It is used from target `{}`",
            target, referrer
        ),
        None => format!("Target `{}` does not exist in the project", target),
    }
}

/// A deduplicated, dependency-respecting order of targets for one
/// invocation list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    pub(super) requested: Vec<String>,
    pub(super) order: Vec<TargetId>,
    pub(super) names: Vec<String>,
}

impl ExecutionPlan {
    /// The targets to run, dependencies first.
    pub fn targets(&self) -> &[TargetId] {
        &self.order
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn requested(&self) -> &[String] {
        &self.requested
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, id: TargetId) -> bool {
        self.order.contains(&id)
    }
}
