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

use std::fmt;

use anvilutil::expand::ExpandError;

use crate::{load::LoadError, sequence::SequenceError};

/// Why a target in the plan did not run its work items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// The `if` guard, after expansion, evaluated to false.
    IfConditionFalse(String),
    /// The `unless` guard, after expansion, evaluated to true.
    UnlessConditionTrue(String),
    /// A dependency failed earlier in a keep-going run.
    DependencyFailed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::IfConditionFalse(cond) => {
                write!(f, "Skipped because property `{}` not set.", cond)
            }
            SkipReason::UnlessConditionTrue(cond) => {
                write!(f, "Skipped because property `{}` set.", cond)
            }
            SkipReason::DependencyFailed(dep) => {
                write!(f, "Skipped because dependency `{}` failed.", dep)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecursionKind {
    /// The nested invocation names the target it runs in.
    OwnTarget,
    /// The nested invocation names a target that depends on the target it
    /// runs in.
    DependsOnOwner,
}

#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error(transparent)]
    Sequence(#[from] SequenceError),

    #[error("Task `{task}` of target `{target}` failed")]
    TaskFailed {
        target: String,
        task: String,
        source: anyhow::Error,
    },

    #[error("{}", recursion_message(.owner, .requested, .kind))]
    RecursiveCall {
        /// The target the nested invocation runs in.
        owner: String,
        requested: String,
        kind: RecursionKind,
    },

    #[error("Nested invocations from target `{owner}` exceed the maximum depth of {max_depth}")]
    TooDeep { owner: String, max_depth: usize },

    #[error("No target specified and project `{project}` has no default target")]
    NoTarget { project: String },

    #[error("{} target(s) failed: {}", .failed.len(), .failed.join(", "))]
    KeepGoing { failed: Vec<String> },

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Expand(#[from] ExpandError),
}

fn recursion_message(owner: &str, requested: &str, kind: &RecursionKind) -> String {
    match kind {
        RecursionKind::OwnTarget => format!(
            "Nested invocation of `{}` from target `{}` is calling its own parent target",
            requested, owner
        ),
        RecursionKind::DependsOnOwner => format!(
            "Nested invocation of `{}` from target `{}` is calling a target that depends on its parent target",
            requested, owner
        ),
    }
}

/// What a successful run did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunReport {
    /// Targets whose work items ran, in order.
    pub executed: Vec<String>,
    /// Targets that were reached but not run.
    pub skipped: Vec<(String, SkipReason)>,
}
