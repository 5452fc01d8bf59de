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

//! The built-in work items and their project file form.

mod basic;
mod invoke;

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::exec::WorkItem;

pub use basic::{BindReference, Echo, Fail, PathList, SetProperty};
pub use invoke::{Call, InvocationScope, ReferenceSpec, Subproject};

/// A work item as written in a project file, tagged by its `task` field:
///
/// ```json
/// { "task": "echo", "message": "Building ${version}" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "task", rename_all = "lowercase")]
pub enum TaskSpec {
    Echo(Echo),
    Property(SetProperty),
    Reference(BindReference),
    Fail(Fail),
    Call(Call),
    Subproject(Subproject),
}

impl TaskSpec {
    pub fn into_work_item(self) -> Rc<dyn WorkItem> {
        match self {
            TaskSpec::Echo(t) => Rc::new(t),
            TaskSpec::Property(t) => Rc::new(t),
            TaskSpec::Reference(t) => Rc::new(t),
            TaskSpec::Fail(t) => Rc::new(t),
            TaskSpec::Call(t) => Rc::new(t),
            TaskSpec::Subproject(t) => Rc::new(t),
        }
    }
}
