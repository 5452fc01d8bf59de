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

//! `if`/`unless` evaluation.

use anvilutil::{common::parse_bool_literal, expand::ExpandError, scope::Scope};

use super::SkipReason;
use crate::model::Guards;

/// Decide whether a target with `guards` runs its work items, looking at the
/// scope as it is right now. Returns the reason when it must be skipped.
pub(super) fn evaluate(guards: &Guards, scope: &Scope) -> Result<Option<SkipReason>, ExpandError> {
    if let Some(cond) = &guards.if_cond {
        if !test_condition(cond, scope, true)? {
            return Ok(Some(SkipReason::IfConditionFalse(cond.clone())));
        }
    }
    if let Some(cond) = &guards.unless_cond {
        if test_condition(cond, scope, false)? {
            return Ok(Some(SkipReason::UnlessConditionTrue(cond.clone())));
        }
    }
    Ok(None)
}

/// A condition holds if it expands to a true literal, or to the name of a
/// property that is set. An empty condition yields `if_empty`.
pub(crate) fn test_condition(cond: &str, scope: &Scope, if_empty: bool) -> Result<bool, ExpandError> {
    let value = scope.expand(cond)?;
    if value.is_empty() {
        return Ok(if_empty);
    }
    Ok(parse_bool_literal(&value).unwrap_or_else(|| scope.contains_property(&value)))
}
