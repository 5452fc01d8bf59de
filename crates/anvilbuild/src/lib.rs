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

/*!
    The target engine of anvil.

    A run goes through these steps:

    1. Read the project file and everything it imports into one target graph
        ([`crate::load`], [`crate::graph`]). Local targets override imported
        ones of the same name; imported ones stay reachable under their
        prefixed alias.
    2. Turn the requested targets into an execution plan
        ([`crate::sequence`]): dependencies first, every target at most once,
        cycles and undefined targets rejected before anything runs.
    3. Run the plan ([`crate::exec`]). Guards are evaluated per target right
        before it would run, against a property scope
        ([`anvilutil::scope`]) that earlier targets may have extended. Work
        items ([`crate::tasks`]) may start nested invocations, which derive
        their own scope from the caller's and go through steps 2 and 3 again.
*/

#![warn(clippy::unwrap_used)] // We prefer clear panic messages

pub mod exec;
pub mod graph;
pub mod load;
pub mod model;
pub mod project;
pub mod sequence;
pub mod tasks;
