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

use anvilbuild::load::ProjectLoader;
use anvilutil::cli::UniversalFlags;

/// Print the dependency graph of the project in graphviz format
#[derive(Debug, clap::Parser)]
pub struct GraphSubcommand {}

pub fn run_graph(cli: &UniversalFlags, _cmd: GraphSubcommand) -> anyhow::Result<i32> {
    let loader = ProjectLoader::new();
    let project = super::load_project(cli, &loader)?;
    print!("{}", project.graph.to_dot());
    Ok(0)
}
