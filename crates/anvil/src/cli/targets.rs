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

/// List the targets of the project
#[derive(Debug, clap::Parser)]
pub struct TargetsSubcommand {
    /// Also list targets without a description
    #[clap(long, short = 'a')]
    pub all: bool,
}

pub fn run_targets(cli: &UniversalFlags, cmd: TargetsSubcommand) -> anyhow::Result<i32> {
    let loader = ProjectLoader::new();
    let project = super::load_project(cli, &loader)?;

    if let Some(description) = &project.description {
        println!("{}", description);
        println!();
    }

    let (main, other): (Vec<_>, Vec<_>) = project
        .graph
        .targets()
        .partition(|t| t.description().is_some());
    let width = project.graph.names().map(str::len).max().unwrap_or(0);

    println!("Main targets:");
    println!();
    for t in &main {
        println!(" {:<width$}  {}", t.name(), t.description().unwrap_or_default());
    }
    if cmd.all && !other.is_empty() {
        println!();
        println!("Other targets:");
        println!();
        for t in &other {
            println!(" {}", t.name());
        }
    }
    if let Some(default) = &project.default_target {
        println!();
        println!("Default target: {}", default);
    }
    Ok(0)
}
