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

use anvilbuild::{load::ProjectLoader, sequence::Sequencer};
use anvilutil::cli::UniversalFlags;

/// Check the project for undefined targets and dependency cycles
#[derive(Debug, clap::Parser)]
pub struct CheckSubcommand {}

pub fn run_check(cli: &UniversalFlags, _cmd: CheckSubcommand) -> anyhow::Result<i32> {
    let loader = ProjectLoader::new();
    let project = super::load_project(cli, &loader)?;

    project.graph.validate_names_non_empty()?;
    let plan = Sequencer::new(&project.graph).verify_whole_graph()?;
    if let Some(default) = &project.default_target {
        Sequencer::new(&project.graph).plan(&[default])?;
    }

    if !cli.quiet {
        println!(
            "Project {} is valid: {} targets",
            project.display_name(),
            plan.len()
        );
    }
    Ok(0)
}
