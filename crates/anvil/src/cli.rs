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

pub mod check;
pub mod graph;
pub mod run;
pub mod targets;

pub use check::*;
pub use graph::*;
pub use run::*;
pub use targets::*;

use std::rc::Rc;

use anvilbuild::{load::ProjectLoader, project::Project};
use anvilutil::cli::UniversalFlags;
use anyhow::Context;
use log::debug;

#[derive(Debug, clap::Parser)]
#[clap(name = "anvil", about = "A build runner for targets with dependencies.")]
pub struct AnvilCli {
    #[clap(subcommand)]
    pub subcommand: AnvilSubcommands,

    #[clap(flatten)]
    pub flags: UniversalFlags,
}

#[derive(Debug, clap::Parser)]
pub enum AnvilSubcommands {
    Run(RunSubcommand),
    Targets(TargetsSubcommand),
    Check(CheckSubcommand),
    Graph(GraphSubcommand),
}

/// Find and load the project selected by the common flags.
pub(crate) fn load_project(
    cli: &UniversalFlags,
    loader: &ProjectLoader,
) -> anyhow::Result<Rc<Project>> {
    let file = cli.project.resolve_project_file()?;
    debug!("Using project file {}", file.display());
    loader
        .load(&file)
        .with_context(|| format!("failed to load project `{}`", file.display()))
}
