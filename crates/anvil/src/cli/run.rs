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

use anvilbuild::{
    exec::{ConsoleListener, Executor},
    load::ProjectLoader,
};
use anvilutil::{cli::UniversalFlags, scope::Scope};

/// Run targets of the project
#[derive(Debug, clap::Parser)]
pub struct RunSubcommand {
    /// Targets to run, in order. Runs the default target when none is given.
    pub targets: Vec<String>,

    /// Keep running targets that do not depend on a failed one
    #[clap(long, short = 'k')]
    pub keep_going: bool,
}

pub fn run_run(cli: &UniversalFlags, cmd: RunSubcommand) -> anyhow::Result<i32> {
    let loader = ProjectLoader::new();
    let project = super::load_project(cli, &loader)?;

    let mut scope = Scope::new();
    for (name, value) in &cli.define {
        scope.set_user_property(name.clone(), value.clone());
    }

    let mut listener = ConsoleListener::new(cli.quiet, cli.verbose);
    Executor::new(&project, &mut listener)
        .loader(&loader)
        .keep_going(cmd.keep_going)
        .run(&mut scope, cmd.targets.as_slice())?;
    Ok(0)
}
