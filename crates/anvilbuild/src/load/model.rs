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

use std::path::PathBuf;

use crate::graph::GraphError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DependsSyntaxError {
    #[error("the dependency list contains an empty string")]
    EmptyElement,
    #[error("the dependency list ends with a `,` character")]
    TrailingComma,
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("Failed to read project file `{}`", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse project file `{}`", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_json_lenient::Error,
    },

    #[error("Syntax error in target `{target}` of `{}`", .path.display())]
    DependsSyntax {
        path: PathBuf,
        target: String,
        source: DependsSyntaxError,
    },

    #[error("Invalid target graph in `{}`", .path.display())]
    Graph { path: PathBuf, source: GraphError },
}
