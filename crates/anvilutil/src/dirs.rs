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

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};

use crate::common::BUILD_JSON;

#[derive(Debug, clap::Parser, Clone)]
pub struct ProjectFileArgs {
    /// The directory to start from. Defaults to the current directory.
    #[arg(long = "directory", global = true, short = 'C')]
    directory: Option<PathBuf>,

    /// The project file to use. Relative paths are resolved against the
    /// starting directory. When absent, `build.json` is searched for in the
    /// starting directory and its ancestors.
    #[arg(long = "file", global = true, short = 'f')]
    file: Option<PathBuf>,
}

impl ProjectFileArgs {
    pub fn resolve_project_file(&self) -> anyhow::Result<PathBuf> {
        let start = match self.directory.clone() {
            Some(v) => v,
            None => std::env::current_dir().context("failed to get current directory")?,
        };
        let start = dunce::canonicalize(&start)
            .with_context(|| format!("failed to set starting directory {:?}", start))?;

        match &self.file {
            Some(file) => {
                let path = start.join(file);
                if !path.is_file() {
                    bail!("project file `{}` does not exist", path.display());
                }
                dunce::canonicalize(&path)
                    .with_context(|| format!("failed to resolve project file {:?}", path))
            }
            None => find_ancestor_with_project(&start)
                .map(|dir| dir.join(BUILD_JSON))
                .ok_or_else(|| {
                    anyhow::anyhow!(
                        "could not find a {} file in {} or its ancestors",
                        BUILD_JSON,
                        start.display()
                    )
                }),
        }
    }
}

pub fn check_project_file_exists(dir: &Path) -> bool {
    dir.join(BUILD_JSON).is_file()
}

fn find_ancestor_with_project(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| check_project_file_exists(dir))
        .map(|p| p.to_path_buf())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_find_in_ancestor() {
        let tmp = tempfile::TempDir::new().unwrap();
        let root = dunce::canonicalize(tmp.path()).unwrap();
        std::fs::write(root.join(BUILD_JSON), "{}").unwrap();
        let nested = root.join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();

        let args = ProjectFileArgs {
            directory: Some(nested),
            file: None,
        };
        assert_eq!(args.resolve_project_file().unwrap(), root.join(BUILD_JSON));
    }

    #[test]
    fn test_explicit_file_must_exist() {
        let tmp = tempfile::TempDir::new().unwrap();
        let args = ProjectFileArgs {
            directory: Some(tmp.path().to_path_buf()),
            file: Some("other.json".into()),
        };
        let err = args.resolve_project_file().unwrap_err();
        assert!(err.to_string().contains("other.json"));
    }
}
