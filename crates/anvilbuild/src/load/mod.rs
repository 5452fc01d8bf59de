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

//! Reading project files into [`Project`]s.
//!
//! Imports are resolved depth-first, relative to the importing file, before
//! the importing file's own targets are added, so that those override
//! imported definitions of the same name. A file that is already part of the
//! project is never read twice, which ends import cycles and makes diamond
//! imports cheap.

mod descriptor;
mod model;

use std::{
    cell::RefCell,
    fs::File,
    io::BufReader,
    path::{Path, PathBuf},
    rc::Rc,
};

use indexmap::{IndexMap, IndexSet};
use log::{debug, info, warn};

use crate::{
    graph::{MergeOptions, TargetGraph},
    model::{Guards, TargetDecl, UnitId},
    project::Project,
    tasks::TaskSpec,
};

pub use descriptor::{DependsDescriptor, ImportDescriptor, ProjectDescriptor, TargetDescriptor};
pub use model::{DependsSyntaxError, LoadError};

/// Loads project files, keeping every project it has loaded so that nested
/// invocations of the same file share one graph.
#[derive(Debug, Default)]
pub struct ProjectLoader {
    cache: RefCell<IndexMap<PathBuf, Rc<Project>>>,
}

impl ProjectLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(&self, path: &Path) -> Result<Rc<Project>, LoadError> {
        let path = canonicalize(path)?;
        if let Some(project) = self.cache.borrow().get(&path) {
            debug!("Reusing loaded project {}", path.display());
            return Ok(Rc::clone(project));
        }
        let project = Rc::new(load_project(&path)?);
        self.cache.borrow_mut().insert(path, Rc::clone(&project));
        Ok(project)
    }
}

/// Read the project file at `path` together with everything it imports.
pub fn load_project(path: &Path) -> Result<Project, LoadError> {
    let path = canonicalize(path)?;
    let mut known = IndexSet::new();
    let unit = read_unit(&path, &mut known)?;
    debug!(
        "Loaded {} with {} targets from {} files",
        path.display(),
        unit.graph.len(),
        known.len()
    );

    let ProjectDescriptor {
        name,
        default,
        description,
        ..
    } = unit.descriptor;
    Ok(Project {
        name,
        file: Some(path),
        basedir: unit.basedir,
        default_target: default,
        description,
        graph: unit.graph,
        properties: unit.properties,
    })
}

fn canonicalize(path: &Path) -> Result<PathBuf, LoadError> {
    dunce::canonicalize(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_descriptor(path: &Path) -> Result<ProjectDescriptor, LoadError> {
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let reader = BufReader::new(file);
    serde_json_lenient::from_reader(reader).map_err(|source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// One project file with its imports merged in.
struct Unit {
    descriptor: ProjectDescriptor,
    graph: TargetGraph,
    basedir: PathBuf,
    properties: IndexMap<String, String>,
}

fn read_unit(path: &Path, known: &mut IndexSet<UnitId>) -> Result<Unit, LoadError> {
    let unit_id = UnitId::from_path(path);
    known.insert(unit_id.clone());

    let mut descriptor = read_descriptor(path)?;
    let dir = path.parent().unwrap_or(Path::new("."));
    let basedir = canonicalize(&dir.join(descriptor.basedir.as_deref().unwrap_or(".")))?;

    let mut graph = TargetGraph::new(unit_id);
    // Own properties first, so they take precedence over imported ones
    let mut properties = descriptor.properties.clone();

    for import in &descriptor.imports {
        let import_path = match dunce::canonicalize(dir.join(&import.file)) {
            Ok(p) => p,
            Err(e) if import.optional => {
                warn!(
                    "Skipped optional import `{}` of {}: {}",
                    import.file,
                    path.display(),
                    e
                );
                continue;
            }
            Err(source) => {
                return Err(LoadError::Io {
                    path: dir.join(&import.file),
                    source,
                });
            }
        };
        if known.contains(&UnitId::from_path(&import_path)) {
            info!(
                "Skipped already imported file {} (imported from {})",
                import_path.display(),
                path.display()
            );
            continue;
        }

        let imported = read_unit(&import_path, known)?;
        let opts = MergeOptions {
            prefix: import
                .prefix
                .clone()
                .or_else(|| imported.descriptor.name.clone()),
            isolate_scope: import.isolate,
            basedir: Some(imported.basedir),
        };
        graph
            .merge(imported.graph, &opts)
            .map_err(|source| LoadError::Graph {
                path: import_path.clone(),
                source,
            })?;
        for (name, value) in imported.properties {
            properties.entry(name).or_insert(value);
        }
    }

    for target in std::mem::take(&mut descriptor.targets) {
        let decl = to_decl(target).map_err(|(target, source)| LoadError::DependsSyntax {
            path: path.to_path_buf(),
            target,
            source,
        })?;
        graph.add_local(decl).map_err(|source| LoadError::Graph {
            path: path.to_path_buf(),
            source,
        })?;
    }

    Ok(Unit {
        descriptor,
        graph,
        basedir,
        properties,
    })
}

fn to_decl(target: TargetDescriptor) -> Result<TargetDecl, (String, DependsSyntaxError)> {
    let depends = target
        .depends
        .to_names()
        .map_err(|e| (target.name.clone(), e))?;
    Ok(TargetDecl {
        name: target.name,
        depends,
        guards: Guards {
            if_cond: target.if_cond,
            unless_cond: target.unless_cond,
        },
        description: target.description,
        work: target
            .tasks
            .into_iter()
            .map(TaskSpec::into_work_item)
            .collect(),
    })
}
