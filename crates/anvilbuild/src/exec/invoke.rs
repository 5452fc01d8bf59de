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

//! Nested invocations: running a target set of this or another project from
//! inside a work item, with a scope derived from the caller's.

use std::{path::PathBuf, rc::Rc};

use anvilutil::scope::{ChildScopeSpec, Inheritance, Scope};
use indexmap::IndexMap;
use log::{debug, warn};

use super::{BuildError, Executor, RecursionKind, RunReport, TaskContext};
use crate::project::Project;

/// Copy the caller's reference `refid` into the callee, as `to_refid` if
/// given.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceMapping {
    pub refid: String,
    pub to_refid: Option<String>,
}

/// What to run and how the callee's scope is derived. Values are taken as
/// they are; expanding them is up to the work item building the request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationRequest {
    /// Project file to run, relative to the caller's base directory. `None`
    /// runs the caller's own project.
    pub file: Option<PathBuf>,
    /// Base directory of the callee, relative to the caller's one.
    pub dir: Option<PathBuf>,
    /// Targets to run; empty runs the callee's default target.
    pub targets: Vec<String>,
    pub inherit_all: bool,
    pub inherit_refs: bool,
    /// Properties set in the callee before anything else.
    pub params: IndexMap<String, String>,
    pub references: Vec<ReferenceMapping>,
    /// Properties copied back into the caller after a successful run.
    pub returns: Vec<String>,
}

impl Default for InvocationRequest {
    fn default() -> Self {
        Self {
            file: None,
            dir: None,
            targets: vec![],
            inherit_all: true,
            inherit_refs: false,
            params: IndexMap::new(),
            references: vec![],
            returns: vec![],
        }
    }
}

/// Run `req` as a nested invocation of the work item behind `cx`.
pub fn invoke(cx: &mut TaskContext<'_>, req: &InvocationRequest) -> Result<RunReport, BuildError> {
    if cx.depth >= cx.max_depth {
        return Err(BuildError::TooDeep {
            owner: cx.target.name().to_owned(),
            max_depth: cx.max_depth,
        });
    }

    let loaded: Rc<Project>;
    let callee: &Project = match &req.file {
        None => cx.project,
        Some(file) => {
            loaded = cx.loader.load(&cx.resolve_path(file))?;
            &loaded
        }
    };

    if callee.is_same_unit(cx.project) {
        check_recursion(callee, cx.target.name(), &req.targets)?;
    }

    let basedir = match &req.dir {
        Some(dir) => cx.resolve_path(dir),
        None if req.inherit_all => cx.basedir.to_path_buf(),
        None => callee.basedir.clone(),
    };

    let mut child = derive_scope(cx.scope, req);
    debug!(
        "Invoking {:?} of {} in {} (depth {})",
        req.targets,
        callee.display_name(),
        basedir.display(),
        cx.depth + 1
    );

    let report = Executor::new(callee, &mut *cx.listener)
        .loader(cx.loader)
        .basedir(basedir)
        .keep_going(cx.keep_going)
        .depth(cx.depth + 1)
        .max_depth(cx.max_depth)
        .run(&mut child, req.targets.as_slice())?;

    child.propagate_to(cx.scope, &req.returns);
    Ok(report)
}

/// Within one project file, a nested invocation must not re-enter the target
/// it runs in, directly or through a static dependency.
fn check_recursion(project: &Project, owner: &str, targets: &[String]) -> Result<(), BuildError> {
    let default;
    let targets = if targets.is_empty() {
        default = project.default_target.iter().cloned().collect::<Vec<_>>();
        &default
    } else {
        targets
    };

    if let Some(t) = targets.iter().find(|t| *t == owner) {
        return Err(BuildError::RecursiveCall {
            owner: owner.to_owned(),
            requested: t.clone(),
            kind: RecursionKind::OwnTarget,
        });
    }
    if let Some(t) = targets.iter().find(|t| project.graph.depends_on(t, owner)) {
        return Err(BuildError::RecursiveCall {
            owner: owner.to_owned(),
            requested: t.clone(),
            kind: RecursionKind::DependsOnOwner,
        });
    }
    Ok(())
}

/// Build the callee's scope. Explicit parameters come first so that they win
/// over anything inherited; they are user properties of the callee and so
/// reach its own nested invocations too.
fn derive_scope(parent: &Scope, req: &InvocationRequest) -> Scope {
    let mut child = Scope::new();
    for (name, value) in &req.params {
        child.set_user_property(name.clone(), value.clone());
    }

    for mapping in &req.references {
        let to = mapping.to_refid.as_deref().unwrap_or(&mapping.refid);
        match parent.get_reference(&mapping.refid) {
            Some(value) => {
                child.bind_reference(to, Rc::clone(value));
            }
            None => warn!(
                "Parent project doesn't contain any reference `{}`",
                mapping.refid
            ),
        }
    }

    let references = if req.inherit_refs {
        Inheritance::all()
    } else {
        Inheritance::none()
    };
    let spec = ChildScopeSpec::inherit_all(req.inherit_all).with_references(references);
    parent.inherit_into(&mut child, &spec);
    child
}
