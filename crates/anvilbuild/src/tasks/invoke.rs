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

//! Work items that run other targets.

use std::path::PathBuf;

use anvilutil::common::BUILD_JSON;
use anyhow::bail;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::exec::{
    TaskContext, WorkItem,
    invoke::{InvocationRequest, ReferenceMapping, invoke},
};

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceSpec {
    pub refid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(alias = "to-refid", alias = "torefid")]
    pub to_refid: Option<String>,
}

/// How the scope of a nested invocation relates to the caller's.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvocationScope {
    #[serde(default = "default_true", alias = "inherit-all")]
    pub inherit_all: bool,
    #[serde(default, alias = "inherit-refs")]
    pub inherit_refs: bool,
    /// Properties set in the callee, expanded against the caller.
    #[serde(default)]
    pub params: IndexMap<String, String>,
    #[serde(default)]
    pub references: Vec<ReferenceSpec>,
    /// Properties handed back to the caller.
    #[serde(default, rename = "return")]
    pub returns: Vec<String>,
}

impl Default for InvocationScope {
    fn default() -> Self {
        Self {
            inherit_all: true,
            inherit_refs: false,
            params: IndexMap::new(),
            references: vec![],
            returns: vec![],
        }
    }
}

impl InvocationScope {
    fn to_request(&self, cx: &TaskContext<'_>, targets: &[String]) -> anyhow::Result<InvocationRequest> {
        let targets = targets
            .iter()
            .map(|t| cx.expand(t))
            .collect::<anyhow::Result<_>>()?;
        let params = self
            .params
            .iter()
            .map(|(k, v)| Ok((k.clone(), cx.expand(v)?)))
            .collect::<anyhow::Result<_>>()?;
        let references = self
            .references
            .iter()
            .map(|r| ReferenceMapping {
                refid: r.refid.clone(),
                to_refid: r.to_refid.clone(),
            })
            .collect();
        Ok(InvocationRequest {
            file: None,
            dir: None,
            targets,
            inherit_all: self.inherit_all,
            inherit_refs: self.inherit_refs,
            params,
            references,
            returns: self.returns.clone(),
        })
    }
}

/// Run targets of the current project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Call {
    #[serde(default)]
    pub targets: Vec<String>,
    #[serde(flatten)]
    pub scope: InvocationScope,
}

impl Call {
    pub fn new<I, S>(targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            targets: targets.into_iter().map(Into::into).collect(),
            scope: InvocationScope::default(),
        }
    }

    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.scope.params.insert(name.into(), value.into());
        self
    }

    pub fn inherit_all(mut self, inherit_all: bool) -> Self {
        self.scope.inherit_all = inherit_all;
        self
    }

    pub fn returns(mut self, name: impl Into<String>) -> Self {
        self.scope.returns.push(name.into());
        self
    }
}

impl WorkItem for Call {
    fn kind(&self) -> &str {
        "call"
    }

    fn execute(&self, cx: &mut TaskContext<'_>) -> anyhow::Result<()> {
        let req = self.scope.to_request(cx, &self.targets)?;
        invoke(cx, &req)?;
        Ok(())
    }
}

/// Run targets of another project file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subproject {
    /// The project file, relative to `dir` if given. Defaults to the
    /// standard project file name inside `dir`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    /// Base directory of the callee.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    #[serde(default)]
    pub targets: Vec<String>,
    #[serde(flatten)]
    pub scope: InvocationScope,
}

impl Subproject {
    pub fn file(file: impl Into<String>) -> Self {
        Self {
            file: Some(file.into()),
            ..Default::default()
        }
    }

    pub fn dir(mut self, dir: impl Into<String>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    pub fn targets<I, S>(mut self, targets: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.targets = targets.into_iter().map(Into::into).collect();
        self
    }

    pub fn inherit_all(mut self, inherit_all: bool) -> Self {
        self.scope.inherit_all = inherit_all;
        self
    }
}

impl WorkItem for Subproject {
    fn kind(&self) -> &str {
        "subproject"
    }

    fn execute(&self, cx: &mut TaskContext<'_>) -> anyhow::Result<()> {
        let dir = self
            .dir
            .as_deref()
            .map(|d| cx.expand(d).map(PathBuf::from))
            .transpose()?;
        let file = match (&self.file, &dir) {
            (Some(file), Some(dir)) => dir.join(cx.expand(file)?),
            (Some(file), None) => PathBuf::from(cx.expand(file)?),
            (None, Some(dir)) => dir.join(BUILD_JSON),
            (None, None) => bail!("Either `file` or `dir` must be given"),
        };

        let mut req = self.scope.to_request(cx, &self.targets)?;
        req.file = Some(file);
        req.dir = dir;
        invoke(cx, &req)?;
        Ok(())
    }
}
