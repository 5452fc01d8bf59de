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

//! Work items that only touch the scope and the listener.

use std::rc::Rc;

use anvilutil::{common::LIST_SEPARATOR, scope::RefValue};
use anyhow::{Context, bail};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::exec::{TaskContext, WorkItem, guard::test_condition};

/// Print a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Echo {
    pub message: String,
}

impl Echo {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl WorkItem for Echo {
    fn kind(&self) -> &str {
        "echo"
    }

    fn execute(&self, cx: &mut TaskContext<'_>) -> anyhow::Result<()> {
        let message = cx.expand(&self.message)?;
        cx.log(&message);
        Ok(())
    }
}

/// Set a property, if it is not set yet. Exactly one of `value`, `location`
/// and `refid` must be given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetProperty {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    /// A path, stored as an absolute path resolved against the base
    /// directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// A reference, stored in its string form.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refid: Option<String>,
}

impl SetProperty {
    pub fn value(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Some(value.into()),
            ..Default::default()
        }
    }

    pub fn location(name: impl Into<String>, location: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: Some(location.into()),
            ..Default::default()
        }
    }

    pub fn refid(name: impl Into<String>, refid: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            refid: Some(refid.into()),
            ..Default::default()
        }
    }

    fn resolve(&self, cx: &TaskContext<'_>) -> anyhow::Result<String> {
        match (&self.value, &self.location, &self.refid) {
            (Some(value), None, None) => cx.expand(value),
            (None, Some(location), None) => {
                let path = cx.resolve_path(cx.expand(location)?);
                Ok(path.display().to_string())
            }
            (None, None, Some(refid)) => {
                let refid = cx.expand(refid)?;
                let value = cx
                    .scope()
                    .get_reference(&refid)
                    .with_context(|| format!("Reference `{}` not found", refid))?;
                Ok(reference_to_string(value))
            }
            _ => bail!(
                "Property `{}` needs exactly one of `value`, `location` or `refid`",
                self.name
            ),
        }
    }
}

impl WorkItem for SetProperty {
    fn kind(&self) -> &str {
        "property"
    }

    fn execute(&self, cx: &mut TaskContext<'_>) -> anyhow::Result<()> {
        let name = cx.expand(&self.name)?;
        let value = self.resolve(cx)?;
        if !cx.scope_mut().set_property(name.clone(), value) {
            debug!("Property `{}` is already set, not changing it", name);
        }
        Ok(())
    }
}

/// An ordered list of strings bound in the reference namespace, like a
/// search path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathList(pub Vec<String>);

impl std::fmt::Display for PathList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0.join(LIST_SEPARATOR))
    }
}

/// The string form of a reference, for the types this crate knows about.
fn reference_to_string(value: &RefValue) -> String {
    if let Some(list) = value.downcast_ref::<PathList>() {
        list.to_string()
    } else if let Some(s) = value.downcast_ref::<String>() {
        s.clone()
    } else {
        "<reference>".to_string()
    }
}

/// Bind a [`PathList`] under `id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BindReference {
    pub id: String,
    #[serde(default)]
    pub values: Vec<String>,
}

impl BindReference {
    pub fn new<I, S>(id: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }
}

impl WorkItem for BindReference {
    fn kind(&self) -> &str {
        "reference"
    }

    fn execute(&self, cx: &mut TaskContext<'_>) -> anyhow::Result<()> {
        let id = cx.expand(&self.id)?;
        let values = self
            .values
            .iter()
            .map(|v| cx.expand(v))
            .collect::<anyhow::Result<Vec<_>>>()?;
        if !cx.scope_mut().bind_reference(id.clone(), Rc::new(PathList(values))) {
            debug!("Reference `{}` is already bound, not changing it", id);
        }
        Ok(())
    }
}

/// Fail the build, optionally only when a condition holds (`if`) or does
/// not hold (`unless`). Conditions read like target guards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fail {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, rename = "if", skip_serializing_if = "Option::is_none")]
    pub if_cond: Option<String>,
    #[serde(default, rename = "unless", skip_serializing_if = "Option::is_none")]
    pub unless_cond: Option<String>,
}

impl Fail {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: Some(message.into()),
            ..Default::default()
        }
    }
}

impl WorkItem for Fail {
    fn kind(&self) -> &str {
        "fail"
    }

    fn execute(&self, cx: &mut TaskContext<'_>) -> anyhow::Result<()> {
        if let Some(cond) = &self.if_cond {
            if !test_condition(cond, cx.scope(), true)? {
                return Ok(());
            }
        }
        if let Some(cond) = &self.unless_cond {
            if test_condition(cond, cx.scope(), false)? {
                return Ok(());
            }
        }
        match &self.message {
            Some(message) => bail!("{}", cx.expand(message)?),
            None => bail!("No message"),
        }
    }
}
