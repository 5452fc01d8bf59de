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

//! The `build.json` format.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::DependsSyntaxError;
use crate::tasks::TaskSpec;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectDescriptor {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Target to run when none is requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,

    /// Base directory, relative to the directory of the project file.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub basedir: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub imports: Vec<ImportDescriptor>,

    /// Set in order before any target runs.
    #[serde(default)]
    pub properties: IndexMap<String, String>,

    #[serde(default)]
    pub targets: Vec<TargetDescriptor>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportDescriptor {
    /// Relative to the directory of the importing file.
    pub file: String,

    /// Register the imported targets also as `prefix.name`. Defaults to the
    /// imported project's name.
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(alias = "as")]
    pub prefix: Option<String>,

    /// Skip the import silently if the file does not exist.
    #[serde(default)]
    pub optional: bool,

    /// Run the imported targets in the imported project's base directory.
    #[serde(default)]
    pub isolate: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetDescriptor {
    pub name: String,

    #[serde(default)]
    pub depends: DependsDescriptor,

    #[serde(rename = "if", skip_serializing_if = "Option::is_none")]
    pub if_cond: Option<String>,

    #[serde(rename = "unless", skip_serializing_if = "Option::is_none")]
    pub unless_cond: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default)]
    pub tasks: Vec<TaskSpec>,
}

/// Dependencies, either as a list or as a comma-separated string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DependsDescriptor {
    List(Vec<String>),
    Comma(String),
}

impl Default for DependsDescriptor {
    fn default() -> Self {
        DependsDescriptor::List(vec![])
    }
}

impl DependsDescriptor {
    /// The dependency names. Names of the comma form are trimmed; an empty
    /// element or a trailing comma is a syntax error.
    pub fn to_names(&self) -> Result<Vec<String>, DependsSyntaxError> {
        match self {
            DependsDescriptor::List(names) => Ok(names.clone()),
            DependsDescriptor::Comma(s) => parse_comma_list(s),
        }
    }
}

fn parse_comma_list(s: &str) -> Result<Vec<String>, DependsSyntaxError> {
    if s.trim().is_empty() {
        return Ok(vec![]);
    }
    if s.trim_end().ends_with(',') {
        return Err(DependsSyntaxError::TrailingComma);
    }
    s.split(',')
        .map(|name| match name.trim() {
            "" => Err(DependsSyntaxError::EmptyElement),
            name => Ok(name.to_owned()),
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_comma_list() {
        assert_eq!(parse_comma_list("a, b ,c").unwrap(), ["a", "b", "c"]);
        assert_eq!(parse_comma_list("  ").unwrap(), Vec::<String>::new());
        assert_eq!(parse_comma_list("a,"), Err(DependsSyntaxError::TrailingComma));
        assert_eq!(parse_comma_list(",a"), Err(DependsSyntaxError::EmptyElement));
        assert_eq!(parse_comma_list("a,,b"), Err(DependsSyntaxError::EmptyElement));
        assert_eq!(parse_comma_list("a, ,b"), Err(DependsSyntaxError::EmptyElement));
    }

    #[test]
    fn test_parse_descriptor() {
        let json = r#"{
            "name": "demo",
            "default": "dist",
            "imports": [{ "file": "common.json", "as": "common", "optional": true }],
            "properties": { "out": "target" },
            "targets": [
                { "name": "init" },
                { "name": "compile", "depends": "init", "if": "src.present" },
                { "name": "dist", "depends": ["compile"], "tasks": [{ "task": "echo", "message": "done" }] }
            ]
        }"#;
        let desc: ProjectDescriptor = serde_json_lenient::from_str(json).unwrap();
        assert_eq!(desc.name.as_deref(), Some("demo"));
        assert_eq!(desc.imports[0].prefix.as_deref(), Some("common"));
        assert!(desc.imports[0].optional);
        assert!(!desc.imports[0].isolate);
        assert_eq!(desc.targets[1].depends.to_names().unwrap(), ["init"]);
        assert_eq!(desc.targets[1].if_cond.as_deref(), Some("src.present"));
        assert_eq!(desc.targets[2].tasks.len(), 1);
        assert!(desc.targets[0].depends.to_names().unwrap().is_empty());
    }
}
