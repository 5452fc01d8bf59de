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

pub const BUILD_JSON: &str = "build.json";

/// The base directory of the project currently running.
pub const PROPERTY_BASEDIR: &str = "basedir";
/// Absolute path of the project file currently running.
pub const PROPERTY_FILE: &str = "anvil.file";
pub const PROPERTY_PROJECT_NAME: &str = "anvil.project.name";
/// Comma-separated list of the targets requested for the current run.
pub const PROPERTY_INVOKED_TARGETS: &str = "anvil.project.invoked-targets";

/// Properties every project sets for itself. These are never copied from a
/// parent scope into a child scope.
pub const RESERVED_PROPERTIES: &[&str] = &[
    PROPERTY_BASEDIR,
    PROPERTY_FILE,
    PROPERTY_PROJECT_NAME,
    PROPERTY_INVOKED_TARGETS,
];

pub fn is_reserved_property(name: &str) -> bool {
    RESERVED_PROPERTIES.contains(&name)
}

/// Interpret a guard or attribute value as a boolean literal.
///
/// Returns `None` when the value is not one of the recognized literals, in
/// which case callers usually treat it as a property name instead.
pub fn parse_bool_literal(value: &str) -> Option<bool> {
    match value {
        "true" | "on" | "yes" => Some(true),
        "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

/// Separator used when a list reference is flattened into a single string.
pub const LIST_SEPARATOR: &str = if cfg!(windows) { ";" } else { ":" };

#[test]
fn test_bool_literal() {
    assert_eq!(parse_bool_literal("on"), Some(true));
    assert_eq!(parse_bool_literal("yes"), Some(true));
    assert_eq!(parse_bool_literal("off"), Some(false));
    assert_eq!(parse_bool_literal("TRUE"), None);
    assert_eq!(parse_bool_literal("some.property"), None);
}
