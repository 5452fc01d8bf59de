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

//! The property and reference scope of one project run.
//!
//! Both namespaces are *first-write-wins*: once a name is bound, later
//! attempts to bind it again in the same scope are ignored. This is what
//! makes command line properties override anything a project declares (they
//! are simply set first), and what lets a single scope be shared by nested,
//! synchronous invocations without further coordination.

use std::{any::Any, fmt, rc::Rc};

use indexmap::{IndexMap, IndexSet};
use log::{debug, trace};

use crate::{
    common::is_reserved_property,
    expand::{ExpandError, expand},
};

/// A value bound in the reference namespace. References are compared by
/// identity, never by content.
pub type RefValue = Rc<dyn Any>;

/// Which entries of a namespace flow from a parent scope into a child scope.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inheritance {
    /// Copy every entry.
    pub all: bool,
    /// Entries to copy when `all` is not set.
    pub include: Vec<String>,
    /// Entries never copied, even when `all` or `include` would admit them.
    pub exclude: Vec<String>,
}

impl Inheritance {
    pub fn all() -> Self {
        Self {
            all: true,
            ..Default::default()
        }
    }

    pub fn none() -> Self {
        Self::default()
    }

    pub fn only<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            all: false,
            include: names.into_iter().map(Into::into).collect(),
            exclude: vec![],
        }
    }

    pub fn excluding<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclude.extend(names.into_iter().map(Into::into));
        self
    }

    fn excludes(&self, name: &str) -> bool {
        self.exclude.iter().any(|x| x == name)
    }

    fn admits(&self, name: &str) -> bool {
        if self.excludes(name) {
            return false;
        }
        self.all || self.include.iter().any(|x| x == name)
    }
}

/// How a child scope is derived from its parent. Properties and references
/// are configured independently.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChildScopeSpec {
    pub properties: Inheritance,
    pub references: Inheritance,
}

impl ChildScopeSpec {
    /// Inherit all properties (or none), and no references.
    pub fn inherit_all(all: bool) -> Self {
        Self {
            properties: if all {
                Inheritance::all()
            } else {
                Inheritance::none()
            },
            references: Inheritance::none(),
        }
    }

    pub fn with_properties(mut self, properties: Inheritance) -> Self {
        self.properties = properties;
        self
    }

    pub fn with_references(mut self, references: Inheritance) -> Self {
        self.references = references;
        self
    }
}

#[derive(Default, Clone)]
pub struct Scope {
    properties: IndexMap<String, String>,
    /// Names of properties that came from the user (command line). These are
    /// handed down to every child scope.
    user: IndexSet<String>,
    references: IndexMap<String, RefValue>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name` to `value` unless it is already set. Returns whether the
    /// value took effect.
    pub fn set_property(&mut self, name: impl Into<String>, value: impl Into<String>) -> bool {
        let name = name.into();
        if let Some(old) = self.properties.get(&name) {
            debug!("Override ignored for property `{}` (keeping `{}`)", name, old);
            return false;
        }
        let value = value.into();
        trace!("Setting property: {} -> {}", name, value);
        self.properties.insert(name, value);
        true
    }

    /// Like [`Scope::set_property`], but also marks the property as coming
    /// from the user, so it is propagated into every child scope.
    pub fn set_user_property(&mut self, name: impl Into<String>, value: impl Into<String>) -> bool {
        let name = name.into();
        let set = self.set_property(name.clone(), value);
        if set {
            self.user.insert(name);
        }
        set
    }

    pub fn get_property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    pub fn contains_property(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    pub fn is_user_property(&self, name: &str) -> bool {
        self.user.contains(name)
    }

    /// All properties, in the order they were set.
    pub fn properties(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Bind `name` to `value` in the reference namespace unless it is already
    /// bound. Returns whether the binding took effect.
    pub fn bind_reference(&mut self, name: impl Into<String>, value: RefValue) -> bool {
        let name = name.into();
        if self.references.contains_key(&name) {
            debug!("Override ignored for reference `{}`", name);
            return false;
        }
        trace!("Adding reference: {}", name);
        self.references.insert(name, value);
        true
    }

    pub fn get_reference(&self, name: &str) -> Option<&RefValue> {
        self.references.get(name)
    }

    /// Look up a reference and downcast it to a concrete type.
    pub fn reference<T: Any>(&self, name: &str) -> Option<&T> {
        self.references.get(name)?.downcast_ref::<T>()
    }

    pub fn reference_names(&self) -> impl Iterator<Item = &str> {
        self.references.keys().map(String::as_str)
    }

    /// Create a new scope that inherits from this one according to `spec`.
    pub fn derive_child_scope(&self, spec: &ChildScopeSpec) -> Scope {
        let mut child = Scope::new();
        self.inherit_into(&mut child, spec);
        child
    }

    /// Copy entries of this scope into `child` according to `spec`.
    ///
    /// Values `child` already holds are never replaced, so anything set on
    /// the child before calling this (explicit parameters of a nested call,
    /// for example) wins over the inherited snapshot. User properties are
    /// copied even when `all` is off, unless excluded; reserved properties
    /// never are.
    pub fn inherit_into(&self, child: &mut Scope, spec: &ChildScopeSpec) {
        for (name, value) in &self.properties {
            if is_reserved_property(name) {
                continue;
            }
            if self.user.contains(name) {
                if spec.properties.excludes(name) {
                    continue;
                }
                child.set_user_property(name.clone(), value.clone());
            } else if spec.properties.admits(name) {
                child.set_property(name.clone(), value.clone());
            }
        }
        for (name, value) in &self.references {
            if spec.references.admits(name) {
                child.bind_reference(name.clone(), Rc::clone(value));
            }
        }
    }

    /// Hand the listed properties of this (child) scope back to `parent`.
    /// Returns the number of properties that took effect in the parent.
    pub fn propagate_to(&self, parent: &mut Scope, names: &[String]) -> usize {
        names
            .iter()
            .filter_map(|name| {
                let value = self.get_property(name)?;
                Some(parent.set_property(name.clone(), value))
            })
            .filter(|set| *set)
            .count()
    }

    /// Expand `${name}` references in `value` against this scope.
    pub fn expand(&self, value: &str) -> Result<String, ExpandError> {
        expand(value, |name| self.get_property(name))
    }
}

impl fmt::Debug for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scope")
            .field("properties", &self.properties)
            .field("user", &self.user)
            .field("references", &self.references.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use expect_test::expect;

    #[test]
    fn test_first_write_wins() {
        let mut scope = Scope::new();
        assert!(scope.set_property("p", "7"));
        assert!(!scope.set_property("p", "4"));
        assert_eq!(scope.get_property("p"), Some("7"));
        assert_eq!(scope.get_property("q"), None);
    }

    #[test]
    fn test_user_property_wins_over_later_definition() {
        let mut scope = Scope::new();
        scope.set_user_property("override", "user");
        scope.set_property("override", "project");
        assert_eq!(scope.get_property("override"), Some("user"));
        assert!(scope.is_user_property("override"));
    }

    #[test]
    fn test_child_scope_inheritance_modes() {
        let mut parent = Scope::new();
        parent.set_property("p", "path");
        parent.set_property("other", "x");

        let child = parent.derive_child_scope(&ChildScopeSpec::inherit_all(true));
        assert_eq!(child.get_property("p"), Some("path"));
        assert_eq!(child.get_property("other"), Some("x"));

        let child = parent.derive_child_scope(&ChildScopeSpec::inherit_all(false));
        assert_eq!(child.get_property("p"), None);

        let spec = ChildScopeSpec::inherit_all(false).with_properties(Inheritance::only(["p"]));
        let child = parent.derive_child_scope(&spec);
        assert_eq!(child.get_property("p"), Some("path"));
        assert_eq!(child.get_property("other"), None);

        let spec = ChildScopeSpec::inherit_all(false)
            .with_properties(Inheritance::only(["p"]).excluding(["p"]));
        let child = parent.derive_child_scope(&spec);
        assert_eq!(child.get_property("p"), None);

        let spec = ChildScopeSpec::inherit_all(true)
            .with_properties(Inheritance::all().excluding(["other"]));
        let child = parent.derive_child_scope(&spec);
        assert_eq!(child.get_property("p"), Some("path"));
        assert_eq!(child.get_property("other"), None);
    }

    #[test]
    fn test_inherit_does_not_clobber_child_values() {
        let mut parent = Scope::new();
        parent.set_property("p", "parent");
        parent.set_property("q", "parent");

        let mut child = Scope::new();
        child.set_property("p", "child");
        parent.inherit_into(&mut child, &ChildScopeSpec::inherit_all(true));

        assert_eq!(child.get_property("p"), Some("child"));
        assert_eq!(child.get_property("q"), Some("parent"));
    }

    #[test]
    fn test_user_properties_inherited_unless_excluded() {
        let mut parent = Scope::new();
        parent.set_user_property("from.cli", "1");
        parent.set_property("local", "2");
        let child = parent.derive_child_scope(&ChildScopeSpec::inherit_all(false));
        assert_eq!(child.get_property("from.cli"), Some("1"));
        assert!(child.is_user_property("from.cli"));
        assert_eq!(child.get_property("local"), None);

        let spec = ChildScopeSpec::inherit_all(true)
            .with_properties(Inheritance::all().excluding(["from.cli"]));
        let child = parent.derive_child_scope(&spec);
        assert_eq!(child.get_property("from.cli"), None);
        assert_eq!(child.get_property("local"), Some("2"));
    }

    #[test]
    fn test_reserved_properties_not_inherited() {
        let mut parent = Scope::new();
        parent.set_property("basedir", "/parent");
        parent.set_property("anvil.file", "/parent/build.json");
        let child = parent.derive_child_scope(&ChildScopeSpec::inherit_all(true));
        assert_eq!(child.get_property("basedir"), None);
        assert_eq!(child.get_property("anvil.file"), None);
    }

    #[test]
    fn test_references_are_independent_of_properties() {
        let mut parent = Scope::new();
        parent.set_property("path", "a string");
        let list: RefValue = Rc::new(vec!["a.jar".to_string()]);
        parent.bind_reference("path", Rc::clone(&list));

        // properties inherited, references not
        let child = parent.derive_child_scope(&ChildScopeSpec::inherit_all(true));
        assert_eq!(child.get_property("path"), Some("a string"));
        assert!(child.get_reference("path").is_none());

        // references inherited, properties not
        let spec = ChildScopeSpec::inherit_all(false).with_references(Inheritance::all());
        let child = parent.derive_child_scope(&spec);
        assert_eq!(child.get_property("path"), None);
        let inherited = child.get_reference("path").expect("reference inherited");
        assert!(Rc::ptr_eq(inherited, &list));
        assert_eq!(
            child.reference::<Vec<String>>("path"),
            Some(&vec!["a.jar".to_string()])
        );
    }

    #[test]
    fn test_reference_first_write_wins() {
        let mut scope = Scope::new();
        let first: RefValue = Rc::new(1u32);
        let second: RefValue = Rc::new(2u32);
        assert!(scope.bind_reference("r", Rc::clone(&first)));
        assert!(!scope.bind_reference("r", second));
        assert!(Rc::ptr_eq(scope.get_reference("r").unwrap(), &first));
        assert_eq!(scope.reference::<u32>("r"), Some(&1));
        assert_eq!(scope.reference::<String>("r"), None);
    }

    #[test]
    fn test_propagate_to_parent() {
        let mut parent = Scope::new();
        parent.set_property("kept", "parent");
        let mut child = Scope::new();
        child.set_property("result", "42");
        child.set_property("kept", "child");
        child.set_property("private", "x");

        let n = child.propagate_to(
            &mut parent,
            &["result".into(), "kept".into(), "absent".into()],
        );
        assert_eq!(n, 1);
        assert_eq!(parent.get_property("result"), Some("42"));
        assert_eq!(parent.get_property("kept"), Some("parent"));
        assert_eq!(parent.get_property("private"), None);
    }

    #[test]
    fn test_debug_output() {
        let mut scope = Scope::new();
        scope.set_user_property("a", "1");
        scope.bind_reference("r", Rc::new(()));
        expect![[r#"Scope { properties: {"a": "1"}, user: {"a"}, references: ["r"] }"#]]
            .assert_eq(&format!("{:?}", scope));
    }
}
