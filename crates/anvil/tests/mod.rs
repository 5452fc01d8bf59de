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

mod util;

use std::path::{Path, PathBuf};

use expect_test::expect;
use util::*;

struct TestDir {
    // tempfile::TempDir removes the directory on drop
    path: tempfile::TempDir,
}

impl TestDir {
    // copy tests/test_cases/<sub> into a fresh temporary directory
    fn new(sub: &str) -> Self {
        let dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests/test_cases")
            .join(sub);
        let tmp_dir = tempfile::TempDir::new().unwrap();
        copy(&dir, tmp_dir.path()).unwrap();
        Self { path: tmp_dir }
    }

    fn new_empty() -> Self {
        let tmp_dir = tempfile::TempDir::new().unwrap();
        Self { path: tmp_dir }
    }

    fn join(&self, sub: impl AsRef<str>) -> PathBuf {
        self.path.path().join(sub.as_ref())
    }
}

impl AsRef<Path> for TestDir {
    fn as_ref(&self) -> &Path {
        self.path.path()
    }
}

fn anvil_cmd(dir: &impl AsRef<Path>) -> snapbox::cmd::Command {
    snapbox::cmd::Command::new(anvil_bin())
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .env_remove("ANVIL_TRACE")
}

#[track_caller]
fn get_stdout(
    dir: &impl AsRef<Path>,
    args: impl IntoIterator<Item = impl AsRef<std::ffi::OsStr>>,
) -> String {
    let out = anvil_cmd(dir)
        .args(args)
        .assert()
        .success()
        .get_output()
        .stdout
        .to_owned();
    replace_dir(std::str::from_utf8(&out).unwrap(), dir)
}

/// Run a command that must fail; returns its stdout and stderr.
#[track_caller]
fn get_failure(
    dir: &impl AsRef<Path>,
    args: impl IntoIterator<Item = impl AsRef<std::ffi::OsStr>>,
) -> (String, String) {
    let output = anvil_cmd(dir)
        .args(args)
        .assert()
        .failure()
        .get_output()
        .to_owned();
    (
        replace_dir(std::str::from_utf8(&output.stdout).unwrap(), dir),
        replace_dir(std::str::from_utf8(&output.stderr).unwrap(), dir),
    )
}

#[test]
fn test_run_default_target() {
    let dir = TestDir::new("hello");
    check(
        get_stdout(&dir, ["run"]),
        expect![[r#"

            init:
                 [echo] initializing

            greet:
                 [echo] Hello, world!

            BUILD SUCCESSFUL
        "#]],
    );
}

#[test]
fn test_user_property_overrides_project() {
    let dir = TestDir::new("hello");
    assert_eq!(
        get_stdout(&dir, ["run", "-q", "-D", "who=anvil", "greet"]),
        "     [echo] initializing\n     [echo] Hello, anvil!\n"
    );
}

#[test]
fn test_run_from_subdirectory_and_explicit_file() {
    let dir = TestDir::new("hello");
    std::fs::create_dir_all(dir.join("nested/deeper")).unwrap();
    assert_eq!(
        get_stdout(&dir.join("nested/deeper"), ["run", "-q"]),
        "     [echo] initializing\n     [echo] Hello, world!\n"
    );

    std::fs::rename(dir.join("build.json"), dir.join("other.json")).unwrap();
    assert_eq!(
        get_stdout(&dir, ["run", "-q", "-f", "other.json", "init"]),
        "     [echo] initializing\n"
    );
}

#[test]
fn test_failing_task() {
    let dir = TestDir::new("hello");
    let (stdout, stderr) = get_failure(&dir, ["run", "fail"]);
    check(
        stdout,
        expect![[r#"

            fail:

            BUILD FAILED
        "#]],
    );
    assert!(stderr.contains("error: Task `fail` of target `fail` failed"));
    assert!(stderr.contains("failing on purpose"));
}

#[test]
fn test_unknown_target() {
    let dir = TestDir::new("hello");
    let (_, stderr) = get_failure(&dir, ["run", "greet", "nope"]);
    assert!(stderr.contains("Target `nope` does not exist in the project"));
}

#[test]
fn test_targets_listing() {
    let dir = TestDir::new("hello");
    check(
        get_stdout(&dir, ["targets"]),
        expect![[r#"
            Greets somebody.

            Main targets:

             greet  Print a greeting

            Default target: greet
        "#]],
    );
    check(
        get_stdout(&dir, ["targets", "--all"]),
        expect![[r#"
            Greets somebody.

            Main targets:

             greet  Print a greeting

            Other targets:

             init
             fail

            Default target: greet
        "#]],
    );
}

#[test]
fn test_imported_targets_and_override() {
    let dir = TestDir::new("imports");
    check(
        get_stdout(&dir, ["run"]),
        expect![[r#"

            init:
                 [echo] app init

            common.compile:
                 [echo] common compile into app-out

            compile:
                 [echo] app compile

            BUILD SUCCESSFUL
        "#]],
    );
    // the imported definition stays reachable through its prefixed name
    assert_eq!(
        get_stdout(&dir, ["run", "-q", "common.init"]),
        "     [echo] common init\n"
    );
}

#[test]
fn test_check_reports_cycles() {
    let dir = TestDir::new("cycle");
    let (_, stderr) = get_failure(&dir, ["check"]);
    assert!(stderr.contains("Circular dependency: a -> b -> a"));

    // the cycle is not reachable from the default target
    check(
        get_stdout(&dir, ["run"]),
        expect![[r#"

            ok:

            BUILD SUCCESSFUL
        "#]],
    );

    let (_, stderr) = get_failure(&dir, ["run", "b"]);
    assert!(stderr.contains("Circular dependency: b -> a -> b"));
}

#[test]
fn test_check_valid_project() {
    let dir = TestDir::new("imports");
    check(
        get_stdout(&dir, ["check"]),
        expect![[r#"
            Project app is valid: 4 targets
        "#]],
    );
}

#[test]
fn test_subproject() {
    let dir = TestDir::new("subproject");
    check(
        get_stdout(&dir, ["run"]),
        expect![[r#"

            all:

            build:
                 [echo] building lib 1.0 for app
                 [echo] linking lib-1.0.a

            BUILD SUCCESSFUL
        "#]],
    );
}

#[test]
fn test_keep_going() {
    let dir = TestDir::new("keep_going");
    let (stdout, stderr) = get_failure(&dir, ["run", "-k", "dependent", "independent"]);
    check(
        stdout,
        expect![[r#"

            broken:

            dependent:

            independent:
                 [echo] still running

            BUILD FAILED
        "#]],
    );
    assert!(stderr.contains("1 target(s) failed: broken"));

    let (stdout, _) = get_failure(&dir, ["run", "dependent", "independent"]);
    assert!(!stdout.contains("still running"));
}

#[test]
fn test_guards() {
    let dir = TestDir::new("guards");
    check(
        get_stdout(&dir, ["run"]),
        expect![[r#"

            detect:

            native:
                 [echo] native build

            portable:

            package:
                 [echo] packaging

            BUILD SUCCESSFUL
        "#]],
    );
}

#[test]
fn test_graph_output() {
    let dir = TestDir::new("hello");
    let out = get_stdout(&dir, ["graph"]);
    assert!(out.starts_with("digraph {"));
    assert!(out.contains("1 -> 0"));
}

#[test]
fn test_no_project_file() {
    let dir = TestDir::new_empty();
    let (_, stderr) = get_failure(&dir, ["run"]);
    assert!(stderr.contains("could not find a build.json file in $ROOT"));
}
