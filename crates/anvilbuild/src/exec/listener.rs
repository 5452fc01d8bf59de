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

//! Progress reporting of a run.

use colored::Colorize;

use super::{BuildError, SkipReason};
use crate::{model::Target, project::Project};

/// Receives the events of a run. Every method defaults to doing nothing.
///
/// Nested invocations report through the same listener; their start and end
/// are announced with the `subbuild_*` methods instead of the `build_*` ones.
pub trait BuildListener {
    fn build_started(&mut self, _project: &Project) {}

    fn build_finished(&mut self, _project: &Project, _error: Option<&BuildError>) {}

    fn subbuild_started(&mut self, _project: &Project) {}

    fn subbuild_finished(&mut self, _project: &Project, _error: Option<&BuildError>) {}

    fn target_started(&mut self, _target: &Target) {}

    fn target_finished(&mut self, _target: &Target, _error: Option<&BuildError>) {}

    fn target_skipped(&mut self, _target: &Target, _reason: &SkipReason) {}

    /// A message emitted by the work item `task` of `target`.
    fn message(&mut self, _target: &Target, _task: &str, _message: &str) {}
}

/// Prints the run to stdout.
///
/// ```text
/// compile:
///      [echo] compiling
///
/// BUILD SUCCESSFUL
/// ```
#[derive(Debug, Default)]
pub struct ConsoleListener {
    quiet: bool,
    verbose: bool,
}

/// Width of the right-aligned `[task]` tag in front of each message line.
const TASK_TAG_WIDTH: usize = 11;

impl ConsoleListener {
    pub fn new(quiet: bool, verbose: bool) -> Self {
        Self { quiet, verbose }
    }

    fn print_target_header(&self, target: &Target) {
        if !self.quiet {
            println!();
            println!("{}:", target.name().bold());
        }
    }
}

impl BuildListener for ConsoleListener {
    fn build_started(&mut self, project: &Project) {
        if self.verbose {
            if let Some(file) = &project.file {
                println!("Buildfile: {}", file.display());
            }
        }
    }

    fn build_finished(&mut self, _project: &Project, error: Option<&BuildError>) {
        if self.quiet {
            return;
        }
        println!();
        match error {
            None => println!("{}", "BUILD SUCCESSFUL".green().bold()),
            Some(_) => println!("{}", "BUILD FAILED".red().bold()),
        }
    }

    fn subbuild_started(&mut self, project: &Project) {
        if self.verbose {
            println!();
            println!("Entering project {}", project.display_name());
        }
    }

    fn subbuild_finished(&mut self, project: &Project, _error: Option<&BuildError>) {
        if self.verbose {
            println!();
            println!("Exiting project {}", project.display_name());
        }
    }

    fn target_started(&mut self, target: &Target) {
        self.print_target_header(target);
    }

    fn target_skipped(&mut self, target: &Target, reason: &SkipReason) {
        self.print_target_header(target);
        if self.verbose {
            println!("{}", reason.to_string().dimmed());
        }
    }

    fn message(&mut self, _target: &Target, task: &str, message: &str) {
        let tag = format!("[{}]", task);
        for line in message.lines() {
            println!("{:>width$} {}", tag, line, width = TASK_TAG_WIDTH);
        }
    }
}

/// One event seen by a [`RecordingListener`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    BuildStarted(String),
    BuildFinished { ok: bool },
    SubbuildStarted(String),
    SubbuildFinished { ok: bool },
    TargetStarted(String),
    TargetFinished { target: String, ok: bool },
    TargetSkipped { target: String, reason: SkipReason },
    Message { target: String, task: String, message: String },
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct RecordingListener {
    pub events: Vec<Event>,
}

impl RecordingListener {
    pub fn new() -> Self {
        Self::default()
    }

    /// Names of the targets that started running, in order.
    pub fn started(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::TargetStarted(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// All messages, in order.
    pub fn messages(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter_map(|e| match e {
                Event::Message { message, .. } => Some(message.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl BuildListener for RecordingListener {
    fn build_started(&mut self, project: &Project) {
        self.events
            .push(Event::BuildStarted(project.display_name().to_owned()));
    }

    fn build_finished(&mut self, _project: &Project, error: Option<&BuildError>) {
        self.events.push(Event::BuildFinished {
            ok: error.is_none(),
        });
    }

    fn subbuild_started(&mut self, project: &Project) {
        self.events
            .push(Event::SubbuildStarted(project.display_name().to_owned()));
    }

    fn subbuild_finished(&mut self, _project: &Project, error: Option<&BuildError>) {
        self.events.push(Event::SubbuildFinished {
            ok: error.is_none(),
        });
    }

    fn target_started(&mut self, target: &Target) {
        self.events
            .push(Event::TargetStarted(target.name().to_owned()));
    }

    fn target_finished(&mut self, target: &Target, error: Option<&BuildError>) {
        self.events.push(Event::TargetFinished {
            target: target.name().to_owned(),
            ok: error.is_none(),
        });
    }

    fn target_skipped(&mut self, target: &Target, reason: &SkipReason) {
        self.events.push(Event::TargetSkipped {
            target: target.name().to_owned(),
            reason: reason.clone(),
        });
    }

    fn message(&mut self, target: &Target, task: &str, message: &str) {
        self.events.push(Event::Message {
            target: target.name().to_owned(),
            task: task.to_owned(),
            message: message.to_owned(),
        });
    }
}
