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

use crate::dirs::ProjectFileArgs;

#[derive(Debug, clap::Parser)]
#[clap(next_display_order(2000), next_help_heading("Common options"))]
pub struct UniversalFlags {
    #[clap(flatten)]
    pub project: ProjectFileArgs,

    /// Set a user property, as `name=value`. User properties take precedence
    /// over anything the project declares and are passed down to nested
    /// invocations.
    #[clap(short = 'D', value_name = "NAME=VALUE", value_parser = parse_define, global = true)]
    pub define: Vec<(String, String)>,

    /// Suppress output
    #[clap(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Increase verbosity
    #[clap(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Trace the execution of the program
    #[clap(long, global = true)]
    pub trace: bool,
}

fn parse_define(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, _)) if name.trim().is_empty() => {
            Err(format!("invalid property definition `{}`: empty name", s))
        }
        Some((name, value)) => Ok((name.trim().to_owned(), value.to_owned())),
        None => Err(format!(
            "invalid property definition `{}`: expected `name=value`",
            s
        )),
    }
}

#[test]
fn test_parse_define() {
    assert_eq!(
        parse_define("out.dir=build/out").unwrap(),
        ("out.dir".to_string(), "build/out".to_string())
    );
    assert_eq!(
        parse_define("empty=").unwrap(),
        ("empty".to_string(), String::new())
    );
    assert_eq!(
        parse_define("a=b=c").unwrap(),
        ("a".to_string(), "b=c".to_string())
    );
    assert!(parse_define("novalue").is_err());
    assert!(parse_define("=value").is_err());
}
