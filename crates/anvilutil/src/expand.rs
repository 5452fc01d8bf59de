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

//! `${name}` property expansion.
//!
//! The rules are:
//! - `${name}` is replaced by the value of `name`, or kept verbatim when
//!   `name` is not defined;
//! - `$$` collapses into a single `$`;
//! - `$` followed by anything else is kept as is;
//! - an opening `${` without a closing `}` is an error.

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ExpandError {
    #[error("Syntax error in property reference: `{value}` contains `${{` without a closing `}}`")]
    Unterminated { value: String },
}

/// Expand every property reference in `value` using `lookup`.
pub fn expand<F, S>(value: &str, lookup: F) -> Result<String, ExpandError>
where
    F: Fn(&str) -> Option<S>,
    S: AsRef<str>,
{
    if !value.contains('$') {
        return Ok(value.to_owned());
    }

    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];
        match after.chars().next() {
            None => {
                out.push('$');
                rest = after;
            }
            Some('$') => {
                out.push('$');
                rest = &after[1..];
            }
            Some('{') => {
                let Some(end) = after.find('}') else {
                    return Err(ExpandError::Unterminated {
                        value: value.to_owned(),
                    });
                };
                let name = &after[1..end];
                match lookup(name) {
                    Some(v) => out.push_str(v.as_ref()),
                    None => {
                        out.push_str("${");
                        out.push_str(name);
                        out.push('}');
                    }
                }
                rest = &after[end + 1..];
            }
            Some(c) => {
                out.push('$');
                out.push(c);
                rest = &after[c.len_utf8()..];
            }
        }
    }
    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod test {
    use super::*;
    use expect_test::expect;

    fn lookup(name: &str) -> Option<&'static str> {
        match name {
            "src" => Some("src/main"),
            "version" => Some("1.2"),
            _ => None,
        }
    }

    #[test]
    fn test_expand_known_and_unknown() {
        let actual = expand("${src}/v${version}/${missing}", lookup).unwrap();
        expect!["src/main/v1.2/${missing}"].assert_eq(&actual);
    }

    #[test]
    fn test_expand_dollar_escapes() {
        assert_eq!(expand("$${src}", lookup).unwrap(), "${src}");
        assert_eq!(expand("cost: $5", lookup).unwrap(), "cost: $5");
        assert_eq!(expand("trailing $", lookup).unwrap(), "trailing $");
        assert_eq!(expand("", lookup).unwrap(), "");
    }

    #[test]
    fn test_expand_unterminated() {
        let err = expand("${src", lookup).unwrap_err();
        expect!["Syntax error in property reference: `${src` contains `${` without a closing `}`"]
            .assert_eq(&err.to_string());
    }
}
