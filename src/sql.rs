// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! SQL statement preprocessing: comment stripping, whitespace
//! normalization, and statement splitting (spec §4.5 step 1). Full parsing
//! is out of scope; this only prepares text for the (external) planner.

/// Strips `--` line comments and `/* ... */` block comments, respecting
/// single-quoted string literals (a `--` or `/*` inside a string is not a
/// comment marker).
pub fn remove_comments(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut chars = sql.chars().peekable();
    let mut in_string = false;

    while let Some(c) = chars.next() {
        if in_string {
            out.push(c);
            if c == '\'' {
                in_string = false;
            }
            continue;
        }
        match c {
            '\'' => {
                in_string = true;
                out.push(c);
            }
            '-' if chars.peek() == Some(&'-') => {
                chars.next();
                for c in chars.by_ref() {
                    if c == '\n' {
                        out.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// Collapses runs of whitespace (including newlines) into single spaces
/// and trims the ends.
pub fn clean_statement(sql: &str) -> String {
    sql.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Splits on `;` statement terminators, respecting single-quoted strings,
/// dropping empty statements produced by trailing/doubled separators.
pub fn split_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut in_string = false;

    for c in sql.chars() {
        match c {
            '\'' => {
                in_string = !in_string;
                current.push(c);
            }
            ';' if !in_string => {
                statements.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    if !current.trim().is_empty() {
        statements.push(current.trim().to_string());
    }
    statements.into_iter().filter(|s| !s.is_empty()).collect()
}

/// The full preprocessing pipeline the cursor runs before handing
/// statements to the planner.
pub fn preprocess(sql: &str) -> Vec<String> {
    let stripped = remove_comments(sql);
    split_statements(&stripped)
        .into_iter()
        .map(|s| clean_statement(&s))
        .filter(|s| !s.is_empty())
        .collect()
}
