// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Dependency extraction from template-bearing values.
//!
//! Node inputs, node configs and output templates reference upstream nodes by
//! template key inside `{{ ... }}` expressions and `{% ... %}` statements.
//! This module finds those references without involving the rendering engine:
//! a regex locates the template blocks, and a small tokenizer walks each block
//! and keeps the root identifiers that are neither attributes, filters, tests,
//! keywords, keyword arguments nor names bound locally by `for`/`set`/`with`.
//!
//! Extraction never fails. Malformed or unterminated blocks simply yield no
//! dependencies, since template text is user-authored.

use regex::Regex;
use serde_json::Value;
use std::collections::{BTreeSet, HashSet};
use std::sync::LazyLock;

static TEMPLATE_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)\{\{(?P<expr>.*?)\}\}|\{%(?P<stmt>.*?)%\}").expect("valid template block regex")
});

const KEYWORDS: &[&str] = &[
    "and", "or", "not", "in", "is", "if", "else", "true", "false", "none", "True", "False",
    "None", "loop", "self", "super", "caller", "varargs", "kwargs", "recursive",
];

/// Collect the upstream names referenced anywhere in `value`.
///
/// Strings are scanned, arrays and object values are walked recursively, and
/// every other JSON type contributes nothing.
///
/// ```
/// use serde_json::json;
/// use the_switchboard::template::extract_dependencies;
///
/// let input = json!({
///     "prompt": "Summarize {{ _inputs0.text }} for {{ user['name'] }}",
///     "items": ["{% for row in search.rows %}{{ row.title }}{% endfor %}"],
/// });
///
/// let deps = extract_dependencies(&input);
/// assert_eq!(deps.into_iter().collect::<Vec<_>>(), vec!["_inputs0", "search", "user"]);
/// ```
pub fn extract_dependencies(value: &Value) -> BTreeSet<String> {
    let mut found = BTreeSet::new();
    walk(value, &mut found);
    found
}

/// Collect the upstream names referenced by a single template string.
pub fn extract_from_str(template: &str) -> BTreeSet<String> {
    let mut found = BTreeSet::new();
    scan_template(template, &mut found);
    found
}

/// Truncate a dependency reference to its root identifier.
///
/// `_inputs0.field` and `_inputs0[0]` both become `_inputs0`.
pub fn root_identifier(reference: &str) -> &str {
    let trimmed = reference.trim();
    let end = trimmed
        .find(|c: char| c == '.' || c == '[')
        .unwrap_or(trimmed.len());
    &trimmed[..end]
}

fn walk(value: &Value, found: &mut BTreeSet<String>) {
    match value {
        Value::String(s) => scan_template(s, found),
        Value::Array(items) => items.iter().for_each(|item| walk(item, found)),
        Value::Object(map) => map.values().for_each(|item| walk(item, found)),
        _ => {}
    }
}

fn scan_template(template: &str, found: &mut BTreeSet<String>) {
    if !template.contains("{{") && !template.contains("{%") {
        return;
    }

    // Names bound inside this template (loop targets, set/with targets) are
    // not upstream references.
    let mut locals: HashSet<String> = HashSet::new();
    let mut references: Vec<String> = Vec::new();

    for captures in TEMPLATE_BLOCK.captures_iter(template) {
        if let Some(expr) = captures.name("expr") {
            let tokens = tokenize(expr.as_str());
            references.extend(expression_roots(&tokens));
        } else if let Some(stmt) = captures.name("stmt") {
            let tokens = tokenize(stmt.as_str());
            scan_statement(&tokens, &mut locals, &mut references);
        }
    }

    for reference in references {
        if !locals.contains(&reference) {
            found.insert(reference);
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token<'a> {
    Ident(&'a str),
    Literal,
    Punct(&'a str),
}

fn tokenize(source: &str) -> Vec<Token<'_>> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        if c.is_ascii_whitespace() {
            i += 1;
        } else if c == b'"' || c == b'\'' {
            i += 1;
            while i < bytes.len() && bytes[i] != c {
                if bytes[i] == b'\\' {
                    i += 1;
                }
                i += 1;
            }
            i += 1;
            tokens.push(Token::Literal);
        } else if c.is_ascii_digit() {
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_' || bytes[i] == b'.') {
                i += 1;
            }
            tokens.push(Token::Literal);
        } else if c.is_ascii_alphabetic() || c == b'_' {
            let start = i;
            while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                i += 1;
            }
            tokens.push(Token::Ident(&source[start..i]));
        } else if !c.is_ascii() {
            // Skip the whole UTF-8 sequence; non-ASCII never starts an identifier here.
            i += 1;
            while i < bytes.len() && (bytes[i] & 0xC0) == 0x80 {
                i += 1;
            }
        } else {
            let two = source.get(i..i + 2);
            match two {
                Some("==") | Some("!=") | Some("<=") | Some(">=") | Some("**") | Some("//") => {
                    tokens.push(Token::Punct(&source[i..i + 2]));
                    i += 2;
                }
                _ => {
                    tokens.push(Token::Punct(&source[i..i + 1]));
                    i += 1;
                }
            }
        }
    }

    tokens
}

fn expression_roots(tokens: &[Token<'_>]) -> Vec<String> {
    let mut roots = Vec::new();

    for (index, token) in tokens.iter().enumerate() {
        let Token::Ident(name) = token else {
            continue;
        };
        if KEYWORDS.contains(name) {
            continue;
        }

        let previous = index.checked_sub(1).map(|i| &tokens[i]);
        let next = tokens.get(index + 1);

        let is_attribute = matches!(previous, Some(Token::Punct(".")));
        let is_filter = matches!(previous, Some(Token::Punct("|")));
        let is_test = matches!(previous, Some(Token::Ident("is")))
            || (matches!(previous, Some(Token::Ident("not")))
                && index >= 2
                && matches!(tokens[index - 2], Token::Ident("is")));
        let is_call = matches!(next, Some(Token::Punct("(")));
        let is_kwarg = matches!(next, Some(Token::Punct("=")));

        if !(is_attribute || is_filter || is_test || is_call || is_kwarg) {
            roots.push((*name).to_string());
        }
    }

    roots
}

fn scan_statement(tokens: &[Token<'_>], locals: &mut HashSet<String>, references: &mut Vec<String>) {
    let body = match tokens.first() {
        Some(Token::Punct("-")) | Some(Token::Punct("+")) => &tokens[1..],
        _ => tokens,
    };
    let body = match body.last() {
        Some(Token::Punct("-")) | Some(Token::Punct("+")) => &body[..body.len() - 1],
        _ => body,
    };

    let Some(Token::Ident(tag)) = body.first() else {
        return;
    };
    let rest = &body[1..];

    match *tag {
        "for" => {
            let split = rest.iter().position(|t| matches!(t, Token::Ident("in")));
            if let Some(split) = split {
                bind_names(&rest[..split], locals);
                references.extend(expression_roots(&rest[split + 1..]));
            }
        }
        "set" | "with" => {
            // `set a, b = expr` / `with a = expr, b = expr`: names directly
            // before a single `=` are bound, everything else is an expression.
            let mut expression_tokens = Vec::new();
            for (index, token) in rest.iter().enumerate() {
                let binds = matches!(token, Token::Ident(_))
                    && matches!(rest.get(index + 1), Some(Token::Punct("=")) | Some(Token::Punct(",")))
                    && !in_expression_position(rest, index);
                if binds {
                    bind_names(std::slice::from_ref(token), locals);
                } else {
                    expression_tokens.push(token.clone());
                }
            }
            if rest.len() == 1 {
                bind_names(rest, locals);
            } else {
                references.extend(expression_roots(&expression_tokens));
            }
        }
        "macro" => bind_names(rest, locals),
        "import" | "from" => {
            if let Some(split) = rest.iter().position(|t| matches!(t, Token::Ident("as") | Token::Ident("import"))) {
                bind_names(&rest[split + 1..], locals);
            }
        }
        "if" | "elif" | "call" => references.extend(expression_roots(rest)),
        _ => {}
    }
}

fn in_expression_position(tokens: &[Token<'_>], index: usize) -> bool {
    // After the first `=` of an assignment, identifiers belong to the value
    // unless a `,` starts a new `name =` pair.
    let mut in_value = false;
    for token in &tokens[..index] {
        match token {
            Token::Punct("=") => in_value = true,
            Token::Punct(",") => in_value = false,
            _ => {}
        }
    }
    in_value
}

fn bind_names(tokens: &[Token<'_>], locals: &mut HashSet<String>) {
    for token in tokens {
        if let Token::Ident(name) = token {
            locals.insert((*name).to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn deps(template: &str) -> Vec<String> {
        extract_from_str(template).into_iter().collect()
    }

    #[test]
    fn test_simple_variable() {
        assert_eq!(deps("{{ProcA.text}}"), vec!["ProcA"]);
        assert_eq!(deps("Hello {{ name }}!"), vec!["name"]);
    }

    #[test]
    fn test_index_and_attribute_are_truncated_to_root() {
        assert_eq!(deps("{{ _inputs0.field }}"), vec!["_inputs0"]);
        assert_eq!(deps("{{ rows[0].title }}"), vec!["rows"]);
        assert_eq!(deps("{{ doc['key'] }}"), vec!["doc"]);
    }

    #[test]
    fn test_filters_tests_and_calls_are_not_dependencies() {
        assert_eq!(deps("{{ summary.text | upper | truncate(length=10) }}"), vec!["summary"]);
        assert_eq!(deps("{% if answer is defined %}{{ answer }}{% endif %}"), vec!["answer"]);
        assert_eq!(deps("{% if answer is not none %}x{% endif %}"), vec!["answer"]);
        assert_eq!(deps("{{ range(3) }}"), Vec::<String>::new());
    }

    #[test]
    fn test_loop_collection_is_a_dependency_but_loop_variable_is_not() {
        let template = "{% for item in search.results %}{{ item.title }} {{ loop.index }}{% endfor %}";
        assert_eq!(deps(template), vec!["search"]);
    }

    #[test]
    fn test_loop_with_tuple_targets() {
        let template = "{% for key, value in meta.items() %}{{ key }}={{ value }}{% endfor %}";
        assert_eq!(deps(template), vec!["meta"]);
    }

    #[test]
    fn test_set_binds_local_names() {
        let template = "{% set greeting = _inputs0.name ~ '!' %}{{ greeting }}";
        assert_eq!(deps(template), vec!["_inputs0"]);
    }

    #[test]
    fn test_literals_and_keywords_ignored() {
        assert_eq!(deps("{{ 'plain string' }} {{ 42 }} {{ true and none }}"), Vec::<String>::new());
        assert_eq!(deps("{{ a if flag else b }}"), vec!["a", "b", "flag"]);
    }

    #[test]
    fn test_whitespace_control_markers() {
        assert_eq!(deps("{%- for x in items -%}{{- x -}}{%- endfor %}"), vec!["items"]);
    }

    #[test]
    fn test_malformed_templates_degrade_to_no_dependency() {
        assert!(deps("{{ unterminated").is_empty());
        assert!(deps("{% for in %}").is_empty());
        assert!(deps("}} {{").is_empty());
        assert!(deps("{{ 'unterminated string }}").is_empty());
        assert!(deps("no templates here").is_empty());
    }

    #[test]
    fn test_non_ascii_text_is_skipped() {
        assert_eq!(deps("日本語 {{ 名前 }} {{ ok }}"), vec!["ok"]);
    }

    #[test]
    fn test_nested_structure_walk() {
        let value = json!({
            "input": {"question": "{{ _inputs0.question }}"},
            "messages": [
                {"role": "system", "content": "{{ persona.prompt }}"},
                {"role": "user", "content": "{{ _inputs0.question }}"}
            ],
            "temperature": 0.7,
            "stream": true,
            "stop": null
        });

        let found: Vec<String> = extract_dependencies(&value).into_iter().collect();
        assert_eq!(found, vec!["_inputs0", "persona"]);
    }

    #[test]
    fn test_root_identifier() {
        assert_eq!(root_identifier("_inputs0.field"), "_inputs0");
        assert_eq!(root_identifier("rows[2]"), "rows");
        assert_eq!(root_identifier(" plain "), "plain");
    }
}
