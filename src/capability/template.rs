//! Parameter extraction from template bodies.
//!
//! Templates are CUE-like text. Only the top-level `parameter: { ... }` block
//! is read; each field line inside it declares one [`Parameter`].

use std::sync::LazyLock;

use regex::Regex;

use super::types::{Parameter, ParameterKind};
use crate::error::{CapError, Result};

static BLOCK_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^parameter\s*:\s*\{").expect("valid regex"));

static FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(?P<name>[A-Za-z_$][\w\-$]*|"[^"]+")(?P<opt>\?)?\s*:\s*(?P<expr>.*)$"#)
        .expect("valid regex")
});

static DIRECTIVE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^//\s*\+(?P<key>[\w-]+)(?:=(?P<value>.*))?$").expect("valid regex"));

#[derive(Default)]
struct Directives {
    alias: Option<String>,
    usage: Option<String>,
    short: Option<String>,
    ignore: bool,
}

/// Extract the parameter list declared by a template body.
///
/// A body without a `parameter` block has no parameters.
pub fn parse_parameters(body: &str) -> Result<Vec<Parameter>> {
    let Some(block) = parameter_block(body)? else {
        return Ok(Vec::new());
    };

    let mut params = Vec::new();
    let mut pending = Directives::default();
    let mut depth: i32 = 0;

    for raw in block.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if depth == 0 && line.starts_with("//") {
            if let Some(caps) = DIRECTIVE.captures(line) {
                let value = caps.name("value").map(|v| v.as_str().trim().to_string());
                match &caps["key"] {
                    "alias" => pending.alias = value,
                    "usage" => pending.usage = value,
                    "short" => pending.short = value,
                    "ignore" => pending.ignore = true,
                    _ => {}
                }
            }
            continue;
        }

        // Fields may share a line when separated by commas.
        for code in split_top_level(strip_comment(line), ',') {
            if depth == 0 {
                if let Some(caps) = FIELD.captures(code) {
                    let directives = std::mem::take(&mut pending);
                    if !directives.ignore {
                        let name = caps["name"].trim_matches('"').to_string();
                        let optional = caps.name("opt").is_some();
                        params.push(build_parameter(name, optional, &caps["expr"], directives));
                    }
                }
            }
            depth += brace_delta(code);
        }
    }

    Ok(params)
}

fn build_parameter(name: String, optional: bool, expr: &str, directives: Directives) -> Parameter {
    let mut default = None;
    let mut type_token = None;
    for alt in split_top_level(expr, '|') {
        if let Some(rest) = alt.strip_prefix('*') {
            default = Some(rest.trim().to_string());
        } else if type_token.is_none() {
            type_token = Some(alt);
        }
    }

    let kind = match type_token {
        Some(token) => kind_of(token),
        None => default.as_deref().map_or(ParameterKind::Other, kind_of),
    };

    Parameter {
        name,
        alias: directives.alias,
        kind,
        required: !optional && default.is_none(),
        default: default.map(|d| d.trim_matches('"').to_string()),
        usage: directives.usage,
        short: directives.short,
    }
}

fn kind_of(token: &str) -> ParameterKind {
    let token = token.trim();
    match token {
        "int" | "int8" | "int16" | "int32" | "int64" | "uint" | "uint8" | "uint16" | "uint32"
        | "uint64" => ParameterKind::Int,
        "string" => ParameterKind::String,
        "bool" | "true" | "false" => ParameterKind::Bool,
        "float" | "float32" | "float64" | "number" => ParameterKind::Float,
        _ if token.starts_with('"') => ParameterKind::String,
        _ if token.parse::<i64>().is_ok() => ParameterKind::Int,
        _ if token.parse::<f64>().is_ok() => ParameterKind::Float,
        _ => ParameterKind::Other,
    }
}

/// Locate the top-level parameter block and return its inner text.
fn parameter_block(body: &str) -> Result<Option<&str>> {
    let Some(found) = BLOCK_START.find(body) else {
        return Ok(None);
    };
    let start = found.end();
    let mut depth = 1;
    let mut in_string = false;
    let mut in_comment = false;
    let mut prev = '\0';

    for (offset, ch) in body[start..].char_indices() {
        if in_comment {
            if ch == '\n' {
                in_comment = false;
            }
        } else if in_string {
            if ch == '"' && prev != '\\' {
                in_string = false;
            }
        } else {
            match ch {
                '"' => in_string = true,
                '/' if prev == '/' => in_comment = true,
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(Some(&body[start..start + offset]));
                    }
                }
                _ => {}
            }
        }
        prev = ch;
    }

    Err(CapError::InvalidCapability(
        "parameter block is not closed".to_string(),
    ))
}

/// Drop a trailing `//` comment that is not inside a string literal.
fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    let mut prev = '\0';
    for (idx, ch) in line.char_indices() {
        match ch {
            '"' if prev != '\\' => in_string = !in_string,
            '/' if prev == '/' && !in_string => return line[..idx - 1].trim_end(),
            _ => {}
        }
        prev = ch;
    }
    line
}

fn brace_delta(code: &str) -> i32 {
    let mut delta = 0;
    let mut in_string = false;
    let mut prev = '\0';
    for ch in code.chars() {
        match ch {
            '"' if prev != '\\' => in_string = !in_string,
            '{' | '[' | '(' if !in_string => delta += 1,
            '}' | ']' | ')' if !in_string => delta -= 1,
            _ => {}
        }
        prev = ch;
    }
    delta
}

/// Split on `sep` outside strings and brackets, e.g. `a | *b | "c|d"` on `|`.
fn split_top_level(expr: &str, sep: char) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0;
    let mut in_string = false;
    let mut prev = '\0';
    let mut last = 0;
    for (idx, ch) in expr.char_indices() {
        match ch {
            '"' if prev != '\\' => in_string = !in_string,
            '{' | '[' | '(' if !in_string => depth += 1,
            '}' | ']' | ')' if !in_string => depth -= 1,
            _ if ch == sep && !in_string && depth == 0 => {
                parts.push(expr[last..idx].trim());
                last = idx + 1;
            }
            _ => {}
        }
        prev = ch;
    }
    parts.push(expr[last..].trim());
    parts.retain(|part| !part.is_empty());
    parts
}
