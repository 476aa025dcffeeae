//! Textual encoding of structured headers.
//!
//! Documents store their header as a YAML-style block between `---` fences,
//! the shape vault editors (Obsidian and friends) expect. The value grammar
//! is deliberately the small subset [`FieldValue`] can represent: scalars
//! and block lists of strings. Anything this module renders it can parse
//! back; unknown constructs in hand-edited documents degrade to plain text
//! rather than erroring.

use loreforge_common::FieldValue;

use super::Frontmatter;

/// Render a header to the text that goes between the `---` fences.
///
/// Keys come out in map order (sorted, since [`Frontmatter`] is a BTreeMap),
/// so rendering is deterministic and diffs stay clean.
pub fn render(frontmatter: &Frontmatter) -> String {
    let mut out = String::new();
    for (key, value) in frontmatter {
        match value {
            FieldValue::Bool(b) => out.push_str(&format!("{key}: {b}\n")),
            FieldValue::Integer(i) => out.push_str(&format!("{key}: {i}\n")),
            FieldValue::Float(f) => out.push_str(&format!("{key}: {}\n", render_float(*f))),
            FieldValue::Text(s) => out.push_str(&format!("{key}: {}\n", render_text(s))),
            FieldValue::List(items) => {
                out.push_str(&format!("{key}:\n"));
                for item in items {
                    out.push_str(&format!("  - {}\n", render_text(item)));
                }
            }
        }
    }
    out
}

/// Parse header text (the content between the fences) back into a map.
///
/// Lines that do not fit the grammar are skipped; a hand-mangled header
/// should never make the whole document unreadable.
pub fn parse(text: &str) -> Frontmatter {
    let mut frontmatter = Frontmatter::new();
    let mut lines = text.lines().peekable();

    while let Some(line) = lines.next() {
        let trimmed = line.trim_end();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let Some((key, rest)) = trimmed.split_once(':') else {
            continue;
        };
        let key = key.trim();
        if key.is_empty() || key.contains(char::is_whitespace) {
            continue;
        }
        let rest = rest.trim();

        if rest.is_empty() {
            // Block list: consume following "  - item" lines.
            let mut items = Vec::new();
            while let Some(next) = lines.peek() {
                let next = next.trim_start();
                if let Some(item) = next.strip_prefix("- ") {
                    items.push(parse_text(item.trim()));
                    lines.next();
                } else {
                    break;
                }
            }
            frontmatter.insert(key.to_string(), FieldValue::List(items));
        } else {
            frontmatter.insert(key.to_string(), parse_scalar(rest));
        }
    }
    frontmatter
}

fn parse_scalar(raw: &str) -> FieldValue {
    if raw.starts_with('"') {
        return FieldValue::Text(parse_text(raw));
    }
    // Inline list form, produced by some editors.
    if let Some(inner) = raw.strip_prefix('[').and_then(|r| r.strip_suffix(']')) {
        let items = inner
            .split(',')
            .map(|i| parse_text(i.trim()))
            .filter(|i| !i.is_empty())
            .collect();
        return FieldValue::List(items);
    }
    match raw {
        "true" => return FieldValue::Bool(true),
        "false" => return FieldValue::Bool(false),
        _ => {}
    }
    if let Ok(i) = raw.parse::<i64>() {
        return FieldValue::Integer(i);
    }
    if let Ok(f) = raw.parse::<f64>() {
        return FieldValue::Float(f);
    }
    FieldValue::Text(raw.to_string())
}

fn parse_text(raw: &str) -> String {
    let unquoted = raw
        .strip_prefix('"')
        .and_then(|r| r.strip_suffix('"'))
        .unwrap_or(raw);
    unquoted.replace("\\\"", "\"")
}

/// Whole-valued floats keep a decimal point so they re-parse as floats
/// rather than integers.
fn render_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 {
        format!("{f:.1}")
    } else {
        format!("{f}")
    }
}

/// Quote a string when leaving it bare would change its meaning on re-read.
fn render_text(s: &str) -> String {
    let looks_scalar = s == "true"
        || s == "false"
        || s.parse::<f64>().is_ok();
    let needs_quotes = s.is_empty()
        || looks_scalar
        || s.contains(':')
        || s.contains('#')
        || s.contains('"')
        || s.starts_with(['[', '{', '-', '\'', ' '])
        || s.ends_with(' ');

    if needs_quotes {
        format!("\"{}\"", s.replace('"', "\\\""))
    } else {
        s.to_string()
    }
}
