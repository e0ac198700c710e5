//! Descriptor parsing for `SKILL.md` files.
//!
//! A skill descriptor is markdown with optional YAML frontmatter. The only
//! field the core needs is a one-line description: either the frontmatter
//! `description:` value or, failing that, the first body paragraph.

/// Extract a one-line description from `SKILL.md` content.
///
/// Returns the frontmatter `description:` value when present (surrounding
/// quotes stripped), otherwise the first paragraph of the body with its
/// lines joined by single spaces. Empty string when neither exists.
pub fn extract_description(content: &str) -> String {
    let mut in_frontmatter = false;
    let mut frontmatter_markers = 0;
    let mut paragraph: Vec<&str> = Vec::new();

    for line in content.split('\n') {
        let trimmed = trim_ascii(line);

        if trimmed == "---" {
            frontmatter_markers += 1;
            in_frontmatter = frontmatter_markers == 1;
            if !paragraph.is_empty() {
                break;
            }
            continue;
        }

        if in_frontmatter {
            if let Some(rest) = trimmed.strip_prefix("description:") {
                return unquote(trim_ascii(rest)).to_string();
            }
            continue;
        }

        // Body: skip headings, code fences, and list markers; a blank line
        // (or any skipped line) ends a paragraph already being collected.
        let skip = trimmed.is_empty()
            || trimmed.starts_with('#')
            || trimmed.starts_with("```")
            || trimmed.starts_with('-');
        if skip {
            if !paragraph.is_empty() {
                break;
            }
            continue;
        }

        paragraph.push(trimmed);
    }

    paragraph.join(" ")
}

/// Trim spaces, tabs, and carriage returns only. Descriptor files come from
/// arbitrary repos; non-ASCII whitespace is left untouched on purpose.
fn trim_ascii(s: &str) -> &str {
    s.trim_matches(|c| c == ' ' || c == '\t' || c == '\r')
}

/// Strip one matching pair of surrounding ASCII quotes.
fn unquote(s: &str) -> &str {
    let bytes = s.as_bytes();
    if bytes.len() >= 2 {
        let (first, last) = (bytes[0], bytes[bytes.len() - 1]);
        if first == last && (first == b'"' || first == b'\'') {
            return &s[1..s.len() - 1];
        }
    }
    s
}
