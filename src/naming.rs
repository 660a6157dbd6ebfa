//! Names derived from file paths.
//!
//! Scanned files may follow the `NNN-name` convention: an optional numeric
//! prefix that orders files on disk, followed by the human name. The prefix
//! never shows up in display names:
//!
//! - `001-Oak-Panel.jpg` → "Oak Panel"
//! - `walnut_slab.png` → "walnut slab"
//! - `007.jpg` → "007" (number-only names keep the number)
//!
//! Ids and output filenames use [`slugify`]: lowercase ASCII letters, digits
//! and single dashes.

/// Result of splitting a name like `020-Oak-Panel`.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedName {
    pub number: Option<u32>,
    /// Part after `NNN-`, or the whole input when unnumbered.
    pub name: String,
}

pub fn parse_entry_name(name: &str) -> ParsedName {
    if let Some((prefix, rest)) = name.split_once('-') {
        if let Ok(num) = prefix.parse::<u32>() {
            return ParsedName {
                number: Some(num),
                name: rest.to_string(),
            };
        }
    }
    ParsedName {
        number: None,
        name: name.to_string(),
    }
}

/// Human display name for a file stem.
pub fn display_name(stem: &str) -> String {
    let parsed = parse_entry_name(stem);
    let base = if parsed.name.trim().is_empty() {
        stem
    } else {
        parsed.name.as_str()
    };
    base.split(['-', '_'])
        .filter(|word| !word.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lowercase ASCII slug; runs of anything else collapse to one dash.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;
    for c in input.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(c.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }
    slug
}
