//! Column name normalization for warehouse-safe identifiers.
//!
//! Header cells are rewritten through a fixed, literal replacement table and
//! then lowercased. Names that collide with an earlier column in the same
//! header receive the first free `_1`, `_2`, ... suffix, so the output keeps
//! the input's length and order.

use std::collections::HashSet;

/// Literal replacements, applied in order before lowercasing.
const REPLACEMENTS: &[(char, &str)] = &[
    (' ', "_"),
    ('.', "_"),
    ('-', "_"),
    ('/', "_"),
    ('(', "_"),
    (')', ""),
    ('?', ""),
    (':', ""),
];

/// Rewrites a single header cell without collision handling.
pub fn normalize_column_name(name: &str) -> String {
    let mut normalized = name.to_string();
    for (from, to) in REPLACEMENTS {
        if normalized.contains(*from) {
            normalized = normalized.replace(*from, to);
        }
    }
    normalized.to_lowercase()
}

/// Normalizes a full header row, resolving duplicates with numeric suffixes.
pub fn normalize_column_names<S>(names: &[S]) -> Vec<String>
where
    S: AsRef<str>,
{
    let mut seen: HashSet<String> = HashSet::with_capacity(names.len());
    let mut normalized = Vec::with_capacity(names.len());
    for name in names {
        let base = normalize_column_name(name.as_ref());
        let unique = if seen.contains(&base) {
            let mut suffix = 1usize;
            loop {
                let candidate = format!("{base}_{suffix}");
                if !seen.contains(&candidate) {
                    break candidate;
                }
                suffix += 1;
            }
        } else {
            base
        };
        seen.insert(unique.clone());
        normalized.push(unique);
    }
    normalized
}
