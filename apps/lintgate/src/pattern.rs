//! Path matching for environments and exclude globs.
//!
//! Exclude globs support two wildcards:
//! - `**`: any characters, path separators included.
//! - `*`: any characters within one path segment.
//!
//! Every other character matches itself. The translated regex is anchored on
//! both ends, so the full posix-style relative path has to match.

use regex::Regex;

/// Translate an exclude glob into an anchored regex source.
///
/// `**` is split out before `*` so that it is never expanded as two
/// single-segment wildcards.
pub fn glob_to_regex(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len() + 8);
    out.push('^');
    for (i, deep) in pattern.split("**").enumerate() {
        if i > 0 {
            out.push_str(".*");
        }
        for (j, literal) in deep.split('*').enumerate() {
            if j > 0 {
                out.push_str("[^/]*");
            }
            out.push_str(&regex::escape(literal));
        }
    }
    out.push('$');
    out
}

/// Whether `relative_path` matches the exclude glob `pattern` in full.
pub fn matches_exclude(relative_path: &str, pattern: &str) -> bool {
    match Regex::new(&glob_to_regex(pattern)) {
        Ok(re) => re.is_match(relative_path),
        Err(e) => {
            log::warn!("exclude pattern '{}' did not compile: {}", pattern, e);
            false
        }
    }
}

/// First exclude in `patterns` that matches, if any.
pub fn first_exclude<'a>(relative_path: &str, patterns: &'a [String]) -> Option<&'a str> {
    patterns
        .iter()
        .map(String::as_str)
        .find(|p| matches_exclude(relative_path, p))
}

/// Whether `relative_path` lies under any of the environment `paths`.
///
/// `.` covers everything; otherwise the path must equal the prefix or sit
/// below it, at any depth.
pub fn path_under_any(relative_path: &str, paths: &[String]) -> bool {
    paths.iter().any(|p| path_under(relative_path, p))
}

fn path_under(relative_path: &str, prefix: &str) -> bool {
    let p = normalize_prefix(prefix);
    if p == "." {
        return true;
    }
    !p.is_empty()
        && (relative_path == p
            || relative_path
                .strip_prefix(p)
                .map_or(false, |rest| rest.starts_with('/')))
}

fn normalize_prefix(prefix: &str) -> &str {
    let p = prefix.trim();
    let p = p.strip_prefix("./").unwrap_or(p);
    let p = p.trim_end_matches('/');
    if p.is_empty() && prefix.trim().starts_with('.') {
        "."
    } else {
        p
    }
}
