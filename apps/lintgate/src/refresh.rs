//! Refresh of auto-discovered checks.
//!
//! Merges a freshly discovered rule document into the current one. Only checks
//! stamped `"auto": true` are replaced; user-authored checks stay verbatim and
//! in place. The merge works on raw JSON so unknown fields and key order in
//! the user's document survive.

use crate::config::{load_raw, ConfigError};
use crate::validate::validate;
use serde_json::{json, Map, Value as Json};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, PartialEq)]
pub struct RefreshResult {
    pub merged: Json,
    /// Discovered checks written into the document.
    pub added: usize,
    /// Previously auto-discovered checks dropped.
    pub removed: usize,
    /// User-authored checks left untouched in refreshed lists.
    pub kept: usize,
    pub changed: bool,
}

fn is_auto(check: &Json) -> bool {
    check.get("auto").and_then(Json::as_bool).unwrap_or(false)
}

fn check_name(check: &Json) -> Option<&str> {
    check.get("name").and_then(Json::as_str)
}

fn stamp_auto(check: &Json) -> Json {
    let mut c = check.clone();
    if let Json::Object(map) = &mut c {
        map.insert("auto".into(), Json::Bool(true));
    }
    c
}

fn find_environment(envs: &[Json], discovered: &Json) -> Option<usize> {
    if let Some(name) = discovered.get("name").and_then(Json::as_str) {
        if let Some(i) = envs
            .iter()
            .position(|e| e.get("name").and_then(Json::as_str) == Some(name))
        {
            return Some(i);
        }
    }
    let paths = discovered.get("paths")?;
    envs.iter().position(|e| e.get("paths") == Some(paths))
}

/// Merge `discovered` into `current`.
pub fn refresh(current: &Json, discovered: &Json) -> RefreshResult {
    let mut res = RefreshResult {
        merged: Json::Null,
        added: 0,
        removed: 0,
        kept: 0,
        changed: false,
    };
    let mut root = match current {
        Json::Object(m) => m.clone(),
        _ => Map::new(),
    };
    let mut envs: Vec<Json> = root
        .get("environments")
        .and_then(Json::as_array)
        .cloned()
        .unwrap_or_default();

    let discovered_envs = discovered
        .get("environments")
        .and_then(Json::as_array)
        .cloned()
        .unwrap_or_default();

    for denv in &discovered_envs {
        let Some(dchecks) = denv.get("checks").and_then(Json::as_object) else {
            continue;
        };
        match find_environment(&envs, denv) {
            None => {
                let mut env = denv.clone();
                if let Some(Json::Object(checks)) = env.get_mut("checks") {
                    for list in checks.values_mut() {
                        if let Json::Array(items) = list {
                            res.added += items.len();
                            *items = items.iter().map(stamp_auto).collect();
                        }
                    }
                }
                envs.push(env);
            }
            Some(i) => {
                let Json::Object(env) = &mut envs[i] else {
                    continue;
                };
                if !env.get("checks").is_some_and(Json::is_object) {
                    env.insert("checks".into(), Json::Object(Map::new()));
                }
                if let Some(Json::Object(checks)) = env.get_mut("checks") {
                    for (ext, dlist) in dchecks {
                        let dlist = dlist.as_array().map(Vec::as_slice).unwrap_or_default();
                        refresh_list(checks, ext, dlist, &mut res);
                    }
                }
                if let Some(dagents) = denv.get("agents").and_then(Json::as_object) {
                    if !env.get("agents").is_some_and(Json::is_object) {
                        env.insert("agents".into(), Json::Object(Map::new()));
                    }
                    if let Some(Json::Object(agents)) = env.get_mut("agents") {
                        for (ext, agent) in dagents {
                            if !agents.contains_key(ext) {
                                agents.insert(ext.clone(), agent.clone());
                            }
                        }
                    }
                }
            }
        }
    }

    root.insert("environments".into(), Json::Array(envs));
    let merged = Json::Object(root);
    res.changed = &merged != current;
    res.merged = merged;
    res
}

fn refresh_list(checks: &mut Map<String, Json>, ext: &str, discovered: &[Json], res: &mut RefreshResult) {
    let existing = checks
        .get(ext)
        .and_then(Json::as_array)
        .cloned()
        .unwrap_or_default();
    let (user, auto): (Vec<Json>, Vec<Json>) = existing.into_iter().partition(|c| !is_auto(c));
    res.removed += auto.len();
    res.kept += user.len();

    let user_names: HashSet<&str> = user.iter().filter_map(check_name).collect();
    let fresh: Vec<Json> = discovered
        .iter()
        .filter(|c| check_name(c).map_or(true, |n| !user_names.contains(n)))
        .map(stamp_auto)
        .collect();
    res.added += fresh.len();

    let mut list = user;
    list.extend(fresh);
    checks.insert(ext.to_string(), Json::Array(list));
}

/// Refresh the rule document at `config_path` from the document at
/// `discovered_path`. Writes only when `write` is set and something changed.
pub fn run_refresh(
    config_path: &Path,
    discovered_path: &Path,
    write: bool,
) -> Result<RefreshResult, ConfigError> {
    let current = if config_path.exists() {
        load_raw(config_path)?
    } else {
        json!({"environments": []})
    };
    let discovered = load_raw(discovered_path)?;
    let res = refresh(&current, &discovered);

    let report = validate(&res.merged);
    if !report.is_valid() {
        return Err(ConfigError::Invalid {
            path: config_path.to_path_buf(),
            errors: report.errors,
        });
    }
    if write && res.changed {
        let text = serde_json::to_string_pretty(&res.merged).map_err(|e| ConfigError::Invalid {
            path: config_path.to_path_buf(),
            errors: vec![e.to_string()],
        })?;
        fs::write(config_path, text + "\n").map_err(|source| ConfigError::Io {
            path: config_path.to_path_buf(),
            source,
        })?;
        log::info!("refreshed {}", config_path.display());
    }
    Ok(res)
}
