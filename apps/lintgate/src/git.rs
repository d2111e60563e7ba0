//! Detection of in-progress git operations.
//!
//! Checks are skipped by default while a merge, rebase, cherry-pick, revert,
//! or bisect is running; the rule document's `git` map opts back in per state.

use indexmap::IndexMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RepoState {
    Merge,
    Rebase,
    CherryPick,
    Revert,
    Bisect,
}

impl RepoState {
    pub fn as_str(self) -> &'static str {
        match self {
            RepoState::Merge => "merge",
            RepoState::Rebase => "rebase",
            RepoState::CherryPick => "cherry-pick",
            RepoState::Revert => "revert",
            RepoState::Bisect => "bisect",
        }
    }

    /// Whether checks should still run in this state given the `git` map.
    pub fn runs_checks(self, overrides: &IndexMap<String, bool>) -> bool {
        overrides.get(self.as_str()).copied().unwrap_or(false)
    }
}

/// Locate the git directory for a work tree rooted at `root`.
///
/// Handles both a `.git` directory and a `.git` file holding a
/// `gitdir: <path>` pointer, as used by worktrees and submodules.
pub fn git_dir(root: &Path) -> Option<PathBuf> {
    let dot_git = root.join(".git");
    if dot_git.is_dir() {
        return Some(dot_git);
    }
    let pointer = fs::read_to_string(&dot_git).ok()?;
    let target = pointer.lines().find_map(|l| l.strip_prefix("gitdir:"))?.trim();
    let path = Path::new(target);
    let resolved = if path.is_absolute() {
        path.to_path_buf()
    } else {
        root.join(path)
    };
    resolved.is_dir().then_some(resolved)
}

/// The operation in progress under `root`, if any.
pub fn detect_state(root: &Path) -> Option<RepoState> {
    let dir = git_dir(root)?;
    let markers: [(&str, RepoState); 6] = [
        ("rebase-merge", RepoState::Rebase),
        ("rebase-apply", RepoState::Rebase),
        ("MERGE_HEAD", RepoState::Merge),
        ("CHERRY_PICK_HEAD", RepoState::CherryPick),
        ("REVERT_HEAD", RepoState::Revert),
        ("BISECT_LOG", RepoState::Bisect),
    ];
    markers
        .into_iter()
        .find(|(marker, _)| dir.join(marker).exists())
        .map(|(_, state)| state)
}
