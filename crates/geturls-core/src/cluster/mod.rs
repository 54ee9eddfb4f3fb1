//! Group downloaded filenames into subdirectories by name similarity.
//!
//! Used by the by-name placement policy. Decisions are made on base names
//! (extension stripped) in first-seen order, so the same inputs and the same
//! destination listing always give the same plan:
//!
//! 1. a name close to an existing subdirectory goes there;
//! 2. remaining names close to each other form groups, and overlapping groups merge;
//! 3. a name left alone goes to the subdirectory matching its longest token, if any;
//! 4. each group goes to its longest shared token, unless that token is missing or
//!    names an existing plain file.
//!
//! Anything without a subdirectory lands in the destination root.

mod similarity;
mod tokens;

pub use similarity::{close_matches, ratio, DEFAULT_CUTOFF, DEFAULT_MATCHES};
pub use tokens::{longest_shared_token, tokens};

use std::collections::{HashMap, HashSet};

use crate::naming::split_name;

/// Subdirectory chosen for each base name; `None` means the destination root.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ClusterPlan {
    subdirs: HashMap<String, Option<String>>,
}

impl ClusterPlan {
    /// Subdirectory for `filename`, looked up by its base name.
    pub fn subdir_for(&self, filename: &str) -> Option<&str> {
        let (base, _) = split_name(filename);
        self.subdirs.get(base).and_then(|s| s.as_deref())
    }

    /// Distinct subdirectories the plan uses, in no particular order.
    pub fn subdirs(&self) -> HashSet<&str> {
        self.subdirs.values().filter_map(|s| s.as_deref()).collect()
    }

    pub fn len(&self) -> usize {
        self.subdirs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subdirs.is_empty()
    }
}

/// Plan subdirectories for `filenames` against the destination's existing
/// subdirectory names and plain file names.
pub fn cluster_names<S: AsRef<str>>(
    filenames: &[S],
    existing_dirs: &[String],
    existing_files: &HashSet<String>,
) -> ClusterPlan {
    let mut bases: Vec<&str> = Vec::new();
    for filename in filenames {
        let (base, _) = split_name(filename.as_ref());
        if !bases.contains(&base) {
            bases.push(base);
        }
    }
    let dirs = || existing_dirs.iter().map(String::as_str);

    let mut plan: HashMap<String, Option<String>> = HashMap::new();
    let mut matched: HashSet<&str> = HashSet::new();

    for &base in &bases {
        if let Some(dir) = close_matches(base, dirs(), DEFAULT_MATCHES, DEFAULT_CUTOFF).first() {
            plan.insert(base.to_string(), Some(dir.to_string()));
            matched.insert(base);
        }
    }

    let remaining: Vec<&str> = bases.iter().copied().filter(|b| !matched.contains(b)).collect();
    let mut groups: Vec<Vec<&str>> = Vec::new();
    for &base in &remaining {
        if matched.contains(base) {
            continue;
        }
        let similar = close_matches(base, remaining.iter().copied(), DEFAULT_MATCHES, DEFAULT_CUTOFF);
        if similar.len() > 1 {
            matched.extend(similar.iter().copied());
            groups.push(similar);
        } else {
            plan.insert(base.to_string(), token_subdir(base, existing_dirs));
        }
    }

    for group in merge_overlapping(groups) {
        let shared = longest_shared_token(&group).filter(|token| !existing_files.contains(token));
        tracing::debug!(?group, subdir = ?shared, "name group");
        for member in group {
            plan.insert(member.to_string(), shared.clone());
        }
    }

    ClusterPlan { subdirs: plan }
}

/// Existing subdirectory matching the longest token of `base` that matches any.
fn token_subdir(base: &str, existing_dirs: &[String]) -> Option<String> {
    // Tokens come longest first, so the first hit wins.
    tokens(base).iter().find_map(|token| {
        close_matches(
            token,
            existing_dirs.iter().map(String::as_str),
            DEFAULT_MATCHES,
            DEFAULT_CUTOFF,
        )
        .first()
        .map(|dir| dir.to_string())
    })
}

/// Merge groups that share a member, keeping first-seen order of groups and members.
fn merge_overlapping(groups: Vec<Vec<&str>>) -> Vec<Vec<&str>> {
    // Groups in `merged` are pairwise disjoint.
    let mut merged: Vec<Vec<&str>> = Vec::new();
    for group in groups {
        let hits: Vec<usize> = (0..merged.len())
            .filter(|&i| merged[i].iter().any(|m| group.contains(m)))
            .collect();
        let Some(&first) = hits.first() else {
            merged.push(group);
            continue;
        };
        let mut combined: Vec<&str> = Vec::new();
        for &i in hits.iter().rev() {
            combined.splice(0..0, merged.remove(i));
        }
        for member in group {
            if !combined.contains(&member) {
                combined.push(member);
            }
        }
        merged.insert(first, combined);
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_files() -> HashSet<String> {
        HashSet::new()
    }

    #[test]
    fn name_close_to_existing_dir() {
        let dirs = vec!["holiday_photos".to_string()];
        let plan = cluster_names(&["holiday_photo.jpg"], &dirs, &no_files());
        assert_eq!(plan.subdir_for("holiday_photo.jpg"), Some("holiday_photos"));
    }

    #[test]
    fn similar_names_share_longest_token() {
        let names = ["lecture_01.pdf", "lecture_02.pdf", "lecture_03.pdf"];
        let plan = cluster_names(&names, &[], &no_files());
        for name in names {
            assert_eq!(plan.subdir_for(name), Some("lecture"));
        }
    }

    #[test]
    fn group_token_that_is_a_file_goes_to_root() {
        let names = ["lecture_01.pdf", "lecture_02.pdf"];
        let files: HashSet<String> = ["lecture".to_string()].into_iter().collect();
        let plan = cluster_names(&names, &[], &files);
        assert_eq!(plan.subdir_for("lecture_01.pdf"), None);
        assert_eq!(plan.subdir_for("lecture_02.pdf"), None);
    }

    #[test]
    fn lone_name_uses_token_dir_or_root() {
        let dirs = vec!["invoices".to_string()];
        let names = ["invoice-march-2020.pdf", "zebra.png"];
        let plan = cluster_names(&names, &dirs, &no_files());
        assert_eq!(plan.subdir_for("invoice-march-2020.pdf"), Some("invoices"));
        assert_eq!(plan.subdir_for("zebra.png"), None);
    }

    #[test]
    fn overlapping_groups_merge() {
        let groups = vec![vec!["a", "b"], vec!["c", "d"], vec!["b", "c"]];
        assert_eq!(merge_overlapping(groups), vec![vec!["a", "b", "c", "d"]]);
    }

    #[test]
    fn plan_is_deterministic() {
        let names = ["song_a1.mp3", "song_a2.mp3", "clip_b1.mp4", "clip_b2.mp4", "readme.txt"];
        let first = cluster_names(&names, &[], &no_files());
        for _ in 0..5 {
            assert_eq!(cluster_names(&names, &[], &no_files()), first);
        }
        assert_eq!(first.subdir_for("song_a2.mp3"), Some("song"));
        assert_eq!(first.subdir_for("clip_b1.mp4"), Some("clip"));
        assert_eq!(first.subdir_for("readme.txt"), None);
    }
}
