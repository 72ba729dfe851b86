//! Minimal edit scripts for the dock.
//!
//! Given the live tile labels and the desired labels, [`plan`] produces the
//! removals, insertions, and moves that turn one into the other while leaving
//! as many tiles as possible untouched. Tiles that appear in both lists and are
//! already in a common relative order (a longest common subsequence) never move.

use std::collections::HashSet;

/// One dock edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DockEdit {
    /// Remove the tile with this label.
    Remove {
        /// Tile label.
        label: String,
    },
    /// Insert a new tile for `label` after `after` (or first).
    Add {
        /// Tile label.
        label: String,
        /// Anchor label, `None` for the start of the dock.
        after: Option<String>,
    },
    /// Move the existing tile `label` after `after` (or first).
    Move {
        /// Tile label.
        label: String,
        /// Anchor label, `None` for the start of the dock.
        after: Option<String>,
    },
}

impl DockEdit {
    /// Label of the tile this edit touches.
    pub fn label(&self) -> &str {
        match self {
            Self::Remove { label } | Self::Add { label, .. } | Self::Move { label, .. } => label,
        }
    }
}

/// Plan the edits that turn `live` into `desired`.
///
/// Duplicate labels in either list are collapsed to their first occurrence.
/// Removals come first, then insertions and moves in desired order, each
/// anchored on its desired predecessor so the anchor is always already in
/// place when the edit runs.
pub fn plan(live: &[String], desired: &[String]) -> Vec<DockEdit> {
    let live = dedup(live);
    let desired = dedup(desired);
    let wanted: HashSet<&str> = desired.iter().copied().collect();

    let mut edits: Vec<DockEdit> = live
        .iter()
        .filter(|l| !wanted.contains(*l))
        .map(|l| DockEdit::Remove {
            label: (*l).to_string(),
        })
        .collect();

    let retained: Vec<&str> = live.iter().copied().filter(|l| wanted.contains(l)).collect();
    let present: HashSet<&str> = retained.iter().copied().collect();
    let stable = lcs(&retained, &desired);

    for (i, label) in desired.iter().enumerate() {
        if stable.contains(label) {
            continue;
        }
        let after = i.checked_sub(1).map(|p| desired[p].to_string());
        let label = (*label).to_string();
        edits.push(if present.contains(label.as_str()) {
            DockEdit::Move { label, after }
        } else {
            DockEdit::Add { label, after }
        });
    }
    edits
}

/// First occurrence of each label, in order.
fn dedup(items: &[String]) -> Vec<&str> {
    let mut seen = HashSet::new();
    items
        .iter()
        .map(String::as_str)
        .filter(|s| seen.insert(*s))
        .collect()
}

/// Labels on one longest common subsequence of `a` and `b`.
fn lcs<'a>(a: &[&'a str], b: &[&str]) -> HashSet<&'a str> {
    let (n, m) = (a.len(), b.len());
    // table[i][j] = LCS length of a[i..] and b[j..]
    let mut table = vec![vec![0usize; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            table[i][j] = if a[i] == b[j] {
                table[i + 1][j + 1] + 1
            } else {
                table[i + 1][j].max(table[i][j + 1])
            };
        }
    }
    let mut out = HashSet::new();
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if a[i] == b[j] {
            out.insert(a[i]);
            i += 1;
            j += 1;
        } else if table[i + 1][j] >= table[i][j + 1] {
            i += 1;
        } else {
            j += 1;
        }
    }
    out
}

/// Apply `edits` to a label list the way the Dock would.
#[cfg(test)]
fn simulate(live: &[String], edits: &[DockEdit]) -> Vec<String> {
    let mut dock = dedup(live)
        .into_iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    for edit in edits {
        let (label, after) = match edit {
            DockEdit::Remove { label } => {
                dock.retain(|x| x != label);
                continue;
            }
            DockEdit::Add { label, after } | DockEdit::Move { label, after } => (label, after),
        };
        dock.retain(|x| x != label);
        let at = after
            .as_deref()
            .and_then(|a| dock.iter().position(|x| x == a))
            .map_or(0, |i| i + 1);
        dock.insert(at, label.clone());
    }
    dock
}
