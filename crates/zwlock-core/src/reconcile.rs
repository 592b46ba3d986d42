// ── Accessory reconciliation ──
//
// Diffs the accessories the host already knows about against the locks
// found on the gateway. The diff walks both sorted key sequences with a
// longest-common-subsequence table so the emitted additions and removals
// keep sequence order.

use tracing::{info, warn};

use crate::model::NodeId;

/// Keys to create and keys to drop, each in ascending order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Delta {
    pub added: Vec<NodeId>,
    pub removed: Vec<NodeId>,
}

impl Delta {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }

    /// Drop ignored nodes from the additions, logging each one.
    pub fn skip_ignored(&mut self, ignore: &[NodeId]) {
        self.added.retain(|node_id| {
            let ignored = ignore.contains(node_id);
            if ignored {
                info!(node_id, "skipping ignored lock");
            }
            !ignored
        });
    }
}

/// Compare existing accessory keys with discovered lock keys.
///
/// With `nuke` set the discovered side is treated as empty, so every
/// existing accessory is removed and nothing is added.
pub fn reconcile(existing: &[NodeId], discovered: &[NodeId], nuke: bool) -> Delta {
    let mut old = existing.to_vec();
    old.sort_unstable();
    old.dedup();

    let mut new = if nuke {
        warn!(
            accessories = old.len(),
            "nuke is set, removing every accessory"
        );
        Vec::new()
    } else {
        discovered.to_vec()
    };
    new.sort_unstable();
    new.dedup();

    diff(&old, &new)
}

/// Order-preserving sequence diff.
fn diff(old: &[NodeId], new: &[NodeId]) -> Delta {
    let (n, m) = (old.len(), new.len());

    // lcs[i][j] = LCS length of old[i..] and new[j..]
    let mut lcs = vec![vec![0usize; m + 1]; n + 1];
    for i in (0..n).rev() {
        for j in (0..m).rev() {
            lcs[i][j] = if old[i] == new[j] {
                lcs[i + 1][j + 1] + 1
            } else {
                lcs[i + 1][j].max(lcs[i][j + 1])
            };
        }
    }

    let mut delta = Delta::default();
    let (mut i, mut j) = (0, 0);
    while i < n && j < m {
        if old[i] == new[j] {
            i += 1;
            j += 1;
        } else if lcs[i + 1][j] >= lcs[i][j + 1] {
            delta.removed.push(old[i]);
            i += 1;
        } else {
            delta.added.push(new[j]);
            j += 1;
        }
    }
    delta.removed.extend_from_slice(&old[i..]);
    delta.added.extend_from_slice(&new[j..]);
    delta
}
