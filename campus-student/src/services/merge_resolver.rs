//! Batch merge resolution
//!
//! Merged batches share sessions and materials. Every read of class data
//! goes through [`resolve_group`] first and then queries all members.

use sqlx::SqlitePool;
use std::collections::BTreeSet;
use tracing::{debug, error};

use crate::db::merge_groups;

/// All batch ids taught together with `batch_id`, itself included
///
/// Fails open: a lookup error is logged and the batch is treated as not
/// merged, so trouble in merge data never blocks a batch's own content.
pub async fn resolve_group(pool: &SqlitePool, batch_id: &str) -> BTreeSet<String> {
    match merge_groups::group_members(pool, batch_id).await {
        Ok(members) => {
            let group = with_self(batch_id, members);
            if group.len() > 1 {
                debug!(batch_id, members = group.len(), "Resolved merge group");
            }
            group
        }
        Err(e) => {
            error!(batch_id, error = %e, "Merge group lookup failed, using batch alone");
            with_self(batch_id, Vec::new())
        }
    }
}

fn with_self(batch_id: &str, members: Vec<String>) -> BTreeSet<String> {
    let mut group: BTreeSet<String> = members.into_iter().collect();
    group.insert(batch_id.to_string());
    group
}
