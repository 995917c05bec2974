//! Ordering of way-node references within one way version

use std::cmp::Ordering;

use crate::model::DbWayNode;

/// Orders the node references of a single way version by sequence number.
///
/// Only meaningful for rows sharing the same way id and version. Duplicate
/// sequence numbers compare equal and keep no particular order.
pub fn member_order(a: &DbWayNode, b: &DbWayNode) -> Ordering {
    a.sequence_id.cmp(&b.sequence_id)
}
