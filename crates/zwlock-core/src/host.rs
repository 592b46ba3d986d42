// ── Accessory host seam ──

use tracing::info;

use crate::model::{AccessoryRecord, NodeId};

/// The smart-home platform that owns accessory objects.
///
/// The engine decides *which* accessories exist and *what* their values
/// are; the host decides how they are persisted and surfaced. Calls are
/// made with no engine lock held and must not block for long.
pub trait AccessoryHost: Send + Sync + 'static {
    /// A new accessory was created for a discovered lock.
    fn register(&self, record: &AccessoryRecord);

    /// The accessory for `node_id` no longer has a lock behind it.
    fn unregister(&self, node_id: NodeId);

    /// Current values for an accessory.
    fn publish(&self, record: &AccessoryRecord);

    /// The user asked the accessory to identify itself.
    fn identify(&self, record: &AccessoryRecord) {
        info!(node_id = record.node_id, name = %record.display_name, "identified");
    }
}
