// ── Zone storage ──
//
// Plain, synchronous zone state. Sharing and change notification are
// layered on top by the dashboard's `watch` channel.

mod zone_store;

pub use zone_store::ZoneStore;
