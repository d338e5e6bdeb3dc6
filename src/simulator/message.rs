//! Message types exchanged between hosts and the switch. See spec.md §3.

use super::time::VirtualTime;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HostId(pub usize);

/// Reserved pending-map key for the synthetic "virtual root frame" planted
/// at host 0 before the root map is dispatched (see `controller.rs`). No
/// real map ever receives this id — `next_map_id` starts at 0 and counts up.
pub const ROOT_SENTINEL: u64 = u64::MAX;

/// A unit of work representing a subtree to be expanded at a host.
#[derive(Debug, Clone)]
pub struct MapMessage {
    pub id: u64,
    pub max_depth: u32,
    pub current_depth: u32,
    /// Absent iff this is the initial root map.
    pub source_host: Option<HostId>,
    pub source_msg_id: Option<u64>,
    pub enqueue_time: VirtualTime,
}

/// A reply carrying aggregation of a completed subtree back to its parent.
#[derive(Debug, Clone)]
pub struct ReduceMessage {
    pub id: u64,
    pub target_host: HostId,
    pub target_msg_id: u64,
    pub enqueue_time: VirtualTime,
}

#[derive(Debug, Clone)]
pub enum Message {
    Map(MapMessage),
    Reduce(ReduceMessage),
}

impl Message {
    pub fn id(&self) -> u64 {
        match self {
            Message::Map(m) => m.id,
            Message::Reduce(r) => r.id,
        }
    }

    pub fn set_enqueue_time(&mut self, time: VirtualTime) {
        match self {
            Message::Map(m) => m.enqueue_time = time,
            Message::Reduce(r) => r.enqueue_time = time,
        }
    }

    pub fn enqueue_time(&self) -> VirtualTime {
        match self {
            Message::Map(m) => m.enqueue_time,
            Message::Reduce(r) => r.enqueue_time,
        }
    }
}

/// Per-map bookkeeping a host retains between expanding a map and observing
/// all of its replies. Created on map expansion, destroyed once
/// `replies_received == fan_out`. Leaf maps never get an entry.
#[derive(Debug, Clone)]
pub struct PendingMapState {
    pub parent_host: Option<HostId>,
    pub parent_msg_id: Option<u64>,
    pub fan_out: u32,
    pub replies_received: u32,
}
