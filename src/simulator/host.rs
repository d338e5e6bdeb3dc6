//! Host state machine (spec.md §4.2). A host is idle, fetching the message
//! at the head of its queue, or servicing a map it has already fetched —
//! never more than one of these at a time, matching the single in-flight
//! request the original event-driven handler allowed per host.

use super::memory::{classify_tier, fetch_delay, AccessOrder, AccessTimeStore, Tier};
use super::message::{HostId, MapMessage, Message, PendingMapState};
use super::time::{Duration, VirtualTime};
use std::collections::{HashMap, VecDeque};

enum HostState {
    Idle,
    Fetching(Message),
    Servicing(MapMessage),
}

/// Per-host counters used to derive the result CSVs (spec.md §4.6).
#[derive(Debug, Default, Clone, Copy)]
pub struct HostCounters {
    pub messages_processed: u64,
    pub queue_wait_total_ns: u128,
    pub busy_time_ns: u128,
    pub reg_count: u64,
    pub llc_count: u64,
    pub mem_count: u64,
}

impl HostCounters {
    /// Fraction of the run this host spent servicing a map message.
    pub fn utilization(&self, completion_time: Duration) -> f64 {
        if completion_time.as_nanos() == 0 {
            return 0.0;
        }
        self.busy_time_ns as f64 / completion_time.as_nanos() as f64
    }

    /// Expected average queue size via Little's law: throughput * mean wait.
    pub fn expected_avg_queue_size(&self, completion_time: Duration) -> f64 {
        if self.messages_processed == 0 || completion_time.as_nanos() == 0 {
            return 0.0;
        }
        let throughput = self.messages_processed as f64 / completion_time.as_nanos() as f64;
        let avg_wait = self.queue_wait_total_ns as f64 / self.messages_processed as f64;
        throughput * avg_wait
    }
}

pub struct Host {
    pub id: HostId,
    queue: VecDeque<Message>,
    access_times: AccessTimeStore,
    pub pending: HashMap<u64, PendingMapState>,
    state: HostState,
    pub counters: HostCounters,
}

impl Host {
    pub fn new(id: HostId) -> Self {
        Host {
            id,
            queue: VecDeque::new(),
            access_times: AccessTimeStore::default(),
            pending: HashMap::new(),
            state: HostState::Idle,
            counters: HostCounters::default(),
        }
    }

    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, HostState::Idle)
    }

    /// Deliver a message routed here by the switch. Classifies the tier the
    /// message lands in from the queue depth *after* it is pushed, and
    /// records the fetch latency that applies once it reaches the head.
    pub fn enqueue(
        &mut self,
        mut msg: Message,
        now: VirtualTime,
        nic_buf_size: usize,
        llc_size: usize,
        reg_access_time: Duration,
        llc_access_time: Duration,
        mem_access_time: Duration,
    ) {
        msg.set_enqueue_time(now);
        self.queue.push_back(msg);
        let tier = classify_tier(self.queue.len(), nic_buf_size, llc_size);
        let delay = fetch_delay(tier, reg_access_time, llc_access_time, mem_access_time);
        self.access_times.push(delay);
        match tier {
            Tier::Reg => self.counters.reg_count += 1,
            Tier::Llc => self.counters.llc_count += 1,
            Tier::Mem => self.counters.mem_count += 1,
        }
    }

    /// If idle and non-empty, pop the head and begin its fetch. Returns the
    /// delay to wait before calling `complete_fetch`.
    pub fn start_fetch(&mut self, order: AccessOrder) -> Option<Duration> {
        if !self.is_idle() {
            return None;
        }
        let msg = self.queue.pop_front()?;
        let delay = self
            .access_times
            .pop(order)
            .expect("an access time was recorded for every enqueue");
        self.state = HostState::Fetching(msg);
        Some(delay)
    }

    /// Complete the in-flight fetch, recording queue-wait, and hand back the
    /// message for dispatch on its variant.
    pub fn complete_fetch(&mut self, now: VirtualTime) -> Message {
        let msg = match std::mem::replace(&mut self.state, HostState::Idle) {
            HostState::Fetching(msg) => msg,
            other => {
                self.state = other;
                panic!("complete_fetch called with no fetch in flight");
            }
        };
        let wait = now - msg.enqueue_time();
        self.counters.queue_wait_total_ns += wait.as_nanos() as u128;
        self.counters.messages_processed += 1;
        msg
    }

    /// Begin servicing a fetched map message.
    pub fn begin_service(&mut self, msg: MapMessage, service_time: Duration) {
        self.counters.busy_time_ns += service_time.as_nanos() as u128;
        self.state = HostState::Servicing(msg);
    }

    /// Complete the in-flight service, handing back the map for
    /// expansion/reply.
    pub fn complete_service(&mut self) -> MapMessage {
        match std::mem::replace(&mut self.state, HostState::Idle) {
            HostState::Servicing(msg) => msg,
            other => {
                self.state = other;
                panic!("complete_service called with no service in flight");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::message::MapMessage;

    fn map(id: u64) -> Message {
        Message::Map(MapMessage {
            id,
            max_depth: 3,
            current_depth: 0,
            source_host: None,
            source_msg_id: None,
            enqueue_time: VirtualTime::ZERO,
        })
    }

    #[test]
    fn idle_host_fetches_immediately_on_enqueue() {
        let mut host = Host::new(HostId(0));
        assert!(host.is_idle());
        host.enqueue(
            map(1),
            VirtualTime::from_nanos(100),
            10,
            10,
            Duration::ZERO,
            Duration::from_nanos(5),
            Duration::from_nanos(50),
        );
        let delay = host.start_fetch(AccessOrder::Fifo).unwrap();
        assert_eq!(delay, Duration::ZERO);
    }

    #[test]
    fn queue_wait_measures_time_since_enqueue() {
        let mut host = Host::new(HostId(0));
        host.enqueue(
            map(1),
            VirtualTime::from_nanos(100),
            10,
            10,
            Duration::ZERO,
            Duration::from_nanos(5),
            Duration::from_nanos(50),
        );
        host.start_fetch(AccessOrder::Fifo).unwrap();
        let msg = host.complete_fetch(VirtualTime::from_nanos(150));
        assert_eq!(msg.id(), 1);
        assert_eq!(host.counters.queue_wait_total_ns, 50);
        assert_eq!(host.counters.messages_processed, 1);
    }

    #[test]
    fn second_message_cannot_fetch_while_busy() {
        let mut host = Host::new(HostId(0));
        host.enqueue(
            map(1),
            VirtualTime::ZERO,
            10,
            10,
            Duration::ZERO,
            Duration::ZERO,
            Duration::ZERO,
        );
        host.start_fetch(AccessOrder::Fifo).unwrap();
        host.enqueue(
            map(2),
            VirtualTime::ZERO,
            10,
            10,
            Duration::ZERO,
            Duration::ZERO,
            Duration::ZERO,
        );
        assert!(host.start_fetch(AccessOrder::Fifo).is_none());
    }
}
