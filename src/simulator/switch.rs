//! Switch dispatch (spec.md §4.3). The switch never blocks: every host
//! queue is unbounded, so a dispatch always succeeds and only ever adds
//! delay, never backpressure.

use super::executor::{EventType, Scheduler};
use super::memory::{placement_delay, NicType};
use super::message::{HostId, Message};
use super::time::Duration;

pub struct Switch {
    host_count: usize,
    net_delay: Duration,
    nic_type: NicType,
    reg_delay: Duration,
    llc_delay: Duration,
    mem_delay: Duration,
}

impl Switch {
    pub fn new(
        host_count: usize,
        net_delay: Duration,
        nic_type: NicType,
        reg_delay: Duration,
        llc_delay: Duration,
        mem_delay: Duration,
    ) -> Self {
        Switch {
            host_count,
            net_delay,
            nic_type,
            reg_delay,
            llc_delay,
            mem_delay,
        }
    }

    /// Map messages place deterministically by `id % host_count` (a
    /// non-cryptographic placement hash, matching the original's
    /// `msg.ID % len(self.hosts)`); reduce messages carry their destination
    /// explicitly.
    fn destination(&self, msg: &Message) -> HostId {
        match msg {
            Message::Map(m) => HostId(m.id as usize % self.host_count),
            Message::Reduce(r) => r.target_host,
        }
    }

    /// Schedule delivery of `msg` after the fabric delay plus the NIC's
    /// placement delay. Used for every map/reduce transmission, including
    /// the initial root bootstrap.
    pub fn dispatch(&self, scheduler: &mut Scheduler, msg: Message) {
        let dst = self.destination(&msg);
        let delay = self.net_delay
            + placement_delay(self.nic_type, self.reg_delay, self.llc_delay, self.mem_delay);
        scheduler.schedule(delay, Some(dst), EventType::Enqueue(msg));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulator::message::MapMessage;
    use crate::simulator::time::VirtualTime;

    fn switch() -> Switch {
        Switch::new(
            4,
            Duration::from_nanos(100),
            NicType::Reg,
            Duration::ZERO,
            Duration::from_nanos(10),
            Duration::from_nanos(100),
        )
    }

    #[test]
    fn map_destination_wraps_by_host_count() {
        let s = switch();
        let mut sched = Scheduler::new();
        for id in 0..5u64 {
            let msg = Message::Map(MapMessage {
                id,
                max_depth: 2,
                current_depth: 0,
                source_host: None,
                source_msg_id: None,
                enqueue_time: VirtualTime::ZERO,
            });
            s.dispatch(&mut sched, msg);
        }
        let mut dsts = Vec::new();
        while let Some(ev) = sched.pop() {
            dsts.push(ev.host_id.unwrap().0);
        }
        assert_eq!(dsts, vec![0, 1, 2, 3, 0]);
    }

    #[test]
    fn dispatch_adds_net_delay_plus_placement_delay() {
        let s = switch();
        let mut sched = Scheduler::new();
        let msg = Message::Map(MapMessage {
            id: 0,
            max_depth: 2,
            current_depth: 0,
            source_host: None,
            source_msg_id: None,
            enqueue_time: VirtualTime::ZERO,
        });
        s.dispatch(&mut sched, msg);
        let ev = sched.pop().unwrap();
        assert_eq!(ev.time, VirtualTime::from_nanos(100));
    }
}
