//! The discrete-event scheduler (spec.md §4.1): a single-threaded,
//! time-ordered priority queue of `(time, sequence, event)` triples. `now`
//! equals the time of the last-popped event; there is no wall-clock pacing.
//!
//! The "actor runtime" of spec.md §4.1 is realized as explicit state
//! machines (`Host`, `Switch`) driven directly by this loop rather than as
//! real coroutines — spec.md §9's Design Notes sanction this: "Reimplement
//! as explicit state machines driven by the event queue."

use super::message::{HostId, Message};
use super::time::{Duration, VirtualTime};
use std::cmp::Ordering;
use std::collections::BinaryHeap;

#[derive(Debug)]
pub enum EventType {
    /// Deliver `msg` into `host_id`'s queue. Always produced by a switch
    /// dispatch (including the initial root bootstrap, which is routed
    /// through the switch like any other message).
    Enqueue(Message),
    /// The in-flight fetch for `host_id` has finished; the host may now
    /// dispatch on the message's variant.
    FetchComplete,
    /// The in-flight map service for `host_id` has finished; the host may
    /// now expand or reply.
    ServiceComplete,
    /// Periodic progress log (observational only).
    ProgressTick,
    /// Periodic queue-occupancy sample.
    SampleTick,
}

pub struct Event {
    pub time: VirtualTime,
    pub seq: u64,
    pub host_id: Option<HostId>,
    pub event_type: EventType,
}

impl PartialEq for Event {
    fn eq(&self, other: &Self) -> bool {
        self.time == other.time && self.seq == other.seq
    }
}

impl Eq for Event {}

impl PartialOrd for Event {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Event {
    /// Reversed so that `BinaryHeap` (a max-heap) pops the smallest
    /// `(time, seq)` pair first: earlier time wins, and among events at the
    /// same time, the one inserted first wins (spec.md §4.1's FIFO tiebreak).
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .time
            .cmp(&self.time)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

pub struct Scheduler {
    now: VirtualTime,
    queue: BinaryHeap<Event>,
    next_seq: u64,
}

impl Scheduler {
    pub fn new() -> Self {
        Scheduler {
            now: VirtualTime::ZERO,
            queue: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    pub fn now(&self) -> VirtualTime {
        self.now
    }

    /// Insert `(now + delay, seq, event)`. `delay == 0` is legal and still
    /// preserves FIFO order relative to other zero-delay events scheduled
    /// earlier.
    pub fn schedule(&mut self, delay: Duration, host_id: Option<HostId>, event_type: EventType) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Event {
            time: self.now + delay,
            seq,
            host_id,
            event_type,
        });
    }

    /// Pop the next event and advance `now` to its time. `None` once the
    /// queue has drained.
    pub fn pop(&mut self) -> Option<Event> {
        let event = self.queue.pop()?;
        self.now = event.time;
        Some(event)
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}
