//! The discrete-event map/reduce simulator core (spec.md §4). Everything in
//! this module is deterministic and synchronous: no tokio, no threads, no
//! wall-clock reads. See `controller.rs` for the event loop that ties the
//! pieces below together.

pub mod controller;
pub mod executor;
pub mod host;
pub mod memory;
pub mod message;
pub mod rng;
pub mod switch;
pub mod time;

pub use controller::{QueueSample, RunResult, SimulationController};
pub use executor::{Event, EventType, Scheduler};
pub use host::{Host, HostCounters};
pub use memory::{classify_tier, fetch_delay, placement_delay, AccessOrder, NicType, Tier};
pub use message::{HostId, MapMessage, Message, PendingMapState, ReduceMessage, ROOT_SENTINEL};
pub use rng::DeterministicRng;
pub use switch::Switch;
pub use time::{Duration, VirtualTime};
