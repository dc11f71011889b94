//! Topic-based event bus for observer feeds.
//!
//! Replicated field updates and cosmetic notifications travel on separate
//! topics so presentation layers can subscribe only to what they render.

mod bus;

pub use bus::{Event, EventBus, Topic};
