//! Tree Lottery Protocol - Core types and message definitions
//!
//! Defines the two messages exchanged over a rooted spanning tree
//! (Announce going down, Reply going up), the final lottery ticket,
//! and the view of the topology that protocol instances consume.

pub mod constants;
pub mod error;
pub mod messages;
pub mod topology;
pub mod types;

pub use constants::*;
pub use error::*;
pub use messages::*;
pub use topology::*;
pub use types::*;
