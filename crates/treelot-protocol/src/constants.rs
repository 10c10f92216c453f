use std::ops::Range;

/// Name the lottery protocol is resolved under by the orchestration layer.
pub const PROTOCOL_NAME: &str = "Lottery";

/// Payload the root announces to the whole tree when a round starts.
pub const ANNOUNCE_GREETING: &str = "lottery round open";

/// Every node draws its candidate uniformly from this range.
pub const CANDIDATE_RANGE: Range<u32> = 0..100;
