//! Application layer: the process-wide services handed to the rest of the
//! payment application.
//!
//! `AccountRegistry` routes balance updates to the accounter bound to an asset
//! id; `OrderIdGenerator` issues order ids. The two share no state.

pub mod order_id;
pub mod registry;
