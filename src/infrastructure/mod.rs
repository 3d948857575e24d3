//! Concrete collaborators: an in-memory ledger that can act as the
//! transaction context for accounters.

pub mod in_memory;
