//! Domain layer: the accounter capability, balances and order id values.

pub mod account;
pub mod order_id;
pub mod ports;
