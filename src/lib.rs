//! Shared payment infrastructure: an asset-keyed registry of balance
//! accounters and a collision-resistant order id generator.

pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;

pub use application::order_id::OrderIdGenerator;
pub use application::registry::{AccountRegistry, DEFAULT_ASSET};
pub use domain::order_id::{OrderId, TimeZone};
pub use domain::ports::{Accounter, AccounterFn, BalanceSource, NoopAccounter};
pub use error::{OpayError, Result, UpdateError};
