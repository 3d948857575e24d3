use crate::domain::order_id::{OrderId, TimeZone};
use crate::error::Result;
use chrono::Utc;
use parking_lot::Mutex;
use rand::Rng;

/// Exclusive upper bound of the salt; keeps it at nine digits.
pub const SALT_BOUND: u32 = 1_000_000_000;

/// Produces 32-digit, time-prefixed, salted order ids.
///
/// Uniqueness within one generator is guaranteed until the salt wraps and is
/// re-seeded; across processes it rests on independent random seeds. Share a
/// single generator per process.
///
/// The time zone can only be changed through `&mut self`, i.e. while
/// configuring the generator before it is shared.
#[derive(Debug)]
pub struct OrderIdGenerator {
    time_zone: TimeZone,
    salt: Mutex<u32>,
}

impl OrderIdGenerator {
    /// Creates a UTC generator with a randomly seeded salt.
    pub fn new() -> Self {
        Self::with_salt(random_salt())
    }

    /// Creates a generator whose salt starts at `seed` (reduced into range).
    /// The first id carries `seed + 1`.
    pub fn with_salt(seed: u32) -> Self {
        Self {
            time_zone: TimeZone::utc(),
            salt: Mutex::new(seed % SALT_BOUND),
        }
    }

    pub fn with_time_zone(mut self, time_zone: TimeZone) -> Self {
        self.time_zone = time_zone;
        self
    }

    /// Switches the zone used for the timestamp part of later ids.
    ///
    /// Fails with [`OpayError::InvalidTimeZone`](crate::error::OpayError::InvalidTimeZone)
    /// when `hour_offset` is 24 or more hours either side of UTC, which a fixed
    /// offset cannot represent; the current zone is kept in that case.
    pub fn set_time_zone(&mut self, name: &str, hour_offset: i32) -> Result<()> {
        self.time_zone = TimeZone::fixed(name, hour_offset)?;
        tracing::debug!(
            time_zone = name,
            hour_offset,
            "order id time zone configured"
        );
        Ok(())
    }

    pub fn time_zone(&self) -> &TimeZone {
        &self.time_zone
    }

    pub fn generate_id(&self) -> String {
        self.next_order_id().into_string()
    }

    pub fn next_order_id(&self) -> OrderId {
        let (at, salt) = {
            let mut salt = self.salt.lock();
            let at = Utc::now().with_timezone(&self.time_zone.offset());
            *salt = advance(*salt);
            (at, *salt)
        };
        OrderId::compose(at, salt)
    }
}

impl Default for OrderIdGenerator {
    fn default() -> Self {
        Self::new()
    }
}

fn random_salt() -> u32 {
    rand::thread_rng().gen_range(0..SALT_BOUND)
}

fn advance(salt: u32) -> u32 {
    let next = salt + 1;
    if next < SALT_BOUND {
        next
    } else {
        let reseeded = random_salt();
        tracing::debug!(salt = reseeded, "order id salt exhausted, re-seeded");
        reseeded
    }
}
