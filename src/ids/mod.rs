//! Session identifiers
//!
//! Identifiers are human-readable and date-scoped:
//! `<PREFIX>_<DMmmYY>-<N>`, e.g. `sS_6Aug26-3`. The day of month is
//! unpadded, the month is a three-letter English abbreviation, and `N` is a
//! 1-based sequence number unique within the day.
//!
//! Two disjoint prefixes exist:
//! - `cS` - provisional ids the client generates optimistically at call
//!   start, sequenced by a locally persisted daily counter
//! - `sS` - durable ids the server allocates when the end-of-call webhook
//!   arrives, sequenced against the store
//!
//! The two namespaces are never reconciled: the end-of-call report carries
//! no client identifier to join on.

mod allocator;
mod provisional;

pub use allocator::{SessionIdAllocator, StoreAllocator};
pub use provisional::ProvisionalIdSource;

use chrono::{Datelike, Local, NaiveDate};

/// Prefix for client-generated provisional identifiers
pub const PROVISIONAL_PREFIX: &str = "cS";

/// Prefix for server-allocated durable identifiers
pub const DURABLE_PREFIX: &str = "sS";

const MONTHS: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

/// The day-scoped part of an identifier, e.g. `6Aug26`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatePrefix(String);

impl DatePrefix {
    /// Prefix for the current local date
    pub fn today() -> Self {
        Self::for_date(Local::now().date_naive())
    }

    pub fn for_date(date: NaiveDate) -> Self {
        let month = MONTHS[date.month0() as usize];
        DatePrefix(format!("{}{}{:02}", date.day(), month, date.year() % 100))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Compose a durable identifier from its parts
pub fn durable_id(prefix: &DatePrefix, n: u32) -> String {
    format!("{}_{}-{}", DURABLE_PREFIX, prefix.as_str(), n)
}

/// Compose a provisional identifier from its parts
pub fn provisional_id(prefix: &DatePrefix, n: u32) -> String {
    format!("{}_{}-{}", PROVISIONAL_PREFIX, prefix.as_str(), n)
}

/// Store-listing prefix covering every durable id for a given day
pub fn durable_scope(prefix: &DatePrefix) -> String {
    format!("{}_{}-", DURABLE_PREFIX, prefix.as_str())
}
