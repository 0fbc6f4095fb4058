pub mod attractions;
pub mod date_entries;
pub mod transactions;

pub use attractions::{Attraction, AttractionFlags, AttractionOutcome, AttractionRatings};
pub use date_entries::{DateEntry, DateEntryUpdate, DateStatus};
pub use transactions::{NewTransaction, Transaction, TransactionType};
