pub mod attractions;
pub mod connection;
pub mod dates;
pub mod ledger;
pub mod migrations;
pub mod users;

pub use attractions::PgAttractionStore;
pub use connection::{DatabaseConfig, get_db_pool};
pub use dates::PgDateStore;
pub use ledger::PgLedgerStore;
pub use users::PgUserDirectory;
