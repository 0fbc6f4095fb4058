pub mod date_status;
pub mod ledger;
pub mod matcher;
pub mod notify;

pub use date_status::{DateScheduler, resolve_status};
pub use ledger::{ReplenishmentReport, TokenLedger};
pub use matcher::{AttractionMatcher, MatchRules, UpsertOutcome, attraction_label};
pub use notify::{LogOnlyNotifier, PushGatewayNotifier};

#[cfg(test)]
pub(crate) mod test_support;
