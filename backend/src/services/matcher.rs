use std::cmp::Ordering;
use std::sync::Arc;

use chrono::NaiveDate;

use crate::constants::{ATTRACTION_TOKEN_COST_PER_POINT, is_valid_date_format, is_valid_rating};
use crate::error::{CoreError, CoreResult};
use crate::models::{Attraction, AttractionFlags, AttractionOutcome, AttractionRatings};
use crate::ports::{AttractionStore, NotificationPort};
use crate::services::TokenLedger;

/// Decides whether two reciprocal records form a match. Both sides are
/// known to exist when this runs.
pub type MatchPredicate = fn(&Attraction, &Attraction) -> bool;

/// Decides first-message rights for the acting side of a matched pair:
/// `Some(true)` means the acting side sends first, `Some(false)` the
/// counterpart, `None` leaves the rights unassigned on both records.
pub type FirstMessagePolicy = fn(&Attraction, &Attraction) -> Option<bool>;

/// Any reciprocal expression of interest on the same date is a match,
/// regardless of rating magnitude. Deliberately not a threshold comparison.
pub fn any_reciprocal(_acting: &Attraction, _counterpart: &Attraction) -> bool {
    true
}

/// The side that expressed less total interest gets to send the first
/// message; an exact tie assigns rights to neither side.
pub fn lower_total_sends_first(acting: &Attraction, counterpart: &Attraction) -> Option<bool> {
    match acting.total_interest().cmp(&counterpart.total_interest()) {
        Ordering::Less => Some(true),
        Ordering::Greater => Some(false),
        Ordering::Equal => None,
    }
}

/// Named match policies. Both rules were reconstructed from the observed
/// product behavior, so they are injected rather than hard-coded: swapping
/// a rule never touches the upsert flow.
#[derive(Clone, Copy)]
pub struct MatchRules {
    pub is_match: MatchPredicate,
    pub first_message_rights: FirstMessagePolicy,
}

impl Default for MatchRules {
    fn default() -> Self {
        Self {
            is_match: any_reciprocal,
            first_message_rights: lower_total_sends_first,
        }
    }
}

/// Final state of an upsert: the caller's own directed record plus whether
/// this submission produced (or re-confirmed) a mutual match.
#[derive(Debug, Clone)]
pub struct UpsertOutcome {
    pub attraction: Attraction,
    pub is_match: bool,
    pub created: bool,
}

/// Turns a one-sided expression of interest into a persisted, possibly
/// matched pair of directed records, charging tokens exactly once per newly
/// created record.
pub struct AttractionMatcher {
    attractions: Arc<dyn AttractionStore>,
    ledger: Arc<TokenLedger>,
    notifier: Arc<dyn NotificationPort>,
    rules: MatchRules,
}

impl AttractionMatcher {
    pub fn new(
        attractions: Arc<dyn AttractionStore>,
        ledger: Arc<TokenLedger>,
        notifier: Arc<dyn NotificationPort>,
    ) -> Self {
        Self::with_rules(attractions, ledger, notifier, MatchRules::default())
    }

    pub fn with_rules(
        attractions: Arc<dyn AttractionStore>,
        ledger: Arc<TokenLedger>,
        notifier: Arc<dyn NotificationPort>,
        rules: MatchRules,
    ) -> Self {
        Self {
            attractions,
            ledger,
            notifier,
            rules,
        }
    }

    /// Creates or updates the directed record (user_from → user_to, date),
    /// then recomputes the match outcome for the pair.
    ///
    /// New records are charged `sum(ratings) * ATTRACTION_TOKEN_COST_PER_POINT`
    /// tokens up front; updates are free. When the charge lands but the
    /// record write fails, a compensating refund is issued; if that refund
    /// fails too there is nothing left to do automatically, so the condition
    /// is logged for operator reconciliation and surfaced as `Critical`.
    pub async fn upsert(
        &self,
        user_from: &str,
        user_to: &str,
        date: &str,
        ratings: AttractionRatings,
        flags: AttractionFlags,
    ) -> CoreResult<UpsertOutcome> {
        let date = validate_request(user_from, user_to, date, ratings)?;

        let existing = self.attractions.get(user_from, user_to, date).await?;

        let (mut attraction, created) = match existing {
            Some(existing) => {
                // Overwrite ratings and flags only. No charge on updates, no
                // matter how the ratings changed.
                let updated = self
                    .attractions
                    .update_ratings(existing.id, ratings, flags)
                    .await?
                    .ok_or_else(|| {
                        anyhow::anyhow!("attraction {} vanished during update", existing.id)
                    })?;
                tracing::debug!(user_from, user_to, %date, "updated existing attraction");
                (updated, false)
            }
            None => {
                if ratings.total() <= 0 {
                    return Err(CoreError::validation(
                        "For a new attraction, at least one rating must be greater than 0.",
                    ));
                }
                let created = self
                    .charge_and_create(user_from, user_to, date, ratings, flags)
                    .await?;
                (created, true)
            }
        };

        // The acting record is durable; now look for the counter-attraction.
        let counterpart = self.attractions.get(user_to, user_from, date).await?;

        let is_match = match counterpart {
            Some(counterpart) => {
                let is_match = (self.rules.is_match)(&attraction, &counterpart);
                let acting_rights = if is_match {
                    (self.rules.first_message_rights)(&attraction, &counterpart)
                } else {
                    None
                };

                // Two separate writes, not wrapped in a transaction; a crash
                // between them leaves the pair asymmetric until the next
                // upsert recomputes it.
                self.attractions
                    .set_outcome(
                        counterpart.id,
                        AttractionOutcome {
                            result: Some(is_match),
                            first_message_rights: acting_rights.map(|r| !r),
                        },
                    )
                    .await?;
                if let Some(updated) = self
                    .attractions
                    .set_outcome(
                        attraction.id,
                        AttractionOutcome {
                            result: Some(is_match),
                            first_message_rights: acting_rights,
                        },
                    )
                    .await?
                {
                    attraction = updated;
                }

                tracing::info!(user_from, user_to, %date, is_match, "reciprocal attraction found");
                is_match
            }
            None => {
                if let Some(updated) = self
                    .attractions
                    .set_outcome(
                        attraction.id,
                        AttractionOutcome {
                            result: Some(false),
                            first_message_rights: None,
                        },
                    )
                    .await?
                {
                    attraction = updated;
                }
                false
            }
        };

        if is_match {
            // Fire-and-forget: a delivery failure never rolls back the match.
            if let Err(err) = self.notifier.send_match(user_from, user_to).await {
                tracing::warn!(user_from, user_to, error = %err, "match notification failed");
            }
        }

        Ok(UpsertOutcome {
            attraction,
            is_match,
            created,
        })
    }

    async fn charge_and_create(
        &self,
        user_from: &str,
        user_to: &str,
        date: NaiveDate,
        ratings: AttractionRatings,
        flags: AttractionFlags,
    ) -> CoreResult<Attraction> {
        let cost = ratings.total() * ATTRACTION_TOKEN_COST_PER_POINT;
        let label = attraction_label(ratings.romantic, ratings.sexual, ratings.friendship);

        // InsufficientBalance aborts here with nothing written anywhere.
        self.ledger
            .spend(
                user_from,
                cost,
                &format!("Attraction ({label}) to {user_to} on {date}"),
            )
            .await?;

        match self
            .attractions
            .create(user_from, user_to, date, ratings, flags)
            .await
        {
            Ok(created) => {
                tracing::debug!(user_from, user_to, %date, cost, "created new attraction");
                Ok(created)
            }
            Err(create_err) => {
                tracing::error!(
                    user_from, user_to, %date, cost, error = %create_err,
                    "attraction creation failed after tokens were spent; refunding"
                );
                match self
                    .ledger
                    .grant(
                        user_from,
                        cost,
                        &format!("Refund: Attraction creation failed for {user_to} on {date}"),
                    )
                    .await
                {
                    Ok(_) => Err(CoreError::Internal(create_err)),
                    Err(refund_err) => {
                        // Charged, not persisted, and the refund failed: the
                        // ledger is now wrong and only an operator can fix
                        // it. Never retried automatically; a retry could
                        // double-refund.
                        tracing::error!(
                            user_from, user_to, %date, cost, error = %refund_err,
                            "refund failed after attraction creation failure; \
                             manual reconciliation required"
                        );
                        Err(CoreError::Critical {
                            user_id: user_from.to_string(),
                            amount: cost,
                            context: format!(
                                "spent {cost} tokens for attraction to {user_to} on {date}, \
                                 creation and refund both failed"
                            ),
                        })
                    }
                }
            }
        }
    }

    /// Read path: the directed record for (user_from, user_to, date).
    pub async fn attraction(
        &self,
        user_from: &str,
        user_to: &str,
        date: &str,
    ) -> CoreResult<Attraction> {
        let date = parse_date(date)?;
        self.attractions
            .get(user_from, user_to, date)
            .await?
            .ok_or_else(|| CoreError::NotFound("attraction".to_string()))
    }

    /// All directed records from one user to another, newest date first.
    pub async fn attractions_between(
        &self,
        user_from: &str,
        user_to: &str,
    ) -> CoreResult<Vec<Attraction>> {
        Ok(self.attractions.list_between(user_from, user_to).await?)
    }
}

fn validate_request(
    user_from: &str,
    user_to: &str,
    date: &str,
    ratings: AttractionRatings,
) -> CoreResult<NaiveDate> {
    if user_from.is_empty() || user_to.is_empty() {
        return Err(CoreError::validation("userFrom and userTo are required."));
    }
    if user_from == user_to {
        return Err(CoreError::validation(
            "Cannot express attraction to oneself.",
        ));
    }
    if !is_valid_rating(ratings.romantic)
        || !is_valid_rating(ratings.sexual)
        || !is_valid_rating(ratings.friendship)
    {
        return Err(CoreError::validation(
            "Ratings must be numbers between 0 and 3.",
        ));
    }
    parse_date(date)
}

fn parse_date(date: &str) -> CoreResult<NaiveDate> {
    if !is_valid_date_format(date) {
        return Err(CoreError::validation("Date must be YYYY-MM-DD."));
    }
    date.parse::<NaiveDate>()
        .map_err(|_| CoreError::validation("Date must be a valid calendar date."))
}

/// Presentation label for a rating triple, shown to users and referenced in
/// ledger descriptions. Rule order matters.
pub fn attraction_label(romantic: i16, sexual: i16, friendship: i16) -> &'static str {
    let interest = romantic + sexual + friendship;
    if romantic == 0 && sexual == 0 && friendship == 0 {
        return "No Interest";
    }
    if romantic == 0 && friendship == 0 {
        return "Hook Up";
    }
    if romantic == 0 && sexual == 0 {
        return "Friends";
    }
    if friendship == 0 && sexual == 0 {
        return "Company";
    }
    if romantic == 0 {
        return "FWB";
    }
    if sexual == 0 {
        return "Platonic Dating";
    }
    if friendship == 0 {
        return "Lovers";
    }
    if interest < 5 {
        "We Could Meet"
    } else if interest == 5 {
        "I'm Into It"
    } else if interest == 6 {
        "Would Love to Meet"
    } else {
        "My Person"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::test_support::{MemAttractionStore, MemLedgerStore, MemNotifier, MemUserDirectory};

    struct Harness {
        ledger_store: Arc<MemLedgerStore>,
        attraction_store: Arc<MemAttractionStore>,
        notifier: Arc<MemNotifier>,
        ledger: Arc<TokenLedger>,
        matcher: AttractionMatcher,
    }

    fn harness() -> Harness {
        let ledger_store = Arc::new(MemLedgerStore::new());
        let attraction_store = Arc::new(MemAttractionStore::new());
        let notifier = Arc::new(MemNotifier::new());
        let ledger = Arc::new(TokenLedger::new(
            ledger_store.clone(),
            Arc::new(MemUserDirectory::new(vec![])),
        ));
        let matcher = AttractionMatcher::new(
            attraction_store.clone(),
            ledger.clone(),
            notifier.clone(),
        );
        Harness {
            ledger_store,
            attraction_store,
            notifier,
            ledger,
            matcher,
        }
    }

    const DATE: &str = "2024-05-01";

    #[tokio::test]
    async fn new_attraction_charges_cost_and_stays_unmatched() {
        let h = harness();
        h.ledger.grant("alice", 10, "seed").await.unwrap();

        let outcome = h
            .matcher
            .upsert("alice", "bob", DATE, AttractionRatings::new(2, 1, 0), AttractionFlags::default())
            .await
            .unwrap();

        assert!(outcome.created);
        assert!(!outcome.is_match);
        assert_eq!(outcome.attraction.result, Some(false));
        assert_eq!(outcome.attraction.first_message_rights, None);
        assert_eq!(h.ledger.balance("alice").await.unwrap(), 7);
        assert!(h.notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn reciprocal_attraction_matches_and_assigns_rights() {
        let h = harness();
        h.ledger.grant("alice", 10, "seed").await.unwrap();
        h.ledger.grant("bob", 10, "seed").await.unwrap();

        h.matcher
            .upsert("alice", "bob", DATE, AttractionRatings::new(2, 1, 0), AttractionFlags::default())
            .await
            .unwrap();
        let outcome = h
            .matcher
            .upsert("bob", "alice", DATE, AttractionRatings::new(1, 0, 0), AttractionFlags::default())
            .await
            .unwrap();

        assert!(outcome.is_match);
        assert_eq!(h.ledger.balance("bob").await.unwrap(), 9);

        let date = DATE.parse().unwrap();
        let alice_record = h.attraction_store.record("alice", "bob", date).unwrap();
        let bob_record = h.attraction_store.record("bob", "alice", date).unwrap();

        assert_eq!(alice_record.result, Some(true));
        assert_eq!(bob_record.result, Some(true));
        // Bob expressed less total interest, so he sends first.
        assert_eq!(bob_record.first_message_rights, Some(true));
        assert_eq!(alice_record.first_message_rights, Some(false));

        assert_eq!(h.notifier.sent(), vec![("bob".to_string(), "alice".to_string())]);
    }

    #[tokio::test]
    async fn equal_interest_scores_leave_rights_unassigned() {
        let h = harness();
        h.ledger.grant("alice", 10, "seed").await.unwrap();
        h.ledger.grant("bob", 10, "seed").await.unwrap();

        h.matcher
            .upsert("alice", "bob", DATE, AttractionRatings::new(1, 1, 1), AttractionFlags::default())
            .await
            .unwrap();
        let outcome = h
            .matcher
            .upsert("bob", "alice", DATE, AttractionRatings::new(3, 0, 0), AttractionFlags::default())
            .await
            .unwrap();

        assert!(outcome.is_match);

        let date = DATE.parse().unwrap();
        let alice_record = h.attraction_store.record("alice", "bob", date).unwrap();
        let bob_record = h.attraction_store.record("bob", "alice", date).unwrap();
        assert_eq!(alice_record.first_message_rights, None);
        assert_eq!(bob_record.first_message_rights, None);
        assert_eq!(alice_record.result, Some(true));
        assert_eq!(bob_record.result, Some(true));
    }

    #[tokio::test]
    async fn updating_an_existing_attraction_never_charges() {
        let h = harness();
        h.ledger.grant("alice", 10, "seed").await.unwrap();

        h.matcher
            .upsert("alice", "bob", DATE, AttractionRatings::new(2, 1, 0), AttractionFlags::default())
            .await
            .unwrap();
        assert_eq!(h.ledger.balance("alice").await.unwrap(), 7);

        let outcome = h
            .matcher
            .upsert("alice", "bob", DATE, AttractionRatings::new(3, 3, 3), AttractionFlags::default())
            .await
            .unwrap();

        assert!(!outcome.created);
        assert_eq!(outcome.attraction.romantic_rating, 3);
        assert_eq!(h.ledger.balance("alice").await.unwrap(), 7);
    }

    #[tokio::test]
    async fn insufficient_balance_aborts_before_any_write() {
        let h = harness();

        let err = h
            .matcher
            .upsert("alice", "bob", DATE, AttractionRatings::new(1, 1, 0), AttractionFlags::default())
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::InsufficientBalance { .. }));
        assert!(h.attraction_store.record("alice", "bob", DATE.parse().unwrap()).is_none());
        assert_eq!(h.ledger.balance("alice").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn failed_creation_refunds_the_charge() {
        let h = harness();
        h.ledger.grant("alice", 10, "seed").await.unwrap();
        h.attraction_store.fail_next_create();

        let err = h
            .matcher
            .upsert("alice", "bob", DATE, AttractionRatings::new(2, 0, 1), AttractionFlags::default())
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Internal(_)));
        assert_eq!(h.ledger.balance("alice").await.unwrap(), 10);

        // seed + deduction + refund
        let txs = h.ledger_store.all_for("alice");
        assert_eq!(txs.len(), 3);
        assert_eq!(txs[1].token_amount, -3);
        assert_eq!(txs[2].token_amount, 3);
        assert!(txs[2].description.starts_with("Refund:"));
    }

    #[tokio::test]
    async fn failed_refund_escalates_to_critical() {
        let h = harness();
        h.ledger.grant("alice", 10, "seed").await.unwrap();
        h.attraction_store.fail_next_create();
        // Seed and spend succeed, the refund append fails.
        h.ledger_store.fail_appends_after(2);

        let err = h
            .matcher
            .upsert("alice", "bob", DATE, AttractionRatings::new(2, 0, 1), AttractionFlags::default())
            .await
            .unwrap_err();

        match err {
            CoreError::Critical { user_id, amount, .. } => {
                assert_eq!(user_id, "alice");
                assert_eq!(amount, 3);
            }
            other => panic!("expected Critical, got {other:?}"),
        }
        // The charge stuck: tokens are gone with no record behind them.
        assert_eq!(h.ledger.balance("alice").await.unwrap(), 7);
    }

    #[tokio::test]
    async fn notification_failure_does_not_fail_the_match() {
        let h = harness();
        h.ledger.grant("alice", 10, "seed").await.unwrap();
        h.ledger.grant("bob", 10, "seed").await.unwrap();
        h.notifier.fail_sends();

        h.matcher
            .upsert("alice", "bob", DATE, AttractionRatings::new(1, 0, 0), AttractionFlags::default())
            .await
            .unwrap();
        let outcome = h
            .matcher
            .upsert("bob", "alice", DATE, AttractionRatings::new(0, 0, 1), AttractionFlags::default())
            .await
            .unwrap();

        assert!(outcome.is_match);
        assert_eq!(outcome.attraction.result, Some(true));
    }

    #[tokio::test]
    async fn self_attraction_and_bad_ratings_are_rejected() {
        let h = harness();

        let err = h
            .matcher
            .upsert("alice", "alice", DATE, AttractionRatings::new(1, 0, 0), AttractionFlags::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let err = h
            .matcher
            .upsert("alice", "bob", DATE, AttractionRatings::new(4, 0, 0), AttractionFlags::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));

        let err = h
            .matcher
            .upsert("alice", "bob", "05/01/2024", AttractionRatings::new(1, 0, 0), AttractionFlags::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[tokio::test]
    async fn new_attraction_requires_some_interest() {
        let h = harness();
        h.ledger.grant("alice", 10, "seed").await.unwrap();

        let err = h
            .matcher
            .upsert("alice", "bob", DATE, AttractionRatings::new(0, 0, 0), AttractionFlags::default())
            .await
            .unwrap_err();

        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(h.ledger.balance("alice").await.unwrap(), 10);
    }

    #[tokio::test]
    async fn update_recomputes_match_outcome_for_both_sides() {
        let h = harness();
        h.ledger.grant("alice", 10, "seed").await.unwrap();
        h.ledger.grant("bob", 10, "seed").await.unwrap();

        h.matcher
            .upsert("alice", "bob", DATE, AttractionRatings::new(2, 0, 0), AttractionFlags::default())
            .await
            .unwrap();
        h.matcher
            .upsert("bob", "alice", DATE, AttractionRatings::new(2, 0, 0), AttractionFlags::default())
            .await
            .unwrap();

        // Tie so far. Alice raises her ratings via a free update; rights
        // should flip to bob on the recompute.
        let outcome = h
            .matcher
            .upsert("alice", "bob", DATE, AttractionRatings::new(3, 2, 0), AttractionFlags::default())
            .await
            .unwrap();

        assert!(outcome.is_match);
        let date = DATE.parse().unwrap();
        let alice_record = h.attraction_store.record("alice", "bob", date).unwrap();
        let bob_record = h.attraction_store.record("bob", "alice", date).unwrap();
        assert_eq!(alice_record.first_message_rights, Some(false));
        assert_eq!(bob_record.first_message_rights, Some(true));
        assert_eq!(h.ledger.balance("alice").await.unwrap(), 8);
    }

    #[test]
    fn attraction_labels_follow_priority_order() {
        assert_eq!(attraction_label(0, 0, 0), "No Interest");
        assert_eq!(attraction_label(0, 2, 0), "Hook Up");
        assert_eq!(attraction_label(0, 0, 3), "Friends");
        assert_eq!(attraction_label(2, 0, 0), "Company");
        assert_eq!(attraction_label(0, 1, 1), "FWB");
        assert_eq!(attraction_label(1, 0, 1), "Platonic Dating");
        assert_eq!(attraction_label(1, 1, 0), "Lovers");
        assert_eq!(attraction_label(1, 1, 1), "We Could Meet");
        assert_eq!(attraction_label(2, 2, 1), "I'm Into It");
        assert_eq!(attraction_label(2, 2, 2), "Would Love to Meet");
        assert_eq!(attraction_label(3, 3, 3), "My Person");
    }

    #[test]
    fn first_message_policy_prefers_lower_total() {
        fn record(r: i16, s: i16, f: i16) -> Attraction {
            let now = chrono::Utc::now();
            Attraction {
                id: uuid::Uuid::new_v4(),
                user_from: "a".into(),
                user_to: "b".into(),
                date: DATE.parse().unwrap(),
                romantic_rating: r,
                sexual_rating: s,
                friendship_rating: f,
                long_term_potential: false,
                intellectual: false,
                emotional: false,
                result: None,
                first_message_rights: None,
                created_at: now,
                updated_at: now,
            }
        }

        assert_eq!(lower_total_sends_first(&record(1, 0, 0), &record(2, 1, 0)), Some(true));
        assert_eq!(lower_total_sends_first(&record(2, 1, 0), &record(1, 0, 0)), Some(false));
        assert_eq!(lower_total_sends_first(&record(1, 1, 1), &record(3, 0, 0)), None);
    }
}
