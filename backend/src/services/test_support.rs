//! In-memory port doubles for service tests, including failure injection
//! for the compensation paths.

use std::collections::HashSet;
use std::sync::Mutex;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use uuid::Uuid;

use crate::models::{
    Attraction, AttractionFlags, AttractionOutcome, AttractionRatings, DateEntry, DateEntryUpdate,
    DateStatus, NewTransaction, Transaction,
};
use crate::ports::{AttractionStore, DateStore, LedgerStore, NotificationPort, UserDirectory};

// ---------------------------------------------------------------------------
// Ledger store
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MemLedgerInner {
    transactions: Vec<Transaction>,
    next_id: i64,
    appends_seen: u32,
    fail_users: HashSet<String>,
    fail_after: Option<u32>,
}

#[derive(Default)]
pub struct MemLedgerStore {
    inner: Mutex<MemLedgerInner>,
}

impl MemLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every append for this user fails from now on.
    pub fn fail_appends_for(&self, user_id: &str) {
        self.inner
            .lock()
            .unwrap()
            .fail_users
            .insert(user_id.to_string());
    }

    /// The first `count` appends succeed, every later one fails. Lets a test
    /// accept a charge and then break the compensating refund.
    pub fn fail_appends_after(&self, count: u32) {
        self.inner.lock().unwrap().fail_after = Some(count);
    }

    pub fn sum(&self, user_id: &str) -> i64 {
        self.inner
            .lock()
            .unwrap()
            .transactions
            .iter()
            .filter(|t| t.user_id == user_id)
            .map(|t| t.token_amount)
            .sum()
    }

    pub fn transaction_count(&self, user_id: &str) -> usize {
        self.inner
            .lock()
            .unwrap()
            .transactions
            .iter()
            .filter(|t| t.user_id == user_id)
            .count()
    }

    pub fn all_for(&self, user_id: &str) -> Vec<Transaction> {
        self.inner
            .lock()
            .unwrap()
            .transactions
            .iter()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl LedgerStore for MemLedgerStore {
    async fn append(&self, tx: NewTransaction) -> Result<Transaction> {
        let mut inner = self.inner.lock().unwrap();
        inner.appends_seen += 1;

        if inner.fail_users.contains(&tx.user_id) {
            return Err(anyhow!("ledger store unavailable for {}", tx.user_id));
        }
        if let Some(limit) = inner.fail_after {
            if inner.appends_seen > limit {
                return Err(anyhow!("ledger store unavailable"));
            }
        }

        inner.next_id += 1;
        let created = Transaction {
            id: inner.next_id,
            user_id: tx.user_id,
            transaction_type: tx.transaction_type,
            token_amount: tx.token_amount,
            description: tx.description,
            related_entity_id: tx.related_entity_id,
            related_entity_type: tx.related_entity_type,
            created_at: Utc::now(),
        };
        inner.transactions.push(created.clone());
        Ok(created)
    }

    async fn sum_by_user(&self, user_id: &str) -> Result<i64> {
        Ok(self.sum(user_id))
    }

    async fn list_by_user(&self, user_id: &str) -> Result<Vec<Transaction>> {
        let mut txs = self.all_for(user_id);
        txs.reverse();
        Ok(txs)
    }
}

// ---------------------------------------------------------------------------
// Attraction store
// ---------------------------------------------------------------------------

#[derive(Default)]
struct MemAttractionInner {
    attractions: Vec<Attraction>,
    fail_create: bool,
}

#[derive(Default)]
pub struct MemAttractionStore {
    inner: Mutex<MemAttractionInner>,
}

impl MemAttractionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_next_create(&self) {
        self.inner.lock().unwrap().fail_create = true;
    }

    pub fn record(&self, user_from: &str, user_to: &str, date: NaiveDate) -> Option<Attraction> {
        self.inner
            .lock()
            .unwrap()
            .attractions
            .iter()
            .find(|a| a.user_from == user_from && a.user_to == user_to && a.date == date)
            .cloned()
    }
}

#[async_trait]
impl AttractionStore for MemAttractionStore {
    async fn get(
        &self,
        user_from: &str,
        user_to: &str,
        date: NaiveDate,
    ) -> Result<Option<Attraction>> {
        Ok(self.record(user_from, user_to, date))
    }

    async fn create(
        &self,
        user_from: &str,
        user_to: &str,
        date: NaiveDate,
        ratings: AttractionRatings,
        flags: AttractionFlags,
    ) -> Result<Attraction> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_create {
            inner.fail_create = false;
            return Err(anyhow!("attraction store unavailable"));
        }

        let now = Utc::now();
        let attraction = Attraction {
            id: Uuid::new_v4(),
            user_from: user_from.to_string(),
            user_to: user_to.to_string(),
            date,
            romantic_rating: ratings.romantic,
            sexual_rating: ratings.sexual,
            friendship_rating: ratings.friendship,
            long_term_potential: flags.long_term_potential,
            intellectual: flags.intellectual,
            emotional: flags.emotional,
            result: None,
            first_message_rights: None,
            created_at: now,
            updated_at: now,
        };
        inner.attractions.push(attraction.clone());
        Ok(attraction)
    }

    async fn update_ratings(
        &self,
        id: Uuid,
        ratings: AttractionRatings,
        flags: AttractionFlags,
    ) -> Result<Option<Attraction>> {
        let mut inner = self.inner.lock().unwrap();
        let Some(attraction) = inner.attractions.iter_mut().find(|a| a.id == id) else {
            return Ok(None);
        };
        attraction.romantic_rating = ratings.romantic;
        attraction.sexual_rating = ratings.sexual;
        attraction.friendship_rating = ratings.friendship;
        attraction.long_term_potential = flags.long_term_potential;
        attraction.intellectual = flags.intellectual;
        attraction.emotional = flags.emotional;
        attraction.updated_at = Utc::now();
        Ok(Some(attraction.clone()))
    }

    async fn set_outcome(&self, id: Uuid, outcome: AttractionOutcome) -> Result<Option<Attraction>> {
        let mut inner = self.inner.lock().unwrap();
        let Some(attraction) = inner.attractions.iter_mut().find(|a| a.id == id) else {
            return Ok(None);
        };
        attraction.result = outcome.result;
        attraction.first_message_rights = outcome.first_message_rights;
        attraction.updated_at = Utc::now();
        Ok(Some(attraction.clone()))
    }

    async fn list_between(&self, user_from: &str, user_to: &str) -> Result<Vec<Attraction>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .attractions
            .iter()
            .filter(|a| a.user_from == user_from && a.user_to == user_to)
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Date store
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemDateStore {
    entries: Mutex<Vec<DateEntry>>,
}

impl MemDateStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DateStore for MemDateStore {
    async fn get(&self, id: Uuid) -> Result<Option<DateEntry>> {
        Ok(self
            .entries
            .lock()
            .unwrap()
            .iter()
            .find(|e| e.id == id)
            .cloned())
    }

    async fn create(&self, user_from: &str, user_to: &str, date: NaiveDate) -> Result<DateEntry> {
        let now = Utc::now();
        let entry = DateEntry {
            id: Uuid::new_v4(),
            user_from: user_from.to_string(),
            user_to: user_to.to_string(),
            date,
            time: None,
            user_from_approved: true,
            user_to_approved: false,
            location_metadata: None,
            status: DateStatus::Unscheduled,
            created_at: now,
            updated_at: now,
        };
        self.entries.lock().unwrap().push(entry.clone());
        Ok(entry)
    }

    async fn update(
        &self,
        id: Uuid,
        update: &DateEntryUpdate,
        status: DateStatus,
    ) -> Result<Option<DateEntry>> {
        let mut entries = self.entries.lock().unwrap();
        let Some(entry) = entries.iter_mut().find(|e| e.id == id) else {
            return Ok(None);
        };
        if let Some(time) = &update.time {
            entry.time = Some(time.clone());
        }
        if let Some(location) = &update.location_metadata {
            entry.location_metadata = Some(location.clone());
        }
        if let Some(approved) = update.user_from_approved {
            entry.user_from_approved = approved;
        }
        if let Some(approved) = update.user_to_approved {
            entry.user_to_approved = approved;
        }
        entry.status = status;
        entry.updated_at = Utc::now();
        Ok(Some(entry.clone()))
    }
}

// ---------------------------------------------------------------------------
// User directory and notifications
// ---------------------------------------------------------------------------

pub struct MemUserDirectory {
    user_ids: Vec<String>,
}

impl MemUserDirectory {
    pub fn new(user_ids: Vec<String>) -> Self {
        Self { user_ids }
    }
}

#[async_trait]
impl UserDirectory for MemUserDirectory {
    async fn list_all_user_ids(&self) -> Result<Vec<String>> {
        Ok(self.user_ids.clone())
    }
}

#[derive(Default)]
pub struct MemNotifier {
    sent: Mutex<Vec<(String, String)>>,
    fail: Mutex<bool>,
}

impl MemNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_sends(&self) {
        *self.fail.lock().unwrap() = true;
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl NotificationPort for MemNotifier {
    async fn send_match(&self, user_a: &str, user_b: &str) -> Result<()> {
        if *self.fail.lock().unwrap() {
            return Err(anyhow!("push gateway unreachable"));
        }
        self.sent
            .lock()
            .unwrap()
            .push((user_a.to_string(), user_b.to_string()));
        Ok(())
    }
}
