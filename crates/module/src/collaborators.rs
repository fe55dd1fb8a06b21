//! Interfaces to the systems the escrow engine depends on but does not own.
//!
//! - [`DatabaseRegistry`]: database ownership and royalty rates
//! - [`HostListing`]: API endpoints advertised by staked hosts
//! - [`ValueTransfer`]: irrevocable, fire-and-forget payments
//!
//! [`Registry`] is the in-memory registry and host listing used by the mock
//! chain and the tests. [`PaymentLog`] records scheduled payments.

use std::collections::BTreeMap;

use escrow_types::{AccountId, Bips, DatabaseRecord, DbId, Manifest, Money, Payment};

/// Read access to registered databases.
pub trait DatabaseRegistry {
    fn exists(&self, db: DbId) -> bool;

    fn owner_of(&self, db: DbId) -> Option<&AccountId>;

    fn royalty_bips_of(&self, db: DbId) -> Option<Bips>;
}

/// Host endpoint listings per database.
pub trait HostListing {
    fn remove_listing(&mut self, db: DbId, host: &AccountId);
}

/// Executes payments decided by the engine.
///
/// Completion is never observed: a failed transfer does not roll back the
/// state change that scheduled it.
pub trait ValueTransfer {
    fn schedule_payment(&mut self, payment: Payment);
}

/// In-memory database registry and host listing.
#[derive(Clone, Debug, Default)]
pub struct Registry {
    next_id: DbId,
    databases: BTreeMap<DbId, DatabaseRecord>,
    endpoints: BTreeMap<DbId, BTreeMap<AccountId, String>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a database and return its id.
    pub fn register(&mut self, owner: AccountId, manifest: Manifest, storage_deposit: Money) -> DbId {
        let id = self.next_id;
        self.next_id += 1;
        self.databases.insert(
            id,
            DatabaseRecord {
                id,
                owner,
                manifest,
                storage_deposit,
            },
        );
        id
    }

    pub fn get(&self, db: DbId) -> Option<&DatabaseRecord> {
        self.databases.get(&db)
    }

    pub fn databases(&self) -> impl Iterator<Item = &DatabaseRecord> {
        self.databases.values()
    }

    pub fn len(&self) -> usize {
        self.databases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.databases.is_empty()
    }

    /// Insert or replace a host's endpoint.
    pub fn set_listing(&mut self, db: DbId, host: AccountId, uri: String) {
        self.endpoints.entry(db).or_default().insert(host, uri);
    }

    /// All endpoints advertised for a database, ordered by host.
    pub fn discover(&self, db: DbId) -> Vec<String> {
        self.endpoints
            .get(&db)
            .map(|hosts| hosts.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn listing_of(&self, db: DbId, host: &AccountId) -> Option<&str> {
        self.endpoints.get(&db)?.get(host).map(String::as_str)
    }
}

impl DatabaseRegistry for Registry {
    fn exists(&self, db: DbId) -> bool {
        self.databases.contains_key(&db)
    }

    fn owner_of(&self, db: DbId) -> Option<&AccountId> {
        self.databases.get(&db).map(|record| &record.owner)
    }

    fn royalty_bips_of(&self, db: DbId) -> Option<Bips> {
        self.databases
            .get(&db)
            .map(|record| record.manifest.royalty_bips)
    }
}

impl HostListing for Registry {
    fn remove_listing(&mut self, db: DbId, host: &AccountId) {
        if let Some(hosts) = self.endpoints.get_mut(&db) {
            hosts.remove(host);
        }
    }
}

/// Records every scheduled payment in order.
#[derive(Clone, Debug, Default)]
pub struct PaymentLog {
    pub payments: Vec<Payment>,
}

impl PaymentLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total amount scheduled to an account.
    pub fn total_to(&self, account: &AccountId) -> Money {
        self.payments
            .iter()
            .filter(|p| &p.to == account)
            .fold(0, |acc: Money, p| acc.saturating_add(p.amount))
    }
}

impl ValueTransfer for PaymentLog {
    fn schedule_payment(&mut self, payment: Payment) {
        self.payments.push(payment);
    }
}
