//! Concurrent address cache
//!
//! This module provides the in-memory store mapping network addresses to
//! their metadata (blacklist/whitelist flags, nickname history). The store
//! is the authoritative copy; a [`backend::StorageBackend`] persists it
//! periodically and on shutdown.

pub mod backend;

use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use dashmap::{DashMap, DashSet};

use backend::AddressRecord;

/// Metadata kept for every address ever seen.
///
/// Entries are created lazily on first reference and never deleted during
/// normal operation; long-running processes trade memory for history.
/// Each record synchronizes its own fields, so unrelated addresses never
/// contend with each other.
#[derive(Debug, Default)]
pub struct AddressMeta {
    blacklisted: AtomicBool,
    whitelisted: AtomicBool,

    /// Nicknames seen from this address, in insertion order, no duplicates
    /// (membership is checked case-insensitively).
    nicknames: RwLock<Vec<String>>,

    /// Store-wide sequence number of the last update, used to break ties
    /// in the reverse nickname lookup.
    last_touch: AtomicU64,
}

impl AddressMeta {
    pub fn is_blacklisted(&self) -> bool {
        self.blacklisted.load(Ordering::Acquire)
    }

    pub fn set_blacklisted(&self, value: bool) {
        self.blacklisted.store(value, Ordering::Release);
    }

    pub fn is_whitelisted(&self) -> bool {
        self.whitelisted.load(Ordering::Acquire)
    }

    pub fn set_whitelisted(&self, value: bool) {
        self.whitelisted.store(value, Ordering::Release);
    }

    /// Snapshot of the nickname history.
    pub fn nicknames(&self) -> Vec<String> {
        self.nicknames.read().unwrap().clone()
    }

    /// Number of distinct nicknames on record.
    pub fn nickname_count(&self) -> usize {
        self.nicknames.read().unwrap().len()
    }

    /// Case-insensitive membership test against the nickname history.
    pub fn has_nickname(&self, nickname: &str) -> bool {
        self.nicknames
            .read()
            .unwrap()
            .iter()
            .any(|known| known.eq_ignore_ascii_case(nickname))
    }

    fn append_nickname(&self, nickname: &str) {
        let mut nicknames = self.nicknames.write().unwrap();
        if !nicknames.iter().any(|known| known.eq_ignore_ascii_case(nickname)) {
            nicknames.push(nickname.to_string());
        }
    }

    fn last_touch(&self) -> u64 {
        self.last_touch.load(Ordering::Acquire)
    }
}

/// Concurrent cache of per-address metadata plus the server-list ping cache.
///
/// All lookups and mutations are safe under unbounded concurrent callers;
/// the map synchronizes per shard and each entry synchronizes its fields.
#[derive(Debug, Default)]
pub struct AddressStore {
    addresses: DashMap<String, Arc<AddressMeta>>,

    /// Addresses that issued a server-list ping during this process lifetime
    ping_cache: DashSet<String>,

    /// Monotonic update sequence shared by all entries
    touch_seq: AtomicU64,
}

impl AddressStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lookup-or-create: returns the live record for the address. Repeated
    /// calls for the same address return the same record.
    pub fn meta_for(&self, address: &str) -> Arc<AddressMeta> {
        self.addresses
            .entry(address.to_string())
            .or_insert_with(|| Arc::new(AddressMeta::default()))
            .clone()
    }

    /// Resolve a command token to a record: an IP literal resolves through
    /// [`Self::meta_for`]; anything else is treated as a nickname and looked
    /// up in the stored histories (case-insensitively). When several
    /// addresses share a nickname, the most recently updated one wins.
    pub fn resolve_meta(&self, token: &str) -> Option<Arc<AddressMeta>> {
        if token.parse::<IpAddr>().is_ok() {
            return Some(self.meta_for(token));
        }
        self.addresses
            .iter()
            .filter(|entry| entry.value().has_nickname(token))
            .max_by_key(|entry| entry.value().last_touch())
            .map(|entry| entry.value().clone())
    }

    /// Like [`Self::resolve_meta`], but returns the address the nickname
    /// was last seen from.
    pub fn last_seen_address(&self, nickname: &str) -> Option<String> {
        self.addresses
            .iter()
            .filter(|entry| entry.value().has_nickname(nickname))
            .max_by_key(|entry| entry.value().last_touch())
            .map(|entry| entry.key().clone())
    }

    /// Append `nickname` to the address's history unless an equal (ignoring
    /// case) entry is already present. Idempotent; also refreshes the
    /// entry's update sequence.
    pub fn record_nickname(&self, address: &str, nickname: &str) {
        let meta = self.meta_for(address);
        meta.append_nickname(nickname);
        let seq = self.touch_seq.fetch_add(1, Ordering::AcqRel) + 1;
        meta.last_touch.store(seq, Ordering::Release);
    }

    /// Read-only snapshot of the addresses whose metadata matches the
    /// predicate, for listings and command completion.
    pub fn addresses_matching<P>(&self, predicate: P) -> Vec<String>
    where
        P: Fn(&AddressMeta) -> bool,
    {
        self.addresses
            .iter()
            .filter(|entry| predicate(entry.value()))
            .map(|entry| entry.key().clone())
            .collect()
    }

    /// Number of addresses on record.
    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    /// Remember that this address pinged the server list.
    pub fn mark_pinged(&self, address: &str) {
        self.ping_cache.insert(address.to_string());
    }

    /// Whether this address pinged the server list before logging in.
    pub fn has_pinged(&self, address: &str) -> bool {
        self.ping_cache.contains(address)
    }

    /// Replace the cache contents with records loaded from a backend.
    pub fn absorb(&self, records: Vec<AddressRecord>) {
        for record in records {
            let meta = self.meta_for(&record.address);
            meta.set_blacklisted(record.blacklisted);
            meta.set_whitelisted(record.whitelisted);
            let mut nicknames = meta.nicknames.write().unwrap();
            for nickname in record.nicknames {
                if !nicknames.iter().any(|known| known.eq_ignore_ascii_case(&nickname)) {
                    nicknames.push(nickname);
                }
            }
        }
    }

    /// Snapshot every record for persistence.
    pub fn snapshot(&self) -> Vec<AddressRecord> {
        self.addresses
            .iter()
            .map(|entry| AddressRecord {
                address: entry.key().clone(),
                blacklisted: entry.value().is_blacklisted(),
                whitelisted: entry.value().is_whitelisted(),
                nicknames: entry.value().nicknames(),
            })
            .collect()
    }
}
