//! In-memory event store, partitioned by `(tenant_id, session_id)`.
//!
//! Partitions are created lazily on first append and live for the process
//! lifetime. Each partition keeps two consistent views of its events: an
//! ordered sequence for range/neighborhood queries and an id lookup for O(1)
//! point reads.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::error::MemoryError;
use super::event::Event;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SessionKey {
    tenant_id: String,
    session_id: String,
}

impl SessionKey {
    fn new(tenant_id: &str, session_id: &str) -> Self {
        Self {
            tenant_id: tenant_id.to_string(),
            session_id: session_id.to_string(),
        }
    }

    fn for_event(event: &Event) -> Self {
        Self::new(event.tenant_id(), event.session_id())
    }
}

#[derive(Debug, Default)]
struct SessionPartition {
    ordered: Vec<Event>,
    by_id: HashMap<String, Event>,
}

impl SessionPartition {
    fn sort(&mut self) {
        self.ordered.sort_by(|a, b| {
            a.start_token()
                .cmp(&b.start_token())
                .then_with(|| a.created_at().cmp(&b.created_at()))
                .then_with(|| a.event_id().cmp(b.event_id()))
        });
    }
}

type Partitions = HashMap<SessionKey, SessionPartition>;

/// Thread-safe store with a readers-writer discipline: reads proceed in
/// parallel, writes validate and mutate under the exclusive lock. All
/// operations are synchronous and never block on anything but the lock.
#[derive(Debug, Default)]
pub struct MemoryStore {
    sessions: RwLock<Partitions>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a single event. Equivalent to a one-element batch.
    pub fn append(&self, event: Event) -> Result<(), MemoryError> {
        self.append_many(vec![event])
    }

    /// Appends a batch of events transactionally: either every event is
    /// inserted or none are. Duplicate ids are checked against both the
    /// target partitions and the batch itself before any mutation.
    pub fn append_many(&self, events: Vec<Event>) -> Result<(), MemoryError> {
        if events.is_empty() {
            return Ok(());
        }

        let mut sessions = self.write_lock();

        let mut seen_by_session: HashMap<SessionKey, HashSet<String>> = HashMap::new();
        for event in &events {
            let key = SessionKey::for_event(event);
            if let Some(partition) = sessions.get(&key) {
                if partition.by_id.contains_key(event.event_id()) {
                    return Err(MemoryError::DuplicateEventId);
                }
            }
            let seen = seen_by_session.entry(key).or_default();
            if !seen.insert(event.event_id().to_string()) {
                return Err(MemoryError::DuplicateEventId);
            }
        }

        let mut touched: HashSet<SessionKey> = HashSet::new();
        for event in events {
            let key = SessionKey::for_event(&event);
            let partition = sessions.entry(key.clone()).or_default();
            partition
                .by_id
                .insert(event.event_id().to_string(), event.clone());
            partition.ordered.push(event);
            touched.insert(key);
        }

        for key in touched {
            if let Some(partition) = sessions.get_mut(&key) {
                partition.sort();
            }
        }

        Ok(())
    }

    /// Point lookup by event id within one partition.
    pub fn get(&self, tenant_id: &str, session_id: &str, event_id: &str) -> Option<Event> {
        let sessions = self.read_lock();
        sessions
            .get(&SessionKey::new(tenant_id, session_id))
            .and_then(|partition| partition.by_id.get(event_id))
            .cloned()
    }

    /// Returns a copy of the partition's ordered view. Unknown partitions
    /// yield an empty vector; the caller may mutate the result freely.
    pub fn list_by_session(&self, tenant_id: &str, session_id: &str) -> Vec<Event> {
        let sessions = self.read_lock();
        sessions
            .get(&SessionKey::new(tenant_id, session_id))
            .map(|partition| partition.ordered.clone())
            .unwrap_or_default()
    }

    /// Returns the union of neighborhoods around up to `top_k` anchors.
    ///
    /// Anchors are selected in caller order; ids that do not resolve are
    /// skipped without counting against `top_k`. Each selected anchor
    /// contributes the index range `[anchor - buffer_before,
    /// anchor + buffer_after]` clamped to the partition, and the union is
    /// returned in ascending span order.
    pub fn retrieve_by_anchors(
        &self,
        tenant_id: &str,
        session_id: &str,
        anchor_ids: &[String],
        top_k: i64,
        buffer_before: i64,
        buffer_after: i64,
    ) -> Result<Vec<Event>, MemoryError> {
        if top_k <= 0 {
            return Err(MemoryError::TopKNotPositive);
        }
        if buffer_before < 0 || buffer_after < 0 {
            return Err(MemoryError::NegativeBuffer);
        }

        let sessions = self.read_lock();
        let Some(partition) = sessions.get(&SessionKey::new(tenant_id, session_id)) else {
            return Ok(Vec::new());
        };
        if partition.ordered.is_empty() {
            return Ok(Vec::new());
        }

        let index_by_id: HashMap<&str, usize> = partition
            .ordered
            .iter()
            .enumerate()
            .map(|(index, event)| (event.event_id(), index))
            .collect();

        let effective_k = (top_k as usize)
            .min(anchor_ids.len())
            .min(partition.ordered.len());

        let mut anchors: Vec<usize> = Vec::with_capacity(effective_k);
        let mut selected: HashSet<usize> = HashSet::new();
        for anchor_id in anchor_ids {
            if anchors.len() == effective_k {
                break;
            }
            let Some(&index) = index_by_id.get(anchor_id.as_str()) else {
                continue;
            };
            if selected.insert(index) {
                anchors.push(index);
            }
        }

        let before = buffer_before as usize;
        let after = buffer_after as usize;
        let last = partition.ordered.len() - 1;

        let mut included: BTreeSet<usize> = BTreeSet::new();
        for &anchor in &anchors {
            let low = anchor.saturating_sub(before);
            let high = anchor.saturating_add(after).min(last);
            included.extend(low..=high);
        }

        Ok(included
            .into_iter()
            .map(|index| partition.ordered[index].clone())
            .collect())
    }

    fn read_lock(&self) -> RwLockReadGuard<'_, Partitions> {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_lock(&self) -> RwLockWriteGuard<'_, Partitions> {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
