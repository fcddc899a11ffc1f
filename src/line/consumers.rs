//! Ordered per-consumer power slots with stable entry identity.

use serde::{Deserialize, Serialize};

/// Arena identifier assigned to an entry when it is created.
///
/// Ids are never reused within a set, so an entry that survives a resize
/// keeps the id it was created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct EntryId(u64);

/// Power drawn by one consumer.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsumerPowerEntry {
    id: EntryId,
    /// Consumer power (kW, non-negative).
    pub power_kw: f64,
}

impl ConsumerPowerEntry {
    /// Returns the arena id of this entry.
    pub fn id(&self) -> EntryId {
        self.id
    }
}

/// Serialized form of a single entry: just its power.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerRecord {
    /// Consumer power (kW).
    pub power: f64,
}

/// Index-addressed list of consumer power entries.
///
/// Only the reconciler creates and destroys entries; callers read them by
/// index. Equality compares power values in order and ignores ids.
#[derive(Debug, Clone, Default)]
pub struct ConsumerSet {
    entries: Vec<ConsumerPowerEntry>,
    next_id: u64,
}

impl ConsumerSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` when the set holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the entry at `index`, if any.
    pub fn get(&self, index: usize) -> Option<&ConsumerPowerEntry> {
        self.entries.get(index)
    }

    /// Iterates entries in index order.
    pub fn iter(&self) -> impl Iterator<Item = &ConsumerPowerEntry> {
        self.entries.iter()
    }

    /// Iterates entry powers in index order.
    pub fn powers_kw(&self) -> impl Iterator<Item = f64> + '_ {
        self.entries.iter().map(|e| e.power_kw)
    }

    /// Sum of all entry powers (kW).
    pub fn sum_kw(&self) -> f64 {
        self.powers_kw().sum()
    }

    fn allocate(&mut self, power_kw: f64) -> ConsumerPowerEntry {
        let id = EntryId(self.next_id);
        self.next_id += 1;
        ConsumerPowerEntry { id, power_kw }
    }

    /// Appends a new entry and returns its id.
    pub fn push(&mut self, power_kw: f64) -> EntryId {
        let entry = self.allocate(power_kw);
        let id = entry.id;
        self.entries.push(entry);
        id
    }

    /// Inserts a new entry at `index`, shifting later entries up.
    ///
    /// The reconciler only appends; this is for presentation layers that
    /// place a row mid-table.
    ///
    /// Returns `None` and leaves the set unchanged if `index > len`.
    pub fn insert_at(&mut self, index: usize, power_kw: f64) -> Option<EntryId> {
        if index > self.entries.len() {
            return None;
        }
        let entry = self.allocate(power_kw);
        let id = entry.id;
        self.entries.insert(index, entry);
        Some(id)
    }

    /// Removes and returns the entry at `index`, shifting later entries down.
    pub fn remove_at(&mut self, index: usize) -> Option<ConsumerPowerEntry> {
        (index < self.entries.len()).then(|| self.entries.remove(index))
    }

    /// Shrinks the set to `len` entries, removing the highest index first.
    pub fn truncate_tail(&mut self, len: usize) {
        while self.entries.len() > len {
            self.entries.pop();
        }
    }

    /// Overwrites the power of the entry at `index`.
    ///
    /// Returns `false` if `index` is out of range.
    pub fn set_power(&mut self, index: usize, power_kw: f64) -> bool {
        match self.entries.get_mut(index) {
            Some(entry) => {
                entry.power_kw = power_kw;
                true
            }
            None => false,
        }
    }

    /// Overwrites every entry with the same power.
    pub fn fill(&mut self, power_kw: f64) {
        for entry in &mut self.entries {
            entry.power_kw = power_kw;
        }
    }

    /// Destroys every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

impl PartialEq for ConsumerSet {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.powers_kw().eq(other.powers_kw())
    }
}

impl From<Vec<PowerRecord>> for ConsumerSet {
    fn from(records: Vec<PowerRecord>) -> Self {
        let mut set = Self::new();
        for record in records {
            set.push(record.power);
        }
        set
    }
}

impl From<&ConsumerSet> for Vec<PowerRecord> {
    fn from(set: &ConsumerSet) -> Self {
        set.powers_kw().map(|power| PowerRecord { power }).collect()
    }
}

impl Serialize for ConsumerSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        Vec::<PowerRecord>::from(self).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ConsumerSet {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<PowerRecord>::deserialize(deserializer).map(Self::from)
    }
}
