//! Per-leaf precedence merging.
//!
//! Each key keeps the candidate with the highest [`Provenance`] seen so far;
//! a candidate only replaces the current one when its provenance is at least
//! as high. With `UntouchedDefault < FromFile < ExplicitlySet` this is the
//! law `default < file < explicit CLI`, applied to every leaf on its own.

use indexmap::IndexMap;

use crate::namespace::RawEntry;
use crate::types::Provenance;
use crate::value::Mapping;

/// A value waiting to be coerced, in whichever raw form its source produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Incoming {
    Tokens(Vec<String>),
    Mapped(serde_json::Value),
}

#[derive(Debug, Clone, PartialEq)]
struct Candidate {
    incoming: Incoming,
    provenance: Provenance,
}

/// Merge state for the leaves of one schema level.
#[derive(Debug, Default)]
pub struct MergeState {
    slots: IndexMap<String, Candidate>,
}

impl MergeState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed every key of a loaded file. `null` entries count as not
    /// supplied, so a default can still fill them.
    pub fn seed_from_file(&mut self, mapping: Mapping) {
        for (key, raw) in mapping {
            if raw.is_null() {
                continue;
            }
            self.offer(&key, Incoming::Mapped(raw), Provenance::FromFile);
        }
    }

    /// Offer a command-line entry under its own provenance.
    pub fn apply_cli(&mut self, key: &str, entry: RawEntry) -> bool {
        self.offer(key, Incoming::Tokens(entry.tokens), entry.provenance)
    }

    /// Returns whether the candidate was taken.
    pub fn offer(&mut self, key: &str, incoming: Incoming, provenance: Provenance) -> bool {
        if let Some(current) = self.slots.get(key)
            && current.provenance > provenance
        {
            return false;
        }
        self.slots.insert(
            key.to_string(),
            Candidate {
                incoming,
                provenance,
            },
        );
        true
    }

    pub fn provenance(&self, key: &str) -> Option<Provenance> {
        self.slots.get(key).map(|c| c.provenance)
    }

    /// Remove and return the winning candidate for `key`.
    pub fn take(&mut self, key: &str) -> Option<Incoming> {
        self.slots.shift_remove(key).map(|c| c.incoming)
    }
}
