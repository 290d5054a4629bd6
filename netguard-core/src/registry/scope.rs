use std::collections::HashSet;

use crate::model::Identifier;

/// The write mode for a `Writer::sync_<kind>` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOp {
    /// Insert-or-update exactly the given items; everything else of this
    /// kind is left untouched.
    Upsert,
    /// Replace every member of `scope` with the given items. With
    /// `Scope::All` this replaces the entire kind.
    FullSync,
}

/// Which members of a kind a `FullSync` applies to. Stored as stable
/// `"namespace/name"` keys since that's what the in-memory store indexes by.
#[derive(Debug, Clone)]
pub enum Scope {
    All,
    Ids(HashSet<String>),
}

impl Scope {
    pub fn ids(ids: impl IntoIterator<Item = Identifier>) -> Self {
        Scope::Ids(ids.into_iter().map(|id| id.key()).collect())
    }

    pub fn contains(&self, id: &Identifier) -> bool {
        self.contains_key(&id.key())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        match self {
            Scope::All => true,
            Scope::Ids(set) => set.contains(key),
        }
    }
}
