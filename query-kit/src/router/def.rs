//! Declarative router tree

use crate::accessor::{InfiniteQueryDef, MutationDef, QueryDef};

/// One named entry of a router definition
#[derive(Clone, Debug)]
pub enum RouterEntry {
    Query(QueryDef),
    InfiniteQuery(InfiniteQueryDef),
    Mutation(MutationDef),
    /// Nested group; its entries get this entry's name as an extra segment
    Namespace(RouterDef),
}

impl RouterEntry {
    /// Returns true for query, infinite query and mutation entries
    pub fn is_leaf(&self) -> bool {
        !matches!(self, Self::Namespace(_))
    }
}

impl From<QueryDef> for RouterEntry {
    fn from(def: QueryDef) -> Self {
        Self::Query(def)
    }
}

impl From<InfiniteQueryDef> for RouterEntry {
    fn from(def: InfiniteQueryDef) -> Self {
        Self::InfiniteQuery(def)
    }
}

impl From<MutationDef> for RouterEntry {
    fn from(def: MutationDef) -> Self {
        Self::Mutation(def)
    }
}

impl From<RouterDef> for RouterEntry {
    fn from(def: RouterDef) -> Self {
        Self::Namespace(def)
    }
}

/// Tag a query definition for a router
pub fn query(def: QueryDef) -> RouterEntry {
    RouterEntry::Query(def)
}

/// Tag a paginated query definition for a router
pub fn infinite_query(def: InfiniteQueryDef) -> RouterEntry {
    RouterEntry::InfiniteQuery(def)
}

/// Tag a mutation definition for a router
pub fn mutation(def: MutationDef) -> RouterEntry {
    RouterEntry::Mutation(def)
}

/// Tag a nested group for a router
pub fn namespace(def: RouterDef) -> RouterEntry {
    RouterEntry::Namespace(def)
}

/// Ordered list of named entries.
///
/// Names are checked when the router is built, so a duplicate name is
/// reported as an error instead of silently replacing the earlier entry.
///
/// ```rust,ignore
/// let def = RouterDef::new()
///     .namespace("users", RouterDef::new()
///         .query("profile", QueryDef::new(fetch_profile))
///         .mutation("update", MutationDef::new(update_profile)))
///     .infinite_query("feed", feed_def);
/// ```
#[derive(Clone, Debug, Default)]
pub struct RouterDef {
    entries: Vec<(String, RouterEntry)>,
}

impl RouterDef {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry of any kind
    #[must_use]
    pub fn entry(mut self, name: impl Into<String>, entry: impl Into<RouterEntry>) -> Self {
        self.entries.push((name.into(), entry.into()));
        self
    }

    #[must_use]
    pub fn query(self, name: impl Into<String>, def: QueryDef) -> Self {
        self.entry(name, RouterEntry::Query(def))
    }

    #[must_use]
    pub fn infinite_query(self, name: impl Into<String>, def: InfiniteQueryDef) -> Self {
        self.entry(name, RouterEntry::InfiniteQuery(def))
    }

    #[must_use]
    pub fn mutation(self, name: impl Into<String>, def: MutationDef) -> Self {
        self.entry(name, RouterEntry::Mutation(def))
    }

    #[must_use]
    pub fn namespace(self, name: impl Into<String>, def: RouterDef) -> Self {
        self.entry(name, RouterEntry::Namespace(def))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &RouterEntry)> {
        self.entries.iter().map(|(name, entry)| (name.as_str(), entry))
    }

    pub(crate) fn into_entries(self) -> Vec<(String, RouterEntry)> {
        self.entries
    }
}

impl<S: Into<String>, E: Into<RouterEntry>> FromIterator<(S, E)> for RouterDef {
    fn from_iter<I: IntoIterator<Item = (S, E)>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|(name, entry)| (name.into(), entry.into()))
                .collect(),
        }
    }
}
