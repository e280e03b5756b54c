//! Built router tree

use crate::accessor::{CallOptions, InfiniteQueryAccessor, MutationAccessor, QueryAccessor};
use crate::key::{KeyPattern, QueryKey};
use crate::middleware::{AccessorKind, Response};
use crate::{ClientContext, QueryResult};
use std::collections::BTreeMap;
use std::ops::Deref;

/// Query leaf: the accessor plus its suspense twin
#[derive(Clone, Debug)]
pub struct QueryLeaf {
    query: QueryAccessor,
    suspense: QueryAccessor,
}

impl QueryLeaf {
    pub(crate) fn new(query: QueryAccessor) -> Self {
        let suspense = query.suspense();
        Self { query, suspense }
    }

    pub async fn use_query(&self, client: &ClientContext, call: CallOptions) -> QueryResult<Response> {
        self.query.call(client, call).await
    }

    pub async fn use_suspense_query(
        &self,
        client: &ClientContext,
        call: CallOptions,
    ) -> QueryResult<Response> {
        self.suspense.call(client, call).await
    }

    pub fn accessor(&self) -> &QueryAccessor {
        &self.query
    }

    pub fn suspense_accessor(&self) -> &QueryAccessor {
        &self.suspense
    }
}

impl Deref for QueryLeaf {
    type Target = QueryAccessor;

    fn deref(&self) -> &Self::Target {
        &self.query
    }
}

/// Paginated query leaf: the accessor plus its suspense twin
#[derive(Clone, Debug)]
pub struct InfiniteQueryLeaf {
    query: InfiniteQueryAccessor,
    suspense: InfiniteQueryAccessor,
}

impl InfiniteQueryLeaf {
    pub(crate) fn new(query: InfiniteQueryAccessor) -> Self {
        let suspense = query.suspense();
        Self { query, suspense }
    }

    pub async fn use_infinite_query(
        &self,
        client: &ClientContext,
        call: CallOptions,
    ) -> QueryResult<Response> {
        self.query.call(client, call).await
    }

    pub async fn use_suspense_infinite_query(
        &self,
        client: &ClientContext,
        call: CallOptions,
    ) -> QueryResult<Response> {
        self.suspense.call(client, call).await
    }

    pub fn accessor(&self) -> &InfiniteQueryAccessor {
        &self.query
    }

    pub fn suspense_accessor(&self) -> &InfiniteQueryAccessor {
        &self.suspense
    }
}

impl Deref for InfiniteQueryLeaf {
    type Target = InfiniteQueryAccessor;

    fn deref(&self) -> &Self::Target {
        &self.query
    }
}

/// Mutation leaf
#[derive(Clone, Debug)]
pub struct MutationLeaf {
    mutation: MutationAccessor,
}

impl MutationLeaf {
    pub(crate) fn new(mutation: MutationAccessor) -> Self {
        Self { mutation }
    }

    pub async fn use_mutation(
        &self,
        client: &ClientContext,
        call: CallOptions,
    ) -> QueryResult<Response> {
        self.mutation.call(client, call).await
    }

    pub fn accessor(&self) -> &MutationAccessor {
        &self.mutation
    }
}

impl Deref for MutationLeaf {
    type Target = MutationAccessor;

    fn deref(&self) -> &Self::Target {
        &self.mutation
    }
}

/// Child of a router node
#[derive(Clone, Debug)]
pub enum RouterChild {
    Namespace(RouterNode),
    Query(QueryLeaf),
    InfiniteQuery(InfiniteQueryLeaf),
    Mutation(MutationLeaf),
}

impl RouterChild {
    /// Path key of the child (variables excluded)
    pub fn get_key(&self) -> QueryKey {
        match self {
            Self::Namespace(node) => node.get_key(),
            Self::Query(leaf) => leaf.get_key(None),
            Self::InfiniteQuery(leaf) => leaf.get_key(None),
            Self::Mutation(leaf) => leaf.get_key(),
        }
    }

    /// Path segments of the child
    pub fn path(&self) -> &[String] {
        match self {
            Self::Namespace(node) => node.path(),
            Self::Query(leaf) => leaf.prefix(),
            Self::InfiniteQuery(leaf) => leaf.prefix(),
            Self::Mutation(leaf) => leaf.prefix(),
        }
    }

    /// Accessor kind of a leaf, `None` for a namespace
    pub fn kind(&self) -> Option<AccessorKind> {
        match self {
            Self::Namespace(_) => None,
            Self::Query(_) => Some(AccessorKind::Query),
            Self::InfiniteQuery(_) => Some(AccessorKind::InfiniteQuery),
            Self::Mutation(_) => Some(AccessorKind::Mutation),
        }
    }

    pub fn is_leaf(&self) -> bool {
        self.kind().is_some()
    }

    pub fn as_node(&self) -> Option<&RouterNode> {
        match self {
            Self::Namespace(node) => Some(node),
            _ => None,
        }
    }

    pub fn as_query(&self) -> Option<&QueryLeaf> {
        match self {
            Self::Query(leaf) => Some(leaf),
            _ => None,
        }
    }

    pub fn as_infinite_query(&self) -> Option<&InfiniteQueryLeaf> {
        match self {
            Self::InfiniteQuery(leaf) => Some(leaf),
            _ => None,
        }
    }

    pub fn as_mutation(&self) -> Option<&MutationLeaf> {
        match self {
            Self::Mutation(leaf) => Some(leaf),
            _ => None,
        }
    }
}

/// One level of a built router.
///
/// Every level, the root included, knows its own path through
/// [`get_key`](Self::get_key), so external code can invalidate everything
/// below it.
#[derive(Clone, Debug)]
pub struct RouterNode {
    path: Vec<String>,
    children: BTreeMap<String, RouterChild>,
}

impl RouterNode {
    pub(crate) fn new(path: Vec<String>, children: BTreeMap<String, RouterChild>) -> Self {
        Self { path, children }
    }

    /// Path of this level
    pub fn get_key(&self) -> QueryKey {
        QueryKey::from_segments(&self.path)
    }

    pub fn path(&self) -> &[String] {
        &self.path
    }

    /// Child by name
    pub fn get(&self, name: &str) -> Option<&RouterChild> {
        self.children.get(name)
    }

    /// Nested namespace by name
    pub fn node(&self, name: &str) -> Option<&RouterNode> {
        self.get(name).and_then(RouterChild::as_node)
    }

    pub fn query(&self, name: &str) -> Option<&QueryLeaf> {
        self.get(name).and_then(RouterChild::as_query)
    }

    pub fn infinite_query(&self, name: &str) -> Option<&InfiniteQueryLeaf> {
        self.get(name).and_then(RouterChild::as_infinite_query)
    }

    pub fn mutation(&self, name: &str) -> Option<&MutationLeaf> {
        self.get(name).and_then(RouterChild::as_mutation)
    }

    /// Child by dotted path relative to this node, e.g. `"users.profile"`
    pub fn at(&self, path: &str) -> Option<&RouterChild> {
        let mut segments = path.split('.');
        let mut current = self.get(segments.next()?)?;
        for segment in segments {
            current = current.as_node()?.get(segment)?;
        }
        Some(current)
    }

    /// Names of the direct children, sorted
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.children.keys().map(String::as_str)
    }

    /// Direct children, sorted by name
    pub fn children(&self) -> impl Iterator<Item = (&str, &RouterChild)> {
        self.children
            .iter()
            .map(|(name, child)| (name.as_str(), child))
    }

    pub fn len(&self) -> usize {
        self.children.len()
    }

    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Every leaf below this node with its dotted path, depth first
    pub fn leaves(&self) -> Vec<(String, &RouterChild)> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<(String, &'a RouterChild)>) {
        for child in self.children.values() {
            match child {
                RouterChild::Namespace(node) => node.collect_leaves(out),
                leaf => out.push((leaf.path().join("."), leaf)),
            }
        }
    }

    /// Path keys of the leaves whose path matches `pattern`
    pub fn keys_matching(&self, pattern: &KeyPattern) -> Vec<QueryKey> {
        self.leaves()
            .into_iter()
            .filter(|(_, leaf)| pattern.matches(leaf.path()))
            .map(|(_, leaf)| leaf.get_key())
            .collect()
    }
}
