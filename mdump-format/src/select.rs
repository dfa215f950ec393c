use std::collections::BTreeSet;

use crate::CollectionMetadata;

/// Decides which collections get a real sink; the rest are muted.
pub trait Selector {
    fn select(&self, meta: &CollectionMetadata) -> bool;
}

impl<F> Selector for F
where
    F: Fn(&CollectionMetadata) -> bool,
{
    #[inline(always)]
    fn select(&self, meta: &CollectionMetadata) -> bool {
        self(meta)
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SelectAll;

impl Selector for SelectAll {
    #[inline(always)]
    fn select(&self, _meta: &CollectionMetadata) -> bool {
        true
    }
}

/// Selects collections by exact database name. An empty filter selects everything.
#[derive(Debug, Default, Clone)]
pub struct DatabaseFilter {
    databases: BTreeSet<String>,
}

impl DatabaseFilter {
    pub fn new<I, S>(databases: I) -> DatabaseFilter
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        DatabaseFilter {
            databases: databases.into_iter().map(Into::into).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.databases.is_empty()
    }
}

impl Selector for DatabaseFilter {
    fn select(&self, meta: &CollectionMetadata) -> bool {
        self.databases.is_empty() || self.databases.contains(&meta.database)
    }
}
