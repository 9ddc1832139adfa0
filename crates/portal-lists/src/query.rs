//! Client-side filtering and sorting
//!
//! Both are pure views over the loaded items; neither refetches nor
//! reorders the stored list.

use crate::entity::Entity;
use std::cmp::Ordering;
use std::fmt;
use std::sync::Arc;

/// Comparator supplied by the caller
pub type Comparator<E> = Arc<dyn Fn(&E, &E) -> Ordering + Send + Sync>;

/// Row order of a view; every order is stable for equal keys
pub enum SortOrder<E> {
    /// As returned by the backend
    Source,
    /// Display field, ascending
    DisplayAsc,
    /// Display field, descending
    DisplayDesc,
    /// Caller-defined
    Custom(Comparator<E>),
}

impl<E> Default for SortOrder<E> {
    fn default() -> Self {
        Self::Source
    }
}

impl<E> Clone for SortOrder<E> {
    fn clone(&self) -> Self {
        match self {
            Self::Source => Self::Source,
            Self::DisplayAsc => Self::DisplayAsc,
            Self::DisplayDesc => Self::DisplayDesc,
            Self::Custom(cmp) => Self::Custom(Arc::clone(cmp)),
        }
    }
}

impl<E> fmt::Debug for SortOrder<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => f.write_str("Source"),
            Self::DisplayAsc => f.write_str("DisplayAsc"),
            Self::DisplayDesc => f.write_str("DisplayDesc"),
            Self::Custom(_) => f.write_str("Custom"),
        }
    }
}

impl<E> SortOrder<E> {
    /// Custom order from a comparator
    pub fn by<F>(cmp: F) -> Self
    where
        F: Fn(&E, &E) -> Ordering + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(cmp))
    }
}

/// Filter text plus row order
#[derive(Debug, Clone)]
pub struct ListQuery<E> {
    /// Case-insensitive substring of the display field; empty keeps all
    pub filter: String,
    /// Order applied after filtering
    pub order: SortOrder<E>,
}

impl<E> Default for ListQuery<E> {
    fn default() -> Self {
        Self {
            filter: String::new(),
            order: SortOrder::Source,
        }
    }
}

impl<E> ListQuery<E> {
    /// Query with only a filter
    #[must_use]
    pub fn filtered(text: impl Into<String>) -> Self {
        Self {
            filter: text.into(),
            ..Self::default()
        }
    }

    /// Set the order
    #[inline]
    #[must_use]
    pub fn sorted(mut self, order: SortOrder<E>) -> Self {
        self.order = order;
        self
    }
}

/// Whether `entity` passes the filter
#[must_use]
pub fn matches<E: Entity>(entity: &E, needle_lower: &str) -> bool {
    needle_lower.is_empty() || entity.display().to_lowercase().contains(needle_lower)
}

/// Items whose display field contains `text`, ignoring case, in order
#[must_use]
pub fn filter_items<E: Entity>(items: &[E], text: &str) -> Vec<E> {
    let needle = text.to_lowercase();
    items
        .iter()
        .filter(|e| matches(*e, &needle))
        .cloned()
        .collect()
}

/// Sort in place; `sort_by` is stable
pub fn sort_items<E: Entity>(items: &mut [E], order: &SortOrder<E>) {
    match order {
        SortOrder::Source => {}
        SortOrder::DisplayAsc => items.sort_by(|a, b| a.display().cmp(b.display())),
        SortOrder::DisplayDesc => items.sort_by(|a, b| b.display().cmp(a.display())),
        SortOrder::Custom(cmp) => items.sort_by(|a, b| cmp(a, b)),
    }
}

/// Filter, then sort
#[must_use]
pub fn apply<E: Entity>(items: &[E], query: &ListQuery<E>) -> Vec<E> {
    let mut view = filter_items(items, &query.filter);
    sort_items(&mut view, &query.order);
    view
}
