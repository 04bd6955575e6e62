use std::sync::Arc;

/// Ordered, immutable list of menu labels.
///
/// Items are identified by position, so the same label may appear more than
/// once. Clones share the underlying storage: every trial of a (menu, task)
/// block points at the same list.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ItemList(Arc<[String]>);

impl ItemList {
    pub fn new<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(items.into_iter().map(Into::into).collect())
    }

    /// Splits a slash separated list such as `apple/banana/cherry`.
    pub fn from_slashed(list: &str) -> Self {
        Self::new(list.split('/'))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Builds a new list whose `i`th entry is `self[order[i]]`.
    ///
    /// Indices in `order` that are out of range are skipped.
    pub fn permuted(&self, order: &[usize]) -> Self {
        Self(order.iter().filter_map(|&i| self.0.get(i).cloned()).collect())
    }

    /// Slash joined form used in the result log.
    pub fn joined(&self) -> String {
        self.0.join("/")
    }

    pub fn shares_storage(&self, other: &ItemList) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}
