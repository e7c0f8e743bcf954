//! Append-only output list shared by concurrent enrichment workers.

use tokio::sync::Mutex;

/// Exclusive-access accumulator.
///
/// Workers may only append; the collected items come back out once, after
/// the concurrent phase, through [`Accumulator::into_inner`].
#[derive(Debug)]
pub struct Accumulator<T> {
    items: Mutex<Vec<T>>,
}

impl<T> Accumulator<T> {
    /// Creates an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            items: Mutex::new(Vec::new()),
        }
    }

    /// Appends one item.
    pub async fn push(&self, item: T) {
        self.items.lock().await.push(item);
    }

    /// Appends every item from `items` under a single lock acquisition.
    pub async fn extend<I: IntoIterator<Item = T>>(&self, items: I) {
        self.items.lock().await.extend(items);
    }

    /// Number of items collected so far.
    pub async fn len(&self) -> usize {
        self.items.lock().await.len()
    }

    /// Returns `true` if nothing has been collected.
    pub async fn is_empty(&self) -> bool {
        self.items.lock().await.is_empty()
    }

    /// Consumes the accumulator, returning the items in append order.
    #[must_use]
    pub fn into_inner(self) -> Vec<T> {
        self.items.into_inner()
    }
}

impl<T> Default for Accumulator<T> {
    fn default() -> Self {
        Self::new()
    }
}
