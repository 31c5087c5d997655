//! Listing strategies built on a [`PageSource`](bt_traits::PageSource).

mod concurrent;
mod sequential;

pub use concurrent::{ConcurrentLister, ListingTask};
pub use sequential::{SequentialLister, pages};
