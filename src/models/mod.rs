//! Domain models shared by the feed, the filter pipeline and the collaborators.

pub mod feed;
pub mod history;
pub mod media;

pub use feed::{CandidateItem, ItemAttributes};
pub use history::{sort_newest_first, HistoryRecord};
pub use media::{MediaType, Notification, RecognizedMedia, SubscriptionResult};
