pub mod defs;

pub use defs::{is_pinned, Account, FeedPost, NotificationPayload, RelativeAge, TimeUnit};
