pub mod types;
pub mod config;
pub mod traits;
pub mod sources;
pub mod timestamp;
pub mod locator;
pub mod filter;
pub mod notifier;
pub mod renderer;
pub mod watcher;

pub use types::*;
pub use traits::{NotifyChannel, PageRenderer, RendererLauncher};
pub use sources::BinanceSquare;
pub use timestamp::parse_relative_age;
pub use locator::{locate_first_unpinned, FeedCard};
pub use filter::{PostFilter, Verdict};
pub use notifier::{DingTalkChannel, LogChannel};
pub use renderer::ChromiumLauncher;
pub use watcher::{AccountOutcome, SquareWatcher};
