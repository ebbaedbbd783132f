//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlState`: the checkpoint record (key in flight, next page, completed keys)
//! - `KeyState`: lifecycle of a single enumeration key

mod crawl_state;
mod key_state;

pub use crawl_state::CrawlState;
pub use key_state::KeyState;
