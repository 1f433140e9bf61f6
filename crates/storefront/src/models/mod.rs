//! Session-stored storefront models.

pub mod notice;
pub mod session;

pub use notice::{Notice, NoticeLevel};
pub use session::keys as session_keys;
