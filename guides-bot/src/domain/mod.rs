pub mod channel_post;
pub mod error;
pub mod filter;
pub mod guide;
pub mod title;
