//! Data models for the kindergarten site.
//!
//! Field names serialize in camelCase so stored documents keep the layout the
//! site has always used.

mod activity;
mod admin;
mod blog;
mod message;

pub use activity::*;
pub use admin::*;
pub use blog::*;
pub use message::*;
