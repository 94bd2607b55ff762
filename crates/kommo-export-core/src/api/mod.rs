//! Paginated access to the CRM REST API.

pub mod client;
pub mod pager;
pub mod resource;

pub use client::{KommoClient, PageSource};
pub use pager::{fetch_all, Pages, DEFAULT_PAGE_SIZE};
pub use resource::Resource;
