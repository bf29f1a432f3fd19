pub mod bookmark_repository;
pub mod change_feed;
pub mod identity;
