pub mod auth;
pub mod bookmarks;
pub mod events;
pub mod health;
pub mod pages;
