pub mod admin;
pub mod auth;
pub mod entries;
pub mod featured;
pub mod home;
pub mod me;
pub mod website_title;
