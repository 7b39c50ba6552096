pub mod authentication;
pub mod config;
pub mod events;
pub mod password;
pub mod persistence;
