pub mod catalog;
pub mod config;
pub mod database;
pub mod feeds;
pub mod global;
pub mod http;
pub mod logging;
