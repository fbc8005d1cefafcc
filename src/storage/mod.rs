//! Storage layer for questlog

pub mod db;
pub mod models;

pub use db::{Database, StatusChange};
pub use models::*;
