//! questlog - goals, daily tasks and a journal, with experience and levels
//!
//! Completing goals and daily tasks and writing journal summaries earns
//! experience. Completed daily tasks are reset once a day so the same list
//! can be worked through again.

pub mod config;
pub mod daemon;
pub mod events;
pub mod level;
pub mod storage;
pub mod tracker;
