//! Command implementations.

pub mod config;
pub mod db;
pub mod run;
