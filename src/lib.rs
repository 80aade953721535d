// Library root: re-exports all modules so integration tests and external
// consumers can access the crate's public API.

pub mod config;
pub mod db;
pub mod optimizer;
pub mod player;
pub mod sources;
pub mod strategy;
