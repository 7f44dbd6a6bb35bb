pub mod audit;
pub mod cli;
pub mod config;
pub mod discover;
pub mod export;
pub mod probe;
pub mod report;
pub mod timestamp;
pub mod util;
