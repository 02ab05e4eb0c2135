pub mod config;
pub mod logging;

pub mod aggregate;
pub mod batch;
pub mod cache;
pub mod checksum;
pub mod control;
pub mod credential;
pub mod driver;
pub mod error;
pub mod fetcher;
pub mod http;
pub mod outcome;
pub mod planner;
pub mod progress;
pub mod request;
pub mod retry;
pub mod storage;

#[cfg(test)]
pub(crate) mod testing;
