pub mod api;
pub mod config;
pub mod error;
pub mod service;
pub mod session;
pub mod storage;
pub mod utils;
