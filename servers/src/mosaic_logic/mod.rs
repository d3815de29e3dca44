pub mod config;
pub mod controls;
pub mod logger;
pub mod sink;
