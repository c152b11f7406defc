pub mod app;
pub mod config;
pub mod domain;
pub mod ena;
pub mod error;
pub mod fs_util;
pub mod output;
pub mod report;
pub mod summary;
pub mod table;
