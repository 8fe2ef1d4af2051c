pub mod agenda;
pub mod common;
pub mod completions;
pub mod config;
pub mod export;
pub mod job;
pub mod note;
pub mod project;
pub mod sync;
pub mod task;
pub mod watch;
