pub mod catalog;
pub mod config;
pub mod prompts;
pub mod recommend;
pub mod session;
pub mod tab;
pub mod ui;
