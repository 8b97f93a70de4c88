pub mod config;
pub mod controllers;
pub mod dispatch;
pub mod errors;
pub mod event_handling;
pub mod facility;
pub mod init;
pub mod models;
pub mod monitoring;
pub mod state_management;
pub mod utils;
