pub mod api;
pub mod app;
pub mod config;
pub mod order;
pub mod state;
