pub mod api;
pub mod config;
pub mod directory;
pub mod error;
pub mod models;
pub mod state;
pub mod submit;
pub mod view;
pub mod workers;
