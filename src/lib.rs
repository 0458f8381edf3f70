pub mod api_connection;
pub mod chat;
pub mod cli;
pub mod config;
pub mod generation;
pub mod progress;
pub mod recipe_library;
pub mod recipe_parser;
pub mod speech;
pub mod timer;
