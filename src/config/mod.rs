/// Database configuration and connection management
pub mod database;

/// Application settings and category catalog loading from config.toml
pub mod settings;
