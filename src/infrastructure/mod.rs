// Infrastructure layer - Configuration and backend adapters
pub mod config;
pub mod memory_backend;
