// Dashboard engine - command processing over a single dashboard document
pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod presentation;
