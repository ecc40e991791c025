// Resolvers - phase-1 lookups shared by the command handlers
pub mod filter_settings;
pub mod filter_values;
pub mod identity;
pub mod index;
pub mod items;
pub mod stash;
pub mod widget_filters;
