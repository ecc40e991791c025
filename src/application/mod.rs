// Application layer - Command handling, state store and event delivery
pub mod attribute_filter_loader;
pub mod backend;
pub mod command;
pub mod context;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod event_bus;
pub mod handlers;
pub mod resolvers;
pub mod store;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_support;
