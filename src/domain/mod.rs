// Domain layer - Dashboard document model
pub mod catalog;
pub mod dashboard;
pub mod filter;
pub mod layout;
pub mod refs;
pub mod widget;
