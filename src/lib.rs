pub mod api;
pub mod config;
pub mod demo;
pub mod handlers;
pub mod observability;
