pub mod config;
pub mod error;
pub mod fanout;
pub mod lifecycle;
pub mod logging;
pub mod models;
pub mod registry;
pub mod schema;
pub mod server;
pub mod services;
pub mod state;
pub mod store;
