pub mod clock;
pub mod config;
pub mod handlers;
pub mod identity;
pub mod models;
pub mod routes;
pub mod state;
pub mod status;
pub mod store;
pub mod utils;
