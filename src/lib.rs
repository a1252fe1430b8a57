mod database {
    pub mod actions;
    pub mod error;
    pub mod filter;
    pub mod form;
    pub mod pool;
    pub mod schema;
}
mod authentication {
    pub mod cryptography;
    pub mod jwt;
    pub mod middleware;
}
mod api {
    pub mod handlers;
    pub mod rejection;
    pub mod responses;
    pub mod routes;
}
mod constants;

pub mod config;
pub mod media;
pub mod state;

pub use api::*;
pub use authentication::*;
pub use constants::*;
pub use database::*;
