// HTTP API: CSV uploads and sales/category-share analytics

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod server;
pub mod upload;

pub use server::ApiServer;
