pub mod api;
pub mod database_ops;
pub mod normalization;
pub mod telemetry;

pub mod util {
    pub mod env;
}
