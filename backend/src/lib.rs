pub mod axum_http;
pub mod bootstrap;
pub mod config;
pub mod usecases;
