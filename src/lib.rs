pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod observability;
pub mod repositories;
pub mod services;
pub mod storage;
