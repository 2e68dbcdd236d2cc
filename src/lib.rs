pub mod audit;
pub mod config;
pub mod errors;
pub mod migrate;
pub mod rest;
pub mod schema;
pub mod ui;
