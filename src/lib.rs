pub mod app;
pub mod config;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod services;
pub mod validation;

#[cfg(test)]
pub(crate) mod test_utils;
