pub mod config;
pub mod engine;
pub mod errors;
pub mod models;
pub mod store;
#[cfg(test)]
pub mod test_helpers;
