pub mod authenticator;
pub mod authorization;
pub mod context;
pub mod errors;
pub mod models;
pub mod ports;
pub mod service;

#[cfg(test)]
pub(crate) mod mocks;
