pub mod config;
pub mod engine;
pub mod error;
pub mod focus;
pub mod model;
pub mod notify;
pub mod player;
pub mod session;
pub mod vibration;
pub mod wake;

#[cfg(test)]
pub(crate) mod harness;
