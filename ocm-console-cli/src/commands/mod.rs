pub mod access;
pub mod bma;
pub mod configuration;
pub mod import;
