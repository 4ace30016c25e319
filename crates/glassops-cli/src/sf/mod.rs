//! Salesforce CLI collaborators.

pub mod analyzer;
pub mod exec;
pub mod identity;
pub mod installer;

pub use identity::SfIdentity;
pub use installer::SfInstaller;
