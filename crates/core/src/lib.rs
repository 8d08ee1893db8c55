pub mod delivery;
pub mod emitter;
pub mod error;
pub mod hashing;
pub mod loader;
pub mod localization;
pub mod manifest;
pub mod ordering;
pub mod page;
pub mod registry;
pub mod selection;
pub mod session;
pub mod types;
