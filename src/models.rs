pub mod error;
pub mod filters;
pub mod install;
pub mod mod_entry;
pub mod progress;
pub mod snapshot;
