use derive_more::Display;
use serde::{Deserialize, Serialize};

/// User-facing engine failures. Every variant renders to the exact string the
/// presentation layer shows, so the error slot can hold plain display text.
#[derive(Display, Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub enum AppError {
    #[display("Another operation is currently in progress")]
    OperationInProgress,
    #[display("No Satisfactory installs found.")]
    NoInstallsFound,
    #[display("1 Satisfactory install was found, but it points to a folder that doesn't exist.")]
    InvalidInstallFound,
    #[display("{_0} Satisfactory installs were found, but all of them point to folders that don't exist.")]
    InvalidInstallsFound(usize),
    #[display("No game install is selected.")]
    NoSelectedInstall,
    #[display("Unknown install location: {_0}")]
    UnknownInstall(String),
    #[display("Unknown profile: {_0}")]
    UnknownProfile(String),
    #[display("The vanilla profile cannot be changed or removed.")]
    ReservedProfile,
    #[display("{_0}")]
    Platform(String),
}

impl std::error::Error for AppError {}

/// Opaque failure reported by the mod-management library. The engine never
/// inspects it beyond its message.
#[derive(Display, Clone, Debug, PartialEq, Eq)]
#[display("{_0}")]
pub struct PlatformError(pub String);

impl PlatformError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

impl std::error::Error for PlatformError {}

impl From<PlatformError> for AppError {
    fn from(err: PlatformError) -> Self {
        AppError::Platform(err.0)
    }
}

/// Picks the singular or plural wording for an all-invalid install scan.
pub fn invalid_installs_error(count: usize) -> AppError {
    if count == 1 {
        AppError::InvalidInstallFound
    } else {
        AppError::InvalidInstallsFound(count)
    }
}
