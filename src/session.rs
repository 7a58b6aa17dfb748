//! The export-session port the orchestrator drives.
//!
//! The remote service is a stateful external capability, not a library to
//! embed. Everything the batch loop needs from it fits in five operations,
//! which keeps the retry and dedup logic testable with a scripted fake.

use std::fmt;
use std::path::Path;

use crate::error::{Result, TrackPackError};

/// Account credentials, supplied out of band via the environment.
#[derive(Clone)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub const EMAIL_VAR: &'static str = "GARMIN_CONNECT_EMAIL";
    pub const PASSWORD_VAR: &'static str = "GARMIN_CONNECT_PASSW";

    /// Read credentials from the environment. Missing variables are a
    /// configuration error.
    pub fn from_env() -> Result<Self> {
        let email = std::env::var(Self::EMAIL_VAR)
            .map_err(|_| TrackPackError::config(format!("{} is not set", Self::EMAIL_VAR)))?;
        let password = std::env::var(Self::PASSWORD_VAR)
            .map_err(|_| TrackPackError::config(format!("{} is not set", Self::PASSWORD_VAR)))?;
        Ok(Self { email, password })
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// An authenticated session against the remote export service.
///
/// One session is shared by a whole batch and must only be driven
/// sequentially.
pub trait ExportSession {
    /// Authenticate the session. Called once, before any other operation.
    fn login(&mut self, credentials: &Credentials) -> Result<()>;

    /// Point the session's download mechanism at `dir`. Called once per
    /// batch; exported files materialize there outside this process's
    /// control.
    fn configure_download_dir(&mut self, dir: &Path) -> Result<()>;

    /// Open the detail view for one activity.
    fn navigate_to_activity(&mut self, activity_id: &str) -> Result<()>;

    /// Invoke the export action on the currently open activity.
    ///
    /// Returns once the action is issued. Completion is only observable as
    /// a file appearing in the configured download directory.
    fn trigger_export(&mut self) -> Result<()>;

    /// Release the session. Called once after the batch, regardless of
    /// per-record outcomes.
    fn close(&mut self) -> Result<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_debug_redacts_password() {
        let creds = Credentials {
            email: "rider@example.com".to_string(),
            password: "hunter2".to_string(),
        };
        let debug = format!("{:?}", creds);
        assert!(debug.contains("rider@example.com"));
        assert!(!debug.contains("hunter2"));
    }
}
