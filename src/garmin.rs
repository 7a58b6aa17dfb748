//! Garmin Connect session adapter over headless Chrome.
//!
//! The portal exposes no export API; exports are driven through the signed-in
//! web UI. This adapter implements the [`ExportSession`] port with a real
//! browser: sign in once, point Chrome's download sink at the destination
//! directory, then per activity open the detail page and click through the
//! More… menu to the GPX export action. The download itself completes
//! asynchronously outside this process; the orchestrator watches the
//! directory for the file.

use std::path::Path;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use headless_chrome::protocol::cdp::Browser::{
    SetDownloadBehavior, SetDownloadBehaviorBehaviorOption,
};
use headless_chrome::{Browser, LaunchOptions, Tab};
use log::debug;

use crate::error::{Result, TrackPackError};
use crate::session::{Credentials, ExportSession};

const PORTAL_URL: &str = "https://connect.garmin.com/modern/";
const ACTIVITY_URL_BASE: &str = "https://connect.garmin.com/modern/activity/";

const REMEMBER_ME: &str = ".signin__form__input--remember";
const EMAIL_FIELD: &str = "#email";
const PASSWORD_FIELD: &str = "#password";
const SUBMIT_BUTTON: &str = ".portal-button > button";
const MORE_MENU: &str = r#"button.dropdown-trigger.page-navigation-action[title="More..."]"#;
const EXPORT_GPX_BUTTON: &str = "#btn-export-gpx";

// The portal renders asynchronously; selector readiness alone is not enough
const NAVIGATION_SETTLE: Duration = Duration::from_secs(2);
const LOGIN_SETTLE: Duration = Duration::from_secs(5);

/// An [`ExportSession`] backed by a real Chrome instance.
pub struct GarminSession {
    // Keeps the browser process alive for the lifetime of the session
    _browser: Browser,
    tab: Arc<Tab>,
}

impl GarminSession {
    /// Launch a visible browser with one tab.
    ///
    /// The sign-in portal rejects obviously automated headless clients, so
    /// the window stays visible.
    pub fn launch() -> Result<Self> {
        let options = LaunchOptions::default_builder()
            .headless(false)
            .build()
            .map_err(|e| TrackPackError::session(e.to_string()))?;
        let browser = Browser::new(options).map_err(Self::err)?;
        let tab = browser.new_tab().map_err(Self::err)?;
        Ok(Self {
            _browser: browser,
            tab,
        })
    }

    fn err(e: impl std::fmt::Display) -> TrackPackError {
        TrackPackError::session(e.to_string())
    }
}

impl ExportSession for GarminSession {
    fn login(&mut self, credentials: &Credentials) -> Result<()> {
        self.tab.navigate_to(PORTAL_URL).map_err(Self::err)?;
        thread::sleep(NAVIGATION_SETTLE);

        self.tab
            .wait_for_element(REMEMBER_ME)
            .map_err(Self::err)?
            .click()
            .map_err(Self::err)?;

        self.tab
            .find_element(EMAIL_FIELD)
            .map_err(Self::err)?
            .type_into(&credentials.email)
            .map_err(Self::err)?;
        debug!("email entered");

        self.tab
            .find_element(PASSWORD_FIELD)
            .map_err(Self::err)?
            .type_into(&credentials.password)
            .map_err(Self::err)?;
        debug!("password entered");

        self.tab
            .find_element(SUBMIT_BUTTON)
            .map_err(Self::err)?
            .click()
            .map_err(Self::err)?;
        debug!("logging in");
        thread::sleep(LOGIN_SETTLE);
        Ok(())
    }

    fn configure_download_dir(&mut self, dir: &Path) -> Result<()> {
        self.tab
            .call_method(SetDownloadBehavior {
                behavior: SetDownloadBehaviorBehaviorOption::Allow,
                browser_context_id: None,
                download_path: Some(dir.display().to_string()),
                events_enabled: None,
            })
            .map_err(Self::err)?;
        Ok(())
    }

    fn navigate_to_activity(&mut self, activity_id: &str) -> Result<()> {
        let url = format!("{}{}", ACTIVITY_URL_BASE, activity_id);
        self.tab
            .navigate_to(&url)
            .map_err(|e| TrackPackError::Session {
                activity_id: Some(activity_id.to_string()),
                message: e.to_string(),
            })?;
        thread::sleep(NAVIGATION_SETTLE);
        Ok(())
    }

    fn trigger_export(&mut self) -> Result<()> {
        self.tab
            .wait_for_element(MORE_MENU)
            .map_err(Self::err)?
            .click()
            .map_err(Self::err)?;
        thread::sleep(NAVIGATION_SETTLE);

        // A parent multisport activity offers no GPX export; the wait then
        // fails and the record is reported as failed.
        self.tab
            .wait_for_element(EXPORT_GPX_BUTTON)
            .map_err(Self::err)?
            .click()
            .map_err(Self::err)?;
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        self.tab.close(false).map_err(Self::err)?;
        Ok(())
    }
}
