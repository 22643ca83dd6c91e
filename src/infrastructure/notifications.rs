//! Desktop notifications, compiled in with the `notify` feature.

use crate::domain::ports::NotificationPort;

#[cfg(feature = "notify")]
mod notify_impl {
    use super::NotificationPort;
    use notify_rust::Notification;
    use tracing::warn;

    /// Shows notifications through the desktop notification daemon.
    #[derive(Debug, Clone)]
    pub struct DesktopNotificationService {
        enabled: bool,
        app_name: String,
    }

    impl DesktopNotificationService {
        /// Creates the service. A disabled service drops everything.
        #[must_use]
        pub fn new(enabled: bool, app_name: impl Into<String>) -> Self {
            Self {
                enabled,
                app_name: app_name.into(),
            }
        }

        fn show(app_name: &str, title: &str, body: &str) {
            if let Err(e) = Notification::new()
                .summary(title)
                .body(body)
                .appname(app_name)
                .show()
            {
                warn!(error = %e, "Failed to show notification");
            }
        }
    }

    impl NotificationPort for DesktopNotificationService {
        fn send(&self, title: &str, body: &str) {
            if !self.enabled {
                return;
            }

            let app_name = self.app_name.clone();
            let title = title.to_string();
            let body = body.to_string();
            match tokio::runtime::Handle::try_current() {
                Ok(handle) => {
                    handle.spawn_blocking(move || Self::show(&app_name, &title, &body));
                }
                Err(_) => Self::show(&app_name, &title, &body),
            }
        }
    }
}

#[cfg(not(feature = "notify"))]
mod stub_impl {
    use super::NotificationPort;
    use tracing::debug;

    /// Notification sink for builds without desktop support.
    #[derive(Debug, Clone, Default)]
    pub struct DesktopNotificationService;

    impl DesktopNotificationService {
        /// Creates the service. Every notification is dropped.
        #[must_use]
        pub fn new(_enabled: bool, _app_name: impl Into<String>) -> Self {
            Self
        }
    }

    impl NotificationPort for DesktopNotificationService {
        fn send(&self, title: &str, _body: &str) {
            debug!(title, "Notification dropped, built without desktop support");
        }
    }
}

#[cfg(feature = "notify")]
pub use notify_impl::DesktopNotificationService;
#[cfg(not(feature = "notify"))]
pub use stub_impl::DesktopNotificationService;
