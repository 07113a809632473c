//! Business logic behind the HTTP handlers.

pub mod auth;
pub mod email;
pub mod images;
pub mod notifier;
pub mod photos;
pub mod reports;
pub mod review;

pub use auth::{AuthError, AuthService};
pub use email::{EmailError, EmailService};
pub use images::{ImageError, ImageStore};
pub use notifier::{EmailQueue, LogOnlyNotifier, Notification, NotificationKind, Notifier};
pub use photos::{PhotoSearchClient, PhotoSearchError};
pub use reports::{ReportError, ReportService};
pub use review::{ReviewDecision, ReviewError, ReviewService};
