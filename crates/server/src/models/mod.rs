//! Domain models for the directory.
//!
//! Types here are validated domain objects. Database row types live in the
//! repositories under [`crate::db`] and are converted into these via `TryFrom`.

pub mod admin_user;
pub mod category;
pub mod session;
pub mod shop;
pub mod submission;

pub use admin_user::{AdminProfile, AdminUser};
pub use category::{Category, CategoryFields, CategoryWithCount};
pub use session::{CurrentAdmin, Session};
pub use shop::{Shop, ShopFields, ShopListing};
pub use submission::{NewSubmission, Submission};
