//! Database schemas for coffer
//!
//! Defines MongoDB document structures for profiles and announcements.

mod announcement;
mod metadata;
mod profile;

pub use announcement::{AnnouncementDoc, ANNOUNCEMENT_COLLECTION};
pub use metadata::Metadata;
pub use profile::{ProfileDoc, PROFILE_COLLECTION};
