//! Resident account flows: sign-in, password recovery and the profile shown
//! on the settings screen.

pub mod auth;
pub mod profile;
pub mod router;

pub use auth::AccountService;
pub use profile::{Profile, ProfileService, AVATAR_BUCKET, PROFILES_TABLE};
pub use router::account_router;
