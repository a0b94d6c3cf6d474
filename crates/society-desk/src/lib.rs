//! Resident desk for a housing society.
//!
//! The crate holds the client-side rules of the society app: the maintenance
//! request tracker, session handling, account and profile flows, and the
//! community boards. Persistence, authentication and file storage live in a
//! hosted backend reached through [`gateway::Gateway`].

pub mod account;
pub mod community;
pub mod config;
pub mod error;
pub mod gateway;
pub mod maintenance;
pub mod session;
pub mod telemetry;
