//! Profile Resolver.
//!
//! Loads named profile documents, resolves their `import` chains and merges a
//! list of profiles into one effective profile.

pub mod loader;
pub mod merge;
pub mod models;

pub use loader::{parse_profile_document, ProfileDocument, ProfileError, ProfileLoader};
pub use merge::merge_profiles;
pub use models::{NamedRequest, Profile};
