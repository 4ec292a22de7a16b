//! Folding several profiles into one effective profile.

use super::models::Profile;

/// Merges profiles left to right into one effective profile.
///
/// The last non-empty base URL wins, `allowInsecure` is set if any profile sets
/// it, header values accumulate per key in order, and variables and named
/// requests are last-write-wins per key.
///
/// # Examples
///
/// ```
/// use http_cli::profile::{merge_profiles, Profile};
///
/// let mut a = Profile::default();
/// a.base_url = "http://a.test".to_string();
/// let b = Profile::default();
///
/// assert_eq!(merge_profiles(&[a, b]).base_url, "http://a.test");
/// ```
pub fn merge_profiles(profiles: &[Profile]) -> Profile {
    let mut merged = Profile::default();

    for profile in profiles {
        if !profile.base_url.is_empty() {
            merged.base_url = profile.base_url.clone();
        }
        merged.allow_insecure |= profile.allow_insecure;

        for (name, values) in &profile.headers {
            merged
                .headers
                .entry(name.clone())
                .or_default()
                .extend(values.iter().cloned());
        }
        for (name, value) in &profile.variables {
            merged.variables.insert(name.clone(), value.clone());
        }
        for (name, request) in &profile.named_requests {
            merged.named_requests.insert(name.clone(), request.clone());
        }
    }

    merged
}
