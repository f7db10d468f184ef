//! Opt-out registry for users who do not want their messages summarized.

use parking_lot::RwLock;
use rand::Rng;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use tracing::info;

/// Salted hashes of users who opted out.
///
/// Raw user ids are never stored: each entry is
/// `hex(sha256(user_id ‖ salt))`.
///
/// # Examples
///
/// ```
/// use digest_bot::PrivacyRegistry;
///
/// let registry = PrivacyRegistry::new("pepper", Vec::<String>::new());
/// assert!(registry.opt_out(42));
/// assert!(!registry.opt_out(42));
/// assert!(registry.is_opted_out(42));
/// assert!(registry.opt_in(42));
/// assert_eq!(registry.count(), 0);
/// ```
#[derive(Debug)]
pub struct PrivacyRegistry {
    salt: String,
    opted_out: RwLock<HashSet<String>>,
}

impl PrivacyRegistry {
    /// Create a registry from a salt and previously stored hashes.
    pub fn new(salt: impl Into<String>, hashes: impl IntoIterator<Item = String>) -> Self {
        let opted_out: HashSet<String> = hashes.into_iter().collect();
        if !opted_out.is_empty() {
            info!(count = opted_out.len(), "Loaded opted-out users");
        }
        Self {
            salt: salt.into(),
            opted_out: RwLock::new(opted_out),
        }
    }

    /// Create an empty registry with a fresh random salt.
    ///
    /// Hashes made with a random salt cannot be matched after a restart.
    pub fn with_random_salt() -> Self {
        Self::new(generate_salt(), Vec::new())
    }

    /// Salted hash of a user id.
    pub fn hash_user_id(&self, user_id: u64) -> String {
        let digest = Sha256::digest(format!("{}{}", user_id, self.salt).as_bytes());
        format!("{:x}", digest)
    }

    /// Whether the user opted out.
    pub fn is_opted_out(&self, user_id: u64) -> bool {
        let hash = self.hash_user_id(user_id);
        self.opted_out.read().contains(&hash)
    }

    /// Opt the user out. Returns `false` if they already were.
    pub fn opt_out(&self, user_id: u64) -> bool {
        let hash = self.hash_user_id(user_id);
        let added = self.opted_out.write().insert(hash);
        if added {
            info!("User opted out of summarization");
        }
        added
    }

    /// Opt the user back in. Returns `false` if they were not opted out.
    pub fn opt_in(&self, user_id: u64) -> bool {
        let hash = self.hash_user_id(user_id);
        let removed = self.opted_out.write().remove(&hash);
        if removed {
            info!("User opted back into summarization");
        }
        removed
    }

    /// Number of opted-out users.
    pub fn count(&self) -> usize {
        self.opted_out.read().len()
    }

    /// Stored hashes, sorted, for persisting.
    pub fn hashes(&self) -> Vec<String> {
        let mut hashes: Vec<String> = self.opted_out.read().iter().cloned().collect();
        hashes.sort();
        hashes
    }
}

/// 32 random bytes as lowercase hex.
pub fn generate_salt() -> String {
    let bytes: [u8; 32] = rand::thread_rng().r#gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
