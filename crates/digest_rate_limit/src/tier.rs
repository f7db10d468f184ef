//! Provider quota presets.

/// Published quotas of an API tier. `None` means the provider does not enforce that quota.
pub trait Tier {
    /// Requests per minute.
    fn rpm(&self) -> Option<u32>;

    /// Tokens per minute.
    fn tpm(&self) -> Option<u64>;

    /// Requests per day.
    fn rpd(&self) -> Option<u32>;

    /// Human-readable tier name.
    fn name(&self) -> &str;
}
