//! Hardware identifier port.

/// Produces and validates a machine fingerprint string.
///
/// Implementations must be deterministic on unchanged hardware and
/// idempotent across process restarts. The default implementation lives
/// in `licensehub-client`; node-locked validation and concurrent seat
/// tracking both consume this port.
pub trait HardwareIdentifier: Send + Sync + 'static {
    /// Return the fingerprint of the current machine.
    fn get(&self) -> String;

    /// Check whether `candidate` identifies the current machine.
    fn validate(&self, candidate: &str) -> bool;
}
