/// GateGuard - connection admission control for game servers
///
/// This is the root crate that provides workspace-level documentation.
/// Actual implementation is in the subcrates:
/// - `gateguard-core`: The admission pipeline, heuristic checks and address cache
/// - `gateguard-proxy`: Collaborator adapters, admin console and the guard binary

/// This module is intentionally empty as the actual implementation
/// is in the subcrates.
/// Returns the version of the package.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
