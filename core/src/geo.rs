//! Geolocation boundary
//!
//! Country/city resolution is an external collaborator; the engine only
//! consumes it through this trait. Resolvers return `None` for addresses
//! they cannot place, and an unknown location never satisfies a blacklist
//! membership test.

/// Black-box geolocation resolver.
pub trait GeoResolver: Send + Sync {
    /// ISO 3166 country code for the address, if known.
    fn country_code(&self, address: &str) -> Option<String>;

    /// City name for the address, if known.
    fn city(&self, address: &str) -> Option<String>;
}

/// Resolver that knows nothing. Hosts without a geolocation database use
/// this; the geographical check then fails open for every address.
#[derive(Debug, Default)]
pub struct NullGeoResolver;

impl GeoResolver for NullGeoResolver {
    fn country_code(&self, _address: &str) -> Option<String> {
        None
    }

    fn city(&self, _address: &str) -> Option<String> {
        None
    }
}
