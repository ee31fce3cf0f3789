//! Geographical check
//!
//! Restricts where players may connect from, based on the country list
//! (blacklist or whitelist semantics) and the city blacklist.

use std::sync::Arc;

use crate::check::{CheckDescriptor, CheckMode};
use crate::config::GeographicalSettings;
use crate::geo::GeoResolver;
use crate::user::ConnectingUser;

pub struct GeographicalCheck {
    descriptor: CheckDescriptor,
    mode: CheckMode,
    message: String,
    is_blacklist: bool,
    countries: Vec<String>,
    city_blacklist: Vec<String>,
    geo: Arc<dyn GeoResolver>,
}

impl GeographicalCheck {
    pub fn new(
        settings: &GeographicalSettings,
        message: String,
        geo: Arc<dyn GeoResolver>,
    ) -> Self {
        Self {
            descriptor: CheckDescriptor::new("geographical", settings.priority),
            mode: settings.check_mode,
            message,
            is_blacklist: settings.is_blacklist,
            countries: settings.countries.clone(),
            city_blacklist: settings.city_blacklist.clone(),
            geo,
        }
    }

    pub fn descriptor(&self) -> &CheckDescriptor {
        &self.descriptor
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_detected(&self, user: &ConnectingUser, under_attack: bool) -> bool {
        self.mode
            .evaluate(under_attack, self.is_restricted(&user.address))
    }

    /// An address with no resolvable location fails open: an unknown
    /// country or city never satisfies a membership test.
    fn is_restricted(&self, address: &str) -> bool {
        if let Some(city) = self.geo.city(address).filter(|c| !c.is_empty()) {
            if self
                .city_blacklist
                .iter()
                .any(|blocked| blocked.eq_ignore_ascii_case(&city))
            {
                return true;
            }
        }

        let Some(country) = self.geo.country_code(address).filter(|c| !c.is_empty()) else {
            return false;
        };
        let listed = self
            .countries
            .iter()
            .any(|code| code.eq_ignore_ascii_case(&country));

        if self.is_blacklist {
            listed
        } else {
            !listed
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TableGeo {
        country: Option<&'static str>,
        city: Option<&'static str>,
    }

    impl GeoResolver for TableGeo {
        fn country_code(&self, _address: &str) -> Option<String> {
            self.country.map(str::to_string)
        }

        fn city(&self, _address: &str) -> Option<String> {
            self.city.map(str::to_string)
        }
    }

    fn check(settings: GeographicalSettings, geo: TableGeo) -> GeographicalCheck {
        GeographicalCheck::new(&settings, "geo".to_string(), Arc::new(geo))
    }

    fn user() -> ConnectingUser {
        ConnectingUser::new("203.0.113.5", "Steve")
    }

    #[test]
    fn whitelist_mode_blocks_unlisted_countries() {
        let settings = GeographicalSettings {
            check_mode: CheckMode::Always,
            is_blacklist: false,
            countries: vec!["US".to_string(), "DE".to_string()],
            ..GeographicalSettings::default()
        };
        let check = check(
            settings,
            TableGeo {
                country: Some("PL"),
                city: None,
            },
        );
        assert!(check.is_detected(&user(), false));
    }

    #[test]
    fn whitelist_mode_admits_listed_countries() {
        let settings = GeographicalSettings {
            check_mode: CheckMode::Always,
            is_blacklist: false,
            countries: vec!["US".to_string(), "DE".to_string()],
            ..GeographicalSettings::default()
        };
        let check = check(
            settings,
            TableGeo {
                country: Some("DE"),
                city: None,
            },
        );
        assert!(!check.is_detected(&user(), false));
    }

    #[test]
    fn blacklist_mode_blocks_listed_countries() {
        let settings = GeographicalSettings {
            check_mode: CheckMode::Always,
            is_blacklist: true,
            countries: vec!["US".to_string()],
            ..GeographicalSettings::default()
        };
        let check = check(
            settings,
            TableGeo {
                country: Some("US"),
                city: None,
            },
        );
        assert!(check.is_detected(&user(), false));
    }

    #[test]
    fn blacklisted_city_always_blocks() {
        let settings = GeographicalSettings {
            check_mode: CheckMode::Always,
            is_blacklist: true,
            countries: Vec::new(),
            city_blacklist: vec!["ExampleCity".to_string()],
            ..GeographicalSettings::default()
        };
        let check = check(
            settings,
            TableGeo {
                country: Some("US"),
                city: Some("ExampleCity"),
            },
        );
        assert!(check.is_detected(&user(), false));
    }

    #[test]
    fn unknown_location_fails_open() {
        let settings = GeographicalSettings {
            check_mode: CheckMode::Always,
            is_blacklist: false,
            countries: vec!["US".to_string()],
            ..GeographicalSettings::default()
        };
        let check = check(
            settings,
            TableGeo {
                country: None,
                city: None,
            },
        );
        assert!(!check.is_detected(&user(), false));
    }

    #[test]
    fn never_mode_suppresses_detection() {
        let settings = GeographicalSettings {
            check_mode: CheckMode::Never,
            is_blacklist: true,
            countries: vec!["US".to_string()],
            ..GeographicalSettings::default()
        };
        let check = check(
            settings,
            TableGeo {
                country: Some("US"),
                city: None,
            },
        );
        assert!(!check.is_detected(&user(), true));
    }
}
