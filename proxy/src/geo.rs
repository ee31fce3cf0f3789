//! Static CIDR-table geolocation
//!
//! A configured list of CIDR blocks with country (and optional city) data.
//! This stands in for an external geolocation database; addresses outside
//! every block resolve to unknown, which never triggers the geographical
//! check.

use std::net::IpAddr;

use gateguard_core::{GeoResolver, GuardError, Result};
use ipnet::IpNet;

use crate::config::GeoSettings;

struct GeoSpan {
    net: IpNet,
    country: String,
    city: Option<String>,
}

pub struct StaticGeoResolver {
    spans: Vec<GeoSpan>,
}

impl StaticGeoResolver {
    pub fn from_settings(settings: &GeoSettings) -> Result<Self> {
        let spans = settings
            .entries
            .iter()
            .map(|entry| {
                let net = entry.cidr.parse::<IpNet>().map_err(|e| {
                    GuardError::Config(format!("invalid geo CIDR {}: {e}", entry.cidr))
                })?;
                Ok(GeoSpan {
                    net,
                    country: entry.country.clone(),
                    city: entry.city.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { spans })
    }

    fn span_for(&self, address: &str) -> Option<&GeoSpan> {
        let ip: IpAddr = address.parse().ok()?;
        self.spans.iter().find(|span| span.net.contains(&ip))
    }
}

impl GeoResolver for StaticGeoResolver {
    fn country_code(&self, address: &str) -> Option<String> {
        self.span_for(address).map(|span| span.country.clone())
    }

    fn city(&self, address: &str) -> Option<String> {
        self.span_for(address).and_then(|span| span.city.clone())
    }
}
