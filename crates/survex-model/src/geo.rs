//! Geolocation values handed over by the location-parsing collaborator.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::submission::LONG_DATE_FORMAT;

/// A resolved submission location.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

/// A parsed geolocation capture: `lat,lon[,alt[,timestamp]]` with the
/// timestamp in `YYYY-MM-DDTHH:MM:SS` form.
///
/// The raw device sentence is normalized by the retrieval side; a payload
/// that does not parse is treated as "no data".
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoFix {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
    pub timestamp: Option<NaiveDateTime>,
}

impl GeoFix {
    pub fn parse(payload: &str) -> Option<Self> {
        let mut parts = payload.trim().split(',').map(str::trim);
        let latitude = parts.next()?.parse::<f64>().ok()?;
        let longitude = parts.next()?.parse::<f64>().ok()?;
        let altitude = match parts.next() {
            Some(part) if !part.is_empty() => part.parse::<f64>().ok()?,
            _ => 0.0,
        };
        let timestamp = match parts.next() {
            Some(part) if !part.is_empty() => {
                Some(NaiveDateTime::parse_from_str(part, "%Y-%m-%dT%H:%M:%S").ok()?)
            }
            _ => None,
        };
        if parts.next().is_some() {
            return None;
        }
        Some(Self {
            latitude,
            longitude,
            altitude,
            timestamp,
        })
    }

    /// Composite "latitude longitude timestamp" rendering for the general
    /// location column.
    pub fn summary(&self) -> String {
        match self.timestamp {
            Some(timestamp) => format!(
                "{} {} {}",
                self.latitude,
                self.longitude,
                timestamp.format(LONG_DATE_FORMAT)
            ),
            None => format!("{} {}", self.latitude, self.longitude),
        }
    }
}
