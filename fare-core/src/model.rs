use serde::{Deserialize, Serialize};

/// A point in GeoJSON order: longitude first, latitude second.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinate {
    pub fn new(lon: f64, lat: f64) -> Self {
        Self { lon, lat }
    }

    /// `"lat,lon"`, the order the distance-matrix service expects.
    pub fn to_lat_lon(&self) -> String {
        format!("{},{}", self.lat, self.lon)
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from([lon, lat]: [f64; 2]) -> Self {
        Self { lon, lat }
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.lon, self.lat)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    #[default]
    Driving,
    Bicycling,
    Walking,
    Transit,
}

impl TravelMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TravelMode::Driving => "driving",
            TravelMode::Bicycling => "bicycling",
            TravelMode::Walking => "walking",
            TravelMode::Transit => "transit",
        }
    }

    pub const fn all() -> &'static [TravelMode] {
        &[
            TravelMode::Driving,
            TravelMode::Bicycling,
            TravelMode::Walking,
            TravelMode::Transit,
        ]
    }
}

impl std::fmt::Display for TravelMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for TravelMode {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        TravelMode::all()
            .iter()
            .copied()
            .find(|mode| mode.as_str() == lower)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Unknown travel mode '{value}'. Supported modes: driving, bicycling, walking, transit."
                )
            })
    }
}

/// The best geocoding match for an address: where it is and, if known, its city.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub coordinate: Coordinate,
    pub city: Option<String>,
}

/// Distance and travel time for one origin/destination pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RouteEstimate {
    pub distance_km: f64,
    pub duration_secs: f64,
}

/// Raw weather service document, kept as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WeatherSnapshot(pub serde_json::Value);

impl WeatherSnapshot {
    pub fn as_json(&self) -> &serde_json::Value {
        &self.0
    }

    pub fn into_inner(self) -> serde_json::Value {
        self.0
    }
}

/// Result of chaining geocoding, routing and the fare table for one trip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripQuote {
    pub origin: Coordinate,
    pub destination: Coordinate,
    /// City the origin address resolved to, if the geocoder reported one.
    pub city: Option<String>,
    pub mode: TravelMode,
    pub route: RouteEstimate,
    pub fare: f64,
}
