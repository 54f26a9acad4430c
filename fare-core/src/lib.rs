//! Core library for the `fare` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - Clients for the geocoding, distance-matrix and weather services
//! - The per-city taxi fare table
//! - Trip quotes chaining the above
//!
//! It is used by `fare-cli`, but can also be reused by other binaries or services.

pub mod config;
pub mod error;
pub mod fare;
pub mod model;
pub mod provider;
pub mod quote;

pub use config::{Config, ProviderConfig};
pub use error::ServiceError;
pub use fare::{FareFormula, estimate_fare, formula_for};
pub use model::{Coordinate, Place, RouteEstimate, TravelMode, TripQuote, WeatherSnapshot};
pub use provider::{Geocoder, ProviderId, Resolved, RouteEstimator, WeatherFetcher};
pub use quote::quote_trip;
