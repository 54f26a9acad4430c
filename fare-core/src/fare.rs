//! Taxi fare estimation from route distance and the origin city.
//!
//! Each city maps to a [`FareFormula`]; the fare grows linearly past a
//! flag-fall distance. Cities are matched exactly, so spelling and case
//! matter. Anything not in [`FARE_TABLE`] uses [`DEFAULT_FORMULA`].
//!
//! Adding a city is a matter of adding a row.

use serde::Serialize;

/// Parameters of a per-city linear fare.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FareFormula {
    /// Flag-fall fare.
    pub base: f64,
    /// Distance in meters covered by the flag-fall fare.
    pub threshold_m: f64,
    /// Distance in meters per fare increment.
    pub increment_m: f64,
    /// Fare added per increment.
    pub increment_fare: f64,
}

impl FareFormula {
    const fn new(base: f64, threshold_m: f64, increment_m: f64) -> Self {
        Self {
            base,
            threshold_m,
            increment_m,
            increment_fare: 5.0,
        }
    }

    /// `base + ((km * 1000 - threshold) / increment) * increment_fare`.
    ///
    /// Not clamped: distances under the threshold come out below `base`.
    pub fn apply(&self, distance_km: f64) -> f64 {
        self.base
            + ((distance_km * 1000.0 - self.threshold_m) / self.increment_m) * self.increment_fare
    }
}

/// A formula together with every city name that selects it.
#[derive(Debug, Clone, Copy)]
pub struct FareRow {
    pub cities: &'static [&'static str],
    pub formula: FareFormula,
}

pub const DEFAULT_FORMULA: FareFormula = FareFormula::new(90.0, 1250.0, 200.0);

pub const FARE_TABLE: &[FareRow] = &[
    FareRow {
        cities: &["Keelong", "New Taipei", "Taipei"],
        formula: FareFormula::new(85.0, 1250.0, 200.0),
    },
    FareRow {
        cities: &["Taoyuan City", "Taoyuan"],
        formula: FareFormula::new(90.0, 1250.0, 200.0),
    },
    FareRow {
        cities: &["Hsinchu"],
        formula: FareFormula::new(100.0, 1250.0, 200.0),
    },
    FareRow {
        cities: &["Taichung"],
        formula: FareFormula::new(85.0, 1500.0, 200.0),
    },
    FareRow {
        cities: &["Taibao City", "CHiayi"],
        formula: FareFormula::new(100.0, 1250.0, 220.0),
    },
    FareRow {
        cities: &["Tainan"],
        formula: FareFormula::new(85.0, 1250.0, 200.0),
    },
    FareRow {
        cities: &["Kaoshiung"],
        formula: FareFormula::new(85.0, 1250.0, 200.0),
    },
    FareRow {
        cities: &["Maioli City", "Maioli"],
        formula: FareFormula::new(100.0, 1250.0, 200.0),
    },
    FareRow {
        cities: &["Douliu City", "Douliu", "Yunlin"],
        formula: FareFormula::new(100.0, 1250.0, 220.0),
    },
    FareRow {
        cities: &["Zhanghua City", "Zhanghua"],
        formula: FareFormula::new(100.0, 1500.0, 250.0),
    },
];

/// The formula used for `city`, falling back to [`DEFAULT_FORMULA`].
pub fn formula_for(city: &str) -> &'static FareFormula {
    FARE_TABLE
        .iter()
        .find(|row| row.cities.iter().any(|name| *name == city))
        .map(|row| &row.formula)
        .unwrap_or(&DEFAULT_FORMULA)
}

/// Estimated fare for a trip of `distance_km` starting in `city`.
pub fn estimate_fare(distance_km: f64, city: &str) -> f64 {
    formula_for(city).apply(distance_km)
}

/// Every city name the table recognises, in table order.
pub fn known_cities() -> impl Iterator<Item = &'static str> {
    FARE_TABLE.iter().flat_map(|row| row.cities.iter().copied())
}
