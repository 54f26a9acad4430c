//! Chaining the lookups for a taxi quote: geocode both ends, route between
//! them, then price the distance with the origin city's fare formula.

use tracing::instrument;

use crate::{
    error::ServiceError,
    fare::estimate_fare,
    model::{TravelMode, TripQuote},
    provider::{Geocoder, RouteEstimator},
};

#[instrument(skip(geocoder, router))]
pub async fn quote_trip(
    geocoder: &dyn Geocoder,
    router: &dyn RouteEstimator,
    origin_address: &str,
    destination_address: &str,
    mode: TravelMode,
) -> Result<TripQuote, ServiceError> {
    // One lookup per address: coordinate and city come from the same match.
    let origin = geocoder.locate(origin_address).await?;
    if origin.city.is_none() {
        tracing::debug!("origin has no city, using default fare");
    }

    let destination = geocoder.locate(destination_address).await?.coordinate;
    let route = router
        .estimate_route(origin.coordinate, destination, mode)
        .await?;
    let fare = estimate_fare(route.distance_km, origin.city.as_deref().unwrap_or_default());

    Ok(TripQuote {
        origin: origin.coordinate,
        destination,
        city: origin.city,
        mode,
        route,
        fare,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Coordinate, Place, RouteEstimate};
    use async_trait::async_trait;
    use std::{collections::HashMap, sync::Mutex};

    #[derive(Debug, Default)]
    struct StubGeocoder {
        places: HashMap<&'static str, (Coordinate, Option<&'static str>)>,
        lookups: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Geocoder for StubGeocoder {
        async fn coordinate(&self, address: &str) -> Result<Coordinate, ServiceError> {
            self.places
                .get(address)
                .map(|(c, _)| *c)
                .ok_or_else(|| ServiceError::NoMatch {
                    address: address.to_string(),
                })
        }

        async fn city(&self, address: &str) -> Result<String, ServiceError> {
            match self.places.get(address) {
                Some((_, Some(city))) => Ok(city.to_string()),
                Some((_, None)) => Err(ServiceError::MissingField {
                    service: "stub",
                    field: "properties.city",
                }),
                None => Err(ServiceError::NoMatch {
                    address: address.to_string(),
                }),
            }
        }

        async fn locate(&self, address: &str) -> Result<Place, ServiceError> {
            self.lookups.lock().unwrap().push(address.to_string());
            self.places
                .get(address)
                .map(|(coordinate, city)| Place {
                    coordinate: *coordinate,
                    city: city.map(str::to_string),
                })
                .ok_or_else(|| ServiceError::NoMatch {
                    address: address.to_string(),
                })
        }
    }

    #[derive(Debug)]
    struct StubRouter {
        route: RouteEstimate,
        calls: Mutex<Vec<(Coordinate, Coordinate, TravelMode)>>,
    }

    impl StubRouter {
        fn new(distance_km: f64) -> Self {
            Self {
                route: RouteEstimate {
                    distance_km,
                    duration_secs: 420.0,
                },
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl RouteEstimator for StubRouter {
        async fn estimate_route(
            &self,
            origin: Coordinate,
            destination: Coordinate,
            mode: TravelMode,
        ) -> Result<RouteEstimate, ServiceError> {
            self.calls.lock().unwrap().push((origin, destination, mode));
            Ok(self.route)
        }
    }

    fn geocoder() -> StubGeocoder {
        let mut places = HashMap::new();
        places.insert("Taipei Main Station", (Coordinate::new(121.517, 25.047), Some("Taipei")));
        places.insert("Taichung Park", (Coordinate::new(120.684, 24.145), Some("Taichung")));
        places.insert("Somewhere rural", (Coordinate::new(121.0, 24.0), None));
        StubGeocoder {
            places,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn prices_with_origin_city() {
        let geocoder = geocoder();
        let router = StubRouter::new(3.25);
        let quote = quote_trip(
            &geocoder,
            &router,
            "Taipei Main Station",
            "Taichung Park",
            TravelMode::Driving,
        )
        .await
        .unwrap();

        assert_eq!(quote.city.as_deref(), Some("Taipei"));
        assert_eq!(quote.fare, 85.0 + 2000.0 / 200.0 * 5.0);
        assert_eq!(quote.route.duration_secs, 420.0);

        assert_eq!(
            *geocoder.lookups.lock().unwrap(),
            vec!["Taipei Main Station".to_string(), "Taichung Park".to_string()]
        );

        let calls = router.calls.lock().unwrap();
        assert_eq!(
            calls.as_slice(),
            &[(
                Coordinate::new(121.517, 25.047),
                Coordinate::new(120.684, 24.145),
                TravelMode::Driving
            )]
        );
    }

    #[tokio::test]
    async fn missing_city_uses_default_formula() {
        let quote = quote_trip(
            &geocoder(),
            &StubRouter::new(1.25),
            "Somewhere rural",
            "Taipei Main Station",
            TravelMode::Transit,
        )
        .await
        .unwrap();

        assert_eq!(quote.city, None);
        assert_eq!(quote.fare, 90.0);
        assert_eq!(quote.mode, TravelMode::Transit);
    }

    #[tokio::test]
    async fn unknown_destination_is_no_match() {
        let router = StubRouter::new(1.0);
        let err = quote_trip(
            &geocoder(),
            &router,
            "Taipei Main Station",
            "Atlantis",
            TravelMode::Driving,
        )
        .await
        .unwrap_err();

        assert!(err.is_no_match());
        assert!(router.calls.lock().unwrap().is_empty());
    }
}
