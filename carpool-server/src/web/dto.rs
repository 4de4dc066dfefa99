//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::allocation::NewCar;
use crate::domain::Car;
use crate::service::FleetStatus;

/// A car in a `PUT /cars` body.
#[derive(Debug, Deserialize)]
pub struct CarRequest {
    /// Car id
    pub id: u32,

    /// Total seats, 4 to 6
    pub seats: u32,
}

impl From<&CarRequest> for NewCar {
    fn from(req: &CarRequest) -> Self {
        NewCar::new(req.id, req.seats)
    }
}

/// Body of `POST /journey`.
#[derive(Debug, Deserialize)]
pub struct JourneyRequest {
    /// Journey id
    pub id: u32,

    /// Group size
    pub passengers: u32,
}

/// Form body of `POST /dropoff` and `POST /locate`.
#[derive(Debug, Deserialize)]
pub struct JourneyIdForm {
    #[serde(rename = "ID")]
    pub id: u32,
}

/// A car as returned by `POST /locate`.
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CarView {
    pub id: u32,
    pub seats: u32,
    pub available_seats: u32,
}

impl From<&Car> for CarView {
    fn from(car: &Car) -> Self {
        Self {
            id: car.id.0,
            seats: car.total_seats,
            available_seats: car.available_seats,
        }
    }
}

/// Response for `GET /status`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub status: &'static str,
    pub cars: usize,
    pub total_seats: u32,
    pub available_seats: u32,
    pub assigned_journeys: usize,
    pub pending_journeys: usize,
}

impl From<FleetStatus> for StatusResponse {
    fn from(status: FleetStatus) -> Self {
        Self {
            status: "ok",
            cars: status.cars,
            total_seats: status.total_seats,
            available_seats: status.available_seats,
            assigned_journeys: status.assigned_journeys,
            pending_journeys: status.pending_journeys,
        }
    }
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CarId;

    #[test]
    fn car_view_uses_camel_case() {
        let mut car = Car::new(CarId(3), 5).unwrap();
        car.take_seats(2).unwrap();

        let json = serde_json::to_value(CarView::from(&car)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"id": 3, "seats": 5, "availableSeats": 3})
        );
    }

    #[test]
    fn parse_fleet_request() {
        let cars: Vec<CarRequest> =
            serde_json::from_str(r#"[{"id":1,"seats":4},{"id":2,"seats":6}]"#).unwrap();
        let fleet: Vec<NewCar> = cars.iter().map(NewCar::from).collect();
        assert_eq!(fleet, vec![NewCar::new(1, 4), NewCar::new(2, 6)]);
    }

    #[test]
    fn negative_seats_do_not_parse() {
        assert!(serde_json::from_str::<CarRequest>(r#"{"id":1,"seats":-4}"#).is_err());
    }
}
