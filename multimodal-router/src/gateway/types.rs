//! Schedule API wire DTOs.
//!
//! These types map directly to the JSON bodies of the schedule service.
//! They use `Option` liberally because upstream carriers omit fields rather
//! than sending null values.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::domain::NodeId;
use crate::graph::Graph;

/// Response from `GET /api/nearest`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NearestResponse {
    #[serde(default)]
    pub airports: Vec<HubRecord>,
    #[serde(default)]
    pub seaports: Vec<HubRecord>,
}

/// An airport or seaport as listed by the nearest-hub lookup.
#[derive(Debug, Clone, Deserialize)]
pub struct HubRecord {
    pub code: Option<String>,
    pub name: Option<String>,
    /// Some listings only carry the airport-specific name field.
    pub airport_name: Option<String>,
    /// Some listings only carry the port-specific name field.
    pub main_port_name: Option<String>,
    pub latitude_dd: Option<f64>,
    pub longitude_dd: Option<f64>,
}

/// Body of `POST /api/air-cargo`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AirCargoRequest<'a> {
    pub origin: &'a str,
    pub destination: &'a str,
    pub flight_date: NaiveDate,
}

/// Response from `POST /api/air-cargo`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AirCargoResponse {
    #[serde(default)]
    pub records: Vec<FlightRecord>,
}

/// One bookable air itinerary.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightRecord {
    pub flight_number: Option<String>,
    pub airline: Option<String>,
    /// Used when `airline` is absent.
    pub carrier: Option<String>,
    pub departure_time: Option<String>,
    pub arrival_time: Option<String>,
    /// Hours.
    pub duration: Option<f64>,
    pub cost: Option<f64>,
    pub emissions: Option<f64>,
    #[serde(default)]
    pub segments: Vec<FlightSegmentRecord>,
}

/// A single flight within an itinerary.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlightSegmentRecord {
    pub departure_airport: Option<String>,
    pub arrival_airport: Option<String>,
    pub departure_time: Option<String>,
    pub arrival_time: Option<String>,
}

/// Body of `POST /api/hapag-routes`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HapagRequest<'a> {
    pub start_location: &'a str,
    pub end_location: &'a str,
    pub start_date: NaiveDate,
    pub container_type: &'static str,
}

/// Container type requested for every sea schedule query.
pub const CONTAINER_TYPE: &str = "45GP";

/// Response from `POST /api/hapag-routes`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HapagResponse {
    #[serde(default)]
    pub routes: Vec<HapagRoute>,
}

/// A carrier routing made of one or more legs.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HapagRoute {
    pub routing_id: Option<String>,
    pub transit_time_in_days: Option<f64>,
    pub place_of_receipt_date_time: Option<String>,
    pub place_of_delivery_date_time: Option<String>,
    #[serde(default)]
    pub legs: Vec<HapagLeg>,
}

/// One vessel movement between two ports.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HapagLeg {
    pub departure_location: Option<HapagLocation>,
    pub arrival_location: Option<HapagLocation>,
    pub departure_date_time: Option<String>,
    pub arrival_date_time: Option<String>,
    pub vessel_details: Option<VesselDetails>,
    pub service_name: Option<String>,
    pub service_code: Option<String>,
    pub voyage_number: Option<String>,
    pub schedule_voyage_number: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HapagLocation {
    pub un_location_code: Option<String>,
    pub location_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VesselDetails {
    pub name: Option<String>,
    pub imo_number: Option<String>,
}

/// Body of `POST /api/intermediate-ship-routes`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntermediateRoutesRequest<'a> {
    pub path: &'a [NodeId],
    pub start_date: NaiveDate,
    pub complete_graph: &'a Graph,
}

/// Response from `POST /api/intermediate-ship-routes`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntermediateRoutesResponse {
    pub complete_graph: Option<Graph>,
}

/// One entry of `GET /api/port-locations`.
#[derive(Debug, Clone, Deserialize)]
pub struct PortLocationRecord {
    pub code: Option<String>,
    pub name: Option<String>,
    pub latitude_dd: Option<f64>,
    pub longitude_dd: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nearest_response() {
        let json = r#"{
            "airports": [
                {"code": "COK", "airport_name": "Cochin International", "latitude_dd": 10.152, "longitude_dd": 76.401}
            ],
            "seaports": [
                {"code": "INCOK", "main_port_name": "Cochin", "latitude_dd": 9.967, "longitude_dd": 76.267, "extra": 1}
            ]
        }"#;
        let resp: NearestResponse = serde_json::from_str(json).unwrap();
        assert_eq!(resp.airports.len(), 1);
        assert_eq!(resp.airports[0].airport_name.as_deref(), Some("Cochin International"));
        assert_eq!(resp.seaports[0].main_port_name.as_deref(), Some("Cochin"));
    }

    #[test]
    fn missing_lists_default_to_empty() {
        let resp: NearestResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.airports.is_empty());
        assert!(resp.seaports.is_empty());

        let resp: AirCargoResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.records.is_empty());
    }

    #[test]
    fn parses_hapag_route() {
        let json = r#"{
            "routes": [{
                "routingId": "R1",
                "transitTimeInDays": 21,
                "legs": [{
                    "departureLocation": {"unLocationCode": "INCOK", "locationName": "Cochin"},
                    "arrivalLocation": {"unLocationCode": "LKCMB", "locationName": "Colombo"},
                    "departureDateTime": "2025-03-01T10:00:00",
                    "arrivalDateTime": "2025-03-02T18:00:00",
                    "vesselDetails": {"name": "SEA STAR", "imoNumber": "9000001"},
                    "voyageNumber": "001W"
                }]
            }]
        }"#;
        let resp: HapagResponse = serde_json::from_str(json).unwrap();
        let route = &resp.routes[0];
        assert_eq!(route.transit_time_in_days, Some(21.0));
        let leg = &route.legs[0];
        assert_eq!(
            leg.arrival_location.as_ref().and_then(|l| l.un_location_code.as_deref()),
            Some("LKCMB")
        );
        assert_eq!(
            leg.vessel_details.as_ref().and_then(|v| v.name.as_deref()),
            Some("SEA STAR")
        );
    }

    #[test]
    fn request_bodies_use_camel_case() {
        let body = HapagRequest {
            start_location: "INCOK",
            end_location: "NLRTM",
            start_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
            container_type: CONTAINER_TYPE,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["startLocation"], "INCOK");
        assert_eq!(json["startDate"], "2025-03-01");
        assert_eq!(json["containerType"], "45GP");

        let body = AirCargoRequest {
            origin: "COK",
            destination: "AMS",
            flight_date: NaiveDate::from_ymd_opt(2025, 3, 1).unwrap(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["flightDate"], "2025-03-01");
    }
}
