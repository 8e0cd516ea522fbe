//! Conversion from schedule API DTOs to parsed gateway types.
//!
//! Invalid entries (unparseable codes, missing coordinates) are logged and
//! skipped rather than failing the whole response.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::domain::{Coordinates, NodeId};

use super::schedule::{
    AirItinerary, FlightSegment, Hub, NearestHubs, PortLocation, ScheduleStop, SeaRoute, Voyage,
};
use super::types::{
    FlightRecord, HapagLeg, HapagLocation, HapagResponse, HapagRoute, HubRecord,
    NearestResponse, PortLocationRecord,
};

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
];

/// Parse an upstream timestamp.
///
/// Accepts RFC 3339 (converted to UTC), naive ISO date-times with or
/// without seconds, and bare dates (taken as midnight). Empty or
/// unrecognised strings yield `None`.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }

    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

fn parse_opt(raw: Option<&str>) -> Option<NaiveDateTime> {
    raw.and_then(parse_timestamp)
}

fn parse_code(raw: Option<&str>) -> Option<NodeId> {
    raw.and_then(|c| NodeId::parse(c).ok())
}

fn non_empty(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Convert a nearest-hub response, dropping unusable entries.
pub fn convert_nearest(response: &NearestResponse) -> NearestHubs {
    NearestHubs {
        airports: response.airports.iter().filter_map(convert_hub).collect(),
        seaports: response.seaports.iter().filter_map(convert_hub).collect(),
    }
}

fn convert_hub(record: &HubRecord) -> Option<Hub> {
    let Some(code) = parse_code(record.code.as_deref()) else {
        debug!(code = ?record.code, "Skipping hub with invalid code");
        return None;
    };

    let coords = match (record.latitude_dd, record.longitude_dd) {
        (Some(lat), Some(lng)) => Coordinates::new(lat, lng),
        _ => {
            debug!(code = %code, "Skipping hub without coordinates");
            return None;
        }
    };
    if !coords.is_valid() {
        debug!(code = %code, lat = coords.lat, lng = coords.lng, "Skipping hub with invalid coordinates");
        return None;
    }

    let name = non_empty(record.name.as_deref())
        .or_else(|| non_empty(record.airport_name.as_deref()))
        .or_else(|| non_empty(record.main_port_name.as_deref()))
        .unwrap_or_else(|| code.as_str().to_string());

    Some(Hub::new(code, name, coords))
}

/// Convert one air itinerary record.
pub fn convert_flight(record: &FlightRecord) -> AirItinerary {
    let segments = record
        .segments
        .iter()
        .filter_map(|seg| {
            Some(FlightSegment {
                from: parse_code(seg.departure_airport.as_deref()),
                to: parse_code(seg.arrival_airport.as_deref())?,
                departure: parse_opt(seg.departure_time.as_deref()),
                arrival: parse_opt(seg.arrival_time.as_deref()),
            })
        })
        .collect();

    AirItinerary {
        airline: non_empty(record.airline.as_deref())
            .or_else(|| non_empty(record.carrier.as_deref())),
        flight_number: non_empty(record.flight_number.as_deref()),
        departure: parse_opt(record.departure_time.as_deref()),
        arrival: parse_opt(record.arrival_time.as_deref()),
        duration_hours: record.duration.filter(|d| d.is_finite() && *d > 0.0),
        cost: record.cost.filter(|c| c.is_finite() && *c > 0.0),
        emissions_kg: record.emissions.filter(|e| e.is_finite() && *e > 0.0),
        segments,
    }
}

/// Convert a carrier routing response into complete sea routes.
///
/// Each route's path starts at `start` and appends every leg's arrival
/// port; legs missing a location fall back to the requested endpoints.
pub fn convert_hapag(response: &HapagResponse, start: &NodeId, end: &NodeId) -> Vec<SeaRoute> {
    response
        .routes
        .iter()
        .filter_map(|route| {
            let converted = convert_hapag_route(route, start, end);
            if converted.is_none() {
                debug!(routing_id = ?route.routing_id, "Skipping sea route without legs");
            }
            converted
        })
        .collect()
}

fn convert_hapag_route(route: &HapagRoute, start: &NodeId, end: &NodeId) -> Option<SeaRoute> {
    let first = route.legs.first()?;
    let last = route.legs.last()?;

    let mut path = vec![start.clone()];
    let voyages: Vec<Voyage> = route
        .legs
        .iter()
        .map(|leg| {
            let voyage = convert_leg(leg, start, end);
            path.push(voyage.to_port.clone());
            voyage
        })
        .collect();

    let departure = parse_opt(route.place_of_receipt_date_time.as_deref())
        .or_else(|| parse_opt(first.departure_date_time.as_deref()));
    let arrival = parse_opt(route.place_of_delivery_date_time.as_deref())
        .or_else(|| parse_opt(last.arrival_date_time.as_deref()));

    let total_duration_days = route
        .transit_time_in_days
        .filter(|d| d.is_finite() && *d > 0.0)
        .or_else(|| span_days(departure?, arrival?));

    Some(SeaRoute {
        path,
        voyages,
        total_duration_days,
        total_cost: None,
        total_emissions_kg: None,
        departure,
        arrival,
    })
}

fn convert_leg(leg: &HapagLeg, start: &NodeId, end: &NodeId) -> Voyage {
    let from_port = location_code(leg.departure_location.as_ref()).unwrap_or_else(|| start.clone());
    let to_port = location_code(leg.arrival_location.as_ref()).unwrap_or_else(|| end.clone());
    let departure = parse_opt(leg.departure_date_time.as_deref());
    let arrival = parse_opt(leg.arrival_date_time.as_deref());

    let schedule = vec![
        ScheduleStop {
            port: from_port.clone(),
            name: location_name(leg.departure_location.as_ref()),
            eta: None,
            etd: departure,
        },
        ScheduleStop {
            port: to_port.clone(),
            name: location_name(leg.arrival_location.as_ref()),
            eta: arrival,
            etd: None,
        },
    ];

    Voyage {
        ship_name: leg
            .vessel_details
            .as_ref()
            .and_then(|v| non_empty(v.name.as_deref()))
            .or_else(|| non_empty(leg.service_name.as_deref())),
        voyage_number: non_empty(leg.voyage_number.as_deref())
            .or_else(|| non_empty(leg.schedule_voyage_number.as_deref())),
        from_port: Some(from_port),
        to_port_name: location_name(leg.arrival_location.as_ref()),
        to_port,
        departure,
        arrival,
        schedule,
    }
}

fn location_code(location: Option<&HapagLocation>) -> Option<NodeId> {
    parse_code(location.and_then(|l| l.un_location_code.as_deref()))
}

fn location_name(location: Option<&HapagLocation>) -> Option<String> {
    non_empty(location.and_then(|l| l.location_name.as_deref()))
}

/// Whole days between two instants, rounded up.
fn span_days(from: NaiveDateTime, to: NaiveDateTime) -> Option<f64> {
    let ms = (to - from).num_milliseconds().abs();
    if ms == 0 {
        return None;
    }
    Some((ms as f64 / 86_400_000.0).ceil())
}

/// Convert port-location records, keeping codes with unknown positions.
pub fn convert_port_locations(records: &[PortLocationRecord]) -> Vec<PortLocation> {
    records
        .iter()
        .filter_map(|record| {
            let code = parse_code(record.code.as_deref())?;
            let coords = match (record.latitude_dd, record.longitude_dd) {
                (Some(lat), Some(lng)) => {
                    Some(Coordinates::new(lat, lng)).filter(Coordinates::is_valid)
                }
                _ => None,
            };
            Some(PortLocation {
                code,
                name: non_empty(record.name.as_deref()),
                coords,
            })
        })
        .collect()
}
