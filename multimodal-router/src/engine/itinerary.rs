//! Turning schedule answers into graph edges.
//!
//! Providers leave out distance, cost and emissions (and sometimes times);
//! the per-mode tariffs fill those in.

use chrono::NaiveDateTime;
use tracing::warn;

use crate::domain::mode::{air, sea};
use crate::domain::TransportMode;
use crate::gateway::{AirItinerary, Hub, SeaRoute};
use crate::graph::{Edge, StopRef, hours, hours_between};

/// Edge for one air itinerary between two airports.
///
/// `fallback_departure` anchors itineraries that carry no departure time.
pub fn air_edge(
    from: &Hub,
    to: &Hub,
    itinerary: &AirItinerary,
    fallback_departure: NaiveDateTime,
) -> Edge {
    let distance_km = from.coords.distance_km(&to.coords);

    let duration_hours = itinerary
        .duration_hours
        .or_else(|| hours_between(itinerary.departure?, itinerary.arrival?))
        .unwrap_or(distance_km / air::CRUISE_SPEED_KMH + air::HANDLING_HOURS);

    let departure_time = itinerary.departure.unwrap_or(fallback_departure);
    let arrival_time = itinerary
        .arrival
        .unwrap_or_else(|| arrive_after(departure_time, duration_hours));

    let segments = &itinerary.segments;
    let intermediate_stops = segments
        .iter()
        .enumerate()
        .map(|(i, segment)| {
            let mut stop = StopRef::new(segment.to.clone());
            stop.arrival = segment.arrival;
            stop.departure = segments.get(i + 1).and_then(|next| next.departure);
            stop
        })
        .collect();

    Edge {
        source: from.code.clone(),
        target: to.code.clone(),
        mode: TransportMode::Air,
        distance_km,
        duration_hours,
        cost: itinerary
            .cost
            .unwrap_or(distance_km * air::COST_PER_KM),
        emissions_kg: itinerary
            .emissions_kg
            .unwrap_or(distance_km * air::EMISSIONS_KG_PER_KM),
        departure_time,
        arrival_time,
        provider: itinerary.airline.clone(),
        service: itinerary.flight_number.clone(),
        intermediate_stops,
        is_alternative_mode: false,
    }
}

/// Edge for one complete sea routing between two ports.
pub fn sea_edge(
    from: &Hub,
    to: &Hub,
    route: &SeaRoute,
    fallback_departure: NaiveDateTime,
) -> Edge {
    let distance_km = from.coords.distance_km(&to.coords) * sea::ROUTE_FACTOR;

    let duration_hours = route
        .total_duration_days
        .map(|days| days * 24.0)
        .or_else(|| hours_between(route.departure?, route.arrival?))
        .unwrap_or(0.0);

    let departure_time = route.departure.unwrap_or(fallback_departure);
    let arrival_time = route
        .arrival
        .unwrap_or_else(|| arrive_after(departure_time, duration_hours));

    let first_voyage = route.voyages.first();

    Edge {
        source: from.code.clone(),
        target: to.code.clone(),
        mode: TransportMode::Sea,
        distance_km,
        duration_hours,
        cost: route
            .total_cost
            .unwrap_or(distance_km * sea::COST_PER_KM),
        emissions_kg: route.total_emissions_kg.unwrap_or(
            distance_km * sea::EMISSIONS_KG_PER_TONNE_KM * sea::LOAD_TONNES,
        ),
        departure_time,
        arrival_time,
        provider: first_voyage.and_then(|v| v.ship_name.clone()),
        service: first_voyage.and_then(|v| v.voyage_number.clone()),
        intermediate_stops: sea_stops(route),
        is_alternative_mode: false,
    }
}

/// `departure + duration`, or `departure` itself when that leaves the
/// calendar.
fn arrive_after(departure: NaiveDateTime, duration_hours: f64) -> NaiveDateTime {
    departure
        .checked_add_signed(hours(duration_hours))
        .unwrap_or_else(|| {
            warn!(%departure, duration_hours, "Itinerary arrival out of range, using departure");
            departure
        })
}

/// Port calls of every voyage plus each voyage's arrival port, one entry
/// per code. Later sightings of a code only fill in missing times.
fn sea_stops(route: &SeaRoute) -> Vec<StopRef> {
    let mut stops: Vec<StopRef> = Vec::new();

    let calls = route.voyages.iter().flat_map(|voyage| {
        voyage
            .schedule
            .iter()
            .map(|s| (s.port.clone(), s.name.clone(), s.eta, s.etd))
            .chain(std::iter::once((
                voyage.to_port.clone(),
                voyage.to_port_name.clone(),
                voyage.arrival,
                None,
            )))
    });

    for (code, name, arrival, departure) in calls {
        match stops.iter_mut().find(|s| s.code == code) {
            Some(existing) => {
                existing.name = existing.name.take().or(name);
                existing.arrival = existing.arrival.or(arrival);
                existing.departure = existing.departure.or(departure);
            }
            None => {
                let mut stop = StopRef::new(code);
                stop.name = name;
                stop.arrival = arrival;
                stop.departure = departure;
                stops.push(stop);
            }
        }
    }

    stops
}
