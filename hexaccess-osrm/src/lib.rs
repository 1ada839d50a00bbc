//! road network travel distances for grid cell to facility pairs.
//!
//! distances come from an OSRM `route` service when it is reachable. any
//! failure of that service degrades a single query to a great-circle
//! estimate scaled by a detour factor, so resolution itself never fails.
mod detour_factor;
mod osrm_client;
mod osrm_response;
mod resolver;
mod route_service;
mod routing_config;
mod routing_error;

pub use detour_factor::{DetourFactor, DEFAULT_DETOUR_FACTOR};
pub use osrm_client::OsrmClient;
pub use osrm_response::{OsrmRoute, OsrmRouteResponse};
pub use resolver::RouteDistanceResolver;
pub use route_service::{RouteLeg, RouteService};
pub use routing_config::RoutingConfig;
pub use routing_error::RoutingError;
