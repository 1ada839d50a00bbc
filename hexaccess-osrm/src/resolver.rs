use crate::{DetourFactor, RouteLeg, RouteService, RoutingConfig, RoutingError};
use geo::Point;
use hexaccess_core::{model::DistanceRecord, util::geo_utils};
use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

/// resolves the travel distance between a grid cell and a facility.
///
/// a routing query is attempted first, retrying up to `max_retries` times on
/// retryable failures. if the service is disabled or every attempt fails, the
/// great-circle distance scaled by the detour factor is returned instead. the
/// resolver never returns an error.
pub struct RouteDistanceResolver {
    service: Option<Arc<dyn RouteService>>,
    detour_factor: DetourFactor,
    fallback_speed_kmh: f64,
    max_retries: usize,
    retry_backoff: Duration,
    routed: AtomicUsize,
    fallback: AtomicUsize,
}

impl RouteDistanceResolver {
    pub fn new(
        service: Option<Arc<dyn RouteService>>,
        detour_factor: DetourFactor,
        fallback_speed_kmh: f64,
        max_retries: usize,
        retry_backoff: Duration,
    ) -> RouteDistanceResolver {
        RouteDistanceResolver {
            service,
            detour_factor,
            fallback_speed_kmh,
            max_retries,
            retry_backoff,
            routed: AtomicUsize::new(0),
            fallback: AtomicUsize::new(0),
        }
    }

    /// resolver that always uses the geodesic fallback.
    pub fn fallback_only(detour_factor: DetourFactor, fallback_speed_kmh: f64) -> Self {
        Self::new(None, detour_factor, fallback_speed_kmh, 0, Duration::ZERO)
    }

    /// resolver that queries `service` using the retry settings of `config`.
    /// a disabled config produces a fallback-only resolver.
    pub fn from_config(
        service: Arc<dyn RouteService>,
        config: &RoutingConfig,
        detour_factor: DetourFactor,
        fallback_speed_kmh: f64,
    ) -> Self {
        let service = if config.enabled { Some(service) } else { None };
        Self::new(
            service,
            detour_factor,
            fallback_speed_kmh,
            config.max_retries,
            Duration::from_millis(config.retry_backoff_ms),
        )
    }

    pub fn detour_factor(&self) -> DetourFactor {
        self.detour_factor
    }

    /// describes the distance source, used in run fingerprints.
    pub fn describe(&self) -> String {
        let service = match &self.service {
            Some(s) => s.describe(),
            None => String::from("none"),
        };
        format!(
            "service={service};detour_factor={};fallback_speed_kmh={}",
            self.detour_factor, self.fallback_speed_kmh
        )
    }

    /// number of distances resolved via the routing service so far.
    pub fn routed_count(&self) -> usize {
        self.routed.load(Ordering::Relaxed)
    }

    /// number of distances resolved via the geodesic fallback so far.
    pub fn fallback_count(&self) -> usize {
        self.fallback.load(Ordering::Relaxed)
    }

    /// resolves a distance from `origin` to `facility` (x=longitude, y=latitude).
    pub fn resolve(&self, origin: &Point<f64>, facility: &Point<f64>) -> DistanceRecord {
        let service = match &self.service {
            None => return self.fallback(origin, facility, String::from("routing disabled")),
            Some(s) => s,
        };
        match self.route_with_retries(service.as_ref(), origin, facility) {
            Ok(leg) => {
                self.routed.fetch_add(1, Ordering::Relaxed);
                DistanceRecord::Routed {
                    distance_km: leg.distance_km,
                    duration_min: leg.duration_min,
                }
            }
            Err(e) => {
                log::debug!("routing failed, using geodesic fallback: {e}");
                self.fallback(origin, facility, e.to_string())
            }
        }
    }

    fn route_with_retries(
        &self,
        service: &dyn RouteService,
        origin: &Point<f64>,
        facility: &Point<f64>,
    ) -> Result<RouteLeg, RoutingError> {
        let mut attempt = 0;
        loop {
            match service.route(origin, facility) {
                Ok(leg) => return Ok(leg),
                Err(e) if e.is_retryable() && attempt < self.max_retries => {
                    attempt += 1;
                    log::trace!("routing attempt {attempt} failed, retrying: {e}");
                    if !self.retry_backoff.is_zero() {
                        std::thread::sleep(self.retry_backoff);
                    }
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn fallback(&self, origin: &Point<f64>, facility: &Point<f64>, reason: String) -> DistanceRecord {
        self.fallback.fetch_add(1, Ordering::Relaxed);
        let distance_km = self
            .detour_factor
            .apply(geo_utils::haversine_km(origin, facility));
        let duration_min = if self.fallback_speed_kmh > 0.0 {
            distance_km / self.fallback_speed_kmh * 60.0
        } else {
            0.0
        };
        DistanceRecord::Fallback {
            distance_km,
            duration_min,
            reason,
        }
    }
}
