use crate::{OsrmRouteResponse, RouteLeg, RouteService, RoutingConfig, RoutingError};
use geo::Point;
use reqwest::blocking::Client;
use std::time::Duration;

/// blocking client for the OSRM `route/v1/{profile}` HTTP service.
/// the underlying connection pool is shared by every caller.
#[derive(Debug, Clone)]
pub struct OsrmClient {
    client: Client,
    base_url: String,
    profile: String,
}

impl OsrmClient {
    pub fn new(config: &RoutingConfig) -> Result<OsrmClient, RoutingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RoutingError::Client(e.to_string()))?;
        Ok(OsrmClient {
            client,
            base_url: config.base_url(),
            profile: config.profile.clone(),
        })
    }

    /// OSRM expects `lon,lat` ordering of coordinates.
    pub fn route_url(&self, origin: &Point<f64>, destination: &Point<f64>) -> String {
        format!(
            "{}/route/v1/{}/{},{};{},{}?overview=false",
            self.base_url,
            self.profile,
            origin.x(),
            origin.y(),
            destination.x(),
            destination.y()
        )
    }
}

impl RouteService for OsrmClient {
    fn route(
        &self,
        origin: &Point<f64>,
        destination: &Point<f64>,
    ) -> Result<RouteLeg, RoutingError> {
        let url = self.route_url(origin, destination);
        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| RoutingError::Transport {
                url: url.clone(),
                message: e.to_string(),
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(RoutingError::HttpStatus {
                url,
                status: status.as_u16(),
            });
        }
        let body = response.text().map_err(|e| RoutingError::Transport {
            url: url.clone(),
            message: format!("failure reading response body: {e}"),
        })?;
        let decoded: OsrmRouteResponse = serde_json::from_str(&body)
            .map_err(|e| RoutingError::MalformedResponse(format!("{e}")))?;
        decoded.into_leg()
    }

    fn describe(&self) -> String {
        format!("osrm({}/{})", self.base_url, self.profile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::point;
    use rouille::{Response, Server};
    use std::sync::mpsc::Sender;
    use std::thread::JoinHandle;

    /// serves `body` with `status` on an ephemeral local port.
    fn serve(status: u16, body: &'static str) -> (RoutingConfig, JoinHandle<()>, Sender<()>) {
        let server = Server::new("127.0.0.1:0", move |_request| {
            Response::text(body).with_status_code(status)
        })
        .unwrap();
        let addr = server.server_addr();
        let config = RoutingConfig {
            host: addr.ip().to_string(),
            port: addr.port(),
            timeout_secs: 5,
            ..Default::default()
        };
        let (handle, stop) = server.stoppable();
        (config, handle, stop)
    }

    #[test]
    fn test_route_url_is_lon_lat() {
        let config = RoutingConfig {
            host: String::from("osrm.local"),
            port: 5001,
            ..Default::default()
        };
        let client = OsrmClient::new(&config).unwrap();
        let url = client.route_url(&point! { x: 1.25, y: 6.5 }, &point! { x: 1.5, y: 6.0 });
        assert_eq!(
            url,
            "http://osrm.local:5001/route/v1/driving/1.25,6.5;1.5,6?overview=false"
        );
    }

    #[test]
    fn test_route_ok_response() {
        let body = r#"{"code":"Ok","routes":[{"distance":2500.0,"duration":300.0}]}"#;
        let (config, handle, stop) = serve(200, body);
        let client = OsrmClient::new(&config).unwrap();
        let leg = client
            .route(&point! { x: 1.0, y: 6.0 }, &point! { x: 1.01, y: 6.01 })
            .unwrap();
        stop.send(()).unwrap();
        handle.join().unwrap();
        assert_eq!(leg.distance_km, 2.5);
        assert_eq!(leg.duration_min, 5.0);
    }

    #[test]
    fn test_route_server_error_is_retryable() {
        let (config, handle, stop) = serve(500, "internal error");
        let client = OsrmClient::new(&config).unwrap();
        let result = client.route(&point! { x: 1.0, y: 6.0 }, &point! { x: 1.01, y: 6.01 });
        stop.send(()).unwrap();
        handle.join().unwrap();
        match result {
            Err(e @ RoutingError::HttpStatus { status: 500, .. }) => assert!(e.is_retryable()),
            other => panic!("expected HTTP 500 error, found {other:?}"),
        }
    }

    #[test]
    fn test_route_malformed_body() {
        let (config, handle, stop) = serve(200, "not json");
        let client = OsrmClient::new(&config).unwrap();
        let result = client.route(&point! { x: 1.0, y: 6.0 }, &point! { x: 1.01, y: 6.01 });
        stop.send(()).unwrap();
        handle.join().unwrap();
        assert!(matches!(result, Err(RoutingError::MalformedResponse(_))));
    }
}
