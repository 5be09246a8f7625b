use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;
use reqwest::{Client, StatusCode};
use tracing::debug;

use crate::config::EndpointPaths;

use super::{Endpoint, FetchError, FetchResult, SnapshotSource};

/// [`SnapshotSource`] backed by plain HTTP GET requests against the scoring system.
#[derive(Clone)]
pub struct HttpSnapshotSource {
    client: Client,
    base_address: Arc<str>,
    paths: Arc<EndpointPaths>,
}

impl HttpSnapshotSource {
    /// Build a source issuing requests that give up after `timeout`.
    pub fn new(
        base_address: &str,
        paths: EndpointPaths,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_address: Arc::from(base_address.trim_end_matches('/')),
            paths: Arc::new(paths),
        })
    }

    fn url(&self, endpoint: Endpoint) -> String {
        let path = match endpoint {
            Endpoint::LiveMatch => &self.paths.live_match,
            Endpoint::UpcomingSchedule => &self.paths.upcoming_schedule,
            Endpoint::TeamLookup => &self.paths.team_lookup,
            Endpoint::PhaseSchedule => &self.paths.phase_schedule,
        };
        format!("{}/{}", self.base_address, path.trim_start_matches('/'))
    }
}

impl SnapshotSource for HttpSnapshotSource {
    fn fetch(&self, endpoint: Endpoint) -> BoxFuture<'static, FetchResult<Vec<u8>>> {
        let client = self.client.clone();
        let url = self.url(endpoint);

        Box::pin(async move {
            debug!(%url, endpoint = endpoint.name(), "fetching document");
            let response = client
                .get(&url)
                .send()
                .await
                .map_err(|source| FetchError::from_reqwest(endpoint, source))?;

            match response.status() {
                StatusCode::OK => response
                    .bytes()
                    .await
                    .map(|body| body.to_vec())
                    .map_err(|source| FetchError::from_reqwest(endpoint, source)),
                status => Err(FetchError::Status {
                    endpoint: endpoint.name(),
                    status,
                }),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_base_and_path_without_double_slash() {
        let source = HttpSnapshotSource::new(
            "http://scoring.local:8080/",
            EndpointPaths::default(),
            Duration::from_secs(5),
        )
        .unwrap();

        assert_eq!(
            source.url(Endpoint::LiveMatch),
            "http://scoring.local:8080/Marquee/Match"
        );
        assert_eq!(
            source.url(Endpoint::UpcomingSchedule),
            "http://scoring.local:8080/Marquee/PitRefresh"
        );
    }

    #[tokio::test]
    async fn unreachable_host_is_a_fetch_failure() {
        let source = HttpSnapshotSource::new(
            "http://127.0.0.1:9",
            EndpointPaths::default(),
            Duration::from_millis(200),
        )
        .unwrap();

        let err = source.fetch(Endpoint::LiveMatch).await.unwrap_err();
        assert!(matches!(
            err,
            FetchError::Transport { .. } | FetchError::Timeout { .. }
        ));
    }
}
