//! Reachability probe for the bulk-data object store.
//!
//! Issues one plain GET per target with a short timeout and records the status
//! code. Nothing is retried; the output is diagnostic only.

use std::path::Path;
use std::time::Duration;

use crate::sources::SourceError;
use crate::utils::HttpClient;

/// Public bucket holding the arXiv bulk dataset
pub const DATASET_BUCKET_URL: &str = "https://storage.googleapis.com/arxiv-dataset/";

/// What to probe
#[derive(Debug, Clone, PartialEq)]
pub struct ProbeSettings {
    pub base_url: String,
    /// Paths appended to `base_url`; an empty path probes the bucket root
    pub paths: Vec<String>,
    pub timeout: Duration,
    /// Links read from a links file
    pub links_sample: usize,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            base_url: DATASET_BUCKET_URL.to_string(),
            paths: vec![
                String::new(),
                "tarpdfs/".to_string(),
                "arxiv/acc-phys/pdf/9411/9411001v1.pdf".to_string(),
            ],
            timeout: Duration::from_secs(10),
            links_sample: 3,
        }
    }
}

/// One URL to check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeTarget {
    pub label: String,
    pub url: String,
}

/// Outcome of probing one target
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub target: ProbeTarget,
    /// HTTP status, or the transport error text
    pub status: Result<u16, String>,
    /// Body size for successful responses
    pub body_len: Option<usize>,
}

impl ProbeResult {
    pub fn is_reachable(&self) -> bool {
        matches!(self.status, Ok(code) if (200..300).contains(&code))
    }
}

fn join_url(base: &str, path: &str) -> String {
    if path.is_empty() {
        return base.to_string();
    }
    format!("{}/{}", base.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Targets for the configured bucket paths
pub fn store_targets(settings: &ProbeSettings) -> Vec<ProbeTarget> {
    settings
        .paths
        .iter()
        .map(|path| ProbeTarget {
            label: if path.is_empty() {
                "bucket".to_string()
            } else {
                path.clone()
            },
            url: join_url(&settings.base_url, path),
        })
        .collect()
}

/// The first `sample` non-empty lines of a links file
pub fn link_targets(path: &Path, sample: usize) -> std::io::Result<Vec<ProbeTarget>> {
    let content = std::fs::read_to_string(path)?;
    let total = content.lines().filter(|l| !l.trim().is_empty()).count();
    tracing::info!("{} links in {}", total, path.display());

    Ok(content
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .take(sample)
        .enumerate()
        .map(|(i, url)| ProbeTarget {
            label: format!("link {}", i + 1),
            url: url.to_string(),
        })
        .collect())
}

/// Issues the probe requests
#[derive(Debug, Clone)]
pub struct Prober {
    client: HttpClient,
}

impl Prober {
    pub fn new(timeout: Duration) -> Result<Self, SourceError> {
        Ok(Self {
            client: HttpClient::with_timeout(timeout)?,
        })
    }

    pub async fn probe(&self, target: ProbeTarget) -> ProbeResult {
        tracing::debug!("Probing {}", target.url);

        let response = match self.client.client().get(&target.url).send().await {
            Ok(response) => response,
            Err(e) => {
                tracing::warn!("{} unreachable: {}", target.url, e);
                return ProbeResult {
                    target,
                    status: Err(e.to_string()),
                    body_len: None,
                };
            }
        };

        let status = response.status();
        let body_len = if status.is_success() {
            response.bytes().await.ok().map(|b| b.len())
        } else {
            None
        };

        ProbeResult {
            target,
            status: Ok(status.as_u16()),
            body_len,
        }
    }

    /// Probe targets one after another
    pub async fn probe_all(&self, targets: Vec<ProbeTarget>) -> Vec<ProbeResult> {
        let mut results = Vec::with_capacity(targets.len());
        for target in targets {
            results.push(self.probe(target).await);
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;
    use tempfile::TempDir;

    #[test]
    fn test_store_targets() {
        let targets = store_targets(&ProbeSettings::default());
        let urls: Vec<&str> = targets.iter().map(|t| t.url.as_str()).collect();
        assert_eq!(
            urls,
            vec![
                "https://storage.googleapis.com/arxiv-dataset/",
                "https://storage.googleapis.com/arxiv-dataset/tarpdfs/",
                "https://storage.googleapis.com/arxiv-dataset/arxiv/acc-phys/pdf/9411/9411001v1.pdf",
            ]
        );
        assert_eq!(targets[0].label, "bucket");
    }

    #[test]
    fn test_link_targets_sample() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("links.txt");
        std::fs::write(&path, "https://a.example/1\n\nhttps://a.example/2\nhttps://a.example/3\nhttps://a.example/4\n").unwrap();

        let targets = link_targets(&path, 3).unwrap();
        assert_eq!(targets.len(), 3);
        assert_eq!(targets[1].url, "https://a.example/2");
        assert_eq!(targets[2].label, "link 3");

        assert!(link_targets(&dir.path().join("absent.txt"), 3).is_err());
    }

    #[tokio::test]
    async fn test_probe_reports_status_codes() {
        let mut server = Server::new_async().await;
        let _root = server
            .mock("GET", "/bucket/")
            .with_status(200)
            .with_body("<ListBucketResult/>")
            .create_async()
            .await;
        let _missing = server
            .mock("GET", "/bucket/tarpdfs/")
            .with_status(404)
            .create_async()
            .await;

        let settings = ProbeSettings {
            base_url: format!("{}/bucket/", server.url()),
            paths: vec![String::new(), "tarpdfs/".to_string()],
            ..ProbeSettings::default()
        };
        let prober = Prober::new(Duration::from_secs(5)).unwrap();
        let results = prober.probe_all(store_targets(&settings)).await;

        assert_eq!(results[0].status, Ok(200));
        assert_eq!(results[0].body_len, Some("<ListBucketResult/>".len()));
        assert!(results[0].is_reachable());
        assert_eq!(results[1].status, Ok(404));
        assert!(!results[1].is_reachable());
    }

    #[tokio::test]
    async fn test_probe_transport_error() {
        let prober = Prober::new(Duration::from_secs(2)).unwrap();
        let result = prober
            .probe(ProbeTarget {
                label: "closed".to_string(),
                url: "http://127.0.0.1:1/".to_string(),
            })
            .await;
        assert!(result.status.is_err());
        assert!(!result.is_reachable());
    }
}
