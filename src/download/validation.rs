//! URL validation and liveness probing ahead of a tool invocation.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use super::constants::{LINK_PROBE_TIMEOUT, RECOGNIZED_HOSTS};

/// Outcome of checking the head-of-queue URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UrlCheck {
    /// Proceed with the download.
    Valid,
    /// URL shape or host is not acceptable.
    Invalid {
        /// Why the URL was rejected.
        reason: String,
    },
    /// URL did not answer the liveness probe.
    Unreachable {
        /// What the probe observed.
        reason: String,
    },
}

impl UrlCheck {
    #[must_use]
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid)
    }
}

/// Checks that `raw` is an http(s) URL on a recognized host.
///
/// ```
/// use ytqueue_core::download::check_url_shape;
///
/// assert!(check_url_shape("https://www.youtube.com/watch?v=abc").is_valid());
/// assert!(check_url_shape("https://youtu.be/abc").is_valid());
/// assert!(!check_url_shape("https://example.com/video").is_valid());
/// assert!(!check_url_shape("not a url").is_valid());
/// ```
#[must_use]
pub fn check_url_shape(raw: &str) -> UrlCheck {
    let url = match Url::parse(raw.trim()) {
        Ok(url) => url,
        Err(error) => {
            return UrlCheck::Invalid {
                reason: format!("not a URL ({error})"),
            };
        }
    };
    if !matches!(url.scheme(), "http" | "https") {
        return UrlCheck::Invalid {
            reason: format!("unsupported scheme '{}'", url.scheme()),
        };
    }
    let Some(host) = url.host_str() else {
        return UrlCheck::Invalid {
            reason: "URL has no host".to_string(),
        };
    };
    let host = host.to_ascii_lowercase();
    if RECOGNIZED_HOSTS.contains(&host.as_str()) {
        UrlCheck::Valid
    } else {
        UrlCheck::Invalid {
            reason: format!("host '{host}' is not a recognized video site"),
        }
    }
}

/// What a liveness probe observed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// Server answered with a success status.
    Responsive,
    /// No answer within the probe timeout.
    TimedOut,
    /// DNS, TCP or TLS failure.
    ConnectionFailed(String),
    /// Server answered with a non-success status.
    HttpStatus(u16),
    /// Any other request failure.
    Failed(String),
}

impl ProbeOutcome {
    /// True for timeouts and connection failures, the "host is not responding" class.
    #[must_use]
    pub fn is_network_failure(&self) -> bool {
        matches!(self, Self::TimedOut | Self::ConnectionFailed(_))
    }

    /// Maps the probe result to a queue decision.
    ///
    /// Every non-responsive outcome drops the URL; callers report the
    /// non-network ones separately so they are never silent.
    #[must_use]
    pub fn into_check(self) -> UrlCheck {
        match self {
            Self::Responsive => UrlCheck::Valid,
            Self::TimedOut => UrlCheck::Unreachable {
                reason: "not responding (timed out)".to_string(),
            },
            Self::ConnectionFailed(detail) => UrlCheck::Unreachable {
                reason: format!("not responding ({detail})"),
            },
            Self::HttpStatus(status) => UrlCheck::Unreachable {
                reason: format!("HTTP {status}"),
            },
            Self::Failed(detail) => UrlCheck::Unreachable { reason: detail },
        }
    }
}

/// Liveness check run before each invocation.
#[async_trait]
pub trait LinkProbe: Send + Sync {
    async fn probe(&self, url: &str) -> ProbeOutcome;
}

/// [`LinkProbe`] issuing a bounded-timeout GET.
#[derive(Debug, Clone)]
pub struct HttpLinkProbe {
    client: Client,
}

impl HttpLinkProbe {
    /// Creates a probe with the default 5 second timeout.
    ///
    /// # Errors
    ///
    /// Returns the underlying error if the HTTP client cannot be built.
    pub fn new() -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(LINK_PROBE_TIMEOUT)
            .connect_timeout(LINK_PROBE_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }

    /// Creates a probe around an existing client.
    #[must_use]
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl LinkProbe for HttpLinkProbe {
    #[instrument(skip(self))]
    async fn probe(&self, url: &str) -> ProbeOutcome {
        let outcome = match self.client.get(url).send().await {
            Ok(response) if response.status().is_success() => ProbeOutcome::Responsive,
            Ok(response) => ProbeOutcome::HttpStatus(response.status().as_u16()),
            Err(error) if error.is_timeout() => ProbeOutcome::TimedOut,
            Err(error) if error.is_connect() => ProbeOutcome::ConnectionFailed(error.to_string()),
            Err(error) => ProbeOutcome::Failed(error.to_string()),
        };
        debug!(?outcome, "link probe finished");
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_url_shape_accepts_recognized_hosts() {
        for url in [
            "https://www.youtube.com/watch?v=abc",
            "http://youtube.com/playlist?list=PL1",
            "https://m.youtube.com/watch?v=abc",
            "https://music.youtube.com/watch?v=abc",
            "https://youtu.be/abc",
            "https://WWW.YOUTUBE.COM/watch?v=abc",
        ] {
            assert_eq!(check_url_shape(url), UrlCheck::Valid, "{url}");
        }
    }

    #[test]
    fn test_check_url_shape_rejects_lookalike_hosts() {
        let check = check_url_shape("https://www.youtube.com.evil.test/watch?v=abc");
        assert!(matches!(check, UrlCheck::Invalid { .. }));
    }

    #[test]
    fn test_check_url_shape_rejects_other_schemes() {
        let check = check_url_shape("ftp://youtube.com/x");
        let UrlCheck::Invalid { reason } = check else {
            panic!("expected invalid");
        };
        assert!(reason.contains("ftp"));
    }

    #[test]
    fn test_check_url_shape_rejects_garbage() {
        assert!(!check_url_shape("").is_valid());
        assert!(!check_url_shape("www.youtube.com/watch?v=abc").is_valid());
    }

    #[test]
    fn test_probe_outcome_mapping() {
        assert_eq!(ProbeOutcome::Responsive.into_check(), UrlCheck::Valid);
        assert!(ProbeOutcome::TimedOut.is_network_failure());
        assert!(ProbeOutcome::ConnectionFailed("refused".into()).is_network_failure());
        assert!(!ProbeOutcome::HttpStatus(404).is_network_failure());
        assert_eq!(
            ProbeOutcome::HttpStatus(404).into_check(),
            UrlCheck::Unreachable {
                reason: "HTTP 404".to_string()
            }
        );
    }
}
