//! Turning inbound payloads (inline base64, a URL, or a local file) into
//! [`DocumentPayload`]s.

use std::{borrow::Cow, path::Path, time::Duration};

use {
    base64::{Engine as _, engine::general_purpose::STANDARD},
    bytes::Bytes,
    reqwest::Client,
    tracing::{debug, info},
    url::Url,
};

#[cfg(feature = "metrics")]
use docbridge_metrics::{acquisition as acq_metrics, counter, histogram, labels};

use crate::{
    error::{Error, Result},
    payload::{DocumentPayload, SourceKind},
};

/// Decode a standard (padded) base64 document.
///
/// Line breaks inserted by wrapping encoders and a leading
/// `data:<mime>;base64,` prefix are tolerated.
pub fn from_base64(payload: &str) -> Result<Bytes> {
    let body = strip_data_url(payload.trim());
    let compact: Cow<'_, str> = if body.bytes().any(|b| b.is_ascii_whitespace()) {
        Cow::Owned(body.chars().filter(|c| !c.is_ascii_whitespace()).collect())
    } else {
        Cow::Borrowed(body)
    };
    STANDARD
        .decode(compact.as_bytes())
        .map(Bytes::from)
        .map_err(Error::decode)
}

fn strip_data_url(payload: &str) -> &str {
    if let Some(rest) = payload.strip_prefix("data:")
        && let Some((_, data)) = rest.split_once(";base64,")
    {
        return data;
    }
    payload
}

/// Fetch a document over HTTP(S).
///
/// Invalid URLs, transport failures and non-success statuses all surface as
/// [`Error::Network`].
pub async fn from_url(client: &Client, url: &str) -> Result<Bytes> {
    let parsed = Url::parse(url).map_err(|e| Error::network(url, e))?;

    debug!(url = %parsed, "fetching document");
    #[cfg(feature = "metrics")]
    let started = std::time::Instant::now();

    let resp = client
        .get(parsed.clone())
        .send()
        .await
        .map_err(|e| Error::network(url, e))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(Error::network(url, format!("HTTP {status}")));
    }

    let body = resp.bytes().await.map_err(|e| Error::network(url, e))?;

    #[cfg(feature = "metrics")]
    histogram!(acq_metrics::FETCH_DURATION_SECONDS).record(started.elapsed().as_secs_f64());

    info!(url = %parsed, bytes = body.len(), "fetched document");
    Ok(body)
}

/// Read a locally picked file.
pub async fn from_path(path: &Path) -> Result<Bytes> {
    tokio::fs::read(path)
        .await
        .map(Bytes::from)
        .map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })
}

// ── Acquirer ─────────────────────────────────────────────────────────────────

/// HTTP client settings for the URL path.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            user_agent: concat!("docbridge/", env!("CARGO_PKG_VERSION")).to_owned(),
        }
    }
}

/// An inbound request for a document, before any bytes are available.
#[derive(Clone)]
pub enum DocumentSource {
    Channel { file_data: String, file_name: String },
    Url { url: String, file_name: String },
    Upload { path: std::path::PathBuf, file_name: String },
}

impl DocumentSource {
    #[must_use]
    pub fn file_name(&self) -> &str {
        match self {
            Self::Channel { file_name, .. }
            | Self::Url { file_name, .. }
            | Self::Upload { file_name, .. } => file_name,
        }
    }

    #[must_use]
    pub fn kind(&self) -> SourceKind {
        match self {
            Self::Channel { .. } => SourceKind::Channel,
            Self::Url { .. } => SourceKind::Url,
            Self::Upload { .. } => SourceKind::Upload,
        }
    }
}

impl std::fmt::Debug for DocumentSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct("DocumentSource");
        s.field("kind", &self.kind())
            .field("file_name", &self.file_name());
        match self {
            Self::Channel { file_data, .. } => s.field("file_data_len", &file_data.len()),
            Self::Url { url, .. } => s.field("url", url),
            Self::Upload { path, .. } => s.field("path", path),
        };
        s.finish()
    }
}

/// Produces [`DocumentPayload`]s from any [`DocumentSource`].
#[derive(Debug, Clone)]
pub struct Acquirer {
    client: Client,
}

impl Acquirer {
    pub fn new(options: &FetchOptions) -> Result<Self> {
        let client = Client::builder()
            .timeout(options.timeout)
            .user_agent(options.user_agent.as_str())
            .build()
            .map_err(|e| Error::external("failed to build HTTP client", e))?;
        Ok(Self { client })
    }

    #[must_use]
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    pub async fn acquire(&self, source: DocumentSource) -> Result<DocumentPayload> {
        let kind = source.kind();
        let result: Result<DocumentPayload> = async {
            match source {
                DocumentSource::Channel {
                    file_data,
                    file_name,
                } => DocumentPayload::new(from_base64(&file_data)?, file_name, kind),
                DocumentSource::Url { url, file_name } => {
                    let bytes = from_url(&self.client, &url).await?;
                    DocumentPayload::new(bytes, file_name, kind)
                },
                DocumentSource::Upload { path, file_name } => {
                    let bytes = from_path(&path).await?;
                    DocumentPayload::new(bytes, file_name, kind)
                },
            }
        }
        .await;

        #[cfg(feature = "metrics")]
        match &result {
            Ok(payload) => counter!(acq_metrics::BYTES_TOTAL, labels::SOURCE => kind.as_str())
                .increment(payload.len() as u64),
            Err(_) => {
                counter!(acq_metrics::FAILURES_TOTAL, labels::SOURCE => kind.as_str()).increment(1)
            },
        }

        if let Ok(payload) = &result {
            debug!(
                source = kind.as_str(),
                file_name = payload.file_name(),
                bytes = payload.len(),
                "document acquired"
            );
        }
        result
    }
}
