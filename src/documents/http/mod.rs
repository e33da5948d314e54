
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use itertools::Itertools;
use scraper::{Html, Selector};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use url::Url;

use crate::QaError;
use crate::documents::{DocumentKind, DocumentSource};
use crate::http::{build_agent, get, run_cancellable};

/// Documents served over HTTP below a directory-listing URL
#[derive(Debug, Clone)]
pub struct HttpDocumentSource {
    base: Url,
    agent: ureq::Agent,
}

impl HttpDocumentSource {
    /// `base` should end in `/` so file names resolve beneath it
    #[inline]
    pub fn new(base: Url, timeout: Duration) -> Self {
        Self {
            base,
            agent: build_agent(timeout),
        }
    }

    #[inline]
    pub fn base(&self) -> &Url {
        &self.base
    }

    fn file_url(&self, name: &str) -> Result<Url> {
        self.base
            .join(name)
            .with_context(|| format!("Invalid document name: {name}"))
    }
}

/// Names of the linked documents in a directory-listing page.
///
/// Takes the last path segment of every `<a href>`, keeps the supported
/// document types and drops repeats while preserving first-seen order.
#[inline]
pub fn parse_listing(html: &str, base: &Url) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|link| link.value().attr("href"))
        .filter_map(|href| base.join(href).ok())
        .filter_map(|url| {
            url.path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|name| !name.is_empty() && DocumentKind::from_name(name).is_supported())
        .unique()
        .collect()
}

#[async_trait]
impl DocumentSource for HttpDocumentSource {
    async fn list(&self, cancel: &CancellationToken) -> Result<Vec<String>> {
        let agent = self.agent.clone();
        let url = self.base.to_string();

        let response = run_cancellable(cancel, move || {
            get(&agent, &url).map_err(|e| anyhow::Error::from(QaError::Discovery(e.to_string())))
        })
        .await?;

        if !response.is_success() {
            return Err(QaError::Discovery(format!(
                "listing returned HTTP {}",
                response.status
            ))
            .into());
        }

        let files = parse_listing(&response.text(), &self.base);
        debug!("Listing at {} links {} documents", self.base, files.len());
        Ok(files)
    }

    async fn fetch(&self, name: &str, cancel: &CancellationToken) -> Result<Vec<u8>> {
        let agent = self.agent.clone();
        let url = self.file_url(name)?.to_string();

        let response = run_cancellable(cancel, move || {
            get(&agent, &url).map_err(|e| {
                anyhow::Error::from(QaError::Network(format!("Failed to fetch document: {e}")))
            })
        })
        .await?;

        if !response.is_success() {
            return Err(QaError::Network(format!("HTTP {}", response.status)).into());
        }

        Ok(response.body)
    }

    fn describe(&self) -> String {
        self.base.to_string()
    }
}
