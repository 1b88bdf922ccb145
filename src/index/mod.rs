//! Package index client: version lookup against Simple Repository API
//! indexes, with fallback and extra indexes.

mod simple;
mod version;

use anyhow::{Context, Result};
use async_trait::async_trait;
use log::{debug, warn};
use thiserror::Error;

use crate::config::Settings;
use crate::error::UserInputError;
use crate::http::{HttpClient, NonRetryableError};
use crate::requirements::PackageName;

pub use simple::{ACCEPT, ProjectFile, extract_versions, parse_project_page, version_from_filename};
pub use version::{Version, sort_newest_first};

#[derive(Debug, Error)]
pub enum IndexError {
    /// Every index that could have answered failed.
    #[error("Network error: {0}")]
    Network(String),
}

/// Lists the released versions of one package on one index.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PackageIndex: Send + Sync {
    /// Versions of `package` (a normalized name) on `index_url`, newest
    /// first. A package unknown to the index fails with
    /// [`NonRetryableError::NotFound`].
    async fn fetch_versions(
        &self,
        index_url: &str,
        package: &str,
        include_yanked: bool,
    ) -> Result<Vec<String>>;
}

/// A PEP 503 / PEP 691 index reached over HTTP.
pub struct SimpleIndex {
    http: HttpClient,
}

impl SimpleIndex {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }
}

/// `{index_url}/{package}/`, with exactly one slash between the parts.
pub fn project_url(index_url: &str, package: &str) -> String {
    format!("{}/{}/", index_url.trim_end_matches('/'), package)
}

#[async_trait]
impl PackageIndex for SimpleIndex {
    #[tracing::instrument(skip(self))]
    async fn fetch_versions(
        &self,
        index_url: &str,
        package: &str,
        include_yanked: bool,
    ) -> Result<Vec<String>> {
        let url = project_url(index_url, package);
        let response = self.http.get_text(&url, ACCEPT).await?;
        let files = parse_project_page(response.content_type.as_deref(), &response.body)
            .with_context(|| format!("Unexpected response from {}", url))?;
        debug!("{} lists {} file(s) for {}", index_url, files.len(), package);
        Ok(extract_versions(package, &files, include_yanked))
    }
}

/// Where to look for versions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexQuery {
    pub index_url: String,
    pub fallback_url: Option<String>,
    pub extra_index_urls: Vec<String>,
    pub include_yanked: bool,
}

impl IndexQuery {
    pub fn from_settings(settings: &Settings, include_yanked: bool) -> Self {
        Self {
            index_url: settings.index_url.clone(),
            fallback_url: settings.fallback_url.clone(),
            extra_index_urls: settings.extra_index_urls.clone(),
            include_yanked,
        }
    }
}

fn is_not_found(error: &anyhow::Error) -> bool {
    error
        .chain()
        .filter_map(|cause| cause.downcast_ref::<NonRetryableError>())
        .any(|e| matches!(e, NonRetryableError::NotFound(_)))
}

/// Looks up every known version of `package`, newest first.
///
/// The primary index is asked first. If it fails for any reason other than
/// not knowing the package, the fallback index is asked instead. Extra
/// indexes are always asked and their versions merged in; their failures
/// are only logged.
#[tracing::instrument(skip(index, query), fields(index_url = %query.index_url))]
pub async fn lookup_versions<I: PackageIndex + ?Sized>(
    index: &I,
    package: &PackageName,
    query: &IndexQuery,
) -> Result<Vec<String>> {
    let name = package.normalized();
    let include_yanked = query.include_yanked;

    let primary = match index.fetch_versions(&query.index_url, name, include_yanked).await {
        Ok(versions) => Some(versions),
        Err(e) if is_not_found(&e) => {
            debug!("{} not found on {}", name, query.index_url);
            None
        }
        Err(e) => {
            let fallback = query
                .fallback_url
                .as_deref()
                .filter(|url| *url != query.index_url);
            let Some(fallback) = fallback else {
                return Err(IndexError::Network(format!("{:#}", e)).into());
            };
            warn!(
                "Index {} failed ({:#}), trying fallback {}",
                query.index_url, e, fallback
            );
            match index.fetch_versions(fallback, name, include_yanked).await {
                Ok(versions) => Some(versions),
                Err(e) if is_not_found(&e) => None,
                Err(e) => return Err(IndexError::Network(format!("{:#}", e)).into()),
            }
        }
    };

    let mut found = primary.is_some();
    let mut all = primary.unwrap_or_default();
    for extra in &query.extra_index_urls {
        match index.fetch_versions(extra, name, include_yanked).await {
            Ok(versions) => {
                found = true;
                all.extend(versions);
            }
            Err(e) if is_not_found(&e) => debug!("{} not found on {}", name, extra),
            Err(e) => warn!("Extra index {} failed: {:#}", extra, e),
        }
    }

    if !found {
        return Err(UserInputError::PackageNotInIndex(package.as_str().to_string()).into());
    }
    Ok(sort_newest_first(all))
}
