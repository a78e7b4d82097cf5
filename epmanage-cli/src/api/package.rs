//! Agent installer packages and their download.

use std::sync::Arc;

use epmanage_shared::package::{Package, PackageGroup, PackageListResponse};
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::header::CONTENT_DISPOSITION;
use reqwest::{Method, StatusCode};
use tracing::{debug, info};

use crate::api::{api_error, read_json};
use crate::error::ClientError;
use crate::session::Session;

static FILENAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"filename="?([^/;"]+)"?"#).expect("filename pattern is valid"));

#[derive(Debug, thiserror::Error)]
pub enum PackageError {
    #[error("Unknown os \"{0}\"")]
    UnknownOs(String),

    #[error("No package found")]
    NoPackage,

    #[error("More than one package match")]
    Ambiguous(usize),

    #[error("Invalid selection {index} (expected 0..{count})")]
    InvalidSelection { index: usize, count: usize },

    #[error("Cannot download package: {0}")]
    Download(ClientError),

    #[error("Invalid response from server (no filename)")]
    NoFilename,

    #[error(transparent)]
    Client(#[from] ClientError),
}

#[derive(Debug)]
pub struct DownloadedPackage {
    pub filename: String,
    pub content: Vec<u8>,
}

/// Pick one package of `os` matching the optional constraints.
///
/// A single match is taken as is; several go through `choose`, which returns
/// an index into the candidates.
pub fn select_package<'a>(
    groups: &'a [PackageGroup],
    os: &str,
    osversion: Option<&str>,
    arch: Option<&str>,
    choose: Option<&mut dyn FnMut(&[&Package]) -> usize>,
) -> Result<&'a Package, PackageError> {
    let group = groups
        .iter()
        .find(|g| g.os == os)
        .ok_or_else(|| PackageError::UnknownOs(os.to_string()))?;

    let candidates: Vec<&Package> = group
        .packages
        .iter()
        .filter(|p| p.matches(osversion, arch))
        .collect();

    match (candidates.len(), choose) {
        (0, _) => Err(PackageError::NoPackage),
        (1, _) => Ok(candidates[0]),
        (count, Some(choose)) => {
            let index = choose(&candidates);
            candidates
                .get(index)
                .copied()
                .ok_or(PackageError::InvalidSelection { index, count })
        }
        (count, None) => Err(PackageError::Ambiguous(count)),
    }
}

/// Served filename from a `content-disposition` header value; exactly one
/// `filename=` occurrence is accepted.
pub fn filename_from_disposition(header: &str) -> Option<String> {
    let mut names = FILENAME_PATTERN
        .captures_iter(header)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string());
    match (names.next(), names.next()) {
        // no hidden files, no `.` or `..`
        (Some(name), None) if !name.is_empty() && !name.starts_with('.') => Some(name),
        _ => None,
    }
}

pub struct PackageClient {
    session: Arc<Session>,
}

impl PackageClient {
    pub fn new(session: Arc<Session>) -> Self {
        Self { session }
    }

    pub async fn list(&self) -> Result<Vec<PackageGroup>, ClientError> {
        let res = self
            .session
            .request(Method::GET, "/frontend/packages")?
            .send()
            .await?;
        if res.status() != StatusCode::OK {
            return Err(api_error(res).await);
        }
        let body: PackageListResponse = read_json(res).await?;
        Ok(body.data)
    }

    pub async fn download(
        &self,
        os: &str,
        osversion: Option<&str>,
        arch: Option<&str>,
        choose: Option<&mut dyn FnMut(&[&Package]) -> usize>,
    ) -> Result<DownloadedPackage, PackageError> {
        let groups = self.list().await?;
        let package = select_package(&groups, os, osversion, arch, choose)?;
        debug!(name = %package.name, url = %package.url, "downloading package");

        let res = self
            .session
            .request(Method::GET, &package.url)?
            .send()
            .await
            .map_err(|e| PackageError::Download(e.into()))?;
        if res.status() != StatusCode::OK {
            return Err(PackageError::Download(api_error(res).await));
        }

        let filename = res
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(filename_from_disposition)
            .ok_or(PackageError::NoFilename)?;
        let content = res
            .bytes()
            .await
            .map_err(|e| PackageError::Download(e.into()))?
            .to_vec();

        info!(%filename, size = content.len(), "package downloaded");
        Ok(DownloadedPackage { filename, content })
    }
}
