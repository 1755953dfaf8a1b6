//! Application service: work-directory file browser.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::json;

use crate::application::ports::{BackendApi, FormFile, FormPayload, LocalFiles, ProgressReporter};
use crate::domain::error::{BackendError, FileError};
use crate::domain::files::{
    BrowserState, FailedUpload, FileInfo, Listing, check_upload_size, parse_failed_uploads,
};

pub const LIST_ENDPOINT: &str = "/get_work_dir_files";
pub const UPLOAD_ENDPOINT: &str = "/upload_work_dir_files";
pub const DELETE_ENDPOINT: &str = "/delete_work_dir_file";
pub const DOWNLOAD_ENDPOINT: &str = "/download_work_dir_file";
pub const FILE_INFO_ENDPOINT: &str = "/file_info";

/// Outcome of an upload batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UploadReport {
    pub uploaded: Vec<String>,
    /// Files refused locally before sending.
    pub skipped: Vec<String>,
    /// Files the backend refused.
    pub failed: Vec<FailedUpload>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing: Option<Listing>,
}

/// What `open` ended up doing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum OpenOutcome {
    Listed { listing: Listing },
    Downloaded { path: PathBuf, bytes: usize },
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned())
}

/// Navigates the remote work directory, remembering where it has been.
pub struct FileBrowser<'a, B: BackendApi> {
    backend: &'a B,
    state: BrowserState,
}

impl<'a, B: BackendApi> FileBrowser<'a, B> {
    pub fn new(backend: &'a B) -> Self {
        Self {
            backend,
            state: BrowserState::default(),
        }
    }

    #[must_use]
    pub fn state(&self) -> &BrowserState {
        &self.state
    }

    /// Fetch a listing and make it the current location.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the reply is not a listing.
    pub async fn fetch(&mut self, path: &str) -> Result<Listing> {
        let body = self.backend.get_json(LIST_ENDPOINT, &[("path", path)]).await?;
        let listing = Listing::from_response(&body).map_err(|reason| BackendError::Malformed {
            endpoint: LIST_ENDPOINT.to_string(),
            reason,
        })?;
        self.state.adopt(&listing);
        Ok(listing)
    }

    /// Open `requested`, or the current location, or the work directory.
    ///
    /// # Errors
    ///
    /// Same as [`Self::fetch`].
    pub async fn open(&mut self, requested: Option<&str>) -> Result<Listing> {
        let path = self.state.initial_path(requested);
        self.fetch(&path).await
    }

    /// # Errors
    ///
    /// Same as [`Self::fetch`].
    pub async fn navigate_to(&mut self, path: &str) -> Result<Listing> {
        self.state.push_history(path);
        self.fetch(path).await
    }

    /// Move to the parent directory. `None` when already at the top.
    ///
    /// # Errors
    ///
    /// Same as [`Self::fetch`].
    pub async fn navigate_up(&mut self) -> Result<Option<Listing>> {
        match self.state.up_target() {
            Some(parent) => self.fetch(&parent).await.map(Some),
            None => Ok(None),
        }
    }

    /// # Errors
    ///
    /// Returns an error if the backend refuses the deletion.
    pub async fn delete(&mut self, path: &str) -> Result<()> {
        let body = json!({
            "path": path,
            "currentPath": self.state.current_path,
        });
        self.backend
            .post_json(DELETE_ENDPOINT, &body)
            .await
            .with_context(|| format!("failed to delete {path}"))?;
        Ok(())
    }

    /// Upload local files into `target` (default: the current location).
    /// Oversized non-archive files are skipped and reported through
    /// `reporter`.
    ///
    /// # Errors
    ///
    /// Returns an error if a file cannot be read or the request fails.
    pub async fn upload(
        &mut self,
        files: &impl LocalFiles,
        reporter: &impl ProgressReporter,
        paths: &[PathBuf],
        target: Option<&str>,
    ) -> Result<UploadReport> {
        let target = self.state.initial_path(target);
        let mut form = FormPayload::default().field("path", &target);
        let mut uploaded = Vec::new();
        let mut skipped = Vec::new();
        for path in paths {
            let name = file_name_of(path);
            let size = files
                .size(path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            if let Err(e) = check_upload_size(&name, size) {
                reporter.warn(&e.to_string());
                skipped.push(name);
                continue;
            }
            let bytes = files
                .read(path)
                .await
                .with_context(|| format!("failed to read {}", path.display()))?;
            form = form.file(FormFile {
                field: "files[]".to_string(),
                file_name: name.clone(),
                bytes,
            });
            uploaded.push(name);
        }

        if uploaded.is_empty() {
            return Ok(UploadReport {
                uploaded,
                skipped,
                failed: Vec::new(),
                listing: None,
            });
        }

        reporter.step(&format!("Uploading {} file(s) to {target}...", uploaded.len()));
        let body = self.backend.post_form(UPLOAD_ENDPOINT, form).await?;
        let failed = parse_failed_uploads(&body);
        let listing = Listing::from_response(&body).ok();
        if let Some(listing) = &listing {
            self.state.adopt(listing);
        }
        uploaded.retain(|name| !failed.iter().any(|f| &f.name == name));
        Ok(UploadReport {
            uploaded,
            skipped,
            failed,
            listing,
        })
    }

    /// # Errors
    ///
    /// Returns an error if the download request fails.
    pub async fn download(&self, path: &str) -> Result<Vec<u8>> {
        self.backend
            .download(DOWNLOAD_ENDPOINT, &[("path", path)])
            .await
            .with_context(|| format!("failed to download {path}"))
    }

    /// # Errors
    ///
    /// Returns an error if the request fails or the reply is not an object.
    pub async fn file_info(&self, path: &str) -> Result<FileInfo> {
        let body = self
            .backend
            .post_json(FILE_INFO_ENDPOINT, &json!({ "path": path }))
            .await?;
        serde_json::from_value(body).map_err(|e| {
            BackendError::Malformed {
                endpoint: FILE_INFO_ENDPOINT.to_string(),
                reason: e.to_string(),
            }
            .into()
        })
    }

    /// List `path` if it is a directory; otherwise download it to `out`
    /// (default: its own file name in the working directory).
    ///
    /// # Errors
    ///
    /// Returns [`FileError::NotFound`] if the backend reports no such path.
    pub async fn open_link(
        &mut self,
        files: &impl LocalFiles,
        path: &str,
        out: Option<&Path>,
    ) -> Result<OpenOutcome> {
        let info = self.file_info(path).await?;
        if !info.exists {
            return Err(FileError::NotFound(path.to_string()).into());
        }
        if info.is_dir {
            let listing = self.open(Some(&info.abs_path)).await?;
            return Ok(OpenOutcome::Listed { listing });
        }
        let bytes = self.download(&info.abs_path).await?;
        let dest = out.map_or_else(|| PathBuf::from(&info.file_name), Path::to_path_buf);
        files.write(&dest, &bytes).await?;
        Ok(OpenOutcome::Downloaded {
            path: dest,
            bytes: bytes.len(),
        })
    }
}
