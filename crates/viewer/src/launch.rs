//! URL-driven launches: `?fileUrl=...&fileName=...` on the viewer page.

use url::Url;

use crate::error::{Error, Result};

const FILE_URL_PARAM: &str = "fileUrl";
const FILE_NAME_PARAM: &str = "fileName";

/// A document request carried in the viewer page's query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchParams {
    pub file_url: String,
    pub file_name: String,
}

impl LaunchParams {
    /// Read launch parameters from the page URL.
    ///
    /// Returns `Ok(None)` when there is no `fileUrl`. Without `fileName` the
    /// last path segment of `fileUrl` is used.
    pub fn from_page_url(page_url: &str) -> Result<Option<Self>> {
        let page = Url::parse(page_url).map_err(|e| Error::invalid_launch_url(page_url, e))?;

        let mut file_url = None;
        let mut file_name = None;
        for (key, value) in page.query_pairs() {
            match key.as_ref() {
                FILE_URL_PARAM if !value.trim().is_empty() => file_url = Some(value.into_owned()),
                FILE_NAME_PARAM if !value.trim().is_empty() => {
                    file_name = Some(value.into_owned())
                },
                _ => {},
            }
        }

        match file_url {
            Some(file_url) => Self::new(file_url, file_name).map(Some),
            None => Ok(None),
        }
    }

    /// Request for a document URL. Without a usable `file_name` the last
    /// path segment of the URL is used.
    pub fn new(file_url: impl Into<String>, file_name: Option<String>) -> Result<Self> {
        let file_url = file_url.into();
        let file_name = match file_name.filter(|name| !name.trim().is_empty()) {
            Some(name) => name,
            None => name_from_url(&file_url).ok_or_else(|| {
                Error::invalid_launch_url(
                    file_url.as_str(),
                    "fileName is missing and the document URL has no file name",
                )
            })?,
        };
        Ok(Self {
            file_url,
            file_name,
        })
    }
}

fn name_from_url(file_url: &str) -> Option<String> {
    let url = Url::parse(file_url).ok()?;
    url.path_segments()?
        .next_back()
        .filter(|segment| !segment.is_empty())
        .map(str::to_owned)
}
