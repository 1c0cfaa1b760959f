//! Paper source retrieval.
//!
//! [`SourceProvider`] is the seam the pipeline fetches papers through.
//! [`ArxivSource`] implements it against the arXiv source endpoint, which
//! serves either a gzipped tarball of the paper directory or a single
//! gzipped `.tex` file.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use reqwest::blocking::Client;
use tracing::{debug, info};

use crate::extract::ExtractError;

/// Offset and value of the POSIX tar magic within the first header block.
const TAR_MAGIC_RANGE: std::ops::Range<usize> = 257..262;
const TAR_MAGIC: &[u8] = b"ustar";

/// File name given to a single-file submission.
pub const SINGLE_FILE_NAME: &str = "main.tex";

/// Produces a directory of source files for a paper identifier.
pub trait SourceProvider {
    /// Fetches `arxiv_id` into a new directory under `destination`.
    ///
    /// Returns the path of the directory holding the sources.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Download`] on any retrieval failure. Failures
    /// are terminal; callers do not retry.
    fn fetch(&self, arxiv_id: &str, destination: &Path) -> Result<PathBuf, ExtractError>;
}

/// Blocking HTTP client for `GET {base_url}/{id}`.
#[derive(Debug, Clone)]
pub struct ArxivSource {
    base_url: String,
    client: Client,
}

impl ArxivSource {
    /// Builds a provider for `base_url`, such as `https://arxiv.org/src`.
    ///
    /// # Errors
    ///
    /// Returns [`ExtractError::Download`] if the HTTP client cannot be
    /// initialised.
    pub fn new(base_url: &str) -> Result<Self, ExtractError> {
        let client = Client::builder()
            .user_agent(concat!("theoremx/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|error| ExtractError::download(format!("cannot build HTTP client: {error}")))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_owned(),
            client,
        })
    }

    /// Returns the endpoint the provider fetches from.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn download(&self, arxiv_id: &str) -> Result<Vec<u8>, ExtractError> {
        let url = format!("{}/{arxiv_id}", self.base_url);
        info!(%url, "downloading paper source");
        let response = self
            .client
            .get(&url)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .map_err(|error| ExtractError::download(format!("cannot download {arxiv_id}: {error}")))?;
        let bytes = response
            .bytes()
            .map_err(|error| ExtractError::download(format!("cannot read {arxiv_id}: {error}")))?;
        debug!(bytes = bytes.len(), "downloaded paper source");
        Ok(bytes.to_vec())
    }
}

impl SourceProvider for ArxivSource {
    fn fetch(&self, arxiv_id: &str, destination: &Path) -> Result<PathBuf, ExtractError> {
        let payload = self.download(arxiv_id)?;
        unpack_source(&payload, &destination.join(safe_directory_name(arxiv_id)))
    }
}

/// Maps an identifier such as `math/0601001` to a single path component.
#[must_use]
pub fn safe_directory_name(arxiv_id: &str) -> String {
    arxiv_id.replace('/', "-")
}

/// Unpacks a gzipped source payload into `paper_dir`, which must not exist.
///
/// A tar archive is extracted as-is; anything else is written to
/// [`SINGLE_FILE_NAME`].
///
/// # Errors
///
/// Returns [`ExtractError::Download`] if the directory exists or cannot be
/// created, the payload is not gzip data, or the archive cannot be unpacked.
pub fn unpack_source(payload: &[u8], paper_dir: &Path) -> Result<PathBuf, ExtractError> {
    fs::create_dir(paper_dir).map_err(|error| {
        ExtractError::download(format!(
            "cannot create paper directory {}: {error}",
            paper_dir.display()
        ))
    })?;

    let mut contents = Vec::new();
    GzDecoder::new(payload)
        .read_to_end(&mut contents)
        .map_err(|error| ExtractError::download(format!("cannot decompress source: {error}")))?;

    if contents.get(TAR_MAGIC_RANGE) == Some(TAR_MAGIC) {
        tar::Archive::new(contents.as_slice())
            .unpack(paper_dir)
            .map_err(|error| ExtractError::download(format!("cannot unpack source archive: {error}")))?;
        debug!(dir = %paper_dir.display(), "unpacked source archive");
    } else {
        let main = paper_dir.join(SINGLE_FILE_NAME);
        fs::write(&main, &contents).map_err(|error| {
            ExtractError::download(format!("cannot write {}: {error}", main.display()))
        })?;
        debug!(file = %main.display(), "wrote single-file source");
    }
    Ok(paper_dir.to_path_buf())
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::Compression;
    use flate2::write::GzEncoder;
    use rstest::rstest;
    use tempfile::TempDir;

    use super::*;
    use crate::extract::ErrorKind;

    fn gzip(bytes: &[u8]) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(bytes).expect("compress");
        encoder.finish().expect("finish gzip")
    }

    fn tarball(files: &[(&str, &str)]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (path, text) in files {
            let mut header = tar::Header::new_ustar();
            header.set_size(text.len() as u64);
            header.set_mode(0o644);
            builder
                .append_data(&mut header, path, text.as_bytes())
                .expect("append tar entry");
        }
        builder.into_inner().expect("finish tar")
    }

    #[test]
    fn tarballs_are_unpacked_into_the_paper_directory() {
        let temp = TempDir::new().expect("temp dir");
        let payload = gzip(&tarball(&[
            ("main.tex", "\\begin{document}\\end{document}"),
            ("sections/intro.tex", "Intro."),
        ]));
        let dir = unpack_source(&payload, &temp.path().join("2101.00001")).expect("unpack");
        assert_eq!(
            fs::read_to_string(dir.join("sections/intro.tex")).expect("read"),
            "Intro."
        );
        assert!(dir.join("main.tex").is_file());
    }

    #[test]
    fn single_gzipped_files_become_main_tex() {
        let temp = TempDir::new().expect("temp dir");
        let payload = gzip(b"\\documentclass{article}");
        let dir = unpack_source(&payload, &temp.path().join("paper")).expect("unpack");
        assert_eq!(
            fs::read_to_string(dir.join(SINGLE_FILE_NAME)).expect("read"),
            "\\documentclass{article}"
        );
    }

    #[test]
    fn non_gzip_payloads_are_download_errors() {
        let temp = TempDir::new().expect("temp dir");
        let error = unpack_source(b"<html>not found</html>", &temp.path().join("paper"))
            .expect_err("plain payload");
        assert_eq!(error.kind(), ErrorKind::Download);
    }

    #[test]
    fn existing_directories_are_not_reused() {
        let temp = TempDir::new().expect("temp dir");
        let error = unpack_source(&gzip(b"x"), temp.path()).expect_err("existing dir");
        assert_eq!(error.kind(), ErrorKind::Download);
    }

    #[rstest]
    #[case::modern("2101.00001", "2101.00001")]
    #[case::old_style("math/0601001", "math-0601001")]
    fn identifiers_map_to_one_path_component(#[case] id: &str, #[case] expected: &str) {
        assert_eq!(safe_directory_name(id), expected);
    }

    #[test]
    fn trailing_slashes_are_dropped_from_the_endpoint() {
        let source = ArxivSource::new("http://localhost:9/src/").expect("client");
        assert_eq!(source.base_url(), "http://localhost:9/src");
    }

    #[test]
    fn unreachable_endpoints_are_download_errors() {
        let temp = TempDir::new().expect("temp dir");
        let source = ArxivSource::new("http://127.0.0.1:9/src").expect("client");
        let error = source.fetch("2101.00001", temp.path()).expect_err("refused");
        assert_eq!(error.kind(), ErrorKind::Download);
        assert!(!temp.path().join("2101.00001").exists());
    }
}
