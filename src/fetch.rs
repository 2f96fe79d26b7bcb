//! Playlist retrieval over HTTP(S) or from local files
//!
//! One attempt per call; retrying is left to the caller.

use crate::error::{PlaylistError, Result};
use crate::m3u_parser::decode_text;
use flate2::read::GzDecoder;
use std::io::Read;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

#[derive(Debug, Clone)]
pub struct FetchOptions {
    pub user_agent: String,
    pub connect_timeout: Duration,
    pub global_timeout: Duration,
    /// Cap on the (decompressed) playlist size
    pub max_bytes: u64,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36".to_string(),
            connect_timeout: Duration::from_secs(30),
            global_timeout: Duration::from_secs(120),
            max_bytes: 64 * 1024 * 1024,
        }
    }
}

/// Fetch playlist text from an http(s) URL, a file:// URL or a local path
pub fn fetch_playlist(source: &str, options: &FetchOptions) -> Result<String> {
    let source = source.trim();
    let bytes = if is_remote(source) {
        download(source, options)?
    } else {
        read_local(source, options)?
    };

    let bytes = if bytes.starts_with(&GZIP_MAGIC) {
        gunzip(&bytes, options.max_bytes)?
    } else {
        bytes
    };

    Ok(decode_text(&bytes)?.to_string())
}

fn is_remote(source: &str) -> bool {
    let lower = source.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn download(url: &str, options: &FetchOptions) -> Result<Vec<u8>> {
    let agent = ureq::Agent::config_builder()
        .timeout_global(Some(options.global_timeout))
        .timeout_connect(Some(options.connect_timeout))
        .http_status_as_error(false)
        .build()
        .new_agent();

    let mut response = agent
        .get(url)
        .header("User-Agent", &options.user_agent)
        .call()
        .map_err(|e| PlaylistError::Request(e.to_string()))?;

    if response.status() != 200 {
        return Err(PlaylistError::Http(response.status().as_u16()));
    }

    response
        .body_mut()
        .with_config()
        .limit(options.max_bytes)
        .read_to_vec()
        .map_err(|e| PlaylistError::Read(e.to_string()))
}

fn read_local(source: &str, options: &FetchOptions) -> Result<Vec<u8>> {
    let path = if source.starts_with("file://") {
        Url::parse(source)
            .ok()
            .and_then(|u| u.to_file_path().ok())
            .ok_or_else(|| PlaylistError::InvalidInput(format!("bad file URL: {}", source)))?
    } else {
        PathBuf::from(source)
    };

    let bytes = std::fs::read(&path)?;
    if bytes.len() as u64 > options.max_bytes {
        return Err(PlaylistError::Read(format!(
            "{} exceeds {} bytes",
            path.display(),
            options.max_bytes
        )));
    }
    Ok(bytes)
}

fn gunzip(bytes: &[u8], max_bytes: u64) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    GzDecoder::new(bytes)
        .take(max_bytes + 1)
        .read_to_end(&mut out)
        .map_err(|e| PlaylistError::Read(format!("gzip decode failed: {}", e)))?;

    if out.len() as u64 > max_bytes {
        return Err(PlaylistError::Read(format!(
            "decompressed playlist exceeds {} bytes",
            max_bytes
        )));
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    const PLAYLIST: &str = "#EXTM3U\n#EXTINF:-1,Channel One\nhttp://example.com/one.m3u8\n";

    #[test]
    fn test_fetch_local_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("live.m3u");
        std::fs::write(&path, PLAYLIST).unwrap();

        let text = fetch_playlist(path.to_str().unwrap(), &FetchOptions::default()).unwrap();
        assert_eq!(text, PLAYLIST);
    }

    #[test]
    fn test_fetch_file_url() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("live.m3u");
        std::fs::write(&path, PLAYLIST).unwrap();
        let url = Url::from_file_path(&path).unwrap();

        let text = fetch_playlist(url.as_str(), &FetchOptions::default()).unwrap();
        assert_eq!(text, PLAYLIST);
    }

    #[test]
    fn test_fetch_gzip_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("live.m3u.gz");
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(PLAYLIST.as_bytes()).unwrap();
        std::fs::write(&path, encoder.finish().unwrap()).unwrap();

        let text = fetch_playlist(path.to_str().unwrap(), &FetchOptions::default()).unwrap();
        assert_eq!(text, PLAYLIST);
    }

    #[test]
    fn test_fetch_rejects_binary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blob.bin");
        std::fs::write(&path, [0xff, 0xfe, 0x00, 0xc3, 0x28]).unwrap();

        let result = fetch_playlist(path.to_str().unwrap(), &FetchOptions::default());
        assert!(matches!(result, Err(PlaylistError::InvalidInput(_))));
    }

    #[test]
    fn test_fetch_enforces_size_cap() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("live.m3u");
        std::fs::write(&path, PLAYLIST).unwrap();

        let options = FetchOptions {
            max_bytes: 8,
            ..FetchOptions::default()
        };
        let result = fetch_playlist(path.to_str().unwrap(), &options);
        assert!(matches!(result, Err(PlaylistError::Read(_))));
    }

    #[test]
    fn test_fetch_missing_file() {
        let result = fetch_playlist("/nonexistent/olive/none.m3u", &FetchOptions::default());
        assert!(matches!(result, Err(PlaylistError::Io(_))));
    }
}
