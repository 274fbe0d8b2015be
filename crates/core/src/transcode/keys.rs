//! Object key helpers for source videos and HLS outputs.

/// Name of the master playlist under the HLS prefix.
pub const MASTER_PLAYLIST: &str = "master.m3u8";

/// Name of each variant playlist inside a rendition directory.
pub const VARIANT_PLAYLIST: &str = "index.m3u8";

/// Decodes a percent-encoded key and trims surrounding whitespace.
///
/// Keys that are not valid percent-encoding are kept as given.
pub fn normalize_video_key(raw: &str) -> String {
    let trimmed = raw.trim();
    match urlencoding::decode(trimmed) {
        Ok(decoded) => decoded.trim().to_string(),
        Err(_) => trimmed.to_string(),
    }
}

/// Last path segment of the key with its trailing extension removed.
///
/// Returns `None` when nothing usable is left.
pub fn basename(key: &str) -> Option<&str> {
    let file = key.rsplit('/').next()?;
    let name = match file.rfind('.') {
        Some(idx) => &file[..idx],
        None => file,
    };
    match name {
        "" | "." | ".." => None,
        _ => Some(name),
    }
}

/// Extension of the last path segment, without the dot.
pub fn extension(key: &str) -> Option<&str> {
    let file = key.rsplit('/').next()?;
    let idx = file.rfind('.')?;
    let ext = &file[idx + 1..];
    if idx == 0 || ext.is_empty() {
        None
    } else {
        Some(ext)
    }
}

/// Output prefix for a source key: `hls/<name>`.
pub fn hls_prefix(video_key: &str) -> Option<String> {
    basename(video_key).map(|name| format!("hls/{}", name))
}

/// Master playlist key for a source key: `hls/<name>/master.m3u8`.
pub fn hls_key(video_key: &str) -> Option<String> {
    hls_prefix(video_key).map(|prefix| format!("{}/{}", prefix, MASTER_PLAYLIST))
}
