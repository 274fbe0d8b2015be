//! HLS playlist parsing and master playlist rendering.

use std::fmt::Write;

use super::keys::VARIANT_PLAYLIST;
use super::types::Rendition;

/// CODECS attribute for H.264 baseline 3.0 video.
pub const VIDEO_CODEC: &str = "avc1.42e01e";

/// CODECS attribute for AAC-LC audio.
pub const AUDIO_CODEC: &str = "mp4a.40.2";

/// A parsed media (variant) playlist.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantPlaylist {
    pub target_duration: Option<u32>,
    /// Segment URIs in playback order, relative to the playlist.
    pub segments: Vec<String>,
    pub total_duration_secs: f64,
    pub ended: bool,
}

/// Parses a variant playlist written by ffmpeg's HLS muxer.
pub fn parse_variant_playlist(text: &str) -> Result<VariantPlaylist, String> {
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());

    if lines.next() != Some("#EXTM3U") {
        return Err("missing #EXTM3U header".to_string());
    }

    let mut playlist = VariantPlaylist {
        target_duration: None,
        segments: Vec::new(),
        total_duration_secs: 0.0,
        ended: false,
    };
    let mut pending_duration: Option<f64> = None;

    for line in lines {
        if let Some(value) = line.strip_prefix("#EXT-X-TARGETDURATION:") {
            playlist.target_duration = value.parse().ok();
        } else if let Some(value) = line.strip_prefix("#EXTINF:") {
            let duration = value.split(',').next().unwrap_or_default();
            let duration = duration
                .parse::<f64>()
                .map_err(|_| format!("invalid segment duration: {}", line))?;
            pending_duration = Some(duration);
        } else if line == "#EXT-X-ENDLIST" {
            playlist.ended = true;
        } else if line.starts_with('#') {
            continue;
        } else {
            let duration = pending_duration
                .take()
                .ok_or_else(|| format!("segment {} has no #EXTINF", line))?;
            playlist.total_duration_secs += duration;
            playlist.segments.push(line.to_string());
        }
    }

    if playlist.segments.is_empty() {
        return Err("playlist has no segments".to_string());
    }

    Ok(playlist)
}

/// Renders the master playlist listing one variant per rendition.
///
/// `source` is the probed frame size, used to advertise the scaled
/// resolution of each variant.
pub fn render_master_playlist(
    renditions: &[Rendition],
    source: Option<(u32, u32)>,
    with_audio: bool,
) -> String {
    let codecs = if with_audio {
        format!("{},{}", VIDEO_CODEC, AUDIO_CODEC)
    } else {
        VIDEO_CODEC.to_string()
    };

    let mut out = String::from("#EXTM3U\n#EXT-X-VERSION:3\n");
    for rendition in renditions {
        // Writing to a String cannot fail
        let _ = writeln!(
            out,
            "#EXT-X-STREAM-INF:BANDWIDTH={},RESOLUTION={},CODECS=\"{}\"",
            rendition.bandwidth_bps(with_audio),
            rendition.resolution(source),
            codecs
        );
        let _ = writeln!(out, "{}/{}", rendition.name, VARIANT_PLAYLIST);
    }
    out
}

/// Content type for an HLS output file, by extension.
pub fn content_type_for(path: &str) -> &'static str {
    match path.rsplit('.').next() {
        Some("m3u8") => "application/vnd.apple.mpegurl",
        Some("ts") => "video/mp2t",
        _ => "application/octet-stream",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VARIANT: &str = "#EXTM3U
#EXT-X-VERSION:3
#EXT-X-TARGETDURATION:10
#EXT-X-MEDIA-SEQUENCE:0
#EXT-X-PLAYLIST-TYPE:VOD
#EXTINF:10.000000,
segment_000.ts
#EXTINF:10.000000,
segment_001.ts
#EXTINF:4.500000,
segment_002.ts
#EXT-X-ENDLIST
";

    #[test]
    fn test_parse_variant_playlist() {
        let playlist = parse_variant_playlist(VARIANT).unwrap();
        assert_eq!(playlist.target_duration, Some(10));
        assert_eq!(
            playlist.segments,
            vec!["segment_000.ts", "segment_001.ts", "segment_002.ts"]
        );
        assert!((playlist.total_duration_secs - 24.5).abs() < 0.001);
        assert!(playlist.ended);
    }

    #[test]
    fn test_parse_rejects_malformed() {
        assert!(parse_variant_playlist("").is_err());
        assert!(parse_variant_playlist("segment_000.ts\n").is_err());
        assert!(parse_variant_playlist("#EXTM3U\n#EXT-X-ENDLIST\n").is_err());
        assert!(parse_variant_playlist("#EXTM3U\nsegment_000.ts\n").is_err());
        assert!(parse_variant_playlist("#EXTM3U\n#EXTINF:abc,\nsegment_000.ts\n").is_err());
    }

    #[test]
    fn test_render_master_playlist() {
        let renditions = vec![
            Rendition::new("720p", 1280, 720, 2800, 128),
            Rendition::new("360p", 640, 360, 800, 96),
        ];
        let master = render_master_playlist(&renditions, Some((1920, 1080)), true);
        assert_eq!(
            master,
            "#EXTM3U\n\
             #EXT-X-VERSION:3\n\
             #EXT-X-STREAM-INF:BANDWIDTH=2928000,RESOLUTION=1280x720,CODECS=\"avc1.42e01e,mp4a.40.2\"\n\
             720p/index.m3u8\n\
             #EXT-X-STREAM-INF:BANDWIDTH=896000,RESOLUTION=640x360,CODECS=\"avc1.42e01e,mp4a.40.2\"\n\
             360p/index.m3u8\n"
        );
    }

    #[test]
    fn test_render_master_playlist_video_only() {
        let renditions = vec![Rendition::new("360p", 640, 360, 800, 96)];
        let master = render_master_playlist(&renditions, None, false);
        assert!(master.contains("BANDWIDTH=800000"));
        assert!(master.contains("RESOLUTION=640x360"));
        assert!(master.contains("CODECS=\"avc1.42e01e\""));
    }

    #[test]
    fn test_render_master_playlist_uses_fitted_resolution() {
        let renditions = vec![
            Rendition::new("720p", 1280, 720, 2800, 128),
            Rendition::new("480p", 854, 480, 1400, 128),
        ];
        // 4:3 source is pillarboxed inside 16:9 boxes
        let master = render_master_playlist(&renditions, Some((1440, 1080)), true);
        assert!(master.contains("RESOLUTION=960x720"));
        assert!(master.contains("RESOLUTION=640x480"));
        assert!(!master.contains("RESOLUTION=1280x720"));
    }

    #[test]
    fn test_content_type_for() {
        assert_eq!(content_type_for("hls/a/master.m3u8"), "application/vnd.apple.mpegurl");
        assert_eq!(content_type_for("hls/a/720p/segment_000.ts"), "video/mp2t");
        assert_eq!(content_type_for("hls/a/notes.txt"), "application/octet-stream");
    }
}
