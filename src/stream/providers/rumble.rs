//! Rumble embed resolver
//!
//! Rumble embed pages inline their player config in a `<script>` block. The
//! progressive MP4 variants live under `"ua":{"mp4":{...}}`, keyed by
//! resolution label:
//!
//! ```text
//! "ua":{"mp4":{"720":{"url":"https://...mp4","meta":{"bitrate":2000,"size":104857600,"w":1280,"h":720}}},"timeline":{...
//! ```

use std::borrow::Cow;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::html::Document;
use crate::http_client::PageFetcher;
use crate::models::VideoQuality;
use crate::stream::resolver::StreamResolver;

const MP4_MARKER: &str = r#""ua":{"mp4":"#;
/// Sibling key that follows the MP4 map in every observed player config.
const TIMELINE_SENTINEL: &str = r#","timeline":{"#;

#[derive(Debug, Deserialize)]
struct Mp4Variant {
    #[serde(default)]
    url: String,
    #[serde(default)]
    meta: Mp4Meta,
}

#[derive(Debug, Default, Deserialize)]
#[allow(dead_code)]
struct Mp4Meta {
    bitrate: Option<u64>,
    size: Option<u64>,
    w: Option<u32>,
    h: Option<u32>,
}

pub struct RumbleResolver {
    fetcher: Arc<dyn PageFetcher>,
}

impl RumbleResolver {
    pub fn new(fetcher: Arc<dyn PageFetcher>) -> Self {
        Self { fetcher }
    }
}

#[async_trait]
impl StreamResolver for RumbleResolver {
    fn name(&self) -> &'static str {
        "rumble"
    }

    async fn resolve(&self, embed_url: &str) -> Result<Vec<VideoQuality>> {
        info!("[Rumble] Fetching embed: {embed_url}");
        let body = self.fetcher.scoped().fetch_text(embed_url).await?;
        let qualities = parse_embed_page(&body)?;
        info!("[Rumble] Found {} MP4 variants", qualities.len());
        Ok(qualities)
    }
}

/// Qualities from the first inline script carrying the MP4 map.
pub fn parse_embed_page(body: &str) -> Result<Vec<VideoQuality>> {
    let doc = Document::parse(body);
    let scripts = doc.query("script")?;

    let object = scripts
        .iter()
        .map(|s| s.text().collect::<String>())
        .find_map(|script| extract_mp4_object(&script).map(Cow::into_owned))
        .ok_or_else(|| Error::Extraction("no MP4 manifest in Rumble embed".into()))?;

    parse_mp4_object(&object)
}

/// Slice the JSON object that follows the MP4 marker.
///
/// The extent is found by a string-aware brace scan. If the braces never
/// balance, the text up to the timeline sentinel is taken and the braces
/// still open there are closed.
pub fn extract_mp4_object(script: &str) -> Option<Cow<'_, str>> {
    let start = script.find(MP4_MARKER)? + MP4_MARKER.len();
    let rest = script[start..].trim_start();
    match scan_object(rest)? {
        Scan::Closed(end) => Some(Cow::Borrowed(&rest[..=end])),
        Scan::Open(_) => {
            debug!("MP4 map braces unbalanced, falling back to timeline sentinel");
            let head = rest[..rest.find(TIMELINE_SENTINEL)?].trim_end();
            match scan_object(head)? {
                Scan::Closed(end) => Some(Cow::Borrowed(&head[..=end])),
                Scan::Open(depth) => Some(Cow::Owned(format!("{head}{}", "}".repeat(depth)))),
            }
        }
    }
}

enum Scan {
    /// Byte index of the brace closing the object.
    Closed(usize),
    /// Braces still open at the end of the text.
    Open(usize),
}

/// Walk an object starting at the first byte, ignoring braces in strings.
fn scan_object(body: &str) -> Option<Scan> {
    if !body.starts_with('{') {
        return None;
    }

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, b) in body.bytes().enumerate() {
        if in_string {
            match b {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(Scan::Closed(i));
                }
            }
            _ => {}
        }
    }
    Some(Scan::Open(depth))
}

/// Parse the resolution map, best resolution first.
pub fn parse_mp4_object(object: &str) -> Result<Vec<VideoQuality>> {
    let variants: HashMap<String, Mp4Variant> = serde_json::from_str(object)
        .map_err(|e| Error::Extraction(format!("malformed MP4 manifest: {e}")))?;

    let mut qualities: Vec<VideoQuality> = variants
        .into_iter()
        .filter(|(_, v)| !v.url.is_empty())
        .map(|(resolution, v)| VideoQuality {
            url: v.url,
            resolution,
            size: v.meta.size.unwrap_or(0),
        })
        .collect();

    if qualities.is_empty() {
        return Err(Error::Extraction("no video URLs in MP4 manifest".into()));
    }

    qualities.sort_by_key(|q| (Reverse(height(&q.resolution)), q.resolution.clone()));
    Ok(qualities)
}

/// Leading digits of a resolution label (`"1080"`, `"720p"`).
fn height(label: &str) -> Option<u32> {
    let digits: String = label.chars().take_while(char::is_ascii_digit).collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn page(script: &str) -> String {
        format!("<html><head><script>var x = 1;</script><script>{script}</script></head><body></body></html>")
    }

    #[test]
    fn single_variant_from_inline_script() {
        let body = page(
            r#"g.f["v5abc"]={"ua":{"mp4":{"720":{"url":"https://x/y.mp4","meta":{"size":104857600}}},"timeline":{"1":{}}}};"#,
        );
        let qualities = parse_embed_page(&body).unwrap();
        assert_eq!(
            qualities,
            vec![VideoQuality {
                url: "https://x/y.mp4".into(),
                resolution: "720".into(),
                size: 104_857_600,
            }]
        );
    }

    #[test]
    fn variants_sorted_best_first() {
        let object = r#"{
            "360": {"url": "https://x/360.mp4", "meta": {"bitrate": 500, "size": 10, "w": 640, "h": 360}},
            "1080": {"url": "https://x/1080.mp4", "meta": {"bitrate": 4000, "size": 300, "w": 1920, "h": 1080}},
            "720": {"url": "https://x/720.mp4", "meta": {"bitrate": 2000, "size": 100, "w": 1280, "h": 720}}
        }"#;
        let qualities = parse_mp4_object(object).unwrap();
        let labels: Vec<&str> = qualities.iter().map(|q| q.resolution.as_str()).collect();
        assert_eq!(labels, ["1080", "720", "360"]);
        assert_eq!(qualities[0].size, 300);
    }

    #[test]
    fn non_numeric_labels_sort_last() {
        let object = r#"{"audio": {"url": "https://x/a.mp4"}, "240": {"url": "https://x/240.mp4"}}"#;
        let qualities = parse_mp4_object(object).unwrap();
        assert_eq!(qualities[0].resolution, "240");
        assert_eq!(qualities[1].resolution, "audio");
        assert_eq!(qualities[1].size, 0);
    }

    #[test]
    fn braces_inside_strings_do_not_end_the_object() {
        let script = r#""ua":{"mp4":{"480":{"url":"https://x/a}b{.mp4","meta":{}}},"hls":{}}"#;
        let object = extract_mp4_object(script).unwrap();
        assert_eq!(object, r#"{"480":{"url":"https://x/a}b{.mp4","meta":{}}}"#);
    }

    #[test]
    fn unbalanced_object_falls_back_to_sentinel() {
        let script = r#""ua":{"mp4":{"480":{"url":"https://x/a.mp4"},"timeline":{"#;
        assert_eq!(
            extract_mp4_object(script).as_deref(),
            Some(r#"{"480":{"url":"https://x/a.mp4"}}"#)
        );
    }

    #[test]
    fn truncated_config_still_resolves_through_sentinel() {
        let body = page(
            r#"g.f["v5abc"]={"ua":{"mp4":{"480":{"url":"https://x/480.mp4","meta":{"size":1}},"timeline":{"1":{"#,
        );
        let qualities = parse_embed_page(&body).unwrap();
        assert_eq!(
            qualities,
            vec![VideoQuality {
                url: "https://x/480.mp4".into(),
                resolution: "480".into(),
                size: 1,
            }]
        );
    }

    #[test]
    fn unterminated_config_without_sentinel_is_missing() {
        let script = r#""ua":{"mp4":{"480":{"url":"https://x/a.mp4""#;
        assert!(extract_mp4_object(script).is_none());
    }

    #[test]
    fn missing_marker_is_extraction_error() {
        let err = parse_embed_page(&page("var config = {};")).unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
    }

    #[test]
    fn malformed_manifest_is_extraction_error() {
        let err = parse_embed_page(&page(r#""ua":{"mp4":{"720":{"url":,"timeline":{"#)).unwrap_err();
        assert!(matches!(err, Error::Extraction(ref m) if m.contains("malformed")));
    }

    #[test]
    fn empty_manifest_is_extraction_error() {
        let err = parse_mp4_object(r#"{"720": {"url": ""}}"#).unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
        assert!(parse_mp4_object("{}").is_err());
    }
}
