//! Mirror decoding and provider classification.
//!
//! WordPress anime themes put every mirror in a `<select class="mirror">`;
//! each option value is a base64 `<iframe>` snippet. Decoding pulls the
//! iframe `src` out, normalizes it, and classifies the host.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::models::{Processor, StreamProvider};

const SRC_MARKER: &str = "src=";

/// One `<option>` of the mirror dropdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MirrorOption {
    pub label: String,
    pub value: String,
}

impl MirrorOption {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }

    /// `true` for the "Select mirror" style entry with no payload.
    pub fn is_placeholder(&self) -> bool {
        let value = self.value.trim();
        value.is_empty() || value == "#"
    }
}

/// How a list of mirror options is filtered before decoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MirrorPolicy {
    /// Drop the first option when it is a placeholder.
    pub skip_placeholder: bool,
}

impl Default for MirrorPolicy {
    fn default() -> Self {
        Self {
            skip_placeholder: true,
        }
    }
}

/// Decode one option value into a normalized embed URL.
///
/// Returns `Ok(None)` when the payload decodes but carries no quoted `src`,
/// and a [`Error::Decode`] when the payload is not valid base64 text.
pub fn decode_mirror(option: &MirrorOption) -> Result<Option<String>> {
    let bytes = STANDARD
        .decode(option.value.trim())
        .map_err(|e| Error::Decode {
            label: option.label.clone(),
            reason: e.to_string(),
        })?;
    let decoded = String::from_utf8_lossy(&bytes);
    Ok(extract_src(&decoded).map(normalize_embed_url))
}

/// The raw value of the first quoted `src=` attribute in `fragment`.
pub fn extract_src(fragment: &str) -> Option<&str> {
    let at = fragment.find(SRC_MARKER)? + SRC_MARKER.len();
    let quote = match fragment.as_bytes().get(at)? {
        b'"' => '"',
        b'\'' => '\'',
        _ => return None,
    };
    let start = at + 1;
    let len = fragment[start..].find(quote)?;
    let url = &fragment[start..start + len];
    (!url.is_empty()).then_some(url)
}

/// Give scheme-relative and scheme-less URLs an `https` scheme.
pub fn normalize_embed_url(raw: &str) -> String {
    if raw.starts_with("//") {
        format!("https:{raw}")
    } else if !raw.starts_with("http") {
        format!("https://{raw}")
    } else {
        raw.to_string()
    }
}

/// Map an embed URL to a display name and resolver tag.
///
/// Matches anywhere in the URL, not just the host.
pub fn classify(embed_url: &str, label: &str) -> (String, Processor) {
    let url = embed_url.to_lowercase();
    let (name, processor) = if url.contains("rumble.com") {
        ("Rumble", Processor::Rumble)
    } else if url.contains("youtube.com") || url.contains("youtu.be") {
        ("YouTube", Processor::Youtube)
    } else if url.contains("dailymotion.com") {
        ("Dailymotion", Processor::Dailymotion)
    } else if url.contains("vimeo.com") {
        ("Vimeo", Processor::Vimeo)
    } else {
        return (label.trim().to_string(), Processor::Default);
    };
    (name.to_string(), processor)
}

/// Decode and classify every option, skipping the ones that yield nothing.
pub fn providers_from_mirrors(options: &[MirrorOption], policy: MirrorPolicy) -> Vec<StreamProvider> {
    let mut providers = Vec::with_capacity(options.len());

    for (i, option) in options.iter().enumerate() {
        if i == 0 && policy.skip_placeholder && option.is_placeholder() {
            continue;
        }

        let embed_url = match decode_mirror(option) {
            Ok(Some(url)) => url,
            Ok(None) => {
                debug!(label = %option.label, "Mirror has no embed src, skipping");
                continue;
            }
            Err(e) => {
                warn!("{e}");
                continue;
            }
        };

        let (name, processor) = classify(&embed_url, &option.label);
        debug!(name = %name, processor = %processor, url = %embed_url, "Found provider");
        providers.push(StreamProvider {
            name,
            embed_url,
            processor,
        });
    }

    providers
}
