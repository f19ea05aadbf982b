//! Byte-level format sniffing.
//!
//! Content is identified by the magic numbers in its first bytes. When no
//! signature matches, the file extension of the source URL is used instead.

use url::Url;

use crate::types::{DetectionMethod, FormatGuess};

/// Number of leading bytes inspected for signatures.
const SNIFF_LEN: usize = 100;

const SIGNATURE_CONFIDENCE: f32 = 0.9;
const EXTENSION_CONFIDENCE: f32 = 0.6;

/// One magic-number rule.
struct Signature {
    mime_type: &'static str,
    /// Byte offset where `magic` starts
    offset: usize,
    /// Lowercase hex of the magic bytes
    magic: &'static str,
    /// Container sub-type that must also be present (offset, hex)
    subtype: Option<(usize, &'static str)>,
}

const fn sig(mime_type: &'static str, magic: &'static str) -> Signature {
    Signature {
        mime_type,
        offset: 0,
        magic,
        subtype: None,
    }
}

const fn riff(mime_type: &'static str, form: &'static str) -> Signature {
    Signature {
        mime_type,
        offset: 0,
        magic: "52494646",
        subtype: Some((8, form)),
    }
}

/// ISO-BMFF `ftyp` box at offset 4, resolved by its major brand at offset 8.
const fn iso(mime_type: &'static str, brand: &'static str) -> Signature {
    Signature {
        mime_type,
        offset: 4,
        magic: "66747970",
        subtype: Some((8, brand)),
    }
}

const SIGNATURES: &[Signature] = &[
    // Audio
    sig("audio/mp3", "494433"),
    sig("audio/mp3", "fffb"),
    sig("audio/mp3", "fff3"),
    sig("audio/mp3", "fff2"),
    riff("audio/wav", "57415645"),
    sig("audio/flac", "664c6143"),
    sig("audio/ogg", "4f676753"),
    iso("audio/mp4", "4d344120"),
    iso("audio/mp4", "4d344220"),
    // Video
    iso("video/mp4", "69736f6d"),
    iso("video/mp4", "6d703431"),
    iso("video/mp4", "6d703432"),
    iso("video/mp4", "61766331"),
    iso("video/mp4", "64617368"),
    iso("video/quicktime", "71742020"),
    sig("video/webm", "1a45dfa3"),
    riff("video/avi", "41564920"),
    // Image
    sig("image/jpeg", "ffd8ff"),
    sig("image/png", "89504e47"),
    sig("image/gif", "474946383761"),
    sig("image/gif", "474946383961"),
    riff("image/webp", "57454250"),
    iso("image/avif", "61766966"),
    iso("image/heic", "68656963"),
    // Documents
    sig("application/pdf", "25504446"),
    sig("application/zip", "504b0304"),
    sig("application/zip", "504b0506"),
    sig("application/zip", "504b0708"),
    sig("text/html", "3c68746d6c"),
    sig("text/html", "3c21444f43545950452068746d6c"),
    sig("text/html", "3c21646f63747970652068746d6c"),
];

impl Signature {
    fn matches(&self, hex_prefix: &str) -> bool {
        hex_at(hex_prefix, self.offset, self.magic)
            && self
                .subtype
                .map_or(true, |(offset, form)| hex_at(hex_prefix, offset, form))
    }
}

fn hex_at(hex_prefix: &str, offset: usize, magic: &str) -> bool {
    hex_prefix
        .get(offset * 2..)
        .is_some_and(|rest| rest.starts_with(magic))
}

/// Identify the format of `content`, falling back to the URL extension.
///
/// Returns an empty list when neither source yields anything.
pub fn detect_format(content: &[u8], url: Option<&str>) -> Vec<FormatGuess> {
    let mut formats = sniff_signatures(content);

    if formats.is_empty() {
        if let Some(mime_type) = url.map(file_extension).and_then(|ext| infer_mime_type(&ext)) {
            formats.push(FormatGuess::new(
                mime_type,
                EXTENSION_CONFIDENCE,
                DetectionMethod::Extension,
            ));
        }
    }

    formats
}

/// Signature matches only, one guess per MIME type.
pub fn sniff_signatures(content: &[u8]) -> Vec<FormatGuess> {
    let hex_prefix = hex::encode(&content[..content.len().min(SNIFF_LEN)]);
    let mut formats: Vec<FormatGuess> = Vec::new();

    for signature in SIGNATURES {
        if !signature.matches(&hex_prefix) {
            continue;
        }
        if formats.iter().any(|f| f.mime_type == signature.mime_type) {
            continue;
        }
        formats.push(FormatGuess::new(
            signature.mime_type,
            SIGNATURE_CONFIDENCE,
            DetectionMethod::Signature,
        ));
    }

    formats
}

/// Lowercase file extension (with leading dot) of a URL or bare path.
///
/// Returns an empty string when there is none.
pub fn file_extension(url: &str) -> String {
    let last_segment = if url.contains("://") {
        match Url::parse(url) {
            Ok(parsed) => parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back())
                .unwrap_or("")
                .to_string(),
            Err(_) => return String::new(),
        }
    } else {
        url.rsplit('/').next().unwrap_or("").to_string()
    };

    match last_segment.rsplit_once('.') {
        Some((_, ext)) if !ext.is_empty() => format!(".{}", ext.to_ascii_lowercase()),
        _ => String::new(),
    }
}

/// MIME type for a known file extension.
pub fn infer_mime_type(extension: &str) -> Option<&'static str> {
    let mime = match extension {
        ".mp3" => "audio/mp3",
        ".wav" => "audio/wav",
        ".flac" => "audio/flac",
        ".ogg" => "audio/ogg",
        ".m4a" => "audio/mp4",
        ".mp4" => "video/mp4",
        ".webm" => "video/webm",
        ".avi" => "video/avi",
        ".mov" => "video/quicktime",
        ".jpg" | ".jpeg" => "image/jpeg",
        ".png" => "image/png",
        ".gif" => "image/gif",
        ".webp" => "image/webp",
        ".pdf" => "application/pdf",
        ".txt" => "text/plain",
        ".html" | ".htm" => "text/html",
        _ => return None,
    };
    Some(mime)
}
