//! Content-type detection from leading bytes.
//!
//! The detected type is only ever used as an advisory `Content-Type` tag, so
//! an unknown payload is not an error.

use serde::{Deserialize, Serialize};

/// Detected mime type of a payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileType {
    pub mime: String,
}

/// Detects a mime type by inspecting byte content.
pub trait ContentTypeSniffer: Send + Sync {
    fn detect(&self, data: &[u8]) -> Option<FileType>;
}

/// Offset-anchored magic numbers.
const SIGNATURES: &[(usize, &[u8], &str)] = &[
    (0, b"\x89PNG\r\n\x1a\n", "image/png"),
    (0, b"\xff\xd8\xff", "image/jpeg"),
    (0, b"GIF87a", "image/gif"),
    (0, b"GIF89a", "image/gif"),
    (0, b"%PDF-", "application/pdf"),
    (0, b"PK\x03\x04", "application/zip"),
    (0, b"\x1f\x8b", "application/gzip"),
    (0, b"ID3", "audio/mpeg"),
    (0, b"OggS", "audio/ogg"),
    (0, b"fLaC", "audio/x-flac"),
    (0, b"\x1a\x45\xdf\xa3", "video/webm"),
    (0, b"\x00asm", "application/wasm"),
    (0, b"BM", "image/bmp"),
    (4, b"ftyp", "video/mp4"),
];

/// Magic-number sniffer covering common media and archive formats.
#[derive(Debug, Clone, Copy, Default)]
pub struct MagicSniffer;

impl ContentTypeSniffer for MagicSniffer {
    fn detect(&self, data: &[u8]) -> Option<FileType> {
        // RIFF containers share a prefix; the form type sits at offset 8.
        if data.len() >= 12 && &data[..4] == b"RIFF" {
            let mime = match &data[8..12] {
                b"WEBP" => "image/webp",
                b"WAVE" => "audio/wav",
                b"AVI " => "video/x-msvideo",
                _ => return None,
            };
            return Some(FileType {
                mime: mime.to_string(),
            });
        }

        SIGNATURES
            .iter()
            .find(|(offset, magic, _)| {
                data.get(*offset..offset + magic.len()) == Some(*magic)
            })
            .map(|(_, _, mime)| FileType {
                mime: (*mime).to_string(),
            })
    }
}
