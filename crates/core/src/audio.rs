//! Uploaded audio types

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Audio container formats accepted by the transcription provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AudioFormat {
    Flac,
    M4a,
    Mp3,
    Mp4,
    Mpeg,
    Mpga,
    Oga,
    Ogg,
    Wav,
    Webm,
}

impl AudioFormat {
    /// Every supported format, in the order they are advertised to clients
    pub const ALL: [AudioFormat; 10] = [
        AudioFormat::Flac,
        AudioFormat::M4a,
        AudioFormat::Mp3,
        AudioFormat::Mp4,
        AudioFormat::Mpeg,
        AudioFormat::Mpga,
        AudioFormat::Oga,
        AudioFormat::Ogg,
        AudioFormat::Wav,
        AudioFormat::Webm,
    ];

    /// File extension without the leading dot
    pub fn extension(&self) -> &'static str {
        match self {
            AudioFormat::Flac => "flac",
            AudioFormat::M4a => "m4a",
            AudioFormat::Mp3 => "mp3",
            AudioFormat::Mp4 => "mp4",
            AudioFormat::Mpeg => "mpeg",
            AudioFormat::Mpga => "mpga",
            AudioFormat::Oga => "oga",
            AudioFormat::Ogg => "ogg",
            AudioFormat::Wav => "wav",
            AudioFormat::Webm => "webm",
        }
    }

    /// MIME type sent alongside the upload
    pub fn mime_type(&self) -> &'static str {
        match self {
            AudioFormat::Flac => "audio/flac",
            AudioFormat::M4a => "audio/mp4",
            AudioFormat::Mp3 | AudioFormat::Mpeg | AudioFormat::Mpga => "audio/mpeg",
            AudioFormat::Mp4 => "video/mp4",
            AudioFormat::Oga | AudioFormat::Ogg => "audio/ogg",
            AudioFormat::Wav => "audio/wav",
            AudioFormat::Webm => "audio/webm",
        }
    }

    /// Resolve the format from an uploaded file name (case-insensitive extension)
    pub fn from_file_name(name: &str) -> Option<Self> {
        let (_, ext) = name.rsplit_once('.')?;
        ext.parse().ok()
    }

    /// Comma-separated list of supported extensions
    pub fn supported_list() -> String {
        Self::ALL
            .iter()
            .map(|f| f.extension())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl fmt::Display for AudioFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for AudioFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|f| f.extension() == lower)
            .ok_or_else(|| Error::UnsupportedFormat(s.to_string()))
    }
}

/// A validated audio upload
#[derive(Debug, Clone)]
pub struct AudioClip {
    pub bytes: Vec<u8>,
    pub format: AudioFormat,
    /// Original file name as uploaded, if any
    pub file_name: Option<String>,
}

impl AudioClip {
    pub fn new(bytes: Vec<u8>, format: AudioFormat) -> Self {
        Self {
            bytes,
            format,
            file_name: None,
        }
    }

    pub fn with_file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    /// File name to report to the transcription provider
    pub fn upload_name(&self) -> String {
        self.file_name
            .clone()
            .unwrap_or_else(|| format!("audio.{}", self.format.extension()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_file_name() {
        assert_eq!(AudioFormat::from_file_name("clip.wav"), Some(AudioFormat::Wav));
        assert_eq!(AudioFormat::from_file_name("CLIP.WEBM"), Some(AudioFormat::Webm));
        assert_eq!(AudioFormat::from_file_name("a.b.m4a"), Some(AudioFormat::M4a));
        assert_eq!(AudioFormat::from_file_name("clip.xyz"), None);
        assert_eq!(AudioFormat::from_file_name("noextension"), None);
    }

    #[test]
    fn test_supported_list() {
        assert_eq!(
            AudioFormat::supported_list(),
            "flac, m4a, mp3, mp4, mpeg, mpga, oga, ogg, wav, webm"
        );
    }

    #[test]
    fn test_upload_name_defaults_to_extension() {
        let clip = AudioClip::new(vec![0u8; 4], AudioFormat::Ogg);
        assert_eq!(clip.upload_name(), "audio.ogg");

        let named = clip.with_file_name("greeting.ogg");
        assert_eq!(named.upload_name(), "greeting.ogg");
    }
}
