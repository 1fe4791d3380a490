//! Named, typed byte payloads produced by the exporters.

use crate::error::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// File name of the rendered-audio export.
pub const WAV_FILE_NAME: &str = "sequence.wav";
pub const WAV_MIME_TYPE: &str = "audio/wav";

/// File name of the symbolic export.
pub const MIDI_FILE_NAME: &str = "sequence.mid";
pub const MIDI_MIME_TYPE: &str = "audio/midi";

/// A finished export: what to call it, what it is, and its bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    file_name: String,
    mime_type: &'static str,
    bytes: Vec<u8>,
}

impl Artifact {
    pub fn new(file_name: impl Into<String>, mime_type: &'static str, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type,
            bytes,
        }
    }

    pub(crate) fn wav(bytes: Vec<u8>) -> Self {
        Self::new(WAV_FILE_NAME, WAV_MIME_TYPE, bytes)
    }

    pub(crate) fn midi(bytes: Vec<u8>) -> Self {
        Self::new(MIDI_FILE_NAME, MIDI_MIME_TYPE, bytes)
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn mime_type(&self) -> &'static str {
        self.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Write the artifact into `dir` under its file name, replacing any
    /// existing file.
    pub fn write_to_dir(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let path = dir.as_ref().join(&self.file_name);
        fs::write(&path, &self.bytes)?;
        tracing::info!(path = %path.display(), bytes = self.bytes.len(), "artifact written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_named_constructors() {
        let wav = Artifact::wav(vec![1, 2, 3]);
        assert_eq!(wav.file_name(), "sequence.wav");
        assert_eq!(wav.mime_type(), "audio/wav");
        assert_eq!(wav.len(), 3);

        let midi = Artifact::midi(Vec::new());
        assert_eq!(midi.file_name(), "sequence.mid");
        assert_eq!(midi.mime_type(), "audio/midi");
        assert!(midi.is_empty());
    }

    #[test]
    fn test_write_to_dir() {
        let dir = tempfile::tempdir().unwrap();
        let artifact = Artifact::midi(b"MThd".to_vec());

        let path = artifact.write_to_dir(dir.path()).unwrap();
        assert_eq!(path, dir.path().join("sequence.mid"));
        assert_eq!(std::fs::read(&path).unwrap(), b"MThd");

        // Overwrites
        Artifact::midi(b"x".to_vec()).write_to_dir(dir.path()).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"x");
    }

    #[test]
    fn test_write_to_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(Artifact::wav(vec![0]).write_to_dir(missing).is_err());
    }
}
