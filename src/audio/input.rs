use std::fmt;
use std::io::Read;
use std::path::PathBuf;

/// Where a recording comes from.
///
/// All three variants are decoded by the same routine in
/// [`wav::decode`](crate::audio::wav::decode).
pub enum AudioInput {
    /// WAV file on disk
    FilePath(PathBuf),
    /// Complete WAV container held in memory
    Bytes(Vec<u8>),
    /// Any reader yielding a WAV container
    Stream(Box<dyn Read + Send>),
}

impl AudioInput {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self::FilePath(path.into())
    }

    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Bytes(bytes.into())
    }

    pub fn from_reader(reader: impl Read + Send + 'static) -> Self {
        Self::Stream(Box::new(reader))
    }

    /// Short label for log events.
    pub fn describe(&self) -> String {
        match self {
            Self::FilePath(path) => path.display().to_string(),
            Self::Bytes(bytes) => format!("<{} bytes>", bytes.len()),
            Self::Stream(_) => "<stream>".to_string(),
        }
    }
}

impl fmt::Debug for AudioInput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FilePath(path) => f.debug_tuple("FilePath").field(path).finish(),
            Self::Bytes(bytes) => f.debug_tuple("Bytes").field(&bytes.len()).finish(),
            Self::Stream(_) => f.write_str("Stream(<reader>)"),
        }
    }
}

impl From<PathBuf> for AudioInput {
    fn from(path: PathBuf) -> Self {
        Self::FilePath(path)
    }
}

impl From<&std::path::Path> for AudioInput {
    fn from(path: &std::path::Path) -> Self {
        Self::FilePath(path.to_path_buf())
    }
}

impl From<Vec<u8>> for AudioInput {
    fn from(bytes: Vec<u8>) -> Self {
        Self::Bytes(bytes)
    }
}
