//! CMU pronouncing dictionary loading and on-demand download.

use crate::config::G2pConfig;
use crate::defaults;
use crate::error::{PhonoscopeError, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Get the default location of the pronouncing dictionary.
///
/// Uses `~/.local/share/phonoscope/cmudict.dict` on Linux.
pub fn default_lexicon_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from(".cache"))
        .join("phonoscope")
        .join(defaults::LEXICON_FILE_NAME)
}

/// Word to ARPAbet pronunciation table.
///
/// Keys are lowercase. Only the first pronunciation listed for a word is
/// kept; `word(2)` style alternates are skipped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Lexicon {
    entries: HashMap<String, Vec<String>>,
}

impl Lexicon {
    /// Parse dictionary text.
    ///
    /// Accepts both the cmusphinx layout (`word P1 P2 # comment`) and the
    /// classic layout (`WORD  P1 P2` with `;;;` comment lines).
    pub fn parse(text: &str) -> Self {
        let mut entries = HashMap::new();

        for line in text.lines() {
            let line = line.trim();
            if line.is_empty() || line.starts_with(";;;") {
                continue;
            }
            let content = line.split('#').next().unwrap_or_default();

            let mut fields = content.split_whitespace();
            let Some(head) = fields.next() else {
                continue;
            };
            if head.ends_with(')') && head.contains('(') {
                continue;
            }
            let phonemes: Vec<String> = fields.map(str::to_string).collect();
            if phonemes.is_empty() {
                continue;
            }

            entries.entry(head.to_lowercase()).or_insert(phonemes);
        }

        Self { entries }
    }

    /// Read and parse a dictionary file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).map_err(|e| {
            PhonoscopeError::conversion_caused_by(
                format!("failed to read lexicon {}", path.display()),
                e,
            )
        })?;
        let lexicon = Self::parse(&text);
        if lexicon.is_empty() {
            return Err(PhonoscopeError::conversion(format!(
                "lexicon {} has no entries",
                path.display()
            )));
        }
        tracing::info!(path = %path.display(), words = lexicon.len(), "loaded lexicon");
        Ok(lexicon)
    }

    pub fn lookup(&self, word: &str) -> Option<&[String]> {
        self.entries.get(word).map(Vec::as_slice)
    }

    /// Add or replace a pronunciation.
    pub fn insert(&mut self, word: &str, phonemes: &[&str]) {
        self.entries.insert(
            word.to_lowercase(),
            phonemes.iter().map(|p| p.to_string()).collect(),
        );
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Make sure the dictionary named by `config` exists on disk.
///
/// A missing file is fetched from `config.lexicon_url` when
/// `config.auto_download` is set and the `model-download` feature is built.
pub fn ensure_lexicon(config: &G2pConfig, progress: bool) -> Result<PathBuf> {
    let path = config.lexicon_path.clone();
    if path.exists() {
        return Ok(path);
    }

    if !config.auto_download {
        return Err(PhonoscopeError::conversion(format!(
            "lexicon not found at {} and auto_download is disabled",
            path.display()
        )));
    }

    download_lexicon(&config.lexicon_url, &path, progress)?;
    Ok(path)
}

#[cfg(feature = "model-download")]
fn download_lexicon(url: &str, output_path: &Path, progress: bool) -> Result<()> {
    use indicatif::{ProgressBar, ProgressStyle};

    if let Some(parent) = output_path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            PhonoscopeError::conversion_caused_by("failed to create lexicon directory", e)
        })?;
    }

    tracing::info!(url, path = %output_path.display(), "downloading lexicon");

    let mut response = reqwest::blocking::get(url).map_err(|e| {
        PhonoscopeError::conversion_caused_by(format!("failed to start download from {url}"), e)
    })?;

    if !response.status().is_success() {
        return Err(PhonoscopeError::conversion(format!(
            "lexicon download failed with status: {}",
            response.status()
        )));
    }

    let total_size = response.content_length().unwrap_or(0);
    let pb = if progress {
        let pb = ProgressBar::new(total_size);
        pb.set_style(
            // SAFETY: hardcoded template string, always valid
            #[allow(clippy::expect_used)]
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({eta})")
                .expect("hardcoded progress bar template")
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let result = install_from_reader(&mut response, output_path, |read| {
        if let Some(ref pb) = pb {
            pb.inc(read);
        }
    });

    if let Some(pb) = pb {
        match &result {
            Ok(_) => pb.finish_with_message("Downloaded"),
            Err(_) => pb.abandon(),
        }
    }
    result?;

    tracing::info!(path = %output_path.display(), "lexicon installed");
    Ok(())
}

/// Copy `reader` to `output_path` through a `.part` file.
///
/// The partial file is removed on every failure, so `output_path` either
/// holds the complete body or does not exist.
#[cfg(any(feature = "model-download", test))]
fn install_from_reader<R: std::io::Read>(
    reader: &mut R,
    output_path: &Path,
    on_progress: impl FnMut(u64),
) -> Result<()> {
    let partial_path = output_path.with_extension("part");
    let copied = copy_to_partial(reader, &partial_path, on_progress).and_then(|()| {
        fs::rename(&partial_path, output_path).map_err(|e| {
            PhonoscopeError::conversion_caused_by("failed to move lexicon into place", e)
        })
    });

    if copied.is_err()
        && partial_path.exists()
        && let Err(cleanup) = fs::remove_file(&partial_path)
    {
        tracing::warn!(error = %cleanup, "failed to remove partial lexicon download");
    }
    copied
}

#[cfg(any(feature = "model-download", test))]
fn copy_to_partial<R: std::io::Read>(
    reader: &mut R,
    partial_path: &Path,
    mut on_progress: impl FnMut(u64),
) -> Result<()> {
    use std::io::Write;

    let mut file = fs::File::create(partial_path)
        .map_err(|e| PhonoscopeError::conversion_caused_by("failed to create lexicon file", e))?;

    let mut buffer = [0u8; 64 * 1024];
    loop {
        let read = reader
            .read(&mut buffer)
            .map_err(|e| PhonoscopeError::conversion_caused_by("failed to read download", e))?;
        if read == 0 {
            break;
        }
        file.write_all(&buffer[..read])
            .map_err(|e| PhonoscopeError::conversion_caused_by("failed to write lexicon", e))?;
        on_progress(read as u64);
    }
    file.sync_all()
        .map_err(|e| PhonoscopeError::conversion_caused_by("failed to write lexicon", e))
}

#[cfg(not(feature = "model-download"))]
fn download_lexicon(url: &str, output_path: &Path, _progress: bool) -> Result<()> {
    Err(PhonoscopeError::conversion(format!(
        "lexicon not found at {}.\n\
         This build cannot download it; fetch {url} manually.",
        output_path.display()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
cat K AE1 T
sat S AE1 T
read R IY1 D
read(2) R EH1 D
d'artagnan D AH0 R T AE1 NG Y AH0 N # foreign french
";

    #[test]
    fn parse_cmusphinx_layout() {
        let lexicon = Lexicon::parse(SAMPLE);

        assert_eq!(lexicon.len(), 4);
        assert_eq!(lexicon.lookup("cat").unwrap(), ["K", "AE1", "T"]);
        assert_eq!(
            lexicon.lookup("d'artagnan").unwrap().last().map(String::as_str),
            Some("N")
        );
    }

    #[test]
    fn parse_keeps_first_pronunciation() {
        let lexicon = Lexicon::parse(SAMPLE);
        assert_eq!(lexicon.lookup("read").unwrap(), ["R", "IY1", "D"]);
        assert!(lexicon.lookup("read(2)").is_none());
    }

    #[test]
    fn parse_classic_layout() {
        let text = ";;; header comment\nHELLO  HH AH0 L OW1\nWORLD  W ER1 L D\n";
        let lexicon = Lexicon::parse(text);

        assert_eq!(lexicon.len(), 2);
        assert_eq!(lexicon.lookup("hello").unwrap(), ["HH", "AH0", "L", "OW1"]);
    }

    #[test]
    fn parse_skips_lines_without_phonemes() {
        let lexicon = Lexicon::parse("orphan\n\n   \ndog D AO1 G\n");
        assert_eq!(lexicon.len(), 1);
    }

    #[test]
    fn insert_lowercases_key() {
        let mut lexicon = Lexicon::default();
        lexicon.insert("Phonoscope", &["F", "OW1", "N", "AH0", "S", "K", "OW2", "P"]);
        assert!(lexicon.lookup("phonoscope").is_some());
    }

    #[test]
    fn load_missing_file_is_conversion_error() {
        let result = Lexicon::load(Path::new("/nonexistent/phonoscope/cmudict.dict"));
        assert!(matches!(result, Err(PhonoscopeError::Conversion { .. })));
    }

    #[test]
    fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mini.dict");
        fs::write(&path, SAMPLE).unwrap();

        let lexicon = Lexicon::load(&path).unwrap();
        assert_eq!(lexicon.lookup("sat").unwrap(), ["S", "AE1", "T"]);
    }

    #[test]
    fn load_empty_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.dict");
        fs::write(&path, ";;; nothing here\n").unwrap();

        assert!(Lexicon::load(&path).is_err());
    }

    #[test]
    fn ensure_existing_lexicon_returns_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cmudict.dict");
        fs::write(&path, SAMPLE).unwrap();

        let config = G2pConfig {
            lexicon_path: path.clone(),
            lexicon_url: String::new(),
            auto_download: false,
        };
        assert_eq!(ensure_lexicon(&config, false).unwrap(), path);
    }

    #[test]
    fn ensure_missing_lexicon_without_download_fails() {
        let config = G2pConfig {
            lexicon_path: PathBuf::from("/nonexistent/phonoscope/cmudict.dict"),
            lexicon_url: String::new(),
            auto_download: false,
        };

        match ensure_lexicon(&config, false) {
            Err(PhonoscopeError::Conversion { message, .. }) => {
                assert!(message.contains("auto_download is disabled"));
            }
            other => panic!("Expected Conversion error, got {:?}", other),
        }
    }

    struct BrokenStream {
        sent: bool,
    }

    impl std::io::Read for BrokenStream {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.sent {
                return Err(std::io::Error::other("connection reset"));
            }
            self.sent = true;
            let chunk = b"cat K AE1 T\n";
            buf[..chunk.len()].copy_from_slice(chunk);
            Ok(chunk.len())
        }
    }

    #[test]
    fn interrupted_download_leaves_no_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cmudict.dict");
        let mut progress = 0;

        let result = install_from_reader(&mut BrokenStream { sent: false }, &path, |n| {
            progress += n
        });

        match result {
            Err(PhonoscopeError::Conversion { message, .. }) => {
                assert_eq!(message, "failed to read download");
            }
            other => panic!("Expected Conversion error, got {:?}", other),
        }
        assert_eq!(progress, 12);
        assert!(!path.exists());
        assert!(!path.with_extension("part").exists());
    }

    #[test]
    fn completed_download_is_moved_into_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cmudict.dict");

        install_from_reader(&mut SAMPLE.as_bytes(), &path, |_| {}).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), SAMPLE);
        assert!(!path.with_extension("part").exists());
        assert_eq!(Lexicon::load(&path).unwrap().len(), 4);
    }

    #[test]
    fn default_path_ends_with_file_name() {
        let path = default_lexicon_path();
        assert!(path.ends_with("phonoscope/cmudict.dict"));
    }
}
