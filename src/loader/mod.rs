//! Document loader
//!
//! Walks a source directory and extracts chunked text units from .txt, .md,
//! and .pdf files. Text files are split into fixed-size character windows;
//! PDFs are extracted page by page with each page windowed independently.
//! Extraction failures skip the file or page, never the whole walk.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::ChunkingConfig;

/// Extensions considered indexable, lowercase
const INDEXABLE_EXTENSIONS: [&str; 3] = ["md", "txt", "pdf"];

/// A unit of extracted document text with source provenance
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Chunk {
    /// Source file the text came from
    pub path: PathBuf,
    /// 1-based page number for paginated sources, None for plain text
    pub page: Option<u32>,
    /// Extracted text, whitespace-trimmed and non-empty
    pub text: String,
}

/// Load every indexable file under `src_dir` into chunks
///
/// Discovered paths are sorted before extraction so index builds are
/// reproducible regardless of filesystem traversal order. A missing or empty
/// directory yields an empty list.
pub fn load_documents(src_dir: &Path, config: &ChunkingConfig) -> Vec<Chunk> {
    let mut paths: Vec<PathBuf> = WalkDir::new(src_dir)
        .follow_links(true)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(e) => Some(e),
            Err(err) => {
                tracing::warn!("Skipping unreadable entry: {}", err);
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| is_indexable(p))
        .collect();
    paths.sort();

    let mut chunks = Vec::new();
    for path in paths {
        let is_pdf = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false);

        if is_pdf {
            chunks.extend(load_pdf(&path, config.pdf_chunk_chars));
        } else {
            chunks.extend(load_text_file(&path, config.text_chunk_chars));
        }
    }

    tracing::info!("Loaded {} chunks from {:?}", chunks.len(), src_dir);
    chunks
}

fn is_indexable(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let lower = e.to_lowercase();
            INDEXABLE_EXTENSIONS.contains(&lower.as_str())
        })
        .unwrap_or(false)
}

/// Split a .txt/.md file into fixed-size character windows with no overlap
fn load_text_file(path: &Path, chunk_chars: usize) -> Vec<Chunk> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) => {
            tracing::warn!("Skipping text file {:?}: {}", path, e);
            return Vec::new();
        }
    };
    // Lossy decode: a stray invalid byte should not drop the whole file
    let text = String::from_utf8_lossy(&bytes);

    window_chunks(&text, chunk_chars)
        .into_iter()
        .map(|piece| Chunk {
            path: path.to_path_buf(),
            page: None,
            text: piece,
        })
        .collect()
}

/// Extract a PDF page by page, windowing each page independently
fn load_pdf(path: &Path, chunk_chars: usize) -> Vec<Chunk> {
    let document = match lopdf::Document::load(path) {
        Ok(d) => d,
        Err(e) => {
            tracing::warn!("Skipping PDF {:?}: {}", path, e);
            return Vec::new();
        }
    };

    let mut chunks = Vec::new();
    for (page_number, _) in document.get_pages() {
        let text = match document.extract_text(&[page_number]) {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!("Skipping page {} of {:?}: {}", page_number, path, e);
                continue;
            }
        };

        for piece in window_chunks(&text, chunk_chars) {
            chunks.push(Chunk {
                path: path.to_path_buf(),
                page: Some(page_number),
                text: piece,
            });
        }
    }
    chunks
}

/// Fixed-size character windows, each trimmed; empty windows dropped
fn window_chunks(text: &str, chunk_chars: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(chunk_chars)
        .map(|w| w.iter().collect::<String>().trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn config() -> ChunkingConfig {
        ChunkingConfig {
            text_chunk_chars: 700,
            pdf_chunk_chars: 900,
        }
    }

    #[test]
    fn splits_text_into_fixed_windows() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("notes.txt");
        std::fs::write(&path, "a".repeat(1500)).unwrap();

        let chunks = load_documents(temp.path(), &config());
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].text.len(), 700);
        assert_eq!(chunks[1].text.len(), 700);
        assert_eq!(chunks[2].text.len(), 100);
        assert!(chunks.iter().all(|c| c.page.is_none()));
        assert!(chunks.iter().all(|c| c.path == path));
    }

    #[test]
    fn drops_whitespace_only_windows() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("blank.md"), "   \n\t  \n").unwrap();

        let chunks = load_documents(temp.path(), &config());
        assert!(chunks.is_empty());
    }

    #[test]
    fn ignores_unknown_extensions() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("image.png"), [0u8, 1, 2]).unwrap();
        std::fs::write(temp.path().join("script.py"), "print('hi')").unwrap();
        std::fs::write(temp.path().join("readme.md"), "docs content").unwrap();

        let chunks = load_documents(temp.path(), &config());
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].path.ends_with("readme.md"));
    }

    #[test]
    fn walks_recursively_in_sorted_order() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir_all(temp.path().join("sub")).unwrap();
        std::fs::write(temp.path().join("sub/zeta.txt"), "from zeta").unwrap();
        std::fs::write(temp.path().join("alpha.txt"), "from alpha").unwrap();

        let chunks = load_documents(temp.path(), &config());
        assert_eq!(chunks.len(), 2);
        assert!(chunks[0].path.ends_with("alpha.txt"));
        assert!(chunks[1].path.ends_with("sub/zeta.txt"));
    }

    #[test]
    fn missing_directory_yields_no_chunks() {
        let temp = TempDir::new().unwrap();
        let missing = temp.path().join("does-not-exist");
        let chunks = load_documents(&missing, &config());
        assert!(chunks.is_empty());
    }

    #[test]
    fn corrupt_pdf_is_skipped_not_fatal() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("broken.pdf"), b"not a real pdf").unwrap();
        std::fs::write(temp.path().join("ok.txt"), "still indexed").unwrap();

        let chunks = load_documents(temp.path(), &config());
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].text, "still indexed");
    }

    #[test]
    fn invalid_utf8_is_decoded_lossily() {
        let temp = TempDir::new().unwrap();
        let mut bytes = b"valid prefix ".to_vec();
        bytes.push(0xFF);
        bytes.extend_from_slice(b" valid suffix");
        std::fs::write(temp.path().join("mixed.txt"), bytes).unwrap();

        let chunks = load_documents(temp.path(), &config());
        assert_eq!(chunks.len(), 1);
        assert!(chunks[0].text.contains("valid prefix"));
        assert!(chunks[0].text.contains("valid suffix"));
    }
}
