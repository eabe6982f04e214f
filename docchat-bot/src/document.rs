//! Document text extraction.
//!
//! Accepted uploads are written to the temp directory under their original
//! filename, extracted, and deleted after processing. An extraction failure
//! returns before the delete, so a failed run can leave the file behind.

use docchat_common::{Error, Result};
use std::path::{Path, PathBuf};

/// Check whether a filename has a supported extension (`.pdf` or `.txt`).
pub fn is_supported(file_name: &str) -> bool {
    let lower = file_name.to_lowercase();
    lower.ends_with(".pdf") || lower.ends_with(".txt")
}

/// Write the downloaded bytes to disk, extract the text, and clean up.
pub async fn save_and_extract(bytes: &[u8], file_name: &str) -> Result<String> {
    // Strip any path components from the client-supplied name
    let base_name = Path::new(file_name)
        .file_name()
        .ok_or_else(|| Error::InvalidInput(format!("Invalid filename: {file_name}")))?;

    let path: PathBuf = std::env::temp_dir().join(base_name);
    tokio::fs::write(&path, bytes).await?;

    let text = extract_text(&path)?;

    tokio::fs::remove_file(&path).await?;
    Ok(text)
}

/// Extract text from a file on disk based on its extension.
pub fn extract_text(path: &Path) -> Result<String> {
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default()
        .to_lowercase();

    if name.ends_with(".pdf") {
        extract_pdf(path)
    } else if name.ends_with(".txt") {
        extract_txt(path)
    } else {
        Err(Error::InvalidInput(format!(
            "Unsupported document type: {name}"
        )))
    }
}

fn extract_pdf(path: &Path) -> Result<String> {
    match pdf_extract::extract_text(path) {
        Ok(text) => {
            let trimmed = text.trim();
            if trimmed.is_empty() {
                Ok("[PDF contains no extractable text - may be image-based]".to_string())
            } else {
                Ok(trimmed.to_string())
            }
        }
        Err(e) => Err(Error::Internal(format!("Failed to extract PDF text: {e}"))),
    }
}

fn extract_txt(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)?;
    match String::from_utf8(bytes) {
        Ok(text) => Ok(text),
        Err(e) => Ok(String::from_utf8_lossy(e.as_bytes()).into_owned()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn supported_extensions() {
        assert!(is_supported("report.pdf"));
        assert!(is_supported("notes.txt"));
        assert!(is_supported("LOUD.PDF"));
        assert!(!is_supported("image.png"));
        assert!(!is_supported("archive.zip"));
        assert!(!is_supported("noextension"));
    }

    #[test]
    fn extract_txt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        std::fs::write(&path, "Hello world").unwrap();

        assert_eq!(extract_text(&path).unwrap(), "Hello world");
    }

    #[test]
    fn extract_txt_lossy_on_invalid_utf8() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(&[0x48, 0x69, 0xFF, 0xFE]).unwrap();

        let text = extract_text(&path).unwrap();
        assert!(text.starts_with("Hi"));
    }

    #[test]
    fn unsupported_extension_is_user_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.docx");
        std::fs::write(&path, "whatever").unwrap();

        let err = extract_text(&path).unwrap_err();
        assert!(err.is_user_input());
    }

    #[tokio::test]
    async fn save_and_extract_cleans_up_on_success() {
        let text = save_and_extract(b"Hello world", "roundtrip.txt").await.unwrap();
        assert_eq!(text, "Hello world");
        assert!(!std::env::temp_dir().join("roundtrip.txt").exists());
    }

    #[tokio::test]
    async fn save_and_extract_leaves_file_on_failure() {
        let result = save_and_extract(b"not text", "orphan.bin").await;
        assert!(result.is_err());
        // Extraction failed before the delete, so the temp file survives
        let orphan = std::env::temp_dir().join("orphan.bin");
        assert!(orphan.exists());
        let _ = std::fs::remove_file(orphan);
    }
}
