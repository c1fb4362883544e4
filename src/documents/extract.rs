//! Format-specific text extraction.
//!
//! Dispatches on the file extension. PDF, Word, and image OCR are behind the
//! `pdf`, `docx`, and `ocr` features; formats that cannot be read return a
//! bracketed marker text instead of an error so the caller still gets a
//! usable string. OCR shells out to the `tesseract` binary at run time.

use std::path::Path;

use crate::error::DocumentError;

/// Document formats recognised by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// Plain text (`.txt`).
    Text,
    /// Markdown (`.md`), read as plain text.
    Markdown,
    /// PDF (`.pdf`).
    Pdf,
    /// Word (`.docx`).
    Word,
    /// Raster image (`.png`, `.jpg`, `.jpeg`, `.tiff`, `.bmp`).
    Image,
    /// Anything else.
    Unknown,
}

impl DocumentFormat {
    /// Classifies a file extension (without the dot, case-insensitive).
    #[must_use]
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "txt" => Self::Text,
            "md" => Self::Markdown,
            "pdf" => Self::Pdf,
            "docx" => Self::Word,
            "png" | "jpg" | "jpeg" | "tiff" | "bmp" => Self::Image,
            _ => Self::Unknown,
        }
    }

    /// Classifies a path by its extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        path.extension()
            .and_then(|e| e.to_str())
            .map_or(Self::Unknown, Self::from_extension)
    }
}

/// Extracts text from the file at `path`.
///
/// The caller is responsible for checking that the file exists.
///
/// # Errors
///
/// Returns [`DocumentError::Io`] if a text file cannot be read, or
/// [`DocumentError::Extraction`] if a PDF/Word parser fails.
pub fn extract_text(path: &Path) -> Result<String, DocumentError> {
    match DocumentFormat::from_path(path) {
        DocumentFormat::Text | DocumentFormat::Markdown => {
            std::fs::read_to_string(path).map_err(|source| DocumentError::Io {
                path: path.to_path_buf(),
                source,
            })
        }
        DocumentFormat::Pdf => extract_pdf(path),
        DocumentFormat::Word => extract_docx(path),
        DocumentFormat::Image => Ok(extract_image(path)),
        DocumentFormat::Unknown => Ok(format!("[Unsupported file type: {}]", dotted_ext(path))),
    }
}

#[cfg(feature = "pdf")]
fn extract_pdf(path: &Path) -> Result<String, DocumentError> {
    let text = pdf_extract::extract_text(path).map_err(|e| DocumentError::Extraction {
        format: "PDF",
        message: e.to_string(),
    })?;

    // Pages without a text layer come back empty; scanned PDFs need OCR.
    if text.trim().is_empty() {
        return Ok(
            "[No digital text layer found; upload PNG/JPG scans for OCR processing.]\n"
                .to_string(),
        );
    }
    Ok(text)
}

#[cfg(not(feature = "pdf"))]
fn extract_pdf(path: &Path) -> Result<String, DocumentError> {
    Ok(format!("[Unsupported file type: {}]", dotted_ext(path)))
}

#[cfg(feature = "docx")]
fn extract_docx(path: &Path) -> Result<String, DocumentError> {
    use std::io::Read;

    use dotext::MsDoc;

    let mut text = String::new();
    dotext::Docx::open(path)
        .map_err(|e| DocumentError::Extraction {
            format: "DOCX",
            message: e.to_string(),
        })?
        .read_to_string(&mut text)
        .map_err(|e| DocumentError::Extraction {
            format: "DOCX",
            message: e.to_string(),
        })?;
    Ok(text)
}

#[cfg(not(feature = "docx"))]
fn extract_docx(path: &Path) -> Result<String, DocumentError> {
    Ok(format!("[Unsupported file type: {}]", dotted_ext(path)))
}

/// Runs OCR on an image. Failures come back as message text, not errors.
#[cfg(feature = "ocr")]
fn extract_image(path: &Path) -> String {
    let ocr = rusty_tesseract::Image::from_path(path.to_path_buf()).and_then(|image| {
        rusty_tesseract::image_to_string(&image, &rusty_tesseract::Args::default())
    });
    ocr.unwrap_or_else(|e| {
        tracing::warn!(path = %path.display(), error = %e, "OCR failed");
        format!("Error performing OCR on image: {e}")
    })
}

#[cfg(not(feature = "ocr"))]
fn extract_image(path: &Path) -> String {
    format!(
        "[OCR not available for image documents: {}]",
        display_name(path)
    )
}

fn dotted_ext(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default()
}

#[cfg(not(feature = "ocr"))]
fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
