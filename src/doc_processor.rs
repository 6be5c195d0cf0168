use std::path::Path;

/// Sliding-window width, in characters, for embedding chunks.
pub const CHUNK_SIZE: usize = 512;
/// Characters shared between consecutive chunks.
pub const CHUNK_OVERLAP: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("Unsupported file type: .{0}")]
    UnsupportedType(String),
    #[error("File is not valid UTF-8 text")]
    InvalidEncoding,
    #[error("PDF parse error: {0}")]
    Pdf(String),
    #[error("Document is empty or could not be parsed")]
    Empty,
}

/// Extracted document content
#[derive(Debug)]
pub struct ExtractedDocument {
    pub text: String,
    pub file_type: String,
}

/// Turn an uploaded file into plain text, keyed off the filename extension.
pub fn extract_text(filename: &str, bytes: &[u8]) -> Result<ExtractedDocument, ExtractError> {
    let ext = Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let doc = match ext.as_str() {
        "txt" => {
            let text = std::str::from_utf8(bytes).map_err(|_| ExtractError::InvalidEncoding)?;
            ExtractedDocument {
                text: text.to_string(),
                file_type: "txt".into(),
            }
        }
        "md" | "markdown" => {
            let text = std::str::from_utf8(bytes).map_err(|_| ExtractError::InvalidEncoding)?;
            ExtractedDocument {
                text: text.to_string(),
                file_type: "md".into(),
            }
        }
        "pdf" => {
            let text = pdf_extract::extract_text_from_mem(bytes)
                .map_err(|e| ExtractError::Pdf(e.to_string()))?;
            ExtractedDocument {
                text,
                file_type: "pdf".into(),
            }
        }
        _ => return Err(ExtractError::UnsupportedType(ext)),
    };

    if doc.text.trim().is_empty() {
        return Err(ExtractError::Empty);
    }

    Ok(doc)
}

/// Split text into overlapping chunks for embedding
pub fn chunk_text(text: &str, chunk_size: usize, overlap: usize) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return vec![];
    }
    if text.len() <= chunk_size {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let chars: Vec<char> = text.chars().collect();
    let mut start = 0;

    while start < chars.len() {
        let end = (start + chunk_size).min(chars.len());
        let chunk: String = chars[start..end].iter().collect();
        let chunk = chunk.trim().to_string();
        if !chunk.is_empty() {
            chunks.push(chunk);
        }
        if end >= chars.len() {
            break;
        }
        start += chunk_size - overlap;
    }

    chunks
}
