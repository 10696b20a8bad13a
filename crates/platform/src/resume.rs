use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

use crate::errors::PlatformError;

/// Largest resume accepted, in bytes.
pub const MAX_RESUME_BYTES: usize = 5 * 1024 * 1024;

/// An uploaded resume file.
#[derive(Clone, Debug)]
pub struct ResumeFile {
    pub file_name: String,
    /// Falls back to a guess from the file extension when empty.
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ResumeFile {
    fn mime(&self) -> &str {
        if !self.mime_type.trim().is_empty() {
            return self.mime_type.trim();
        }
        let ext = self.file_name.rsplit_once('.').map(|(_, e)| e.to_ascii_lowercase());
        match ext.as_deref() {
            Some("pdf") => "application/pdf",
            Some("doc") => "application/msword",
            Some("docx") => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
            Some("txt") => "text/plain",
            _ => "application/octet-stream",
        }
    }
}

/// Encode the file as a `data:<mime>;base64,<payload>` URL.
pub fn to_data_url(file: &ResumeFile) -> Result<String, PlatformError> {
    if file.bytes.is_empty() {
        return Err(PlatformError::validation("resume is required"));
    }
    if file.bytes.len() > MAX_RESUME_BYTES {
        return Err(PlatformError::ResumeTooLarge { size: file.bytes.len(), limit: MAX_RESUME_BYTES });
    }
    Ok(format!("data:{};base64,{}", file.mime(), BASE64.encode(&file.bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(name: &str, mime: &str, bytes: Vec<u8>) -> ResumeFile {
        ResumeFile { file_name: name.into(), mime_type: mime.into(), bytes }
    }

    #[test]
    fn encodes_data_url() {
        let url = to_data_url(&file("cv.pdf", "", b"%PDF-".to_vec())).unwrap();
        assert_eq!(url, "data:application/pdf;base64,JVBERi0=");
        let url = to_data_url(&file("cv", "text/plain", b"hi".to_vec())).unwrap();
        assert!(url.starts_with("data:text/plain;base64,"));
    }

    #[test]
    fn size_limit_is_inclusive() {
        assert!(to_data_url(&file("a.pdf", "", vec![0; MAX_RESUME_BYTES])).is_ok());
        let err = to_data_url(&file("a.pdf", "", vec![0; MAX_RESUME_BYTES + 1])).unwrap_err();
        assert!(matches!(err, PlatformError::ResumeTooLarge { .. }));
        assert!(matches!(to_data_url(&file("a.pdf", "", Vec::new())), Err(PlatformError::Validation(_))));
    }
}
