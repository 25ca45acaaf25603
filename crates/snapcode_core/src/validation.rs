use std::fmt;

/// Upload ceiling shared by the intake and the gateway: 10 MiB.
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MediaType {
    Png,
    Jpeg,
    Webp,
}

impl MediaType {
    /// Parses a declared MIME type. Parameters (`; charset=...`) and case are
    /// ignored; `image/jpg` is accepted as an alias of `image/jpeg`.
    pub fn from_mime(mime: &str) -> Option<Self> {
        let essence = mime.split(';').next().unwrap_or(mime).trim();
        if essence.eq_ignore_ascii_case("image/png") {
            Some(MediaType::Png)
        } else if essence.eq_ignore_ascii_case("image/jpeg")
            || essence.eq_ignore_ascii_case("image/jpg")
        {
            Some(MediaType::Jpeg)
        } else if essence.eq_ignore_ascii_case("image/webp") {
            Some(MediaType::Webp)
        } else {
            None
        }
    }

    pub fn mime(self) -> &'static str {
        match self {
            MediaType::Png => "image/png",
            MediaType::Jpeg => "image/jpeg",
            MediaType::Webp => "image/webp",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    UnsupportedType { media_type: String },
    TooLarge { max_bytes: u64, actual: u64 },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::UnsupportedType { .. } => {
                write!(f, "Please upload a PNG, JPG, or WebP image file.")
            }
            ValidationError::TooLarge { max_bytes, .. } => {
                write!(f, "File size must be less than {}MB.", max_bytes / (1024 * 1024))
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Checks the declared type first, then the size.
pub fn validate_upload(
    media_type: &str,
    byte_len: u64,
    max_bytes: u64,
) -> Result<MediaType, ValidationError> {
    let parsed = MediaType::from_mime(media_type).ok_or_else(|| ValidationError::UnsupportedType {
        media_type: media_type.to_string(),
    })?;
    if byte_len > max_bytes {
        return Err(ValidationError::TooLarge {
            max_bytes,
            actual: byte_len,
        });
    }
    Ok(parsed)
}
