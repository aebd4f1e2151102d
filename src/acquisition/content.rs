//! Request body content-type negotiation.
//!
//! The detector API accepts JSON for configuration values and raw
//! container files for uploads. When the caller does not say what the
//! body is, the type is guessed from its leading magic bytes.

const TIFF_LE_MAGIC: &[u8] = &[0x49, 0x49, 0x2A, 0x00];
const TIFF_BE_MAGIC: &[u8] = &[0x4D, 0x4D, 0x00, 0x2A];
const HDF5_MAGIC: &[u8] = &[0x89, 0x48, 0x44, 0x46, 0x0D, 0x0A, 0x1A, 0x0A];

/// Body types understood by the detector API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentType {
    Json,
    Tiff,
    Hdf5,
    Html,
}

impl ContentType {
    /// MIME string sent in the `Content-Type` / `Accept` headers.
    pub fn mime(self) -> &'static str {
        match self {
            ContentType::Json => "application/json; charset=utf-8",
            ContentType::Tiff => "application/tiff",
            ContentType::Hdf5 => "application/hdf5",
            ContentType::Html => "text/html",
        }
    }

    /// Guesses the type from the leading bytes of `data`.
    pub fn sniff(data: &[u8]) -> Option<Self> {
        if data.starts_with(TIFF_LE_MAGIC) || data.starts_with(TIFF_BE_MAGIC) {
            tracing::debug!("Determined mimetype: tiff");
            Some(ContentType::Tiff)
        } else if data.starts_with(HDF5_MAGIC) {
            tracing::debug!("Determined mimetype: hdf5");
            Some(ContentType::Hdf5)
        } else {
            None
        }
    }

    /// Picks the content type for a request body.
    ///
    /// An empty body is sent as `text/html`. A declared type always wins;
    /// otherwise the magic bytes are sniffed and JSON is the fallback.
    pub fn negotiate(data: &[u8], declared: Option<ContentType>) -> Self {
        if data.is_empty() {
            return ContentType::Html;
        }
        declared
            .or_else(|| Self::sniff(data))
            .unwrap_or(ContentType::Json)
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mime())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_tiff_both_byte_orders() {
        assert_eq!(
            ContentType::sniff(b"II*\x00rest"),
            Some(ContentType::Tiff)
        );
        assert_eq!(
            ContentType::sniff(b"MM\x00*rest"),
            Some(ContentType::Tiff)
        );
    }

    #[test]
    fn test_sniff_hdf5() {
        let data = [0x89, b'H', b'D', b'F', 0x0D, 0x0A, 0x1A, 0x0A, 0x00];
        assert_eq!(ContentType::sniff(&data), Some(ContentType::Hdf5));
    }

    #[test]
    fn test_magic_must_be_at_start() {
        assert_eq!(ContentType::sniff(b"xII*\x00"), None);
    }

    #[test]
    fn test_negotiate_fallbacks() {
        assert_eq!(ContentType::negotiate(b"", None), ContentType::Html);
        assert_eq!(
            ContentType::negotiate(br#"{"value":"enabled"}"#, None),
            ContentType::Json
        );
        assert_eq!(
            ContentType::negotiate(b"II*\x00", None),
            ContentType::Tiff
        );
    }

    #[test]
    fn test_declared_type_wins() {
        assert_eq!(
            ContentType::negotiate(b"II*\x00", Some(ContentType::Json)),
            ContentType::Json
        );
    }
}
