//! Source image as picked by the user.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Raw image file: name, declared MIME type and bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImageFile {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Guess the MIME type from the file extension.
    ///
    /// Unknown extensions get `application/octet-stream`, which
    /// [`is_image`](Self::is_image) rejects.
    pub fn from_path_name(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let ext = file_name
            .rsplit_once('.')
            .map(|(_, e)| e.to_ascii_lowercase())
            .unwrap_or_default();
        let mime = match ext.as_str() {
            "png" => "image/png",
            "jpg" | "jpeg" => "image/jpeg",
            "gif" => "image/gif",
            "bmp" => "image/bmp",
            "webp" => "image/webp",
            "tif" | "tiff" => "image/tiff",
            _ => "application/octet-stream",
        };
        Self::new(file_name, mime, bytes)
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    /// MIME subtype, e.g. `png` for `image/png`.
    pub fn format(&self) -> &str {
        self.mime_type
            .split_once('/')
            .map_or(self.mime_type.as_str(), |(_, sub)| sub)
    }

    /// `data:<mime>;base64,<payload>`
    pub fn data_uri(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }

    /// Base64 of the bytes, without the data-URI prefix.
    pub fn base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mime_from_extension() {
        assert_eq!(ImageFile::from_path_name("a/B.JPG", vec![]).mime_type, "image/jpeg");
        assert!(!ImageFile::from_path_name("notes.txt", vec![]).is_image());
        assert!(!ImageFile::from_path_name("noext", vec![]).is_image());
    }

    #[test]
    fn test_data_uri() {
        let file = ImageFile::new("x.png", "image/png", vec![1, 2, 3]);
        assert_eq!(file.data_uri(), "data:image/png;base64,AQID");
        assert_eq!(file.format(), "png");
    }
}
