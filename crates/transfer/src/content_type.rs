//! Content-type classification.
//!
//! A constructed table from file extension to MIME label, passed to the
//! services that need it. Unrecognized extensions fall back to
//! `application/octet-stream`.

use std::collections::HashMap;
use std::path::Path;

use mime::Mime;

#[derive(Debug, Clone)]
pub struct ContentTypeTable {
    map: HashMap<&'static str, Mime>,
}

impl Default for ContentTypeTable {
    fn default() -> Self {
        let mut map = HashMap::new();
        map.insert("html", mime::TEXT_HTML);
        map.insert("txt", mime::TEXT_PLAIN);
        map.insert("jpg", mime::IMAGE_JPEG);
        map.insert("jpeg", mime::IMAGE_JPEG);
        map.insert("png", mime::IMAGE_PNG);
        map.insert("gif", mime::IMAGE_GIF);
        map.insert("css", mime::TEXT_CSS);
        map.insert("js", mime::APPLICATION_JAVASCRIPT);
        Self { map }
    }
}

impl ContentTypeTable {
    /// Classifies a resource by its name extension.
    pub fn classify(&self, target: &str) -> Mime {
        let extension = Path::new(target)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        extension
            .and_then(|ext| self.map.get(ext.as_str()).cloned())
            .unwrap_or(mime::APPLICATION_OCTET_STREAM)
    }

    /// True when the resource should be written in binary mode.
    ///
    /// Image types are binary, everything else in this subset is text.
    pub fn is_binary(&self, target: &str) -> bool {
        self.classify(target).type_() == mime::IMAGE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_extensions() {
        let table = ContentTypeTable::default();
        assert_eq!(table.classify("hello.txt"), mime::TEXT_PLAIN);
        assert_eq!(table.classify("/pages/index.html"), mime::TEXT_HTML);
        assert_eq!(table.classify("photo.JPG"), mime::IMAGE_JPEG);
    }

    #[test]
    fn unknown_extension_defaults_to_octet_stream() {
        let table = ContentTypeTable::default();
        assert_eq!(table.classify("archive.zip"), mime::APPLICATION_OCTET_STREAM);
        assert_eq!(table.classify("no_extension"), mime::APPLICATION_OCTET_STREAM);
    }

    #[test]
    fn images_are_binary() {
        let table = ContentTypeTable::default();
        assert!(table.is_binary("photo.png"));
        assert!(table.is_binary("animation.gif"));
        assert!(!table.is_binary("hello.txt"));
        assert!(!table.is_binary("archive.zip"));
    }
}
