//! Document type detection from a URL or file name
//!
//! Picks the rendering strategy: paginated documents get the page-based
//! renderer, raster images get the single-image renderer, and everything
//! else is a terminal, non-retryable error.

/// Rendering strategy selected for a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    /// Discrete numbered pages (PDF-like).
    Paginated,
    /// A single image with no page concept.
    Raster,
    Unsupported,
}

/// Extensions rendered as single raster images.
const RASTER_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "webp", "svg"];

/// Extensions rendered as paginated documents.
const PAGINATED_EXTENSIONS: &[&str] = &["pdf"];

/// Classify a document by file extension. The file name wins when present;
/// otherwise the URL is inspected, ignoring any query string or fragment.
/// Matching is case-insensitive.
pub fn classify(url: &str, file_name: Option<&str>) -> DocumentKind {
    let candidate = match file_name {
        Some(name) if !name.is_empty() => name,
        _ => url,
    };
    match extension_of(candidate) {
        Some(ext) if PAGINATED_EXTENSIONS.contains(&ext.as_str()) => DocumentKind::Paginated,
        Some(ext) if RASTER_EXTENSIONS.contains(&ext.as_str()) => DocumentKind::Raster,
        _ => DocumentKind::Unsupported,
    }
}

/// User-facing list shown alongside the unsupported-format error.
pub fn supported_formats() -> &'static str {
    "PDF, JPG, PNG, GIF, BMP, WebP, SVG"
}

fn extension_of(source: &str) -> Option<String> {
    let trimmed = source
        .split(|c| c == '?' || c == '#')
        .next()
        .unwrap_or(source);
    let name = trimmed.rsplit('/').next().unwrap_or(trimmed);
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn known_extension() -> impl Strategy<Value = &'static str> {
        prop_oneof![
            Just("pdf"),
            Just("jpg"),
            Just("jpeg"),
            Just("png"),
            Just("gif"),
            Just("bmp"),
            Just("webp"),
            Just("svg"),
        ]
    }

    fn mixed_case(ext: &str, mask: u8) -> String {
        ext.chars()
            .enumerate()
            .map(|(i, c)| {
                if mask & (1 << (i % 8)) != 0 {
                    c.to_ascii_uppercase()
                } else {
                    c
                }
            })
            .collect()
    }

    proptest! {
        /// Property: classification is case-insensitive
        #[test]
        fn case_does_not_change_classification(
            stem in "[a-z0-9_-]{1,20}",
            ext in known_extension(),
            mask in any::<u8>(),
        ) {
            let lower = format!("{}.{}", stem, ext);
            let mixed = format!("{}.{}", stem, mixed_case(ext, mask));
            prop_assert_eq!(classify(&lower, None), classify(&mixed, None));
        }

        /// Property: query and fragment suffixes never change classification
        #[test]
        fn url_suffixes_do_not_change_classification(
            stem in "[a-z0-9_-]{1,20}",
            ext in known_extension(),
            query in "[a-z0-9=&]{0,30}",
            fragment in "[a-z0-9=]{0,20}",
        ) {
            let bare = format!("files/{}.{}", stem, ext);
            let suffixed = format!("files/{}.{}?{}#{}", stem, ext, query, fragment);
            prop_assert_eq!(classify(&bare, None), classify(&suffixed, None));
        }

        /// Property: a present, non-empty file name decides the outcome
        /// regardless of the URL
        #[test]
        fn file_name_wins_over_url(
            url in "[a-z0-9/._-]{0,40}",
            stem in "[a-z0-9_-]{1,20}",
            ext in known_extension(),
        ) {
            let name = format!("{}.{}", stem, ext);
            prop_assert_eq!(classify(&url, Some(&name)), classify(&name, None));
        }
    }
}
