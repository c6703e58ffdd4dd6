//! Utility functions for file naming

/// Characters that are unsafe in file names on at least one supported platform
const UNSAFE_CHARS: &[char] = &['/', '\\', ':', '*', '?', '"', '<', '>', '|'];

/// Maximum length of a sanitized file stem
const MAX_STEM_LEN: usize = 100;

/// Turn an app display name into a file-system-safe stem
///
/// Replaces path separators and other hostile characters with underscores,
/// collapses runs of whitespace, and truncates overly long names. Returns
/// `"app"` if nothing usable remains.
///
/// # Examples
///
/// ```
/// use icon_hunter::utils::sanitize_file_name;
///
/// assert_eq!(sanitize_file_name("Signal – Private Messenger"), "Signal – Private Messenger");
/// assert_eq!(sanitize_file_name("a/b:c"), "a_b_c");
/// assert_eq!(sanitize_file_name("  "), "app");
/// ```
#[must_use]
pub fn sanitize_file_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut last_was_space = false;

    for c in name.trim().chars() {
        if c.is_control() {
            continue;
        }
        if c.is_whitespace() {
            if !last_was_space {
                out.push(' ');
            }
            last_was_space = true;
            continue;
        }
        last_was_space = false;
        if UNSAFE_CHARS.contains(&c) {
            out.push('_');
        } else {
            out.push(c);
        }
    }

    let trimmed = out.trim_matches(|c: char| c == '.' || c == ' ');
    if trimmed.is_empty() {
        return "app".to_string();
    }

    trimmed.chars().take(MAX_STEM_LEN).collect()
}

/// Derive an image file extension from an icon URL
///
/// Looks at the final path segment of the URL; unknown or missing extensions
/// fall back to `png` (Play CDN URLs carry no extension at all).
#[must_use]
pub fn icon_extension(icon_url: &str) -> &'static str {
    let Ok(parsed) = url::Url::parse(icon_url) else {
        return "png";
    };

    let last_segment = parsed
        .path_segments()
        .and_then(|segments| segments.last())
        .unwrap_or("");

    match last_segment.rsplit_once('.').map(|(_, ext)| ext) {
        Some(ext) if ext.eq_ignore_ascii_case("png") => "png",
        Some(ext) if ext.eq_ignore_ascii_case("jpg") || ext.eq_ignore_ascii_case("jpeg") => "jpg",
        Some(ext) if ext.eq_ignore_ascii_case("webp") => "webp",
        Some(ext) if ext.eq_ignore_ascii_case("gif") => "gif",
        _ => "png",
    }
}
