/// A file part pulled out of a multipart/form-data body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Value of `filename="..."`; empty when the browser sent no file.
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Returns the index of the first occurrence of `needle` in `haystack`.
pub fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() {
        return Some(0);
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}

/// Splits `haystack` on every occurrence of `needle`, returning the pieces
/// between occurrences (excluding the needle itself).
pub fn split_on<'a>(haystack: &'a [u8], needle: &[u8]) -> Vec<&'a [u8]> {
    let mut result = Vec::new();
    let mut start = 0;
    while start <= haystack.len() {
        if let Some(pos) = find_subsequence(&haystack[start..], needle) {
            result.push(&haystack[start..start + pos]);
            start += pos + needle.len();
        } else {
            result.push(&haystack[start..]);
            break;
        }
    }
    result
}

/// Extracts the boundary token from a Content-Type header value like
/// `multipart/form-data; boundary=----WebKitFormBoundaryXXX`.
pub fn extract_boundary(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .map(|s| s.trim())
        .find(|s| s.starts_with("boundary="))
        .map(|s| s["boundary=".len()..].trim_matches('"').to_owned())
}

/// Extracts the named file part (`name="<field_name>"` with a `filename=`
/// attribute) from a multipart/form-data body.
pub fn extract_file(body: &[u8], boundary: &str, field_name: &str) -> Option<UploadedFile> {
    let delimiter = format!("--{}", boundary);
    let parts = split_on(body, delimiter.as_bytes());

    for part in parts {
        let sep = b"\r\n\r\n";
        let Some(sep_pos) = find_subsequence(part, sep) else {
            continue;
        };
        let headers_str = String::from_utf8_lossy(&part[..sep_pos]);
        if disposition_param(&headers_str, "name").as_deref() != Some(field_name) {
            continue;
        }
        let Some(filename) = disposition_param(&headers_str, "filename") else {
            continue;
        };
        let raw = &part[sep_pos + sep.len()..];
        let trimmed = raw.strip_suffix(b"\r\n").unwrap_or(raw);
        return Some(UploadedFile { filename, bytes: trimmed.to_vec() });
    }
    None
}

/// Reads parameter `param` of the part's Content-Disposition header, e.g.
/// `name` or `filename`. Quotes around the value are stripped.
fn disposition_param(headers: &str, param: &str) -> Option<String> {
    let line = headers
        .lines()
        .find(|l| l.trim_start().to_ascii_lowercase().starts_with("content-disposition:"))?;
    line.split(';').skip(1).find_map(|attr| {
        let (key, value) = attr.split_once('=')?;
        if !key.trim().eq_ignore_ascii_case(param) {
            return None;
        }
        Some(value.trim().trim_matches('"').to_owned())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(filename: &str, data: &[u8]) -> Vec<u8> {
        let mut b = Vec::new();
        b.extend_from_slice(b"--XyZ\r\nContent-Disposition: form-data; name=\"note\"\r\n\r\nhello\r\n");
        b.extend_from_slice(
            format!(
                "--XyZ\r\nContent-Disposition: form-data; name=\"image\"; filename=\"{filename}\"\r\nContent-Type: image/jpeg\r\n\r\n"
            )
            .as_bytes(),
        );
        b.extend_from_slice(data);
        b.extend_from_slice(b"\r\n--XyZ--\r\n");
        b
    }

    #[test]
    fn boundary_is_read_from_content_type() {
        assert_eq!(
            extract_boundary("multipart/form-data; boundary=\"XyZ\"").as_deref(),
            Some("XyZ")
        );
        assert_eq!(extract_boundary("application/json"), None);
    }

    #[test]
    fn named_file_part_is_extracted_verbatim() {
        let data = [0xFFu8, 0xD8, b'\r', b'\n', 0x00, 0x7F];
        let file = extract_file(&body("cup.jpg", &data), "XyZ", "image").unwrap();
        assert_eq!(file.filename, "cup.jpg");
        assert_eq!(file.bytes, data);
    }

    #[test]
    fn empty_filename_is_reported() {
        let file = extract_file(&body("", b""), "XyZ", "image").unwrap();
        assert_eq!(file.filename, "");
        assert!(file.bytes.is_empty());
    }

    #[test]
    fn filename_equal_to_field_name_does_not_match_another_field() {
        let avatar: &[u8] =
            b"--XyZ\r\nContent-Disposition: form-data; name=\"avatar\"; filename=\"image\"\r\n\r\nwrong\r\n";
        let image: &[u8] =
            b"--XyZ\r\nContent-Disposition: form-data; name=\"image\"; filename=\"owl.png\"\r\n\r\nright\r\n";

        let only_avatar = [avatar, &b"--XyZ--\r\n"[..]].concat();
        assert!(extract_file(&only_avatar, "XyZ", "image").is_none());

        let both = [avatar, image, &b"--XyZ--\r\n"[..]].concat();
        let file = extract_file(&both, "XyZ", "image").unwrap();
        assert_eq!(file.filename, "owl.png");
        assert_eq!(file.bytes, b"right");
    }

    #[test]
    fn text_fields_and_other_names_are_ignored() {
        assert!(extract_file(&body("a.png", b"x"), "XyZ", "note").is_none());
        assert!(extract_file(&body("a.png", b"x"), "XyZ", "photo").is_none());
    }
}
