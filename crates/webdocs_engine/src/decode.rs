use chardetng::EncodingDetector;
use encoding_rs::Encoding;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedHtml {
    pub html: String,
    pub encoding_label: String,
    /// Set when malformed byte sequences were replaced with U+FFFD.
    pub had_replacements: bool,
}

/// Decode raw bytes into UTF-8 using: BOM -> Content-Type charset -> chardetng fallback.
///
/// Decoding never fails; invalid sequences are replaced, matching how a lenient
/// browser would render the page.
pub fn decode_html(bytes: &[u8], content_type: Option<&str>) -> DecodedHtml {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return decode_with(bytes, encoding);
    }

    if let Some(label) = content_type.and_then(extract_charset) {
        if let Some(enc) = Encoding::for_label(label.as_bytes()) {
            return decode_with(bytes, enc);
        }
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    let enc = detector.guess(None, true);
    decode_with(bytes, enc)
}

fn extract_charset(content_type: &str) -> Option<String> {
    content_type
        .split(';')
        .filter_map(|part| {
            let (key, value) = part.trim().split_once('=')?;
            if key.trim().eq_ignore_ascii_case("charset") {
                Some(value.trim_matches([' ', '"', '\''].as_ref()).to_string())
            } else {
                None
            }
        })
        .next()
}

fn decode_with(bytes: &[u8], enc: &'static Encoding) -> DecodedHtml {
    let (text, _, had_errors) = enc.decode(bytes);
    DecodedHtml {
        html: text.into_owned(),
        encoding_label: enc.name().to_string(),
        had_replacements: had_errors,
    }
}

#[cfg(test)]
mod tests {
    use super::{decode_html, extract_charset};

    #[test]
    fn charset_parameter_is_case_insensitive() {
        assert_eq!(
            extract_charset("text/html; Charset=\"utf-8\"").as_deref(),
            Some("utf-8")
        );
        assert_eq!(extract_charset("text/html"), None);
    }

    #[test]
    fn invalid_utf8_is_replaced_not_rejected() {
        let decoded = decode_html(b"ok \xff\xfe!", Some("text/html; charset=utf-8"));
        assert!(decoded.had_replacements);
        assert!(decoded.html.starts_with("ok "));
        assert!(decoded.html.contains('\u{FFFD}'));
    }
}
