//! Text clean-up applied to record fields before they are sent.
//!
//! The backend stores text in database columns that cannot hold NUL
//! characters, so they are stripped rather than failing the whole batch.

/// Remove every NUL character from an optional string. `None` stays `None`.
pub fn sanitize(s: Option<String>) -> Option<String> {
    s.map(strip_nul)
}

/// Remove every NUL character from a required string.
pub fn sanitize_str(s: &str) -> String {
    s.replace('\0', "")
}

fn strip_nul(s: String) -> String {
    if s.contains('\0') {
        sanitize_str(&s)
    } else {
        s
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_every_nul_and_nothing_else() {
        let input = "\0 a\0b  \0".to_string();
        let nuls = input.matches('\0').count();
        let out = sanitize(Some(input.clone())).unwrap();
        assert_eq!(out, " ab  ");
        assert_eq!(out.len(), input.len() - nuls);
        assert!(!out.contains('\0'));
    }

    #[test]
    fn absent_stays_absent() {
        assert_eq!(sanitize(None), None);
    }

    #[test]
    fn empty_after_stripping_is_not_absent() {
        assert_eq!(sanitize(Some("\0\0".into())), Some(String::new()));
    }

    #[test]
    fn clean_text_is_unchanged() {
        assert_eq!(sanitize_str("Ünïcode \t text"), "Ünïcode \t text");
    }
}
