const FALLBACK_STEM: &str = "descarga";
const MAX_STEM_LEN: usize = 120;

/// Filesystem-safe version of a download name suggested by the backend.
///
/// Only the final path component survives, forbidden characters become `_`,
/// and the extension is kept.
pub fn safe_download_name(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name).trim();
    let (stem, extension) = match base.rsplit_once('.') {
        Some((stem, ext)) if !stem.trim_matches('.').is_empty() && !ext.is_empty() => {
            (stem, Some(ext))
        }
        _ => (base, None),
    };

    let mut stem = sanitize(stem);
    if stem.is_empty() {
        stem = FALLBACK_STEM.to_string();
    }
    if stem.len() > MAX_STEM_LEN {
        let mut end = MAX_STEM_LEN;
        while !stem.is_char_boundary(end) {
            end -= 1;
        }
        stem.truncate(end);
    }
    if is_reserved_windows_name(&stem) {
        stem.push('_');
    }

    match extension.map(sanitize).filter(|ext| !ext.is_empty()) {
        Some(ext) => format!("{stem}.{ext}"),
        None => stem,
    }
}

fn sanitize(input: &str) -> String {
    let cleaned: String = input
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    let cleaned = cleaned.trim_matches(&['_', ' ', '.'][..]);

    // Collapse multiple underscores
    let mut compacted = String::with_capacity(cleaned.len());
    let mut prev_underscore = false;
    for c in cleaned.chars() {
        if c == '_' {
            if !prev_underscore {
                compacted.push(c);
            }
            prev_underscore = true;
        } else {
            compacted.push(c);
            prev_underscore = false;
        }
    }
    compacted
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::safe_download_name;

    #[test]
    fn plain_names_pass_through() {
        assert_eq!(safe_download_name("grafo1.rdf"), "grafo1.rdf");
        assert_eq!(safe_download_name("atestado 12.json"), "atestado 12.json");
    }

    #[test]
    fn directories_are_stripped() {
        assert_eq!(safe_download_name("../../etc/passwd"), "passwd");
        assert_eq!(safe_download_name("C:\\tmp\\out.json"), "out.json");
    }

    #[test]
    fn forbidden_characters_are_replaced() {
        assert_eq!(safe_download_name("a:b*?c.ttls"), "a_b_c.ttls");
        assert_eq!(safe_download_name("???.rdf"), "descarga.rdf");
        assert_eq!(safe_download_name(""), "descarga");
    }

    #[test]
    fn reserved_names_are_patched() {
        assert_eq!(safe_download_name("CON.json"), "CON_.json");
    }
}
