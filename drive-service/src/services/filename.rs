//! Upload filename normalization.

/// Repairs names whose UTF-8 bytes were decoded as Latin-1 somewhere upstream
/// (`"cafÃ©.txt"` back to `"café.txt"`).
///
/// The repair is heuristic: it only applies when every char fits in one byte
/// and the re-decoded bytes form valid UTF-8 containing non-ASCII text.
/// Anything else is returned untouched.
pub fn repair_mojibake(name: &str) -> String {
    if name.is_ascii() {
        return name.to_string();
    }

    let bytes: Option<Vec<u8>> = name
        .chars()
        .map(|c| u8::try_from(u32::from(c)).ok())
        .collect();

    match bytes.map(String::from_utf8) {
        Some(Ok(repaired)) if !repaired.is_ascii() && repaired != name => repaired,
        _ => name.to_string(),
    }
}

/// Splits a browser-supplied relative path (`"photos/2024/a.jpg"`) into the
/// intermediate folder names, dropping the trailing file name and any empty
/// or dot segments.
pub fn folder_segments(relative_path: &str) -> Vec<String> {
    let normalized = relative_path.replace('\\', "/");
    let mut segments: Vec<&str> = normalized
        .split('/')
        .filter(|s| !s.is_empty() && *s != "." && *s != "..")
        .collect();
    segments.pop();
    segments.into_iter().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn repairs_latin1_decoded_utf8() {
        assert_eq!(repair_mojibake("cafÃ©.txt"), "café.txt");
        assert_eq!(repair_mojibake("æ\u{97}¥æ\u{9c}¬.pdf"), "日本.pdf");
    }

    #[test]
    fn leaves_clean_names_alone() {
        assert_eq!(repair_mojibake("report.pdf"), "report.pdf");
        assert_eq!(repair_mojibake("café.txt"), "café.txt");
        assert_eq!(repair_mojibake("日本.pdf"), "日本.pdf");
    }

    #[test]
    fn relative_path_yields_parent_folders_only() {
        assert_eq!(folder_segments("photos/2024/a.jpg"), vec!["photos", "2024"]);
        assert_eq!(folder_segments("a.jpg"), Vec::<String>::new());
        assert_eq!(folder_segments("./docs//b.txt"), vec!["docs"]);
        assert_eq!(folder_segments("win\\dir\\c.txt"), vec!["win", "dir"]);
    }
}
