use std::path::Path;

/// Reads a stopword list, one word per line
///
/// A missing file is not an error: the crawl proceeds with no stopwords.
/// Other read failures (bad encoding, permissions) are returned.
pub fn load_stopwords(path: &Path) -> std::io::Result<Vec<String>> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::warn!(
                "Stopword list {} not found, using an empty stopword set",
                path.display()
            );
            Ok(Vec::new())
        }
        Err(e) => Err(e),
    }
}
