//! Depth-bounded path derivation.

/// Derive the paths an object contributes to.
///
/// The first path is always the bucket root. It is followed by one path per
/// ancestor directory of `key`, shallowest first, stopping after `depth`
/// ancestors or when the key runs out of directory segments. The final key
/// segment (the object name itself) never produces a path.
///
/// ```
/// use bt_aggregate::derive_paths;
///
/// assert_eq!(
///     derive_paths("bucket", "a/b/file.txt", "/", 5),
///     vec!["bucket", "bucket/a", "bucket/a/b"],
/// );
/// assert_eq!(derive_paths("bucket", "a/b/file.txt", "/", 0), vec!["bucket"]);
/// ```
pub fn derive_paths(bucket: &str, key: &str, delimiter: &str, depth: usize) -> Vec<String> {
    let mut paths = Vec::with_capacity(depth.saturating_add(1).min(16));
    paths.push(bucket.to_string());

    if depth == 0 || delimiter.is_empty() {
        return paths;
    }

    let mut segments: Vec<&str> = key.split(delimiter).collect();
    segments.pop();

    let mut current = bucket.to_string();
    for segment in segments.into_iter().take(depth) {
        current.push_str(delimiter);
        current.push_str(segment);
        paths.push(current.clone());
    }

    paths
}
