use std::sync::LazyLock;

use crate::build_info::BUILD_INFO;

/// Defines the application version, e.g. `0.1.0-1a2b3c4-dirty`.
pub static VERSION: LazyLock<String> = LazyLock::new(|| {
    format!(
        "{}-{}{}",
        env!("IMAGE_VERSION"),
        short_sha(BUILD_INFO.commit_sha1.unwrap_or("unknown")),
        if BUILD_INFO.git_dirty { "-dirty" } else { "" }
    )
});

fn short_sha(sha: &str) -> &str {
    sha.get(..7).unwrap_or(sha)
}

#[cfg(test)]
mod tests {
    use similar_asserts::assert_eq;

    use super::*;

    #[test]
    fn short_sha_truncates_long_hashes() {
        assert_eq!(short_sha("1a2b3c4d5e6f"), "1a2b3c4");
        assert_eq!(short_sha("abc"), "abc");
        assert_eq!(short_sha("unknown"), "unknown");
    }

    #[test]
    fn version_starts_with_image_version() {
        assert!(VERSION.starts_with(env!("IMAGE_VERSION")));
    }
}
