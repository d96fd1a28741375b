/// Git metadata captured at build time by the `vergen-git2` build script.
///
/// Both values are absent when the crate is built outside a git checkout.
pub(crate) struct BuildInfo {
    pub commit_sha1: Option<&'static str>,
    pub git_dirty: bool,
}

pub(crate) const BUILD_INFO: BuildInfo = BuildInfo {
    commit_sha1: option_env!("VERGEN_GIT_SHA"),
    git_dirty: is_true(option_env!("VERGEN_GIT_DIRTY")),
};

const fn is_true(value: Option<&str>) -> bool {
    match value {
        Some(v) => {
            let bytes = v.as_bytes();
            bytes.len() == 4
                && bytes[0] == b't'
                && bytes[1] == b'r'
                && bytes[2] == b'u'
                && bytes[3] == b'e'
        }
        None => false,
    }
}
