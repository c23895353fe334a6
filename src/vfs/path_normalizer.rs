/// 目录分隔符。所有后端统一使用正斜杠
pub const SEPARATOR: char = '/';

pub struct PathScrubber;

impl PathScrubber {
    /// 去掉调用方路径开头的一个 `/`、`\`，或一个 `./`、`.\`，以便拼接到基准目录之后。
    ///
    /// 只处理一次，不做递归规范化，也不解析 `..`。
    pub fn scrub(path: &str) -> &str {
        if path.starts_with('/') || path.starts_with('\\') {
            &path[1..]
        } else if path.starts_with("./") || path.starts_with(".\\") {
            &path[2..]
        } else {
            path
        }
    }

    /// 把已清理的名字拼到目录后面，不再做任何清理
    pub fn join(dir: &str, name: &str) -> String {
        if dir.is_empty() {
            name.to_string()
        } else if dir.ends_with(SEPARATOR) {
            format!("{}{}", dir, name)
        } else {
            format!("{}{}{}", dir, SEPARATOR, name)
        }
    }

    /// basename，不会带斜杠
    pub fn basename(path: &str) -> Option<String> {
        let path = path.replace('\\', "/");
        path.trim_end_matches('/')
            .rsplit('/')
            .next()
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_single_leading_separator() {
        assert_eq!(PathScrubber::scrub("/a/b"), "a/b");
        assert_eq!(PathScrubber::scrub("\\a\\b"), "a\\b");
        assert_eq!(PathScrubber::scrub("a/b"), "a/b");
        assert_eq!(PathScrubber::scrub("/a/b"), PathScrubber::scrub("a/b"));
    }

    #[test]
    fn strips_single_dot_prefix() {
        assert_eq!(PathScrubber::scrub("./a"), "a");
        assert_eq!(PathScrubber::scrub(".\\a"), "a");
    }

    #[test]
    fn only_one_leading_token_is_removed() {
        assert_eq!(PathScrubber::scrub("//a"), "/a");
        assert_eq!(PathScrubber::scrub("././a"), "./a");
        assert_eq!(PathScrubber::scrub("../a"), "../a");
        assert_eq!(PathScrubber::scrub(".hidden"), ".hidden");
    }

    #[test]
    fn empty_and_root_inputs() {
        assert_eq!(PathScrubber::scrub(""), "");
        assert_eq!(PathScrubber::scrub("/"), "");
        assert_eq!(PathScrubber::scrub("./"), "");
    }

    #[test]
    fn join_only_inserts_a_separator() {
        assert_eq!(PathScrubber::join("/tmp/store", "foo"), "/tmp/store/foo");
        assert_eq!(PathScrubber::join("/tmp/store/", "foo"), "/tmp/store/foo");
        assert_eq!(PathScrubber::join("/tmp/store", "./foo"), "/tmp/store/./foo");
        assert_eq!(PathScrubber::join("", "foo"), "foo");
    }

    #[test]
    fn basename_handles_both_separators() {
        assert_eq!(PathScrubber::basename("/tmp/a.txt"), Some("a.txt".to_string()));
        assert_eq!(PathScrubber::basename("C:\\tmp\\b.txt"), Some("b.txt".to_string()));
        assert_eq!(PathScrubber::basename("dir/"), Some("dir".to_string()));
        assert_eq!(PathScrubber::basename("/"), None);
    }
}
