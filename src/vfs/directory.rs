use crate::vfs::path_normalizer::PathScrubber;
use log::debug;

/// 基准目录与当前目录。当前目录总是基准目录本身或其子路径
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualDirectory {
    base: String,
    current: String,
}

impl VirtualDirectory {
    pub fn new(base: impl Into<String>) -> Self {
        let base = base.into();
        Self {
            current: base.clone(),
            base,
        }
    }

    /// 重设基准目录，当前目录随之回到新的基准目录
    pub fn set_base_dir(&mut self, base: impl Into<String>) {
        self.base = base.into();
        self.current = self.base.clone();
    }

    pub fn base_dir(&self) -> &str {
        &self.base
    }

    pub fn current_dir(&self) -> &str {
        &self.current
    }

    /// 计算 `chdir` 的目标路径，但不修改状态
    pub fn resolve(&self, relative: Option<&str>) -> String {
        match relative.map(PathScrubber::scrub) {
            None | Some("") => self.base.clone(),
            Some(scrubbed) => PathScrubber::join(&self.base, scrubbed),
        }
    }

    /// `None` 回到基准目录；否则切换到 基准目录/清理后的相对路径
    pub fn chdir(&mut self, relative: Option<&str>) {
        self.current = self.resolve(relative);
        debug!("切换目录: {} -> {}", self.base, self.current);
    }

    /// 当前目录下某个名字的完整路径
    pub fn path_of(&self, name: &str) -> String {
        PathScrubber::join(&self.current, PathScrubber::scrub(name))
    }

    /// 当前目录相对于基准目录的部分，不带首尾斜杠；位于基准目录时为空
    pub fn relative_current(&self) -> &str {
        self.current
            .strip_prefix(&self.base)
            .unwrap_or("")
            .trim_matches('/')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_base() {
        let dir = VirtualDirectory::new("/tmp/store");
        assert_eq!(dir.base_dir(), "/tmp/store");
        assert_eq!(dir.current_dir(), "/tmp/store");
        assert_eq!(dir.relative_current(), "");
    }

    #[test]
    fn chdir_joins_scrubbed_path_to_base() {
        let mut dir = VirtualDirectory::new("/tmp/store");
        dir.chdir(Some("/foo"));
        assert_eq!(dir.current_dir(), "/tmp/store/foo");
        dir.chdir(Some("./bar/baz"));
        assert_eq!(dir.current_dir(), "/tmp/store/bar/baz");
        assert_eq!(dir.relative_current(), "bar/baz");
    }

    #[test]
    fn chdir_is_relative_to_base_not_current() {
        let mut dir = VirtualDirectory::new("bucket");
        dir.chdir(Some("a"));
        dir.chdir(Some("b"));
        assert_eq!(dir.current_dir(), "bucket/b");
    }

    #[test]
    fn chdir_none_restores_base() {
        for relative in ["a", "/a/b", "./c", "\\d"] {
            let mut dir = VirtualDirectory::new("s3://bucket");
            dir.chdir(Some(relative));
            dir.chdir(None);
            assert_eq!(dir.current_dir(), "s3://bucket");
        }
    }

    #[test]
    fn empty_relative_path_means_base() {
        let mut dir = VirtualDirectory::new("/tmp/store");
        dir.chdir(Some("/"));
        assert_eq!(dir.current_dir(), "/tmp/store");
    }

    #[test]
    fn set_base_dir_resets_current() {
        let mut dir = VirtualDirectory::new("/tmp/store");
        dir.chdir(Some("foo"));
        dir.set_base_dir("/srv/data");
        assert_eq!(dir.current_dir(), "/srv/data");
    }

    #[test]
    fn path_of_resolves_against_current() {
        let mut dir = VirtualDirectory::new("/tmp/store");
        dir.chdir(Some("foo"));
        assert_eq!(dir.path_of("/a.txt"), "/tmp/store/foo/a.txt");
        assert_eq!(dir.path_of("././a.txt"), "/tmp/store/foo/./a.txt");
    }

    #[test]
    fn chdir_strips_only_one_leading_token() {
        let mut dir = VirtualDirectory::new("/base");
        dir.chdir(Some("././a"));
        assert_eq!(dir.current_dir(), "/base/./a");
        dir.chdir(Some("//a"));
        assert_eq!(dir.current_dir(), "/base//a");
    }
}
