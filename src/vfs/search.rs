use crate::vfs::model::Entry;

/// 单通配符搜索模式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchPattern<'a> {
    /// `prefix*`
    Prefix(&'a str),
    /// `*suffix`
    Suffix(&'a str),
    Exact(&'a str),
}

impl<'a> SearchPattern<'a> {
    /// 两端都有 `*` 时按 `prefix*` 处理：末尾通配符先匹配
    pub fn parse(pattern: &'a str) -> Self {
        if let Some(prefix) = pattern.strip_suffix('*') {
            SearchPattern::Prefix(prefix)
        } else if let Some(suffix) = pattern.strip_prefix('*') {
            SearchPattern::Suffix(suffix)
        } else {
            SearchPattern::Exact(pattern)
        }
    }

    pub fn matches(&self, name: &str) -> bool {
        match self {
            SearchPattern::Prefix(prefix) => name.starts_with(prefix),
            SearchPattern::Suffix(suffix) => name.ends_with(suffix),
            SearchPattern::Exact(exact) => name == *exact,
        }
    }
}

pub struct SearchFilter;

impl SearchFilter {
    /// 保序过滤名字列表
    pub fn filter<S: AsRef<str>>(names: impl IntoIterator<Item = S>, pattern: &str) -> Vec<S> {
        let pattern = SearchPattern::parse(pattern);
        names
            .into_iter()
            .filter(|name| pattern.matches(name.as_ref()))
            .collect()
    }

    /// 过滤列表项；目录按去掉末尾 `/` 的名字匹配
    pub fn filter_entries(entries: Vec<Entry>, search: Option<&str>) -> Vec<Entry> {
        match search {
            None => entries,
            Some(search) => {
                let pattern = SearchPattern::parse(search);
                entries
                    .into_iter()
                    .filter(|entry| pattern.matches(entry.bare_name()))
                    .collect()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names() -> Vec<&'static str> {
        vec!["a.txt", "b.log", "a.log"]
    }

    #[test]
    fn leading_wildcard_matches_suffix() {
        assert_eq!(SearchFilter::filter(names(), "*.log"), vec!["b.log", "a.log"]);
    }

    #[test]
    fn trailing_wildcard_matches_prefix() {
        assert_eq!(SearchFilter::filter(names(), "a*"), vec!["a.txt", "a.log"]);
    }

    #[test]
    fn no_wildcard_is_exact() {
        assert_eq!(SearchFilter::filter(names(), "a.txt"), vec!["a.txt"]);
        assert!(SearchFilter::filter(names(), "a").is_empty());
    }

    #[test]
    fn both_wildcards_use_prefix_branch() {
        assert_eq!(SearchPattern::parse("*a*"), SearchPattern::Prefix("*a"));
        let list = vec!["*abc", "xa", "abc"];
        assert_eq!(SearchFilter::filter(list, "*a*"), vec!["*abc"]);
    }

    #[test]
    fn lone_star_matches_everything() {
        assert_eq!(SearchFilter::filter(names(), "*"), names());
    }

    #[test]
    fn works_on_owned_strings() {
        let owned: Vec<String> = names().into_iter().map(String::from).collect();
        let filtered = SearchFilter::filter(owned, "b*");
        assert_eq!(filtered, vec!["b.log".to_string()]);
    }

    #[test]
    fn directories_match_without_trailing_slash() {
        let entries = vec![
            Entry::directory("foo"),
            Entry::directory("bar"),
            Entry::file("foo.txt"),
        ];
        let filtered = SearchFilter::filter_entries(entries.clone(), Some("*oo"));
        assert_eq!(filtered, vec![Entry::directory("foo")]);

        assert_eq!(SearchFilter::filter_entries(entries.clone(), None), entries);
    }
}
