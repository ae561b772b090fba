pub const SEPARATOR: char = '/';

/// A path being consumed one root-relative component at a time.
#[derive(Debug, Clone, Copy)]
pub struct Path<'a> {
    rest: &'a str,
}

impl<'a> Path<'a> {
    pub fn new(path: &'a str) -> Self {
        Self { rest: path }
    }

    pub fn as_str(&self) -> &'a str {
        self.rest
    }

    pub fn is_empty(&self) -> bool {
        self.rest.is_empty()
    }

    /// Splits off the leading component, consuming at most one separator
    /// before it. The remainder keeps its own leading separator, so once
    /// `is_empty` holds the returned component was the basename.
    pub fn split_root(&mut self) -> &'a str {
        let rest = self.rest.strip_prefix(SEPARATOR).unwrap_or(self.rest);
        let end = rest.find(SEPARATOR).unwrap_or(rest.len());
        let (name, rest) = rest.split_at(end);
        self.rest = rest;
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split_all(path: &str) -> Vec<&str> {
        let mut path = Path::new(path);
        let mut names = vec![];
        loop {
            names.push(path.split_root());
            if path.is_empty() {
                break;
            }
        }
        names
    }

    #[test]
    fn split_basic() {
        let mut path = Path::new("/docs/readme");
        assert_eq!(path.split_root(), "docs");
        assert_eq!(path.as_str(), "/readme");
        assert!(!path.is_empty());
        assert_eq!(path.split_root(), "readme");
        assert!(path.is_empty());
    }

    #[test]
    fn split_without_leading_separator() {
        assert_eq!(split_all("a/b/c"), ["a", "b", "c"]);
        assert_eq!(split_all("/a/b/c"), ["a", "b", "c"]);
        assert_eq!(split_all("single"), ["single"]);
    }

    #[test]
    fn split_degenerate() {
        assert_eq!(split_all(""), [""]);
        assert_eq!(split_all("/"), [""]);
        assert_eq!(split_all("/a/"), ["a", ""]);
        assert_eq!(split_all("/a//b"), ["a", "", "b"]);
        assert_eq!(split_all("//a"), ["", "a"]);
    }
}
