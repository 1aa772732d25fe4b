pub trait CaseInsensitiveStringExt {
    fn strip_prefix_ignore_ascii_case<'a>(&'a self, prefix: &str) -> Option<&'a str>;
}

impl CaseInsensitiveStringExt for str {
    fn strip_prefix_ignore_ascii_case<'a>(&'a self, prefix: &str) -> Option<&'a str> {
        // `get` rather than indexing: the cut may land inside a multi-byte char.
        let my_prefix = self.get(..prefix.len())?;

        if my_prefix.eq_ignore_ascii_case(prefix) {
            Some(&self[prefix.len()..])
        } else {
            None
        }
    }
}
