pub const HEADER_PREFIX: &str = "## ";
pub const LINK_PREFIX: &str = "[OJ链接](";
pub const SOLUTION_MARKER: &str = "### 解答";
pub const RESULT_MARKER: &str = "<br>";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line<'a> {
    /// `## <name>` starts a problem section.
    Header(&'a str),
    /// `[OJ链接](<url>)`
    Link(&'a str),
    /// `### 解答` closes the explanation block.
    Solution,
    /// `<br>` closes the answer block.
    Result,
    Body(&'a str),
}

/// Classify one line (without its newline). Checked in priority order.
pub fn classify_line(line: &str) -> Line<'_> {
    if let Some(name) = line.strip_prefix(HEADER_PREFIX) {
        return Line::Header(name);
    }
    if let Some(rest) = line.strip_prefix(LINK_PREFIX) {
        return Line::Link(rest.strip_suffix(')').unwrap_or(rest));
    }
    if line == SOLUTION_MARKER {
        return Line::Solution;
    }
    if line == RESULT_MARKER {
        return Line::Result;
    }
    Line::Body(line)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header() {
        assert_eq!(classify_line("## Two Sum"), Line::Header("Two Sum"));
        assert_eq!(classify_line("## "), Line::Header(""));
    }

    #[test]
    fn solution_heading_is_not_a_header() {
        assert_eq!(classify_line("### 解答"), Line::Solution);
        assert_eq!(classify_line("### Notes"), Line::Body("### Notes"));
        assert_eq!(classify_line("##Two Sum"), Line::Body("##Two Sum"));
    }

    #[test]
    fn link() {
        assert_eq!(
            classify_line("[OJ链接](https://leetcode.cn/problems/two-sum/)"),
            Line::Link("https://leetcode.cn/problems/two-sum/")
        );
    }

    #[test]
    fn link_without_closing_paren() {
        assert_eq!(classify_line("[OJ链接](http://x"), Line::Link("http://x"));
    }

    #[test]
    fn other_links_are_body() {
        let line = "[题解](http://x)";
        assert_eq!(classify_line(line), Line::Body(line));
    }

    #[test]
    fn markers_must_match_exactly() {
        assert_eq!(classify_line("<br>"), Line::Result);
        assert_eq!(classify_line("<br> "), Line::Body("<br> "));
        assert_eq!(classify_line(" ### 解答"), Line::Body(" ### 解答"));
    }

    #[test]
    fn blank_is_body() {
        assert_eq!(classify_line(""), Line::Body(""));
    }
}
