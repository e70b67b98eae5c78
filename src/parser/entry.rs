use std::sync::LazyLock;

use regex::Regex;

use super::sections::Section;

static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[([^\]]+)\]\(([^)]+)\)").unwrap());
static DESC_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\)\s*[-–]\s*(.+)$").unwrap());

const HOSTING_DOMAIN: &str = "github.com";

/// One line-derived server record before enrichment.
#[derive(Debug, Clone)]
pub struct RawEntry {
    pub name: String,
    pub url: String,
    /// Trailing `- <text>` after the link on the same line, if any.
    pub description: String,
    pub section: Section,
}

/// Parse a trimmed list-item line into a RawEntry.
///
/// Returns None for anything that is not `- [Name](url)` with a recognized
/// hosting URL; non-matching lines are skipped, never an error.
pub fn parse_list_item(line: &str, section: Section) -> Option<RawEntry> {
    let rest = line.strip_prefix("- ")?;
    let caps = LINK_RE.captures(rest)?;
    let name = caps[1].trim().to_string();
    let url = caps[2].to_string();
    if name.is_empty() || !url.contains(HOSTING_DOMAIN) {
        return None;
    }
    let description = DESC_RE
        .captures(rest)
        .map(|c| c[1].trim().to_string())
        .unwrap_or_default();
    Some(RawEntry {
        name,
        url,
        description,
        section,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn link_with_hyphen_description() {
        let e = parse_list_item(
            "- [Filesystem](https://github.com/modelcontextprotocol/servers/tree/main/src/filesystem) - Secure file operations",
            Section::Reference,
        )
        .unwrap();
        assert_eq!(e.name, "Filesystem");
        assert_eq!(e.description, "Secure file operations");
        assert_eq!(e.section, Section::Reference);
    }

    #[test]
    fn link_with_en_dash_description() {
        let e = parse_list_item(
            "- [AgentQL](https://github.com/tinyfish-io/agentql-mcp) – Extract structured data from the web",
            Section::Official,
        )
        .unwrap();
        assert_eq!(e.description, "Extract structured data from the web");
    }

    #[test]
    fn link_without_description() {
        let e = parse_list_item(
            "- [Git](https://github.com/modelcontextprotocol/servers/tree/main/src/git)",
            Section::Reference,
        )
        .unwrap();
        assert!(e.description.is_empty());
    }

    #[test]
    fn non_hosting_url_dropped() {
        assert!(parse_list_item(
            "- [Docs](https://modelcontextprotocol.io) - Protocol documentation",
            Section::Community,
        )
        .is_none());
    }

    #[test]
    fn non_list_lines_ignored() {
        assert!(parse_list_item("Some prose with a [link](https://github.com/a/b)", Section::Community).is_none());
        assert!(parse_list_item("- plain bullet, no link", Section::Community).is_none());
        assert!(parse_list_item("", Section::Community).is_none());
    }
}
