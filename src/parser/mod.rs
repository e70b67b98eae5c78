pub mod entry;
pub mod sections;

pub use entry::RawEntry;
pub use sections::Section;

/// Single linear scan over the document: each heading line switches the
/// active section, each qualifying list item emits a RawEntry tagged with
/// it. Output order matches input order; later stages may re-sort.
pub fn parse_document(text: &str) -> Vec<RawEntry> {
    let mut section = Section::Unknown;
    let mut entries = Vec::new();

    for raw in text.lines() {
        let line = raw.trim();
        if let Some(next) = Section::from_heading(line) {
            section = next;
            continue;
        }
        if let Some(entry) = entry::parse_list_item(line, section) {
            entries.push(entry);
        }
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> String {
        std::fs::read_to_string("tests/fixtures/readme.md").unwrap()
    }

    #[test]
    fn entries_before_any_heading_are_unknown() {
        let entries = parse_document("- [Early](https://github.com/a/early) - too soon");
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].section, Section::Unknown);
    }

    #[test]
    fn archived_heading_overrides_reference() {
        let md = "\
## 🌟 Reference Servers
- [Fetch](https://github.com/modelcontextprotocol/servers/tree/main/src/fetch) - Web content fetching
### Archived
- [Old Thing](https://github.com/someone/old-thing) - No longer maintained
";
        let entries = parse_document(md);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].section, Section::Reference);
        assert_eq!(entries[1].section, Section::Archived);
    }

    #[test]
    fn sections_are_exclusive_across_transitions() {
        let entries = parse_document(&fixture());
        let sections: Vec<Section> = entries.iter().map(|e| e.section).collect();
        assert!(sections.contains(&Section::Reference));
        assert!(sections.contains(&Section::Archived));
        assert!(sections.contains(&Section::Official));
        assert!(sections.contains(&Section::Community));
        // Once Community is active nothing later in the fixture is Reference.
        let first_community = sections.iter().position(|s| *s == Section::Community).unwrap();
        assert!(sections[first_community..].iter().all(|s| *s == Section::Community));
    }

    #[test]
    fn document_order_is_preserved() {
        let entries = parse_document(&fixture());
        let names: Vec<&str> = entries.iter().map(|e| e.name.as_str()).collect();
        let fetch = names.iter().position(|n| *n == "Fetch").unwrap();
        let postgres = names.iter().position(|n| *n == "PostgreSQL").unwrap();
        assert!(fetch < postgres);
    }

    #[test]
    fn non_hosting_entries_silently_dropped() {
        let entries = parse_document(&fixture());
        assert!(entries.iter().all(|e| e.url.contains("github.com")));
    }
}
