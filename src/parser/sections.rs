/// Document section an entry was parsed from, used for trust tiering.
/// Exactly one section is active at a time; each heading line switches it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Unknown,
    Reference,
    Official,
    Community,
    Archived,
}

// The upstream README marks its sections with these exact headings,
// emoji prefixes included.
const REFERENCE_HEADING: &str = "## 🌟 Reference Servers";
const ARCHIVED_HEADING: &str = "### Archived";
const OFFICIAL_HEADING: &str = "### 🎖️ Official Integrations";
const COMMUNITY_HEADING: &str = "### 🌍 Community Servers";

impl Section {
    /// Section transition for a trimmed line, or None if the line is not a
    /// recognized heading.
    pub fn from_heading(line: &str) -> Option<Section> {
        if line.starts_with(REFERENCE_HEADING) {
            Some(Section::Reference)
        } else if line.starts_with(ARCHIVED_HEADING) {
            Some(Section::Archived)
        } else if line.starts_with(OFFICIAL_HEADING) {
            Some(Section::Official)
        } else if line.starts_with(COMMUNITY_HEADING) {
            Some(Section::Community)
        } else {
            None
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Section::Unknown => "",
            Section::Reference => "Reference",
            Section::Official => "Official Integrations",
            Section::Community => "Community",
            Section::Archived => "Archived",
        }
    }

    /// Dedupe precedence: Reference > Official > Community > Unknown.
    pub fn priority(&self) -> u8 {
        match self {
            Section::Reference => 3,
            Section::Official => 2,
            Section::Community => 1,
            Section::Unknown | Section::Archived => 0,
        }
    }

    pub fn is_verified(&self) -> bool {
        matches!(self, Section::Reference | Section::Official)
    }

    pub fn is_featured(&self) -> bool {
        matches!(self, Section::Reference)
    }

    /// Provenance tag: first element of a record's tag list.
    pub fn provenance(&self) -> &'static str {
        match self {
            Section::Reference => "reference",
            Section::Official => "official",
            _ => "community",
        }
    }
}
