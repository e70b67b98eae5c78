use std::sync::LazyLock;

use regex::Regex;

pub const DEFAULT_CATEGORY: &str = "Utility";

/// Ordered keyword rules. Order is a deliberate priority ranking: an input
/// matching several rule sets gets the label of the FIRST match (so a
/// database keyword beats a generic web keyword), and "email" must hit
/// Communication before the bare "ai" alternation can claim it.
static RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    [
        (r"database|postgres|mysql|sql|mongo|redis|sqlite|clickhouse|astra|pinot|doris|rds|analyticdb|snowflake|bigquery|databricks", "Database"),
        (r"git|github|gitlab|code|repository|devops|deploy|ci/cd|docker|kubernetes", "Development"),
        (r"slack|discord|email|sms|whatsapp|telegram|zoom|teams|notion|confluence", "Communication"),
        (r"calendar|todo|task|drive|dropbox|notes|docs|sheets|productivity|office", "Productivity"),
        (r"browser|web|fetch|scrape|puppeteer|playwright|crawl|http", "Web"),
        (r"ai|ml|llm|model|openai|anthropic|hugging|embedding|vector", "AI"),
        (r"payment|finance|crypto|blockchain|bitcoin|trading|stock|bank|invoice", "Finance"),
        (r"aws|azure|gcp|cloud|kubernetes|terraform|ansible|infrastructure", "Cloud"),
        (r"security|auth|oauth|sso|encryption|vault|secret", "Security"),
        (r"analytics|metrics|monitoring|observability|telemetry|sentry|datadog", "Analytics"),
        (r"ecommerce|shop|store|product|cart|checkout|stripe|shopify", "E-commerce"),
        (r"image|video|audio|media|youtube|spotify|podcast|streaming", "Media"),
        (r"iot|device|sensor|arduino|raspberry|hardware|home automation|smart home", "IoT"),
        (r"search|elastic|algolia|opensearch|brave search", "Search"),
    ]
    .into_iter()
    .map(|(pattern, label)| (Regex::new(pattern).unwrap(), label))
    .collect()
});

/// Map free text to exactly one category label. Pure and total: the same
/// input always yields the same label, and unmatched input falls back to
/// `Utility`.
pub fn categorize(name: &str, description: &str) -> &'static str {
    let text = format!("{} {}", name, description).to_lowercase();
    RULES
        .iter()
        .find(|(re, _)| re.is_match(&text))
        .map(|(_, label)| *label)
        .unwrap_or(DEFAULT_CATEGORY)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_match_wins() {
        // Matches both Database and Web rule sets; Database is ranked higher.
        assert_eq!(categorize("postgres", "web dashboard"), "Database");
    }

    #[test]
    fn communication_outranks_ai_for_email() {
        assert_eq!(categorize("Mailer", "send email from agents"), "Communication");
    }

    #[test]
    fn common_labels() {
        assert_eq!(categorize("GitHub", "repository management"), "Development");
        assert_eq!(categorize("Fetch", "web content fetching"), "Web");
        assert_eq!(categorize("Stripe", "payment processing"), "Finance");
        assert_eq!(categorize("Grafana", "incident metrics and telemetry"), "Analytics");
        // Substring matching is deliberate: "dashboards" contains "rds".
        assert_eq!(categorize("Grafana", "search dashboards"), "Database");
    }

    #[test]
    fn unmatched_falls_back_to_utility() {
        assert_eq!(categorize("Xyz", "does xyz things"), "Utility");
        assert_eq!(categorize("", ""), "Utility");
    }

    #[test]
    fn deterministic() {
        let a = categorize("Everything", "prompts, resources, and tools");
        let b = categorize("Everything", "prompts, resources, and tools");
        assert_eq!(a, b);
    }
}
