pub mod manager;
pub mod providers;

pub use manager::SearchManager;
pub use providers::duckduckgo::DuckDuckGoSearch;
pub use providers::google::GoogleSearch;
pub use providers::SearchProvider;

/// Queries tried in order for a keyword, most specific first, without repeats.
pub fn query_variants(keyword: &str) -> Vec<String> {
    let normalized = keyword.replace(',', " ").split_whitespace().collect::<Vec<_>>().join(" ");
    if normalized.is_empty() {
        return Vec::new();
    }
    let raw = keyword.trim().to_string();
    let first_word = normalized.split(' ').next().unwrap_or_default().to_string();

    let candidates = [
        normalized.clone(),
        raw,
        format!("{} 최신", normalized),
        format!("{} 2024", normalized),
        format!("{} technology", normalized),
        format!("{} news", normalized),
        first_word,
    ];

    let mut variants: Vec<String> = Vec::new();
    for candidate in candidates {
        let candidate = candidate.trim().to_string();
        if !candidate.is_empty() && !variants.contains(&candidate) {
            variants.push(candidate);
        }
    }
    variants
}
