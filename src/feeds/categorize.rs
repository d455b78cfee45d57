// src/feeds/categorize.rs
//! Topic inference for items whose feed provides no usable categories.

/// Scan vocabulary, in priority order. Matching is a case-insensitive
/// substring check, so "bitcoin's" and "Layer 2s" still hit.
pub const CATEGORY_KEYWORDS: &[&str] = &[
    "Bitcoin",
    "Ethereum",
    "Solana",
    "DeFi",
    "NFTs",
    "Stablecoins",
    "Regulation",
    "Mining",
    "Metaverse",
    "Layer 2",
    "DePIN",
    "Altcoins",
    "Exchanges",
    "Wallets",
    "Security",
    "Web3",
    "Gaming",
    "ETF",
];

const MAX_CATEGORIES: usize = 3;

/// Pure keyword scan: up to 3 vocabulary hits in scan order, possibly empty.
pub fn categorize(text: &str) -> Vec<String> {
    let haystack = text.to_lowercase();
    let mut out = Vec::new();
    for kw in CATEGORY_KEYWORDS {
        if haystack.contains(&kw.to_lowercase()) {
            out.push((*kw).to_string());
            if out.len() == MAX_CATEGORIES {
                break;
            }
        }
    }
    out
}

/// Full category resolution for one item: feed-provided labels when present,
/// else keyword scan, else the source name.
pub fn resolve_categories(feed_categories: &[String], text: &str, source_name: &str) -> Vec<String> {
    let cleaned = clean_feed_categories(feed_categories);
    if !cleaned.is_empty() {
        return cleaned;
    }
    let matched = categorize(text);
    if !matched.is_empty() {
        return matched;
    }
    vec![source_name.to_string()]
}

/// Feed categories arrive as paths ("markets/bitcoin") or comma lists.
/// Keep the first segment, capitalize it, drop duplicates, cap at 3.
fn clean_feed_categories(raw: &[String]) -> Vec<String> {
    let mut seen = Vec::new();
    let mut out = Vec::new();
    for cat in raw {
        let first = cat
            .split(['/', ','])
            .next()
            .unwrap_or_default()
            .trim();
        if first.is_empty() {
            continue;
        }
        let key = first.to_lowercase();
        if seen.contains(&key) {
            continue;
        }
        seen.push(key);
        out.push(capitalize(first));
        if out.len() == MAX_CATEGORIES {
            break;
        }
    }
    out
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_scan_is_case_insensitive_and_ordered() {
        let cats = categorize("SEC regulation hits BITCOIN miners; mining stocks fall");
        assert_eq!(cats, vec!["Bitcoin", "Regulation", "Mining"]);
    }

    #[test]
    fn keyword_scan_caps_at_three() {
        let cats = categorize("bitcoin ethereum solana defi nfts");
        assert_eq!(cats.len(), 3);
    }

    #[test]
    fn falls_back_to_source_name() {
        let cats = resolve_categories(&[], "quarterly earnings call transcript", "Chain Report");
        assert_eq!(cats, vec!["Chain Report".to_string()]);
    }

    #[test]
    fn feed_categories_win_and_get_cleaned() {
        let raw = vec![
            "markets/bitcoin".to_string(),
            "MARKETS, weekly".to_string(),
            "ethereum".to_string(),
            "staking".to_string(),
        ];
        let cats = resolve_categories(&raw, "irrelevant", "Chain Report");
        assert_eq!(cats, vec!["Markets", "Ethereum", "Staking"]);
    }
}
