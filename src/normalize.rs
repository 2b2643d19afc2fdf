/*!
 * Scope identifier normalization
 *
 * Turns free-form identifiers ("New York", "new-york", "NY", "region_2",
 * "usa") into a [`Scope`]. Unknown input is not an error here; callers decide
 * how to render "not found".
 */

use crate::data_types::{RegionNumber, Scope, StateCode};
use crate::{Result, WrappedError};

/// Lowercase, treat `-` and `_` as spaces, collapse whitespace
pub fn normalize_text(raw: &str) -> String {
    raw.to_lowercase()
        .replace(['-', '_', '.'], " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Normalize an identifier into a scope, or `None` when nothing matches
pub fn normalize(raw: &str) -> Option<Scope> {
    let text = normalize_text(raw);
    if text.is_empty() {
        return None;
    }
    if text == "usa" {
        return Some(Scope::Usa);
    }
    if let Some(region) = parse_region(&text) {
        return Some(Scope::Region(region));
    }
    parse_state(&text)
        .filter(|state| !state.is_territory())
        .map(Scope::State)
}

/// Like [`normalize`] but reports unknown input as [`WrappedError::UnresolvedIdentifier`]
pub fn resolve_identifier(raw: &str) -> Result<Scope> {
    normalize(raw).ok_or_else(|| WrappedError::UnresolvedIdentifier {
        input: raw.to_string(),
    })
}

/// Parse `region 2`, `region2` (already normalized) into a region number
pub fn parse_region(text: &str) -> Option<RegionNumber> {
    let rest = text.strip_prefix("region")?.trim();
    if rest.is_empty() || !rest.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    rest.parse::<u8>().ok().and_then(RegionNumber::new)
}

/// Parse a postal code or full name (already normalized), territories included
pub fn parse_state(text: &str) -> Option<StateCode> {
    if text.len() == 2 {
        return StateCode::from_code(text);
    }
    StateCode::from_normalized_name(text).or_else(|| {
        let compact = text.replace(' ', "");
        StateCode::ALL.iter().copied().find(|s| {
            normalize_text(s.name()).replace(' ', "") == compact
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_spellings_agree() {
        let expected = Some(Scope::State(StateCode::NY));
        assert_eq!(normalize("New York"), expected);
        assert_eq!(normalize("new-york"), expected);
        assert_eq!(normalize("new_york"), expected);
        assert_eq!(normalize("  NEW   york "), expected);
        assert_eq!(normalize("NY"), expected);
        assert_eq!(normalize("ny"), expected);
        assert_eq!(normalize("newyork"), expected);
    }

    #[test]
    fn test_district_of_columbia() {
        assert_eq!(normalize("DC"), Some(Scope::State(StateCode::DC)));
        assert_eq!(normalize("district-of-columbia"), Some(Scope::State(StateCode::DC)));
    }

    #[test]
    fn test_region_forms() {
        let region2 = Some(Scope::Region(RegionNumber::new(2).unwrap()));
        assert_eq!(normalize("region2"), region2);
        assert_eq!(normalize("region-2"), region2);
        assert_eq!(normalize("region_2"), region2);
        assert_eq!(normalize("Region 2"), region2);
        assert_eq!(normalize("region10"), Some(Scope::Region(RegionNumber::new(10).unwrap())));
        assert_eq!(normalize("region0"), None);
        assert_eq!(normalize("region11"), None);
        assert_eq!(normalize("region"), None);
    }

    #[test]
    fn test_usa_and_unknown() {
        assert_eq!(normalize("USA"), Some(Scope::Usa));
        assert_eq!(normalize("atlantis"), None);
        assert_eq!(normalize(""), None);
        assert_eq!(normalize("PR"), None);
        assert!(matches!(
            resolve_identifier("xx"),
            Err(WrappedError::UnresolvedIdentifier { .. })
        ));
    }

    #[test]
    fn test_parse_state_accepts_territories() {
        assert_eq!(parse_state("pr"), Some(StateCode::PR));
        assert_eq!(parse_state("virgin islands"), Some(StateCode::VI));
    }
}
