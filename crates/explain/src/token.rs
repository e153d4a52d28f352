//! Token text helpers.
//!
//! A token is `r<radius>:<substructure>` or a bare substructure string.
//! Both helpers are total: malformed prefixes fall back instead of failing.

/// Render the token for one environment.
pub fn format_token(radius: u32, substructure: &str, include_radius_tag: bool) -> String {
    if include_radius_tag {
        format!("r{radius}:{substructure}")
    } else {
        substructure.to_string()
    }
}

/// Numeric `r<N>:` prefix of a token, or 0 when absent or malformed.
pub fn token_radius(token: &str) -> u32 {
    if token.len() < 3 || !token.starts_with('r') {
        return 0;
    }
    match token[1..].find(':') {
        Some(colon) if colon > 0 => token[1..1 + colon].parse().unwrap_or(0),
        _ => 0,
    }
}

/// Substructure text after the first `:`, or the whole token.
pub fn token_substructure(token: &str) -> &str {
    token.split_once(':').map_or(token, |(_, rest)| rest)
}
