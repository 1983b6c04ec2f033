use anyhow::{Context, Result};

pub fn split_csv(s: &str) -> Vec<String> {
    s.split(',')
        .map(|x| x.trim().to_string())
        .filter(|x| !x.is_empty())
        .collect()
}

/// Parse a comma-separated list of numeric attribute levels.
pub fn parse_levels(s: &str) -> Result<Vec<f64>> {
    split_csv(s)
        .iter()
        .map(|token| {
            token
                .parse::<f64>()
                .with_context(|| format!("invalid level {token:?}"))
        })
        .collect()
}
