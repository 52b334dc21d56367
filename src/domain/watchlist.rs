//! Watchlist parsing.
//!
//! Tickers arrive as a comma-separated list from the config file or as CLI
//! arguments; both go through `parse_tickers` so ordering and duplicate
//! rules match.

use std::collections::HashSet;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WatchlistError {
    #[error("empty token in ticker list")]
    EmptyToken,

    #[error("duplicate ticker: {0}")]
    DuplicateTicker(String),

    #[error("watchlist is empty")]
    Empty,
}

pub fn parse_tickers<I, S>(tokens: I) -> Result<Vec<String>, WatchlistError>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut tickers = Vec::new();
    let mut seen = HashSet::new();

    for token in tokens {
        let trimmed = token.as_ref().trim();
        if trimmed.is_empty() {
            return Err(WatchlistError::EmptyToken);
        }
        let ticker = trimmed.to_uppercase();
        if !seen.insert(ticker.clone()) {
            return Err(WatchlistError::DuplicateTicker(ticker));
        }
        tickers.push(ticker);
    }

    if tickers.is_empty() {
        return Err(WatchlistError::Empty);
    }
    Ok(tickers)
}

pub fn parse_ticker_list(input: &str) -> Result<Vec<String>, WatchlistError> {
    parse_tickers(input.split(','))
}
