//! Named instrument universes.

use malaga_traits::{MalagaError, Result, Symbol};
use std::collections::HashSet;

/// A named, built-in list of instruments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniversePreset {
    /// Name used on the command line and in config files.
    pub name: &'static str,
    /// One-line description.
    pub description: &'static str,
    /// Ticker list as published; may contain repeats.
    pub tickers: &'static [&'static str],
    /// Portfolio size used with this universe unless overridden.
    pub top_k: usize,
}

impl UniversePreset {
    /// The preset's symbols with repeats removed, first occurrence kept.
    pub fn symbols(&self) -> Vec<Symbol> {
        dedup_symbols(self.tickers.iter().copied())
    }
}

/// US large-cap technology and consumer names.
pub const US_LARGE_CAP: UniversePreset = UniversePreset {
    name: "us-large-cap",
    description: "US large-cap technology and consumer names",
    tickers: &[
        "AAPL", "MSFT", "GOOGL", "AMZN", "META", "TSLA", "NVDA", "NFLX", "ADBE", "INTC", "PYPL",
        "CRM", "ORCL", "CSCO", "IBM", "INTU", "PEP", "TXN", "QCOM", "AVGO", "SBUX", "BABA", "AMD",
        "UBER", "SHOP", "TWLO", "SPOT", "HON", "V", "BKNG", "MDLZ", "DOCU", "ISRG", "ADI", "MU",
        "CRWD", "NVDA", "ZM", "ROKU", "AMAT", "OKTA", "TSM", "GILD", "SNOW", "GOOG", "PLTR", "IBM",
        "MSFT", "AAPL", "NFLX",
    ],
    top_k: 50,
};

/// Warsaw Stock Exchange WIG20 constituents (Yahoo Finance `.WA` tickers).
pub const WIG20: UniversePreset = UniversePreset {
    name: "wig20",
    description: "Warsaw Stock Exchange WIG20 constituents",
    tickers: &[
        "PKN.WA", "PKO.WA", "PEO.WA", "LPP.WA", "KGH.WA", "CDR.WA", "JSW.WA", "DNP.WA", "CCC.WA",
        "ALR.WA", "PKP.WA", "KTY.WA", "MRC.WA", "CPS.WA", "TPE.WA", "LWB.WA", "ENA.WA", "EUR.WA",
        "BHW.WA", "ING.WA",
    ],
    top_k: 10,
};

/// All built-in presets.
pub const PRESETS: &[UniversePreset] = &[US_LARGE_CAP, WIG20];

/// Looks up a preset by name, ignoring case.
pub fn preset(name: &str) -> Option<&'static UniversePreset> {
    PRESETS
        .iter()
        .find(|p| p.name.eq_ignore_ascii_case(name.trim()))
}

/// Trims symbols, drops empty ones and repeats. The first occurrence wins.
pub fn dedup_symbols<'a>(symbols: impl IntoIterator<Item = &'a str>) -> Vec<Symbol> {
    let mut seen = HashSet::new();
    symbols
        .into_iter()
        .map(str::trim)
        .filter(|s| !s.is_empty() && seen.insert(*s))
        .map(str::to_string)
        .collect()
}

/// Resolves a preset name or a comma-separated ticker list.
///
/// # Errors
///
/// Returns [`MalagaError::EmptyUniverse`] when no symbol remains.
pub fn resolve_universe(universe: &str) -> Result<Vec<Symbol>> {
    let symbols = match preset(universe) {
        Some(p) => p.symbols(),
        None => dedup_symbols(universe.split(',')),
    };
    if symbols.is_empty() {
        return Err(MalagaError::EmptyUniverse(format!(
            "'{universe}' names no instruments"
        )));
    }
    Ok(symbols)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_us_preset_dedup() {
        let symbols = US_LARGE_CAP.symbols();
        assert_eq!(US_LARGE_CAP.tickers.len(), 50);
        assert_eq!(symbols.len(), 45);
        assert_eq!(symbols[0], "AAPL");
        // Repeats keep their first position.
        let nvda = symbols.iter().position(|s| s == "NVDA").unwrap();
        assert_eq!(nvda, 6);
    }

    #[test]
    fn test_wig20_preset() {
        let symbols = WIG20.symbols();
        assert_eq!(symbols.len(), 20);
        assert!(symbols.iter().all(|s| s.ends_with(".WA")));
        assert_eq!(WIG20.top_k, 10);
    }

    #[test]
    fn test_resolve_preset_or_list() {
        assert_eq!(resolve_universe("WIG20").unwrap().len(), 20);
        assert_eq!(
            resolve_universe(" A, B ,A,,C ").unwrap(),
            vec!["A".to_string(), "B".to_string(), "C".to_string()]
        );
        assert!(matches!(
            resolve_universe(" , "),
            Err(MalagaError::EmptyUniverse(_))
        ));
    }

    #[test]
    fn test_unknown_preset() {
        assert!(preset("nasdaq").is_none());
    }
}
