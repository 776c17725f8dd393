use std::fs;
use std::path::Path;

use anyhow::Context;
use serde::Deserialize;

use hush_core::{Alphabet, Symbol};

/// File layout. Rows are kept in file order, which fixes decode tie-breaks.
///
/// ```toml
/// [[symbol]]
/// name = "starter"
/// gaps = [0, 0, 0, 0, 0]
/// ```
#[derive(Debug, Deserialize)]
struct AlphabetFile {
    symbol: Vec<SymbolRow>,
}

#[derive(Debug, Deserialize)]
struct SymbolRow {
    name: String,
    gaps: Vec<f64>,
}

pub fn parse_alphabet(text: &str) -> anyhow::Result<Alphabet> {
    let file: AlphabetFile = toml::from_str(text)?;

    let mut rows = Vec::with_capacity(file.symbol.len());
    for row in file.symbol {
        let symbol = Symbol::from_name(&row.name)
            .map_err(|e| anyhow::anyhow!("Bad symbol name {:?}: {}", row.name, e))?;
        rows.push((symbol, row.gaps));
    }

    Ok(Alphabet::from_rows(rows)?)
}

pub fn load_alphabet(path: &Path) -> anyhow::Result<Alphabet> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Reading alphabet {}", path.display()))?;
    parse_alphabet(&text).with_context(|| format!("Parsing alphabet {}", path.display()))
}
