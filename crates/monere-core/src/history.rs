//! Coincodex-style historical CSV exports.
//!
//! Expected header: `Start,End,Open,High,Low,Close,Volume,Market Cap`.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use serde::Deserialize;

use crate::{parse_date, CoreError, HistoryBar, Symbol};

#[derive(Debug, Deserialize)]
struct HistoryRecord {
    #[serde(rename = "Start")]
    start: String,
    #[serde(rename = "End")]
    end: String,
    #[serde(rename = "Open")]
    open: f64,
    #[serde(rename = "High")]
    high: f64,
    #[serde(rename = "Low")]
    low: f64,
    #[serde(rename = "Close")]
    close: f64,
    #[serde(rename = "Volume", default)]
    volume: Option<f64>,
    #[serde(rename = "Market Cap", default)]
    market_cap: Option<f64>,
}

pub fn read_history_file(path: &Path, symbol: &Symbol) -> Result<Vec<HistoryBar>, CoreError> {
    let file = File::open(path).map_err(|error| CoreError::io(path, error))?;
    let bars = read_history(BufReader::new(file), symbol)?;
    tracing::debug!(path = %path.display(), symbol = %symbol, count = bars.len(), "read history export");
    Ok(bars)
}

pub fn read_history<R: Read>(reader: R, symbol: &Symbol) -> Result<Vec<HistoryBar>, CoreError> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut bars = Vec::new();

    for result in rdr.deserialize() {
        let record: HistoryRecord = result?;
        let bar = HistoryBar::new(
            symbol.clone(),
            parse_date(&record.start)?,
            parse_date(&record.end)?,
            record.open,
            record.high,
            record.low,
            record.close,
            record.volume,
            record.market_cap,
        )?;
        bars.push(bar);
    }

    Ok(bars)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_export_rows() {
        let csv = "Start,End,Open,High,Low,Close,Volume,Market Cap\n\
                   2025-12-17,2025-12-18,410.5,425.0,401.2,420.0,120000000,7700000000\n\
                   2025-12-18,2025-12-19,420.0,430.0,415.0,418.3,,\n";
        let symbol = Symbol::parse("xmr").expect("symbol");
        let bars = read_history(csv.as_bytes(), &symbol).expect("read");

        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].symbol.as_str(), "XMR");
        assert_eq!(bars[0].end_date.to_string(), "2025-12-18");
        assert_eq!(bars[1].close, 418.3);
        assert_eq!(bars[1].volume, None);
    }

    #[test]
    fn rejects_rows_with_high_below_low() {
        let csv = "Start,End,Open,High,Low,Close,Volume,Market Cap\n\
                   2025-12-17,2025-12-18,410,400,405,402,1,1\n";
        let symbol = Symbol::parse("XMR").expect("symbol");
        assert!(read_history(csv.as_bytes(), &symbol).is_err());
    }
}
