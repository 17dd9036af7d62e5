//! Index arguments of the featurizers.
//!
//! An argument naming an existing file is read as a whitespace separated integer table, with
//! `#` comments and blank lines skipped and every row of the same width. Anything else is taken
//! as an inline list like `"0..9 12 20..22"` (inclusive ranges).
use std::fs;
use std::path::Path;

use itertools::Itertools;
use shared::{
    bail,
    ensure,
    range_parse,
    Context,
    Result,
};


/// Integer table from text, one `Vec` per non-empty row.
pub fn parse_index_table(text: &str) -> Result<Vec<Vec<usize>>> {
    let mut rows: Vec<Vec<usize>> = vec![];

    for (iline, line) in text.lines().enumerate() {
        let content = line.split('#').next().unwrap_or("").trim();
        if content.is_empty() {
            continue;
        }
        let row = content.split_whitespace()
            .map(|tok| tok.parse::<usize>()
                .with_context(|| format!("Invalid index '{}' at line {}, expecting a non-negative integer.", tok, iline + 1)))
            .collect::<Result<Vec<_>>>()?;

        if let Some(first) = rows.first() {
            ensure!(first.len() == row.len(),
                "Line {} has {} columns, but the previous rows have {}.", iline + 1, row.len(), first.len());
        }
        rows.push(row);
    }

    Ok(rows)
}


pub fn read_index_table<P: AsRef<Path>>(path: P) -> Result<Vec<Vec<usize>>> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read index file {:?}.", path))?;
    parse_index_table(&text)
        .with_context(|| format!("Invalid index file {:?}.", path))
}


/// A flat list of indices from a file or an inline range expression.
pub fn load_indices(arg: &str) -> Result<Vec<usize>> {
    if Path::new(arg).is_file() {
        return Ok(read_index_table(arg)?.into_iter().flatten().collect());
    }
    range_parse(arg)
        .with_context(|| format!("'{}' is neither an index file nor a valid index list.", arg))
}


/// Index pairs from a two-column file, or from an inline list taken two at a time.
pub fn load_pairs(arg: &str) -> Result<Vec<[usize; 2]>> {
    if Path::new(arg).is_file() {
        let rows = read_index_table(arg)?;
        return rows.into_iter()
            .map(|row| match row.as_slice() {
                &[a, b] => Ok([a, b]),
                _ => bail!("Pair file {:?} should have exactly 2 columns, found {}.", arg, row.len()),
            })
            .collect();
    }

    let flat = range_parse(arg)
        .with_context(|| format!("'{}' is neither a pair file nor a valid index list.", arg))?;
    ensure!(flat.len() % 2 == 0, "Inline pair list '{}' has an odd number of indices.", arg);
    Ok(flat.into_iter().tuples().map(|(a, b)| [a, b]).collect())
}
