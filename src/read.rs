use crate::{
    data::{Category, Error, Layout, Ledger, Sale},
    files::RecordFile,
};
use log::{info, warn};
use regex::Regex;
use std::{
    fs::File,
    io::{BufRead, BufReader, ErrorKind},
    path::Path,
};

/// Trait for doing something with a `Sale` read from a record file. Used by the
/// accumulation to update totals, but also by tests to check what the reader hands
/// over and in which order.
pub(crate) trait SaleUser {
    fn use_sale(&mut self, file: &str, sale: Sale) -> Result<(), Error>;
}

/// Opens the definition file of `category` in `dir` and loads it.
pub(crate) fn load_definitions(
    dir: &Path,
    layout: &Layout,
    category: Category,
) -> Result<Ledger, Error> {
    let path = dir.join(layout.definitions(category));
    if !path.is_file() {
        return Err(Error::MissingFile(category));
    }
    let file = File::open(&path).map_err(|e| Error::io(&path, &e))?;
    let ledger = read_definitions(file, category, category.code_pattern())?;
    info!("loaded {} {category} definitions from {}", ledger.len(), path.display());
    Ok(ledger)
}

/// Definition importer: `code,name` per line, blank lines skipped, fields taken
/// as-is. Every code must match `pattern`.
pub(crate) fn read_definitions<R: std::io::Read>(
    reader: R,
    category: Category,
    pattern: &Regex,
) -> Result<Ledger, Error> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .from_reader(reader);
    let mut ledger = Ledger::new();
    for result in rdr.records() {
        let record = result.map_err(|e| definition_error(category, e))?;
        let (code, name) = match (record.len(), record.get(0), record.get(1)) {
            (2, Some(code), Some(name)) if pattern.is_match(code) => (code, name),
            _ => return Err(Error::InvalidFormat(format!("{category} definition file"))),
        };
        if ledger.define(code.to_owned(), name.to_owned()) {
            warn!("{category} code {code} is defined more than once, keeping name {name}");
        }
    }
    Ok(ledger)
}

fn definition_error(category: Category, err: csv::Error) -> Error {
    match err.kind() {
        csv::ErrorKind::Io(e) => Error::IoFailure {
            path: format!("{category} definition file"),
            message: e.to_string(),
        },
        csv::ErrorKind::Utf8 { .. } | csv::ErrorKind::UnequalLengths { .. } => {
            Error::InvalidFormat(format!("{category} definition file"))
        }
        _ => Error::UnknownError,
    }
}

/// A record file is exactly three lines: branch code, commodity code, amount.
pub(crate) fn read_sale<R: BufRead>(reader: R, file: &str) -> Result<Sale, Error> {
    let lines = reader
        .lines()
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| match e.kind() {
            ErrorKind::InvalidData => Error::InvalidFormat(file.to_owned()),
            _ => Error::IoFailure {
                path: file.to_owned(),
                message: e.to_string(),
            },
        })?;
    let [branch, commodity, amount]: [String; 3] = lines
        .try_into()
        .map_err(|_| Error::InvalidFormat(file.to_owned()))?;
    Ok(Sale {
        branch,
        commodity,
        amount,
    })
}

/// Reads every record file in order and hands its sale to `user`. The first error,
/// from reading or from the user, stops everything: later files are not even opened.
pub(crate) fn read_sales<U: SaleUser>(files: &[RecordFile], user: &mut U) -> Result<(), Error> {
    for record in files {
        let sale = {
            let file = File::open(&record.path).map_err(|e| Error::io(&record.path, &e))?;
            read_sale(BufReader::new(file), &record.name)?
        };
        user.use_sale(&record.name, sale)?;
    }
    Ok(())
}
