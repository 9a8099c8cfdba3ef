use crate::data::{Category, Error, Layout, Ledger, SummaryRow};
use log::info;
use std::{fs::File, path::Path};

#[cfg(windows)]
const LINE_TERMINATOR: csv::Terminator = csv::Terminator::CRLF;
#[cfg(not(windows))]
const LINE_TERMINATOR: csv::Terminator = csv::Terminator::Any(b'\n');

/// Basic CSV exporter for a `Ledger`: `code,name,total` per line, in definition order.
/// Fields are written verbatim, names are never quoted. Hands back the writer once
/// everything is flushed to it.
pub(crate) fn write_ledger<W: std::io::Write>(writer: W, ledger: &Ledger) -> Result<W, csv::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .quote_style(csv::QuoteStyle::Never)
        .terminator(LINE_TERMINATOR)
        .from_writer(writer);
    for (code, entry) in ledger.iter() {
        wtr.serialize(SummaryRow {
            code,
            name: &entry.name,
            total: entry.total,
        })?;
    }
    wtr.flush()?;
    wtr.into_inner()
        .map_err(|e| csv::Error::from(e.into_error()))
}

/// Writes the summary file of `category` into `dir`, replacing any previous one.
pub(crate) fn save_summary(
    dir: &Path,
    layout: &Layout,
    category: Category,
    ledger: &Ledger,
) -> Result<(), Error> {
    let path = dir.join(layout.summary(category));
    let file = File::create(&path).map_err(|e| Error::io(&path, &e))?;
    let file = write_ledger(file, ledger).map_err(|e| match e.into_kind() {
        csv::ErrorKind::Io(e) => Error::io(&path, &e),
        _ => Error::UnknownError,
    })?;
    file.sync_all().map_err(|e| Error::io(&path, &e))?;
    info!("wrote {} {category} totals to {}", ledger.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{save_summary, write_ledger, LINE_TERMINATOR};
    use crate::data::{Category, Error, Layout, Ledger};

    fn ledger() -> Ledger {
        let mut ledger = Ledger::new();
        ledger.define("002".into(), "Osaka".into());
        ledger.define("001".into(), "Tokyo, \"Main\"".into());
        ledger.entry_mut("001").unwrap().total = 999_999_999;
        ledger
    }

    fn eol() -> &'static str {
        match LINE_TERMINATOR {
            csv::Terminator::CRLF => "\r\n",
            _ => "\n",
        }
    }

    #[test]
    fn write_rows_in_definition_order() {
        let out = write_ledger(Vec::new(), &ledger()).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            format!("002,Osaka,0{eol}001,Tokyo, \"Main\",999999999{eol}", eol = eol())
        );
    }

    #[test]
    fn write_empty_ledger() {
        let out = write_ledger(Vec::new(), &Ledger::new()).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn save_overwrites_and_is_repeatable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("branch.out");
        std::fs::write(&path, "stale content that is longer than the summary\n").unwrap();

        save_summary(dir.path(), &Layout::default(), Category::Branch, &ledger()).unwrap();
        let first = std::fs::read(&path).unwrap();
        save_summary(dir.path(), &Layout::default(), Category::Branch, &ledger()).unwrap();
        let second = std::fs::read(&path).unwrap();

        assert_eq!(first, second);
        assert_eq!(first, write_ledger(Vec::new(), &ledger()).unwrap());
    }

    #[test]
    fn save_into_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nowhere");
        assert!(matches!(
            save_summary(&missing, &Layout::default(), Category::Commodity, &ledger()),
            Err(Error::IoFailure { .. })
        ));
    }
}
