use indexmap::IndexMap;
use regex::Regex;
use serde::Serialize;
use std::{fmt, sync::LazyLock};
use thiserror::Error;

/// Totals are kept to 10 digits at most; anything above aborts the run.
pub const MAX_TOTAL: u64 = 999_999_999;

static BRANCH_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{3}$").expect("valid branch code pattern"));
static COMMODITY_CODE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9A-Za-z]{8}$").expect("valid commodity code pattern"));

/// The two things we aggregate sales by. Each one has its own definition file,
/// its own code shape and its own summary file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Branch,
    Commodity,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Branch, Category::Commodity];

    pub fn code_pattern(self) -> &'static Regex {
        match self {
            Category::Branch => &*BRANCH_CODE,
            Category::Commodity => &*COMMODITY_CODE,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Category::Branch => "branch",
            Category::Commodity => "commodity",
        })
    }
}

/// File names looked up inside the sales directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Layout {
    pub branch_definitions: String,
    pub commodity_definitions: String,
    pub branch_summary: String,
    pub commodity_summary: String,
    pub record_extension: String,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            branch_definitions: "branch.lst".into(),
            commodity_definitions: "commodity.lst".into(),
            branch_summary: "branch.out".into(),
            commodity_summary: "commodity.out".into(),
            record_extension: "rcd".into(),
        }
    }
}

impl Layout {
    pub fn definitions(&self, category: Category) -> &str {
        match category {
            Category::Branch => &self.branch_definitions,
            Category::Commodity => &self.commodity_definitions,
        }
    }

    pub fn summary(&self, category: Category) -> &str {
        match category {
            Category::Branch => &self.branch_summary,
            Category::Commodity => &self.commodity_summary,
        }
    }

    /// Record files are named with exactly 8 digits and the record extension.
    pub fn record_pattern(&self) -> Result<Regex, regex::Error> {
        Regex::new(&format!(
            r"^[0-9]{{8}}\.{}$",
            regex::escape(&self.record_extension)
        ))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Entry {
    pub name: String,
    pub total: u64,
}

/// Names and running totals of one category, keyed by code. Both live in the same
/// entry so a code can't have a name without a total (or the opposite), and the
/// map keeps codes in the order they were first defined, which is also the order
/// of the summary file.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub(crate) struct Ledger {
    entries: IndexMap<String, Entry>,
}

impl Ledger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `code` with a zero total. A code already present only gets its
    /// name replaced; returns `true` in that case.
    pub fn define(&mut self, code: String, name: String) -> bool {
        if let Some(entry) = self.entries.get_mut(&code) {
            entry.name = name;
            return true;
        }
        self.entries.insert(code, Entry { name, total: 0 });
        false
    }

    #[cfg(test)]
    pub fn total(&self, code: &str) -> Option<u64> {
        self.entries.get(code).map(|entry| entry.total)
    }

    pub fn entry_mut(&mut self, code: &str) -> Option<&mut Entry> {
        self.entries.get_mut(code)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Entry)> {
        self.entries.iter().map(|(code, entry)| (code.as_str(), entry))
    }
}

/// One record file: a single sale, with its amount still as text. The amount is only
/// checked once both codes have been found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Sale {
    pub branch: String,
    pub commodity: String,
    pub amount: String,
}

/// One line of a summary file.
#[derive(Serialize)]
pub(crate) struct SummaryRow<'a> {
    pub code: &'a str,
    pub name: &'a str,
    pub total: u64,
}

/// Everything that can stop a run. The first one raised wins, nothing is retried.
/// I/O errors are kept as text so results stay comparable in tests.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("{0} definition file does not exist")]
    MissingFile(Category),
    #[error("{0} has an invalid format")]
    InvalidFormat(String),
    #[error("{file}: unknown {category} code")]
    UnknownCode { file: String, category: Category },
    #[error("{0}: sales amount is not a number")]
    InvalidAmount(String),
    #[error("{0}: total amount exceeds 10 digits")]
    AmountOverflow(String),
    #[error("sales files are not consecutive ({former} followed by {latter})")]
    NonConsecutiveFiles { former: String, latter: String },
    #[error("I/O failure on {path}: {message}")]
    IoFailure { path: String, message: String },
    #[error("an unexpected error occurred")]
    UnknownError,
}

impl Error {
    pub(crate) fn io(path: &std::path::Path, err: &std::io::Error) -> Self {
        Error::IoFailure {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Category, Layout, Ledger};

    #[test]
    fn ledger_keeps_definition_order() {
        let mut ledger = Ledger::new();
        for (code, name) in [("003", "C"), ("001", "A"), ("002", "B")] {
            assert!(!ledger.define(code.into(), name.into()));
        }
        let codes: Vec<_> = ledger.iter().map(|(code, _)| code).collect();
        assert_eq!(codes, ["003", "001", "002"]);
        assert!(ledger.iter().all(|(_, entry)| entry.total == 0));
    }

    #[test]
    fn ledger_duplicate_replaces_name() {
        let mut ledger = Ledger::new();
        ledger.define("001".into(), "Old".into());
        ledger.entry_mut("001").unwrap().total = 42;
        assert!(ledger.define("001".into(), "New".into()));
        assert_eq!(ledger.len(), 1);
        assert_eq!(ledger.total("001"), Some(42));
        assert_eq!(ledger.iter().next().unwrap().1.name, "New");
    }

    #[test]
    fn code_patterns() {
        let branch = Category::Branch.code_pattern();
        assert!(branch.is_match("001"));
        assert!(!branch.is_match("01"));
        assert!(!branch.is_match("0001"));
        assert!(!branch.is_match("00a"));
        let commodity = Category::Commodity.code_pattern();
        assert!(commodity.is_match("A1234567"));
        assert!(commodity.is_match("abcdefgh"));
        assert!(!commodity.is_match("A123456"));
        assert!(!commodity.is_match("A123456-"));
    }

    #[test]
    fn record_pattern() {
        let pattern = Layout::default().record_pattern().unwrap();
        assert!(pattern.is_match("00000001.rcd"));
        assert!(!pattern.is_match("0000001.rcd"));
        assert!(!pattern.is_match("00000001xrcd"));
        assert!(!pattern.is_match("00000001.rcd.bak"));
        assert!(!pattern.is_match("abcdefgh.rcd"));
    }
}
