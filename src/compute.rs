use crate::{
    data::{Category, Error, Ledger, Sale, MAX_TOTAL},
    read::SaleUser,
};
use log::debug;

/// This is where totals are stored: one ledger per category, both loaded from the
/// definition files before any sale is read. Sales only ever update existing entries.
#[derive(Debug)]
pub(crate) struct Totals {
    pub branches: Ledger,
    pub commodities: Ledger,
}

impl Totals {
    pub fn new(branches: Ledger, commodities: Ledger) -> Self {
        Self {
            branches,
            commodities,
        }
    }

    pub fn ledger(&self, category: Category) -> &Ledger {
        match category {
            Category::Branch => &self.branches,
            Category::Commodity => &self.commodities,
        }
    }
}

/// Digits only, at least one. Anything too big for a `u64` can only overflow the totals.
fn parse_amount(file: &str, amount: &str) -> Result<u64, Error> {
    if amount.is_empty() || !amount.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::InvalidAmount(file.to_owned()));
    }
    amount
        .parse()
        .map_err(|_| Error::AmountOverflow(file.to_owned()))
}

fn add_amount(file: &str, total: u64, amount: u64) -> Result<u64, Error> {
    total
        .checked_add(amount)
        .filter(|&sum| sum <= MAX_TOTAL)
        .ok_or_else(|| Error::AmountOverflow(file.to_owned()))
}

/// Both new totals are computed before either is stored, so a sale that would push
/// one of them over the limit leaves the two ledgers as they were.
impl SaleUser for Totals {
    fn use_sale(&mut self, file: &str, sale: Sale) -> Result<(), Error> {
        let branch = self
            .branches
            .entry_mut(&sale.branch)
            .ok_or_else(|| Error::UnknownCode {
                file: file.to_owned(),
                category: Category::Branch,
            })?;
        let commodity = self
            .commodities
            .entry_mut(&sale.commodity)
            .ok_or_else(|| Error::UnknownCode {
                file: file.to_owned(),
                category: Category::Commodity,
            })?;
        let amount = parse_amount(file, &sale.amount)?;
        let branch_total = add_amount(file, branch.total, amount)?;
        let commodity_total = add_amount(file, commodity.total, amount)?;
        branch.total = branch_total;
        commodity.total = commodity_total;
        debug!(
            "{file}: {amount} added to branch {} and commodity {}",
            sale.branch, sale.commodity
        );
        Ok(())
    }
}
