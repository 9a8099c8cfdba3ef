use compute::Totals;
use data::{Category, Layout};
use files::{check_sequence, list_directory, select_record_files};
use read::{load_definitions, read_sales};
use std::{io::Write, path::Path, process::ExitCode};
use write::save_summary;

mod compute;
mod data;
mod files;
mod read;
mod write;

/// Aggregates the record files of `root` into its two summary files. Summaries are
/// only written once every record file went through, so a failing run leaves any
/// previous summaries alone.
fn run(root: &Path, layout: &Layout) -> Result<Totals, anyhow::Error> {
    let mut totals = Totals::new(
        load_definitions(root, layout, Category::Branch)?,
        load_definitions(root, layout, Category::Commodity)?,
    );
    let files = select_record_files(list_directory(root)?, &layout.record_pattern()?);
    check_sequence(&files)?;
    read_sales(&files, &mut totals)?;
    for category in Category::ALL {
        save_summary(root, layout, category, totals.ledger(category))?;
    }
    Ok(totals)
}

/// Writes the error of a failed run to `out`, once. Returns whether the run succeeded.
fn report<T>(result: Result<T, anyhow::Error>, mut out: impl Write) -> bool {
    match result {
        Ok(_) => true,
        Err(e) => {
            // Nothing left to tell anyone if stdout itself is gone.
            let _ = writeln!(out, "{e}");
            false
        }
    }
}

fn main() -> Result<ExitCode, anyhow::Error> {
    env_logger::init();
    let args: Vec<String> = std::env::args().collect();
    if args.len() != 2 {
        anyhow::bail!("usage: {} <sales directory>", args[0]);
    }
    let result = run(Path::new(&args[1]), &Layout::default());
    Ok(if report(result, std::io::stdout()) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
