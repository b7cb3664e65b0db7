use anyhow::Result;
use log::warn;

use voucher_report::config::DATA_PATH;
use voucher_report::summary::{load_records, Summary};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let summary = match load_records(DATA_PATH).and_then(|records| Summary::from_records(&records)) {
        Ok(summary) => summary,
        Err(err) => {
            warn!("failed to load summary data, path={}, err={}", DATA_PATH, err);
            eprintln!("Error loading data: {}", err);
            std::process::exit(1);
        },
    };

    let mut out = std::io::stdout().lock();
    summary.write_to(&mut out)?;

    Ok(())
}
