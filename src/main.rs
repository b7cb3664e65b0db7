use anyhow::Result;

use voucher_report::config::DATA_PATH;
use voucher_report::report::build_report;
use voucher_report::report::host::TerminalHost;

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let directives = build_report(DATA_PATH);
    let mut host = TerminalHost::new(std::io::stdout().lock());
    host.execute(&directives)?;

    Ok(())
}
