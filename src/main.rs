use anyhow::Result;
use nws_alerts::cli::cli;

fn main() -> Result<()> {
    cli()
}
