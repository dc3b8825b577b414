use colored::Colorize;
use lexsearch::config::{Backend, Config};
use lexsearch::error::Result;
use lexsearch::store;

use super::runtime;

pub fn cmd_init(backend: Option<Backend>) -> Result<()> {
    let config = Config::from_env(backend)?;
    let store = store::from_config(&config)?;

    let rt = runtime()?;
    rt.block_on(store.ensure_collection())?;

    println!(
        "{} {} store is ready",
        "Ready".green().bold(),
        store.backend()
    );
    Ok(())
}
