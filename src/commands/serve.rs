use std::sync::Arc;

use colored::Colorize;
use lexsearch::config::{Backend, Config};
use lexsearch::error::Result;
use lexsearch::{server, SearchPipeline};

pub fn cmd_serve(addr: Option<String>, backend: Option<Backend>) -> Result<()> {
    let config = Config::from_env(backend)?;
    let pipeline = Arc::new(SearchPipeline::from_config(&config)?);
    let addr = addr.unwrap_or_else(|| format!("0.0.0.0:{}", config.port));

    println!(
        "{} {} backend on http://{}",
        "Serving".green().bold(),
        config.store.backend(),
        addr
    );

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    rt.block_on(server::serve(&addr, pipeline))
}
