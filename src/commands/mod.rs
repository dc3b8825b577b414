pub mod health;
pub mod index;
pub mod init;
pub mod search;
pub mod serve;

use lexsearch::error::Result;

/// Single-threaded runtime for one-shot commands
pub(crate) fn runtime() -> Result<tokio::runtime::Runtime> {
    Ok(tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?)
}
