pub mod fetch;
pub mod init;
pub mod load;
pub mod status;

use anyhow::Result;
use tracing::error;

/// Run blocking dump work off the async runtime, exiting on Ctrl+C.
///
/// Whatever was being downloaded stays behind as a `.part` file, which the
/// next run does not mistake for a complete artifact.
pub async fn run_blocking<T, F>(task: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let handle = tokio::task::spawn_blocking(task);
    tokio::select! {
        joined = handle => joined?,
        _ = tokio::signal::ctrl_c() => {
            error!("Interrupted by Ctrl+C; unfinished downloads are left as .part files");
            std::process::exit(130);
        }
    }
}
