use super::run_blocking;
use anyhow::Result;
use wikiml::util::format_size;
use wikiml::{Config, WikipediaLoader};

pub async fn show_status(config: Config) -> Result<()> {
    let cache_mode = config.dump.cache_mode;
    // the HTTP client must not be dropped on a runtime thread
    let status = run_blocking(move || Ok(WikipediaLoader::new(&config)?.status()?)).await?;
    let slot = status.request.slot();

    println!("\nCache status for {} {}", status.request.language, status.request.date);
    println!("==================================");
    println!("Slot:        {}", slot.root().display());
    println!("Cache mode:  {}", cache_mode);

    match &status.artifact {
        Some(artifact) => {
            println!(
                "Dump:        complete, {} file(s), {}",
                artifact.files.len(),
                format_size(artifact.total_bytes())
            );
        }
        None if slot.downloads_dir().exists() => {
            println!("Dump:        incomplete (will be fetched on next load)");
        }
        None => println!("Dump:        not downloaded"),
    }

    match &status.dataset {
        Some(info) => {
            println!("Dataset:     {} examples in {} split(s)", info.num_examples(), info.splits.len());
            println!("Built:       {}", info.created_at.format("%Y-%m-%d %H:%M:%S UTC"));
            println!("Output size: {}", format_size(info.stats.bytes_written));
        }
        None => println!("Dataset:     not built"),
    }

    Ok(())
}
