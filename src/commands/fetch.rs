use super::run_blocking;
use anyhow::Result;
use wikiml::fetch::CacheOutcome;
use wikiml::util::format_size;
use wikiml::{Config, WikipediaLoader};

pub async fn fetch_dump(config: Config) -> Result<()> {
    let resolution = run_blocking(move || Ok(WikipediaLoader::new(&config)?.fetch()?)).await?;

    let artifact = &resolution.artifact;
    match resolution.outcome {
        CacheOutcome::Hit => println!("Already cached: {}", artifact.path().display()),
        CacheOutcome::Fetched => println!("Downloaded to: {}", artifact.path().display()),
    }
    for file in &artifact.files {
        println!("  {} ({})", file.path.display(), format_size(file.size));
    }
    println!("Total: {}", format_size(artifact.total_bytes()));

    Ok(())
}
