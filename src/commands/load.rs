use super::run_blocking;
use anyhow::Result;
use wikiml::fetch::CacheOutcome;
use wikiml::util::{format_size, truncate_str};
use wikiml::{Config, WikipediaLoader};

pub async fn load_dataset(config: Config, preview: usize) -> Result<()> {
    let (loaded, batches) = run_blocking(move || {
        let loaded = WikipediaLoader::new(&config)?.load()?;
        let mut shown = Vec::new();
        if preview > 0 {
            for batch in loaded.reader.batches() {
                shown.push(batch?);
                if shown.iter().map(Vec::len).sum::<usize>() >= preview {
                    break;
                }
            }
        }
        Ok((loaded, shown))
    })
    .await?;

    let info = loaded.info();
    let origin = match &loaded.resolution {
        None => "reused existing dataset",
        Some(r) if r.outcome == CacheOutcome::Hit => "built from cached dump",
        Some(_) => "downloaded and built",
    };

    println!("\nDataset {}", info.name);
    println!("==================");
    println!("Location:      {}", loaded.reader.dir().display());
    println!("Origin:        {}", origin);
    println!("Split:         {}", loaded.reader.split());
    println!("Shards:        {}", loaded.reader.shard_paths().len());
    println!("Examples:      {}", loaded.reader.num_examples());
    println!("Batch size:    {}", loaded.reader.batch_size());
    println!("Dump size:     {}", format_size(info.stats.dump_bytes));
    println!("Output size:   {}", format_size(info.stats.bytes_written));
    println!(
        "Skipped:       {} empty, {} redirects, {} other namespaces",
        info.stats.empty_clean_examples, info.stats.filtered_redirects, info.stats.filtered_namespace
    );

    if preview > 0 {
        println!("\nFirst records:");
        for (i, article) in batches.iter().flatten().take(preview).enumerate() {
            println!("\n{}. {} (id {})", i + 1, article.title, article.id);
            println!("   {}", truncate_str(&article.text.replace('\n', " "), 200));
        }
    }

    Ok(())
}
