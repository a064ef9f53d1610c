use anyhow::{bail, Result};
use std::path::Path;
use wikiml::config::Config;

pub fn init_config(path: &Path, force: bool) -> Result<()> {
    let config = Config::default();
    let config_path = path.join("wikiml.toml");

    if config_path.exists() && !force {
        bail!(
            "{} already exists (use --force to overwrite)",
            config_path.display()
        );
    }

    let namespaces = config
        .dataset
        .namespaces
        .iter()
        .map(|ns| ns.to_string())
        .collect::<Vec<_>>()
        .join(", ");

    let toml_content = format!(
        r#"# wikiml configuration

[dump]
language = "en"
date = 20200201
data_dir = "data/en_wikipedia"
mirror_url = "{}"
# force-redownload | reuse-dataset-if-exists | reuse-cache-if-exists
cache_mode = "{}"
force_download = false

[dataset]
split = "{}"
batch_size = {}
shuffle_files = {}
min_content_length = {}
namespaces = [{}]
shard_max_bytes = {}

[download]
user_agent = "{}"
connect_timeout_secs = {}
verify_checksums = {}

[logging]
format = "text"
level = "{}"
verbose = false
"#,
        config.dump.mirror_url,
        config.dump.cache_mode,
        config.dataset.split,
        config.dataset.batch_size,
        config.dataset.shuffle_files,
        config.dataset.min_content_length,
        namespaces,
        config.dataset.shard_max_bytes,
        config.download.user_agent,
        config.download.connect_timeout_secs,
        config.download.verify_checksums,
        config.logging.level,
    );

    std::fs::create_dir_all(path)?;
    std::fs::write(&config_path, toml_content)?;
    println!("Created configuration file: {}", config_path.display());

    Ok(())
}
