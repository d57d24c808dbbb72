//! The `thumbvault run` command: harvest search inputs into the image table.

mod summary;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use thumbvault_core::{
    load_inputs, Config, Dispatcher, HttpFetcher, ImageStore, NameAllocator, RunReport,
    SearchInput, SqliteStore,
};

use summary::{create_progress_bar, print_summary};

/// Arguments for the `run` command.
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// JSON file of search inputs (`SearchQuery`, `MaxImages`, `Urls`)
    #[arg(short, long)]
    pub inputs: Option<PathBuf>,

    /// Image URL to process (can be repeated)
    #[arg(long = "url", value_name = "URL")]
    pub urls: Vec<String>,

    /// Number of concurrent workers
    #[arg(short, long)]
    pub parallel: Option<usize>,

    /// Thumbnail width in pixels
    #[arg(long)]
    pub width: Option<u32>,

    /// Thumbnail height in pixels
    #[arg(long)]
    pub height: Option<u32>,

    /// Database file (overrides the config file)
    #[arg(long, env = "THUMBVAULT_DATABASE")]
    pub database: Option<PathBuf>,

    /// Keep downloaded originals in the work directory
    #[arg(long)]
    pub keep_raw: bool,
}

impl RunArgs {
    /// Fold command-line overrides into the loaded configuration.
    fn apply_to(&self, config: &mut Config) {
        if let Some(parallel) = self.parallel {
            config.pipeline.parallelism = parallel;
        }
        if let Some(width) = self.width {
            config.resize.width = width;
        }
        if let Some(height) = self.height {
            config.resize.height = height;
        }
        if let Some(database) = &self.database {
            config.store.database = database.clone();
        }
        if self.keep_raw {
            config.pipeline.cleanup_raw = false;
        }
    }

    /// Every search input to process, file entries first.
    fn collect_inputs(&self) -> anyhow::Result<Vec<SearchInput>> {
        let mut inputs = Vec::new();
        if let Some(path) = &self.inputs {
            inputs.extend(load_inputs(path)?);
        }
        if !self.urls.is_empty() {
            inputs.push(SearchInput::from_urls("cli", self.urls.clone()));
        }
        if inputs.is_empty() {
            anyhow::bail!("Nothing to do: pass --inputs <FILE> or at least one --url");
        }
        Ok(inputs)
    }
}

/// Execute the run command.
pub async fn execute(args: RunArgs, mut config: Config) -> anyhow::Result<()> {
    args.apply_to(&mut config);
    config.validate()?;
    let inputs = args.collect_inputs()?;

    let database = config.database_path();
    let store = SqliteStore::from_config(&database, &config.store)?;
    store.ensure_schema().await?;
    tracing::info!("Using database {:?}", database);

    let fetcher = HttpFetcher::new(&config.fetch)?;
    let progress = create_progress_bar();
    let bar = progress.clone();
    let dispatcher = Dispatcher::new(&config, Arc::new(fetcher), Arc::new(store))?.on_outcome(
        move |outcome| {
            if let Err(failure) = &outcome.result {
                bar.println(format!("  {} ({}): {}", outcome.name, outcome.url, failure));
            }
            bar.inc(1);
        },
    );

    let work_dir = config.work_dir();
    let run_names = NameAllocator::new(&run_tag());
    let mut total = RunReport::default();

    for input in &inputs {
        let urls = input.image_urls();
        if urls.is_empty() {
            tracing::warn!("No usable image URLs for {:?}", input.search_query);
            continue;
        }

        tracing::info!("Query {:?}: {} image(s)", input.search_query, urls.len());
        progress.reset();
        progress.set_length(urls.len() as u64);
        progress.set_message(input.search_query.clone());

        let names = query_names(&run_names, &input.search_query);
        let report = dispatcher.run(names.items(urls, &work_dir)).await?;
        progress.finish_and_clear();

        print_summary(&input.search_query, &report);
        total.merge(&report);
    }

    if inputs.len() > 1 {
        print_summary("all queries", &total);
    }

    Ok(())
}

/// Distinguishes this invocation's file names from earlier ones.
fn run_tag() -> String {
    let millis = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    format!("{millis:x}")
}

/// Names for one query: `<query>_<run tag>_<n>.jpg`, numbered from the
/// invocation-wide counter so queries with similar text never collide.
fn query_names(run_names: &NameAllocator, query: &str) -> NameAllocator {
    run_names.with_prefix(&format!("{}_{}", query, run_names.prefix()))
}
