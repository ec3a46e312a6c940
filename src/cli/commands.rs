use crate::core::interfaces::{BuildService, Extractor};
use crate::core::models::{normalize_extension, ResolutionStrategy};
use crate::core::services::PurgeBuildService;
use crate::infrastructure::{TailwindExtractor, TokioFileSystemService};
use crate::plugins::{StatsPlugin, TailwindPurgePlugin};
use crate::utils::{CliOverrides, ConfigLoader, Logger, PurgeError, Result, CONFIG_FILE_NAME};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "tailpurge")]
#[command(about = "tailpurge - Strip unused selectors from emitted Tailwind stylesheets")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Purge the stylesheets of a finished build
    Purge {
        /// Root directory
        #[arg(short, long, default_value = ".")]
        root: String,
        /// Output directory holding the emitted assets
        #[arg(short, long)]
        outdir: Option<String>,
        /// Build manifest, relative to root (default: <outdir>/manifest.json)
        #[arg(short, long)]
        manifest: Option<String>,
        /// Selector always kept (repeatable, `/re/` for patterns)
        #[arg(long = "safelist", value_name = "SELECTOR")]
        safelist: Vec<String>,
        /// Selector always removed (repeatable)
        #[arg(long = "blocklist", value_name = "SELECTOR")]
        blocklist: Vec<String>,
        /// Custom property kept even when unreferenced (repeatable)
        #[arg(long = "variable", value_name = "NAME")]
        variables: Vec<String>,
        /// How stylesheets map to modules: context | chunk-modules
        #[arg(long)]
        strategy: Option<ResolutionStrategy>,
        /// Minify the purged output
        #[arg(long)]
        minify: bool,
        /// Keep every element selector
        #[arg(long)]
        preserve_elements: bool,
        /// Collect and report removed selectors
        #[arg(long)]
        rejected: bool,
        /// Log per-asset statistics
        #[arg(long)]
        stats: bool,
        /// Run the pass without writing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Print the tokens found in a file, using the config extractor bound to
    /// its extension or the default one
    Extract {
        /// File to scan
        file: String,
        /// Root directory (for config-declared extractors)
        #[arg(short, long, default_value = ".")]
        root: String,
    },
    /// Write an example tailpurge.config.json
    Init {
        /// Root directory
        #[arg(short, long, default_value = ".")]
        root: String,
        /// Overwrite an existing config file
        #[arg(long)]
        force: bool,
    },
}

pub struct CliHandler;

impl CliHandler {
    pub fn new() -> Self {
        Self
    }

    pub async fn run(&self) -> Result<()> {
        // Initialize logging
        Logger::init();

        let cli = Cli::parse();

        match cli.command {
            Commands::Purge {
                root,
                outdir,
                manifest,
                safelist,
                blocklist,
                variables,
                strategy,
                minify,
                preserve_elements,
                rejected,
                stats,
                dry_run,
            } => {
                let overrides = CliOverrides {
                    outdir,
                    manifest,
                    safelist,
                    blocklist,
                    variables,
                    strategy,
                    minify: minify.then_some(true),
                    // Stats output lists rejected selectors, so collect them
                    rejected: (rejected || stats).then_some(true),
                    preserve_elements: preserve_elements.then_some(true),
                    dry_run,
                };
                self.handle_purge_command(&root, overrides, stats).await
            }
            Commands::Extract { file, root } => self.handle_extract_command(&file, &root).await,
            Commands::Init { root, force } => self.handle_init_command(&root, force).await,
        }
    }

    async fn handle_purge_command(
        &self,
        root: &str,
        overrides: CliOverrides,
        stats: bool,
    ) -> Result<()> {
        let root = PathBuf::from(root);
        let file_config = ConfigLoader::load_from_file(&root)?;
        let (config, options) = ConfigLoader::merge_with_cli(file_config, root, overrides)?;

        let mut build_service = PurgeBuildService::new(Arc::new(TokioFileSystemService))
            .with_plugin(Arc::new(TailwindPurgePlugin::new(options)));

        if stats {
            build_service = build_service.with_plugin(Arc::new(StatsPlugin::new(true)));
        }

        let result = build_service.build(&config).await?;

        if config.dry_run {
            Logger::info(&format!(
                "🔍 Dry run: {} stylesheets would be rewritten",
                result.output_files.len()
            ));
        }
        Logger::info(&result.report.to_string());

        Ok(())
    }

    async fn handle_extract_command(&self, file: &str, root: &str) -> Result<()> {
        let path = Path::new(file);
        let content = tokio::fs::read_to_string(path).await.map_err(PurgeError::Io)?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(normalize_extension)
            .unwrap_or_default();

        let options = match ConfigLoader::load_from_file(Path::new(root))? {
            Some(config) => ConfigLoader::to_options(&config)?,
            None => Default::default(),
        };

        let extractor: Arc<dyn Extractor> = options
            .extractors
            .iter()
            .find(|binding| binding.handles(&extension))
            .map(|binding| Arc::clone(&binding.extractor))
            .unwrap_or_else(|| Arc::new(TailwindExtractor));

        Logger::debug(&format!("Extracting {} with '{}'", file, extractor.name()));

        for token in extractor.extract(&content)? {
            println!("{}", token);
        }

        Ok(())
    }

    async fn handle_init_command(&self, root: &str, force: bool) -> Result<()> {
        let path = Path::new(root).join(CONFIG_FILE_NAME);

        if path.exists() && !force {
            return Err(PurgeError::config(format!(
                "{} already exists (use --force to overwrite)",
                path.display()
            )));
        }

        tokio::fs::write(&path, ConfigLoader::generate_example())
            .await
            .map_err(PurgeError::Io)?;
        Logger::info(&format!("📝 Wrote {}", path.display()));

        Ok(())
    }
}

impl Default for CliHandler {
    fn default() -> Self {
        Self::new()
    }
}
