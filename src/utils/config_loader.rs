use crate::core::interfaces::ExtractorBinding;
use crate::core::models::{
    BuildConfig, ExtractionContent, PurgeOptions, ResolutionStrategy, RuntimeOverrides,
};
use crate::infrastructure::RegexExtractor;
use crate::utils::{Logger, PurgeError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const CONFIG_FILE_NAME: &str = "tailpurge.config.json";

/// Regex extractor declared in the config file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractorConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub extensions: Vec<String>,
    pub pattern: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuntimeConfig {
    #[serde(default)]
    pub content: Vec<ExtractionContent>,
    #[serde(default)]
    pub extractors: Vec<ExtractorConfig>,
}

/// Configuration file format (tailpurge.config.json)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurgeConfig {
    /// Output directory holding the emitted assets (default: "dist")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outdir: Option<String>,

    /// Build manifest path (default: "<outdir>/manifest.json")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest: Option<String>,

    /// Selectors that are always kept. `/.../` entries are regular expressions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub safelist: Option<Vec<String>>,

    /// Selectors that are always removed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blocklist: Option<Vec<String>>,

    /// Custom properties kept even when unreferenced
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<Vec<String>>,

    /// Extra content and extractors keyed by runtime
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modules: Option<HashMap<String, RuntimeConfig>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub extractors: Option<Vec<ExtractorConfig>>,

    /// "context" (default) or "chunk-modules"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub strategy: Option<ResolutionStrategy>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub minify: Option<bool>,

    /// Report removed selectors
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub preserve_elements: Option<bool>,
}

/// Values given on the command line. `None` means "not given".
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub outdir: Option<String>,
    pub manifest: Option<String>,
    pub safelist: Vec<String>,
    pub blocklist: Vec<String>,
    pub variables: Vec<String>,
    pub strategy: Option<ResolutionStrategy>,
    pub minify: Option<bool>,
    pub rejected: Option<bool>,
    pub preserve_elements: Option<bool>,
    pub dry_run: bool,
}

/// Config loader that supports config files with CLI override
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from `tailpurge.config.json` in the project root
    pub fn load_from_file(root: &Path) -> Result<Option<PurgeConfig>> {
        let config_path = root.join(CONFIG_FILE_NAME);

        if !config_path.exists() {
            Logger::debug(&format!("No {} found, using defaults", CONFIG_FILE_NAME));
            return Ok(None);
        }

        Logger::debug(&format!("Loading config from {}", config_path.display()));

        let content = std::fs::read_to_string(&config_path).map_err(PurgeError::Io)?;

        let config: PurgeConfig = serde_json::from_str(&content).map_err(|e| {
            PurgeError::config(format!("Failed to parse {}: {}", CONFIG_FILE_NAME, e))
        })?;

        Logger::debug("✅ Config file loaded successfully");
        Ok(Some(config))
    }

    fn build_extractors(configs: &[ExtractorConfig]) -> Result<Vec<ExtractorBinding>> {
        configs
            .iter()
            .enumerate()
            .map(|(i, config)| {
                let name = config
                    .name
                    .clone()
                    .unwrap_or_else(|| format!("pattern-{}", i + 1));
                let extractor = RegexExtractor::new(name, &config.pattern)?;
                Ok(ExtractorBinding::new(&config.extensions, Arc::new(extractor)))
            })
            .collect()
    }

    /// Build purge options from a config file
    pub fn to_options(config: &PurgeConfig) -> Result<PurgeOptions> {
        let mut modules = HashMap::new();
        for (runtime, runtime_config) in config.modules.iter().flatten() {
            modules.insert(
                runtime.clone(),
                RuntimeOverrides {
                    content: runtime_config.content.clone(),
                    extractors: Self::build_extractors(&runtime_config.extractors)?,
                },
            );
        }

        Ok(PurgeOptions {
            safelist: config.safelist.clone().unwrap_or_default(),
            blocklist: config.blocklist.clone().unwrap_or_default(),
            variables: config.variables.clone().unwrap_or_default(),
            modules,
            extractors: Self::build_extractors(config.extractors.as_deref().unwrap_or_default())?,
            strategy: config.strategy.unwrap_or_default(),
            minify: config.minify.unwrap_or(false),
            rejected: config.rejected.unwrap_or(false),
            preserve_elements: config.preserve_elements.unwrap_or(false),
        })
    }

    /// Merge file config with CLI arguments.
    ///
    /// Scalars: CLI > config file > default. Lists: CLI entries are appended.
    pub fn merge_with_cli(
        file_config: Option<PurgeConfig>,
        root: PathBuf,
        cli: CliOverrides,
    ) -> Result<(BuildConfig, PurgeOptions)> {
        let base = file_config.unwrap_or_default();

        let outdir_str = cli
            .outdir
            .as_deref()
            .or(base.outdir.as_deref())
            .unwrap_or("dist");
        let outdir = if Path::new(outdir_str).is_absolute() {
            PathBuf::from(outdir_str)
        } else {
            root.join(outdir_str)
        };

        // Kept relative to root; the manifest loader resolves it
        let manifest = match cli.manifest.as_deref().or(base.manifest.as_deref()) {
            Some(path) => PathBuf::from(path),
            None => Path::new(outdir_str).join("manifest.json"),
        };

        let mut options = Self::to_options(&base)?;
        options.safelist.extend(cli.safelist);
        options.blocklist.extend(cli.blocklist);
        options.variables.extend(cli.variables);
        if let Some(strategy) = cli.strategy {
            options.strategy = strategy;
        }
        if let Some(minify) = cli.minify {
            options.minify = minify;
        }
        if let Some(rejected) = cli.rejected {
            options.rejected = rejected;
        }
        if let Some(preserve) = cli.preserve_elements {
            options.preserve_elements = preserve;
        }

        let build = BuildConfig {
            root,
            outdir,
            manifest,
            dry_run: cli.dry_run,
        };

        Ok((build, options))
    }

    /// Generate example config file
    pub fn generate_example() -> String {
        let mut modules = HashMap::new();
        modules.insert(
            "main".to_string(),
            RuntimeConfig {
                content: vec![ExtractionContent::new(".html", r#"<body class="antialiased">"#)],
                extractors: Vec::new(),
            },
        );

        let example = PurgeConfig {
            outdir: Some("dist".to_string()),
            manifest: Some("dist/manifest.json".to_string()),
            safelist: Some(vec!["html".to_string(), "body".to_string(), "/^data-theme-/".to_string()]),
            blocklist: Some(Vec::new()),
            variables: Some(Vec::new()),
            modules: Some(modules),
            extractors: Some(vec![ExtractorConfig {
                name: Some("markdown".to_string()),
                extensions: vec!["md".to_string()],
                pattern: r"[A-Za-z0-9_:/-]+".to_string(),
            }]),
            strategy: Some(ResolutionStrategy::Context),
            minify: Some(false),
            rejected: Some(false),
            preserve_elements: Some(false),
        };

        serde_json::to_string_pretty(&example).unwrap_or_else(|_| {
            r#"{
  "outdir": "dist",
  "safelist": ["html", "body"],
  "strategy": "context"
}"#
            .to_string()
        })
    }
}
