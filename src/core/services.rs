use crate::core::interfaces::*;
use crate::core::models::*;
use crate::core::plugin::{PluginContext, PluginManager};
use crate::core::resolver::ContextResolver;
use crate::infrastructure::{ManifestLoader, TailwindExtractor};
use crate::utils::{Logger, PurgeError, Result, Timer};
use std::sync::Arc;
use std::time::Instant;

/// Rewrites every stylesheet of a compilation down to the rules its
/// entry's modules actually use.
pub struct SelectorReducer {
    purger: Arc<dyn CssPurger>,
    options: Arc<PurgeOptions>,
    default_extractor: Arc<dyn Extractor>,
    resolver: ContextResolver,
}

impl SelectorReducer {
    pub fn new(purger: Arc<dyn CssPurger>, options: PurgeOptions) -> Self {
        let resolver = ContextResolver::new(options.strategy);
        Self {
            purger,
            options: Arc::new(options),
            default_extractor: Arc::new(TailwindExtractor),
            resolver,
        }
    }

    pub fn options(&self) -> &PurgeOptions {
        &self.options
    }

    /// Build the purge request for one stylesheet. Option lists are copied;
    /// nothing in `self.options` is touched.
    pub fn prepare_request(&self, compilation: &Compilation, asset: &str) -> Result<(String, usize, PurgeRequest)> {
        let resolution = self.resolver.resolve(compilation, asset)?;
        let source = compilation
            .asset(asset)
            .map(|a| a.source.clone())
            .ok_or_else(|| PurgeError::resolution(asset, "asset was not emitted"))?;

        let mut content: Vec<ExtractionContent> =
            resolution.modules.iter().map(|m| m.to_content()).collect();
        let mut extractors = self.options.extractors.clone();

        let overrides = resolution
            .chunk
            .runtime
            .as_deref()
            .and_then(|runtime| self.options.modules.get(runtime));
        if let Some(overrides) = overrides {
            content.extend(overrides.content.iter().cloned());
            extractors.extend(overrides.extractors.iter().cloned());
        }

        let request = PurgeRequest {
            content,
            css: vec![RawCss::named(asset, source)],
            extractors,
            default_extractor: Arc::clone(&self.default_extractor),
            safelist: self.options.safelist.clone(),
            blocklist: self.options.blocklist.clone(),
            variables: self.options.variables.clone(),
            minify: self.options.minify,
            rejected: self.options.rejected,
            preserve_elements: self.options.preserve_elements,
        };

        Ok((resolution.chunk.id.clone(), resolution.modules.len(), request))
    }

    /// Purge every `.css` asset in emission order, one at a time
    pub async fn run(&self, compilation: &mut Compilation) -> Result<PurgeReport> {
        let started = Instant::now();
        let _timer = Timer::start("Selector reduction pass");
        let mut report = PurgeReport::default();

        for name in compilation.style_asset_names() {
            let (chunk, module_count, request) = self.prepare_request(compilation, &name)?;
            Logger::processing_asset(&name, &chunk, module_count);

            let before_bytes = request.css[0].raw.len();
            let results = self
                .purger
                .purge(request)
                .await
                .map_err(|e| e.for_asset(&name))?;
            let purged = results.into_iter().next().ok_or_else(|| {
                PurgeError::reduction(&name, "purger returned no result")
            })?;

            let after_bytes = purged.css.len();
            compilation.update_asset(&name, purged.css)?;
            Logger::asset_purged(&name, before_bytes, after_bytes);

            report.assets.push(AssetReport {
                name,
                chunk,
                module_count,
                before_bytes,
                after_bytes,
                rejected: purged.rejected,
            });
        }

        report.build_time = started.elapsed();
        Ok(report)
    }
}

/// Loads a manifest, runs the plugins over it and writes changed assets
pub struct PurgeBuildService {
    fs_service: Arc<dyn FileSystemService>,
    plugin_manager: PluginManager,
}

impl PurgeBuildService {
    pub fn new(fs_service: Arc<dyn FileSystemService>) -> Self {
        Self {
            fs_service,
            plugin_manager: PluginManager::new(),
        }
    }

    /// Register a plugin with the build service
    pub fn with_plugin(mut self, plugin: Arc<dyn crate::core::plugin::Plugin>) -> Self {
        self.plugin_manager.register(plugin);
        self
    }

    /// Run the plugins over an already assembled compilation
    pub async fn process(
        &self,
        compilation: &mut Compilation,
        context: &PluginContext,
    ) -> Result<PurgeReport> {
        self.plugin_manager.on_build_start(context)?;
        let report = self.plugin_manager.additional_assets(compilation, context).await?;
        self.plugin_manager.on_build_end(context, &report)?;
        Ok(report)
    }
}

#[async_trait::async_trait]
impl BuildService for PurgeBuildService {
    async fn build(&self, config: &BuildConfig) -> Result<BuildResult> {
        Logger::purge_start(
            &config.root.display().to_string(),
            &config.outdir.display().to_string(),
        );

        let loader = ManifestLoader::new(Arc::clone(&self.fs_service));
        let mut compilation = loader.load(config).await?;
        Logger::found_assets(
            compilation.style_asset_names().len(),
            compilation.chunks().len(),
            compilation.modules().len(),
        );

        let original: Vec<OutputAsset> = compilation.assets().to_vec();
        let context = PluginContext::new(config.clone());
        let report = self.process(&mut compilation, &context).await?;

        let mut output_files = Vec::new();
        for asset in compilation.assets() {
            let unchanged = original
                .iter()
                .any(|before| before.name == asset.name && before.source == asset.source);
            if unchanged {
                continue;
            }

            let path = config.outdir.join(&asset.name);
            if !config.dry_run {
                self.fs_service.write_file(&path, &asset.source).await?;
            }
            output_files.push(OutputFile {
                path,
                content: asset.source.clone(),
                size: asset.size(),
            });
        }

        Logger::pass_complete(report.assets.len(), report.build_time);

        Ok(BuildResult {
            report,
            output_files,
            success: true,
        })
    }
}
