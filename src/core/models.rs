use crate::core::interfaces::{Extractor, ExtractorBinding};
use crate::utils::{PurgeError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;

/// Assets and module resources with this suffix are stylesheets
pub const STYLESHEET_EXTENSION: &str = ".css";

/// Module type tag the bundler gives to injected bootstrap code
pub const RUNTIME_MODULE_TYPE: &str = "runtime";

/// Membership test over the output files of a chunk.
///
/// Bundlers expose chunk files either as a set or as an ordered list; the
/// resolver only ever needs `contains_file`.
pub trait FileMembership {
    fn contains_file(&self, name: &str) -> bool;
}

impl FileMembership for HashSet<String> {
    fn contains_file(&self, name: &str) -> bool {
        self.contains(name)
    }
}

impl FileMembership for BTreeSet<String> {
    fn contains_file(&self, name: &str) -> bool {
        self.contains(name)
    }
}

impl FileMembership for [String] {
    fn contains_file(&self, name: &str) -> bool {
        self.iter().any(|file| file == name)
    }
}

impl FileMembership for Vec<String> {
    fn contains_file(&self, name: &str) -> bool {
        self.as_slice().contains_file(name)
    }
}

/// Output files of a chunk, normalized from either representation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub enum ChunkFiles {
    Set(BTreeSet<String>),
    Sequence(Vec<String>),
}

impl ChunkFiles {
    pub fn iter(&self) -> Box<dyn Iterator<Item = &String> + '_> {
        match self {
            ChunkFiles::Set(files) => Box::new(files.iter()),
            ChunkFiles::Sequence(files) => Box::new(files.iter()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            ChunkFiles::Set(files) => files.len(),
            ChunkFiles::Sequence(files) => files.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FileMembership for ChunkFiles {
    fn contains_file(&self, name: &str) -> bool {
        match self {
            ChunkFiles::Set(files) => files.contains_file(name),
            ChunkFiles::Sequence(files) => files.contains_file(name),
        }
    }
}

impl Default for ChunkFiles {
    fn default() -> Self {
        ChunkFiles::Sequence(Vec::new())
    }
}

impl From<Vec<String>> for ChunkFiles {
    fn from(files: Vec<String>) -> Self {
        ChunkFiles::Sequence(files)
    }
}

impl From<BTreeSet<String>> for ChunkFiles {
    fn from(files: BTreeSet<String>) -> Self {
        ChunkFiles::Set(files)
    }
}

impl From<HashSet<String>> for ChunkFiles {
    fn from(files: HashSet<String>) -> Self {
        ChunkFiles::Set(files.into_iter().collect())
    }
}

impl From<ChunkFiles> for Vec<String> {
    fn from(files: ChunkFiles) -> Self {
        match files {
            ChunkFiles::Set(files) => files.into_iter().collect(),
            ChunkFiles::Sequence(files) => files,
        }
    }
}

/// A bundler compilation unit
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub id: String,
    pub runtime: Option<String>,
    pub files: ChunkFiles,
    pub entry_module: Option<String>,
    /// Module ids in the order the bundler assigned them to this chunk
    pub modules: Vec<String>,
}

impl Chunk {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            runtime: None,
            files: ChunkFiles::default(),
            entry_module: None,
            modules: Vec::new(),
        }
    }

    pub fn with_runtime(mut self, runtime: impl Into<String>) -> Self {
        self.runtime = Some(runtime.into());
        self
    }

    pub fn with_files(mut self, files: impl Into<ChunkFiles>) -> Self {
        self.files = files.into();
        self
    }

    pub fn with_entry_module(mut self, module_id: impl Into<String>) -> Self {
        self.entry_module = Some(module_id.into());
        self
    }

    pub fn with_modules<I, S>(mut self, modules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.modules = modules.into_iter().map(Into::into).collect();
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ModuleType {
    JavaScript,
    Css,
    Asset,
    Runtime,
    Other(String),
}

impl ModuleType {
    /// Map a bundler type tag such as `javascript/auto` or `css/mini-extract`
    pub fn from_tag(tag: &str) -> Self {
        let lowered = tag.to_lowercase();
        match lowered.as_str() {
            RUNTIME_MODULE_TYPE => ModuleType::Runtime,
            t if t.starts_with("javascript") => ModuleType::JavaScript,
            t if t.starts_with("css") => ModuleType::Css,
            t if t.starts_with("asset") => ModuleType::Asset,
            _ => ModuleType::Other(tag.to_string()),
        }
    }

    pub fn is_runtime(&self) -> bool {
        matches!(self, ModuleType::Runtime)
    }
}

/// A unit of input source as the bundler recorded it
#[derive(Debug, Clone, PartialEq)]
pub struct SourceModule {
    pub id: String,
    pub module_type: ModuleType,
    /// Resolved file path; `None` for runtime-injected modules
    pub resource: Option<PathBuf>,
    /// Explicit grouping context; defaults to the resource's directory
    pub context: Option<PathBuf>,
    pub source: String,
}

impl SourceModule {
    pub fn new(id: impl Into<String>, module_type: ModuleType) -> Self {
        Self {
            id: id.into(),
            module_type,
            resource: None,
            context: None,
            source: String::new(),
        }
    }

    /// A JavaScript module whose id is its resource path
    pub fn javascript(resource: impl Into<PathBuf>, source: impl Into<String>) -> Self {
        let resource = resource.into();
        Self {
            id: resource.to_string_lossy().to_string(),
            module_type: ModuleType::JavaScript,
            resource: Some(resource),
            context: None,
            source: source.into(),
        }
    }

    pub fn with_resource(mut self, resource: impl Into<PathBuf>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    pub fn with_context(mut self, context: impl Into<PathBuf>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = source.into();
        self
    }

    pub fn context(&self) -> Option<&Path> {
        self.context
            .as_deref()
            .or_else(|| self.resource.as_deref().and_then(Path::parent))
    }

    /// Extension of the resource including the leading dot, or empty
    pub fn extension(&self) -> String {
        self.resource
            .as_deref()
            .and_then(Path::extension)
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext))
            .unwrap_or_default()
    }

    pub fn is_stylesheet(&self) -> bool {
        self.resource
            .as_deref()
            .map(|path| path.to_string_lossy().ends_with(STYLESHEET_EXTENSION))
            .unwrap_or(false)
    }

    /// Whether this module's text counts as class usage
    pub fn is_usage_candidate(&self) -> bool {
        !self.module_type.is_runtime() && self.resource.is_some() && !self.is_stylesheet()
    }

    pub fn to_content(&self) -> ExtractionContent {
        ExtractionContent::new(self.extension(), self.source.clone())
    }
}

/// A named output artifact of the compilation
#[derive(Debug, Clone, PartialEq)]
pub struct OutputAsset {
    pub name: String,
    pub source: String,
}

impl OutputAsset {
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: source.into(),
        }
    }

    pub fn is_stylesheet(&self) -> bool {
        self.name.ends_with(STYLESHEET_EXTENSION)
    }

    pub fn size(&self) -> usize {
        self.source.len()
    }
}

/// The bundler's view of one build: chunks, modules and emitted assets,
/// each kept in registration order.
#[derive(Debug, Clone, Default)]
pub struct Compilation {
    chunks: Vec<Chunk>,
    modules: Vec<SourceModule>,
    assets: Vec<OutputAsset>,
}

impl Compilation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chunk(mut self, chunk: Chunk) -> Self {
        self.add_chunk(chunk);
        self
    }

    pub fn with_module(mut self, module: SourceModule) -> Self {
        self.add_module(module);
        self
    }

    pub fn with_asset(mut self, name: impl Into<String>, source: impl Into<String>) -> Self {
        self.emit_asset(name, source);
        self
    }

    pub fn add_chunk(&mut self, chunk: Chunk) {
        self.chunks.push(chunk);
    }

    pub fn add_module(&mut self, module: SourceModule) {
        self.modules.push(module);
    }

    /// Emit an asset, replacing the content of an existing one with the same name
    pub fn emit_asset(&mut self, name: impl Into<String>, source: impl Into<String>) {
        let name = name.into();
        let source = source.into();
        match self.assets.iter_mut().find(|asset| asset.name == name) {
            Some(asset) => asset.source = source,
            None => self.assets.push(OutputAsset::new(name, source)),
        }
    }

    /// Replace the content of an already emitted asset
    pub fn update_asset(&mut self, name: &str, source: String) -> Result<()> {
        let asset = self
            .assets
            .iter_mut()
            .find(|asset| asset.name == name)
            .ok_or_else(|| PurgeError::Build(format!("Asset '{}' was never emitted", name)))?;
        asset.source = source;
        Ok(())
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    pub fn modules(&self) -> &[SourceModule] {
        &self.modules
    }

    pub fn assets(&self) -> &[OutputAsset] {
        &self.assets
    }

    pub fn asset(&self, name: &str) -> Option<&OutputAsset> {
        self.assets.iter().find(|asset| asset.name == name)
    }

    pub fn module(&self, id: &str) -> Option<&SourceModule> {
        self.modules.iter().find(|module| module.id == id)
    }

    pub fn style_asset_names(&self) -> Vec<String> {
        self.assets
            .iter()
            .filter(|asset| asset.is_stylesheet())
            .map(|asset| asset.name.clone())
            .collect()
    }
}

/// Text handed to an extractor, tagged with the extension of its origin
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractionContent {
    pub extension: String,
    #[serde(alias = "rawText")]
    pub raw: String,
}

impl ExtractionContent {
    pub fn new(extension: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            extension: extension.into(),
            raw: raw.into(),
        }
    }

    /// Extension without the leading dot, lowercased
    pub fn normalized_extension(&self) -> String {
        normalize_extension(&self.extension)
    }
}

pub fn normalize_extension(extension: &str) -> String {
    extension.trim_start_matches('.').to_lowercase()
}

/// How a stylesheet is mapped to the modules that use it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolutionStrategy {
    /// Modules sharing the owning chunk's entry context, with runtime fallback
    #[default]
    Context,
    /// Modules the bundler placed in the owning chunk
    ChunkModules,
}

impl FromStr for ResolutionStrategy {
    type Err = String;

    fn from_str(value: &str) -> std::result::Result<Self, Self::Err> {
        match value {
            "context" => Ok(ResolutionStrategy::Context),
            "chunk-modules" => Ok(ResolutionStrategy::ChunkModules),
            other => Err(format!(
                "unknown resolution strategy '{}' (expected 'context' or 'chunk-modules')",
                other
            )),
        }
    }
}

/// Extra content and extractors for chunks built for one runtime
#[derive(Debug, Clone, Default)]
pub struct RuntimeOverrides {
    pub content: Vec<ExtractionContent>,
    pub extractors: Vec<ExtractorBinding>,
}

impl RuntimeOverrides {
    pub fn with_content(mut self, content: ExtractionContent) -> Self {
        self.content.push(content);
        self
    }

    pub fn with_extractor(mut self, binding: ExtractorBinding) -> Self {
        self.extractors.push(binding);
        self
    }
}

/// Purge configuration. Frozen once the reducer is built.
#[derive(Debug, Clone, Default)]
pub struct PurgeOptions {
    pub safelist: Vec<String>,
    pub blocklist: Vec<String>,
    /// Custom properties kept even when nothing references them
    pub variables: Vec<String>,
    /// Overrides keyed by runtime identifier
    pub modules: HashMap<String, RuntimeOverrides>,
    pub extractors: Vec<ExtractorBinding>,
    pub strategy: ResolutionStrategy,
    pub minify: bool,
    pub rejected: bool,
    /// Keep selectors whose only unknown words are element names
    pub preserve_elements: bool,
}

impl PurgeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_safelist<I, S>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.safelist.extend(entries.into_iter().map(Into::into));
        self
    }

    pub fn with_blocklist<I, S>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.blocklist.extend(entries.into_iter().map(Into::into));
        self
    }

    pub fn with_variables<I, S>(mut self, entries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.variables.extend(entries.into_iter().map(Into::into));
        self
    }

    pub fn with_runtime(mut self, runtime: impl Into<String>, overrides: RuntimeOverrides) -> Self {
        self.modules.insert(runtime.into(), overrides);
        self
    }

    pub fn with_extractor(mut self, binding: ExtractorBinding) -> Self {
        self.extractors.push(binding);
        self
    }

    pub fn with_strategy(mut self, strategy: ResolutionStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_minify(mut self, minify: bool) -> Self {
        self.minify = minify;
        self
    }

    pub fn with_rejected(mut self, rejected: bool) -> Self {
        self.rejected = rejected;
        self
    }

    pub fn with_preserve_elements(mut self, preserve: bool) -> Self {
        self.preserve_elements = preserve;
        self
    }
}

/// Raw stylesheet handed to the purger
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawCss {
    pub name: Option<String>,
    pub raw: String,
}

impl RawCss {
    pub fn named(name: impl Into<String>, raw: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            raw: raw.into(),
        }
    }
}

/// One call into the purger. Owns copies of every list it needs.
#[derive(Debug, Clone)]
pub struct PurgeRequest {
    pub content: Vec<ExtractionContent>,
    pub css: Vec<RawCss>,
    pub extractors: Vec<ExtractorBinding>,
    pub default_extractor: Arc<dyn Extractor>,
    pub safelist: Vec<String>,
    pub blocklist: Vec<String>,
    pub variables: Vec<String>,
    pub minify: bool,
    pub rejected: bool,
    pub preserve_elements: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurgeResult {
    pub file: Option<String>,
    pub css: String,
    pub rejected: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct AssetReport {
    pub name: String,
    pub chunk: String,
    pub module_count: usize,
    pub before_bytes: usize,
    pub after_bytes: usize,
    pub rejected: Vec<String>,
}

impl AssetReport {
    pub fn reduction_percentage(&self) -> f64 {
        if self.before_bytes == 0 {
            return 0.0;
        }
        (self.before_bytes.saturating_sub(self.after_bytes) as f64 / self.before_bytes as f64)
            * 100.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct PurgeReport {
    pub assets: Vec<AssetReport>,
    pub build_time: std::time::Duration,
}

impl PurgeReport {
    pub fn total_before(&self) -> usize {
        self.assets.iter().map(|a| a.before_bytes).sum()
    }

    pub fn total_after(&self) -> usize {
        self.assets.iter().map(|a| a.after_bytes).sum()
    }
}

impl std::fmt::Display for PurgeReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Purge: {} CSS assets, {} → {} bytes",
            self.assets.len(),
            self.total_before(),
            self.total_after()
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuildConfig {
    #[serde(default = "default_root")]
    pub root: PathBuf,
    #[serde(default = "default_outdir")]
    pub outdir: PathBuf,
    /// Build manifest describing chunks and modules
    #[serde(default = "default_manifest")]
    pub manifest: PathBuf,
    /// Run the pass without writing assets back
    #[serde(default)]
    pub dry_run: bool,
}

fn default_root() -> PathBuf {
    PathBuf::from(".")
}

fn default_outdir() -> PathBuf {
    PathBuf::from("dist")
}

fn default_manifest() -> PathBuf {
    PathBuf::from("dist/manifest.json")
}

impl Default for BuildConfig {
    fn default() -> Self {
        Self {
            root: default_root(),
            outdir: default_outdir(),
            manifest: default_manifest(),
            dry_run: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutputFile {
    pub path: PathBuf,
    pub content: String,
    pub size: usize,
}

#[derive(Debug, Default)]
pub struct BuildResult {
    pub report: PurgeReport,
    pub output_files: Vec<OutputFile>,
    pub success: bool,
}
