use crate::core::interfaces::{CssPurger, Extractor};
use crate::core::models::{PurgeRequest, PurgeResult, RawCss};
use crate::infrastructure::processors::selector::{selector_words, SelectorWord};
use crate::utils::{Logger, PurgeError, Result, Timer};
use lightningcss::{
    rules::{style::StyleRule, CssRule, CssRuleList},
    stylesheet::{ParserOptions, PrinterOptions, StyleSheet},
    traits::ToCss,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

static VAR_REFERENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"var\(\s*(--[A-Za-z0-9_\-]+)").expect("var() pattern"));

/// Exact names plus `/regex/` entries, as written in safelists and blocklists
#[derive(Debug, Default)]
pub struct PatternList {
    exact: HashSet<String>,
    patterns: Vec<Regex>,
}

impl PatternList {
    pub fn compile(entries: &[String]) -> Result<Self> {
        let mut list = PatternList::default();

        for entry in entries {
            let entry = entry.trim();
            if entry.len() >= 2 && entry.starts_with('/') && entry.ends_with('/') {
                let pattern = Regex::new(&entry[1..entry.len() - 1]).map_err(|e| {
                    PurgeError::config(format!("Invalid selector pattern {}: {}", entry, e))
                })?;
                list.patterns.push(pattern);
            } else if !entry.is_empty() {
                let name = entry
                    .strip_prefix('.')
                    .or_else(|| entry.strip_prefix('#'))
                    .unwrap_or(entry);
                list.exact.insert(name.to_string());
            }
        }

        Ok(list)
    }

    pub fn matches(&self, word: &str) -> bool {
        self.exact.contains(word) || self.patterns.iter().any(|p| p.is_match(word))
    }
}

/// State for purging one stylesheet
struct RulePurger<'a> {
    tokens: &'a HashSet<String>,
    safelist: &'a PatternList,
    blocklist: &'a PatternList,
    preserve_elements: bool,
    collect_rejected: bool,
    rejected: Vec<String>,
}

impl<'a> RulePurger<'a> {
    /// Blocklist and safelist are consulted per word, in selector order
    fn selector_is_used(&self, words: &[SelectorWord]) -> bool {
        for word in words {
            let value = word.value();
            if self.blocklist.matches(value) {
                return false;
            }
            if self.safelist.matches(value) {
                return true;
            }
            let present = match word {
                SelectorWord::Tag(tag) => self.preserve_elements || self.tokens.contains(tag),
                _ => self.tokens.contains(value),
            };
            if !present {
                return false;
            }
        }
        true
    }

    fn purge_rules(&mut self, rules: &mut CssRuleList<'_>) -> Result<()> {
        let existing = std::mem::take(&mut rules.0);
        for mut rule in existing {
            if self.keep_rule(&mut rule)? {
                rules.0.push(rule);
            }
        }
        Ok(())
    }

    fn keep_rule(&mut self, rule: &mut CssRule<'_>) -> Result<bool> {
        match rule {
            CssRule::Style(style) => self.purge_style_rule(style),
            CssRule::Media(media) => {
                self.purge_rules(&mut media.rules)?;
                Ok(!media.rules.0.is_empty())
            }
            CssRule::Supports(supports) => {
                self.purge_rules(&mut supports.rules)?;
                Ok(!supports.rules.0.is_empty())
            }
            CssRule::LayerBlock(layer) => {
                self.purge_rules(&mut layer.rules)?;
                Ok(!layer.rules.0.is_empty())
            }
            CssRule::Container(container) => {
                self.purge_rules(&mut container.rules)?;
                Ok(!container.rules.0.is_empty())
            }
            CssRule::MozDocument(document) => {
                self.purge_rules(&mut document.rules)?;
                Ok(!document.rules.0.is_empty())
            }
            _ => Ok(true),
        }
    }

    fn purge_style_rule(&mut self, style: &mut StyleRule<'_>) -> Result<bool> {
        let mut decisions = Vec::with_capacity(style.selectors.0.len());

        for selector in style.selectors.0.iter() {
            let text = selector
                .to_css_string(PrinterOptions::default())
                .map_err(|e| PurgeError::reduction("", e.to_string()))?;
            let used = self.selector_is_used(&selector_words(&text));
            if !used && self.collect_rejected {
                self.rejected.push(text);
            }
            decisions.push(used);
        }

        if !decisions.iter().any(|used| *used) {
            return Ok(false);
        }

        let mut decisions = decisions.into_iter();
        style
            .selectors
            .0
            .retain(|_| decisions.next().unwrap_or(true));

        self.purge_rules(&mut style.rules)?;
        Ok(true)
    }
}

/// Remove custom property declarations outside `used` and `allowed`.
/// Returns how many declarations were dropped.
fn strip_variables(
    rules: &mut CssRuleList<'_>,
    used: &HashSet<String>,
    allowed: &HashSet<String>,
) -> usize {
    let mut removed = 0;

    for rule in rules.0.iter_mut() {
        let nested = match rule {
            CssRule::Style(style) => {
                let keep = |property: &lightningcss::properties::Property<'_>| {
                    let id = property.property_id();
                    let name = id.name();
                    !name.starts_with("--") || used.contains(name) || allowed.contains(name)
                };
                let before = style.declarations.declarations.len()
                    + style.declarations.important_declarations.len();
                style.declarations.declarations.retain(|p| keep(p));
                style.declarations.important_declarations.retain(|p| keep(p));
                removed += before
                    - style.declarations.declarations.len()
                    - style.declarations.important_declarations.len();
                &mut style.rules
            }
            CssRule::Media(media) => &mut media.rules,
            CssRule::Supports(supports) => &mut supports.rules,
            CssRule::LayerBlock(layer) => &mut layer.rules,
            CssRule::Container(container) => &mut container.rules,
            CssRule::MozDocument(document) => &mut document.rules,
            _ => continue,
        };
        removed += strip_variables(nested, used, allowed);
    }

    removed
}

/// Drop style rules with nothing left in them and groups with no children
fn prune_empty(rules: &mut CssRuleList<'_>) {
    rules.0.retain_mut(|rule| match rule {
        CssRule::Style(style) => {
            prune_empty(&mut style.rules);
            !(style.declarations.declarations.is_empty()
                && style.declarations.important_declarations.is_empty()
                && style.rules.0.is_empty())
        }
        CssRule::Media(media) => {
            prune_empty(&mut media.rules);
            !media.rules.0.is_empty()
        }
        CssRule::Supports(supports) => {
            prune_empty(&mut supports.rules);
            !supports.rules.0.is_empty()
        }
        CssRule::LayerBlock(layer) => {
            prune_empty(&mut layer.rules);
            !layer.rules.0.is_empty()
        }
        CssRule::Container(container) => {
            prune_empty(&mut container.rules);
            !container.rules.0.is_empty()
        }
        CssRule::MozDocument(document) => {
            prune_empty(&mut document.rules);
            !document.rules.0.is_empty()
        }
        _ => true,
    });
}

/// Run every content record through its extractor and union the tokens
pub fn collect_tokens(request: &PurgeRequest) -> Result<HashSet<String>> {
    let mut tokens = HashSet::new();

    for content in &request.content {
        let extractor: &dyn Extractor = request
            .extractors
            .iter()
            .find(|binding| binding.handles(&content.extension))
            .map(|binding| binding.extractor.as_ref())
            .unwrap_or_else(|| request.default_extractor.as_ref());

        let extracted = extractor.extract(&content.raw).map_err(|e| match e {
            PurgeError::Extractor { .. } => e,
            other => PurgeError::extractor(extractor.name(), other.to_string()),
        })?;
        tokens.extend(extracted);
    }

    Ok(tokens)
}

/// Purger built on lightningcss: keeps rules whose selectors only use
/// extracted tokens, then drops unreferenced custom properties.
pub struct LightningCssPurger;

impl LightningCssPurger {
    pub fn new() -> Self {
        Self
    }

    fn purge_stylesheet(
        &self,
        css: &RawCss,
        request: &PurgeRequest,
        tokens: &HashSet<String>,
        safelist: &PatternList,
        blocklist: &PatternList,
    ) -> Result<PurgeResult> {
        let label = css.name.as_deref().unwrap_or("<inline>");
        let _timer = Timer::start(&format!("Purging {}", label));

        let mut stylesheet = StyleSheet::parse(&css.raw, ParserOptions::default())
            .map_err(|e| PurgeError::reduction(label, e.to_string()))?;

        let mut purger = RulePurger {
            tokens,
            safelist,
            blocklist,
            preserve_elements: request.preserve_elements,
            collect_rejected: request.rejected,
            rejected: Vec::new(),
        };
        purger
            .purge_rules(&mut stylesheet.rules)
            .map_err(|e| e.for_asset(label))?;
        let rejected = purger.rejected;

        let allowed: HashSet<String> = request
            .variables
            .iter()
            .map(|name| {
                if name.starts_with("--") {
                    name.clone()
                } else {
                    format!("--{}", name)
                }
            })
            .collect();

        // Repeat until stable: dropping one variable can orphan the ones it referenced
        loop {
            let printed = stylesheet
                .to_css(PrinterOptions::default())
                .map_err(|e| PurgeError::reduction(label, e.to_string()))?;
            let used: HashSet<String> = VAR_REFERENCE
                .captures_iter(&printed.code)
                .filter_map(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
                .collect();
            if strip_variables(&mut stylesheet.rules, &used, &allowed) == 0 {
                break;
            }
        }
        prune_empty(&mut stylesheet.rules);

        let output = stylesheet
            .to_css(PrinterOptions {
                minify: request.minify,
                ..PrinterOptions::default()
            })
            .map_err(|e| PurgeError::reduction(label, e.to_string()))?;

        if !rejected.is_empty() {
            Logger::debug(&format!("{}: rejected {}", label, rejected.join(", ")));
        }

        Ok(PurgeResult {
            file: css.name.clone(),
            css: output.code,
            rejected,
        })
    }
}

impl Default for LightningCssPurger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl CssPurger for LightningCssPurger {
    async fn purge(&self, request: PurgeRequest) -> Result<Vec<PurgeResult>> {
        let tokens = collect_tokens(&request)?;
        let safelist = PatternList::compile(&request.safelist)?;
        let blocklist = PatternList::compile(&request.blocklist)?;

        request
            .css
            .iter()
            .map(|css| self.purge_stylesheet(css, &request, &tokens, &safelist, &blocklist))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::interfaces::ExtractorBinding;
    use crate::core::models::ExtractionContent;
    use crate::infrastructure::processors::extractor::{FnExtractor, TailwindExtractor};
    use std::sync::Arc;

    fn request(content: &str, css: &str) -> PurgeRequest {
        PurgeRequest {
            content: vec![ExtractionContent::new(".js", content)],
            css: vec![RawCss::named("test.css", css)],
            extractors: Vec::new(),
            default_extractor: Arc::new(TailwindExtractor),
            safelist: Vec::new(),
            blocklist: Vec::new(),
            variables: Vec::new(),
            minify: false,
            rejected: false,
            preserve_elements: false,
        }
    }

    async fn purge_one(request: PurgeRequest) -> String {
        let mut results = LightningCssPurger::new().purge(request).await.unwrap();
        assert_eq!(results.len(), 1);
        results.remove(0).css
    }

    #[tokio::test]
    async fn test_keeps_only_used_classes() {
        let css = ".text-red-500 { color: red; } .hidden { display: none; } .unused-class { color: blue; }";
        let out = purge_one(request(r#"<div class="text-red-500 hidden">"#, css)).await;

        assert!(out.contains(".text-red-500"));
        assert!(out.contains(".hidden"));
        assert!(!out.contains("unused-class"));
    }

    #[tokio::test]
    async fn test_safelist_and_blocklist() {
        let css = ".always-keep { color: red; } .banned { color: blue; } .bg-green { color: green; }";
        let mut req = request(r#"<p class="banned">"#, css);
        req.safelist = vec![".always-keep".to_string(), "/^bg-/".to_string()];
        req.blocklist = vec!["banned".to_string()];

        let out = purge_one(req).await;
        assert!(out.contains(".always-keep"));
        assert!(out.contains(".bg-green"));
        assert!(!out.contains(".banned"));
    }

    #[tokio::test]
    async fn test_selector_lists_are_trimmed() {
        let css = ".used, .unused { color: red; }";
        let out = purge_one(request("used", css)).await;
        assert!(out.contains(".used"));
        assert!(!out.contains(".unused"));
    }

    #[tokio::test]
    async fn test_empty_media_blocks_are_removed() {
        let css = "@media (min-width: 640px) { .sm-only { color: red; } } @media print { .used { color: black; } }";
        let out = purge_one(request("used", css)).await;
        assert!(!out.contains("640px"));
        assert!(out.contains("print"));
        assert!(out.contains(".used"));
    }

    #[tokio::test]
    async fn test_escaped_variant_selector() {
        let css = r".hover\:bg-red:hover { color: red; } .focus\:ring:focus { color: blue; }";
        let out = purge_one(request(r#"class="hover:bg-red""#, css)).await;
        assert!(out.contains(r"hover\:bg-red"));
        assert!(!out.contains("ring"));
    }

    #[tokio::test]
    async fn test_wordless_selectors_are_kept() {
        let css = "*, ::before { box-sizing: border-box; } :root { color: black; } h1 { margin: 0; }";
        let out = purge_one(request("nothing here", css)).await;
        assert!(out.contains("box-sizing"));
        assert!(out.contains(":root"));
        assert!(!out.contains("h1"));

        let mut req = request("nothing here", css);
        req.preserve_elements = true;
        assert!(purge_one(req).await.contains("h1"));
    }

    #[tokio::test]
    async fn test_unused_variables_are_removed() {
        let css = ":root { --used: 1px; --chained: 2px; --orphan: var(--chained); --kept: 3px; } .a { margin: var(--used); }";
        let mut req = request(r#"class="a""#, css);
        req.variables = vec!["kept".to_string()];

        let out = purge_one(req).await;
        assert!(out.contains("--used"));
        assert!(out.contains("--kept"));
        assert!(!out.contains("--orphan"));
        assert!(!out.contains("--chained"));
    }

    #[tokio::test]
    async fn test_purge_is_idempotent() {
        let css = ".a { color: red; } .b:hover { color: blue; } @media (min-width: 1px) { .a { margin: 0; } .c { padding: 0; } }";
        let first = purge_one(request("a b", css)).await;
        let second = purge_one(request("a b", &first)).await;
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_rejected_selectors_are_reported() {
        let mut req = request("a", ".a { color: red; } .b { color: blue; }");
        req.rejected = true;
        let results = LightningCssPurger::new().purge(req).await.unwrap();
        assert_eq!(results[0].rejected, vec![".b".to_string()]);
        assert_eq!(results[0].file.as_deref(), Some("test.css"));
    }

    #[tokio::test]
    async fn test_extension_bound_extractor_is_used() {
        let mut req = request("ignored", ".from-vue { color: red; } .ignored { color: blue; }");
        req.content.push(ExtractionContent::new(".vue", "anything"));
        req.extractors = vec![ExtractorBinding::new(
            ["vue"],
            Arc::new(FnExtractor::new("vue", |_| Ok(vec!["from-vue".to_string()]))),
        )];

        let out = purge_one(req).await;
        assert!(out.contains(".from-vue"));
        assert!(out.contains(".ignored"));
    }

    #[tokio::test]
    async fn test_failing_extractor_aborts() {
        let mut req = request("x", ".x { color: red; }");
        req.extractors = vec![ExtractorBinding::new(
            [".js"],
            Arc::new(FnExtractor::new("broken", |_| {
                Err(anyhow::anyhow!("bad extractor"))
            })),
        )];

        let err = LightningCssPurger::new().purge(req).await.unwrap_err();
        assert!(matches!(err, PurgeError::Extractor { ref extractor, .. } if extractor == "broken"));
    }

    #[tokio::test]
    async fn test_invalid_css_is_reduction_error() {
        let err = LightningCssPurger::new()
            .purge(request("a", "..a { color: red; }"))
            .await
            .unwrap_err();
        assert!(matches!(err, PurgeError::Reduction { ref asset, .. } if asset == "test.css"));
    }
}
