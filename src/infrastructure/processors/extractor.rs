use crate::core::interfaces::Extractor;
use crate::utils::{PurgeError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

// Liberal capture, including things like `h-(screen-1.5)`. The last character
// may not be a colon so variant prefixes such as `hover:` are not tokens.
static BROAD_MATCH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[^<>"'`\s]*[^<>"'`\s:]"#).expect("broad pattern"));

// Classes inside other delimiters, e.g. `.block(class="w-1/2")` in Pug
static INNER_MATCH: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"[^<>"'`\s.(){}\[\]#=%]*[^<>"'`\s.(){}\[\]#=%:]"#).expect("inner pattern")
});

/// Every candidate token in `content`: broad matches, the same matches with
/// trailing backslashes removed, then the inner matches.
pub fn extract_candidates(content: &str) -> Vec<String> {
    let broad: Vec<&str> = BROAD_MATCH.find_iter(content).map(|m| m.as_str()).collect();

    let mut tokens = Vec::with_capacity(broad.len() * 2);
    tokens.extend(broad.iter().map(|m| m.to_string()));
    tokens.extend(broad.iter().map(|m| m.trim_end_matches('\\').to_string()));
    tokens.extend(INNER_MATCH.find_iter(content).map(|m| m.as_str().to_string()));
    tokens
}

/// Default extractor for utility-class stylesheets
#[derive(Debug, Default, Clone, Copy)]
pub struct TailwindExtractor;

impl Extractor for TailwindExtractor {
    fn name(&self) -> &str {
        "tailwind"
    }

    fn extract(&self, content: &str) -> Result<Vec<String>> {
        Ok(extract_candidates(content))
    }
}

/// Extractor driven by one configured regular expression.
///
/// Capture group 1 is the token when the pattern has groups, otherwise the
/// whole match.
#[derive(Debug, Clone)]
pub struct RegexExtractor {
    name: String,
    pattern: Regex,
}

impl RegexExtractor {
    pub fn new(name: impl Into<String>, pattern: &str) -> Result<Self> {
        let name = name.into();
        let pattern = Regex::new(pattern).map_err(|e| {
            PurgeError::config(format!("Invalid pattern for extractor '{}': {}", name, e))
        })?;
        Ok(Self { name, pattern })
    }
}

impl Extractor for RegexExtractor {
    fn name(&self) -> &str {
        &self.name
    }

    fn extract(&self, content: &str) -> Result<Vec<String>> {
        let tokens = if self.pattern.captures_len() > 1 {
            self.pattern
                .captures_iter(content)
                .filter_map(|caps| caps.get(1))
                .map(|m| m.as_str().to_string())
                .collect()
        } else {
            self.pattern
                .find_iter(content)
                .map(|m| m.as_str().to_string())
                .collect()
        };
        Ok(tokens)
    }
}

type ExtractFn = dyn Fn(&str) -> anyhow::Result<Vec<String>> + Send + Sync;

/// Wraps a closure supplied by the host. Closure errors surface as
/// `PurgeError::Extractor` carrying this extractor's name.
pub struct FnExtractor {
    name: String,
    func: Box<ExtractFn>,
}

impl FnExtractor {
    pub fn new<F>(name: impl Into<String>, func: F) -> Self
    where
        F: Fn(&str) -> anyhow::Result<Vec<String>> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            func: Box::new(func),
        }
    }
}

impl fmt::Debug for FnExtractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnExtractor").field("name", &self.name).finish()
    }
}

impl Extractor for FnExtractor {
    fn name(&self) -> &str {
        &self.name
    }

    fn extract(&self, content: &str) -> Result<Vec<String>> {
        (self.func)(content).map_err(|e| PurgeError::extractor(&self.name, format!("{:#}", e)))
    }
}
