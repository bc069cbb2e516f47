//! Localized message bundles.
//!
//! Bundles are TOML files under `locales/`, embedded at compile time and
//! flattened to dotted keys (`[errors] guildOnly = ".."` becomes
//! `errors.guildOnly`). Templates use positional `{0}`, `{1}` placeholders.

use std::collections::HashMap;
use std::fmt::Display;
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

/// Locale codes with an embedded bundle.
pub const AVAILABLE: &[&str] = &["en_US", "nl_NL"];

const SOURCES: &[(&str, &str)] = &[
    ("en_US", include_str!("../../locales/en_US.toml")),
    ("nl_NL", include_str!("../../locales/nl_NL.toml")),
];

#[derive(Debug, Error)]
pub enum I18nError {
    #[error("language bundle {code} is malformed: {source}")]
    Parse {
        code: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("no language bundle for locale {0}")]
    UnknownLocale(String),
}

/// One locale's flattened messages.
#[derive(Debug)]
pub struct LanguageBundle {
    code: String,
    entries: HashMap<String, String>,
}

impl LanguageBundle {
    pub fn parse(code: &str, source: &str) -> Result<Self, I18nError> {
        let table: toml::Table = toml::from_str(source).map_err(|e| I18nError::Parse {
            code: code.to_string(),
            source: e,
        })?;
        let mut entries = HashMap::new();
        for (key, value) in &table {
            flatten(key, value, &mut entries);
        }
        Ok(Self {
            code: code.to_string(),
            entries,
        })
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

}

fn flatten(path: &str, value: &toml::Value, out: &mut HashMap<String, String>) {
    match value {
        toml::Value::Table(table) => {
            for (key, nested) in table {
                flatten(&format!("{path}.{key}"), nested, out);
            }
        }
        toml::Value::String(s) => {
            out.insert(path.to_string(), s.clone());
        }
        toml::Value::Array(items) => {
            let lines: Vec<String> = items
                .iter()
                .map(|v| match v {
                    toml::Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect();
            out.insert(path.to_string(), lines.join("\n"));
        }
        other => {
            out.insert(path.to_string(), other.to_string());
        }
    }
}

/// Substitute positional `{n}` placeholders.
///
/// Only placeholders written in `template` are replaced; braces inside the
/// arguments are copied verbatim. Placeholders without a matching argument
/// are left as they are.
pub fn render(template: &str, args: &[&dyn Display]) -> String {
    let mut rendered = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        rendered.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let placeholder = after.find('}').and_then(|close| {
            let index = &after[..close];
            if index.is_empty() || !index.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            let arg = args.get(index.parse::<usize>().ok()?)?;
            Some((arg, close))
        });
        match placeholder {
            Some((arg, close)) => {
                rendered.push_str(&arg.to_string());
                rest = &after[close + 1..];
            }
            None => {
                rendered.push('{');
                rest = after;
            }
        }
    }
    rendered.push_str(rest);
    rendered
}

/// All loaded bundles plus the default used for fallback.
#[derive(Debug)]
pub struct Languages {
    default: Arc<LanguageBundle>,
    bundles: HashMap<String, Arc<LanguageBundle>>,
}

impl Languages {
    /// Load the embedded bundles with `default_code` as the fallback.
    pub fn embedded(default_code: &str) -> Result<Self, I18nError> {
        let bundles = SOURCES
            .iter()
            .map(|(code, source)| {
                LanguageBundle::parse(code, source).map(|b| (code.to_string(), Arc::new(b)))
            })
            .collect::<Result<HashMap<_, _>, _>>()?;
        Self::from_bundles(bundles, default_code)
    }

    pub fn from_bundles(
        bundles: HashMap<String, Arc<LanguageBundle>>,
        default_code: &str,
    ) -> Result<Self, I18nError> {
        let default = bundles
            .get(default_code)
            .cloned()
            .ok_or_else(|| I18nError::UnknownLocale(default_code.to_string()))?;
        Ok(Self { default, bundles })
    }

    #[cfg(test)]
    pub fn default_bundle(&self) -> &Arc<LanguageBundle> {
        &self.default
    }

    /// The bundle for `code`, or the default when unset or unknown.
    pub fn resolve(&self, code: Option<&str>) -> Arc<LanguageBundle> {
        code.and_then(|c| self.bundles.get(c))
            .cloned()
            .unwrap_or_else(|| Arc::clone(&self.default))
    }

    /// Look `key` up in `active`, falling back to the default bundle and
    /// finally to the key itself.
    pub fn translate(&self, active: &LanguageBundle, key: &str, args: &[&dyn Display]) -> String {
        if let Some(template) = active.get(key) {
            return render(template, args);
        }
        if let Some(template) = self.default.get(key) {
            if active.code() != self.default.code() {
                warn!(
                    locale = active.code(),
                    key, "Missing translation, using default language"
                );
            }
            return render(template, args);
        }
        warn!(locale = active.code(), key, "Missing translation in every bundle");
        key.to_string()
    }
}
