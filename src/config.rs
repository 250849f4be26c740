use crate::dom::Dom;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors that can occur when parsing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid selector {selector:?}: {reason}")]
    Selector {
        selector: String,
        reason: &'static str,
    },

    #[error("invalid marker class {0:?}")]
    MarkerClass(String),
}

/// The simple selectors the selection policy understands:
/// `tag`, `.class`, `[attr]` and `[attr="value"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Selector {
    Tag(String),
    Class(String),
    Attribute { name: String, value: Option<String> },
}

impl Selector {
    pub fn matches<D: Dom + ?Sized>(&self, dom: &D, node: D::Node) -> bool {
        match self {
            Selector::Tag(tag) => dom.tag(node).is_some_and(|t| t.eq_ignore_ascii_case(tag)),
            Selector::Class(class) => dom.has_class(node, class),
            Selector::Attribute { name, value } => match (dom.attribute(node, name), value) {
                (Some(actual), Some(expected)) => actual == expected,
                (Some(_), None) => true,
                (None, _) => false,
            },
        }
    }
}

fn is_ident(s: &str) -> bool {
    !s.is_empty() && s.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_')
}

impl FromStr for Selector {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason| ConfigError::Selector {
            selector: s.to_string(),
            reason,
        };
        let s = s.trim();

        if let Some(class) = s.strip_prefix('.') {
            if !is_ident(class) {
                return Err(invalid("class name must be a single identifier"));
            }
            return Ok(Selector::Class(class.to_string()));
        }

        if let Some(inner) = s.strip_prefix('[') {
            let inner = inner.strip_suffix(']').ok_or_else(|| invalid("missing closing ']'"))?;
            let (name, value) = match inner.split_once('=') {
                Some((name, value)) => {
                    let value = value.trim();
                    let unquoted = value
                        .strip_prefix('"')
                        .and_then(|v| v.strip_suffix('"'))
                        .or_else(|| value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')))
                        .unwrap_or(value);
                    (name.trim(), Some(unquoted.to_string()))
                }
                None => (inner.trim(), None),
            };
            if !is_ident(name) {
                return Err(invalid("attribute name must be a single identifier"));
            }
            return Ok(Selector::Attribute {
                name: name.to_ascii_lowercase(),
                value,
            });
        }

        if !is_ident(s) {
            return Err(invalid("expected a tag name, .class or [attribute]"));
        }
        Ok(Selector::Tag(s.to_ascii_lowercase()))
    }
}

impl TryFrom<String> for Selector {
    type Error = ConfigError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Tag(tag) => write!(f, "{tag}"),
            Selector::Class(class) => write!(f, ".{class}"),
            Selector::Attribute { name, value: None } => write!(f, "[{name}]"),
            Selector::Attribute { name, value: Some(value) } => write!(f, "[{name}=\"{value}\"]"),
        }
    }
}

impl From<Selector> for String {
    fn from(selector: Selector) -> String {
        selector.to_string()
    }
}

const ALLOWED_TAGS: &[&str] = &[
    "a", "abbr", "article", "aside", "b", "bdi",
    "blockquote", "button", "caption", "center", "cite",
    "data", "dd", "del", "details", "dfn",
    "div", "dt", "em", "figcaption", "footer",
    "h1", "h2", "h3", "h4", "h5",
    "header", "i", "ins", "label", "legend",
    "li", "main", "mark", "option", "p",
    "q", "ruby", "s", "section", "small",
    "span", "strong", "sub", "summary", "sup",
    "td", "th", "time", "u",
];

const BLOCKED: &[&str] = &[
    "code", "kbd", "pre", "rp", "rt",
    "samp", "textarea", "var",
    // explicit opt-out
    ".gadget-nospace",
    // editable regions
    "[contenteditable=\"true\"]",
    // ACE editor
    ".ace_editor",
    // VisualEditor surfaces
    ".ve-ui-surface",
];

pub const DEFAULT_MARKER_CLASS: &str = "gadget-space";

/// The built-in policy, parsed once. [`Config::default`] clones it.
pub static DEFAULT_CONFIG: Lazy<Config> = Lazy::new(|| Config {
    allowed_tags: ALLOWED_TAGS.iter().map(|t| t.to_string()).collect(),
    blocked: BLOCKED
        .iter()
        .filter_map(|s| s.parse().ok())
        .collect(),
    containers: Vec::new(),
    lang: None,
    process_title: true,
    marker_class: DEFAULT_MARKER_CLASS.to_string(),
});

/// Per-deployment selection policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Elements whose own text may be spaced.
    pub allowed_tags: Vec<String>,
    /// Elements that are never spaced, together with everything below them.
    pub blocked: Vec<Selector>,
    /// Containers to seed the initial scan with; empty means the root.
    pub containers: Vec<Selector>,
    /// Only space subtrees whose inherited `lang` matches, e.g. `zh`.
    pub lang: Option<String>,
    pub process_title: bool,
    pub marker_class: String,
}

impl Default for Config {
    fn default() -> Self {
        DEFAULT_CONFIG.clone()
    }
}

impl Config {
    /// Parse a JSON config; absent fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let mut config: Config = serde_json::from_str(json)?;
        if !is_ident(&config.marker_class) {
            return Err(ConfigError::MarkerClass(config.marker_class));
        }
        for tag in &mut config.allowed_tags {
            tag.make_ascii_lowercase();
        }
        Ok(config)
    }

    pub fn is_marker<D: Dom + ?Sized>(&self, dom: &D, node: D::Node) -> bool {
        dom.has_class(node, &self.marker_class)
    }

    /// The element itself matches a blocked selector.
    pub fn is_blocked<D: Dom + ?Sized>(&self, dom: &D, node: D::Node) -> bool {
        dom.tag(node).is_some() && self.blocked.iter().any(|s| s.matches(dom, node))
    }

    pub fn is_allowed_tag(&self, tag: &str) -> bool {
        self.allowed_tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }

    /// Whether a `lang` attribute value falls under the configured language,
    /// with the `:lang()` prefix rule (`zh` matches `zh-Hant`).
    pub fn lang_matches(&self, lang: &str) -> bool {
        let Some(wanted) = &self.lang else {
            return true;
        };
        lang.eq_ignore_ascii_case(wanted)
            || (lang.len() > wanted.len()
                && lang.is_char_boundary(wanted.len())
                && lang[..wanted.len()].eq_ignore_ascii_case(wanted)
                && lang[wanted.len()..].starts_with('-'))
    }

    /// Whether `node` would be picked by the selection policy: an allowed
    /// tag, not a marker, neither it nor any ancestor blocked, and inside
    /// the configured language.
    pub fn is_eligible<D: Dom + ?Sized>(&self, dom: &D, node: D::Node) -> bool {
        let Some(tag) = dom.tag(node) else {
            return false;
        };
        if !self.is_allowed_tag(tag) || self.is_marker(dom, node) {
            return false;
        }

        let mut lang = None;
        let mut current = Some(node);
        while let Some(n) = current {
            if self.is_blocked(dom, n) {
                return false;
            }
            if lang.is_none() {
                lang = dom.attribute(n, "lang");
            }
            current = dom.parent_element(n);
        }

        match (&self.lang, lang) {
            (None, _) => true,
            (Some(_), Some(lang)) => self.lang_matches(lang),
            (Some(_), None) => false,
        }
    }
}
