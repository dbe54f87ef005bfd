//! Spring configuration files: `application*.properties`, `application*.yml` and XML bean
//! definitions.
//!
//! YAML is read with `serde_yaml` and flattened into the dotted keys Spring itself uses
//! (`server.port`, `spring.datasource.url`, list items as `key[0]`). Properties follow the
//! `java.util.Properties` line format. XML files are only searched for `<bean>` elements;
//! an XML file without a `<beans>` root is not configuration.

use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_yaml::Value;
use std::collections::BTreeMap;

/// Shown instead of the value of keys that look like credentials.
pub const MASK: &str = "******";

/// Key fragments whose values are never reported.
const SENSITIVE: &[&str] = &[
    "password",
    "passwd",
    "secret",
    "token",
    "credential",
    "api-key",
    "apikey",
    "private-key",
];

static XML_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static XML_BEAN: Lazy<Regex> = Lazy::new(|| Regex::new(r"<bean\b([^>]*)>").unwrap());
static XML_ATTRIBUTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\b(id|name|class|scope)\s*=\s*(?:"([^"]*)"|'([^']*)')"#).unwrap()
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigFormat {
    Properties,
    Yaml,
    Xml,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigProperty {
    pub key: String,
    pub value: String,
    /// Profile of the YAML document the key was declared in, when it names one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
}

/// A `<bean>` element of an XML application context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct XmlBean {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// One analyzed configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigFile {
    pub path: String,
    pub format: ConfigFormat,
    /// From the file name: `dev` for `application-dev.yml`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    /// In declaration order; credentials masked
    pub properties: Vec<ConfigProperty>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub beans: Vec<XmlBean>,
    /// Parse error of a malformed file; `properties` then holds what was read before it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConfigFile {
    /// Last value declared for `key`, as Spring would resolve it without profiles.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .rev()
            .find(|p| p.key == key && p.profile.is_none())
            .map(|p| p.value.as_str())
    }
}

/// True for file names worth handing to [`analyze_config`].
pub fn is_config_file(name: &str) -> bool {
    let Some((stem, extension)) = name.rsplit_once('.') else {
        return false;
    };
    match extension {
        "properties" | "yml" | "yaml" => {
            stem == "application"
                || stem == "bootstrap"
                || stem.starts_with("application-")
                || stem.starts_with("bootstrap-")
        }
        "xml" => name != "pom.xml",
        _ => false,
    }
}

/// Analyzes one configuration file. Returns `None` when `path` is not a configuration
/// file, including XML without a `<beans>` element.
pub fn analyze_config(path: &str, text: &str) -> Option<ConfigFile> {
    let name = file_name(path);
    let (stem, extension) = name.rsplit_once('.')?;
    let format = match extension {
        "properties" => ConfigFormat::Properties,
        "yml" | "yaml" => ConfigFormat::Yaml,
        "xml" if text.contains("<beans") => ConfigFormat::Xml,
        _ => return None,
    };

    let mut file = ConfigFile {
        path: path.to_string(),
        format,
        profile: stem
            .split_once('-')
            .map(|(_, profile)| profile.to_string())
            .filter(|p| !p.is_empty() && format != ConfigFormat::Xml),
        properties: Vec::new(),
        beans: Vec::new(),
        error: None,
    };

    match format {
        ConfigFormat::Properties => {
            file.properties = parse_properties(text)
                .into_iter()
                .map(|(key, value)| property(key, value, None))
                .collect();
        }
        ConfigFormat::Yaml => {
            if let Err(e) = read_yaml(text, &mut file.properties) {
                warn!("Malformed YAML in {}: {}", path, e);
                file.error = Some(e.to_string());
            }
        }
        ConfigFormat::Xml => file.beans = parse_beans(text),
    }

    debug!(
        "Read {} propert(ies) and {} bean(s) from {}",
        file.properties.len(),
        file.beans.len(),
        path
    );
    Some(file)
}

/// Every configuration file of a name-to-content listing, in listing order.
pub fn analyze_listing(files: &BTreeMap<String, String>) -> Vec<ConfigFile> {
    files
        .iter()
        .filter(|(path, _)| is_config_file(file_name(path)))
        .filter_map(|(path, text)| analyze_config(path, text))
        .collect()
}

fn file_name(path: &str) -> &str {
    path.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or(path)
}

fn property(key: String, value: String, profile: Option<String>) -> ConfigProperty {
    let lowered = key.to_ascii_lowercase();
    let value = if SENSITIVE.iter().any(|s| lowered.contains(s)) && !value.is_empty() {
        MASK.to_string()
    } else {
        value
    };
    ConfigProperty {
        key,
        value,
        profile,
    }
}

fn read_yaml(text: &str, out: &mut Vec<ConfigProperty>) -> Result<(), serde_yaml::Error> {
    for document in serde_yaml::Deserializer::from_str(text) {
        let value = Value::deserialize(document)?;
        let mut flat = Vec::new();
        flatten("", &value, &mut flat);

        let profile = flat
            .iter()
            .find(|(key, _)| key == "spring.config.activate.on-profile" || key == "spring.profiles")
            .map(|(_, value)| value.clone());
        out.extend(
            flat.into_iter()
                .map(|(key, value)| property(key, value, profile.clone())),
        );
    }
    Ok(())
}

fn flatten(prefix: &str, value: &Value, out: &mut Vec<(String, String)>) {
    match value {
        Value::Mapping(map) => {
            for (key, nested) in map {
                let key = scalar_text(key);
                let full = if prefix.is_empty() {
                    key
                } else {
                    format!("{}.{}", prefix, key)
                };
                flatten(&full, nested, out);
            }
        }
        Value::Sequence(items) => {
            for (i, item) in items.iter().enumerate() {
                flatten(&format!("{}[{}]", prefix, i), item, out);
            }
        }
        Value::Tagged(tagged) => flatten(prefix, &tagged.value, out),
        scalar if !prefix.is_empty() => out.push((prefix.to_string(), scalar_text(scalar))),
        _ => {}
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .map(|s| s.trim_end().to_string())
            .unwrap_or_default(),
    }
}

/// `key=value` pairs in `java.util.Properties` line format: `=`, `:` or whitespace
/// separate key from value, `#` and `!` start comments, a trailing backslash continues the
/// line.
pub fn parse_properties(text: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut logical = String::new();

    for line in text.lines() {
        let line = line.trim_start();
        if logical.is_empty() && (line.is_empty() || line.starts_with('#') || line.starts_with('!'))
        {
            continue;
        }

        let trailing = line.chars().rev().take_while(|c| *c == '\\').count();
        if trailing % 2 == 1 {
            logical.push_str(&line[..line.len() - 1]);
            continue;
        }
        logical.push_str(line);
        pairs.push(split_property(&logical));
        logical.clear();
    }
    if !logical.is_empty() {
        pairs.push(split_property(&logical));
    }
    pairs
}

fn split_property(line: &str) -> (String, String) {
    let mut key = String::new();
    let mut chars = line.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(escaped) = chars.next() {
                    key.push(unescape(escaped, &mut chars));
                }
            }
            '=' | ':' => break,
            c if c.is_whitespace() => {
                while chars.peek().map_or(false, |c| c.is_whitespace()) {
                    chars.next();
                }
                if matches!(chars.peek(), Some('=') | Some(':')) {
                    chars.next();
                }
                break;
            }
            c => key.push(c),
        }
    }

    while chars.peek().map_or(false, |c| c.is_whitespace()) {
        chars.next();
    }
    let mut value = String::new();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(escaped) = chars.next() {
                value.push(unescape(escaped, &mut chars));
            }
        } else {
            value.push(c);
        }
    }
    (key, value.trim_end().to_string())
}

fn unescape(escaped: char, rest: &mut std::iter::Peekable<std::str::Chars<'_>>) -> char {
    match escaped {
        't' => '\t',
        'n' => '\n',
        'r' => '\r',
        'f' => '\u{c}',
        'u' => {
            let hex: String = (0..4).filter_map(|_| rest.next()).collect();
            u32::from_str_radix(&hex, 16)
                .ok()
                .and_then(char::from_u32)
                .unwrap_or(char::REPLACEMENT_CHARACTER)
        }
        other => other,
    }
}

fn parse_beans(text: &str) -> Vec<XmlBean> {
    let text = XML_COMMENT.replace_all(text, "");
    XML_BEAN
        .captures_iter(&text)
        .filter_map(|caps| {
            let mut bean = XmlBean {
                id: None,
                class: None,
                scope: None,
            };
            for attr in XML_ATTRIBUTE.captures_iter(&caps[1]) {
                let value = attr
                    .get(2)
                    .or_else(|| attr.get(3))
                    .map(|m| m.as_str().to_string());
                match &attr[1] {
                    "id" => bean.id = value,
                    // `name` may list several aliases; the first one names the bean
                    "name" if bean.id.is_none() => {
                        bean.id = value.and_then(|v| {
                            v.split([',', ';', ' ']).find(|s| !s.is_empty()).map(str::to_string)
                        })
                    }
                    "class" => bean.class = value,
                    "scope" => bean.scope = value,
                    _ => {}
                }
            }
            (bean.id.is_some() || bean.class.is_some()).then_some(bean)
        })
        .collect()
}
