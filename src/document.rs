use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Metadata keys consulted, in order, when a document has no title
const TITLE_FALLBACK_KEYS: &[&str] = &["case_number", "nomor_putusan"];
const UNTITLED: &str = "Untitled Document";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Contract,
    Policy,
    Agreement,
    #[default]
    Regulation,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Contract,
        Category::Policy,
        Category::Agreement,
        Category::Regulation,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Category::Contract => "contract",
            Category::Policy => "policy",
            Category::Agreement => "agreement",
            Category::Regulation => "regulation",
        }
    }

    /// Unknown names fall back to `Regulation`, the store's default.
    pub fn parse_lossy(s: &str) -> Self {
        let s = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .unwrap_or_default()
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(d)?;
        Ok(raw.map(|s| Category::parse_lossy(&s)).unwrap_or_default())
    }
}

/// A single metadata value. Arbitrary JSON is folded into these four shapes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Text(String),
    Number(f64),
    List(Vec<String>),
    Absent,
}

impl MetadataValue {
    /// Human-readable form, `None` when there is nothing worth showing
    pub fn display(&self) -> Option<String> {
        match self {
            MetadataValue::Text(s) if s.trim().is_empty() => None,
            MetadataValue::Text(s) => Some(s.clone()),
            MetadataValue::Number(n) if n.fract() == 0.0 && n.abs() < 1e15 => {
                Some(format!("{}", *n as i64))
            }
            MetadataValue::Number(n) => Some(n.to_string()),
            MetadataValue::List(items) if items.is_empty() => None,
            MetadataValue::List(items) => Some(items.join(", ")),
            MetadataValue::Absent => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            MetadataValue::Text(s) => Some(s.as_str()),
            _ => None,
        }
    }
}

impl From<Value> for MetadataValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => MetadataValue::Absent,
            Value::String(s) => MetadataValue::Text(s),
            Value::Number(n) => n
                .as_f64()
                .map(MetadataValue::Number)
                .unwrap_or_else(|| MetadataValue::Text(n.to_string())),
            Value::Bool(b) => MetadataValue::Text(b.to_string()),
            Value::Array(items) => MetadataValue::List(
                items
                    .into_iter()
                    .filter(|v| !v.is_null())
                    .map(|v| match v {
                        Value::String(s) => s,
                        other => other.to_string(),
                    })
                    .collect(),
            ),
            obj @ Value::Object(_) => MetadataValue::Text(obj.to_string()),
        }
    }
}

impl<'de> Deserialize<'de> for MetadataValue {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        Value::deserialize(d).map(MetadataValue::from)
    }
}

pub type Metadata = BTreeMap<String, MetadataValue>;

/// A stored document. The store owns these; the search path only reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default)]
    pub category: Category,
    #[serde(
        rename = "dateAdded",
        alias = "date_added",
        default = "Utc::now",
        deserialize_with = "deserialize_date"
    )]
    pub date_added: DateTime<Utc>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_url: Option<String>,
    #[serde(default, deserialize_with = "deserialize_metadata")]
    pub metadata: Metadata,
}

impl Document {
    /// Title for display: the title, a case-number style metadata key, or a placeholder
    pub fn display_title(&self) -> String {
        if !self.title.trim().is_empty() {
            return self.title.clone();
        }
        TITLE_FALLBACK_KEYS
            .iter()
            .filter_map(|key| self.metadata.get(*key))
            .find_map(|v| v.display())
            .unwrap_or_else(|| UNTITLED.to_string())
    }

    /// Link to the original file, preferring the metadata copy
    pub fn download_url(&self) -> Option<&str> {
        self.metadata
            .get("file_url")
            .and_then(|v| v.as_text())
            .filter(|s| !s.is_empty())
            .or(self.file_url.as_deref().filter(|s| !s.is_empty()))
    }

    /// Text sent to the embedding provider when indexing
    pub fn embedding_text(&self) -> String {
        format!("{} {}", self.title, self.content).trim().to_string()
    }
}

/// Raw similarity search hit
#[derive(Debug, Clone, PartialEq)]
pub struct Match {
    pub document: Document,
    pub similarity: f64,
}

/// A ranked, presentation-ready hit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResult {
    pub document: Document,
    pub relevance_score: u8,
    pub matched_segments: Vec<String>,
}

/// `"tanggal_putusan"` -> `"Tanggal Putusan"`
pub fn format_metadata_key(key: &str) -> String {
    key.split('_')
        .filter(|w| !w.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

fn deserialize_id<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    match Value::deserialize(d)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Null => Ok(String::new()),
        other => Err(serde::de::Error::custom(format!(
            "document id must be a string or number, got {}",
            other
        ))),
    }
}

fn deserialize_date<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
    let raw = Option::<String>::deserialize(d)?;
    Ok(raw.as_deref().and_then(parse_date).unwrap_or_else(Utc::now))
}

fn deserialize_metadata<'de, D: Deserializer<'de>>(d: D) -> Result<Metadata, D::Error> {
    let value = Value::deserialize(d)?;
    // Some rows store metadata as a JSON-encoded string
    let value = match value {
        Value::String(s) => serde_json::from_str(&s).unwrap_or(Value::Null),
        other => other,
    };
    Ok(match value {
        Value::Object(map) => map
            .into_iter()
            .map(|(k, v)| (k, MetadataValue::from(v)))
            .collect(),
        _ => Metadata::new(),
    })
}

/// Accepts RFC 3339 timestamps and bare `YYYY-MM-DD` dates.
pub fn parse_date(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
}
