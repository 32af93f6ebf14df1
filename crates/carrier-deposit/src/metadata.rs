use crate::error::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// DepositConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Creator {
    /// "Family, Given" or "Given Family".
    pub name: String,
    #[serde(default)]
    pub orcid: Option<String>,
    #[serde(default)]
    pub affiliation: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelatedIdentifier {
    pub identifier: String,
    /// Legacy (Zenodo REST) relation name, e.g. `isPartOf`.
    pub relation: String,
    #[serde(default)]
    pub scheme: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub lat: f64,
    pub lon: f64,
    #[serde(default)]
    pub place: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

/// Deposit description loaded from YAML.
///
/// `archive_url` accepts the legacy `zenodo_url` key; a trailing `/api` is
/// tolerated and stripped by the client.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositConfig {
    #[serde(alias = "zenodo_url")]
    pub archive_url: String,
    pub access_token: String,
    pub user_agent: String,
    #[serde(default)]
    pub files: Vec<PathBuf>,

    pub title: String,
    pub publication_date: String,
    #[serde(default = "default_upload_type")]
    pub upload_type: String,
    #[serde(default = "default_publisher")]
    pub publisher: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub creators: Vec<Creator>,
    /// Passed through to the record verbatim.
    #[serde(default)]
    pub rights: Option<Value>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub related_identifiers: Vec<RelatedIdentifier>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub locations: Vec<Location>,
}

fn default_upload_type() -> String {
    "dataset".to_string()
}

fn default_publisher() -> String {
    "Zenodo".to_string()
}

impl DepositConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let cfg: DepositConfig = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }
}

// ---------------------------------------------------------------------------
// Record building
// ---------------------------------------------------------------------------

/// Full InvenioRDM record skeleton: public access, files enabled, and the
/// metadata block from [`build_record_metadata`].
pub fn build_record(cfg: &DepositConfig) -> Value {
    json!({
        "access": {
            "record": "public",
            "files": "public",
        },
        "files": { "enabled": true },
        "metadata": build_record_metadata(cfg),
    })
}

/// InvenioRDM `metadata` block from the deposit config.
pub fn build_record_metadata(cfg: &DepositConfig) -> Value {
    let mut m = serde_json::Map::new();
    m.insert("title".into(), json!(cfg.title));
    m.insert("publication_date".into(), json!(cfg.publication_date));
    m.insert("resource_type".into(), json!({ "id": cfg.upload_type }));
    m.insert("publisher".into(), json!(cfg.publisher));

    if let Some(description) = &cfg.description {
        m.insert("description".into(), json!(text_to_html(description)));
    }

    if !cfg.creators.is_empty() {
        let creators: Vec<Value> = cfg.creators.iter().map(creator_json).collect();
        m.insert("creators".into(), Value::Array(creators));
    }

    if let Some(rights) = &cfg.rights {
        m.insert("rights".into(), rights.clone());
    }

    if !cfg.keywords.is_empty() {
        let subjects: Vec<Value> = cfg
            .keywords
            .iter()
            .map(|kw| json!({ "subject": kw }))
            .collect();
        m.insert("subjects".into(), Value::Array(subjects));
    }

    if !cfg.related_identifiers.is_empty() {
        let related: Vec<Value> = cfg
            .related_identifiers
            .iter()
            .map(|ri| {
                json!({
                    "identifier": ri.identifier,
                    "relation_type": { "id": map_relation_type(&ri.relation) },
                    "scheme": infer_scheme(&ri.identifier, ri.scheme.as_deref()),
                })
            })
            .collect();
        m.insert("related_identifiers".into(), Value::Array(related));
    }

    if let Some(version) = &cfg.version {
        m.insert("version".into(), json!(version));
    }

    if let Some(language) = &cfg.language {
        m.insert("languages".into(), json!([{ "id": language }]));
    }

    let mut additional = Vec::new();
    if let Some(notes) = &cfg.notes {
        additional.push(json!({
            "description": text_to_html(notes),
            "type": { "id": "notes" },
        }));
    }
    if let Some(method) = &cfg.method {
        additional.push(json!({
            "description": text_to_html(method),
            "type": { "id": "methods" },
        }));
    }
    if !additional.is_empty() {
        m.insert("additional_descriptions".into(), Value::Array(additional));
    }

    if !cfg.locations.is_empty() {
        let features: Vec<Value> = cfg
            .locations
            .iter()
            .map(|loc| {
                json!({
                    "geometry": {
                        "type": "Point",
                        "coordinates": [loc.lon, loc.lat],
                    },
                    "place": loc.place.clone().unwrap_or_default(),
                    "description": loc.description.clone().unwrap_or_default(),
                })
            })
            .collect();
        m.insert("locations".into(), json!({ "features": features }));
    }

    Value::Object(m)
}

fn creator_json(c: &Creator) -> Value {
    let (given, family) = split_name(&c.name);
    let mut person = serde_json::Map::new();
    person.insert("type".into(), json!("personal"));
    person.insert("given_name".into(), json!(given));
    person.insert("family_name".into(), json!(family));
    if let Some(orcid) = &c.orcid {
        person.insert(
            "identifiers".into(),
            json!([{ "scheme": "orcid", "identifier": orcid }]),
        );
    }

    let mut entry = serde_json::Map::new();
    entry.insert("person_or_org".into(), Value::Object(person));
    if let Some(affiliation) = &c.affiliation {
        entry.insert("affiliations".into(), json!([{ "name": affiliation }]));
    }
    Value::Object(entry)
}

/// "Family, Given" splits on the comma; otherwise the first word is the
/// given name and the rest the family name.
fn split_name(name: &str) -> (String, String) {
    if let Some((family, given)) = name.split_once(',') {
        (given.trim().to_string(), family.trim().to_string())
    } else {
        let mut words = name.split_whitespace();
        let given = words.next().unwrap_or("").to_string();
        let family = words.collect::<Vec<_>>().join(" ");
        (given, family)
    }
}

fn infer_scheme(identifier: &str, explicit: Option<&str>) -> String {
    if identifier.starts_with("10.") {
        "doi".to_string()
    } else if identifier.starts_with("http") {
        "url".to_string()
    } else {
        explicit.unwrap_or("other").to_string()
    }
}

/// Map a legacy Zenodo relation name to its InvenioRDM id. Most are plain
/// lowercasings; `isAlternateIdentifier` folds into `isidenticalto`.
fn map_relation_type(legacy: &str) -> String {
    match legacy {
        "isAlternateIdentifier" => "isidenticalto".to_string(),
        _ => legacy.to_lowercase(),
    }
}

// ---------------------------------------------------------------------------
// Plain-text → HTML
// ---------------------------------------------------------------------------

static URL_RE: OnceLock<Regex> = OnceLock::new();

fn url_re() -> &'static Regex {
    URL_RE.get_or_init(|| Regex::new(r#"https?://[^\s<>"')]+"#).unwrap())
}

/// Wrap every bare URL in an anchor tag.
pub fn linkify_urls(text: &str) -> String {
    url_re()
        .replace_all(text, |caps: &regex::Captures<'_>| {
            let url = &caps[0];
            format!("<a href=\"{url}\">{url}</a>")
        })
        .into_owned()
}

/// Minimal plain-text to HTML: blank-line-separated paragraphs, `- `
/// bullet lists, single newlines as `<br>`, URLs linkified.
pub fn text_to_html(text: &str) -> String {
    let mut parts = Vec::new();
    for paragraph in text.trim().split("\n\n") {
        let lines: Vec<&str> = paragraph.trim().split('\n').collect();
        if lines
            .first()
            .map(|l| l.trim().starts_with("- "))
            .unwrap_or(false)
        {
            let items: String = lines
                .iter()
                .filter(|l| l.trim().starts_with("- "))
                .map(|l| format!("<li>{}</li>", linkify_urls(&l.trim()[2..])))
                .collect();
            parts.push(format!("<ul>{items}</ul>"));
        } else {
            parts.push(format!("<p>{}</p>", linkify_urls(&lines.join("<br>"))));
        }
    }
    parts.concat()
}
