//! Field catalog built from field templates
//!
//! Field templates are the declarative description of every field the
//! indexing backend exposes. Templates nest: a `group` names a prefix, its
//! children extend it. Names may themselves contain dots
//! (`context.tags`). The catalog flattens that tree into one entry per
//! dotted path.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use super::errors::{FieldError, FieldResult};
use super::path::FieldPath;
use super::set::{Member, NamedSet};

/// Indexing type of a field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// Container for nested fields, not indexed itself
    Group,
    /// Exact-match string
    #[default]
    Keyword,
    /// Full-text string
    Text,
    Long,
    Integer,
    Float,
    ScaledFloat,
    Date,
    Boolean,
    /// Free-form object
    Object,
    Ip,
    GeoPoint,
}

impl FieldKind {
    /// Returns the template type name
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldKind::Group => "group",
            FieldKind::Keyword => "keyword",
            FieldKind::Text => "text",
            FieldKind::Long => "long",
            FieldKind::Integer => "integer",
            FieldKind::Float => "float",
            FieldKind::ScaledFloat => "scaled_float",
            FieldKind::Date => "date",
            FieldKind::Boolean => "boolean",
            FieldKind::Object => "object",
            FieldKind::Ip => "ip",
            FieldKind::GeoPoint => "geo_point",
        }
    }
}

/// One node of the field template tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldTemplate {
    /// Field name, possibly dotted
    pub name: String,
    /// Indexing type (defaults to keyword)
    #[serde(rename = "type", default)]
    pub kind: FieldKind,
    /// Children of a group
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldTemplate>,
    /// Object whose keys are user supplied
    #[serde(default)]
    pub dynamic: bool,
    /// Overrides the default keyword limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl FieldTemplate {
    /// A keyword leaf
    pub fn keyword(name: impl Into<String>) -> Self {
        Self::leaf(name, FieldKind::Keyword)
    }

    /// A leaf of any kind
    pub fn leaf(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            fields: Vec::new(),
            dynamic: false,
            max_length: None,
            description: None,
        }
    }

    /// A group with children
    pub fn group(name: impl Into<String>, fields: Vec<FieldTemplate>) -> Self {
        Self {
            fields,
            ..Self::leaf(name, FieldKind::Group)
        }
    }

    /// A dynamic object (user supplied keys)
    pub fn dynamic_object(name: impl Into<String>) -> Self {
        Self {
            dynamic: true,
            ..Self::leaf(name, FieldKind::Object)
        }
    }

    fn check(&self) -> FieldResult<()> {
        match self.kind {
            FieldKind::Group if self.fields.is_empty() => {
                return Err(FieldError::invalid_template(&self.name, "group without fields"));
            }
            FieldKind::Group => {}
            _ if !self.fields.is_empty() => {
                return Err(FieldError::invalid_template(
                    &self.name,
                    format!("{} field cannot have children", self.kind.as_str()),
                ));
            }
            _ => {}
        }
        if self.dynamic && self.kind != FieldKind::Object {
            return Err(FieldError::invalid_template(
                &self.name,
                "only object fields can be dynamic",
            ));
        }
        if self.max_length.is_some() && !(self.kind == FieldKind::Keyword || self.dynamic) {
            return Err(FieldError::invalid_template(
                &self.name,
                "max_length applies to keyword fields and dynamic object keys",
            ));
        }
        if self.max_length == Some(0) {
            return Err(FieldError::invalid_template(&self.name, "max_length must be > 0"));
        }
        Ok(())
    }
}

/// Flattened catalog entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldCatalogEntry {
    pub path: FieldPath,
    pub kind: FieldKind,
    pub is_dynamic_map: bool,
    pub max_length: Option<usize>,
}

impl FieldCatalogEntry {
    /// Creates an entry without indexing overrides
    pub fn new(path: FieldPath, kind: FieldKind) -> Self {
        Self {
            path,
            kind,
            is_dynamic_map: false,
            max_length: None,
        }
    }

    /// String values destined for exact-match indexing
    pub fn is_string_typed(&self) -> bool {
        self.kind == FieldKind::Keyword
    }
}

/// Read-only index of declared output fields
#[derive(Debug, Clone, Default)]
pub struct FieldCatalog {
    entries: BTreeMap<FieldPath, FieldCatalogEntry>,
}

impl FieldCatalog {
    /// Flattens field templates into a catalog.
    pub fn build(templates: &[FieldTemplate]) -> FieldResult<Self> {
        let mut catalog = Self::default();
        for template in templates {
            catalog.flatten(&FieldPath::root(), template)?;
        }
        Ok(catalog)
    }

    /// Builds a catalog from entries parsed elsewhere.
    pub fn from_entries(entries: impl IntoIterator<Item = FieldCatalogEntry>) -> FieldResult<Self> {
        let mut catalog = Self::default();
        for entry in entries {
            catalog.insert(entry)?;
        }
        Ok(catalog)
    }

    /// Parses a JSON array of templates.
    pub fn from_json(source: &str) -> FieldResult<Self> {
        let templates: Vec<FieldTemplate> =
            serde_json::from_str(source).map_err(|e| FieldError::Load {
                path: "<inline>".into(),
                reason: e.to_string(),
            })?;
        Self::build(&templates)
    }

    /// Reads and merges several template files into one catalog.
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> FieldResult<Self> {
        let mut templates = Vec::new();
        for path in paths {
            let path = path.as_ref();
            let load_error = |reason: String| FieldError::Load {
                path: path.display().to_string(),
                reason,
            };
            let content = fs::read_to_string(path).map_err(|e| load_error(e.to_string()))?;
            let mut parsed: Vec<FieldTemplate> =
                serde_json::from_str(&content).map_err(|e| load_error(e.to_string()))?;
            templates.append(&mut parsed);
        }
        Self::build(&templates)
    }

    fn flatten(&mut self, prefix: &FieldPath, template: &FieldTemplate) -> FieldResult<()> {
        template.check()?;
        FieldPath::parse(template.name.as_str())?;
        let path = prefix.child(&template.name);

        self.insert(FieldCatalogEntry {
            path: path.clone(),
            kind: template.kind,
            is_dynamic_map: template.dynamic,
            max_length: template.max_length,
        })?;

        for child in &template.fields {
            self.flatten(&path, child)?;
        }
        Ok(())
    }

    fn insert(&mut self, entry: FieldCatalogEntry) -> FieldResult<()> {
        // The same group may be declared by several template files.
        if let Some(existing) = self.entries.get(&entry.path) {
            if existing.kind == FieldKind::Group && entry.kind == FieldKind::Group {
                return Ok(());
            }
            return Err(FieldError::DuplicateField(entry.path.to_string()));
        }
        self.entries.insert(entry.path.clone(), entry);
        Ok(())
    }

    /// Looks up an entry
    pub fn get(&self, path: &str) -> Option<&FieldCatalogEntry> {
        self.entries.get(path)
    }

    /// Returns true if the path is declared
    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// All declared paths in sorted order
    pub fn paths(&self) -> impl Iterator<Item = &FieldPath> {
        self.entries.keys()
    }

    /// All entries in path order
    pub fn entries(&self) -> impl Iterator<Item = &FieldCatalogEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The catalog as a set: dynamic maps become groups because their keys
    /// are user data.
    pub fn as_named_set(&self, name: impl Into<String>) -> NamedSet {
        NamedSet::new(
            name,
            self.entries.values().map(|entry| {
                if entry.is_dynamic_map {
                    Member::Group {
                        group: entry.path.clone(),
                    }
                } else {
                    Member::Literal(entry.path.clone())
                }
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn templates() -> Vec<FieldTemplate> {
        vec![
            FieldTemplate::group(
                "error",
                vec![
                    FieldTemplate::keyword("id"),
                    FieldTemplate::group(
                        "exception",
                        vec![
                            FieldTemplate::leaf("message", FieldKind::Text),
                            FieldTemplate::keyword("type"),
                        ],
                    ),
                ],
            ),
            FieldTemplate::dynamic_object("context.tags"),
        ]
    }

    #[test]
    fn test_build_flattens_nested_templates() {
        let catalog = FieldCatalog::build(&templates()).unwrap();
        let paths: Vec<&str> = catalog.paths().map(FieldPath::as_str).collect();
        assert_eq!(
            paths,
            vec![
                "context.tags",
                "error",
                "error.exception",
                "error.exception.message",
                "error.exception.type",
                "error.id",
            ]
        );
        assert_eq!(catalog.get("error").unwrap().kind, FieldKind::Group);
        assert!(catalog.get("context.tags").unwrap().is_dynamic_map);
        assert!(catalog.get("error.id").unwrap().is_string_typed());
        assert!(!catalog.get("error.exception.message").unwrap().is_string_typed());
    }

    #[test]
    fn test_duplicate_leaf_rejected() {
        let mut dup = templates();
        dup.push(FieldTemplate::group("error", vec![FieldTemplate::keyword("id")]));
        let result = FieldCatalog::build(&dup);
        assert_eq!(result.unwrap_err(), FieldError::DuplicateField("error.id".into()));
    }

    #[test]
    fn test_repeated_group_merges() {
        let mut more = templates();
        more.push(FieldTemplate::group("error", vec![FieldTemplate::keyword("culprit")]));
        let catalog = FieldCatalog::build(&more).unwrap();
        assert!(catalog.contains("error.culprit"));
        assert!(catalog.contains("error.id"));
    }

    #[test]
    fn test_invalid_templates() {
        let empty_group = FieldTemplate::group("error", Vec::new());
        assert!(FieldCatalog::build(&[empty_group]).is_err());

        let mut dynamic_keyword = FieldTemplate::keyword("labels");
        dynamic_keyword.dynamic = true;
        assert!(FieldCatalog::build(&[dynamic_keyword]).is_err());

        let mut long_limit = FieldTemplate::leaf("count", FieldKind::Long);
        long_limit.max_length = Some(10);
        assert!(FieldCatalog::build(&[long_limit]).is_err());

        assert!(FieldCatalog::build(&[FieldTemplate::keyword("bad..name")]).is_err());
    }

    #[test]
    fn test_from_json_defaults_to_keyword() {
        let catalog = FieldCatalog::from_json(
            r#"[{"name": "service", "type": "group", "fields": [{"name": "name"}]}]"#,
        )
        .unwrap();
        assert_eq!(catalog.get("service.name").unwrap().kind, FieldKind::Keyword);
    }

    #[test]
    fn test_named_set_treats_dynamic_maps_as_groups() {
        let catalog = FieldCatalog::build(&templates()).unwrap();
        let set = catalog.as_named_set("fields");
        assert!(set.contains("context.tags.team"));
        assert!(set.contains("error.id"));
        assert!(!set.contains("error.id.more"));
    }

    #[test]
    fn test_load_merges_files() {
        let dir = tempfile::TempDir::new().unwrap();
        let first = dir.path().join("error.json");
        let second = dir.path().join("common.json");
        fs::write(&first, r#"[{"name": "error", "type": "group", "fields": [{"name": "id"}]}]"#)
            .unwrap();
        fs::write(&second, r#"[{"name": "context.tags", "type": "object", "dynamic": true}]"#)
            .unwrap();

        let catalog = FieldCatalog::load(&[first, second]).unwrap();
        assert_eq!(catalog.len(), 3);
    }
}
