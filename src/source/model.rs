//! JSON snapshot of a parsed building model.
//!
//! ```json
//! {
//!   "schema": "IFC4",
//!   "entities": [{ "id": 1, "type": "IfcBuilding", "global_id": "…", "name": "…" }],
//!   "aggregations": [{ "parent": 1, "child": 2 }],
//!   "containments": [{ "structure": 2, "element": 3 }],
//!   "property_sets": [{ "id": 10, "name": "Pset_WallCommon",
//!                       "properties": [{ "name": "FireRating",
//!                                        "value": { "type": "IfcLabel", "value": "2HR" } }],
//!                       "related": [3] }]
//! }
//! ```
//!
//! Links that reference an unknown entity id are logged and skipped.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{SourceError, SourceResult};

use super::{NominalValue, PropertyDefinition, SourceEntity, SourceModel, SourceProperty};

/// Schema assumed when a snapshot does not declare one.
pub const DEFAULT_SCHEMA: &str = "IFC4";

/// One entity of the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: u64,
    #[serde(rename = "type")]
    pub type_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation: Option<f64>,
}

impl EntityRecord {
    pub fn new(id: u64, type_name: impl Into<String>) -> Self {
        Self {
            id,
            type_name: type_name.into(),
            global_id: None,
            name: None,
            description: None,
            object_type: None,
            tag: None,
            elevation: None,
        }
    }

    pub fn with_global_id(mut self, global_id: impl Into<String>) -> Self {
        self.global_id = Some(global_id.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_object_type(mut self, object_type: impl Into<String>) -> Self {
        self.object_type = Some(object_type.into());
        self
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_elevation(mut self, elevation: f64) -> Self {
        self.elevation = Some(elevation);
        self
    }
}

impl SourceEntity for EntityRecord {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn sequence(&self) -> u64 {
        self.id
    }

    fn global_id(&self) -> Option<&str> {
        self.global_id.as_deref()
    }

    fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn object_type(&self) -> Option<&str> {
        self.object_type.as_deref()
    }

    fn tag(&self) -> Option<&str> {
        self.tag.as_deref()
    }

    fn elevation(&self) -> Option<f64> {
        self.elevation
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationLink {
    pub parent: u64,
    pub child: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContainmentLink {
    pub structure: u64,
    pub element: u64,
}

/// A property-set definition of the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertySetRecord {
    pub id: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub global_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub properties: Vec<SourceProperty>,
    #[serde(default)]
    pub related: Vec<u64>,
}

impl PropertySetRecord {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            global_id: None,
            name: None,
            properties: Vec::new(),
            related: Vec::new(),
        }
    }

    pub fn with_global_id(mut self, global_id: impl Into<String>) -> Self {
        self.global_id = Some(global_id.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, value: Option<NominalValue>) -> Self {
        self.properties.push(SourceProperty::new(name, value));
        self
    }

    pub fn with_related(mut self, ids: impl IntoIterator<Item = u64>) -> Self {
        self.related.extend(ids);
        self
    }
}

/// Lookup tables rebuilt after loading.
#[derive(Debug, Default, Clone)]
struct ModelIndex {
    by_id: HashMap<u64, usize>,
    /// Type name → entity positions, types in first-seen order.
    by_type: Vec<(String, Vec<usize>)>,
    type_position: HashMap<String, usize>,
}

impl ModelIndex {
    fn add(&mut self, id: u64, type_name: &str, position: usize) {
        self.by_id.insert(id, position);
        match self.type_position.get(type_name) {
            Some(&t) => self.by_type[t].1.push(position),
            None => {
                self.type_position.insert(type_name.to_string(), self.by_type.len());
                self.by_type.push((type_name.to_string(), vec![position]));
            }
        }
    }
}

/// A parsed model held in memory.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    schema: Option<String>,
    #[serde(default)]
    entities: Vec<EntityRecord>,
    #[serde(default)]
    aggregations: Vec<AggregationLink>,
    #[serde(default)]
    containments: Vec<ContainmentLink>,
    #[serde(default)]
    property_sets: Vec<PropertySetRecord>,
    #[serde(skip)]
    index: ModelIndex,
}

impl ModelDocument {
    /// An empty model declaring `schema`.
    pub fn new(schema: impl Into<String>) -> Self {
        Self {
            schema: Some(schema.into()),
            ..Self::default()
        }
    }

    /// Load a snapshot from disk.
    pub fn open(path: &Path) -> SourceResult<Self> {
        if !path.exists() {
            return Err(SourceError::NotFound {
                path: path.display().to_string(),
            });
        }
        let text = std::fs::read_to_string(path).map_err(|e| SourceError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        let doc = Self::from_json(&text)?;
        tracing::info!(
            path = %path.display(),
            entities = doc.entities.len(),
            types = doc.index.by_type.len(),
            "model loaded"
        );
        Ok(doc)
    }

    /// Parse a snapshot from JSON text.
    pub fn from_json(text: &str) -> SourceResult<Self> {
        let mut doc: Self = serde_json::from_str(text).map_err(|e| SourceError::Parse {
            message: e.to_string(),
        })?;
        doc.reindex();
        Ok(doc)
    }

    /// Serialize the snapshot as pretty JSON.
    pub fn to_json(&self) -> SourceResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| SourceError::Parse {
            message: e.to_string(),
        })
    }

    fn reindex(&mut self) {
        let mut index = ModelIndex::default();
        for (position, entity) in self.entities.iter().enumerate() {
            index.add(entity.id, &entity.type_name, position);
        }
        self.index = index;
    }

    /// Use `schema` when the snapshot does not declare one.
    pub fn set_default_schema(&mut self, schema: &str) {
        if self.schema.is_none() {
            self.schema = Some(schema.to_string());
        }
    }

    pub fn with_entity(mut self, entity: EntityRecord) -> Self {
        self.index.add(entity.id, &entity.type_name, self.entities.len());
        self.entities.push(entity);
        self
    }

    pub fn aggregate(mut self, parent: u64, child: u64) -> Self {
        self.aggregations.push(AggregationLink { parent, child });
        self
    }

    pub fn contain(mut self, structure: u64, element: u64) -> Self {
        self.containments.push(ContainmentLink { structure, element });
        self
    }

    pub fn property_set(mut self, pset: PropertySetRecord) -> Self {
        self.property_sets.push(pset);
        self
    }

    /// Entity by id.
    pub fn entity(&self, id: u64) -> Option<&EntityRecord> {
        self.index.by_id.get(&id).map(|&i| &self.entities[i])
    }

    fn resolve_pair(&self, kind: &str, a: u64, b: u64) -> Option<(&EntityRecord, &EntityRecord)> {
        match (self.entity(a), self.entity(b)) {
            (Some(a), Some(b)) => Some((a, b)),
            _ => {
                tracing::warn!(kind, from = a, to = b, "link references an unknown entity, skipped");
                None
            }
        }
    }
}

impl SourceModel for ModelDocument {
    type Entity = EntityRecord;

    fn schema(&self) -> &str {
        self.schema.as_deref().unwrap_or(DEFAULT_SCHEMA)
    }

    fn entity_types(&self) -> Vec<&str> {
        self.index.by_type.iter().map(|(t, _)| t.as_str()).collect()
    }

    fn entities_of_type<'a>(&'a self, type_name: &str) -> Box<dyn Iterator<Item = &'a EntityRecord> + 'a> {
        let positions = match self.index.type_position.get(type_name) {
            Some(&t) => self.index.by_type[t].1.as_slice(),
            None => &[],
        };
        Box::new(positions.iter().map(move |&i| &self.entities[i]))
    }

    fn aggregations(&self) -> Vec<(&EntityRecord, &EntityRecord)> {
        self.aggregations
            .iter()
            .filter_map(|l| self.resolve_pair("aggregation", l.parent, l.child))
            .collect()
    }

    fn containments(&self) -> Vec<(&EntityRecord, &EntityRecord)> {
        self.containments
            .iter()
            .filter_map(|l| self.resolve_pair("containment", l.structure, l.element))
            .collect()
    }

    fn property_definitions(&self) -> Vec<PropertyDefinition<'_, EntityRecord>> {
        self.property_sets
            .iter()
            .map(|p| PropertyDefinition {
                sequence: p.id,
                global_id: p.global_id.as_deref(),
                name: p.name.as_deref(),
                properties: &p.properties,
                related: p.related.iter().filter_map(|id| self.entity(*id)).collect(),
            })
            .collect()
    }
}
