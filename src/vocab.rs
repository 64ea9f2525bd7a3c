//! Namespaces, vocabulary terms and identifier minting.
//!
//! Every IRI the converters and injectors emit comes from this module, either
//! as a vocabulary constant or through one of the `mint_*` functions. Minting is
//! deterministic: the same inputs always yield the same IRI.

use std::fmt;

use serde::Serialize;

use crate::error::{SourceError, SourceResult};
use crate::graph::Iri;

pub const RDF_NS: &str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#";
pub const RDFS_NS: &str = "http://www.w3.org/2000/01/rdf-schema#";
pub const OWL_NS: &str = "http://www.w3.org/2002/07/owl#";
pub const XSD_NS: &str = "http://www.w3.org/2001/XMLSchema#";

pub const BIM_NS: &str = "http://example.org/bim-ontology/schema#";
pub const INST_NS: &str = "http://example.org/bim-ontology/instance#";
pub const SCHED_NS: &str = "http://example.org/bim-ontology/schedule#";
pub const AWP_NS: &str = "http://example.org/bim-ontology/awp#";
pub const NAVIS_NS: &str = "http://example.org/bim-ontology/navis#";
pub const SP3D_NS: &str = "http://example.org/bim-ontology/sp3d#";
pub const BOT_NS: &str = "https://w3id.org/bot#";
pub const EXPRESS_NS: &str = "https://w3id.org/express#";
pub const IFC4_NS: &str = "https://standards.buildingsmart.org/IFC/DEV/IFC4/ADD2/OWL#";
pub const IFC2X3_NS: &str = "https://standards.buildingsmart.org/IFC/DEV/IFC2x3/TC1/OWL#";

/// Prefix bindings written by the serializers.
pub const PREFIXES: &[(&str, &str)] = &[
    ("rdf", RDF_NS),
    ("rdfs", RDFS_NS),
    ("owl", OWL_NS),
    ("xsd", XSD_NS),
    ("bim", BIM_NS),
    ("inst", INST_NS),
    ("sched", SCHED_NS),
    ("awp", AWP_NS),
    ("navis", NAVIS_NS),
    ("sp3d", SP3D_NS),
    ("bot", BOT_NS),
    ("express", EXPRESS_NS),
];

macro_rules! terms {
    ($ns:literal; $($name:ident = $local:literal),* $(,)?) => {
        $(pub const $name: Iri = Iri::from_static(concat!($ns, $local));)*
    };
}

pub mod rdf {
    use super::Iri;
    terms!("http://www.w3.org/1999/02/22-rdf-syntax-ns#"; TYPE = "type");
}

pub mod rdfs {
    use super::Iri;
    terms!("http://www.w3.org/2000/01/rdf-schema#";
        LABEL = "label",
        COMMENT = "comment",
        SUB_CLASS_OF = "subClassOf",
        DOMAIN = "domain",
        RANGE = "range",
    );
}

pub mod owl {
    use super::Iri;
    terms!("http://www.w3.org/2002/07/owl#";
        CLASS = "Class",
        OBJECT_PROPERTY = "ObjectProperty",
        DATATYPE_PROPERTY = "DatatypeProperty",
        INVERSE_OF = "inverseOf",
        ONTOLOGY = "Ontology",
        IMPORTS = "imports",
    );
}

pub mod xsd {
    use super::Iri;
    terms!("http://www.w3.org/2001/XMLSchema#";
        STRING = "string",
        DOUBLE = "double",
        INTEGER = "integer",
        BOOLEAN = "boolean",
        DATE = "date",
        DATE_TIME = "dateTime",
    );
}

/// Core building vocabulary.
pub mod bim {
    use super::Iri;
    terms!("http://example.org/bim-ontology/schema#";
        // classes
        BIM_ELEMENT = "BIMElement",
        SPATIAL_ELEMENT = "SpatialElement",
        PHYSICAL_ELEMENT = "PhysicalElement",
        PROJECT = "Project",
        SITE = "Site",
        BUILDING = "Building",
        BUILDING_STOREY = "BuildingStorey",
        SPACE = "Space",
        PROPERTY_SET = "PropertySet",
        PLANT_PROPERTY_SET = "PlantPropertySet",
        PROPERTY = "Property",
        ELEMENT_STATUS = "ElementStatus",
        CONSTRUCTION_EQUIPMENT = "ConstructionEquipment",
        // element attributes
        HAS_GLOBAL_ID = "hasGlobalId",
        HAS_NAME = "hasName",
        HAS_DESCRIPTION = "hasDescription",
        HAS_OBJECT_TYPE = "hasObjectType",
        HAS_TAG = "hasTag",
        HAS_CATEGORY = "hasCategory",
        HAS_ORIGINAL_TYPE = "hasOriginalType",
        HAS_ELEVATION = "hasElevation",
        // structure
        CONTAINS_ELEMENT = "containsElement",
        IS_CONTAINED_IN = "isContainedIn",
        AGGREGATES = "aggregates",
        DECOMPOSES = "decomposes",
        // property sets
        HAS_PROPERTY_SET = "hasPropertySet",
        HAS_PROPERTY = "hasProperty",
        HAS_PROPERTY_VALUE = "hasPropertyValue",
        // lean layer on elements
        HAS_UNIT_COST = "hasUnitCost",
        HAS_CONSUME_DURATION = "hasConsumeDuration",
        HAS_DELIVERY_STATUS = "hasDeliveryStatus",
        HAS_STATUS = "hasStatus",
        HAS_STATUS_VALUE = "hasStatusValue",
        HAS_STATUS_DATE = "hasStatusDate",
        IS_READY = "isReady",
        // equipment
        HAS_EQUIPMENT_WIDTH = "hasEquipmentWidth",
        HAS_EQUIPMENT_HEIGHT = "hasEquipmentHeight",
        HAS_TURNING_RADIUS = "hasTurningRadius",
        HAS_BOOM_LENGTH = "hasBoomLength",
        HAS_LOAD_CAPACITY = "hasLoadCapacity",
        CAN_ACCESS_ZONE = "canAccessZone",
    );
}

/// Schedule vocabulary.
pub mod sched {
    use super::Iri;
    terms!("http://example.org/bim-ontology/schedule#";
        CONSTRUCTION_TASK = "ConstructionTask",
        HAS_PLANNED_START = "hasPlannedStart",
        HAS_PLANNED_END = "hasPlannedEnd",
        HAS_ACTUAL_START = "hasActualStart",
        HAS_ACTUAL_END = "hasActualEnd",
        HAS_DURATION = "hasDuration",
        HAS_PLANNED_DURATION = "hasPlannedDuration",
        HAS_ACTUAL_DURATION = "hasActualDuration",
        HAS_EFFECTIVE_DURATION = "hasEffectiveDuration",
        HAS_PLANNED_INSTALL_DATE = "hasPlannedInstallDate",
        ASSIGNED_TO_TASK = "assignedToTask",
        HAS_ASSIGNED_ELEMENT = "hasAssignedElement",
    );
}

/// Work-packaging vocabulary.
pub mod awp {
    use super::Iri;
    terms!("http://example.org/bim-ontology/awp#";
        CONSTRUCTION_WORK_AREA = "ConstructionWorkArea",
        CONSTRUCTION_WORK_PACKAGE = "ConstructionWorkPackage",
        INSTALLATION_WORK_PACKAGE = "InstallationWorkPackage",
        BELONGS_TO_CWA = "belongsToCWA",
        BELONGS_TO_CWP = "belongsToCWP",
        BELONGS_TO_CWP_ID = "belongsToCWP_ID",
        HAS_START_DATE = "hasStartDate",
        HAS_END_DATE = "hasEndDate",
        HAS_CONSTRAINT_STATUS = "hasConstraintStatus",
        INCLUDES_ELEMENT = "includesElement",
        ASSIGNED_TO_IWP = "assignedToIWP",
    );
}

/// Navisworks hierarchy vocabulary.
pub mod navis {
    use super::Iri;
    terms!("http://example.org/bim-ontology/navis#";
        SP3D_ENTITY = "SP3DEntity",
        NAVIS_GROUP = "NavisGroup",
        NAVIS_ELEMENT = "NavisElement",
        PROJECT = "Project",
        AREA = "Area",
        UNIT = "Unit",
        SYSTEM = "System",
        HAS_OBJECT_ID = "hasObjectId",
        HAS_LEVEL = "hasLevel",
        HAS_INTERNAL_TYPE = "hasInternalType",
        HAS_PARENT = "hasParent",
        HAS_CHILD = "hasChild",
        HAS_PARENT_ID = "hasParentId",
        HAS_SYSTEM_PATH_PARENT = "hasSystemPathParent",
        CONTAINS_ELEMENT = "containsElement",
        IS_CONTAINED_IN = "isContainedIn",
    );
}

/// Plant-design property vocabulary.
pub mod sp3d {
    use super::Iri;
    terms!("http://example.org/bim-ontology/sp3d#";
        HAS_NAME = "hasName",
        HAS_SYSTEM_PATH = "hasSystemPath",
        HAS_BOM_DESCRIPTION = "hasBOMDescription",
        HAS_SUPPORT_ASSEMBLY = "hasSupportAssembly",
        HAS_DRY_WEIGHT = "hasDryWeight",
        HAS_LOCATION = "hasLocation",
        HAS_STATUS = "hasStatus",
        HAS_CREATED_BY = "hasCreatedBy",
        HAS_CREATED_DATE = "hasCreatedDate",
        HAS_MODIFIED_BY = "hasModifiedBy",
        HAS_MODIFIED_DATE = "hasModifiedDate",
        HAS_MONIKER = "hasMoniker",
        HAS_REPORTING_TYPE = "hasReportingType",
        HAS_CONSTRUCTION_TYPE = "hasConstructionType",
        HAS_PERMISSION_GROUP_ID = "hasPermissionGroupId",
    );
}

/// A term in the `bim:` namespace with a computed local name (category classes).
pub fn bim_term(local: &str) -> Iri {
    Iri::in_namespace(BIM_NS, local)
}

// ---------------------------------------------------------------------------
// Schema versions
// ---------------------------------------------------------------------------

/// Source schema versions the converters accept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaVersion {
    Ifc4,
    Ifc2x3,
}

impl SchemaVersion {
    /// Parse a schema identifier, case-insensitively.
    pub fn parse(schema: &str) -> SourceResult<Self> {
        match schema.trim().to_ascii_uppercase().as_str() {
            "IFC4" => Ok(Self::Ifc4),
            "IFC2X3" => Ok(Self::Ifc2x3),
            _ => Err(SourceError::UnsupportedSchema {
                schema: schema.to_string(),
            }),
        }
    }

    /// The ontology namespace the TBox imports for this version.
    pub fn namespace(self) -> &'static str {
        match self {
            Self::Ifc4 => IFC4_NS,
            Self::Ifc2x3 => IFC2X3_NS,
        }
    }

    /// The ontology IRI (namespace without the trailing `#`).
    pub fn ontology_iri(self) -> Iri {
        let ns = self.namespace();
        Iri::from_static(ns.strip_suffix('#').unwrap_or(ns))
    }
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Ifc4 => "IFC4",
            Self::Ifc2x3 => "IFC2X3",
        })
    }
}

/// The ontology IRI of the building vocabulary itself.
pub fn bim_ontology_iri() -> Iri {
    Iri::from_static("http://example.org/bim-ontology/schema")
}

// ---------------------------------------------------------------------------
// Minting
// ---------------------------------------------------------------------------

/// Percent-encode a value for use inside an IRI local name.
///
/// Unreserved characters and `$` pass through; everything else is encoded
/// byte-wise as UTF-8, so distinct inputs never collide.
pub fn encode_segment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' | b'$' => {
                out.push(byte as char)
            }
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

fn mint(local: String) -> Iri {
    Iri::new(format!("{INST_NS}{local}"))
}

/// Key an entity is minted from: its GlobalId, or its sequence number when it
/// has none.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKey<'a> {
    GlobalId(&'a str),
    Sequence(u64),
}

/// Instance IRI of a model entity: `inst:{type_lower}_{GlobalId}`, falling back
/// to `inst:{type_lower}_{sequence}`.
pub fn mint_entity(type_name: &str, key: EntityKey<'_>) -> Iri {
    let type_lower = encode_segment(&type_name.to_ascii_lowercase());
    match key {
        EntityKey::GlobalId(gid) => mint(format!("{type_lower}_{}", encode_segment(gid))),
        EntityKey::Sequence(seq) => mint(format!("{type_lower}_{seq}")),
    }
}

/// Instance IRI of a property-set definition.
pub fn mint_property_set(key: EntityKey<'_>) -> Iri {
    match key {
        EntityKey::GlobalId(gid) => mint(format!("pset_{}", encode_segment(gid))),
        EntityKey::Sequence(seq) => mint(format!("pset_{seq}")),
    }
}

/// Instance IRI of a property inside a property set.
pub fn mint_property(pset_key: EntityKey<'_>, property_name: &str) -> Iri {
    let owner = match pset_key {
        EntityKey::GlobalId(gid) => encode_segment(gid),
        EntityKey::Sequence(seq) => seq.to_string(),
    };
    mint(format!("prop_{owner}_{}", encode_segment(property_name)))
}

/// Kinds of node minted from tabular identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Task,
    WorkArea,
    WorkPackage,
    InstallationPackage,
    Equipment,
    Status,
}

impl NodeKind {
    fn prefix(self) -> &'static str {
        match self {
            Self::Task => "task",
            Self::WorkArea => "cwa",
            Self::WorkPackage => "cwp",
            Self::InstallationPackage => "iwp",
            Self::Equipment => "equip",
            Self::Status => "status",
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Task => "tasks",
            Self::WorkArea => "work areas",
            Self::WorkPackage => "work packages",
            Self::InstallationPackage => "installation packages",
            Self::Equipment => "equipment",
            Self::Status => "status records",
        })
    }
}

/// Instance IRI of a node identified by a tabular value (task name, CWP id…).
pub fn mint_node(kind: NodeKind, id: &str) -> Iri {
    mint(format!("{}_{}", kind.prefix(), encode_segment(id)))
}

/// Instance IRI of a Navisworks hierarchy object.
pub fn mint_navis_object(object_id: &str) -> Iri {
    mint(format!("navis_{}", encode_segment(object_id)))
}

/// Instance IRI of a system-path node (`A\B\C` → one node per prefix).
pub fn mint_path_node(path: &str) -> Iri {
    mint(format!("path_{}", encode_segment(path)))
}
