//! Source model abstraction: the typed entity graph a conversion reads.
//!
//! The model-file parser is an upstream collaborator. Converters only see the
//! [`SourceModel`] and [`SourceEntity`] traits, whose optional-field accessors
//! replace any "does this entity have that attribute" probing. The crate ships
//! one implementation, [`model::ModelDocument`], a JSON snapshot of a parsed
//! model.

pub mod model;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::graph::{Iri, Literal};
use crate::vocab::bim;

pub use model::ModelDocument;

/// Type name of the generic proxy element, the only type whose display name
/// is run through the classification rules.
pub const PROXY_TYPE: &str = "IfcBuildingElementProxy";

/// One typed entity of the source model.
///
/// Optional accessors return `None` when the attribute is absent. Converters
/// treat an empty string the same as `None`.
pub trait SourceEntity {
    /// Source type name, e.g. `IfcWall`.
    fn type_name(&self) -> &str;
    /// Internal sequence number, unique within one parse of the model.
    fn sequence(&self) -> u64;
    fn global_id(&self) -> Option<&str>;
    fn name(&self) -> Option<&str>;
    fn description(&self) -> Option<&str>;
    fn object_type(&self) -> Option<&str>;
    fn tag(&self) -> Option<&str>;
    /// Storey elevation, when the entity carries one.
    fn elevation(&self) -> Option<f64>;
}

/// Treat empty strings as absent.
pub fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// A parsed model the converters can walk.
pub trait SourceModel {
    type Entity: SourceEntity;

    /// Schema identifier declared by the model (`IFC4`, `IFC2X3`, …).
    fn schema(&self) -> &str;

    /// Distinct entity type names, in first-seen order.
    fn entity_types(&self) -> Vec<&str>;

    /// All entities of the given type, in source order.
    fn entities_of_type<'a>(&'a self, type_name: &str) -> Box<dyn Iterator<Item = &'a Self::Entity> + 'a>;

    /// Aggregation links as `(parent, child)` pairs.
    fn aggregations(&self) -> Vec<(&Self::Entity, &Self::Entity)>;

    /// Containment links as `(structure, element)` pairs.
    fn containments(&self) -> Vec<(&Self::Entity, &Self::Entity)>;

    /// Property-set definitions with the objects they apply to.
    fn property_definitions(&self) -> Vec<PropertyDefinition<'_, Self::Entity>>;

    /// Total number of entities.
    fn entity_count(&self) -> usize {
        self.entity_types()
            .iter()
            .map(|t| self.entities_of_type(t).count())
            .sum()
    }
}

/// A property-set definition and the entities it is attached to.
#[derive(Debug)]
pub struct PropertyDefinition<'a, E> {
    pub sequence: u64,
    pub global_id: Option<&'a str>,
    pub name: Option<&'a str>,
    pub properties: &'a [SourceProperty],
    pub related: Vec<&'a E>,
}

/// A named property with an optional nominal value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceProperty {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<NominalValue>,
}

impl SourceProperty {
    pub fn new(name: impl Into<String>, value: Option<NominalValue>) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// A value together with its source value-type name (`IfcLabel`, `IfcReal`, …).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NominalValue {
    #[serde(rename = "type")]
    pub type_name: String,
    pub value: RawValue,
}

impl NominalValue {
    pub fn new(type_name: impl Into<String>, value: RawValue) -> Self {
        Self {
            type_name: type_name.into(),
            value,
        }
    }

    /// Map to a typed literal according to [`ValueKind`].
    ///
    /// A value that does not fit its declared kind, and any unrecognized kind,
    /// becomes a string literal of its text form.
    pub fn to_literal(&self) -> Literal {
        let text = || Literal::string(self.value.to_string());
        match (ValueKind::of(&self.type_name), &self.value) {
            (ValueKind::String, _) => text(),
            (ValueKind::Double, RawValue::Real(v)) => Literal::double(*v),
            (ValueKind::Double, RawValue::Integer(v)) => Literal::double(*v as f64),
            (ValueKind::Double, RawValue::Text(t)) => t.trim().parse().map_or_else(|_| text(), Literal::double),
            (ValueKind::Integer, RawValue::Integer(v)) => Literal::integer(*v),
            (ValueKind::Integer, RawValue::Real(v)) if v.fract() == 0.0 => Literal::integer(*v as i64),
            (ValueKind::Integer, RawValue::Text(t)) => t.trim().parse().map_or_else(|_| text(), Literal::integer),
            (ValueKind::Boolean, RawValue::Boolean(b)) => Literal::boolean(*b),
            (ValueKind::Boolean, RawValue::Text(t)) => parse_logical(t).map_or_else(text, Literal::boolean),
            _ => text(),
        }
    }
}

/// STEP-style logical literals: `.T.`, `T`, `true` and their negations.
fn parse_logical(text: &str) -> Option<bool> {
    match text.trim().trim_matches('.').to_ascii_lowercase().as_str() {
        "t" | "true" => Some(true),
        "f" | "false" => Some(false),
        _ => None,
    }
}

/// A raw scalar as the parser delivered it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    Boolean(bool),
    Integer(i64),
    Real(f64),
    Text(String),
}

impl fmt::Display for RawValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawValue::Boolean(b) => write!(f, "{b}"),
            RawValue::Integer(i) => write!(f, "{i}"),
            RawValue::Real(r) => write!(f, "{r}"),
            RawValue::Text(t) => f.write_str(t),
        }
    }
}

/// Output literal kind for a source value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    String,
    Double,
    Integer,
    Boolean,
    /// Any value type [`ValueKind::of`] does not list; emitted as a string literal.
    Unrecognized,
}

impl ValueKind {
    pub fn of(type_name: &str) -> Self {
        match type_name.to_ascii_lowercase().as_str() {
            "ifclabel" | "ifctext" | "ifcidentifier" | "ifcdescriptivemeasure" => Self::String,
            "ifcreal"
            | "ifcpositivelengthmeasure"
            | "ifclengthmeasure"
            | "ifcareameasure"
            | "ifcvolumemeasure"
            | "ifcmassmeasure"
            | "ifcthermodynamictemperaturemeasure"
            | "ifcpressuremeasure"
            | "ifcforcemeasure"
            | "ifcplaneanglemeasure" => Self::Double,
            "ifcinteger" | "ifccountmeasure" => Self::Integer,
            "ifcboolean" | "ifclogical" => Self::Boolean,
            _ => Self::Unrecognized,
        }
    }
}

// ---------------------------------------------------------------------------
// Type taxonomy
// ---------------------------------------------------------------------------

/// Coarse grouping of source entity types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeGroup {
    Spatial,
    Structural,
    Opening,
    Mep,
    Furnishing,
    Relationship,
    Property,
    Geometry,
    /// Not in any known group. Still converted as a physical element.
    Unknown,
}

impl TypeGroup {
    pub fn of(type_name: &str) -> Self {
        let lower = type_name.to_ascii_lowercase();
        match lower.as_str() {
            "ifcproject" | "ifcsite" | "ifcbuilding" | "ifcbuildingstorey" | "ifcspace" => Self::Spatial,
            "ifcwall" | "ifcwallstandardcase" | "ifccolumn" | "ifcbeam" | "ifcslab" | "ifcfooting"
            | "ifcpile" | "ifcramp" | "ifcrampflight" | "ifcstair" | "ifcstairflight" | "ifcroof"
            | "ifccurtainwall" | "ifcplate" | "ifcmember" => Self::Structural,
            "ifcdoor" | "ifcwindow" | "ifcopeningelement" | "ifccovering" | "ifcrailing" => Self::Opening,
            "ifcpipesegment"
            | "ifcpipefitting"
            | "ifcductsegment"
            | "ifcductfitting"
            | "ifccablecarriersegment"
            | "ifccablesegment"
            | "ifcflowterminal"
            | "ifcflowsegment"
            | "ifcflowfitting"
            | "ifcflowcontroller"
            | "ifcflowmovingdevice"
            | "ifcflowstoragedevice"
            | "ifcflowtreatmentdevice"
            | "ifcenergyconversiondevice"
            | "ifcdistributionport"
            | "ifcdistributionelement" => Self::Mep,
            "ifcfurnishingelement"
            | "ifcbuildingelementproxy"
            | "ifcdiscreteaccessory"
            | "ifcmechanicalfastener"
            | "ifcfastener" => Self::Furnishing,
            "ifcmaterial"
            | "ifcmateriallayer"
            | "ifcmateriallayerset"
            | "ifcmateriallayersetusage"
            | "ifcclassification"
            | "ifcclassificationreference"
            | "ifcelementquantity" => Self::Property,
            "ifccartesianpoint"
            | "ifccartesianpointlist3d"
            | "ifcdirection"
            | "ifcaxis2placement3d"
            | "ifclocalplacement"
            | "ifcshaperepresentation"
            | "ifcproductdefinitionshape"
            | "ifctriangulatedfaceset"
            | "ifcfacetedbrep"
            | "ifcextrudedareasolid"
            | "ifcbooleanclippingresult"
            | "ifcpolyloop"
            | "ifcface"
            | "ifcfacebound"
            | "ifcfaceouterbound"
            | "ifcconnectedfaceset"
            | "ifcclosedshell"
            | "ifcpresentationlayerassignment"
            | "ifcpresentationstyleassignment"
            | "ifccolourrgb"
            | "ifcsurfacestyle"
            | "ifcsurfacestylerendering"
            | "ifcstyleditem"
            | "ifcsiunit"
            | "ifcownerhistory"
            | "ifcorganization"
            | "ifcapplication"
            | "ifcperson"
            | "ifcpersonandorganization"
            | "ifcunitassignment"
            | "ifcgeometricrepresentationcontext"
            | "ifcgeometricrepresentationsubcontext"
            | "ifcconversionbasedunit"
            | "ifcdimensionalexponents"
            | "ifcmeasurewithunit" => Self::Geometry,
            _ if lower.starts_with("ifcrel") => Self::Relationship,
            _ if lower.starts_with("ifcproperty") || lower.starts_with("ifcquantity") => Self::Property,
            _ => Self::Unknown,
        }
    }

    /// Whether entities of this group become standalone instance nodes.
    pub fn is_convertible(self) -> bool {
        !matches!(self, Self::Relationship | Self::Property | Self::Geometry)
    }
}

/// The spatial class for a spatial source type.
pub fn spatial_class(type_name: &str) -> Option<Iri> {
    match type_name.to_ascii_lowercase().as_str() {
        "ifcproject" => Some(bim::PROJECT),
        "ifcsite" => Some(bim::SITE),
        "ifcbuilding" => Some(bim::BUILDING),
        "ifcbuildingstorey" => Some(bim::BUILDING_STOREY),
        "ifcspace" => Some(bim::SPACE),
        _ => None,
    }
}

/// Whether a type is the generic proxy element.
pub fn is_proxy(type_name: &str) -> bool {
    type_name.eq_ignore_ascii_case(PROXY_TYPE)
}
