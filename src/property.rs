//! Node property resolution: raw string attributes → typed property set.
use crate::datatype::{Scalar, ValueType};
use crate::parser::{RawNodeRecord, VssDataKey};
use serde::Serialize;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

/// One resolved attribute of a node.
///
/// Identity is the key alone: a property set is a map keyed by kind, so two
/// properties with the same key are the same property regardless of value.
#[derive(Debug, Clone, Serialize)]
pub struct NodeProperty {
    pub key: VssDataKey,
    pub value: String,
    pub value_type: ValueType,
}

impl PartialEq for NodeProperty {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for NodeProperty {}

impl Hash for NodeProperty {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl NodeProperty {
    fn text(key: VssDataKey, value: &str) -> Self {
        Self {
            key,
            value: value.to_string(),
            value_type: ValueType::Scalar(Scalar::String),
        }
    }
}

/// Immutable snapshot produced by [`NodePropertiesBuilder::build`], ordered by key.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct NodeProperties(Vec<NodeProperty>);

impl NodeProperties {
    pub fn get(&self, key: VssDataKey) -> Option<&NodeProperty> {
        self.0.iter().find(|p| p.key == key)
    }

    pub fn value(&self, key: VssDataKey) -> Option<&str> {
        self.get(key).map(|p| p.value.as_str())
    }

    pub fn contains(&self, key: VssDataKey) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NodeProperty> {
        self.0.iter()
    }
}

// ------------------------------ Builder ---------------------------------- //

/// Sequential, overwrite-on-insert builder. Every `with_*` step is a no-op
/// for an empty value; bounds additionally need a datatype.
#[derive(Debug, Clone)]
pub struct NodePropertiesBuilder {
    properties: BTreeMap<VssDataKey, NodeProperty>,
}

impl NodePropertiesBuilder {
    pub fn new(uuid: &str, node_kind: &str) -> Self {
        let mut properties = BTreeMap::new();
        properties.insert(VssDataKey::Uuid, NodeProperty::text(VssDataKey::Uuid, uuid));
        properties.insert(VssDataKey::Type, NodeProperty::text(VssDataKey::Type, node_kind));
        Self { properties }
    }

    pub fn with_description(self, description: &str) -> Self {
        self.with_text(VssDataKey::Description, description)
    }

    pub fn with_comment(self, comment: &str) -> Self {
        self.with_text(VssDataKey::Comment, comment)
    }

    pub fn with_unit(self, unit: &str) -> Self {
        self.with_text(VssDataKey::Unit, unit)
    }

    pub fn with_data_type(self, datatype: &str) -> Self {
        self.with_typed(VssDataKey::Datatype, datatype, ValueType::from_vss(datatype))
    }

    pub fn with_min(self, min: &str, datatype: &str) -> Self {
        if datatype.is_empty() {
            return self;
        }
        self.with_typed(VssDataKey::Min, min, ValueType::from_vss(datatype))
    }

    pub fn with_max(self, max: &str, datatype: &str) -> Self {
        if datatype.is_empty() {
            return self;
        }
        self.with_typed(VssDataKey::Max, max, ValueType::from_vss(datatype))
    }

    pub fn build(self) -> NodeProperties {
        NodeProperties(self.properties.into_values().collect())
    }

    fn with_text(self, key: VssDataKey, value: &str) -> Self {
        self.with_typed(key, value, ValueType::Scalar(Scalar::String))
    }

    fn with_typed(mut self, key: VssDataKey, value: &str, value_type: ValueType) -> Self {
        if value.is_empty() {
            return self;
        }
        self.properties.insert(key, NodeProperty { key, value: value.to_string(), value_type });
        self
    }
}

// --------------------------- Resolved nodes ------------------------------ //

/// A dotted path plus its resolved property set.
#[derive(Debug, Clone, Serialize)]
pub struct ResolvedNode {
    pub path: String,
    pub properties: NodeProperties,
}

impl ResolvedNode {
    pub fn new(path: impl Into<String>, properties: NodeProperties) -> Self {
        Self { path: path.into(), properties }
    }

    pub fn resolve(record: &RawNodeRecord) -> Self {
        let properties = NodePropertiesBuilder::new(&record.uuid, &record.node_kind)
            .with_description(&record.description)
            .with_comment(&record.comment)
            .with_data_type(&record.datatype)
            .with_unit(&record.unit)
            .with_min(&record.min, &record.datatype)
            .with_max(&record.max, &record.datatype)
            .build();
        Self::new(record.path.clone(), properties)
    }

    pub fn node_kind(&self) -> &str {
        self.properties.value(VssDataKey::Type).unwrap_or_default()
    }

    pub fn uuid(&self) -> &str {
        self.properties.value(VssDataKey::Uuid).unwrap_or_default()
    }

    /// Representation of the `value` field; untyped when no datatype is set.
    pub fn value_type(&self) -> ValueType {
        self.properties
            .get(VssDataKey::Datatype)
            .map(|p| p.value_type)
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn keys(props: &NodeProperties) -> Vec<VssDataKey> {
        props.iter().map(|p| p.key).collect()
    }

    #[test]
    fn uuid_and_kind_are_always_present() {
        let props = NodePropertiesBuilder::new("", "branch").build();
        assert_eq!(keys(&props), vec![VssDataKey::Uuid, VssDataKey::Type]);
        assert_eq!(props.value(VssDataKey::Uuid), Some(""));
    }

    #[test]
    fn empty_values_are_skipped() {
        let props = NodePropertiesBuilder::new("u", "sensor")
            .with_description("")
            .with_comment("")
            .with_unit("")
            .with_data_type("")
            .with_min("0", "")
            .with_max("", "uint8")
            .build();
        assert_eq!(props.iter().count(), 2);
    }

    #[test]
    fn later_inserts_overwrite_earlier_ones() {
        let props = NodePropertiesBuilder::new("u", "sensor")
            .with_description("first")
            .with_description("second")
            .build();
        assert_eq!(props.value(VssDataKey::Description), Some("second"));
    }

    #[test]
    fn bounds_take_the_datatype_representation() {
        let props = NodePropertiesBuilder::new("u", "sensor")
            .with_data_type("uint32")
            .with_min("0", "uint32")
            .with_max("100", "uint32")
            .build();
        let u32_ty = ValueType::Scalar(Scalar::U32);
        assert_eq!(props.get(VssDataKey::Datatype).map(|p| p.value_type), Some(u32_ty));
        assert_eq!(props.get(VssDataKey::Min).map(|p| p.value_type), Some(u32_ty));
        assert_eq!(props.get(VssDataKey::Max).map(|p| p.value.as_str()), Some("100"));
    }

    #[test]
    fn unknown_datatype_keeps_the_property_untyped() {
        let props = NodePropertiesBuilder::new("u", "sensor")
            .with_data_type("quaternion")
            .with_min("1", "quaternion")
            .build();
        assert_eq!(props.get(VssDataKey::Datatype).map(|p| p.value_type), Some(ValueType::Any));
        assert_eq!(props.get(VssDataKey::Min).map(|p| p.value_type), Some(ValueType::Any));
    }

    #[test]
    fn property_identity_is_the_key() {
        let a = NodeProperty { key: VssDataKey::Unit, value: "km/h".into(), value_type: ValueType::Any };
        let b = NodeProperty::text(VssDataKey::Unit, "m/s");
        assert_eq!(a, b);
    }

    #[test]
    fn resolving_a_record() {
        let record = RawNodeRecord {
            path: "Vehicle.Speed".into(),
            uuid: "efe50798638d55fab18ab7d43cc490e9".into(),
            node_kind: "sensor".into(),
            description: "Vehicle speed.".into(),
            datatype: "float".into(),
            unit: "km/h".into(),
            ..RawNodeRecord::default()
        };
        let node = ResolvedNode::resolve(&record);
        assert_eq!(node.node_kind(), "sensor");
        assert_eq!(node.value_type(), ValueType::Scalar(Scalar::F32));
        assert_eq!(node.properties.value(VssDataKey::Unit), Some("km/h"));
        assert!(!node.properties.contains(VssDataKey::Min));
    }
}
