//! Hierarchy linking: registry + collision set → emission units.
use crate::error::{GenError, GenResult};
use crate::ir::{ChildKind, ChildRef, EmissionUnit, NestedType, ParentRef, type_name};
use crate::property::{NodePropertiesBuilder, ResolvedNode};
use crate::registry::{PathRegistry, ancestors, find_collisions, leaf, parent};
use indexmap::IndexMap;
use std::collections::{BTreeSet, HashMap};

/// Lower the whole registry. Units come out in registry order.
pub fn lower_to_ir(registry: &PathRegistry) -> GenResult<Vec<EmissionUnit>> {
    let collisions = find_collisions(registry);
    if !collisions.is_empty() {
        tracing::info!(?collisions, "ambiguous leaf names, generating nested types");
    }
    let linker = Linker::new(registry, &collisions);

    let mut units = Vec::new();
    let mut names = HashMap::<String, &str>::new();
    for node in registry.nodes() {
        if !linker.is_top_level(&node.path) {
            if linker.owning_unit(&node.path).is_none() {
                tracing::warn!(path = %node.path, "ambiguous node has no top-level ancestor to nest into, skipping");
            }
            continue;
        }
        let unit = linker.unit(node)?;
        if let Some(other) = names.insert(unit.name.clone(), &node.path) {
            return Err(GenError::Invariant(format!(
                "'{}' and '{other}' both map to type {}",
                node.path, unit.name
            )));
        }
        units.push(unit);
    }
    Ok(units)
}

/// Node kind of scopes that exist only because a colliding node sits below them.
pub const IMPLICIT_NODE_KIND: &str = "branch";

fn implicit_branch(path: &str) -> ResolvedNode {
    ResolvedNode::new(path, NodePropertiesBuilder::new("", IMPLICIT_NODE_KIND).build())
}

/// Resolves children, nesting and parent references over one registry.
pub struct Linker<'a> {
    registry: &'a PathRegistry,
    collisions: &'a BTreeSet<String>,
    children: IndexMap<&'a str, Vec<&'a ResolvedNode>>,
}

impl<'a> Linker<'a> {
    pub fn new(registry: &'a PathRegistry, collisions: &'a BTreeSet<String>) -> Self {
        let mut children = IndexMap::<&str, Vec<&ResolvedNode>>::new();
        for node in registry.nodes() {
            if let Some(parent) = registry.structural_parent(&node.path) {
                children.entry(parent).or_default().push(node);
            }
        }
        Self { registry, collisions, children }
    }

    pub fn is_top_level(&self, path: &str) -> bool {
        !self.collisions.contains(leaf(path))
    }

    /// Nearest registered, top-level-eligible proper ancestor.
    pub fn owning_unit<'p>(&self, path: &'p str) -> Option<&'p str> {
        ancestors(path).find(|p| self.registry.contains(p) && self.is_top_level(p))
    }

    pub fn children_of(&self, path: &str) -> &[&'a ResolvedNode] {
        self.children.get(path).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn unit(&self, node: &ResolvedNode) -> GenResult<EmissionUnit> {
        let (children, nested) = self.scope(&node.path)?;
        Ok(EmissionUnit {
            name: type_name(&node.path)?,
            node: node.clone(),
            children,
            nested,
            parent: self.parent_ref(&node.path)?,
        })
    }

    /// Children of `path` and the nested types its scope declares. The same
    /// rule applies at every nesting depth.
    fn scope(&self, path: &str) -> GenResult<(Vec<ChildRef>, Vec<NestedType>)> {
        self.scope_of(path, self.children_of(path))
    }

    /// Lay out `members` in the scope of `path`. A colliding member whose
    /// direct parent is not registered is placed inside implicit branch types,
    /// one per missing segment, so every nested type keeps its own scope.
    fn scope_of(
        &self,
        path: &str,
        members: &[&'a ResolvedNode],
    ) -> GenResult<(Vec<ChildRef>, Vec<NestedType>)> {
        // Keyed by member path, or by the implicit scope a member goes into.
        let mut slots = IndexMap::<String, Vec<&'a ResolvedNode>>::new();
        for &member in members {
            let key = self
                .implicit_scope(path, &member.path)
                .unwrap_or_else(|| member.path.clone());
            slots.entry(key).or_default().push(member);
        }

        let mut refs = Vec::new();
        let mut nested = Vec::new();
        for (key, group) in &slots {
            let name = type_name(key)?;
            let kind = match group.as_slice() {
                [child] if child.path == *key => {
                    if self.is_top_level(key) {
                        ChildKind::Unit
                    } else {
                        let (children, inner) = self.scope(key)?;
                        nested.push(NestedType {
                            name: name.clone(),
                            node: (*child).clone(),
                            children,
                            nested: inner,
                            implicit: false,
                        });
                        ChildKind::Nested
                    }
                }
                _ => {
                    let (children, inner) = self.scope_of(key, group)?;
                    nested.push(NestedType {
                        name: name.clone(),
                        node: implicit_branch(key),
                        children,
                        nested: inner,
                        implicit: true,
                    });
                    ChildKind::Nested
                }
            };
            refs.push(ChildRef { kind, name, path: key.clone() });
        }
        Ok((refs, nested))
    }

    /// First unregistered segment between `scope` and a colliding descendant.
    fn implicit_scope(&self, scope: &str, member: &str) -> Option<String> {
        if self.is_top_level(member) || parent(member) == Some(scope) {
            return None;
        }
        let rest = member.strip_prefix(scope)?.strip_prefix('.')?;
        let (segment, _) = rest.split_once('.')?;
        Some(format!("{scope}.{segment}"))
    }

    pub fn parent_ref(&self, path: &str) -> GenResult<Option<ParentRef>> {
        let Some(owner) = self.owning_unit(path) else {
            return Ok(None);
        };
        // Everything from the structural parent up to the owner is nested,
        // unregistered segments included (they are implicit branches).
        let mut chain = ancestors(path)
            .skip_while(|p| !self.registry.contains(p))
            .take_while(|p| *p != owner)
            .map(type_name)
            .collect::<GenResult<Vec<_>>>()?;
        chain.reverse();
        Ok(Some(ParentRef { unit: type_name(owner)?, nested: chain }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatype::{Scalar, ValueType};
    use pretty_assertions::assert_eq;

    fn branch(path: &str) -> ResolvedNode {
        ResolvedNode::new(path, NodePropertiesBuilder::new("", "branch").build())
    }

    fn sensor(path: &str, datatype: &str) -> ResolvedNode {
        let props = NodePropertiesBuilder::new("", "sensor").with_data_type(datatype).build();
        ResolvedNode::new(path, props)
    }

    fn names(units: &[EmissionUnit]) -> Vec<&str> {
        units.iter().map(|u| u.name.as_str()).collect()
    }

    fn find<'u>(units: &'u [EmissionUnit], name: &str) -> &'u EmissionUnit {
        units.iter().find(|u| u.name == name).unwrap()
    }

    #[test]
    fn unique_leaves_become_units() {
        let registry = PathRegistry::register([branch("Vehicle"), sensor("Vehicle.Speed", "uint32")]);
        let units = lower_to_ir(&registry).unwrap();
        assert_eq!(names(&units), vec!["VssVehicle", "VssSpeed"]);

        let vehicle = find(&units, "VssVehicle");
        assert_eq!(vehicle.parent, None);
        assert_eq!(vehicle.node.value_type(), ValueType::Any);
        assert_eq!(
            vehicle.children,
            vec![ChildRef { kind: ChildKind::Unit, name: "VssSpeed".into(), path: "Vehicle.Speed".into() }]
        );

        let speed = find(&units, "VssSpeed");
        assert_eq!(speed.node.value_type(), ValueType::Scalar(Scalar::U32));
        assert_eq!(speed.parent.as_ref().map(ToString::to_string).as_deref(), Some("VssVehicle"));
    }

    #[test]
    fn colliding_leaves_are_nested_in_their_scopes() {
        let registry = PathRegistry::register([
            branch("Vehicle"),
            sensor("Vehicle.Speed", "float"),
            branch("Vehicle.Cabin"),
            branch("Vehicle.Cabin.Door"),
            sensor("Vehicle.Cabin.Door.Speed", "float"),
        ]);
        let units = lower_to_ir(&registry).unwrap();
        assert_eq!(names(&units), vec!["VssVehicle", "VssCabin", "VssDoor"]);

        let vehicle = find(&units, "VssVehicle");
        assert_eq!(vehicle.nested.len(), 1);
        assert_eq!(vehicle.nested[0].name, "VssSpeed");
        assert_eq!(vehicle.nested[0].node.path, "Vehicle.Speed");
        assert_eq!(
            vehicle.children.iter().map(|c| c.kind.clone()).collect::<Vec<_>>(),
            vec![ChildKind::Nested, ChildKind::Unit]
        );

        let door = find(&units, "VssDoor");
        assert_eq!(door.nested.len(), 1);
        assert_eq!(door.nested[0].node.path, "Vehicle.Cabin.Door.Speed");
        assert_eq!(door.parent.as_ref().map(ToString::to_string).as_deref(), Some("VssCabin"));
    }

    #[test]
    fn parent_inside_a_nested_type_is_qualified() {
        let registry = PathRegistry::register([
            branch("Vehicle"),
            branch("Vehicle.Cabin"),
            branch("Vehicle.Cabin.Door"),
            sensor("Vehicle.Cabin.Door.IsOpen", "boolean"),
            branch("Vehicle.Body"),
            branch("Vehicle.Body.Door"),
        ]);
        let units = lower_to_ir(&registry).unwrap();
        assert_eq!(names(&units), vec!["VssVehicle", "VssCabin", "VssIsOpen", "VssBody"]);

        let is_open = find(&units, "VssIsOpen");
        assert_eq!(
            is_open.parent,
            Some(ParentRef { unit: "VssCabin".into(), nested: vec!["VssDoor".into()] })
        );

        let cabin = find(&units, "VssCabin");
        let door = &cabin.nested[0];
        assert_eq!(door.name, "VssDoor");
        assert_eq!(door.children[0].kind, ChildKind::Unit);
        assert_eq!(door.children[0].name, "VssIsOpen");
    }

    #[test]
    fn nested_chains_keep_every_level() {
        let registry = PathRegistry::register([
            branch("Vehicle"),
            branch("Vehicle.Cabin"),
            branch("Vehicle.Cabin.Door"),
            branch("Vehicle.Cabin.Door.Row"),
            sensor("Vehicle.Cabin.Door.Row.Tint", "uint8"),
            branch("Vehicle.Body"),
            branch("Vehicle.Body.Door"),
            branch("Vehicle.Body.Door.Row"),
        ]);
        let units = lower_to_ir(&registry).unwrap();
        let tint = find(&units, "VssTint");
        assert_eq!(tint.parent.as_ref().unwrap().to_string(), "VssCabin.VssDoor.VssRow");

        let cabin = find(&units, "VssCabin");
        assert_eq!(cabin.nested[0].nested[0].name, "VssRow");
    }

    #[test]
    fn gaps_expose_the_next_registered_descendant() {
        let registry = PathRegistry::register([branch("Vehicle"), sensor("Vehicle.Cabin.Door.IsOpen", "boolean")]);
        let units = lower_to_ir(&registry).unwrap();
        let vehicle = find(&units, "VssVehicle");
        assert_eq!(vehicle.children.len(), 1);
        assert_eq!(vehicle.children[0].path, "Vehicle.Cabin.Door.IsOpen");
        assert_eq!(find(&units, "VssIsOpen").parent.as_ref().unwrap().unit, "VssVehicle");
    }

    #[test]
    fn collisions_behind_gaps_get_implicit_scopes() {
        let registry = PathRegistry::register([
            branch("Vehicle"),
            sensor("Vehicle.Speed", "float"),
            sensor("Vehicle.Cabin.Door.Speed", "float"),
        ]);
        let units = lower_to_ir(&registry).unwrap();
        assert_eq!(names(&units), vec!["VssVehicle"]);

        let vehicle = find(&units, "VssVehicle");
        let nested = vehicle.nested.iter().map(|n| (n.name.as_str(), n.implicit)).collect::<Vec<_>>();
        assert_eq!(nested, vec![("VssSpeed", false), ("VssCabin", true)]);
        assert_eq!(
            vehicle.children.iter().map(|c| c.path.as_str()).collect::<Vec<_>>(),
            vec!["Vehicle.Speed", "Vehicle.Cabin"]
        );

        let cabin = &vehicle.nested[1];
        assert_eq!(cabin.node.node_kind(), IMPLICIT_NODE_KIND);
        let door = &cabin.nested[0];
        assert_eq!((door.name.as_str(), door.implicit), ("VssDoor", true));
        assert_eq!(door.node.path, "Vehicle.Cabin.Door");
        assert_eq!(door.nested.len(), 1);
        assert_eq!(door.nested[0].name, "VssSpeed");
        assert_eq!(door.nested[0].node.path, "Vehicle.Cabin.Door.Speed");
        assert!(!door.nested[0].implicit);
    }

    #[test]
    fn colliding_members_share_one_implicit_scope() {
        let registry = PathRegistry::register([
            branch("Vehicle"),
            sensor("Vehicle.Speed", "float"),
            branch("Vehicle.Cabin.Row"),
            sensor("Vehicle.Cabin.Row.Speed", "float"),
            sensor("Vehicle.Cabin.Row.Tint", "uint8"),
            branch("Vehicle.Cabin.Seat.Row"),
        ]);
        let units = lower_to_ir(&registry).unwrap();
        assert_eq!(names(&units), vec!["VssVehicle", "VssTint"]);

        let vehicle = find(&units, "VssVehicle");
        let cabin = vehicle.nested.iter().find(|n| n.name == "VssCabin").unwrap();
        assert!(cabin.implicit);
        assert_eq!(
            cabin.nested.iter().map(|n| n.node.path.as_str()).collect::<Vec<_>>(),
            vec!["Vehicle.Cabin.Row", "Vehicle.Cabin.Seat"]
        );

        let tint = find(&units, "VssTint");
        assert_eq!(tint.parent.as_ref().unwrap().to_string(), "VssVehicle.VssCabin.VssRow");
    }

    #[test]
    fn orphaned_collisions_are_skipped() {
        let registry = PathRegistry::register([branch("Vehicle"), branch("Vehicle.Trailer.Vehicle")]);
        let units = lower_to_ir(&registry).unwrap();
        assert!(units.is_empty());
    }

    #[test]
    fn sanitized_name_clashes_are_rejected() {
        let registry = PathRegistry::register([
            branch("Vehicle"),
            sensor("Vehicle.O2-A", "float"),
            sensor("Vehicle.O2_A", "float"),
        ]);
        assert!(matches!(lower_to_ir(&registry), Err(GenError::Invariant(_))));
    }
}
