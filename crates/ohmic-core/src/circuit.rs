//! The circuit graph: components, node bookkeeping, labels, subcircuits.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use indexmap::IndexMap;
use nalgebra::DVector;

use crate::element::{Element, ElementKind, SourceKind, DIODE_ETA, DIODE_IS, DIODE_VT, DIODE_V_SEED};
use crate::error::{Error, Result};
use crate::mna::{AcSystem, MnaIndex, MnaSystem};
use crate::netlist::{self, SubcircuitDef};
use crate::node::{NodeId, NodeRegistry};

/// A circuit: the node registry, the component collection, label
/// equivalence classes, and the subcircuit definition table.
///
/// The graph is owned exclusively by its holder; analyses borrow it
/// mutably for their whole duration and nothing else may touch it
/// meanwhile.
#[derive(Debug, Default)]
pub struct Circuit {
    nodes: NodeRegistry,
    components: Vec<Element>,
    labels: BTreeMap<String, BTreeSet<NodeId>>,
    subcircuits: IndexMap<String, SubcircuitDef>,
    has_nonlinear: bool,
}

impl Circuit {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a component built from its string type key.
    ///
    /// `key` follows the factory table (R, C, L, V, AC, I, D, E, G, H, F)
    /// or names a registered subcircuit, which is expanded inline into
    /// primitives with `instance_` prefixed internal nodes.
    ///
    /// For independent sources, `value` is the DC level unless
    /// `is_sinusoidal` is set, in which case `numeric_params` carries
    /// `[offset, amplitude, frequency]`. For controlled sources, `value`
    /// is the gain and `string_params` names the two control nodes (E, G)
    /// or the controlling component (H, F).
    #[allow(clippy::too_many_arguments)]
    pub fn add_component(
        &mut self,
        key: &str,
        name: &str,
        n1: &str,
        n2: &str,
        value: f64,
        numeric_params: &[f64],
        string_params: &[&str],
        is_sinusoidal: bool,
    ) -> Result<()> {
        if let Some(existing) = self.components.iter().find(|c| c.name == name) {
            return Err(Error::DuplicateComponent {
                kind: existing.kind_label(),
                name: name.to_string(),
            });
        }

        if let Some(def) = self.subcircuits.get(key).cloned() {
            return self.expand_instance(&def, name, n1, n2);
        }

        let n1_id = self.nodes.intern(n1);
        let n2_id = self.nodes.intern(n2);

        let source_params = |is_sin: bool| -> Result<(SourceKind, f64, f64, f64)> {
            if is_sin {
                let &[p1, p2, p3] = numeric_params else {
                    return Err(Error::MalformedValue(
                        "sinusoidal sources need offset, amplitude, frequency".into(),
                    ));
                };
                Ok((SourceKind::Sin, p1, p2, p3))
            } else {
                Ok((SourceKind::Dc, value, 0.0, 0.0))
            }
        };

        let (header_value, kind) = match key {
            "R" => {
                if value <= 0.0 {
                    return Err(Error::NonPositiveValue("Resistance"));
                }
                (value, ElementKind::Resistor)
            }
            "C" => {
                if value <= 0.0 {
                    return Err(Error::NonPositiveValue("Capacitance"));
                }
                (value, ElementKind::Capacitor { v_prev: 0.0 })
            }
            "L" => {
                if value <= 0.0 {
                    return Err(Error::NonPositiveValue("Inductance"));
                }
                (value, ElementKind::Inductor { i_prev: 0.0 })
            }
            "V" => {
                let (src, p1, p2, p3) = source_params(is_sinusoidal)?;
                (
                    0.0,
                    ElementKind::VoltageSource {
                        kind: src,
                        p1,
                        p2,
                        p3,
                    },
                )
            }
            "AC" => (1.0, ElementKind::AcVoltageSource),
            "I" => {
                let (src, p1, p2, p3) = source_params(is_sinusoidal)?;
                (
                    0.0,
                    ElementKind::CurrentSource {
                        kind: src,
                        p1,
                        p2,
                        p3,
                    },
                )
            }
            "D" => (
                0.0,
                ElementKind::Diode {
                    is_sat: DIODE_IS,
                    eta: DIODE_ETA,
                    vt: DIODE_VT,
                    v_prev: DIODE_V_SEED,
                },
            ),
            "E" | "G" => {
                let &[ctrl_n1, ctrl_n2] = string_params else {
                    return Err(Error::MalformedValue(
                        "voltage-controlled sources need two control node names".into(),
                    ));
                };
                let ctrl_n1 = self.nodes.intern(ctrl_n1);
                let ctrl_n2 = self.nodes.intern(ctrl_n2);
                let kind = if key == "E" {
                    ElementKind::Vcvs {
                        ctrl_n1,
                        ctrl_n2,
                        gain: value,
                    }
                } else {
                    ElementKind::Vccs {
                        ctrl_n1,
                        ctrl_n2,
                        gain: value,
                    }
                };
                (0.0, kind)
            }
            "H" | "F" => {
                let &[ctrl] = string_params else {
                    return Err(Error::MalformedValue(
                        "current-controlled sources need a controlling component name".into(),
                    ));
                };
                let kind = if key == "H" {
                    ElementKind::Ccvs {
                        ctrl: ctrl.to_string(),
                        gain: value,
                    }
                } else {
                    ElementKind::Cccs {
                        ctrl: ctrl.to_string(),
                        gain: value,
                    }
                };
                (0.0, kind)
            }
            _ => return Err(Error::UnknownElementType(name.to_string())),
        };

        let element = Element {
            name: name.to_string(),
            n1: n1_id,
            n2: n2_id,
            value: header_value,
            kind,
        };
        self.has_nonlinear |= element.is_nonlinear();
        self.components.push(element);
        log::debug!("added {name}");
        Ok(())
    }

    /// Expand a subcircuit instance into primitives.
    ///
    /// The definition's two ports map to the instance terminals; every
    /// other internal node gets a fresh `instance_`-prefixed name, as do
    /// the expanded component names and any controlling-component
    /// references.
    fn expand_instance(
        &mut self,
        def: &SubcircuitDef,
        instance: &str,
        ext1: &str,
        ext2: &str,
    ) -> Result<()> {
        let mut node_map: HashMap<String, String> = HashMap::new();
        node_map.insert(def.port1.clone(), ext1.to_string());
        node_map.insert(def.port2.clone(), ext2.to_string());

        let mut mapped = |map: &mut HashMap<String, String>, internal: &str| -> String {
            map.entry(internal.to_string())
                .or_insert_with(|| format!("{instance}_{internal}"))
                .clone()
        };

        for line in &def.netlist {
            let parsed = netlist::parse_line(line)?;
            let new_name = format!("{instance}_{}", parsed.name);
            let n1 = mapped(&mut node_map, &parsed.n1);
            let n2 = mapped(&mut node_map, &parsed.n2);

            let string_params: Vec<String> = match parsed.key.as_str() {
                // control nodes live in the instance's node space
                "E" | "G" => parsed
                    .string_params
                    .iter()
                    .map(|n| mapped(&mut node_map, n))
                    .collect(),
                // controller references point at sibling components
                "H" | "F" => parsed
                    .string_params
                    .iter()
                    .map(|c| format!("{instance}_{c}"))
                    .collect(),
                _ => Vec::new(),
            };
            let string_params: Vec<&str> = string_params.iter().map(String::as_str).collect();

            self.add_component(
                &parsed.key,
                &new_name,
                &n1,
                &n2,
                parsed.value,
                &parsed.numeric_params,
                &string_params,
                parsed.is_sinusoidal,
            )?;
        }
        log::debug!("expanded subcircuit instance {instance} of type {}", def.name);
        Ok(())
    }

    /// Register a node as ground, creating it if unknown.
    pub fn add_ground(&mut self, node: &str) {
        let id = self.nodes.intern(node);
        self.nodes.mark_ground(id);
    }

    pub fn delete_ground(&mut self, node: &str) -> Result<()> {
        let id = self
            .nodes
            .get(node)
            .ok_or_else(|| Error::UnknownNode(node.to_string()))?;
        if !self.nodes.unmark_ground(id) {
            return Err(Error::NotGround(node.to_string()));
        }
        Ok(())
    }

    /// Merge two nodes into one; the smaller id survives.
    pub fn connect_nodes(&mut self, a: &str, b: &str) {
        let a = self.nodes.intern(a);
        let b = self.nodes.intern(b);
        self.merge_nodes(a.max(b), a.min(b));
    }

    /// Add a node to a label's equivalence class.
    pub fn add_label(&mut self, label: &str, node: &str) {
        let id = self.nodes.intern(node);
        self.labels.entry(label.to_string()).or_default().insert(id);
    }

    /// Collapse every label equivalence class of size > 1 into its
    /// smallest member. Runs before every assembly pass; idempotent.
    pub fn process_label_connections(&mut self) {
        let label_names: Vec<String> = self.labels.keys().cloned().collect();
        for label in label_names {
            // re-read the live membership: earlier merges may have
            // rewritten this class
            let members: Vec<NodeId> = match self.labels.get(&label) {
                Some(set) if set.len() > 1 => set.iter().copied().collect(),
                _ => continue,
            };
            let dst = members[0];
            for &src in &members[1..] {
                self.merge_nodes(src, dst);
            }
        }
    }

    fn merge_nodes(&mut self, src: NodeId, dst: NodeId) {
        if src == dst {
            return;
        }
        for comp in &mut self.components {
            if comp.n1 == src {
                comp.n1 = dst;
            }
            if comp.n2 == src {
                comp.n2 = dst;
            }
            // control references follow their targets too
            match &mut comp.kind {
                ElementKind::Vcvs {
                    ctrl_n1, ctrl_n2, ..
                }
                | ElementKind::Vccs {
                    ctrl_n1, ctrl_n2, ..
                } => {
                    if *ctrl_n1 == src {
                        *ctrl_n1 = dst;
                    }
                    if *ctrl_n2 == src {
                        *ctrl_n2 = dst;
                    }
                }
                _ => {}
            }
        }
        for members in self.labels.values_mut() {
            if members.remove(&src) {
                members.insert(dst);
            }
        }
        self.nodes.merge(src, dst);
        log::debug!("merged node {src} into {dst}");
    }

    pub fn delete_component(&mut self, name: &str) -> Result<()> {
        let before = self.components.len();
        self.components.retain(|c| c.name != name);
        if self.components.len() == before {
            return Err(Error::UnknownComponent(name.to_string()));
        }
        self.has_nonlinear = self.components.iter().any(Element::is_nonlinear);
        Ok(())
    }

    pub fn rename_node(&mut self, old: &str, new: &str) -> Result<()> {
        self.nodes.rename(old, new)
    }

    /// Overwrite the DC level of an independent DC source.
    pub fn set_source_value(&mut self, name: &str, value: f64) -> Result<()> {
        let comp = self
            .components
            .iter_mut()
            .find(|c| c.name == name)
            .ok_or_else(|| Error::UnknownComponent(name.to_string()))?;
        match &mut comp.kind {
            ElementKind::VoltageSource {
                kind: SourceKind::Dc,
                p1,
                ..
            }
            | ElementKind::CurrentSource {
                kind: SourceKind::Dc,
                p1,
                ..
            } => {
                *p1 = value;
                Ok(())
            }
            _ => Err(Error::NotADcSource(name.to_string())),
        }
    }

    /// Capture the current component list as a reusable subcircuit.
    pub fn define_subcircuit(&mut self, name: &str, port1: &str, port2: &str) -> Result<()> {
        self.add_subcircuit(SubcircuitDef {
            name: name.to_string(),
            port1: port1.to_string(),
            port2: port2.to_string(),
            netlist: self.netlist(),
        })
    }

    /// Register a subcircuit definition, e.g. one loaded from a library.
    pub fn add_subcircuit(&mut self, def: SubcircuitDef) -> Result<()> {
        if self.subcircuits.contains_key(&def.name) {
            return Err(Error::DuplicateSubcircuit(def.name));
        }
        self.subcircuits.insert(def.name.clone(), def);
        Ok(())
    }

    pub fn subcircuit(&self, name: &str) -> Option<&SubcircuitDef> {
        self.subcircuits.get(name)
    }

    /// Regenerate component-definition lines from the live components.
    pub fn netlist(&self) -> Vec<String> {
        self.components
            .iter()
            .filter_map(|c| self.render_component(c))
            .collect()
    }

    fn render_component(&self, comp: &Element) -> Option<String> {
        let n1 = self.nodes.name_of(comp.n1)?;
        let n2 = self.nodes.name_of(comp.n2)?;
        let head = format!("{} {n1} {n2}", comp.name);
        let line = match &comp.kind {
            ElementKind::Resistor => format!("R {head} {}", comp.value),
            ElementKind::Capacitor { .. } => format!("C {head} {}", comp.value),
            ElementKind::Inductor { .. } => format!("L {head} {}", comp.value),
            ElementKind::Diode { .. } => format!("D {head} D"),
            ElementKind::VoltageSource { kind, p1, p2, p3 } => match kind {
                SourceKind::Dc => format!("V {head} {p1}"),
                SourceKind::Sin => format!("V {head} SIN({p1} {p2} {p3})"),
            },
            ElementKind::AcVoltageSource => format!("AC {head}"),
            ElementKind::CurrentSource { kind, p1, p2, p3 } => match kind {
                SourceKind::Dc => format!("I {head} {p1}"),
                SourceKind::Sin => format!("I {head} SIN({p1} {p2} {p3})"),
            },
            ElementKind::Vcvs {
                ctrl_n1,
                ctrl_n2,
                gain,
            } => {
                let c1 = self.nodes.name_of(*ctrl_n1)?;
                let c2 = self.nodes.name_of(*ctrl_n2)?;
                format!("E {head} {c1} {c2} {gain}")
            }
            ElementKind::Vccs {
                ctrl_n1,
                ctrl_n2,
                gain,
            } => {
                let c1 = self.nodes.name_of(*ctrl_n1)?;
                let c2 = self.nodes.name_of(*ctrl_n2)?;
                format!("G {head} {c1} {c2} {gain}")
            }
            ElementKind::Ccvs { ctrl, gain } => format!("H {head} {ctrl} {gain}"),
            ElementKind::Cccs { ctrl, gain } => format!("F {head} {ctrl} {gain}"),
        };
        Some(line)
    }

    /// Drop everything: components, nodes, labels, and definitions.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.components.clear();
        self.labels.clear();
        self.subcircuits.clear();
        self.has_nonlinear = false;
    }

    // --- accessors ---

    pub fn component(&self, name: &str) -> Option<&Element> {
        self.components.iter().find(|c| c.name == name)
    }

    pub fn components(&self) -> &[Element] {
        &self.components
    }

    pub fn nodes(&self) -> &NodeRegistry {
        &self.nodes
    }

    pub fn node_id(&self, name: &str) -> Option<NodeId> {
        self.nodes.get(name)
    }

    pub fn has_node(&self, name: &str) -> bool {
        self.nodes.contains(name)
    }

    pub fn has_ground(&self) -> bool {
        self.nodes.has_ground()
    }

    pub fn has_nonlinear(&self) -> bool {
        self.has_nonlinear
    }

    pub fn has_ac_source(&self) -> bool {
        self.components
            .iter()
            .any(|c| matches!(c.kind, ElementKind::AcVoltageSource))
    }

    // --- assembly ---

    /// Row assignments for the current topology. Label classes collapse
    /// first, so the index reflects the merged graph.
    pub fn mna_index(&mut self) -> MnaIndex {
        self.process_label_connections();
        MnaIndex::build(&self.nodes, &self.components)
    }

    /// Assemble the time-domain system at `(time, h)`.
    ///
    /// `h == 0` assembles the DC operating point. The returned system may
    /// be empty when the circuit has no unknowns.
    pub fn assemble_tran(&mut self, time: f64, h: f64) -> Result<(MnaSystem, MnaIndex)> {
        let index = self.mna_index();
        let mut sys = MnaSystem::new(index.size());
        for comp in &self.components {
            comp.stamp_tran(&mut sys, &index, time, h, index.branch_row(&comp.name))?;
        }
        Ok((sys, index))
    }

    /// Assemble the frequency-domain system at angular frequency `omega`.
    pub fn assemble_ac(&mut self, omega: f64) -> Result<(AcSystem, MnaIndex)> {
        let index = self.mna_index();
        let mut sys = AcSystem::new(index.size());
        for comp in &self.components {
            comp.stamp_ac(&mut sys, &index, omega, index.branch_row(&comp.name))?;
        }
        Ok((sys, index))
    }

    // --- analysis state hooks ---

    /// Clear every component's transient state before a new run.
    pub fn reset_states(&mut self) {
        for comp in &mut self.components {
            comp.reset();
        }
    }

    /// Commit an accepted solution into every component's state.
    pub fn update_states(&mut self, solution: &DVector<f64>, index: &MnaIndex) {
        for comp in &mut self.components {
            comp.update_state(solution, index);
        }
    }

    /// Relinearization hook: update only nonlinear components, leaving
    /// linear history untouched mid-iteration.
    pub fn update_nonlinear_states(&mut self, solution: &DVector<f64>, index: &MnaIndex) {
        for comp in &mut self.components {
            if comp.is_nonlinear() {
                comp.update_state(solution, index);
            }
        }
    }
}
