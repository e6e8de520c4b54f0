//! `ParameterNode`: contenedor con nombre de parámetros y de otros nodos.
//!
//! Rol en el registro:
//! - Resuelve nombres a parámetros, nodos hijos o campos ordinarios
//!   (`get_attr` / `set_attr` / `item`).
//! - Con `use_as_attributes` activo, leer o escribir un nombre de parámetro
//!   reenvía a su `get`/`set`; desactivado (el default, pensado para nodos
//!   que representan hardware) se expone el objeto `Parameter`.
//! - Guarda los getters/setters de parámetros delegados, registrados por
//!   nombre en cualquier momento antes del primer get/set.
//! - Produce snapshots (ver `snapshot`) y tablas legibles (ver `readable`).
//!
//! Invariante: un nombre pertenece a lo sumo a un tipo de miembro
//! (parámetro, nodo, función, submódulo o campo). Re-asignar el mismo tipo
//! reemplaza; asignar otro tipo falla con `NameCollision` sin tocar el
//! binding original.

mod attribute;
mod delegate;
mod function;
pub mod readable;
pub mod snapshot;

use indexmap::IndexMap;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::{Rc, Weak};

pub use attribute::{Attribute, Member, MemberKind};
pub use delegate::{DelegatePair, Getter, Setter};
pub use function::{FunctionCall, NodeFunction};

use crate::constants::{FULL_NAME_SEPARATOR, NODE_CLASS};
use crate::errors::{RegistryError, Result};
use crate::parameter::Parameter;

/// Configuración de un nodo. Serializable para poder guardarla junto a un
/// snapshot; los campos ausentes toman el valor por defecto.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    /// Reenvía el acceso por atributo al get/set de los parámetros.
    pub use_as_attributes: bool,
    /// Snapshot reducido a `nombre -> valor`.
    pub simplify_snapshot: bool,
    /// Propaga `log_changes` a los parámetros en su primer attach.
    pub log_changes: bool,
    /// Tag de tipo usado en `__class__`.
    pub class_name: String,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self { use_as_attributes: false,
               simplify_snapshot: false,
               log_changes: false,
               class_name: NODE_CLASS.to_string() }
    }
}

impl NodeConfig {
    pub fn with_use_as_attributes(mut self, on: bool) -> Self {
        self.use_as_attributes = on;
        self
    }

    pub fn with_simplify_snapshot(mut self, on: bool) -> Self {
        self.simplify_snapshot = on;
        self
    }

    pub fn with_log_changes(mut self, on: bool) -> Self {
        self.log_changes = on;
        self
    }

    pub fn with_class_name(mut self, class_name: impl Into<String>) -> Self {
        self.class_name = class_name.into();
        self
    }
}

pub(crate) struct NodeState {
    name: Option<String>,
    config: NodeConfig,
    parameters: IndexMap<String, Parameter>,
    parameter_nodes: IndexMap<String, ParameterNode>,
    submodules: IndexMap<String, ParameterNode>,
    functions: IndexMap<String, NodeFunction>,
    fields: IndexMap<String, Value>,
    delegates: HashMap<String, DelegatePair>,
}

pub(crate) struct NodeInner {
    state: RefCell<NodeState>,
    // Vacío hasta el primer attach; `remove_node` lo libera.
    parent: RefCell<Weak<NodeInner>>,
}

/// Handle (`Rc`) a un nodo; los clones comparten estado.
#[derive(Clone)]
pub struct ParameterNode {
    inner: Rc<NodeInner>,
}

impl ParameterNode {
    pub fn new(name: impl Into<String>) -> Self {
        let name: String = name.into();
        Self::with_config(Some(&name), NodeConfig::default())
    }

    /// Nodo raíz sin nombre.
    pub fn root() -> Self {
        Self::with_config(None, NodeConfig::default())
    }

    pub fn with_config(name: Option<&str>, config: NodeConfig) -> Self {
        let state = NodeState { name: name.map(str::to_string),
                                config,
                                parameters: IndexMap::new(),
                                parameter_nodes: IndexMap::new(),
                                submodules: IndexMap::new(),
                                functions: IndexMap::new(),
                                fields: IndexMap::new(),
                                delegates: HashMap::new() };
        Self { inner: Rc::new(NodeInner { state: RefCell::new(state),
                                          parent: RefCell::new(Weak::new()) }) }
    }

    pub(crate) fn inner(&self) -> &Rc<NodeInner> {
        &self.inner
    }

    pub(crate) fn from_inner(inner: Rc<NodeInner>) -> Self {
        Self { inner }
    }

    pub fn ptr_eq(&self, other: &ParameterNode) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    pub fn name(&self) -> Option<String> {
        self.inner.state.borrow().name.clone()
    }

    /// Cambia el nombre; los `full_name` de los descendientes lo reflejan
    /// inmediatamente porque se calculan al leerlos.
    pub fn rename(&self, name: impl Into<String>) {
        self.inner.state.borrow_mut().name = Some(name.into());
    }

    pub fn config(&self) -> NodeConfig {
        self.inner.state.borrow().config.clone()
    }

    pub fn set_use_as_attributes(&self, on: bool) {
        self.inner.state.borrow_mut().config.use_as_attributes = on;
    }

    pub fn set_simplify_snapshot(&self, on: bool) {
        self.inner.state.borrow_mut().config.simplify_snapshot = on;
    }

    pub fn parent(&self) -> Option<ParameterNode> {
        self.inner.parent.borrow().upgrade().map(Self::from_inner)
    }

    /// Nombres de los ancestros con nombre, desde la raíz hasta este nodo.
    pub fn path(&self) -> Vec<String> {
        let mut parts = Vec::new();
        let mut current = Some(self.clone());
        while let Some(node) = current {
            if let Some(name) = node.name() {
                parts.push(name);
            }
            current = node.parent();
        }
        parts.reverse();
        parts
    }

    pub fn full_name(&self) -> String {
        self.path().join(FULL_NAME_SEPARATOR)
    }

    /// Nombre para mensajes: ruta completa o, si no tiene, el tag de tipo.
    pub fn display_name(&self) -> String {
        let full = self.full_name();
        if full.is_empty() {
            self.inner.state.borrow().config.class_name.clone()
        } else {
            full
        }
    }

    /// Qué tipo de miembro ocupa `name`, si alguno.
    pub fn kind_of(&self, name: &str) -> Option<MemberKind> {
        let s = self.inner.state.borrow();
        if s.parameters.contains_key(name) {
            Some(MemberKind::Parameter)
        } else if s.parameter_nodes.contains_key(name) {
            Some(MemberKind::ParameterNode)
        } else if s.functions.contains_key(name) {
            Some(MemberKind::Function)
        } else if s.submodules.contains_key(name) {
            Some(MemberKind::Submodule)
        } else if s.fields.contains_key(name) {
            Some(MemberKind::Field)
        } else {
            None
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.kind_of(name).is_some()
    }

    // ---- binding ---------------------------------------------------------

    /// Asigna `attr` al nombre `name` (ver reglas en la doc del módulo).
    pub fn set_attr(&self, name: &str, attr: impl Into<Attribute>) -> Result<()> {
        match attr.into() {
            Attribute::Parameter(p) => self.bind_parameter(name, p).map(|_| ()),
            Attribute::Node(n) => self.bind_node(name, n).map(|_| ()),
            Attribute::Value(v) | Attribute::Field(v) => self.bind_value(name, v),
        }
    }

    /// Registra el parámetro bajo su propio nombre y devuelve el handle.
    pub fn add_parameter(&self, parameter: Parameter) -> Result<Parameter> {
        let name = parameter.name();
        self.bind_parameter(&name, parameter)
    }

    /// Registra `node` como hijo bajo `name` y devuelve el handle.
    pub fn add_node(&self, name: &str, node: ParameterNode) -> Result<ParameterNode> {
        self.bind_node(name, node)
    }

    fn bind_parameter(&self, name: &str, parameter: Parameter) -> Result<Parameter> {
        self.ensure_free(name, MemberKind::Parameter)?;
        parameter.attach(self, name);
        self.inner.state.borrow_mut().parameters.insert(name.to_string(), parameter.clone());
        Ok(parameter)
    }

    fn bind_node(&self, name: &str, node: ParameterNode) -> Result<ParameterNode> {
        self.ensure_free(name, MemberKind::ParameterNode)?;
        self.ensure_acyclic(name, &node)?;
        node.adopt(self, name);
        self.inner.state.borrow_mut().parameter_nodes.insert(name.to_string(), node.clone());
        Ok(node)
    }

    fn bind_value(&self, name: &str, value: Value) -> Result<()> {
        let forwarding = self.inner.state.borrow().config.use_as_attributes;
        match self.kind_of(name) {
            Some(MemberKind::Parameter) if forwarding => self.parameter(name)?.set(value),
            None | Some(MemberKind::Field) => {
                self.inner.state.borrow_mut().fields.insert(name.to_string(), value);
                Ok(())
            }
            Some(existing) => Err(self.collision(name, existing)),
        }
    }

    /// Fija el padre si aún no tiene y adopta `name` si el padre es `parent`.
    fn adopt(&self, parent: &ParameterNode, name: &str) {
        let first = self.parent().is_none();
        if first {
            *self.inner.parent.borrow_mut() = Rc::downgrade(&parent.inner);
        }
        let adopted = self.parent().is_some_and(|p| p.ptr_eq(parent));
        if !adopted {
            warn!("node '{}' already has a parent; keeping it", self.display_name());
            return;
        }
        self.inner.state.borrow_mut().name = Some(name.to_string());
        if first {
            debug!("attached node '{}'", self.full_name());
        }
    }

    fn ensure_free(&self, name: &str, kind: MemberKind) -> Result<()> {
        match self.kind_of(name) {
            None => Ok(()),
            Some(existing) if existing == kind => Ok(()),
            Some(existing) => Err(self.collision(name, existing)),
        }
    }

    // Un nodo no puede colgar de sí mismo ni de nada que ya lo contenga. Se
    // recorre el contenido real (hijos y submódulos), no la cadena de padres:
    // un nodo puede estar registrado en más de un sitio.
    fn ensure_acyclic(&self, name: &str, node: &ParameterNode) -> Result<()> {
        if node.contains_node(self) {
            return Err(RegistryError::CyclicAttachment { node: self.display_name(),
                                                         name: name.to_string() });
        }
        Ok(())
    }

    /// `true` si `target` es este nodo o aparece en su subárbol.
    pub fn contains_node(&self, target: &ParameterNode) -> bool {
        let mut pending = vec![self.clone()];
        let mut visited = HashSet::new();
        while let Some(node) = pending.pop() {
            if node.ptr_eq(target) {
                return true;
            }
            if !visited.insert(Rc::as_ptr(&node.inner)) {
                continue;
            }
            let s = node.inner.state.borrow();
            pending.extend(s.parameter_nodes.values().cloned());
            pending.extend(s.submodules.values().cloned());
        }
        false
    }

    fn collision(&self, name: &str, existing: MemberKind) -> RegistryError {
        RegistryError::NameCollision { node: self.display_name(),
                                       name: name.to_string(),
                                       existing: existing.to_string() }
    }

    fn not_found(&self, name: &str) -> RegistryError {
        RegistryError::AttributeNotFound { node: self.display_name(),
                                           name: name.to_string() }
    }

    // ---- resolution ------------------------------------------------------

    /// Resolución por atributo, en orden: parámetro (valor si hay reenvío,
    /// objeto si no), nodo hijo, submódulo, campo ordinario. Las funciones se
    /// invocan con `call`.
    pub fn get_attr(&self, name: &str) -> Result<Attribute> {
        let (parameter, forwarding) = {
            let s = self.inner.state.borrow();
            (s.parameters.get(name).cloned(), s.config.use_as_attributes)
        };
        if let Some(p) = parameter {
            return if forwarding {
                Ok(Attribute::Value(p.get()?))
            } else {
                Ok(Attribute::Parameter(p))
            };
        }
        let s = self.inner.state.borrow();
        if let Some(n) = s.parameter_nodes.get(name).or_else(|| s.submodules.get(name)) {
            return Ok(Attribute::Node(n.clone()));
        }
        if let Some(v) = s.fields.get(name) {
            return Ok(Attribute::Field(v.clone()));
        }
        drop(s);
        Err(self.not_found(name))
    }

    /// Acceso por índice: siempre el objeto crudo, ignore o no el reenvío.
    pub fn item(&self, name: &str) -> Result<Member> {
        let s = self.inner.state.borrow();
        if let Some(p) = s.parameters.get(name) {
            return Ok(Member::Parameter(p.clone()));
        }
        if let Some(n) = s.parameter_nodes.get(name).or_else(|| s.submodules.get(name)) {
            return Ok(Member::Node(n.clone()));
        }
        drop(s);
        Err(self.not_found(name))
    }

    pub fn parameter(&self, name: &str) -> Result<Parameter> {
        let found = self.inner.state.borrow().parameters.get(name).cloned();
        found.ok_or_else(|| self.not_found(name))
    }

    pub fn node(&self, name: &str) -> Result<ParameterNode> {
        let found = self.inner.state.borrow().parameter_nodes.get(name).cloned();
        found.ok_or_else(|| self.not_found(name))
    }

    /// Quita el nodo hijo `name` y lo devuelve. Si este nodo era su padre, el
    /// hijo queda libre para colgarse en otro sitio.
    pub fn remove_node(&self, name: &str) -> Result<ParameterNode> {
        let removed = self.inner.state.borrow_mut().parameter_nodes.shift_remove(name);
        let node = removed.ok_or_else(|| self.not_found(name))?;
        if node.parent().is_some_and(|p| p.ptr_eq(self)) {
            *node.inner.parent.borrow_mut() = Weak::new();
        }
        debug!("removed node '{}' from '{}'", name, self.display_name());
        Ok(node)
    }

    pub fn field(&self, name: &str) -> Result<Value> {
        let found = self.inner.state.borrow().fields.get(name).cloned();
        found.ok_or_else(|| self.not_found(name))
    }

    /// `get` del parámetro `name`, independiente de `use_as_attributes`.
    pub fn get(&self, name: &str) -> Result<Value> {
        self.parameter(name)?.get()
    }

    /// `set` del parámetro `name`, independiente de `use_as_attributes`.
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<()> {
        self.parameter(name)?.set(value)
    }

    /// Parámetros en orden de inserción.
    pub fn parameters(&self) -> Vec<(String, Parameter)> {
        let s = self.inner.state.borrow();
        s.parameters.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    pub fn parameter_names(&self) -> Vec<String> {
        self.inner.state.borrow().parameters.keys().cloned().collect()
    }

    /// Nodos hijos en orden de inserción.
    pub fn parameter_nodes(&self) -> Vec<(String, ParameterNode)> {
        let s = self.inner.state.borrow();
        s.parameter_nodes.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }

    // ---- delegates -------------------------------------------------------

    /// Registra el getter del parámetro delegado `name`. Puede hacerse antes
    /// o después de declarar el parámetro.
    pub fn register_parameter_getter<F>(&self, name: &str, getter: F)
        where F: Fn(&ParameterNode, &Parameter) -> Result<Value> + 'static
    {
        self.inner.state.borrow_mut().delegates.entry(name.to_string()).or_default().getter = Some(Rc::new(getter));
        debug!("registered getter for '{}' on '{}'", name, self.display_name());
    }

    pub fn register_parameter_setter<F>(&self, name: &str, setter: F)
        where F: Fn(&ParameterNode, &Parameter, Value) -> Result<()> + 'static
    {
        self.inner.state.borrow_mut().delegates.entry(name.to_string()).or_default().setter = Some(Rc::new(setter));
        debug!("registered setter for '{}' on '{}'", name, self.display_name());
    }

    pub(crate) fn delegates_for(&self, name: &str) -> DelegatePair {
        self.inner.state.borrow().delegates.get(name).cloned().unwrap_or_default()
    }

    // ---- functions & submodules -----------------------------------------

    pub fn add_function<F>(&self, name: &str, call: F) -> Result<()>
        where F: Fn(&[Value]) -> Result<Value> + 'static
    {
        self.ensure_free(name, MemberKind::Function)?;
        let function = NodeFunction { name: name.to_string(),
                                      call: Rc::new(call) };
        self.inner.state.borrow_mut().functions.insert(name.to_string(), function);
        Ok(())
    }

    /// Invoca la función `name`.
    pub fn call(&self, name: &str, args: &[Value]) -> Result<Value> {
        let function = self.inner.state.borrow().functions.get(name).cloned();
        match function {
            Some(f) => (f.call)(args),
            None => Err(RegistryError::FunctionNotFound { node: self.display_name(),
                                                          name: name.to_string() }),
        }
    }

    pub fn function_names(&self) -> Vec<String> {
        self.inner.state.borrow().functions.keys().cloned().collect()
    }

    pub fn add_submodule(&self, name: &str, node: ParameterNode) -> Result<ParameterNode> {
        self.ensure_free(name, MemberKind::Submodule)?;
        self.ensure_acyclic(name, &node)?;
        node.adopt(self, name);
        self.inner.state.borrow_mut().submodules.insert(name.to_string(), node.clone());
        Ok(node)
    }

    pub fn submodule(&self, name: &str) -> Result<ParameterNode> {
        let found = self.inner.state.borrow().submodules.get(name).cloned();
        found.ok_or_else(|| self.not_found(name))
    }

    pub fn submodules(&self) -> Vec<(String, ParameterNode)> {
        let s = self.inner.state.borrow();
        s.submodules.iter().map(|(k, v)| (k.clone(), v.clone())).collect()
    }
}

impl fmt::Debug for ParameterNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.inner.state.borrow();
        f.debug_struct("ParameterNode")
         .field("name", &s.name)
         .field("class", &s.config.class_name)
         .field("parameters", &s.parameters.keys().collect::<Vec<_>>())
         .field("parameter_nodes", &s.parameter_nodes.keys().collect::<Vec<_>>())
         .finish()
    }
}

impl fmt::Display for ParameterNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn path_skips_unnamed_root() {
        let root = ParameterNode::root();
        let child = root.add_node("awg", ParameterNode::new("tmp")).unwrap();
        let grandchild = child.add_node("ch1", ParameterNode::root()).unwrap();
        assert_eq!(grandchild.path(), vec!["awg".to_string(), "ch1".to_string()]);
        assert_eq!(grandchild.full_name(), "awg_ch1");
        assert_eq!(root.display_name(), "ParameterNode");
    }

    #[test]
    fn node_config_deserializes_with_defaults() {
        let config: NodeConfig = serde_json::from_value(json!({"simplify_snapshot": true})).unwrap();
        assert!(config.simplify_snapshot);
        assert!(!config.use_as_attributes);
        assert_eq!(config.class_name, "ParameterNode");
    }

    #[test]
    fn field_binding_without_forwarding() {
        let node = ParameterNode::new("n");
        node.set_attr("comment", "calibrated").unwrap();
        assert_eq!(node.kind_of("comment"), Some(MemberKind::Field));
        assert_eq!(node.get_attr("comment").unwrap().into_value(), Some(json!("calibrated")));
    }

    #[test]
    fn node_cannot_be_attached_below_itself() {
        let a = ParameterNode::new("a");
        let b = a.add_node("b", ParameterNode::new("b")).unwrap();
        assert!(matches!(b.add_node("a", a.clone()), Err(RegistryError::CyclicAttachment { .. })));
        assert!(matches!(a.add_node("self", a.clone()), Err(RegistryError::CyclicAttachment { .. })));
    }

    #[test]
    fn node_registered_twice_cannot_contain_its_holder() {
        let q = ParameterNode::new("q");
        let r = ParameterNode::new("r");
        let p = q.add_node("p", ParameterNode::new("p")).unwrap();
        r.add_node("p", p.clone()).unwrap();
        assert!(p.parent().unwrap().ptr_eq(&q));

        assert!(matches!(p.add_node("r", r.clone()), Err(RegistryError::CyclicAttachment { .. })));
        assert!(matches!(p.add_submodule("r", r.clone()), Err(RegistryError::CyclicAttachment { .. })));
        assert!(r.snapshot().is_ok());
    }

    #[test]
    fn submodules_resolve_as_attributes() {
        let dev = ParameterNode::new("dev");
        let ch1 = dev.add_submodule("ch1", ParameterNode::root()).unwrap();
        assert_eq!(dev.kind_of("ch1"), Some(MemberKind::Submodule));
        match dev.get_attr("ch1").unwrap() {
            Attribute::Node(node) => assert!(node.ptr_eq(&ch1)),
            other => panic!("unexpected attribute {other:?}"),
        }
    }

    #[test]
    fn removed_node_can_be_attached_elsewhere() {
        let a = ParameterNode::new("a");
        let b = ParameterNode::new("b");
        let child = a.add_node("x", ParameterNode::root()).unwrap();
        assert_eq!(child.full_name(), "a_x");

        let removed = a.remove_node("x").unwrap();
        assert!(removed.ptr_eq(&child));
        assert!(child.parent().is_none());
        assert_eq!(a.kind_of("x"), None);
        assert!(matches!(a.remove_node("x"), Err(RegistryError::AttributeNotFound { .. })));

        b.add_node("y", child.clone()).unwrap();
        assert_eq!(child.full_name(), "b_y");
    }

    #[test]
    fn functions_are_callable_and_named_uniquely() {
        let node = ParameterNode::new("dev");
        node.add_function("double", |args| Ok(json!(args[0].as_i64().unwrap_or_default() * 2)))
            .unwrap();
        assert_eq!(node.call("double", &[json!(21)]).unwrap(), json!(42));
        assert!(matches!(node.call("missing", &[]), Err(RegistryError::FunctionNotFound { .. })));
        assert!(matches!(node.set_attr("double", Parameter::new("x")),
                         Err(RegistryError::NameCollision { .. })));
    }
}
