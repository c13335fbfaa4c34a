use std::cell::RefCell;
use std::rc::Rc;

use log::{debug, warn};
use serde_json::Value;

use simtree_shared::{
    AspectBody, CompositeBody, ConnectionBody, DynamicsBody, EntityBody, FunctionBody, Node,
    NodeBody, NodeKind, NodePath, NodeRef, QuantityBody, SubTreeBody, SubTreeKind, TextBody,
};

use crate::error::TreeError;

use super::{RuntimeTree, TreeListener, WatchCallback, WatchRegistry};

/// Listeners are shared with the embedding code; identity (`Rc::ptr_eq`)
/// is what `remove_listener` matches on.
pub type SharedListener = Rc<RefCell<dyn TreeListener>>;

/// Builds the node graph from an initial full snapshot and merges every
/// later snapshot into the existing graph by path.
///
/// Nodes are never replaced once created: reconciliation mutates
/// value-bearing fields in place, so external holders of a node reference
/// keep seeing the live object. The factory is the sole writer of the graph.
pub struct TreeFactory {
    tree: RuntimeTree,
    watches: WatchRegistry,
    listeners: Vec<SharedListener>,
    built: bool,
}

impl TreeFactory {
    pub fn new() -> Self {
        Self {
            tree: RuntimeTree::new(),
            watches: WatchRegistry::new(),
            listeners: Vec::new(),
            built: false,
        }
    }

    pub fn tree(&self) -> &RuntimeTree {
        &self.tree
    }

    pub fn get_node_by_path(&self, path: &NodePath) -> Option<NodeRef> {
        self.tree.get_node_by_path(path)
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    /// Register interest in a variable path. The callback fires with the
    /// node's latest value after each reconciliation pass.
    pub fn watch(&mut self, path: NodePath, callback: WatchCallback) {
        self.watches.watch(path, callback);
    }

    pub fn unwatch(&mut self, path: &NodePath) {
        self.watches.unwatch(path);
    }

    pub fn clear_watches(&mut self) {
        self.watches.clear();
    }

    pub fn watch_count(&self) -> usize {
        self.watches.len()
    }

    pub fn add_listener(&mut self, listener: SharedListener) {
        self.listeners.push(listener);
    }

    pub fn remove_listener(&mut self, listener: &SharedListener) {
        self.listeners
            .retain(|registered| !Rc::ptr_eq(registered, listener));
    }

    /// Construct the graph from a full snapshot keyed by top-level entity id.
    ///
    /// Entries whose declared kind is `Entity` are constructed recursively
    /// (aspects, connections, nested entities). Calling this again before a
    /// [`discard`](Self::discard) is a usage error.
    pub fn build_initial(&mut self, snapshot: &Value) -> Result<(), TreeError> {
        if self.built {
            return Err(TreeError::AlreadyBuilt);
        }
        let entries = snapshot.as_object().ok_or(TreeError::MalformedSnapshot)?;
        for (id, value) in entries {
            if declared_kind(value) == Some(NodeKind::Entity) {
                let entity = self.create_entity(id, value);
                self.tree.insert_root(id, entity);
            }
        }
        self.built = true;
        debug!("initial tree built, {} nodes indexed", self.tree.node_count());
        Ok(())
    }

    /// Merge a snapshot into the live graph.
    ///
    /// Existing paths get only their value-bearing fields copied; node
    /// objects are never replaced. A `Simulation` or `Model` subtree
    /// appearing for the first time under a live aspect is constructed
    /// lazily with `dirty` set. A path with no live counterpart fails that
    /// single path's update and the pass continues; nothing rolls back.
    ///
    /// After the merge, registered listeners are notified first, then every
    /// watched path's callback fires with its node's current value.
    pub fn reconcile(&mut self, snapshot: &Value) {
        self.clear_dirty();
        self.reconcile_value(snapshot);
        self.notify();
    }

    /// Drop the whole graph and the watch registry. Must run before another
    /// `build_initial`, e.g. on simulation reload or stop.
    pub fn discard(&mut self) {
        self.tree.clear();
        self.watches.clear();
        self.built = false;
    }

    // Initial construction

    fn create_entity(&mut self, key: &str, value: &Value) -> NodeRef {
        let path = declared_path(value, &NodePath::new(key));
        let position = value
            .get("position")
            .and_then(|p| serde_json::from_value(p.clone()).ok());
        let node = Node::new(
            path.clone(),
            declared_id(value, key),
            NodeBody::Entity(EntityBody {
                position,
                ..EntityBody::default()
            }),
        );
        self.tree.index_node(&node);

        if let Some(members) = value.as_object() {
            for (member_key, member) in members {
                if is_reserved_key(member_key) {
                    continue;
                }
                for child_value in candidate_objects(member) {
                    self.attach_entity_child(&node, &path, member_key, child_value);
                }
            }
        }
        node
    }

    fn attach_entity_child(
        &mut self,
        entity: &NodeRef,
        entity_path: &NodePath,
        key: &str,
        value: &Value,
    ) {
        match declared_kind(value) {
            Some(NodeKind::Entity) => {
                let child = self.create_entity(key, value);
                if let NodeBody::Entity(body) = &mut entity.borrow_mut().body {
                    body.entities.push(child);
                }
            }
            Some(NodeKind::Aspect) => {
                let child = self.create_aspect(key, value, entity_path);
                if let NodeBody::Entity(body) = &mut entity.borrow_mut().body {
                    body.aspects.push(child);
                }
            }
            Some(NodeKind::Connection) => {
                let child = self.create_connection(key, value, entity_path);
                if let NodeBody::Entity(body) = &mut entity.borrow_mut().body {
                    body.connections.push(child);
                }
            }
            _ => {}
        }
    }

    fn create_aspect(&mut self, key: &str, value: &Value, parent_path: &NodePath) -> NodeRef {
        let path = declared_path(value, &parent_path.join(key));
        let node = Node::new(
            path.clone(),
            declared_id(value, key),
            NodeBody::Aspect(AspectBody {
                simulator: string_field(value, "simulator"),
                model_interpreter: string_field(value, "modelInterpreter"),
                ..AspectBody::default()
            }),
        );
        self.tree.index_node(&node);

        // subtrees declared in the snapshot are constructed right away; a
        // missing Simulation or Model subtree appears lazily on reconcile
        if let Some(members) = value.as_object() {
            for (subtree_key, member) in members {
                if is_reserved_key(subtree_key) {
                    continue;
                }
                if declared_kind(member) != Some(NodeKind::AspectSubTree) {
                    continue;
                }
                if let Some(subtree) = self.create_subtree(subtree_key, member, &path) {
                    let kind = subtree_kind_of(&subtree);
                    if let NodeBody::Aspect(body) = &mut node.borrow_mut().body {
                        body.set_subtree(kind, subtree);
                    }
                }
            }
        }
        node
    }

    fn create_subtree(
        &mut self,
        key: &str,
        value: &Value,
        parent_path: &NodePath,
    ) -> Option<NodeRef> {
        let tag = value.get("type").and_then(Value::as_str).unwrap_or(key);
        let Some(kind) = SubTreeKind::from_tag(tag) else {
            warn!("skipping aspect subtree with unrecognized type {tag:?}");
            return None;
        };
        let path = declared_path(value, &parent_path.join(kind.tag()));
        let mut body = SubTreeBody::new(kind);
        if kind == SubTreeKind::Visualization {
            body.content = Some(value.clone());
        }
        let node = Node::new(path, declared_id(value, key), NodeBody::AspectSubTree(body));
        self.tree.index_node(&node);
        self.populate_children(&node, value);
        Some(node)
    }

    fn create_connection(&mut self, key: &str, value: &Value, parent_path: &NodePath) -> NodeRef {
        let entity_path = value
            .get("entityPath")
            .or_else(|| value.get("entityInstancePath"))
            .and_then(Value::as_str)
            .map(NodePath::new)
            .unwrap_or_else(|| NodePath::new(""));
        let connection_type = string_field(value, "connectionType")
            .or_else(|| string_field(value, "type"));
        let node = Node::new(
            declared_path(value, &parent_path.join(key)),
            declared_id(value, key),
            NodeBody::Connection(ConnectionBody {
                entity_path,
                connection_type,
            }),
        );
        self.tree.index_node(&node);
        node
    }

    /// Per-kind construction of an aspect subtree's contents, the same rules
    /// for the initial build and for lazily created subtrees.
    fn populate_children(&mut self, parent: &NodeRef, value: &Value) {
        let parent_path = parent.borrow().path().clone();
        let Some(members) = value.as_object() else {
            return;
        };
        for (key, member) in members {
            if is_reserved_key(key) {
                continue;
            }
            match member {
                Value::Array(elements) => {
                    // ordered wrapper for the array member
                    let wrapper = Node::new(
                        parent_path.join(key),
                        key,
                        NodeBody::Composite(CompositeBody::default()),
                    );
                    self.tree.index_node(&wrapper);
                    push_child(parent, Rc::clone(&wrapper));
                    let wrapper_path = wrapper.borrow().path().clone();

                    for (i, element) in elements.iter().enumerate() {
                        if !element.is_object() {
                            continue;
                        }
                        let element_path = wrapper_path.index(i);
                        if element.get("kind").is_some() {
                            if let Some(child) = self.construct_member(key, element, &element_path)
                            {
                                push_child(&wrapper, child);
                            }
                        } else {
                            // untagged index: keep it only if it gained structure
                            let slot = Node::new(
                                element_path,
                                key,
                                NodeBody::Composite(CompositeBody::default()),
                            );
                            self.populate_children(&slot, element);
                            let has_children = !slot.borrow().children().is_empty();
                            if has_children {
                                self.tree.index_node(&slot);
                                push_child(&wrapper, slot);
                            }
                        }
                    }
                }
                Value::Object(_) => {
                    if let Some(child) =
                        self.construct_member(key, member, &parent_path.join(key))
                    {
                        push_child(parent, child);
                    }
                }
                _ => {}
            }
        }
    }

    fn construct_member(
        &mut self,
        key: &str,
        value: &Value,
        fallback_path: &NodePath,
    ) -> Option<NodeRef> {
        let kind = declared_kind(value)?;
        let path = declared_path(value, fallback_path);
        let id = declared_id(value, key);

        let body = match kind {
            NodeKind::Composite => NodeBody::Composite(CompositeBody::default()),
            NodeKind::Variable => NodeBody::Variable(read_quantity(value)),
            NodeKind::Parameter => NodeBody::Parameter(read_quantity(value)),
            NodeKind::ParameterSpecification => {
                NodeBody::ParameterSpecification(read_quantity(value))
            }
            NodeKind::DynamicsSpecification => NodeBody::DynamicsSpecification(DynamicsBody {
                quantity: read_quantity(value),
                function: function_member(value)
                    .map(read_function)
                    .unwrap_or_default(),
            }),
            NodeKind::Function => NodeBody::Function(read_function(value)),
            NodeKind::TextMetadata => NodeBody::TextMetadata(TextBody {
                value: string_field(value, "value"),
            }),
            NodeKind::Connection => {
                let parent = fallback_path.parent().unwrap_or_else(|| NodePath::new(""));
                return Some(self.create_connection(key, value, &parent));
            }
            NodeKind::Entity | NodeKind::Aspect | NodeKind::AspectSubTree => {
                debug!("node kind {kind:?} is not valid inside an aspect subtree");
                return None;
            }
        };

        let node = Node::new(path, id, body);
        self.tree.index_node(&node);
        if kind == NodeKind::Composite {
            self.populate_children(&node, value);
        }
        Some(node)
    }

    // Reconciliation

    fn clear_dirty(&mut self) {
        for node in self.tree.nodes() {
            if let NodeBody::AspectSubTree(body) = &mut node.borrow_mut().body {
                body.dirty = false;
            }
        }
    }

    fn reconcile_value(&mut self, value: &Value) {
        match value {
            Value::Object(_) if value.get("kind").is_some() => self.reconcile_node(value),
            Value::Object(members) => {
                for member in members.values() {
                    self.reconcile_value(member);
                }
            }
            Value::Array(elements) => {
                for element in elements {
                    self.reconcile_value(element);
                }
            }
            _ => {}
        }
    }

    fn reconcile_node(&mut self, value: &Value) {
        // unrecognized kinds are skipped whole: children are not traversed
        let Some(kind) = declared_kind(value) else {
            return;
        };
        let Some(path_str) = value.get("path").and_then(Value::as_str) else {
            debug!("snapshot node without a path cannot be reconciled");
            return;
        };
        let path = NodePath::new(path_str);

        match self.tree.get_node_by_path(&path) {
            Some(node) => {
                if node.borrow().kind() != kind {
                    debug!("snapshot kind {kind:?} does not match live node at {path}; skipping");
                    return;
                }
                merge_node(&node, value);
                if let Some(members) = value.as_object() {
                    for (key, member) in members {
                        if is_reserved_key(key) {
                            continue;
                        }
                        self.reconcile_value(member);
                    }
                }
            }
            None => {
                if kind == NodeKind::AspectSubTree {
                    self.attach_lazy_subtree(&path, value);
                } else {
                    debug!("snapshot path {path} has no live node; skipping");
                }
            }
        }
    }

    /// First appearance of a Simulation or Model subtree under a live
    /// aspect: construct it and attach it as a new child.
    fn attach_lazy_subtree(&mut self, path: &NodePath, value: &Value) {
        let Some(parent_path) = path.parent() else {
            debug!("new subtree {path} has no parent path");
            return;
        };
        let Some(aspect) = self.tree.get_node_by_path(&parent_path) else {
            debug!("no live aspect at {parent_path} for new subtree {path}");
            return;
        };
        if !matches!(aspect.borrow().body, NodeBody::Aspect(_)) {
            debug!("live node at {parent_path} is not an aspect; dropping subtree {path}");
            return;
        }

        let key = path.as_str().rsplit('.').next().unwrap_or_default();
        let Some(subtree) = self.create_subtree(key, value, &parent_path) else {
            return;
        };
        let kind = subtree_kind_of(&subtree);
        if let NodeBody::Aspect(body) = &mut aspect.borrow_mut().body {
            body.set_subtree(kind, subtree);
        };
    }

    fn notify(&mut self) {
        for listener in &self.listeners {
            listener.borrow_mut().on_tree_updated();
        }
        self.watches.notify(&self.tree);
    }
}

impl Default for TreeFactory {
    fn default() -> Self {
        Self::new()
    }
}

// Snapshot field readers

fn declared_kind(value: &Value) -> Option<NodeKind> {
    let tag = value.get("kind")?.as_str()?;
    let kind = NodeKind::from_tag(tag);
    if kind.is_none() {
        warn!("skipping node with unrecognized kind tag {tag:?}");
    }
    kind
}

fn declared_path(value: &Value, fallback: &NodePath) -> NodePath {
    value
        .get("path")
        .and_then(Value::as_str)
        .map(NodePath::new)
        .unwrap_or_else(|| fallback.clone())
}

fn declared_id(value: &Value, fallback: &str) -> String {
    value
        .get("id")
        .and_then(Value::as_str)
        .unwrap_or(fallback)
        .to_string()
}

fn string_field(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}

fn function_member(value: &Value) -> Option<&Value> {
    value.get("function").or_else(|| value.get("_function"))
}

fn read_quantity(value: &Value) -> QuantityBody {
    QuantityBody {
        value: value.get("value").filter(|v| !v.is_null()).cloned(),
        unit: string_field(value, "unit"),
        scaling_factor: string_field(value, "scalingFactor"),
    }
}

fn read_function(value: &Value) -> FunctionBody {
    FunctionBody {
        expression: string_field(value, "expression").unwrap_or_default(),
        arguments: value
            .get("arguments")
            .and_then(Value::as_array)
            .map(|args| {
                args.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
    }
}

/// Node fields that are never traversed as children.
fn is_reserved_key(key: &str) -> bool {
    matches!(
        key,
        "kind"
            | "path"
            | "id"
            | "name"
            | "type"
            | "value"
            | "unit"
            | "scalingFactor"
            | "position"
            | "simulator"
            | "modelInterpreter"
            | "expression"
            | "arguments"
            | "function"
            | "_function"
            | "entityPath"
            | "entityInstancePath"
            | "connectionType"
            | "dirty"
            | "modified"
    )
}

fn candidate_objects(member: &Value) -> Vec<&Value> {
    match member {
        Value::Object(_) => vec![member],
        Value::Array(elements) => elements.iter().filter(|e| e.is_object()).collect(),
        _ => Vec::new(),
    }
}

fn push_child(parent: &NodeRef, child: NodeRef) {
    match &mut parent.borrow_mut().body {
        NodeBody::AspectSubTree(body) => body.children.push(child),
        NodeBody::Composite(body) => body.children.push(child),
        _ => {}
    }
}

fn subtree_kind_of(subtree: &NodeRef) -> SubTreeKind {
    match &subtree.borrow().body {
        NodeBody::AspectSubTree(body) => body.subtree_kind,
        // create_subtree only ever builds subtree bodies
        _ => SubTreeKind::Visualization,
    }
}

/// Copy only value-bearing fields; structure and identity stay untouched.
fn merge_node(node: &NodeRef, value: &Value) {
    let mut node = node.borrow_mut();
    match &mut node.body {
        NodeBody::Variable(q)
        | NodeBody::Parameter(q)
        | NodeBody::ParameterSpecification(q) => merge_quantity(q, value),
        NodeBody::DynamicsSpecification(d) => {
            merge_quantity(&mut d.quantity, value);
            if let Some(f) = function_member(value) {
                d.function = read_function(f);
            }
        }
        NodeBody::TextMetadata(t) => {
            if let Some(text) = string_field(value, "value") {
                t.value = Some(text);
            }
        }
        NodeBody::AspectSubTree(s) => {
            if s.subtree_kind == SubTreeKind::Visualization {
                s.content = Some(value.clone());
            }
        }
        NodeBody::Entity(e) => {
            if let Some(position) = value
                .get("position")
                .and_then(|p| serde_json::from_value(p.clone()).ok())
            {
                e.position = Some(position);
            }
        }
        _ => {}
    }
}

fn merge_quantity(quantity: &mut QuantityBody, value: &Value) {
    if let Some(v) = value.get("value").filter(|v| !v.is_null()) {
        quantity.value = Some(v.clone());
    }
    if let Some(unit) = string_field(value, "unit") {
        quantity.unit = Some(unit);
    }
    if let Some(factor) = string_field(value, "scalingFactor") {
        quantity.scaling_factor = Some(factor);
    }
}
