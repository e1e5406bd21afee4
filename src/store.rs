//! In-memory rule persistence.
//!
//! [`RuleStore`] keeps each rule's source text, its serialized AST and a
//! creation timestamp under an autoincrementing id. Stored ASTs are rebuilt
//! from their JSON form on every use, so what is evaluated is always what
//! would be written to durable storage.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::combine::combine_nodes;
use crate::serial::{DeserializeError, SerializeError};
use crate::validate::{validate_node, ValidationMode};
use crate::{
    BoolOp, Branch, CombineError, Engine, EvalError, MutationError, Node, Record, RuleError,
};

/// Identifier of a stored rule. Ids start at 1.
pub type RuleId = u64;

/// A rule as held by the store.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredRule {
    pub id: RuleId,
    pub source: String,
    /// JSON encoding of the rule's tree, see [`Node::to_json`].
    pub ast: String,
    pub created_at: DateTime<Utc>,
}

impl StoredRule {
    /// Rebuild the rule's tree from its stored encoding.
    ///
    /// # Errors
    ///
    /// Returns [`DeserializeError`] if the stored AST is not a valid tree.
    pub fn node(&self) -> Result<Node, DeserializeError> {
        Node::from_json(&self.ast)
    }
}

/// Id and source of a stored rule, as returned by [`RuleStore::rules`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleSummary {
    pub id: RuleId,
    pub source: String,
}

/// Errors returned by [`RuleStore`] operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("rule source is empty")]
    EmptyRule,

    #[error("rule ids start at 1")]
    InvalidRuleId,

    #[error("rule {id} not found")]
    RuleNotFound { id: RuleId },

    #[error(transparent)]
    Rule(#[from] RuleError),
}

impl From<EvalError> for StoreError {
    fn from(err: EvalError) -> Self {
        StoreError::Rule(err.into())
    }
}

impl From<MutationError> for StoreError {
    fn from(err: MutationError) -> Self {
        StoreError::Rule(err.into())
    }
}

impl From<CombineError> for StoreError {
    fn from(err: CombineError) -> Self {
        StoreError::Rule(err.into())
    }
}

impl From<SerializeError> for StoreError {
    fn from(err: SerializeError) -> Self {
        StoreError::Rule(err.into())
    }
}

impl From<DeserializeError> for StoreError {
    fn from(err: DeserializeError) -> Self {
        StoreError::Rule(err.into())
    }
}

#[derive(Debug)]
struct Inner {
    rules: BTreeMap<RuleId, StoredRule>,
    next_id: RuleId,
}

impl Default for Inner {
    fn default() -> Self {
        Self {
            rules: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl Inner {
    fn insert(&mut self, source: String, ast: String) -> RuleId {
        let id = self.next_id;
        self.next_id += 1;
        self.rules.insert(
            id,
            StoredRule {
                id,
                source,
                ast,
                created_at: Utc::now(),
            },
        );
        id
    }

    fn get(&self, id: RuleId) -> Result<&StoredRule, StoreError> {
        if id == 0 {
            return Err(StoreError::InvalidRuleId);
        }
        self.rules.get(&id).ok_or_else(|| {
            warn!(rule_id = id, "rule not found");
            StoreError::RuleNotFound { id }
        })
    }

    fn get_mut(&mut self, id: RuleId) -> Result<&mut StoredRule, StoreError> {
        if id == 0 {
            return Err(StoreError::InvalidRuleId);
        }
        self.rules.get_mut(&id).ok_or_else(|| {
            warn!(rule_id = id, "rule not found");
            StoreError::RuleNotFound { id }
        })
    }
}

/// Thread-safe store of rules keyed by [`RuleId`].
///
/// Every read takes a shared lock and every write an exclusive one, so a
/// modification is never observed half-applied.
#[derive(Debug, Default)]
pub struct RuleStore {
    engine: Engine,
    inner: RwLock<Inner>,
}

impl RuleStore {
    /// Create an empty store using the default [`Engine`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the engine used to validate, parse and evaluate rules.
    #[must_use]
    pub fn with_engine(mut self, engine: Engine) -> Self {
        self.engine = engine;
        self
    }

    #[must_use]
    pub fn engine(&self) -> &Engine {
        &self.engine
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().rules.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().rules.is_empty()
    }

    /// Validate, parse and store a rule.
    ///
    /// # Errors
    ///
    /// [`StoreError::EmptyRule`] for blank source, otherwise the
    /// [`RuleError`] from building or encoding the rule.
    #[instrument(skip(self, source), fields(len = source.len()))]
    pub fn create_rule(&self, source: &str) -> Result<RuleId, StoreError> {
        if source.trim().is_empty() {
            return Err(StoreError::EmptyRule);
        }
        let node = self.engine.build(source)?;
        let ast = node.to_json()?;

        let id = self.inner.write().insert(source.to_owned(), ast);
        info!(rule_id = id, "rule created");
        Ok(id)
    }

    /// Every stored rule's id and source, in id order.
    #[must_use]
    pub fn rules(&self) -> Vec<RuleSummary> {
        self.inner
            .read()
            .rules
            .values()
            .map(|rule| RuleSummary {
                id: rule.id,
                source: rule.source.clone(),
            })
            .collect()
    }

    /// # Errors
    ///
    /// [`StoreError::InvalidRuleId`] for id 0, [`StoreError::RuleNotFound`]
    /// for an unknown id.
    pub fn get(&self, id: RuleId) -> Result<StoredRule, StoreError> {
        self.inner.read().get(id).cloned()
    }

    /// Evaluate a stored rule against a record.
    ///
    /// # Errors
    ///
    /// As for [`RuleStore::get`], plus the [`EvalError`] from evaluation.
    #[instrument(skip(self, record))]
    pub fn evaluate_rule(&self, id: RuleId, record: &Record) -> Result<bool, StoreError> {
        let node = self.node(id)?;
        let result = self.engine.evaluate(&node, record)?;
        debug!(rule_id = id, result, "rule evaluated");
        Ok(result)
    }

    /// Evaluate a stored rule against a JSON object of attribute values.
    ///
    /// # Errors
    ///
    /// As for [`RuleStore::evaluate_rule`], plus [`EvalError::InvalidRecord`]
    /// when `data` is not an object.
    pub fn evaluate_rule_json(
        &self,
        id: RuleId,
        data: &serde_json::Value,
    ) -> Result<bool, StoreError> {
        self.evaluate_rule(id, &Record::from_json(data)?)
    }

    /// Fold the given rules with `op`, left to right, and store the result
    /// as a new rule. Its source is each input's source in parentheses,
    /// joined by the connective.
    ///
    /// # Errors
    ///
    /// [`CombineError::NoRulesProvided`] for an empty id list, otherwise as
    /// for [`RuleStore::get`].
    #[instrument(skip(self))]
    pub fn combine_rules(&self, ids: &[RuleId], op: BoolOp) -> Result<RuleId, StoreError> {
        if ids.is_empty() {
            return Err(CombineError::NoRulesProvided.into());
        }

        let mut inner = self.inner.write();
        let mut sources = Vec::with_capacity(ids.len());
        let mut nodes = Vec::with_capacity(ids.len());
        for &id in ids {
            let rule = inner.get(id)?;
            sources.push(format!("({})", rule.source));
            nodes.push(rule.node()?);
        }

        let combined = combine_nodes(nodes, op)?;
        let source = if let [single] = ids {
            inner.get(*single)?.source.clone()
        } else {
            sources.join(&format!(" {op} "))
        };
        let id = inner.insert(source, combined.to_json()?);
        info!(rule_id = id, inputs = ids.len(), %op, "rules combined");
        Ok(id)
    }

    /// Replace the connective of the operator node at `path` in a stored
    /// rule.
    ///
    /// # Errors
    ///
    /// As for [`RuleStore::get`], plus the [`MutationError`] from the edit.
    /// The stored rule is unchanged on error.
    #[instrument(skip(self))]
    pub fn modify_operator(
        &self,
        id: RuleId,
        path: &[Branch],
        op: BoolOp,
    ) -> Result<(), StoreError> {
        self.modify(id, |node| node.set_operator_at(path, op))?;
        info!(rule_id = id, %op, "operator modified");
        Ok(())
    }

    /// Replace the leaf at `path` in a stored rule with `text`.
    ///
    /// With structural validation configured, the edited tree must still
    /// reference only known attributes.
    ///
    /// # Errors
    ///
    /// As for [`RuleStore::get`], plus the [`MutationError`] from the edit
    /// or a validation failure. The stored rule is unchanged on error.
    #[instrument(skip(self, text))]
    pub fn modify_operand(&self, id: RuleId, path: &[Branch], text: &str) -> Result<(), StoreError> {
        self.modify(id, |node| node.set_operand_at(path, text))?;
        info!(rule_id = id, "operand modified");
        Ok(())
    }

    fn node(&self, id: RuleId) -> Result<Node, StoreError> {
        Ok(self.inner.read().get(id)?.node()?)
    }

    fn modify(
        &self,
        id: RuleId,
        edit: impl FnOnce(&mut Node) -> Result<(), MutationError>,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write();
        let rule = inner.get_mut(id)?;
        let mut node = rule.node()?;
        edit(&mut node)?;
        if self.engine.config().validation == ValidationMode::Structural {
            validate_node(&node).map_err(RuleError::from)?;
        }
        rule.ast = node.to_json()?;
        rule.source = node.to_string();
        Ok(())
    }
}

#[cfg(feature = "binary-cache")]
impl RuleStore {
    /// Write every stored rule to a checksummed binary snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError`] if encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, SerializeError> {
        use crate::serial::snapshot::{encode, Snapshot, SnapshotRule};

        let inner = self.inner.read();
        let snapshot = Snapshot {
            next_id: inner.next_id,
            rules: inner
                .rules
                .values()
                .map(|rule| SnapshotRule {
                    id: rule.id,
                    source: rule.source.clone(),
                    ast: rule.ast.clone(),
                    created_at_ms: rule.created_at.timestamp_millis(),
                })
                .collect(),
        };
        encode(&snapshot)
    }

    /// Rebuild a store from a snapshot produced by [`to_bytes`](Self::to_bytes).
    /// The store uses the default [`Engine`]; see [`with_engine`](Self::with_engine).
    ///
    /// # Errors
    ///
    /// Returns [`DeserializeError`] on format, integrity, or validation failure.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, DeserializeError> {
        let snapshot = crate::serial::snapshot::decode(bytes)?;
        let mut rules = BTreeMap::new();
        for rule in snapshot.rules {
            let created_at = DateTime::<Utc>::from_timestamp_millis(rule.created_at_ms)
                .ok_or_else(|| {
                    DeserializeError::Validation(format!(
                        "rule {} has an out-of-range creation time",
                        rule.id
                    ))
                })?;
            rules.insert(
                rule.id,
                StoredRule {
                    id: rule.id,
                    source: rule.source,
                    ast: rule.ast,
                    created_at,
                },
            );
        }
        info!(rules = rules.len(), "rule store restored from snapshot");
        Ok(Self {
            engine: Engine::default(),
            inner: RwLock::new(Inner {
                rules,
                next_id: snapshot.next_id,
            }),
        })
    }

    /// Snapshot the store and write it to a file.
    ///
    /// # Errors
    ///
    /// Returns [`SerializeError`] on encoding or I/O failure.
    pub fn to_binary_file(&self, path: impl AsRef<std::path::Path>) -> Result<(), SerializeError> {
        let bytes = self.to_bytes()?;
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Read a snapshot file and rebuild the store it contains.
    ///
    /// # Errors
    ///
    /// Returns [`DeserializeError`] on I/O, format, integrity, or validation
    /// failure.
    pub fn from_binary_file(path: impl AsRef<std::path::Path>) -> Result<Self, DeserializeError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}
