use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use super::condition::Condition;
use super::error::ConditionError;
use super::evaluation_report::EvaluationReport;
use super::expr::ConditionExpr;
use super::predicate::{Diagnostic, ExternalPredicateResolver, PredicateRegistry};
use super::store::{Snapshot, VariableStore};
use crate::evaluate::{Evaluator, MemoState};
use crate::graph::ConditionGraph;

/// Builder for constructing a [`RulesEngine`].
///
/// Conditions are collected first, then registered one by one and checked by
/// a closing validation pass, so forward references are fine.
///
/// # Example
///
/// ```
/// use installer_core::{RulesEngine, VariableStore, condition_ref, variable};
///
/// let store = VariableStore::new().with("os.name", "linux");
/// let engine = RulesEngine::builder()
///     .condition("can_install", condition_ref("is_linux").and(!condition_ref("is_root")))
///     .condition("is_linux", variable("os.name").eq_ignore_case("Linux"))
///     .condition("is_root", variable("user.name").eq("root"))
///     .build(store)
///     .unwrap();
///
/// assert!(engine.is_true("can_install").unwrap());
/// ```
#[derive(Default)]
pub struct RulesEngineBuilder {
    conditions: Vec<Condition>,
    resolver: Option<Arc<dyn ExternalPredicateResolver>>,
}

impl RulesEngineBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a condition.
    #[must_use]
    pub fn condition(mut self, id: &str, expr: ConditionExpr) -> Self {
        self.conditions.push(Condition::new(id, expr));
        self
    }

    /// Add an already constructed condition.
    #[must_use]
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Resolver used for [`ConditionExpr::External`] leaves.
    #[must_use]
    pub fn resolver(mut self, resolver: Arc<dyn ExternalPredicateResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    /// Register every condition and validate the closed set.
    ///
    /// # Errors
    ///
    /// Returns [`ConditionError`] on duplicate ids, cycles, or references to
    /// conditions that were never defined.
    pub fn build(self, store: VariableStore) -> Result<RulesEngine, ConditionError> {
        let mut engine = RulesEngine::new(store);
        if let Some(resolver) = self.resolver {
            engine.set_resolver(resolver);
        }
        for condition in self.conditions {
            engine.register(condition)?;
        }
        engine.validate()?;
        Ok(engine)
    }
}

impl fmt::Debug for RulesEngineBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RulesEngineBuilder")
            .field("conditions", &self.conditions.len())
            .field("resolver", &self.resolver.is_some())
            .finish()
    }
}

#[derive(Debug, Default)]
struct PassCache {
    /// (store generation, invalidation epoch) the memo was computed for.
    key: Option<(u64, u64)>,
    memo: Vec<MemoState>,
}

/// Named conditions plus their dependency graph, evaluated against a shared
/// [`VariableStore`].
///
/// Registration needs `&mut self`; evaluation works through `&self`, so a
/// loaded engine can live behind an `Arc` and be queried from several
/// threads. Results are memoized per store generation: any variable change
/// invalidates the cache without caller involvement.
pub struct RulesEngine {
    conditions: Vec<Condition>,
    index: HashMap<String, usize>,
    graph: ConditionGraph,
    store: VariableStore,
    resolver: Arc<dyn ExternalPredicateResolver>,
    cache: Mutex<PassCache>,
    epoch: AtomicU64,
}

impl RulesEngine {
    /// An empty engine reading `store`. External predicates resolve against
    /// an empty [`PredicateRegistry`] until a resolver is set.
    #[must_use]
    pub fn new(store: VariableStore) -> Self {
        Self {
            conditions: Vec::new(),
            index: HashMap::new(),
            graph: ConditionGraph::new(),
            store,
            resolver: Arc::new(PredicateRegistry::new()),
            cache: Mutex::new(PassCache::default()),
            epoch: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn builder() -> RulesEngineBuilder {
        RulesEngineBuilder::new()
    }

    pub fn set_resolver(&mut self, resolver: Arc<dyn ExternalPredicateResolver>) {
        self.resolver = resolver;
        self.invalidate();
    }

    /// Add a condition.
    ///
    /// References to conditions that are not registered yet are accepted;
    /// [`validate`](Self::validate) rejects them if they never appear. A
    /// failed registration leaves the engine unchanged.
    ///
    /// # Errors
    ///
    /// [`ConditionError::DuplicateCondition`] if the id is taken,
    /// [`ConditionError::CyclicReference`] if the condition would close a cycle.
    pub fn register(&mut self, condition: Condition) -> Result<(), ConditionError> {
        crate::compile::check_registration(&condition, &self.index, &self.graph)?;

        let id = condition.id().to_owned();
        self.graph.add_vertex(&id);
        for dep in condition.dependencies() {
            self.graph.add_edge(&id, dep);
        }
        self.index.insert(id.clone(), self.conditions.len());
        self.conditions.push(condition);
        self.invalidate();

        tracing::debug!(condition = %id, total = self.conditions.len(), "registered condition");
        Ok(())
    }

    /// Closing validation pass over the registered set.
    ///
    /// # Errors
    ///
    /// [`ConditionError::UndefinedReference`] if any condition refers to an id
    /// that was never registered.
    pub fn validate(&self) -> Result<(), ConditionError> {
        crate::compile::check_references(&self.conditions, &self.index)?;
        crate::compile::evaluation_order(&self.graph, &self.index)?;
        tracing::debug!(conditions = self.conditions.len(), "condition set validated");
        Ok(())
    }

    /// Whether condition `id` currently holds.
    ///
    /// Repeated calls with an unchanged store return the same answer and
    /// evaluate nothing twice.
    ///
    /// # Errors
    ///
    /// [`ConditionError::UnknownCondition`] if `id` was never registered.
    pub fn is_true(&self, id: &str) -> Result<bool, ConditionError> {
        let idx = self.lookup(id)?;
        let snapshot = self.store.snapshot();
        let mut cache = self.take_cache(&snapshot);
        let mut diagnostics = Vec::new();
        let mut evaluated = Vec::new();
        let result = self
            .evaluator(&snapshot, &mut cache.memo, &mut diagnostics, &mut evaluated)
            .condition(idx);
        self.restore_cache(cache);
        Ok(result)
    }

    /// Open an explicit evaluation pass pinned to the current store contents.
    /// Every condition is evaluated at most once for the life of the pass,
    /// even if the store changes meanwhile.
    #[must_use]
    pub fn pass(&self) -> EvaluationPass<'_> {
        EvaluationPass {
            engine: self,
            snapshot: self.store.snapshot(),
            memo: vec![MemoState::Unvisited; self.conditions.len()],
            diagnostics: Vec::new(),
            evaluated: Vec::new(),
        }
    }

    /// Evaluate `id` in a fresh pass and report what happened.
    ///
    /// # Errors
    ///
    /// [`ConditionError::UnknownCondition`] if `id` was never registered.
    pub fn evaluate_detailed(&self, id: &str) -> Result<EvaluationReport, ConditionError> {
        let start = Instant::now();
        let mut pass = self.pass();
        let result = pass.is_true(id)?;
        let evaluated = pass.evaluated_with_results();
        Ok(EvaluationReport::new(
            id.to_owned(),
            result,
            evaluated,
            pass.diagnostics,
            start.elapsed(),
        ))
    }

    /// Evaluate every condition in dependency order within one pass.
    ///
    /// # Errors
    ///
    /// [`ConditionError::CyclicReference`] if the graph is inconsistent.
    pub fn evaluate_all(&self) -> Result<Vec<(&str, bool)>, ConditionError> {
        let order = crate::compile::evaluation_order(&self.graph, &self.index)?;
        let mut pass = self.pass();
        Ok(order
            .into_iter()
            .map(|idx| {
                let result = pass.condition_at(idx);
                (self.conditions[idx].id(), result)
            })
            .collect())
    }

    /// Drop memoized results. Needed only when external predicate answers
    /// change without any variable changing.
    pub fn invalidate(&self) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        *self.lock_cache() = PassCache::default();
    }

    /// Registered ids with every dependency ahead of its dependents.
    ///
    /// # Errors
    ///
    /// [`ConditionError::CyclicReference`] if the graph is inconsistent.
    pub fn evaluation_order(&self) -> Result<Vec<&str>, ConditionError> {
        Ok(crate::compile::evaluation_order(&self.graph, &self.index)?
            .into_iter()
            .map(|idx| self.conditions[idx].id())
            .collect())
    }

    /// Ids the given condition refers to directly. `None` for an unknown id.
    #[must_use]
    pub fn dependencies_of(&self, id: &str) -> Option<Vec<&str>> {
        self.condition(id)
            .map(|c| c.dependencies().iter().map(String::as_str).collect())
    }

    #[must_use]
    pub fn condition(&self, id: &str) -> Option<&Condition> {
        self.index.get(id).map(|&idx| &self.conditions[idx])
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Registered conditions in registration order.
    pub fn conditions(&self) -> impl Iterator<Item = &Condition> {
        self.conditions.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.conditions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    #[must_use]
    pub fn graph(&self) -> &ConditionGraph {
        &self.graph
    }

    #[must_use]
    pub fn store(&self) -> &VariableStore {
        &self.store
    }

    fn lookup(&self, id: &str) -> Result<usize, ConditionError> {
        self.index
            .get(id)
            .copied()
            .ok_or_else(|| ConditionError::UnknownCondition { id: id.to_owned() })
    }

    fn evaluator<'a>(
        &'a self,
        snapshot: &'a Snapshot,
        memo: &'a mut [MemoState],
        diagnostics: &'a mut Vec<Diagnostic>,
        evaluated: &'a mut Vec<usize>,
    ) -> Evaluator<'a> {
        Evaluator::new(
            &self.conditions,
            &self.index,
            snapshot,
            self.resolver.as_ref(),
            memo,
            diagnostics,
            evaluated,
        )
    }

    fn lock_cache(&self) -> MutexGuard<'_, PassCache> {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take the shared memo out of the lock so predicates can re-enter the
    /// engine during evaluation.
    fn take_cache(&self, snapshot: &Snapshot) -> PassCache {
        let key = (snapshot.generation(), self.epoch.load(Ordering::SeqCst));
        let cache = std::mem::take(&mut *self.lock_cache());
        if cache.key == Some(key) && cache.memo.len() == self.conditions.len() {
            return cache;
        }
        PassCache {
            key: Some(key),
            memo: vec![MemoState::Unvisited; self.conditions.len()],
        }
    }

    fn restore_cache(&self, cache: PassCache) {
        let Some((generation, epoch)) = cache.key else {
            return;
        };
        if epoch != self.epoch.load(Ordering::SeqCst) {
            return;
        }
        let mut slot = self.lock_cache();
        let stale = matches!(slot.key, Some((current, _)) if current > generation);
        if !stale {
            *slot = cache;
        }
    }
}

impl fmt::Debug for RulesEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RulesEngine")
            .field("conditions", &self.conditions)
            .field("graph", &self.graph)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for RulesEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "RulesEngine({} conditions, {} dependencies)",
            self.conditions.len(),
            self.graph.edge_count(),
        )
    }
}

/// One logical batch of condition queries sharing a snapshot and memo.
///
/// Created by [`RulesEngine::pass()`].
#[derive(Debug)]
pub struct EvaluationPass<'e> {
    engine: &'e RulesEngine,
    snapshot: Snapshot,
    memo: Vec<MemoState>,
    diagnostics: Vec<Diagnostic>,
    evaluated: Vec<usize>,
}

impl<'e> EvaluationPass<'e> {
    /// Whether `id` holds in this pass.
    ///
    /// # Errors
    ///
    /// [`ConditionError::UnknownCondition`] if `id` was never registered.
    pub fn is_true(&mut self, id: &str) -> Result<bool, ConditionError> {
        let idx = self.engine.lookup(id)?;
        Ok(self.condition_at(idx))
    }

    /// The variable values this pass evaluates against.
    #[must_use]
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// Soft failures recorded so far.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Ids of conditions evaluated so far, in completion order.
    #[must_use]
    pub fn evaluated(&self) -> Vec<&'e str> {
        let engine = self.engine;
        self.evaluated
            .iter()
            .map(|&idx| engine.conditions[idx].id())
            .collect()
    }

    fn condition_at(&mut self, idx: usize) -> bool {
        let engine = self.engine;
        engine
            .evaluator(
                &self.snapshot,
                &mut self.memo,
                &mut self.diagnostics,
                &mut self.evaluated,
            )
            .condition(idx)
    }

    fn evaluated_with_results(&self) -> Vec<(String, bool)> {
        self.evaluated
            .iter()
            .map(|&idx| {
                let result = matches!(self.memo[idx], MemoState::Done(true));
                (self.engine.conditions[idx].id().to_owned(), result)
            })
            .collect()
    }
}
