//! Strategy screens — the pluggable entry-filter logic.
//!
//! Defines the `Strategy` trait and the string-keyed registry resolved
//! once at startup. Adding a strategy means implementing the trait and
//! registering it under a unique key; the job manager and the spread
//! builder never change.

pub mod breakout;
pub mod iron_condor;
pub mod iv_crush;
pub mod mean_reversion;
pub mod trend_following;

use std::collections::HashMap;
use std::sync::Arc;

use crate::types::{ExitRules, MarketSnapshot, OptionStructure, Signal, StrategyDescriptor};

/// Capability contract every strategy implements.
///
/// `check_entry` is pure over the snapshot: an ordered chain of checks
/// where each outcome appends a human-readable reason, and the
/// aggregate score in [0, 100] decides pass/fail against the
/// strategy's own threshold.
pub trait Strategy: Send + Sync {
    /// Immutable metadata (key, name, edge type, risk, win rate).
    fn descriptor(&self) -> &StrategyDescriptor;

    /// Run the entry checks for one ticker against one snapshot.
    fn check_entry(&self, ticker: &str, snapshot: &MarketSnapshot) -> Signal;

    /// Recommended option structure parameters (DTE window, deltas).
    fn option_structure(&self) -> OptionStructure;

    /// Recommended exit rules.
    fn exit_rules(&self) -> ExitRules;
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// String-keyed table of registered strategies.
///
/// Built once at startup; lookups share the `Arc`'d strategy with the
/// scan task. Registration order is preserved for stable listings.
pub struct StrategyRegistry {
    strategies: HashMap<String, Arc<dyn Strategy>>,
    order: Vec<String>,
}

impl StrategyRegistry {
    pub fn new() -> Self {
        Self {
            strategies: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Registry pre-loaded with the built-in screens.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(trend_following::TrendFollowing::new()));
        registry.register(Arc::new(iv_crush::IvCrush::new()));
        registry.register(Arc::new(mean_reversion::MeanReversion::new()));
        registry.register(Arc::new(breakout::Breakout::new()));
        registry.register(Arc::new(iron_condor::IronCondor::new()));
        registry
    }

    /// Register a strategy under its descriptor key. Re-registering a
    /// key replaces the previous strategy without changing its position.
    pub fn register(&mut self, strategy: Arc<dyn Strategy>) {
        let key = strategy.descriptor().key.clone();
        if self.strategies.insert(key.clone(), strategy).is_none() {
            self.order.push(key);
        }
    }

    pub fn get(&self, key: &str) -> Option<Arc<dyn Strategy>> {
        self.strategies.get(key).cloned()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.strategies.contains_key(key)
    }

    /// Descriptors in registration order.
    pub fn descriptors(&self) -> Vec<StrategyDescriptor> {
        self.order
            .iter()
            .filter_map(|k| self.strategies.get(k))
            .map(|s| s.descriptor().clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl Default for StrategyRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
