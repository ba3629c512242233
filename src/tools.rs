//! Registry of code-analysis helpers consulted by workflow nodes.
//!
//! Tools take a source snippet and return a JSON report. They are registered
//! by name so workflow nodes can look them up without depending on concrete
//! types.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use serde_json::{Value, json};

/// A named code-analysis helper.
pub trait Tool: Send + Sync {
    /// The registry key for this tool.
    fn name(&self) -> &'static str;

    /// Analyzes a source snippet and returns a JSON report.
    fn analyze(&self, source: &str) -> Value;
}

/// Name-keyed collection of tools.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: FxHashMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry pre-populated with the built-in tools.
    #[must_use]
    pub fn builtin() -> Self {
        let mut registry = Self::new();
        registry.register(SmellDetector);
        registry.register(ComplexityMeter);
        registry
    }

    /// Registers a tool under its own name, replacing any previous one.
    pub fn register(&mut self, tool: impl Tool + 'static) {
        self.tools.insert(tool.name().to_string(), Arc::new(tool));
    }

    /// Looks up a tool by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.get(name).cloned()
    }

    /// Registered tool names, in no particular order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.tools.keys().map(String::as_str).collect()
    }
}

impl std::fmt::Debug for ToolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolRegistry")
            .field("tools", &self.tools.len())
            .finish()
    }
}

/// Rule-based smell detector.
///
/// Counts leftover TODO markers, debug-print calls, and oversized sources.
/// Report shape: `{"issues": n}`.
pub struct SmellDetector;

impl Tool for SmellDetector {
    fn name(&self) -> &'static str {
        "detect_smells"
    }

    fn analyze(&self, source: &str) -> Value {
        let mut issues = 0;
        if source.contains("TODO") {
            issues += 1;
        }
        if source.contains("println!(") || source.contains("print(") {
            issues += 1;
        }
        if source.lines().count() > 200 {
            issues += 1;
        }
        json!({ "issues": issues })
    }
}

/// Naive complexity meter: function count plus length.
///
/// Report shape: `{"funcs": n, "lines": n, "score": f}` where
/// `score = funcs + lines / 100`.
pub struct ComplexityMeter;

impl Tool for ComplexityMeter {
    fn name(&self) -> &'static str {
        "measure_complexity"
    }

    fn analyze(&self, source: &str) -> Value {
        let funcs = source.matches("fn ").count() + source.matches("def ").count();
        let lines = source.lines().count();
        let score = funcs as f64 + lines as f64 / 100.0;
        json!({ "funcs": funcs, "lines": lines, "score": score })
    }
}
