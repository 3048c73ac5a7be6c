//! Tag filter: required tags, disallowed tags and boolean expressions.
//!
//! A photo passes the filter when, checked in this order:
//!
//! 1. none of its tags is disallowed,
//! 2. it carries *every* required tag,
//! 3. every expression evaluates true against its tags.
//!
//! Empty required/disallowed sets and an empty expression list impose no
//! constraint, so the default filter accepts everything.
//!
//! Mutators are all-or-nothing: every expression is compiled before any
//! field changes, and a single bad expression rejects the whole call.

use crate::expr::BoolExpr;
use crate::types::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagFilter {
    required: BTreeSet<String>,
    disallowed: BTreeSet<String>,
    bool_expr: Vec<BoolExpr>,
}

impl TagFilter {
    pub fn required(&self) -> &BTreeSet<String> {
        &self.required
    }

    pub fn disallowed(&self) -> &BTreeSet<String> {
        &self.disallowed
    }

    pub fn bool_expr(&self) -> &[BoolExpr] {
        &self.bool_expr
    }

    pub fn is_empty(&self) -> bool {
        self.required.is_empty() && self.disallowed.is_empty() && self.bool_expr.is_empty()
    }

    /// Whether a photo with `tags` passes the filter.
    pub fn matches(&self, tags: &BTreeSet<String>) -> bool {
        if !self.disallowed.is_empty() && !self.disallowed.is_disjoint(tags) {
            return false;
        }
        if !self.required.is_empty() && !self.required.is_subset(tags) {
            return false;
        }
        self.bool_expr.iter().all(|e| e.eval(tags))
    }

    /// Merge more constraints into the filter.
    ///
    /// Tags are unioned into their sets; expressions not already present are
    /// appended in order. Nothing changes if any expression fails to compile.
    pub fn add_filter<S: AsRef<str>>(
        &mut self,
        required: &[S],
        disallowed: &[S],
        exprs: &[S],
    ) -> Result<(), ConfigError> {
        let compiled = compile_all(exprs)?;
        self.required
            .extend(required.iter().map(|t| t.as_ref().to_string()));
        self.disallowed
            .extend(disallowed.iter().map(|t| t.as_ref().to_string()));
        for expr in compiled {
            if !self.bool_expr.contains(&expr) {
                self.bool_expr.push(expr);
            }
        }
        Ok(())
    }

    pub fn set_required<S: AsRef<str>>(&mut self, tags: &[S]) {
        self.required = tags.iter().map(|t| t.as_ref().to_string()).collect();
    }

    pub fn set_disallowed<S: AsRef<str>>(&mut self, tags: &[S]) {
        self.disallowed = tags.iter().map(|t| t.as_ref().to_string()).collect();
    }

    /// Replace the expression list. All candidates must compile.
    pub fn set_bool_expr<S: AsRef<str>>(&mut self, exprs: &[S]) -> Result<(), ConfigError> {
        let compiled = compile_all(exprs)?;
        self.replace_bool_expr(compiled);
        Ok(())
    }

    /// Install already-compiled expressions, dropping duplicates.
    pub(crate) fn replace_bool_expr(&mut self, exprs: Vec<BoolExpr>) {
        self.bool_expr.clear();
        for expr in exprs {
            if !self.bool_expr.contains(&expr) {
                self.bool_expr.push(expr);
            }
        }
    }
}

fn compile_all<S: AsRef<str>>(exprs: &[S]) -> Result<Vec<BoolExpr>, ConfigError> {
    exprs
        .iter()
        .map(|source| {
            let source = source.as_ref();
            BoolExpr::compile(source).map_err(|e| ConfigError::Expression {
                expression: source.to_string(),
                source: e,
            })
        })
        .collect()
}
