//! Cluster selector for application placement
//!
//! Label rows keep their id for their whole life; removing a row only marks it
//! invalid so ids stay stable for the controls that reference them.

use ocm_console_common::{
    ClusterSetEntry, LabelEntry, SelectorEvaluateRequest, SelectorEvaluateResponse,
    SelectorException,
};
use std::collections::{BTreeMap, HashSet};

use crate::kubernetes::types::ClusterSetBinding;
use crate::kubernetes::{ClusterDirectory, K8sError, K8sResult};

const MISSING_LABEL: &str = "The label name is required";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterSelector {
    mode: bool,
    existing_rule: bool,
    labels: Vec<LabelEntry>,
    next_id: usize,
    cluster_sets: Vec<ClusterSetEntry>,
}

impl Default for ClusterSelector {
    fn default() -> Self {
        Self::new()
    }
}

impl ClusterSelector {
    /// Selector for a new placement: one empty, not yet valid row
    pub fn new() -> Self {
        Self {
            mode: false,
            existing_rule: false,
            labels: vec![LabelEntry {
                id: 0,
                name: String::new(),
                value: String::new(),
                valid: false,
            }],
            next_id: 1,
            cluster_sets: Vec::new(),
        }
    }

    /// Selector showing the rows of an existing placement rule
    pub fn from_existing(rows: Vec<LabelEntry>) -> Self {
        if rows.is_empty() {
            return Self::new();
        }
        let next_id = rows.iter().map(|r| r.id + 1).max().unwrap_or(0).max(rows.len());
        Self {
            mode: false,
            existing_rule: true,
            labels: rows,
            next_id,
            cluster_sets: Vec::new(),
        }
    }

    /// Switch the selector on; existing rules cannot be switched
    pub fn enable(&mut self) {
        if !self.existing_rule {
            self.mode = true;
        }
    }

    pub fn is_active(&self) -> bool {
        self.mode
    }

    pub fn is_read_only(&self) -> bool {
        self.existing_rule || !self.mode
    }

    pub fn labels(&self) -> &[LabelEntry] {
        &self.labels
    }

    pub fn cluster_sets(&self) -> &[ClusterSetEntry] {
        &self.cluster_sets
    }

    /// Append an empty row; returns its id, or `None` when read-only
    pub fn add_label(&mut self) -> Option<usize> {
        if self.is_read_only() {
            return None;
        }
        let id = self.next_id;
        self.labels.push(LabelEntry {
            id,
            name: String::new(),
            value: String::new(),
            valid: true,
        });
        self.next_id += 1;
        Some(id)
    }

    /// Set a row's name and value; the row becomes valid
    pub fn set_label(&mut self, id: usize, name: &str, value: &str) -> K8sResult<()> {
        if self.is_read_only() {
            return Err(K8sError::Validation("cluster selector is read-only".to_string()));
        }
        let row = self
            .labels
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| K8sError::Validation(format!("no label row {}", id)))?;
        row.name = name.to_string();
        row.value = value.to_string();
        row.valid = true;
        Ok(())
    }

    /// Mark a row invalid. Returns false when nothing changed.
    pub fn remove_label(&mut self, id: usize) -> bool {
        if self.is_read_only() {
            return false;
        }
        match self.labels.iter_mut().find(|r| r.id == id) {
            Some(row) if row.valid => {
                row.valid = false;
                true
            }
            _ => false,
        }
    }

    fn shown(row: &LabelEntry) -> bool {
        row.valid || row.id == 0
    }

    /// Missing and duplicate label names among the shown rows.
    /// Nothing is reported while the selector is off.
    pub fn validate(&self) -> Vec<SelectorException> {
        let mut exceptions = Vec::new();
        if !self.mode {
            return exceptions;
        }

        let mut seen = HashSet::new();
        for row in self.labels.iter().filter(|r| Self::shown(r)) {
            let control_id = format!("labelName-{}", row.id);
            if row.name.is_empty() {
                exceptions.push(SelectorException {
                    row: 1,
                    text: MISSING_LABEL.to_string(),
                    control_id: control_id.clone(),
                });
            }
            if !seen.insert(row.name.as_str()) {
                exceptions.push(SelectorException {
                    row: 1,
                    text: format!("The label name '{}' is used more than once", row.name),
                    control_id,
                });
            }
        }
        exceptions
    }

    /// `matchLabels` of the placement rule
    pub fn match_labels(&self) -> BTreeMap<String, String> {
        self.labels
            .iter()
            .filter(|r| r.valid && !r.name.is_empty())
            .map(|r| (r.name.clone(), r.value.clone()))
            .collect()
    }

    /// Bring the chosen cluster sets in line with `selected`: new sets are
    /// appended with their binding state in `namespace`, deselected sets are
    /// dropped, the rest keep their position.
    pub fn reconcile_cluster_sets(
        &mut self,
        selected: &[String],
        bindings: &[ClusterSetBinding],
        namespace: Option<&str>,
    ) {
        self.cluster_sets.retain(|s| selected.contains(&s.name));

        for name in selected {
            if self.cluster_sets.iter().any(|s| &s.name == name) {
                continue;
            }
            let has_binding = bindings
                .iter()
                .any(|b| &b.name == name && Some(b.namespace.as_str()) == namespace);
            self.cluster_sets.push(ClusterSetEntry {
                name: name.clone(),
                has_binding,
            });
        }
    }
}

/// First `metadata.namespace` in a multi-document YAML template
pub fn namespace_from_template(yaml: &str) -> Option<String> {
    use serde::Deserialize;

    for document in serde_yaml::Deserializer::from_str(yaml) {
        let value = match serde_yaml::Value::deserialize(document) {
            Ok(value) => value,
            Err(e) => {
                tracing::debug!(error = %e, "Skipping unparsable template document");
                continue;
            }
        };
        let namespace = value
            .get("metadata")
            .and_then(|m| m.get("namespace"))
            .and_then(|n| n.as_str())
            .filter(|n| !n.is_empty());
        if let Some(namespace) = namespace {
            return Some(namespace.to_string());
        }
    }
    None
}

/// Evaluate a selector as submitted by a client
pub async fn evaluate(
    request: SelectorEvaluateRequest,
    clusters: &dyn ClusterDirectory,
) -> K8sResult<SelectorEvaluateResponse> {
    let mut selector = if request.existing.is_empty() {
        let mut selector = ClusterSelector::new();
        if request.mode {
            selector.enable();
        }
        if !request.labels.is_empty() {
            selector.next_id = request.labels.iter().map(|r| r.id + 1).max().unwrap_or(1);
            selector.labels = request.labels;
        }
        selector
    } else {
        ClusterSelector::from_existing(request.existing)
    };

    let namespace = namespace_from_template(&request.template_yaml);
    let bindings = match &namespace {
        Some(ns) if !request.cluster_sets.is_empty() => clusters.cluster_set_bindings(ns).await?,
        _ => Vec::new(),
    };
    selector.reconcile_cluster_sets(&request.cluster_sets, &bindings, namespace.as_deref());

    Ok(SelectorEvaluateResponse {
        exceptions: selector.validate(),
        match_labels: selector.match_labels(),
        cluster_sets: selector.cluster_sets,
        namespace,
    })
}
