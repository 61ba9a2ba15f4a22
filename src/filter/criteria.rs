use std::collections::HashMap;

use super::matcher::{Constraint, Field, Filter, Pattern};
use super::split_regex_from_map;

type Criteria = Option<HashMap<String, String>>;

/// Filter settings of one collection config.
///
/// `None` means "no constraint of this kind". The default value matches every
/// container.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterCriteria {
    pub include_labels: Criteria,
    pub exclude_labels: Criteria,
    pub include_label_regex: Criteria,
    pub exclude_label_regex: Criteria,
    pub include_env: Criteria,
    pub exclude_env: Criteria,
    pub include_env_regex: Criteria,
    pub exclude_env_regex: Criteria,
    pub include_k8s_labels: Criteria,
    pub exclude_k8s_labels: Criteria,
    pub include_k8s_label_regex: Criteria,
    pub exclude_k8s_label_regex: Criteria,
    /// Regex the pod namespace must match.
    pub k8s_namespace_regex: Option<String>,
    /// Regex the pod name must match.
    pub k8s_pod_regex: Option<String>,
    /// Regex the Kubernetes container name must match.
    pub k8s_container_regex: Option<String>,
}

impl FilterCriteria {
    /// Sets the label criteria from config maps whose `^...$` values are
    /// regular expressions.
    pub fn with_label_patterns(mut self, include: Criteria, exclude: Criteria) -> Self {
        (self.include_labels, self.include_label_regex) = split(include);
        (self.exclude_labels, self.exclude_label_regex) = split(exclude);
        self
    }

    /// Like [`Self::with_label_patterns`] for environment variables.
    pub fn with_env_patterns(mut self, include: Criteria, exclude: Criteria) -> Self {
        (self.include_env, self.include_env_regex) = split(include);
        (self.exclude_env, self.exclude_env_regex) = split(exclude);
        self
    }

    /// Like [`Self::with_label_patterns`] for Kubernetes pod labels.
    pub fn with_k8s_label_patterns(mut self, include: Criteria, exclude: Criteria) -> Self {
        (self.include_k8s_labels, self.include_k8s_label_regex) = split(include);
        (self.exclude_k8s_labels, self.exclude_k8s_label_regex) = split(exclude);
        self
    }

    /// Compiles the criteria into a [`Filter`].
    ///
    /// Regular expressions are compiled here, once per config. Invalid ones
    /// are logged and compiled into a pattern that never matches.
    pub fn compile(&self) -> Filter {
        let mut include = Vec::new();
        let mut exclude = Vec::new();

        push_literal(&mut include, Field::Label, &self.include_labels);
        push_literal(&mut exclude, Field::Label, &self.exclude_labels);
        push_regex(&mut include, Field::Label, &self.include_label_regex);
        push_regex(&mut exclude, Field::Label, &self.exclude_label_regex);

        push_literal(&mut include, Field::Env, &self.include_env);
        push_literal(&mut exclude, Field::Env, &self.exclude_env);
        push_regex(&mut include, Field::Env, &self.include_env_regex);
        push_regex(&mut exclude, Field::Env, &self.exclude_env_regex);

        push_literal(&mut include, Field::K8sLabel, &self.include_k8s_labels);
        push_literal(&mut exclude, Field::K8sLabel, &self.exclude_k8s_labels);
        push_regex(&mut include, Field::K8sLabel, &self.include_k8s_label_regex);
        push_regex(&mut exclude, Field::K8sLabel, &self.exclude_k8s_label_regex);

        for (field, pattern) in [
            (Field::K8sNamespace, &self.k8s_namespace_regex),
            (Field::K8sPod, &self.k8s_pod_regex),
            (Field::K8sContainer, &self.k8s_container_regex),
        ] {
            if let Some(pattern) = pattern {
                include.push(Constraint {
                    field,
                    key: String::new(),
                    pattern: Pattern::regex(field, "", pattern),
                });
            }
        }

        Filter::new(include, exclude)
    }
}

fn split(criteria: Criteria) -> (Criteria, Criteria) {
    match criteria {
        Some(map) => {
            let (literal, regex) = split_regex_from_map(map);
            (non_empty(literal), non_empty(regex))
        }
        None => (None, None),
    }
}

fn non_empty(map: HashMap<String, String>) -> Criteria {
    (!map.is_empty()).then_some(map)
}

fn push_literal(out: &mut Vec<Constraint>, field: Field, criteria: &Criteria) {
    let Some(criteria) = criteria else { return };
    out.extend(criteria.iter().map(|(key, value)| Constraint {
        field,
        key: key.clone(),
        pattern: Pattern::Literal(value.clone()),
    }));
}

fn push_regex(out: &mut Vec<Constraint>, field: Field, criteria: &Criteria) {
    let Some(criteria) = criteria else { return };
    out.extend(criteria.iter().map(|(key, value)| Constraint {
        field,
        key: key.clone(),
        pattern: Pattern::regex(field, key, value),
    }));
}
