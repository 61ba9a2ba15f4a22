use regex::Regex;

use crate::container::ContainerRecord;
use crate::error::ResultOkLogExt;

use super::Error;

/// Record attribute a constraint is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Field {
    Label,
    Env,
    K8sLabel,
    K8sNamespace,
    K8sPod,
    K8sContainer,
}

impl Field {
    fn category(self) -> &'static str {
        match self {
            Field::Label => "label",
            Field::Env => "env",
            Field::K8sLabel => "k8s label",
            Field::K8sNamespace => "k8s namespace",
            Field::K8sPod => "k8s pod",
            Field::K8sContainer => "k8s container",
        }
    }

    fn lookup<'a>(self, record: &'a ContainerRecord, key: &str) -> Option<&'a str> {
        match self {
            Field::Label => record.labels.get(key).map(String::as_str),
            Field::Env => record.env.get(key).map(String::as_str),
            Field::K8sLabel => record.k8s.labels.get(key).map(String::as_str),
            Field::K8sNamespace => Some(&record.k8s.namespace),
            Field::K8sPod => Some(&record.k8s.pod_name),
            Field::K8sContainer => Some(&record.k8s.container_name),
        }
    }
}

#[derive(Debug, Clone)]
pub(super) enum Pattern {
    Literal(String),
    Regex(Regex),
    /// A pattern that failed to compile. Never matches.
    Broken,
}

impl Pattern {
    pub(super) fn regex(field: Field, key: &str, pattern: &str) -> Self {
        Regex::new(pattern)
            .map_err(|source| Error::InvalidPattern {
                category: field.category(),
                key: key.to_owned(),
                pattern: pattern.to_owned(),
                source: Box::new(source),
            })
            .ok_log()
            .map_or(Pattern::Broken, Pattern::Regex)
    }

    fn matches(&self, value: &str) -> bool {
        match self {
            Pattern::Literal(expected) => expected == value,
            Pattern::Regex(re) => re.is_match(value),
            Pattern::Broken => false,
        }
    }
}

#[derive(Debug, Clone)]
pub(super) struct Constraint {
    pub(super) field: Field,
    pub(super) key: String,
    pub(super) pattern: Pattern,
}

impl Constraint {
    fn matches(&self, record: &ContainerRecord) -> bool {
        self.field
            .lookup(record, &self.key)
            .is_some_and(|value| self.pattern.matches(value))
    }
}

/// Compiled form of a [`super::FilterCriteria`].
#[derive(Debug, Clone, Default)]
pub struct Filter {
    include: Vec<Constraint>,
    exclude: Vec<Constraint>,
}

impl Filter {
    pub(super) fn new(include: Vec<Constraint>, exclude: Vec<Constraint>) -> Self {
        Self { include, exclude }
    }

    /// A filter that accepts every record.
    pub fn match_all() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.include.is_empty() && self.exclude.is_empty()
    }

    /// Returns whether the record passes every include constraint and hits
    /// no exclude constraint.
    pub fn matches(&self, record: &ContainerRecord) -> bool {
        if self.exclude.iter().any(|c| c.matches(record)) {
            return false;
        }
        self.include.iter().all(|c| c.matches(record))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::container::{RawConfig, RawContainer};
    use crate::filter::FilterCriteria;

    use super::*;

    fn map(pairs: &[(&str, &str)]) -> Option<HashMap<String, String>> {
        Some(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        )
    }

    fn record(labels: &[(&str, &str)], env: &[&str]) -> ContainerRecord {
        let raw = RawContainer {
            config: Some(RawConfig {
                labels: map(labels),
                env: Some(env.iter().map(|e| e.to_string()).collect()),
                ..Default::default()
            }),
            ..RawContainer::with_id("c1", "/c1")
        };
        ContainerRecord::create_info_detail(&raw, None, false).unwrap()
    }

    fn k8s_record(pod_labels: &[(&str, &str)]) -> ContainerRecord {
        let raw = RawContainer {
            k8s_labels: map(pod_labels),
            ..RawContainer::with_id("c1", "/k8s_nginx_nginx-5fd7568b67-4sh8c_default_uid_0")
        };
        ContainerRecord::create_info_detail(&raw, None, false).unwrap()
    }

    #[test]
    fn empty_filter_matches_everything() {
        assert!(Filter::match_all().matches(&record(&[], &[])));
        assert!(FilterCriteria::default().compile().matches(&record(&[("a", "b")], &[])));
    }

    #[test]
    fn include_requires_every_key() {
        let filter = FilterCriteria {
            include_labels: map(&[("app", "web"), ("tier", "front")]),
            ..Default::default()
        }
        .compile();
        assert!(filter.matches(&record(&[("app", "web"), ("tier", "front"), ("x", "y")], &[])));
        assert!(!filter.matches(&record(&[("app", "web")], &[])));
        assert!(!filter.matches(&record(&[("app", "web"), ("tier", "back")], &[])));
    }

    #[test]
    fn empty_include_map_is_vacuous() {
        let filter = FilterCriteria {
            include_labels: map(&[]),
            ..Default::default()
        }
        .compile();
        assert!(filter.matches(&record(&[], &[])));
    }

    #[test]
    fn exclude_rejects_on_any_key() {
        let filter = FilterCriteria {
            exclude_labels: map(&[("debug", "true"), ("canary", "true")]),
            ..Default::default()
        }
        .compile();
        assert!(!filter.matches(&record(&[("canary", "true")], &[])));
        assert!(filter.matches(&record(&[("canary", "false")], &[])));
        assert!(filter.matches(&record(&[], &[])));
    }

    #[test]
    fn exclude_wins_over_include() {
        let filter = FilterCriteria {
            include_labels: map(&[("app", "web")]),
            exclude_env: map(&[("STAGE", "test")]),
            ..Default::default()
        }
        .compile();
        assert!(filter.matches(&record(&[("app", "web")], &["STAGE=prod"])));
        assert!(!filter.matches(&record(&[("app", "web")], &["STAGE=test"])));

        let filter = FilterCriteria {
            include_labels: map(&[("app", "web")]),
            exclude_labels: map(&[("app", "web")]),
            ..Default::default()
        }
        .compile();
        assert!(!filter.matches(&record(&[("app", "web")], &[])));
    }

    #[test]
    fn categories_are_combined_with_and() {
        let filter = FilterCriteria {
            include_labels: map(&[("app", "web")]),
            include_env: map(&[("STAGE", "prod")]),
            ..Default::default()
        }
        .compile();
        assert!(filter.matches(&record(&[("app", "web")], &["STAGE=prod"])));
        assert!(!filter.matches(&record(&[("app", "web")], &[])));
        assert!(!filter.matches(&record(&[], &["STAGE=prod"])));
    }

    #[test]
    fn regex_include_and_exclude() {
        let filter = FilterCriteria {
            include_label_regex: map(&[("app", "^web-.*$")]),
            exclude_env_regex: map(&[("STAGE", "^(test|dev)$")]),
            ..Default::default()
        }
        .compile();
        assert!(filter.matches(&record(&[("app", "web-1")], &["STAGE=prod"])));
        assert!(!filter.matches(&record(&[("app", "api-1")], &[])));
        assert!(!filter.matches(&record(&[("app", "web-1")], &["STAGE=dev"])));
    }

    #[test]
    fn invalid_include_regex_never_matches() {
        let filter = FilterCriteria {
            include_label_regex: map(&[("app", "(")]),
            ..Default::default()
        }
        .compile();
        assert!(!filter.matches(&record(&[("app", "(")], &[])));
    }

    #[test]
    fn invalid_exclude_regex_never_excludes() {
        let filter = FilterCriteria {
            exclude_env_regex: map(&[("STAGE", "[")]),
            ..Default::default()
        }
        .compile();
        assert!(filter.matches(&record(&[], &["STAGE=["])));
    }

    #[test]
    fn k8s_labels_use_the_same_rules() {
        let filter = FilterCriteria {
            include_k8s_labels: map(&[("app", "nginx")]),
            exclude_k8s_labels: map(&[("track", "canary")]),
            ..Default::default()
        }
        .compile();
        assert!(filter.matches(&k8s_record(&[("app", "nginx")])));
        assert!(!filter.matches(&k8s_record(&[("app", "nginx"), ("track", "canary")])));
        assert!(!filter.matches(&record(&[("app", "nginx")], &[])));
    }

    #[test]
    fn k8s_coordinates_regex() {
        let filter = FilterCriteria {
            k8s_namespace_regex: Some("^default$".to_owned()),
            k8s_pod_regex: Some("^nginx-".to_owned()),
            ..Default::default()
        }
        .compile();
        assert!(filter.matches(&k8s_record(&[])));
        assert!(!filter.matches(&record(&[], &[])));

        let filter = FilterCriteria {
            k8s_container_regex: Some("^sidecar$".to_owned()),
            ..Default::default()
        }
        .compile();
        assert!(!filter.matches(&k8s_record(&[])));
    }
}
