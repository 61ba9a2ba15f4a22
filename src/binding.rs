//! Collection configs bound to the container registry.
use crate::filter::{Filter, FilterCriteria};
use crate::registry::{ContainerRegistry, DiffSession, MatchDelta};
use crate::report::{ConfigResult, ContainerDetail, ReportEvent, Reporter, join_ids};

/// A collection config that tracks which containers it collects from.
///
/// On every [`CollectionBinding::tick`] the binding queries the registry for
/// changes since its previous tick and reports them.
#[derive(Debug)]
pub struct CollectionBinding {
    config_name: String,
    project: String,
    filter: Filter,
    session: DiffSession,
    reporter: Reporter,
}

impl CollectionBinding {
    pub fn new(
        config_name: impl Into<String>,
        project: impl Into<String>,
        criteria: &FilterCriteria,
        reporter: Reporter,
    ) -> Self {
        Self {
            config_name: config_name.into(),
            project: project.into(),
            filter: criteria.compile(),
            session: DiffSession::new(),
            reporter,
        }
    }

    pub fn config_name(&self) -> &str {
        &self.config_name
    }

    pub fn session(&self) -> &DiffSession {
        &self.session
    }

    /// Replaces the filter. Every live container is evaluated again on the
    /// next tick.
    pub fn set_criteria(&mut self, criteria: &FilterCriteria) {
        self.filter = criteria.compile();
        self.session.reset();
    }

    pub fn tick(&mut self, registry: &ContainerRegistry) -> MatchDelta {
        let delta = registry.get_all_accepted(&mut self.session, &self.filter);
        if delta.is_empty() {
            return delta;
        }
        log::info!(
            "config `{}`: {} new, {} deleted, {} matched containers",
            self.config_name,
            delta.new_count(),
            delta.delete_count(),
            self.session.matched_len()
        );

        for record in &delta.added {
            self.reporter.send(ReportEvent::ContainerAdded(
                ContainerDetail::from_record(record, &self.project),
            ));
        }
        if !delta.removed.is_empty() {
            self.reporter.send(ReportEvent::ContainersDeleted {
                project: self.project.clone(),
                ids: delta.removed.clone(),
            });
        }
        self.reporter.send(ReportEvent::ConfigResult(self.config_result()));
        delta
    }

    fn config_result(&self) -> ConfigResult {
        let mut ids: Vec<&str> = self
            .session
            .matched()
            .map(|record| record.id().short_id())
            .collect();
        ids.sort_unstable();

        let mut result = ConfigResult::new(&self.project, &self.config_name);
        result.input_type = "container".to_owned();
        result.input_is_container_file = "true".to_owned();
        result.path_exist_input_container_ids = join_ids(&ids);
        result
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use crate::container::{ContainerRecord, RawConfig, RawContainer};
    use crate::report;

    use super::*;

    fn labeled(id: &str, app: &str) -> ContainerRecord {
        let raw = RawContainer {
            config: Some(RawConfig {
                labels: Some(HashMap::from([("app".to_owned(), app.to_owned())])),
                ..Default::default()
            }),
            ..RawContainer::with_id(id, id)
        };
        ContainerRecord::create_info_detail(&raw, None, false).unwrap()
    }

    #[test]
    fn tick_reports_matched_containers() {
        let registry = ContainerRegistry::default();
        let (reporter, mut recorder) = report::channel(16);
        let store = recorder.store();
        let criteria = FilterCriteria::default().with_label_patterns(
            Some(HashMap::from([("app".to_owned(), "^web.*$".to_owned())])),
            None,
        );
        let mut binding =
            CollectionBinding::new("1##proj$web-logs", "proj", &criteria, reporter);

        registry.update_containers([labeled("c1", "web"), labeled("c2", "api")]);
        let delta = binding.tick(&registry);
        assert_eq!(delta.new_count(), 1);
        assert!(binding.session().is_matched("c1"));

        registry.remove_container("c1");
        let delta = binding.tick(&registry);
        assert_eq!(delta.delete_count(), 1);

        assert!(binding.tick(&registry).is_empty());

        let mut events = Vec::new();
        while let Some(event) = recorder.try_recv() {
            events.push(event);
        }
        assert_eq!(events.len(), 4);
        assert!(matches!(
            &events[0],
            ReportEvent::ContainerAdded(d) if d.container_id == "c1"
        ));
        assert!(matches!(
            &events[1],
            ReportEvent::ConfigResult(r) if r.path_exist_input_container_ids == "c1"
        ));
        assert!(matches!(
            &events[2],
            ReportEvent::ContainersDeleted { ids, .. } if ids.len() == 1
        ));
        assert!(matches!(
            &events[3],
            ReportEvent::ConfigResult(r) if r.path_exist_input_container_ids.is_empty()
        ));

        for event in events {
            store.apply(event);
        }
        store.apply(ReportEvent::ConfigResultSnapshot);
        let entries = store.drain("10.0.0.1", 1);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[2].get("config_name"), Some("web-logs"));
    }

    #[test]
    fn changing_criteria_reevaluates_containers() {
        let registry = ContainerRegistry::default();
        let (reporter, _recorder) = report::channel(16);
        let mut binding =
            CollectionBinding::new("cfg", "proj", &FilterCriteria::default(), reporter);
        registry.update_containers([labeled("c1", "web"), labeled("c2", "api")]);
        assert_eq!(binding.tick(&registry).new_count(), 2);

        binding.set_criteria(&FilterCriteria {
            include_labels: Some(HashMap::from([("app".to_owned(), "api".to_owned())])),
            ..Default::default()
        });
        let delta = binding.tick(&registry);
        assert_eq!(delta.new_count(), 1);
        assert_eq!(delta.added[0].id().as_str(), "c2");
    }
}
