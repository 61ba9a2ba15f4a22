use std::collections::HashMap;

const POD_NAMESPACE_LABEL: &str = "io.kubernetes.pod.namespace";
const POD_NAME_LABEL: &str = "io.kubernetes.pod.name";
const CONTAINER_NAME_LABEL: &str = "io.kubernetes.container.name";

/// Prefix kubelet uses for the runtime names of the containers it creates:
/// `k8s_<container>_<pod>_<namespace>_<pod-uid>_<attempt>`.
const KUBELET_NAME_PREFIX: &str = "k8s_";

/// Orchestration metadata of a container. Empty for containers that are not
/// managed by Kubernetes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct K8sInfo {
    pub namespace: String,
    pub pod_name: String,
    pub container_name: String,
    pub labels: HashMap<String, String>,
}

impl K8sInfo {
    /// Derives the pod coordinates from the runtime labels kubelet attaches,
    /// falling back to the kubelet naming scheme of the runtime name.
    pub fn detect(
        name: &str,
        labels: &HashMap<String, String>,
        pod_labels: HashMap<String, String>,
    ) -> Self {
        let label = |key: &str| labels.get(key).cloned().unwrap_or_default();
        let mut info = Self {
            namespace: label(POD_NAMESPACE_LABEL),
            pod_name: label(POD_NAME_LABEL),
            container_name: label(CONTAINER_NAME_LABEL),
            labels: pod_labels,
        };

        if info.pod_name.is_empty() {
            if let Some((container, pod, namespace)) = parse_kubelet_name(name) {
                info.container_name = container.to_owned();
                info.pod_name = pod.to_owned();
                info.namespace = namespace.to_owned();
            }
        }

        info
    }

    pub fn is_empty(&self) -> bool {
        self.pod_name.is_empty() && self.namespace.is_empty()
    }
}

fn parse_kubelet_name(name: &str) -> Option<(&str, &str, &str)> {
    let name = name.trim_start_matches('/');
    let rest = name.strip_prefix(KUBELET_NAME_PREFIX)?;
    let mut parts = rest.split('_');
    let container = parts.next()?;
    let pod = parts.next()?;
    let namespace = parts.next()?;
    // pod uid and restart attempt
    parts.next()?;
    parts.next()?;
    if container.is_empty() || pod.is_empty() || namespace.is_empty() {
        return None;
    }
    Some((container, pod, namespace))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_from_labels() {
        let mut labels = HashMap::new();
        labels.insert(POD_NAMESPACE_LABEL.to_owned(), "default".to_owned());
        labels.insert(POD_NAME_LABEL.to_owned(), "nginx-5fd7568b67-4sh8c".to_owned());
        labels.insert(CONTAINER_NAME_LABEL.to_owned(), "nginx".to_owned());

        let info = K8sInfo::detect("/whatever", &labels, HashMap::new());
        assert_eq!(info.namespace, "default");
        assert_eq!(info.pod_name, "nginx-5fd7568b67-4sh8c");
        assert_eq!(info.container_name, "nginx");
        assert!(!info.is_empty());
    }

    #[test]
    fn detects_from_kubelet_name() {
        let info = K8sInfo::detect(
            "/k8s_nginx_nginx-5fd7568b67-4sh8c_kube-system_0c1d2e3f_0",
            &HashMap::new(),
            HashMap::new(),
        );
        assert_eq!(info.container_name, "nginx");
        assert_eq!(info.pod_name, "nginx-5fd7568b67-4sh8c");
        assert_eq!(info.namespace, "kube-system");
    }

    #[test]
    fn plain_container_has_no_k8s_info() {
        assert!(K8sInfo::detect("/web", &HashMap::new(), HashMap::new()).is_empty());
        assert!(K8sInfo::detect("/k8s_only_two", &HashMap::new(), HashMap::new()).is_empty());
    }
}
