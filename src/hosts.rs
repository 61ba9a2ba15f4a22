//! Address lookup in hosts-style files (`/etc/hosts` format).
//!
//! Each non-comment line has the shape `ip alias1 alias2 ...`. The file is
//! re-read on every lookup because orchestrators rewrite container hosts files
//! while the container is running.
use std::io::BufRead;
use std::path::Path;

use crate::fsutil;

/// Returns the address of the first line in `hosts_path` that lists `token`
/// as one of its aliases.
///
/// Alias comparison is exact and case-sensitive. An unreadable file or a
/// token without a matching line yields an empty string, which callers treat
/// as "unresolved".
///
/// # Examples
///
/// ```no_run
/// # use creo_discovery::hosts;
/// let ip = hosts::resolve_ip("/etc/hosts", "localhost");
/// ```
pub fn resolve_ip(hosts_path: impl AsRef<Path>, token: &str) -> String {
    let hosts_path = hosts_path.as_ref();
    if token.is_empty() {
        return String::new();
    }

    let mut reader = match fsutil::open_file_reader(hosts_path) {
        Ok(reader) => reader,
        Err(err) => {
            log::debug!("cannot resolve `{}` from hosts file: {}", token, err);
            return String::new();
        }
    };

    let mut line = Vec::with_capacity(256);
    loop {
        line.clear();
        match reader.read_until(b'\n', &mut line) {
            Ok(0) => break,
            Ok(_) => {
                let text = String::from_utf8_lossy(&line);
                if let Some(ip) = match_line(&text, token) {
                    return ip.to_owned();
                }
            }
            Err(err) => {
                log::debug!(
                    "failed to read hosts file `{}`: {}",
                    hosts_path.display(),
                    err
                );
                break;
            }
        }
    }

    String::new()
}

fn match_line<'a>(line: &'a str, token: &str) -> Option<&'a str> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let content = line.split_once('#').map_or(line, |(content, _)| content);

    let mut fields = content.split_whitespace();
    let ip = fields.next()?;
    fields.any(|alias| alias == token).then_some(ip)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    const DOCKER_HOSTS: &str = "
192.168.5.3\t8be13ee0dd9e
127.0.0.1  \t  localhost
::1     localhost ip6-localhost ip6-loopback
fe00::0 ip6-localnet
ff00::0 ip6-mcastprefix
ff02::1 ip6-allnodes
ff02::2 ip6-allrouters
";

    const K8S_HOSTS: &str = "
# Kubernetes-managed hosts file.
127.0.0.1\tlocalhost
::1\tlocalhost ip6-localhost ip6-loopback
fe00::0\tip6-localnet
fe00::0\tip6-mcastprefix
fe00::1\tip6-allnodes
fe00::2\tip6-allrouters
172.20.4.5\tnginx-5fd7568b67-4sh8c
";

    fn hosts_file(content: &str) -> tempfile::NamedTempFile {
        let mut tmp = tempfile::NamedTempFile::new().expect("failed to create temp file");
        tmp.write_all(content.as_bytes()).unwrap();
        tmp
    }

    #[test]
    fn resolves_docker_short_id() {
        let file = hosts_file(DOCKER_HOSTS);
        assert_eq!(resolve_ip(file.path(), "8be13ee0dd9e"), "192.168.5.3");
        assert_eq!(resolve_ip(file.path(), "localhost"), "127.0.0.1");
        assert_eq!(resolve_ip(file.path(), "ip6-loopback"), "::1");
    }

    #[test]
    fn resolves_k8s_pod_name() {
        let file = hosts_file(K8S_HOSTS);
        assert_eq!(resolve_ip(file.path(), "nginx-5fd7568b67-4sh8c"), "172.20.4.5");
    }

    #[test]
    fn unknown_token_is_unresolved() {
        let file = hosts_file(K8S_HOSTS);
        assert_eq!(resolve_ip(file.path(), "nonexistent"), "");
        assert_eq!(resolve_ip(file.path(), "Localhost"), "");
        assert_eq!(resolve_ip(file.path(), ""), "");
    }

    #[test]
    fn comments_never_match() {
        let file = hosts_file("# 10.0.0.1 web\n10.0.0.2 db # web\n10.0.0.3 web\n");
        assert_eq!(resolve_ip(file.path(), "web"), "10.0.0.3");
        assert_eq!(resolve_ip(file.path(), "Kubernetes-managed"), "");
    }

    #[test]
    fn non_utf8_lines_do_not_stop_lookup() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"# caf\xe9 managed\n10.0.0.2 \xff\xfe\n10.0.0.3 web\n")
            .unwrap();
        assert_eq!(resolve_ip(file.path(), "web"), "10.0.0.3");
    }

    #[test]
    fn address_alone_is_not_an_alias() {
        let file = hosts_file("10.0.0.1\n10.0.0.2 10.0.0.1\n");
        assert_eq!(resolve_ip(file.path(), "10.0.0.1"), "10.0.0.2");
    }

    #[test]
    fn missing_file_is_unresolved() {
        assert_eq!(resolve_ip("/definitely/does/not/exist", "localhost"), "");
    }

    #[test]
    fn rereads_rewritten_file() {
        let file = hosts_file("10.0.0.1 web\n");
        assert_eq!(resolve_ip(file.path(), "web"), "10.0.0.1");

        std::fs::write(file.path(), "10.0.0.7 web\n").unwrap();
        assert_eq!(resolve_ip(file.path(), "web"), "10.0.0.7");
    }
}
