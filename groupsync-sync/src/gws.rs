//! Groups Web Service client.
//!
//! Blocking `ureq` agent authenticated by TLS client certificate.
//!
//! | call | request |
//! |---|---|
//! | list | `GET {base}/group/{group}/member` |
//! | add | `PUT {base}/group/{group}/member/{id,id,...}` |
//! | remove | `DELETE {base}/group/{group}/member/{id,id,...}` |

use std::path::Path;
use std::sync::Arc;

use native_tls::{Certificate, Identity, TlsConnector};
use serde::Deserialize;

use groupsync_core::{Config, MemberId};

use crate::error::{io_err, ApiError, SyncError};
use crate::source::{MemberRecord, MembershipApi};

#[derive(Debug, Deserialize)]
struct MemberListing {
    data: Vec<MemberRecord>,
}

/// [`MembershipApi`] over HTTPS.
pub struct GwsClient {
    agent: ureq::Agent,
    base_url: String,
}

impl GwsClient {
    /// Build a client from the connection settings in `config`.
    ///
    /// The CA and client certificate are PEM; the key is PKCS#8 PEM.
    pub fn from_config(config: &Config) -> Result<Self, SyncError> {
        let roots = load_ca_bundle(&config.gws_ca_cert)?;
        let cert = read_pem(&config.gws_client_cert)?;
        let key = read_pem(&config.gws_client_key)?;
        let identity = Identity::from_pkcs8(&cert, &key).map_err(|e| SyncError::Tls {
            path: config.gws_client_key.clone(),
            reason: e.to_string(),
        })?;

        // Only the configured CA is trusted, never the system store.
        let mut tls = TlsConnector::builder();
        tls.disable_built_in_roots(true).identity(identity);
        for root in roots {
            tls.add_root_certificate(root);
        }
        let connector = tls.build().map_err(|e| SyncError::Tls {
            path: config.gws_client_cert.clone(),
            reason: e.to_string(),
        })?;

        let mut builder = ureq::AgentBuilder::new().tls_connector(Arc::new(connector));
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }

        Ok(Self::with_agent(builder.build(), &config.gws_base_url))
    }

    /// Use a pre-built agent (plain HTTP test servers, custom proxies).
    pub fn with_agent(agent: ureq::Agent, base_url: &str) -> Self {
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn members_url(&self, group: &str) -> String {
        format!("{}/group/{group}/member", self.base_url)
    }

    fn batch_url(&self, group: &str, members: &[MemberId]) -> String {
        let ids: Vec<&str> = members.iter().map(MemberId::as_str).collect();
        format!("{}/{}", self.members_url(group), ids.join(","))
    }
}

impl MembershipApi for GwsClient {
    fn list_members(&self, group: &str) -> Result<Vec<MemberRecord>, ApiError> {
        let response = self
            .agent
            .get(&self.members_url(group))
            .call()
            .map_err(|e| match e {
                ureq::Error::Status(code, _) => ApiError::Status(code),
                ureq::Error::Transport(t) => ApiError::Transport(t.to_string()),
            })?;
        let listing: MemberListing = serde_json::from_reader(response.into_reader())
            .map_err(|e| ApiError::Payload(e.to_string()))?;
        Ok(listing.data)
    }

    fn add_members(&self, group: &str, members: &[MemberId]) -> Result<u16, ApiError> {
        status_of(self.agent.put(&self.batch_url(group, members)).call())
    }

    fn remove_members(&self, group: &str, members: &[MemberId]) -> Result<u16, ApiError> {
        status_of(self.agent.delete(&self.batch_url(group, members)).call())
    }
}

/// Any HTTP answer counts as a completed call; only transport errors fail.
fn status_of(result: Result<ureq::Response, ureq::Error>) -> Result<u16, ApiError> {
    match result {
        Ok(response) => Ok(response.status()),
        Err(ureq::Error::Status(code, _)) => Ok(code),
        Err(ureq::Error::Transport(t)) => Err(ApiError::Transport(t.to_string())),
    }
}

/// Every certificate in a PEM file, in file order.
fn load_ca_bundle(path: &Path) -> Result<Vec<Certificate>, SyncError> {
    let roots = Certificate::stack_from_pem(&read_pem(path)?).map_err(|e| SyncError::Tls {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    if roots.is_empty() {
        return Err(SyncError::Tls {
            path: path.to_path_buf(),
            reason: "no PEM certificates found".into(),
        });
    }
    Ok(roots)
}

fn read_pem(path: &Path) -> Result<Vec<u8>, SyncError> {
    std::fs::read(path).map_err(|e| io_err(path, e))
}

#[cfg(test)]
mod tests {
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::path::PathBuf;
    use std::thread;

    use super::*;

    /// Serve one canned HTTP response per connection and return the request lines seen.
    fn serve(responses: Vec<(u16, &'static str)>) -> (String, thread::JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        let handle = thread::spawn(move || {
            let mut seen = Vec::new();
            for (status, body) in responses {
                let (stream, _) = listener.accept().expect("accept");
                let mut reader = BufReader::new(stream.try_clone().expect("clone"));
                let mut request_line = String::new();
                reader.read_line(&mut request_line).expect("request line");
                let mut content_length = 0usize;
                loop {
                    let mut header = String::new();
                    reader.read_line(&mut header).expect("header");
                    if header == "\r\n" || header.is_empty() {
                        break;
                    }
                    if let Some(v) = header.to_ascii_lowercase().strip_prefix("content-length:") {
                        content_length = v.trim().parse().unwrap_or(0);
                    }
                }
                let mut discard = vec![0u8; content_length];
                reader.read_exact(&mut discard).expect("body");
                seen.push(request_line.trim_end().to_string());

                let mut stream = stream;
                write!(
                    stream,
                    "HTTP/1.1 {status} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                )
                .expect("respond");
            }
            seen
        });
        (format!("http://{addr}/v3/"), handle)
    }

    fn client(base: &str) -> GwsClient {
        GwsClient::with_agent(ureq::AgentBuilder::new().build(), base)
    }

    fn ids(v: &[&str]) -> Vec<MemberId> {
        v.iter().map(|s| MemberId::from(*s)).collect()
    }

    #[test]
    fn list_members_parses_data_array() {
        let body = r#"{"data":[{"type":"uwnetid","id":"bob","name":"Bob"},{"type":"group","id":"u_x"}]}"#;
        let (base, server) = serve(vec![(200, body)]);
        let records = client(&base).list_members("u_test").expect("list");
        assert_eq!(
            records,
            vec![
                MemberRecord::new("uwnetid", "bob"),
                MemberRecord::new("group", "u_x")
            ]
        );
        let seen = server.join().expect("server");
        assert_eq!(seen, vec!["GET /v3/group/u_test/member HTTP/1.1"]);
    }

    #[test]
    fn list_members_non_success_is_status_error() {
        let (base, server) = serve(vec![(404, r#"{"errors":[]}"#)]);
        let err = client(&base).list_members("u_missing").unwrap_err();
        assert!(matches!(err, ApiError::Status(404)), "got: {err}");
        server.join().expect("server");
    }

    #[test]
    fn list_members_garbage_is_payload_error() {
        let (base, server) = serve(vec![(200, "not json")]);
        let err = client(&base).list_members("u_test").unwrap_err();
        assert!(matches!(err, ApiError::Payload(_)), "got: {err}");
        server.join().expect("server");
    }

    #[test]
    fn batch_calls_join_ids_and_report_any_status() {
        let (base, server) = serve(vec![(200, "{}"), (403, "{}")]);
        let gws = client(&base);
        let status = gws
            .add_members("u_test", &ids(&["alice", "bob"]))
            .expect("completed");
        assert_eq!(status, 200);
        let status = gws.remove_members("u_test", &ids(&["carol"])).expect("completed");
        assert_eq!(status, 403);
        let seen = server.join().expect("server");
        assert_eq!(
            seen,
            vec![
                "PUT /v3/group/u_test/member/alice,bob HTTP/1.1",
                "DELETE /v3/group/u_test/member/carol HTTP/1.1",
            ]
        );
    }

    #[test]
    fn unreachable_server_is_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);
        let err = client(&format!("http://{addr}"))
            .add_members("u_test", &ids(&["alice"]))
            .unwrap_err();
        assert!(matches!(err, ApiError::Transport(_)), "got: {err}");
    }

    #[test]
    fn missing_ca_cert_is_io_error() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let config = Config {
            gws_base_url: "https://groups.example.edu".into(),
            gws_ca_cert: dir.path().join("ca.pem"),
            gws_client_cert: PathBuf::from("client.pem"),
            gws_client_key: PathBuf::from("client.key"),
            group_map: vec![],
            pacing_interval_ms: 0,
            gws_timeout_secs: None,
            on_group_failure: Default::default(),
        };
        let err = GwsClient::from_config(&config).err().expect("should fail");
        assert!(matches!(err, SyncError::Io { .. }), "got: {err}");
        assert!(err.to_string().contains("ca.pem"));
    }

    #[test]
    fn invalid_ca_cert_is_tls_error() {
        let dir = tempfile::TempDir::new().expect("tempdir");
        let ca = dir.path().join("ca.pem");
        std::fs::write(&ca, "not a certificate").expect("write");
        let config = Config {
            gws_base_url: "https://groups.example.edu".into(),
            gws_ca_cert: ca,
            gws_client_cert: dir.path().join("client.pem"),
            gws_client_key: dir.path().join("client.key"),
            group_map: vec![],
            pacing_interval_ms: 0,
            gws_timeout_secs: None,
            on_group_failure: Default::default(),
        };
        let err = GwsClient::from_config(&config).err().expect("should fail");
        assert!(matches!(err, SyncError::Tls { .. }), "got: {err}");
    }

    fn fixture(name: &str) -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join(name)
    }

    fn fixture_config(ca: &str) -> Config {
        Config {
            gws_base_url: "https://groups.example.edu".into(),
            gws_ca_cert: fixture(ca),
            gws_client_cert: fixture("client.pem"),
            gws_client_key: fixture("client.key"),
            group_map: vec![],
            pacing_interval_ms: 0,
            gws_timeout_secs: None,
            on_group_failure: Default::default(),
        }
    }

    #[test]
    fn ca_bundle_loads_every_certificate() {
        let roots = load_ca_bundle(&fixture("ca-bundle.pem")).expect("bundle");
        assert_eq!(roots.len(), 2);

        let gws_root = load_ca_bundle(&fixture("gws-ca.pem")).expect("gws root");
        assert_eq!(gws_root.len(), 1);
        assert_eq!(
            roots[1].to_der().expect("der"),
            gws_root[0].to_der().expect("der"),
            "trust anchor after an unrelated root is still loaded"
        );
    }

    #[test]
    fn client_builds_from_bundle_with_anchor_last() {
        GwsClient::from_config(&fixture_config("ca-bundle.pem")).expect("client");
        GwsClient::from_config(&fixture_config("gws-ca.pem")).expect("client");
    }
}
