//! Delivery transport: one HTTP(S) POST per call.
//!
//! The payload is sent form-encoded. String values go out verbatim, any
//! other JSON value is sent as its JSON text. TLS trust is resolved per
//! owning user from `<certificates_root>/<uid>/*.pem` on top of the
//! webpki root set bundled with rustls.

use crate::error::{TransportError, TransportResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use reqwest::{Certificate, Client};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, warn};

/// Status and body returned by the remote server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryResponse {
    pub status: u16,
    pub body: String,
}

impl DeliveryResponse {
    /// True for any 2xx status.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs a single POST to a fully qualified URL.
///
/// An `Err` means the request never produced a response (connect failure,
/// TLS failure, timeout). Callers treat it the same as a non-2xx response.
#[async_trait]
pub trait DeliveryTransport: Send + Sync {
    async fn post(
        &self,
        url: &str,
        payload: &Map<String, Value>,
        owner_user_id: &str,
    ) -> TransportResult<DeliveryResponse>;
}

/// Flatten a payload into form fields.
pub fn form_fields(payload: &Map<String, Value>) -> Vec<(String, String)> {
    payload
        .iter()
        .map(|(key, value)| {
            let value = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            (key.clone(), value)
        })
        .collect()
}

/// Path, modification time and size of every trusted PEM file of an owner.
type TrustStamp = Vec<(PathBuf, Option<SystemTime>, u64)>;

struct CachedClient {
    stamp: TrustStamp,
    client: Client,
}

/// reqwest-backed transport with one cached client per owning user.
///
/// A cached client is reused only while the owner's trust directory is
/// unchanged; any added, removed or rewritten `.pem` file rebuilds it.
pub struct HttpTransport {
    timeout: Duration,
    certificates_root: Option<PathBuf>,
    clients: Mutex<HashMap<String, CachedClient>>,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            certificates_root: None,
            clients: Mutex::new(HashMap::new()),
        }
    }

    /// Look for per-user PEM roots under `root/<uid>/`.
    pub fn with_certificates_root(mut self, root: PathBuf) -> Self {
        self.certificates_root = Some(root);
        self
    }

    fn client_for(&self, owner_user_id: &str) -> TransportResult<Client> {
        let stamp = self.trust_stamp(owner_user_id)?;
        if let Some(cached) = self.clients.lock().get(owner_user_id) {
            if cached.stamp == stamp {
                return Ok(cached.client.clone());
            }
        }

        let mut builder = Client::builder().timeout(self.timeout);
        let certificates = self.load_certificates(owner_user_id)?;
        debug!(
            owner = owner_user_id,
            certificates = certificates.len(),
            "Building HTTP client"
        );
        for certificate in certificates {
            builder = builder.add_root_certificate(certificate);
        }
        let client = builder.build()?;

        self.clients.lock().insert(
            owner_user_id.to_string(),
            CachedClient {
                stamp,
                client: client.clone(),
            },
        );
        Ok(client)
    }

    /// Directory holding `owner_user_id`'s trusted roots, if one may exist.
    fn trust_dir(&self, owner_user_id: &str) -> Option<PathBuf> {
        let root = self.certificates_root.as_ref()?;
        let mut components = Path::new(owner_user_id).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Some(root.join(owner_user_id)),
            _ => {
                warn!(owner = owner_user_id, "Owner id is not a plain path segment, using default trust");
                None
            }
        }
    }

    /// Sorted `.pem` entries of the owner's trust directory.
    fn pem_files(&self, owner_user_id: &str) -> TransportResult<Vec<PathBuf>> {
        let Some(dir) = self.trust_dir(owner_user_id) else {
            return Ok(Vec::new());
        };
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut pem_files: Vec<PathBuf> = std::fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "pem"))
            .collect();
        pem_files.sort();
        Ok(pem_files)
    }

    fn trust_stamp(&self, owner_user_id: &str) -> TransportResult<TrustStamp> {
        self.pem_files(owner_user_id)?
            .into_iter()
            .map(|path| {
                let metadata = std::fs::metadata(&path)?;
                Ok((path, metadata.modified().ok(), metadata.len()))
            })
            .collect()
    }

    fn load_certificates(&self, owner_user_id: &str) -> TransportResult<Vec<Certificate>> {
        self.pem_files(owner_user_id)?
            .into_iter()
            .map(|path| {
                let bytes = std::fs::read(&path)?;
                Certificate::from_pem(&bytes).map_err(|e| TransportError::Certificate {
                    path,
                    reason: e.to_string(),
                })
            })
            .collect()
    }

    #[cfg(test)]
    fn cached_clients(&self) -> usize {
        self.clients.lock().len()
    }
}

#[async_trait]
impl DeliveryTransport for HttpTransport {
    async fn post(
        &self,
        url: &str,
        payload: &Map<String, Value>,
        owner_user_id: &str,
    ) -> TransportResult<DeliveryResponse> {
        let client = self.client_for(owner_user_id)?;

        let response = client.post(url).form(&form_fields(payload)).send().await?;

        let status = response.status().as_u16();
        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                debug!(url, status, error = %e, "Could not read response body");
                String::new()
            }
        };
        debug!(url, status, "POST finished");

        Ok(DeliveryResponse { status, body })
    }
}
