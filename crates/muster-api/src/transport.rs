// Shared transport configuration for building reqwest::Client instances.
//
// Controllers run private CAs or self-signed certificates, so TLS trust is
// configured per endpoint rather than from the system store.

use std::time::Duration;

use crate::error::Error;

/// Transport configuration for building HTTP clients.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    /// CA certificate in PEM form. `None` accepts any certificate
    /// (self-signed controllers).
    pub cacert: Option<String>,
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            cacert: None,
            timeout: Duration::from_secs(30),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    ///
    /// Cookie storage is always enabled — the controller issues a session
    /// cookie at login which authenticates all later calls.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let mut builder = reqwest::Client::builder()
            .timeout(self.timeout)
            .cookie_store(true)
            .user_agent(concat!("muster/", env!("CARGO_PKG_VERSION")));

        match self.cacert {
            Some(ref pem) => {
                let cert = reqwest::Certificate::from_pem(pem.as_bytes())
                    .map_err(|e| Error::Tls(format!("invalid CA cert: {e}")))?;
                builder = builder.add_root_certificate(cert);
            }
            None => {
                builder = builder.danger_accept_invalid_certs(true);
            }
        }

        builder
            .build()
            .map_err(|e| Error::Tls(format!("failed to build HTTP client: {e}")))
    }
}
