// ── Controller endpoint description ──
//
// Describes *how* to reach one controller. Carries credential data and
// never touches disk — `muster-config` builds these from the config file.

use secrecy::SecretString;
use url::Url;

/// Connection descriptor for a single controller.
#[derive(Debug, Clone)]
pub struct ControllerEndpoint {
    /// Configured controller label, used in logs.
    pub name: String,
    /// API endpoint URL (e.g. `https://10.0.0.2:17070`).
    pub endpoint: Url,
    pub username: String,
    pub password: SecretString,
    /// CA certificate in PEM form, when the controller uses a private CA.
    /// Absent means the controller presents a self-signed certificate.
    pub cacert: Option<String>,
    /// Controller UUID as recorded in configuration; used to cross-check
    /// the identity reported at login.
    pub uuid: String,
}
