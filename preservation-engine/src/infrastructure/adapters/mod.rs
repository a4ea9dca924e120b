//! Concrete implementations of domain interfaces (ports), following the
//! Hexagonal Architecture pattern: one adapter per external collaborator
//! spec.md treats as out of scope (§1), plus the repository adapters under
//! `repositories`.

/// HTTP-backed CMS client (§4.5's ambient collaborator)
pub mod cms_http_client;

/// SFTP-backed DPRES transport (§4.6's ambient collaborator)
pub mod dpres_sftp_transport;

/// Subprocess-backed SIP construction collaborators (§4.3's out-of-scope
/// download/build/upload/confirm steps)
pub mod sip_subprocess;

pub use cms_http_client::CmsHttpClient;
pub use dpres_sftp_transport::{DpresSftpConfig, DpresSftpTransport};
pub use sip_subprocess::{SipSubprocessAdapter, SipToolingConfig};
