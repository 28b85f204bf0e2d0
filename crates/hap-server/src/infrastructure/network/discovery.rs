//! Discovery-service advertisement interface.
//!
//! The server announces itself (`_hap`/`_tcp` plus a TXT record set)
//! through whatever multicast discovery daemon the platform provides.
//! That daemon is an external service: this module only defines the
//! narrow interface the server loop calls, a log-only implementation
//! for running without a discovery backend, and a generated mock for
//! tests.

use mockall::automock;
use thiserror::Error;
use tracing::info;

/// Error reported by a discovery backend.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// The backend refused the operation (name conflict, daemon not
    /// running, malformed record, ...).
    #[error("discovery {op} rejected: {reason}")]
    Backend { op: &'static str, reason: String },
}

/// Advertisement operations consumed by the server.
///
/// `register_service` + `set_txt_records` are called when the server
/// starts listening, `unregister_service` when it stops.  Failures are
/// fatal to the lifecycle call that triggered them.
#[automock]
pub trait DiscoveryService {
    /// Publishes a service advertisement for `service_type` over
    /// `protocol` on `port`.
    fn register_service(
        &mut self,
        service_type: &str,
        protocol: &str,
        port: u16,
    ) -> Result<(), DiscoveryError>;

    /// Withdraws a previously published advertisement.
    fn unregister_service(
        &mut self,
        service_type: &str,
        protocol: &str,
    ) -> Result<(), DiscoveryError>;

    /// Attaches key-value metadata to an advertisement.  The server
    /// passes the pairs verbatim; it never interprets them.
    fn set_txt_records(
        &mut self,
        service_type: &str,
        protocol: &str,
        records: &[(String, String)],
    ) -> Result<(), DiscoveryError>;

    /// Sets the human-readable instance name peers see when browsing.
    fn set_instance_name(&mut self, name: &str) -> Result<(), DiscoveryError>;
}

/// Log-only discovery backend.
///
/// Used when no discovery daemon is wired up: every advertisement
/// operation succeeds and is recorded in the log so the server remains
/// runnable (and observable) on its own.
#[derive(Debug, Default)]
pub struct LoggingDiscovery;

impl DiscoveryService for LoggingDiscovery {
    fn register_service(
        &mut self,
        service_type: &str,
        protocol: &str,
        port: u16,
    ) -> Result<(), DiscoveryError> {
        info!(service_type, protocol, port, "advertising service");
        Ok(())
    }

    fn unregister_service(
        &mut self,
        service_type: &str,
        protocol: &str,
    ) -> Result<(), DiscoveryError> {
        info!(service_type, protocol, "withdrawing service advertisement");
        Ok(())
    }

    fn set_txt_records(
        &mut self,
        service_type: &str,
        protocol: &str,
        records: &[(String, String)],
    ) -> Result<(), DiscoveryError> {
        info!(
            service_type,
            protocol,
            record_count = records.len(),
            "publishing TXT records"
        );
        Ok(())
    }

    fn set_instance_name(&mut self, name: &str) -> Result<(), DiscoveryError> {
        info!(name, "setting discovery instance name");
        Ok(())
    }
}
