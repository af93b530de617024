//! Maps parsed commands to gateway calls or simulated answers.

use std::sync::Arc;

use crate::config::ProxyConfig;
use crate::dispatch::command::CommandKind;
use crate::gateway::{GatewayClient, GatewayError};
use crate::observability::metrics;
use crate::protocol::{CommandEntry, Reply};

/// APDU answer used when the card is simulated.
pub const SIMULATED_APDU_RESPONSE: &str = "102030409000";
/// RESET answer used when the card is simulated.
pub const SIMULATED_RESET_RESPONSE: &str =
    "621A82013883023F008404524F4F5485030079AD8A0105A1038B01019000";

/// Resolves commands into replies. Shared read-only by all sessions.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    config: Arc<ProxyConfig>,
    gateway: GatewayClient,
}

impl Dispatcher {
    /// Create a dispatcher with a gateway client built from `config`.
    pub fn new(config: Arc<ProxyConfig>) -> Result<Self, GatewayError> {
        let gateway = GatewayClient::new(&config.gateway)?;
        Ok(Self { config, gateway })
    }

    /// Reader name to send to the gateway.
    ///
    /// With the local override enabled, remote reader names containing the
    /// configured marker are replaced by the local reader.
    pub fn terminal_for<'a>(&'a self, reader: &'a str) -> &'a str {
        let card = &self.config.card;
        if card.local_reader_override && reader.contains(card.remote_reader_marker.as_str()) {
            tracing::debug!(
                remote = %reader,
                local = %card.local_reader_name,
                "Substituting local reader"
            );
            &card.local_reader_name
        } else {
            reader
        }
    }

    /// Resolve a command to its response text, if any.
    async fn resolve(
        &self,
        kind: &CommandKind,
        reader: &str,
        entry: &CommandEntry,
    ) -> Option<String> {
        let simulate = self.config.card.simulate;

        match kind {
            CommandKind::Apdu if simulate => Some(SIMULATED_APDU_RESPONSE.to_string()),
            CommandKind::Reset if simulate => Some(SIMULATED_RESET_RESPONSE.to_string()),
            CommandKind::Apdu => {
                let terminal = self.terminal_for(reader);
                let apdu = entry.data().unwrap_or_default();
                self.gateway
                    .call(&[("apdu", apdu), ("terminal", terminal)])
                    .await
            }
            CommandKind::Reset => {
                let terminal = self.terminal_for(reader);
                self.gateway
                    .call(&[("reset", "1"), ("terminal", terminal), ("close", "1")])
                    .await
            }
            CommandKind::Enum => {
                tracing::warn!(command_id = %entry.id(), "ENUM is not supported");
                None
            }
            CommandKind::Unknown(name) => {
                tracing::warn!(command_id = %entry.id(), command = %name, "Unknown command");
                None
            }
        }
    }

    /// Resolve a command and format its reply; unresolved commands reply `FAIL`.
    pub async fn dispatch(&self, reader: &str, entry: &CommandEntry) -> Reply {
        tracing::info!(
            reader = %reader,
            command_id = %entry.id(),
            command = %entry.name(),
            data = entry.data().unwrap_or_default(),
            "Dispatching command"
        );

        let kind = CommandKind::from_name(entry.name());
        let reply = Reply::from_response(entry.id(), self.resolve(&kind, reader, entry).await);
        metrics::record_command(kind.metric_label(), reply.is_fail());
        reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A loopback port nothing listens on.
    fn closed_port() -> u16 {
        let reserved = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        reserved.local_addr().unwrap().port()
    }

    fn dispatcher(simulate: bool, local_override: bool) -> Dispatcher {
        let mut config = ProxyConfig::default();
        config.card.simulate = simulate;
        config.card.local_reader_override = local_override;
        config.card.local_reader_name = "OMNIKEY CardMan 6121 0".into();
        config.gateway.url = format!("http://127.0.0.1:{}/api/v1/basic", closed_port());
        config.gateway.connect_timeout_secs = 1;
        config.gateway.timeout_secs = 2;
        Dispatcher::new(Arc::new(config)).unwrap()
    }

    fn entry(id: &str, name: &str, data: Option<&str>) -> CommandEntry {
        CommandEntry::new(id, name, data).unwrap()
    }

    #[tokio::test]
    async fn simulated_apdu() {
        let d = dispatcher(true, false);
        let reply = d.dispatch("Simona1", &entry("42", "APDU", Some("00A4040300"))).await;
        assert_eq!(reply.to_wire(), ">42:102030409000@@\n");
    }

    #[tokio::test]
    async fn simulated_reset() {
        let d = dispatcher(true, false);
        let reply = d.dispatch("Simona1", &entry("7", "RESET", Some(""))).await;
        assert_eq!(
            reply.to_string(),
            ">7:621A82013883023F008404524F4F5485030079AD8A0105A1038B01019000@@"
        );
    }

    #[tokio::test]
    async fn keyword_case_does_not_matter() {
        let d = dispatcher(true, false);
        for name in ["apdu", "APDU", "ApDu"] {
            let reply = d.dispatch("r", &entry("1", name, Some("00"))).await;
            assert_eq!(reply.to_string(), ">1:102030409000@@");
        }
    }

    #[tokio::test]
    async fn enum_and_unknown_fail_even_when_simulated() {
        let d = dispatcher(true, false);
        assert_eq!(d.dispatch("Simona1", &entry("9", "ENUM", Some(""))).await.to_string(), ">9:FAIL@@");
        assert_eq!(d.dispatch("Simona1", &entry("10", "SELECT", None)).await.to_string(), ">10:FAIL@@");
    }

    #[tokio::test]
    async fn unreachable_gateway_fails_command() {
        let d = dispatcher(false, false);
        let reply = d.dispatch("Simona1", &entry("5", "APDU", Some("00B0000000"))).await;
        assert_eq!(reply.to_string(), ">5:FAIL@@");
    }

    #[test]
    fn override_replaces_marked_readers_only() {
        let d = dispatcher(false, true);
        assert_eq!(d.terminal_for("Simona1"), "OMNIKEY CardMan 6121 0");
        assert_eq!(d.terminal_for("Remote Simona Board 3"), "OMNIKEY CardMan 6121 0");
        assert_eq!(d.terminal_for("simona1"), "simona1");
        assert_eq!(d.terminal_for("Generic Reader"), "Generic Reader");
    }

    #[test]
    fn override_disabled_keeps_reader() {
        let d = dispatcher(false, false);
        assert_eq!(d.terminal_for("Simona1"), "Simona1");
    }
}
