//! A [`ContentSource`] backed by an external plugin process.

use crate::host::{ExecPluginHost, PluginConfig, PluginHostError};
use sheetpack_core::{ContentSource, ResponseEnvelope};

/// Forwards every call to the plugin. Transport failures never escape:
/// they come back as an `exception` envelope like any other failure.
pub struct ExecPluginPack {
    host: ExecPluginHost,
    id: String,
    name: String,
}

impl ExecPluginPack {
    /// Spawn the plugin and complete the handshake.
    pub fn new(config: PluginConfig) -> Result<Self, PluginHostError> {
        let host = ExecPluginHost::new(config);
        let info = host.start()?;

        Ok(Self {
            host,
            id: info.id,
            name: info.name,
        })
    }

    /// Same as [`new`](Self::new) but keeps a configured id instead of the plugin's own.
    pub fn with_id(config: PluginConfig, id: String) -> Result<Self, PluginHostError> {
        let host = ExecPluginHost::new(config);
        let info = host.start()?;

        Ok(Self {
            host,
            id,
            name: info.name,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stop(&self) -> Result<(), PluginHostError> {
        self.host.stop()
    }

    pub fn is_running(&self) -> bool {
        self.host.is_running()
    }
}

impl ContentSource for ExecPluginPack {
    fn call(&self, method: &str, arg: Option<&str>) -> ResponseEnvelope {
        match self.host.call(method, arg) {
            Ok(envelope) => envelope,
            Err(err) => {
                tracing::error!(
                    plugin_id = %self.id,
                    method,
                    error = %err,
                    "Plugin call failed"
                );
                ResponseEnvelope::failure(format!("plugin {} failed: {err}", self.id))
            }
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::host::tests::fake_plugin;

    #[test]
    fn forwards_calls_to_plugin() {
        let script = fake_plugin(crate::PROTOCOL_VERSION);
        let pack = ExecPluginPack::new(PluginConfig::new(script.to_path_buf())).unwrap();
        assert_eq!(pack.id(), "fake");
        assert_eq!(pack.name(), "Fake Pack");

        let envelope = pack.call("races", None);
        assert_eq!(envelope.error_message(), Some("no races here"));
    }

    #[test]
    fn configured_id_wins() {
        let script = fake_plugin(crate::PROTOCOL_VERSION);
        let pack =
            ExecPluginPack::with_id(PluginConfig::new(script.to_path_buf()), "homebrew".into())
                .unwrap();
        assert_eq!(pack.id(), "homebrew");
    }

    #[test]
    fn concurrent_calls_get_their_own_responses() {
        let script = fake_plugin(crate::PROTOCOL_VERSION);
        let pack = ExecPluginPack::new(PluginConfig::new(script.to_path_buf())).unwrap();
        let methods = ["feats", "races", "spells", "items"];

        std::thread::scope(|scope| {
            for round in 0..8 {
                let pack = &pack;
                let method = methods[round % methods.len()];
                scope.spawn(move || {
                    for _ in 0..20 {
                        let envelope = pack.call(method, None);
                        assert_eq!(
                            envelope.error_message(),
                            Some(format!("no {method} here").as_str())
                        );
                    }
                });
            }
        });
    }

    #[test]
    fn stopped_plugin_reports_failure_in_envelope() {
        let script = fake_plugin(crate::PROTOCOL_VERSION);
        let pack = ExecPluginPack::new(PluginConfig::new(script.to_path_buf())).unwrap();
        pack.stop().unwrap();
        assert!(!pack.is_running());

        let envelope = pack.call("feats", None);
        assert!(envelope.is_failure());
        assert_eq!(
            envelope.error_message(),
            Some("plugin fake failed: plugin process terminated unexpectedly")
        );
    }
}
