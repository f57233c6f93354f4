//! Plugin side of the protocol: answer requests read from `input` until
//! `Shutdown` or end of input.

use crate::protocol::{
    PluginError, PluginErrorKind, PluginInfo, PluginMethod, PluginRequest, PluginResponse,
    PluginResult,
};
use sheetpack_core::ContentSource;
use std::io::{self, BufRead, Write};

pub fn serve<S, R, W>(source: &S, info: &PluginInfo, input: R, mut output: W) -> io::Result<()>
where
    S: ContentSource + ?Sized,
    R: BufRead,
    W: Write,
{
    tracing::info!(plugin_id = %info.id, "Serving plugin requests");
    for line in input.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let (response, done) = match serde_json::from_str::<PluginRequest>(&line) {
            Ok(request) => {
                let done = request.method == PluginMethod::Shutdown;
                let result = handle(source, info, request.method);
                (PluginResponse { id: request.id, result }, done)
            }
            Err(err) => {
                tracing::warn!(error = %err, "Malformed plugin request");
                let error = PluginError::new(
                    PluginErrorKind::MalformedRequest,
                    format!("malformed request: {err}"),
                );
                (
                    PluginResponse {
                        id: 0,
                        result: PluginResult::Error(error),
                    },
                    false,
                )
            }
        };

        let json = serde_json::to_string(&response)?;
        writeln!(output, "{json}")?;
        output.flush()?;

        if done {
            tracing::info!(plugin_id = %info.id, "Plugin shutdown requested");
            break;
        }
    }
    Ok(())
}

fn handle<S: ContentSource + ?Sized>(
    source: &S,
    info: &PluginInfo,
    method: PluginMethod,
) -> PluginResult {
    match method {
        PluginMethod::Initialize => PluginResult::Initialized(info.clone()),
        PluginMethod::Call { method, arg } => {
            PluginResult::Envelope(source.call(&method, arg.as_deref()))
        }
        PluginMethod::Shutdown => PluginResult::ShutdownAck,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sheetpack_core::{MemoryPack, RecordType, Resolver};
    use std::io::Cursor;
    use std::sync::Arc;

    fn resolver() -> Resolver {
        let pack = MemoryPack::new("srd", "SRD")
            .with_record(RecordType::Feats, "[[feat]]\nname = \"Alert\"\n");
        Resolver::new(Arc::new(pack))
    }

    fn run(input: &str) -> Vec<PluginResponse> {
        let info = PluginInfo::new("srd", "SRD", "1.0.0");
        let mut output = Vec::new();
        serve(&resolver(), &info, Cursor::new(input), &mut output).unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn answers_each_request_in_order() {
        let responses = run(concat!(
            r#"{"id":1,"method":{"type":"Initialize"}}"#,
            "\n",
            r#"{"id":2,"method":{"type":"Call","params":{"method":"feats"}}}"#,
            "\n",
            r#"{"id":3,"method":{"type":"Call","params":{"method":"races"}}}"#,
            "\n",
        ));
        assert_eq!(responses.len(), 3);
        assert!(matches!(&responses[0].result, PluginResult::Initialized(info) if info.id == "srd"));

        let PluginResult::Envelope(feats) = &responses[1].result else {
            panic!("expected envelope");
        };
        assert_eq!(responses[1].id, 2);
        assert_eq!(feats.key(), Some("feats"));

        let PluginResult::Envelope(races) = &responses[2].result else {
            panic!("expected envelope");
        };
        assert!(races.is_empty());
    }

    #[test]
    fn unknown_method_comes_back_as_exception_envelope() {
        let responses = run(r#"{"id":9,"method":{"type":"Call","params":{"method":"monsters"}}}"#);
        let PluginResult::Envelope(envelope) = &responses[0].result else {
            panic!("expected envelope");
        };
        assert!(envelope.error_message().unwrap().contains("monsters"));
    }

    #[test]
    fn malformed_line_is_answered_and_loop_continues() {
        let responses = run(concat!(
            "not json\n",
            "\n",
            r#"{"id":4,"method":{"type":"Shutdown"}}"#,
            "\n",
            r#"{"id":5,"method":{"type":"Initialize"}}"#,
            "\n",
        ));
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0].id, 0);
        assert!(matches!(
            &responses[0].result,
            PluginResult::Error(err) if err.kind == PluginErrorKind::MalformedRequest
        ));
        assert_eq!(responses[1].id, 4);
        assert_eq!(responses[1].result, PluginResult::ShutdownAck);
    }
}
