pub mod calibration;
pub mod config;
pub mod errors;
pub mod tools;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::calibration::{CalibrationEngine, CalibrationStore};
use crate::errors::PrecisionResult;
use crate::tools::types::{ToolCall, ToolReply};

/// Serve calibration tool calls over stdin/stdout, one JSON object per line.
pub async fn run() -> PrecisionResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    // Load .env file if present (ignore error if not found)
    let _ = dotenvy::dotenv();

    let cfg = match config::load_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!(error = %e, "Failed to load config; using defaults");
            config::AppConfig::default()
        }
    };

    let engine = CalibrationEngine::from_config(&cfg.calibration)?;
    let stdin = BufReader::new(tokio::io::stdin());
    let stdout = tokio::io::stdout();
    serve(&engine, stdin, stdout).await
}

/// Read `{"tool": .., "arguments": ..}` lines and answer each with one
/// `{"ok": .., "result"|"error": ..}` line. Stops at end of input.
pub async fn serve<S, R, W>(
    engine: &CalibrationEngine<S>,
    mut reader: R,
    mut writer: W,
) -> PrecisionResult<()>
where
    S: CalibrationStore,
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut line = Vec::new();
    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).await? == 0 {
            break;
        }
        if line.iter().all(u8::is_ascii_whitespace) {
            continue;
        }
        let reply = match serde_json::from_slice::<ToolCall>(&line) {
            Ok(call) => match tools::dispatch(engine, &call.tool, call.arguments) {
                Ok(result) => ToolReply::success(result),
                Err(e) => {
                    tracing::warn!(tool = %call.tool, error = %e, "tool call failed");
                    ToolReply::failure(e)
                }
            },
            Err(e) => ToolReply::failure(format!("Malformed tool call: {e}")),
        };
        let mut out = serde_json::to_string(&reply)?;
        out.push('\n');
        writer.write_all(out.as_bytes()).await?;
        writer.flush().await?;
    }
    tracing::info!("input closed, shutting down");
    Ok(())
}
