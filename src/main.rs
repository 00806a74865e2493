use std::sync::Arc;

use anyhow::Result;
use kaiwa_core::orchestrator::{EndpointConfig, TurnSessionConfig};
use kaiwa_core::session::frontend::ConsoleFrontend;
use kaiwa_core::session::SessionManager;
use kaiwa_core::speech::{SilentSynthesis, UnavailableRecognition};
use kaiwa_core::telemetry::init_tracing;
use tokio::io::{AsyncBufReadExt, BufReader};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let endpoints = EndpointConfig::from_env();
    let defaults = TurnSessionConfig::default();
    let manager = SessionManager::new(
        &endpoints,
        &defaults,
        Arc::new(UnavailableRecognition),
        Arc::new(SilentSynthesis),
    );
    manager.run().await?;

    let (handle, updates) = manager.start_conversation(defaults);
    let pump = SessionManager::spawn_frontend_pump(Arc::new(ConsoleFrontend::new()), updates);

    println!("メッセージを入力してください。/voice で音声入力、/log で履歴送信、/quit で終了。");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            "" => continue,
            "/quit" => break,
            "/voice" => handle.activate().await?,
            "/log" => handle.flush_log().await?,
            text => handle.submit_text(text).await?,
        }
    }

    drop(handle);
    pump.await?;
    Ok(())
}
