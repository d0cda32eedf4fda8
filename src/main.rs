use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use langfeed_engine::logging::init_tracing;
use langfeed_engine::{EngineConfig, EngineError, JsonFileStore, LearningEngine};

const USAGE: &str = "usage: langfeed <user-id> [due|profile|dashboard|stats|export]";

fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let config = EngineConfig::from_env();
    let _log_guard = init_tracing(&config.logging);

    let mut args = std::env::args().skip(1);
    let Some(user_id) = args.next() else {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    };
    let view = args.next().unwrap_or_else(|| "dashboard".to_string());

    let dir = config
        .store_dir
        .clone()
        .unwrap_or_else(|| PathBuf::from("./data"));
    let store = match JsonFileStore::new(&dir) {
        Ok(store) => store,
        Err(err) => {
            tracing::error!(error = %err, dir = %dir.display(), "failed to open state store");
            return ExitCode::FAILURE;
        }
    };
    let engine = LearningEngine::new(config, Arc::new(store));

    match render(&engine, &user_id, &view) {
        Ok(Some(output)) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Ok(None) => {
            eprintln!("unknown view {view:?}\n{USAGE}");
            ExitCode::from(2)
        }
        Err(err) => {
            tracing::error!(error = %err, user_id = %user_id, "query failed");
            ExitCode::FAILURE
        }
    }
}

fn render(engine: &LearningEngine, user_id: &str, view: &str) -> Result<Option<String>, EngineError> {
    let json = match view {
        "due" => serde_json::to_string_pretty(&engine.get_due_words(user_id)?),
        "profile" => serde_json::to_string_pretty(&engine.get_profile(user_id)?),
        "dashboard" => serde_json::to_string_pretty(&engine.dashboard(user_id)?),
        "stats" => serde_json::to_string_pretty(&engine.stats(user_id)?),
        "export" => return engine.export_state(user_id).map(Some),
        _ => return Ok(None),
    };
    json.map(Some)
        .map_err(|err| EngineError::Store(err.into()))
}
