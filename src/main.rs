use anyhow::{Context as _, Result};
use goal_dialog::catalog::Catalogs;
use goal_dialog::config::PolicyConfig;
use goal_dialog::kernel::{Action, DialogManager};
use goal_dialog::nlu::TurnPayload;
use goal_dialog::outputs::realizer::{TemplateRealizer, TEMPLATES_FILE};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

const POLICY_FILE: &str = "policy.yml";

fn load_policy(dir: &Path) -> Result<PolicyConfig> {
    let path = dir.join(POLICY_FILE);
    if !path.exists() {
        return Ok(PolicyConfig::default());
    }
    let source = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    PolicyConfig::from_yaml_str(&source).with_context(|| format!("parsing {}", path.display()))
}

fn load_templates(dir: &Path) -> Result<Option<TemplateRealizer>> {
    let path = dir.join(TEMPLATES_FILE);
    if !path.exists() {
        return Ok(None);
    }
    let source = std::fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    let realizer = TemplateRealizer::from_yaml_str(&source).with_context(|| format!("parsing {}", path.display()))?;
    Ok(Some(realizer))
}

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Setup Logging
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).context("setting default subscriber failed")?;

    // 2. Load catalogs (refuse to start on malformed ones)
    let dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data"));
    let catalogs = Arc::new(Catalogs::load_dir(&dir).with_context(|| format!("loading catalogs from {}", dir.display()))?);
    let policy = load_policy(&dir)?;
    let realizer = load_templates(&dir)?;

    let mut manager = DialogManager::new(Arc::clone(&catalogs), policy);
    let mut context = manager.new_context();
    tracing::info!(conversation = ?context.id(), "Dialog manager ready. One JSON payload per line.");

    // 3. One turn per stdin line
    let stdin = tokio::io::stdin();
    let mut lines = BufReader::new(stdin).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let payload: TurnPayload = match serde_json::from_str(&line) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!("Ignoring malformed payload: {}", e);
                continue;
            }
        };

        // An aborted turn leaves the context untouched; keep serving.
        let actions = match manager.handle_turn(&payload, &mut context) {
            Ok(actions) => actions,
            Err(e) => {
                tracing::error!("Turn failed: {}", e);
                continue;
            }
        };

        println!("{}", serde_json::to_string(&actions)?);
        if let Some(realizer) = &realizer {
            for action in actions.iter().filter(|a| !matches!(a, Action::Run { .. })) {
                match realizer.realize(action, &context, &catalogs) {
                    Ok(text) => println!("> {}", text),
                    Err(e) => tracing::warn!("{}", e),
                }
            }
        }
    }

    let snapshot = manager.telemetry.snapshot();
    tracing::info!("Session over: {:?}", snapshot);
    Ok(())
}
