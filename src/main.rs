// IdeaForge entry point.
//
// Startup sequence:
// 1. Initialize tracing (log to file, not terminal)
// 2. Seed and load config
// 3. Open the session store, restoring any saved session
// 4. Build the LLM client
// 5. Create mpsc channels
// 6. Spawn app logic task
// 7. Run the TUI event loop until the user quits
// 8. Cleanup on exit

use idea_assistant::app;
use idea_assistant::config;
use idea_assistant::llm;
use idea_assistant::session;
use idea_assistant::tui;

use anyhow::Context;
use tokio::sync::mpsc;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing (log to file, not terminal)
    init_tracing()?;
    info!("IdeaForge starting up");

    // 2. Seed missing config files from defaults, then load
    let base_dir = std::env::current_dir().context("failed to resolve working directory")?;
    let seeded = config::ensure_config_files(&base_dir).context("failed to seed config files")?;
    for path in &seeded {
        info!("Created config file {}", path.display());
    }
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: model={}, {} steps of input limits {}..{}",
        config.llm.model,
        idea_assistant::wizard::question::total_steps(),
        config.limits.min_input_chars,
        config.limits.max_input_chars
    );

    // 3. Open the session store
    let store = session::SessionStore::open(&config.session.db_path, config.session.obfuscate)
        .context("failed to open session store")?;
    info!("Session store opened at {}", config.session.db_path);

    // 4. Build the LLM client from config
    let llm_client = llm::client::LlmClient::from_config(&config);
    if llm_client.is_active() {
        info!("LLM client initialized (API key configured)");
    } else {
        info!("LLM client disabled (no API key); fallback content will be used");
    }

    // 5. Create mpsc channels
    let (llm_tx, llm_rx) = mpsc::channel(64);
    let (cmd_tx, cmd_rx) = mpsc::channel(64);
    let (ui_tx, ui_rx) = mpsc::channel(256);

    let app_state = app::AppState::new(config, store, llm_client, llm_tx);

    // 6. Spawn app logic task
    let app_handle = tokio::spawn(async move {
        if let Err(e) = app::run(cmd_rx, llm_rx, ui_tx, app_state).await {
            error!("Application loop error: {}", e);
        }
    });

    // 7. The TUI consumes ui_rx and sends commands through cmd_tx.
    // It blocks until the user quits.
    if let Err(e) = tui::run(ui_rx, cmd_tx).await {
        error!("TUI error: {}", e);
    }

    // 8. Cleanup: wait for the app task to finish (with timeout)
    let _ = tokio::time::timeout(std::time::Duration::from_secs(5), async {
        let _ = app_handle.await;
    })
    .await;

    info!("IdeaForge shut down cleanly");
    Ok(())
}

/// Initialize tracing to log to a file (not the terminal, which is used by the TUI).
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("ideaforge.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("idea_assistant=info,warn")),
        )
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
