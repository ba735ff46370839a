// Integration tests for the idea wizard.
//
// These tests exercise the full system end-to-end using the library crate's
// public API: they spawn the real app event loop, drive it with UserCommand
// messages over the command channel, and assert on the UiUpdate stream the
// TUI would consume. The LLM client stays disabled throughout, so every
// request resolves through the deterministic fallback path.

use std::path::PathBuf;
use std::time::Duration;

use idea_assistant::app::{self, AppState};
use idea_assistant::config::{
    Config, CredentialsConfig, LimitsConfig, LlmConfig, SessionConfig,
};
use idea_assistant::llm::client::{fallback_suggestions, LlmClient};
use idea_assistant::protocol::{LlmStatus, Screen, UiUpdate, UserCommand};
use idea_assistant::session::SessionStore;
use idea_assistant::wizard::advisor::AdvisorId;
use idea_assistant::wizard::question::AnswerValue;

use tokio::sync::mpsc;

// ===========================================================================
// Test helpers
// ===========================================================================

fn test_config(db_path: &str) -> Config {
    Config {
        llm: LlmConfig {
            model: "gpt-4o-mini".into(),
            temperature: 0.7,
            suggestion_max_tokens: 500,
            report_max_tokens: 1200,
            request_timeout_secs: 30,
            max_retries: 3,
        },
        limits: LimitsConfig {
            min_input_chars: 3,
            max_input_chars: 2000,
            max_requests_per_minute: 20,
            rate_window_secs: 60,
        },
        session: SessionConfig {
            db_path: db_path.into(),
            obfuscate: false,
            max_age_hours: 24,
        },
        credentials: CredentialsConfig {
            openai_api_key: None,
        },
    }
}

/// Spawn the real app loop against an in-memory (or file-backed) store with
/// the LLM client disabled. Returns the command sender and update receiver.
fn spawn_app(
    db_path: &str,
) -> (mpsc::Sender<UserCommand>, mpsc::Receiver<UiUpdate>) {
    let config = test_config(db_path);
    let store = SessionStore::open(db_path, false).expect("open store");

    let (llm_tx, llm_rx) = mpsc::channel(16);
    let (cmd_tx, cmd_rx) = mpsc::channel(16);
    let (ui_tx, ui_rx) = mpsc::channel(64);

    let state = AppState::new(config, store, LlmClient::Disabled, llm_tx);
    tokio::spawn(app::run(cmd_rx, llm_rx, ui_tx, state));

    (cmd_tx, ui_rx)
}

/// Receive the next UiUpdate or fail the test after two seconds.
async fn next_update(ui_rx: &mut mpsc::Receiver<UiUpdate>) -> UiUpdate {
    tokio::time::timeout(Duration::from_secs(2), ui_rx.recv())
        .await
        .expect("timed out waiting for a UI update")
        .expect("UI channel closed")
}

/// Keep receiving until an update matches, failing after a bounded number of
/// intermediate updates.
async fn wait_for<F>(ui_rx: &mut mpsc::Receiver<UiUpdate>, mut pred: F) -> UiUpdate
where
    F: FnMut(&UiUpdate) -> bool,
{
    for _ in 0..32 {
        let update = next_update(ui_rx).await;
        if pred(&update) {
            return update;
        }
    }
    panic!("expected update never arrived");
}

/// The fixed answer set used to walk the whole questionnaire.
fn full_answers() -> Vec<(u32, AnswerValue)> {
    vec![
        (1, AnswerValue::Text("A meal-prep planning app".into())),
        (2, AnswerValue::Text("Busy parents of young kids".into())),
        (3, AnswerValue::Text("Weeknight dinners take too much planning".into())),
        (4, AnswerValue::Text("It plans around what is already in the fridge".into())),
        (5, AnswerValue::Choice("Build a business".into())),
        (6, AnswerValue::Multi(vec!["Funding".into(), "Time".into()])),
        (7, AnswerValue::Scale(7)),
        (8, AnswerValue::Flag(true)),
    ]
}

async fn submit_all(
    cmd_tx: &mpsc::Sender<UserCommand>,
    ui_rx: &mut mpsc::Receiver<UiUpdate>,
) {
    for (question_id, value) in full_answers() {
        cmd_tx
            .send(UserCommand::SubmitAnswer {
                question_id,
                value,
                ai_generated: false,
            })
            .await
            .unwrap();
        wait_for(ui_rx, |u| matches!(u, UiUpdate::Snapshot(_))).await;
    }
}

/// A unique temp database path for persistence tests.
fn temp_db(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("ideaforge-it-{}-{}.db", std::process::id(), name))
}

fn remove_db(path: &PathBuf) {
    for suffix in ["", "-wal", "-shm"] {
        let mut file = path.clone().into_os_string();
        file.push(suffix);
        let _ = std::fs::remove_file(file);
    }
}

// ===========================================================================
// Wizard flow
// ===========================================================================

#[tokio::test]
async fn wizard_walks_from_welcome_to_review() {
    let (cmd_tx, mut ui_rx) = spawn_app(":memory:");

    // The app pushes its restored state first.
    let UiUpdate::Snapshot(snapshot) = next_update(&mut ui_rx).await else {
        panic!("expected initial snapshot");
    };
    assert_eq!(snapshot.screen, Screen::Welcome);
    assert!(snapshot.advisor.is_none());

    cmd_tx
        .send(UserCommand::SelectAdvisor(AdvisorId::Strategist))
        .await
        .unwrap();
    let update = wait_for(&mut ui_rx, |u| matches!(u, UiUpdate::Snapshot(_))).await;
    let UiUpdate::Snapshot(snapshot) = update else {
        unreachable!()
    };
    assert_eq!(snapshot.screen, Screen::Question);
    assert_eq!(snapshot.step, 1);
    assert_eq!(snapshot.advisor, Some(AdvisorId::Strategist));

    submit_all(&cmd_tx, &mut ui_rx).await;

    // Re-request a snapshot indirectly: the last submit already produced one
    // with the Review screen; go Back and forward again to observe both.
    cmd_tx.send(UserCommand::Back).await.unwrap();
    let update = wait_for(&mut ui_rx, |u| matches!(u, UiUpdate::Snapshot(_))).await;
    let UiUpdate::Snapshot(snapshot) = update else {
        unreachable!()
    };
    assert_eq!(snapshot.screen, Screen::Question);
    assert_eq!(snapshot.step, 8, "back from review reopens the last question");
    assert_eq!(snapshot.answers.len(), 8);
}

#[tokio::test]
async fn completed_wizard_lands_on_review_with_display_answers() {
    let (cmd_tx, mut ui_rx) = spawn_app(":memory:");
    next_update(&mut ui_rx).await;

    cmd_tx
        .send(UserCommand::SelectAdvisor(AdvisorId::Supporter))
        .await
        .unwrap();
    wait_for(&mut ui_rx, |u| matches!(u, UiUpdate::Snapshot(_))).await;

    for (question_id, value) in full_answers() {
        cmd_tx
            .send(UserCommand::SubmitAnswer {
                question_id,
                value,
                ai_generated: question_id == 3,
            })
            .await
            .unwrap();
        let update = wait_for(&mut ui_rx, |u| matches!(u, UiUpdate::Snapshot(_))).await;
        if question_id == 8 {
            let UiUpdate::Snapshot(snapshot) = update else {
                unreachable!()
            };
            assert_eq!(snapshot.screen, Screen::Review);
            let displays: Vec<&(u32, String, bool)> = snapshot.answers.iter().collect();
            assert_eq!(displays.len(), 8);
            assert_eq!(displays[4].1, "Build a business");
            assert_eq!(displays[5].1, "Funding, Time");
            assert_eq!(displays[6].1, "7/10 (confidence)");
            assert_eq!(displays[7].1, "Yes, I have user feedback");
            assert!(displays[2].2, "AI-generated flag survives to review");
        }
    }
}

#[tokio::test]
async fn invalid_answers_produce_notices_not_progress() {
    let (cmd_tx, mut ui_rx) = spawn_app(":memory:");
    next_update(&mut ui_rx).await;

    cmd_tx
        .send(UserCommand::SelectAdvisor(AdvisorId::Challenger))
        .await
        .unwrap();
    wait_for(&mut ui_rx, |u| matches!(u, UiUpdate::Snapshot(_))).await;

    // Too short after sanitization (whitespace collapses away).
    cmd_tx
        .send(UserCommand::SubmitAnswer {
            question_id: 1,
            value: AnswerValue::Text("  a  ".into()),
            ai_generated: false,
        })
        .await
        .unwrap();
    let update = wait_for(&mut ui_rx, |u| matches!(u, UiUpdate::Notice(_))).await;
    let UiUpdate::Notice(message) = update else {
        unreachable!()
    };
    assert!(!message.is_empty());

    // An answer of the wrong shape for the question is also rejected.
    cmd_tx
        .send(UserCommand::SubmitAnswer {
            question_id: 1,
            value: AnswerValue::Scale(5),
            ai_generated: false,
        })
        .await
        .unwrap();
    wait_for(&mut ui_rx, |u| matches!(u, UiUpdate::Notice(_))).await;

    // A valid answer still goes through afterwards.
    cmd_tx
        .send(UserCommand::SubmitAnswer {
            question_id: 1,
            value: AnswerValue::Text("A real idea".into()),
            ai_generated: false,
        })
        .await
        .unwrap();
    let update = wait_for(&mut ui_rx, |u| matches!(u, UiUpdate::Snapshot(_))).await;
    let UiUpdate::Snapshot(snapshot) = update else {
        unreachable!()
    };
    assert_eq!(snapshot.step, 2);
}

// ===========================================================================
// Fallback contracts (LLM disabled)
// ===========================================================================

#[tokio::test]
async fn disabled_llm_serves_the_fixed_fallback_suggestions() {
    let (cmd_tx, mut ui_rx) = spawn_app(":memory:");
    next_update(&mut ui_rx).await;

    cmd_tx
        .send(UserCommand::SelectAdvisor(AdvisorId::Supporter))
        .await
        .unwrap();
    wait_for(&mut ui_rx, |u| matches!(u, UiUpdate::Snapshot(_))).await;

    cmd_tx
        .send(UserCommand::RequestSuggestions {
            question_id: 1,
            draft: "meal prep".into(),
        })
        .await
        .unwrap();

    let update = wait_for(&mut ui_rx, |u| matches!(u, UiUpdate::Suggestions { .. })).await;
    let UiUpdate::Suggestions {
        question_id,
        options,
        fallback,
    } = update
    else {
        unreachable!()
    };
    assert_eq!(question_id, 1);
    assert!(fallback);
    assert_eq!(
        options,
        vec![
            "Streamline daily tasks.".to_string(),
            "Enhance personal productivity.".to_string(),
            "Simplify complex workflows.".to_string(),
        ]
    );
    assert_eq!(options, fallback_suggestions());

    let update = wait_for(&mut ui_rx, |u| {
        matches!(u, UiUpdate::SuggestionStatus(LlmStatus::Fallback))
    })
    .await;
    assert!(matches!(
        update,
        UiUpdate::SuggestionStatus(LlmStatus::Fallback)
    ));
}

#[tokio::test]
async fn disabled_llm_substitutes_the_fallback_report() {
    let (cmd_tx, mut ui_rx) = spawn_app(":memory:");
    next_update(&mut ui_rx).await;

    cmd_tx
        .send(UserCommand::SelectAdvisor(AdvisorId::Challenger))
        .await
        .unwrap();
    wait_for(&mut ui_rx, |u| matches!(u, UiUpdate::Snapshot(_))).await;
    submit_all(&cmd_tx, &mut ui_rx).await;

    cmd_tx.send(UserCommand::ConfirmReview).await.unwrap();

    let update = wait_for(&mut ui_rx, |u| matches!(u, UiUpdate::Report(_))).await;
    let UiUpdate::Report(report) = update else {
        unreachable!()
    };
    assert!(report.summary.contains("The Challenger"));
    assert!(!report.next_steps.is_empty());

    wait_for(&mut ui_rx, |u| {
        matches!(u, UiUpdate::ReportStatus(LlmStatus::Fallback))
    })
    .await;

    let update = wait_for(&mut ui_rx, |u| matches!(u, UiUpdate::Snapshot(_))).await;
    let UiUpdate::Snapshot(snapshot) = update else {
        unreachable!()
    };
    assert_eq!(snapshot.screen, Screen::Report);
}

// ===========================================================================
// Persistence
// ===========================================================================

#[tokio::test]
async fn session_survives_a_restart() {
    let db = temp_db("restart");
    remove_db(&db);
    let db_str = db.to_string_lossy().into_owned();

    {
        let (cmd_tx, mut ui_rx) = spawn_app(&db_str);
        next_update(&mut ui_rx).await;

        cmd_tx
            .send(UserCommand::SelectAdvisor(AdvisorId::Strategist))
            .await
            .unwrap();
        wait_for(&mut ui_rx, |u| matches!(u, UiUpdate::Snapshot(_))).await;

        for (question_id, value) in full_answers().into_iter().take(3) {
            cmd_tx
                .send(UserCommand::SubmitAnswer {
                    question_id,
                    value,
                    ai_generated: false,
                })
                .await
                .unwrap();
            wait_for(&mut ui_rx, |u| matches!(u, UiUpdate::Snapshot(_))).await;
        }

        cmd_tx.send(UserCommand::Quit).await.unwrap();
    }

    // A fresh app over the same database resumes where the user left off.
    let (_cmd_tx, mut ui_rx) = spawn_app(&db_str);
    let UiUpdate::Snapshot(snapshot) = next_update(&mut ui_rx).await else {
        panic!("expected initial snapshot");
    };
    assert_eq!(snapshot.advisor, Some(AdvisorId::Strategist));
    assert_eq!(snapshot.screen, Screen::Question);
    assert_eq!(snapshot.step, 4);
    assert_eq!(snapshot.answers.len(), 3);

    remove_db(&db);
}

#[tokio::test]
async fn start_over_clears_the_stored_session() {
    let db = temp_db("startover");
    remove_db(&db);
    let db_str = db.to_string_lossy().into_owned();

    {
        let (cmd_tx, mut ui_rx) = spawn_app(&db_str);
        next_update(&mut ui_rx).await;

        cmd_tx
            .send(UserCommand::SelectAdvisor(AdvisorId::Supporter))
            .await
            .unwrap();
        wait_for(&mut ui_rx, |u| matches!(u, UiUpdate::Snapshot(_))).await;

        cmd_tx
            .send(UserCommand::SubmitAnswer {
                question_id: 1,
                value: AnswerValue::Text("Throwaway idea".into()),
                ai_generated: false,
            })
            .await
            .unwrap();
        wait_for(&mut ui_rx, |u| matches!(u, UiUpdate::Snapshot(_))).await;

        cmd_tx.send(UserCommand::StartOver).await.unwrap();
        let update = wait_for(&mut ui_rx, |u| matches!(u, UiUpdate::Snapshot(_))).await;
        let UiUpdate::Snapshot(snapshot) = update else {
            unreachable!()
        };
        assert_eq!(snapshot.screen, Screen::Welcome);
        assert!(snapshot.answers.is_empty());

        cmd_tx.send(UserCommand::Quit).await.unwrap();
    }

    let (_cmd_tx, mut ui_rx) = spawn_app(&db_str);
    let UiUpdate::Snapshot(snapshot) = next_update(&mut ui_rx).await else {
        panic!("expected initial snapshot");
    };
    assert_eq!(snapshot.screen, Screen::Welcome);
    assert!(snapshot.advisor.is_none());

    remove_db(&db);
}
