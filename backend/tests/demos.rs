//! Replays the scripts shipped under `demos/` the way the replay binary does.

use std::fs::File;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use adapters::MemoryBackend;
use backend::config::Config;
use backend::script::EventScript;
use backend::{AccessDecision, AccessGuard, SessionReconciler};
use tokio::sync::mpsc;

fn demo(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../demos")
        .join(name)
}

async fn replay(script: &str) -> (Arc<MemoryBackend>, SessionReconciler) {
    let config = Config::load(Some(demo("session.toml").as_path())).unwrap();
    let backend = Arc::new(MemoryBackend::from_reader(File::open(demo("fixture.json")).unwrap()).unwrap());
    let script = EventScript::from_reader(File::open(demo(script)).unwrap()).unwrap();

    let reconciler = SessionReconciler::new(config.reconciler, backend.clone(), backend.clone());
    let (tx, rx) = mpsc::unbounded_channel();
    let listener = reconciler.listen(rx);
    reconciler.start();
    script.replay(&tx).await;
    drop(tx);
    listener.await.unwrap();
    tokio::time::sleep(Duration::from_secs(3)).await;
    (backend, reconciler)
}

#[tokio::test(start_paused = true)]
async fn spurious_sign_out_demo_keeps_estimator() {
    let (backend, reconciler) = replay("spurious_sign_out.json").await;
    let user = reconciler.subscribe().current_user().expect("estimator stays signed in");
    assert_eq!(user.role, "Estimator");
    assert_eq!(backend.session_calls(), 1);

    let guard = AccessGuard::default();
    assert_eq!(guard.check(&reconciler.state(), "/boq/12"), AccessDecision::Allow);
    assert_eq!(guard.check(&reconciler.state(), "/admin/users"), AccessDecision::Forbidden);
}

#[tokio::test(start_paused = true)]
async fn missing_initial_session_demo_resolves_via_fallback() {
    let (backend, reconciler) = replay("missing_initial_session.json").await;
    let user = reconciler.subscribe().current_user().expect("fallback resolved the user");
    assert_eq!(user.email, "estimator@tenderdesk.example");
    // the optimistic timer resolved first, so the mount fallback never queried
    assert_eq!(backend.session_calls(), 0);
}
