use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use drill_core::catalog::RuleTopic;
use drill_core::model::{AnswerMode, AppSettings, GroupFilter};
use drill_core::time::fixed_now;
use services::{ApiError, AppServices, Clock, PhaseRequest, Transport};
use storage::repository::Storage;

/// Backend double: canned GET bodies, recorded POSTs.
#[derive(Default)]
struct RecordingBackend {
    bodies: HashMap<String, String>,
    posts: Mutex<Vec<(String, serde_json::Value)>>,
}

impl RecordingBackend {
    fn posts_to(&self, path: &str) -> Vec<serde_json::Value> {
        self.posts
            .lock()
            .unwrap()
            .iter()
            .filter(|(p, _)| p == path)
            .map(|(_, body)| body.clone())
            .collect()
    }
}

#[async_trait]
impl Transport for RecordingBackend {
    async fn get(&self, path: &str) -> Result<String, ApiError> {
        self.bodies.get(path).cloned().ok_or(ApiError::Disabled)
    }

    async fn post(&self, path: &str, body: serde_json::Value) -> Result<(), ApiError> {
        self.posts.lock().unwrap().push((path.to_string(), body));
        Ok(())
    }
}

async fn services(backend: &Arc<RecordingBackend>) -> AppServices {
    AppServices::from_parts(
        Storage::in_memory(),
        Arc::clone(backend) as Arc<dyn Transport>,
        AppSettings::default(),
        Clock::fixed(fixed_now()),
    )
    .await
    .unwrap()
}

async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn bounded_phases_report_reviews_and_summaries() {
    let backend = Arc::new(RecordingBackend::default());
    let services = services(&backend).await;
    let drills = services.drills();

    let requests = [
        PhaseRequest::Sounds {
            filter: GroupFilter::parse("velar"),
            mode: AnswerMode::Input,
        },
        PhaseRequest::Sounds {
            filter: GroupFilter::parse("retroflex"),
            mode: AnswerMode::MultipleChoice,
        },
        PhaseRequest::Rules {
            topic: RuleTopic::TonePlacement,
        },
    ];

    let mut answered = 0;
    for request in &requests {
        let mut session = drills.start(request).await.unwrap();
        while !session.is_complete() {
            let expected = session.current_item().unwrap().expected_answer().to_string();
            let feedback = drills.submit(&mut session, &expected).await.unwrap().unwrap();
            assert!(feedback.outcome.correct);
            answered += 1;
        }
        assert_eq!(session.summary().unwrap().accuracy_percent(), 100.0);
    }
    settle().await;

    assert_eq!(backend.posts_to("/api/review").len(), answered);
    let sessions = backend.posts_to("/api/session");
    let phases: Vec<_> = sessions.iter().map(|s| s["phase"].clone()).collect();
    assert_eq!(phases, vec![1, 1, 2]);
    assert_eq!(sessions[1]["mode"], "recognition");
    assert_eq!(
        services.gamification().xp().await.unwrap(),
        u32::try_from(answered).unwrap() * 5
    );
}

#[tokio::test]
async fn character_phase_survives_a_dead_backend() {
    let backend = Arc::new(RecordingBackend::default());
    let services = services(&backend).await;

    let mut session = services.drills().start(&PhaseRequest::Characters).await.unwrap();
    assert_eq!(session.total_items(), 20);
    let wrong = services
        .drills()
        .submit(&mut session, "definitely-wrong")
        .await
        .unwrap()
        .unwrap();
    assert!(!wrong.outcome.correct);
    assert_eq!(wrong.xp_total, Some(5));
    assert_eq!(session.wrong_count(), 1);
}

#[tokio::test(start_paused = true)]
async fn speed_drill_runs_to_expiry() {
    let backend = Arc::new(RecordingBackend::default());
    let services = services(&backend).await;

    let mut drill = services.speed().start(30).await.unwrap();
    for _ in 0..5 {
        let expected = drill.current_item().unwrap().expected_answer().to_string();
        drill.submit(&expected).await.unwrap().unwrap();
    }
    drill.wait_until_finished().await;
    settle().await;

    let stats = drill.stats();
    assert_eq!((stats.total, stats.correct), (5, 5));
    assert!((stats.throughput - 10.0).abs() < f64::EPSILON);

    let sessions = backend.posts_to("/api/session");
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["phase"], 5);
    assert_eq!(sessions[0]["duration"], 30);
}

#[tokio::test]
async fn dashboard_reads_progress() {
    let mut backend = RecordingBackend::default();
    backend.bodies.insert(
        "/api/progress".into(),
        r#"{"items":[{"item_id":"zh","item_type":"initial","repetitions":6,"correct_count":6,"wrong_count":2}],"sessions":[{"phase":5,"mode":"speed","duration":60,"total":4,"correct":3,"created_at":1700000000}]}"#.into(),
    );
    let backend = Arc::new(backend);
    let services = services(&backend).await;

    let dash = services.dashboard().load().await.unwrap();
    assert_eq!((dash.studied, dash.mastered, dash.session_count), (1, 1, 1));
    let zh = dash.initials.iter().find(|c| c.pinyin == "zh").unwrap();
    assert_eq!(zh.level, 4);
    assert_eq!(dash.weak_items[0].item_id, "zh");
    assert_eq!(dash.recent_sessions[0].accuracy, 75);
}
