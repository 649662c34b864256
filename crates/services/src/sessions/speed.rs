use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use drill_core::evaluator::AnswerMatch;
use drill_core::model::{DrillItem, ReviewEvent, SessionReport};
use drill_core::timed::{TickOutcome, TimedAnswer, TimedSession};

use crate::error::DrillError;
use crate::gamification::Gamification;
use crate::item_source::ItemSource;
use crate::reporter::ProgressReporter;

const TICK: Duration = Duration::from_secs(1);

/// Starts countdown drills over every initial and final.
pub struct SpeedService {
    source: Arc<ItemSource>,
    reporter: ProgressReporter,
    gamification: Gamification,
    durations: Vec<u32>,
    rng: Mutex<StdRng>,
}

impl SpeedService {
    #[must_use]
    pub fn new(
        source: Arc<ItemSource>,
        reporter: ProgressReporter,
        gamification: Gamification,
        durations: &[u32],
    ) -> Self {
        Self {
            source,
            reporter,
            gamification,
            durations: durations.to_vec(),
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    #[must_use]
    pub fn with_seed(self, seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..self
        }
    }

    /// Countdown lengths a drill may be started with, in seconds.
    #[must_use]
    pub fn durations(&self) -> &[u32] {
        &self.durations
    }

    /// Start a drill and its one-second countdown.
    ///
    /// # Errors
    ///
    /// Returns `DrillError::UnsupportedDuration` for a length that is not
    /// offered, or `DrillError::Session` when the pool is empty.
    pub async fn start(&self, duration_secs: u32) -> Result<SpeedDrill, DrillError> {
        if !self.durations.contains(&duration_secs) {
            return Err(DrillError::UnsupportedDuration {
                offered: self.durations.clone(),
            });
        }

        let pool = self.source.speed_pool()?;
        let mut rng = {
            let mut shared = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
            StdRng::from_rng(&mut *shared)
        };
        let session = TimedSession::start(pool, duration_secs, AnswerMatch::Exact, &mut rng)?;
        tracing::info!(duration_secs, session = %session.id(), "speed drill started");

        let session = Arc::new(Mutex::new(session));
        let (done_tx, done_rx) = watch::channel(false);
        let ticker = tokio::spawn(run_countdown(
            Arc::clone(&session),
            self.reporter.clone(),
            done_tx,
        ));

        Ok(SpeedDrill {
            session,
            rng,
            ticker,
            finished: done_rx,
            reporter: self.reporter.clone(),
            gamification: self.gamification.clone(),
        })
    }
}

async fn run_countdown(
    session: Arc<Mutex<TimedSession>>,
    reporter: ProgressReporter,
    done: watch::Sender<bool>,
) {
    let mut interval = tokio::time::interval(TICK);
    // The first tick completes immediately.
    interval.tick().await;

    loop {
        interval.tick().await;
        let outcome = lock(&session).tick();
        match outcome {
            TickOutcome::Running { time_left } => tracing::trace!(time_left, "tick"),
            TickOutcome::Expired => {
                let report = lock(&session).to_report();
                tracing::info!(
                    total = report.total,
                    correct = report.correct,
                    "speed drill expired"
                );
                reporter.report_session(report);
                break;
            }
            TickOutcome::Stopped => break,
        }
    }
    let _ = done.send(true);
}

fn lock(session: &Mutex<TimedSession>) -> MutexGuard<'_, TimedSession> {
    session.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Result of one speed-mode answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpeedFeedback {
    pub answer: TimedAnswer,
    pub xp_total: Option<u32>,
}

/// Point-in-time view of a running or finished drill.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedStats {
    pub running: bool,
    pub time_left: u32,
    pub total: u32,
    pub correct: u32,
    /// Correct answers per minute.
    pub throughput: f64,
    pub accuracy_percent: f64,
}

/// A live speed drill. Dropping it cancels the countdown.
pub struct SpeedDrill {
    session: Arc<Mutex<TimedSession>>,
    rng: StdRng,
    ticker: JoinHandle<()>,
    finished: watch::Receiver<bool>,
    reporter: ProgressReporter,
    gamification: Gamification,
}

impl SpeedDrill {
    /// Answer the current item and advance.
    ///
    /// Blank input is ignored and yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns `DrillError::Session` once the drill has ended.
    pub async fn submit(&mut self, raw: &str) -> Result<Option<SpeedFeedback>, DrillError> {
        let result = lock(&self.session).submit_answer(raw, &mut self.rng);
        let answer = match result {
            Ok(answer) => answer,
            Err(err) if err.is_ignorable_input() => return Ok(None),
            Err(err) => return Err(err.into()),
        };

        self.reporter
            .report_review(ReviewEvent::for_answer(&answer.item, answer.correct));
        let xp_total = match self.gamification.record_answer(answer.correct).await {
            Ok(total) => total,
            Err(err) => {
                tracing::warn!(error = %err, "xp award failed");
                None
            }
        };

        Ok(Some(SpeedFeedback { answer, xp_total }))
    }

    #[must_use]
    pub fn current_item(&self) -> Option<DrillItem> {
        lock(&self.session).current_item().cloned()
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        lock(&self.session).is_running()
    }

    #[must_use]
    pub fn stats(&self) -> SpeedStats {
        let session = lock(&self.session);
        SpeedStats {
            running: session.is_running(),
            time_left: session.time_left(),
            total: session.total(),
            correct: session.correct(),
            throughput: session.throughput(),
            accuracy_percent: session.accuracy_percent(),
        }
    }

    #[must_use]
    pub fn report(&self) -> SessionReport {
        lock(&self.session).to_report()
    }

    /// End the drill now. Nothing is reported for a stopped drill.
    pub fn stop(&mut self) {
        if lock(&self.session).stop() {
            tracing::info!("speed drill stopped");
        }
        self.ticker.abort();
    }

    /// Flips to `true` when the countdown runs out.
    #[must_use]
    pub fn finished(&self) -> watch::Receiver<bool> {
        self.finished.clone()
    }

    /// Resolve once the countdown has ended or been cancelled.
    pub async fn wait_until_finished(&self) {
        let mut finished = self.finished.clone();
        // Err means the countdown task is gone, which also ends the drill.
        let _ = finished.wait_for(|done| *done).await;
    }
}

impl Drop for SpeedDrill {
    fn drop(&mut self) {
        self.ticker.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{BackendClient, Transport};
    use crate::test_support::{FailingStore, StubTransport};
    use drill_core::catalog::bundled_mappings;
    use drill_core::model::AppSettings;
    use drill_core::session::SessionError;
    use drill_core::time::fixed_clock;
    use storage::repository::{InMemoryRepository, KeyValueStore};

    fn service(stub: &Arc<StubTransport>) -> SpeedService {
        let repo = InMemoryRepository::new();
        service_with_kv(stub, repo.clone(), Arc::new(repo))
    }

    fn service_with_kv(
        stub: &Arc<StubTransport>,
        repo: InMemoryRepository,
        kv: Arc<dyn KeyValueStore>,
    ) -> SpeedService {
        let client = Arc::new(BackendClient::new(
            Arc::clone(stub) as Arc<dyn Transport>,
            Arc::new(repo),
            fixed_clock(),
        ));
        let source =
            ItemSource::new(bundled_mappings().unwrap(), None, &AppSettings::default()).unwrap();
        SpeedService::new(
            Arc::new(source),
            ProgressReporter::new(client),
            Gamification::new(kv, fixed_clock(), 5),
            &[30, 60, 120],
        )
        .with_seed(3)
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    fn expected(drill: &SpeedDrill) -> String {
        drill.current_item().unwrap().expected_answer().to_string()
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_expiry_reports_the_session() {
        let stub = Arc::new(StubTransport::new());
        let mut drill = service(&stub).start(30).await.unwrap();

        let answer = expected(&drill);
        let feedback = drill.submit(&answer).await.unwrap().unwrap();
        assert!(feedback.answer.correct);
        assert_eq!(feedback.xp_total, Some(5));
        let wrong = drill.submit("nope").await.unwrap().unwrap();
        assert!(!wrong.answer.correct);
        assert_eq!(wrong.xp_total, Some(10));

        drill.wait_until_finished().await;
        settle().await;

        let stats = drill.stats();
        assert!(!stats.running);
        assert_eq!(stats.time_left, 0);
        assert_eq!((stats.total, stats.correct), (2, 1));
        assert!((stats.throughput - 2.0).abs() < f64::EPSILON);
        assert!(drill.current_item().is_none());
        assert!(matches!(
            drill.submit("b").await,
            Err(DrillError::Session(SessionError::NotInProgress))
        ));

        let posts = stub.posts();
        assert_eq!(posts.iter().filter(|(p, _)| p == "/api/review").count(), 2);
        let session = posts.iter().find(|(p, _)| p == "/api/session").unwrap();
        assert_eq!(session.1["phase"], 5);
        assert_eq!(session.1["mode"], "speed");
        assert_eq!(session.1["duration"], 30);
        assert_eq!(session.1["total"], 2);
    }

    #[tokio::test(start_paused = true)]
    async fn countdown_ticks_once_per_second() {
        let stub = Arc::new(StubTransport::new());
        let drill = service(&stub).start(60).await.unwrap();
        settle().await;

        tokio::time::advance(Duration::from_secs(10)).await;
        settle().await;
        assert_eq!(drill.stats().time_left, 50);
        assert!(!*drill.finished().borrow());
    }

    #[tokio::test(start_paused = true)]
    async fn stop_cancels_without_reporting() {
        let stub = Arc::new(StubTransport::new());
        let mut drill = service(&stub).start(30).await.unwrap();
        drill.stop();

        tokio::time::advance(Duration::from_secs(60)).await;
        settle().await;
        drill.wait_until_finished().await;

        assert!(!drill.is_running());
        assert!(stub.posts().iter().all(|(p, _)| p != "/api/session"));
        assert_eq!(drill.report().total, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn blank_answers_are_not_counted() {
        let stub = Arc::new(StubTransport::new());
        let mut drill = service(&stub).start(120).await.unwrap();
        assert!(drill.submit("   ").await.unwrap().is_none());
        assert_eq!(drill.stats().total, 0);
        assert_eq!(drill.stats().accuracy_percent, 100.0);
    }

    #[tokio::test]
    async fn only_offered_durations_start() {
        let stub = Arc::new(StubTransport::new());
        let service = service(&stub);
        match service.start(45).await {
            Err(DrillError::UnsupportedDuration { offered }) => {
                assert_eq!(offered, vec![30, 60, 120]);
            }
            other => panic!("unexpected: {:?}", other.map(|d| d.report())),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn failed_xp_award_still_counts_the_answer() {
        let stub = Arc::new(StubTransport::new());
        let service = service_with_kv(&stub, InMemoryRepository::new(), Arc::new(FailingStore));
        let mut drill = service.start(60).await.unwrap();

        let answer = expected(&drill);
        let feedback = drill.submit(&answer).await.unwrap().unwrap();
        assert!(feedback.answer.correct);
        assert_eq!(feedback.xp_total, None);
        assert_eq!((drill.stats().total, drill.stats().correct), (1, 1));
        assert!(drill.is_running());
    }
}
