//! Carousel runner - one spin from tables to notifications

use common::{Email, RunMode};
use config::CarouselConfig;
use notify::{HttpMailer, LogNotifier, Message, Notifier, Templates};
use observability::RunMetrics;
use pairing_engine::{
    engine::eligible_pool, EngineConfig, HistoryLedger, PairingEngine, PairingOutcome, Participant,
    RunContext, SubscriberRecord, SubscriberSchema,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use storage::{SheetsTableStore, StorageError, TableNames, TableStore};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::report::RunReport;
use crate::Result;

/// Build the spreadsheet-backed store from config
pub fn build_store(config: &CarouselConfig) -> Result<Arc<dyn TableStore>> {
    Ok(Arc::new(SheetsTableStore::from_config(&config.sheet)?))
}

/// Build the notifier for a run mode
///
/// Only deploy runs get the mail relay; test runs log instead.
pub fn build_notifier(config: &CarouselConfig, mode: RunMode) -> Result<Arc<dyn Notifier>> {
    if mode.sends_notifications() {
        Ok(Arc::new(HttpMailer::from_config(config)?))
    } else {
        Ok(Arc::new(LogNotifier::new()))
    }
}

/// Orchestrates carousel runs against a table store and a notifier
pub struct Carousel {
    mode: RunMode,
    tables: TableNames,
    schema: SubscriberSchema,
    periodic: bool,
    engine: EngineConfig,
    templates: Templates,
    max_concurrent_sends: usize,
    send_timeout: Duration,
    context: Option<RunContext>,
    store: Arc<dyn TableStore>,
    notifier: Arc<dyn Notifier>,
    metrics: RunMetrics,
}

impl Carousel {
    /// Create a carousel
    ///
    /// In test mode the given notifier is replaced by a [`LogNotifier`], so a
    /// test run can never reach real recipients.
    pub fn new(
        config: &CarouselConfig,
        mode: RunMode,
        store: Arc<dyn TableStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let notifier: Arc<dyn Notifier> = if mode.sends_notifications() {
            notifier
        } else {
            Arc::new(LogNotifier::new())
        };

        Self {
            mode,
            tables: TableNames::resolve(&config.sheet, mode),
            schema: SubscriberSchema {
                periodic: config.matching.periodic,
                availability: config.matching.availability,
            },
            periodic: config.matching.periodic,
            engine: EngineConfig::from_config(&config.matching),
            templates: Templates::from_config(config),
            max_concurrent_sends: config.notifications.max_concurrent_sends,
            send_timeout: Duration::from_secs(config.notifications.send_timeout_seconds),
            context: None,
            store,
            notifier,
            metrics: RunMetrics::new(mode.as_str()),
        }
    }

    /// Evaluate periodic eligibility against a fixed context instead of today
    pub fn with_context(mut self, context: RunContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn mode(&self) -> RunMode {
        self.mode
    }

    pub fn tables(&self) -> &TableNames {
        &self.tables
    }

    /// Run the carousel once
    pub async fn spin(&self) -> Result<RunReport> {
        let run_id = Uuid::new_v4();
        let span = info_span!("spin", %run_id, mode = %self.mode);

        let timer = self.metrics.run_started();
        let report = self.run(run_id).instrument(span).await?;
        timer.succeeded();
        Ok(report)
    }

    async fn run(&self, run_id: Uuid) -> Result<RunReport> {
        let context = self.context.unwrap_or_else(RunContext::today);
        info!(
            subscribers = %self.tables.subscribers,
            history = %self.tables.history,
            week = context.week,
            "Spinning the carousel"
        );

        // Load
        let subscriber_table = self.store.fetch_table(&self.tables.subscribers).await?;
        let history_table = match self.store.fetch_table(&self.tables.history).await {
            Ok(table) => table,
            Err(StorageError::NotFound(name)) => {
                warn!(table = %name, "History table not found, starting from an empty ledger");
                common::Table::new(name, Vec::new(), Vec::new())
            }
            Err(e) => return Err(e.into()),
        };

        // Decode; any data-shape error ends the run before the ledger is touched
        let records = SubscriberRecord::from_table(&subscriber_table, self.schema)?;
        let mut ledger = HistoryLedger::from_table(&history_table)?;

        let participants: Vec<Participant> = records
            .iter()
            .map(|record| Participant::new(record, &ledger))
            .collect();
        let pool = if self.periodic {
            eligible_pool(participants, &context)
        } else {
            participants
        };
        self.metrics.record_pool(records.len(), pool.len());
        info!(subscribers = records.len(), eligible = pool.len(), "Pool built");

        // Pair
        let mut engine = PairingEngine::with_config(self.engine.clone());
        let outcome = engine.pair(&pool)?;
        self.metrics
            .record_outcome(outcome.pair_count(), outcome.leftover_count());

        // Commit
        let ledger_summary = ledger.reconcile(&pool, &outcome.pairings);
        ledger.sort_by_first();
        self.store
            .replace_table(&self.tables.history, &ledger.to_table(&self.tables.history))
            .await?;
        info!(rows = ledger.len(), "History committed");

        // Notify
        let messages = self.messages(&pool, &outcome);
        let notifications = notify::dispatch(
            self.notifier.as_ref(),
            messages,
            self.max_concurrent_sends,
            self.send_timeout,
        )
        .await;
        self.metrics
            .record_notifications(notifications.sent, notifications.failed());

        let report = RunReport {
            run_id,
            mode: self.mode,
            week: context.week,
            subscribers: records.len(),
            eligible: pool.len(),
            pairs: outcome.pairings.pairs().to_vec(),
            unmatched: outcome.unmatched,
            ledger: ledger_summary,
            notifications,
        };
        info!("{}", report.summary());
        Ok(report)
    }

    /// One message per participant of the run, in pool order
    fn messages(&self, pool: &[Participant], outcome: &PairingOutcome) -> Vec<Message> {
        let names: HashMap<&Email, &str> = pool.iter().map(|p| (p.identity(), p.name())).collect();

        pool.iter()
            .map(|p| match outcome.partner_of(p.identity()) {
                Some(partner) => {
                    let partner_name = names.get(partner).copied().unwrap_or_default();
                    self.templates
                        .matched(p.identity(), p.name(), partner, partner_name)
                }
                None => self.templates.no_match(p.identity(), p.name()),
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CarouselError;
    use assert_matches::assert_matches;
    use async_trait::async_trait;
    use common::Table;
    use notify::{MessageKind, NotifyError};
    use std::sync::Mutex;
    use storage::InMemoryTableStore;

    // ==================== Test doubles ====================

    /// Records every message; optionally fails for one recipient
    #[derive(Default)]
    struct MockNotifier {
        sent: Mutex<Vec<Message>>,
        fail_for: Option<Email>,
    }

    impl MockNotifier {
        fn failing_for(email: &str) -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail_for: Some(Email::new(email)),
            }
        }

        fn sent(&self) -> Vec<Message> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Notifier for MockNotifier {
        async fn send(&self, message: &Message) -> notify::Result<()> {
            if self.fail_for.as_ref() == Some(&message.to) {
                return Err(NotifyError::Transport("relay down".into()));
            }
            self.sent.lock().unwrap().push(message.clone());
            Ok(())
        }
    }

    /// Store whose writes always fail
    struct ReadOnlyStore(InMemoryTableStore);

    #[async_trait]
    impl TableStore for ReadOnlyStore {
        async fn fetch_table(&self, name: &str) -> storage::StoreResult<Table> {
            self.0.fetch_table(name).await
        }

        async fn replace_table(&self, name: &str, _table: &Table) -> storage::StoreResult<()> {
            Err(StorageError::Status {
                table: name.to_string(),
                status: 403,
                body: "read only".into(),
            })
        }
    }

    // ==================== Fixtures ====================

    fn config() -> CarouselConfig {
        let mut config = config::generate_default_config();
        config.carousel.name = "Test Carousel".to_string();
        config.matching.periodic = false;
        config
    }

    fn table(header: &[&str], rows: &[&[&str]]) -> Table {
        Table::new(
            "",
            header.iter().map(|s| s.to_string()).collect(),
            rows.iter()
                .map(|r| r.iter().map(|s| s.to_string()).collect())
                .collect(),
        )
    }

    fn subscribers(emails: &[&str]) -> Table {
        let rows: Vec<Vec<String>> = emails
            .iter()
            .map(|e| vec![e.split('@').next().unwrap_or_default().to_string(), e.to_string()])
            .collect();
        Table::new("", vec!["Name".into(), "Email".into()], rows)
    }

    fn history(rows: &[&[&str]]) -> Table {
        table(&["email1", "email2", "count"], rows)
    }

    fn store(subs: Table, hist: Table) -> Arc<InMemoryTableStore> {
        Arc::new(
            InMemoryTableStore::new()
                .with_table("subscribers", subs)
                .with_table("history", hist),
        )
    }

    fn deploy(store: Arc<InMemoryTableStore>, notifier: Arc<MockNotifier>) -> Carousel {
        Carousel::new(&config(), RunMode::Deploy, store, notifier)
    }

    // ==================== Tests ====================

    #[tokio::test]
    async fn test_spin_pairs_commits_and_notifies() {
        let store = store(subscribers(&["a@x", "b@x", "c@x", "d@x"]), history(&[]));
        let notifier = Arc::new(MockNotifier::default());

        let report = deploy(store.clone(), notifier.clone()).spin().await.unwrap();

        assert_eq!(report.pair_count(), 2);
        assert!(report.unmatched.is_empty());
        assert_eq!(report.ledger.inserted(), 4);
        assert_eq!(report.notifications.sent, 4);
        assert!(report.notifications.all_delivered());

        let written = store.snapshot("history").await.unwrap();
        assert_eq!(written.header, vec!["email1", "email2", "count"]);
        assert_eq!(written.len(), 4);
        let firsts: Vec<&str> = written.rows.iter().map(|r| r[0].as_str()).collect();
        assert_eq!(firsts, vec!["a@x", "b@x", "c@x", "d@x"]);
        assert!(written.rows.iter().all(|r| r[2] == "1"));

        let sent = notifier.sent();
        assert_eq!(sent.len(), 4);
        assert!(sent
            .iter()
            .all(|m| matches!(m.kind, MessageKind::Matched { .. })));
    }

    #[tokio::test]
    async fn test_odd_pool_notifies_leftover() {
        let store = store(subscribers(&["a@x", "b@x", "c@x"]), history(&[]));
        let notifier = Arc::new(MockNotifier::default());

        let report = deploy(store.clone(), notifier.clone()).spin().await.unwrap();

        assert_eq!(report.pair_count(), 1);
        assert_eq!(report.unmatched.len(), 1);
        assert_eq!(store.snapshot("history").await.unwrap().len(), 2);

        let leftover = &report.unmatched[0];
        let no_match: Vec<Message> = notifier
            .sent()
            .into_iter()
            .filter(|m| m.kind == MessageKind::NoMatch)
            .collect();
        assert_eq!(no_match.len(), 1);
        assert_eq!(&no_match[0].to, leftover);
    }

    #[tokio::test]
    async fn test_history_counts_increment() {
        let store = store(
            subscribers(&["a@x", "b@x"]),
            history(&[&["a@x", "b@x", "2"], &["b@x", "a@x", "2"]]),
        );
        let notifier = Arc::new(MockNotifier::default());

        let report = deploy(store.clone(), notifier).spin().await.unwrap();
        assert_eq!(report.ledger.incremented(), 2);

        let written = store.snapshot("history").await.unwrap();
        assert_eq!(written.rows[0], vec!["a@x", "b@x", "3"]);
        assert_eq!(written.rows[1], vec!["b@x", "a@x", "3"]);
    }

    #[tokio::test]
    async fn test_least_history_partner_chosen() {
        // a has met b twice and c never; b, c and d carry more history so a chooses first
        let store = store(
            subscribers(&["a@x", "b@x", "c@x", "d@x"]),
            history(&[
                &["a@x", "b@x", "2"],
                &["a@x", "c@x", "0"],
                &["b@x", "z@x", "5"],
                &["c@x", "z@x", "5"],
                &["d@x", "z@x", "5"],
            ]),
        );
        let notifier = Arc::new(MockNotifier::default());

        let report = deploy(store, notifier).spin().await.unwrap();
        assert_eq!(
            report.pairs,
            vec![
                (Email::new("a@x"), Email::new("c@x")),
                (Email::new("b@x"), Email::new("d@x")),
            ]
        );
    }

    #[tokio::test]
    async fn test_bad_data_leaves_ledger_untouched() {
        let store = store(
            subscribers(&["a@x", "b@x"]),
            history(&[&["a@x", "b@x", "many"]]),
        );
        let notifier = Arc::new(MockNotifier::default());

        let result = deploy(store.clone(), notifier.clone()).spin().await;

        let err = result.unwrap_err();
        assert!(err.is_data_shape(), "{}", err);
        assert_eq!(store.write_count(), 0);
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_subscriber_is_fatal() {
        let store = store(subscribers(&["a@x", "b@x", "a@x"]), history(&[]));
        let notifier = Arc::new(MockNotifier::default());

        let result = deploy(store.clone(), notifier).spin().await;
        assert_matches!(
            result,
            Err(CarouselError::Pairing(pairing_engine::PairingError::DuplicateSubscriber(_)))
        );
        assert_eq!(store.write_count(), 0);
    }

    #[tokio::test]
    async fn test_missing_subscribers_table_is_fatal() {
        let store = Arc::new(InMemoryTableStore::new());
        let notifier = Arc::new(MockNotifier::default());

        let result = deploy(store, notifier).spin().await;
        assert_matches!(result, Err(CarouselError::Storage(StorageError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_missing_history_starts_empty() {
        let store = Arc::new(
            InMemoryTableStore::new().with_table("subscribers", subscribers(&["a@x", "b@x"])),
        );
        let notifier = Arc::new(MockNotifier::default());

        let report = deploy(store.clone(), notifier).spin().await.unwrap();
        assert_eq!(report.ledger.inserted(), 2);
        assert_eq!(store.snapshot("history").await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_commit_sends_nothing() {
        let inner = InMemoryTableStore::new()
            .with_table("subscribers", subscribers(&["a@x", "b@x"]))
            .with_table("history", history(&[]));
        let store = Arc::new(ReadOnlyStore(inner));
        let notifier = Arc::new(MockNotifier::default());

        let result = Carousel::new(&config(), RunMode::Deploy, store, notifier.clone())
            .spin()
            .await;

        assert_matches!(result, Err(CarouselError::Storage(StorageError::Status { status: 403, .. })));
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_fail_run() {
        let store = store(subscribers(&["a@x", "b@x"]), history(&[]));
        let notifier = Arc::new(MockNotifier::failing_for("a@x"));

        let report = deploy(store.clone(), notifier.clone()).spin().await.unwrap();

        assert_eq!(report.notifications.sent, 1);
        assert_eq!(report.notifications.failed(), 1);
        assert_eq!(store.write_count(), 1);
    }

    #[tokio::test]
    async fn test_test_mode_uses_suffixed_tables_and_sends_nothing() {
        let store = Arc::new(
            InMemoryTableStore::new()
                .with_table("subscribers_TEST", subscribers(&["a@x", "b@x"]))
                .with_table("history_TEST", history(&[]))
                .with_table("history", history(&[])),
        );
        let notifier = Arc::new(MockNotifier::default());

        let carousel = Carousel::new(&config(), RunMode::Test, store.clone(), notifier.clone());
        assert_eq!(carousel.tables().history, "history_TEST");

        let report = carousel.spin().await.unwrap();
        assert_eq!(report.pair_count(), 1);
        assert_eq!(report.notifications.sent, 2);
        assert!(notifier.sent().is_empty());

        assert_eq!(store.snapshot("history_TEST").await.unwrap().len(), 2);
        assert!(store.snapshot("history").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_periodic_gate_uses_context_week() {
        let mut config = config();
        config.matching.periodic = true;

        let subs = table(
            &["name", "email", "interval"],
            &[
                &["A", "a@x", "1"],
                &["B", "b@x", "2"],
                &["C", "c@x", "1"],
            ],
        );
        let store = store(subs, history(&[]));
        let notifier = Arc::new(MockNotifier::default());

        let odd_week = Carousel::new(&config, RunMode::Deploy, store.clone(), notifier.clone())
            .with_context(RunContext { week: 11 })
            .spin()
            .await
            .unwrap();
        assert_eq!(odd_week.subscribers, 3);
        assert_eq!(odd_week.eligible, 2);
        assert!(odd_week.unmatched.is_empty());

        let even_week = Carousel::new(&config, RunMode::Deploy, store, notifier)
            .with_context(RunContext { week: 12 })
            .spin()
            .await
            .unwrap();
        assert_eq!(even_week.eligible, 3);
        assert_eq!(even_week.unmatched.len(), 1);
    }

    #[tokio::test]
    async fn test_exclusive_subscriber_needs_shared_day() {
        let mut config = config();
        config.matching.availability = true;

        let subs = table(
            &["name", "email", "days", "exclusive"],
            &[
                &["A", "a@x", "Mon", "yes"],
                &["B", "b@x", "Tue", "no"],
                &["C", "c@x", "Mon", "no"],
            ],
        );
        let store = store(subs, history(&[]));
        let notifier = Arc::new(MockNotifier::default());

        let report = Carousel::new(&config, RunMode::Deploy, store, notifier)
            .spin()
            .await
            .unwrap();

        assert_eq!(report.unmatched, vec![Email::new("b@x")]);
    }

    #[tokio::test]
    async fn test_build_notifier_by_mode() {
        let mut config = config();
        config.notifications.endpoint = "https://mail.example.com/send".to_string();

        assert!(build_notifier(&config, RunMode::Test).is_ok());
        assert!(build_notifier(&config, RunMode::Deploy).is_ok());

        config.notifications.endpoint = "${CAROUSEL_MAIL_ENDPOINT}".to_string();
        assert_matches!(
            build_notifier(&config, RunMode::Deploy).err(),
            Some(CarouselError::Notify(NotifyError::Config(_)))
        );
    }
}
