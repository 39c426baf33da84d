//! Property tests for the on-disk log.

use edgelog_core::{Config, ReplayMode};
use edgelog_testkit::prelude::*;
use proptest::prelude::*;

proptest! {
    #![proptest_config(PropTestConfig::quick().to_proptest_config())]

    #[test]
    fn sequence_is_dense_across_sessions(
        sessions in prop::collection::vec(statements_strategy(6), 1..4),
    ) {
        let temp = TempLog::new();
        let mut seqs = Vec::new();
        for statements in &sessions {
            let mut log = temp.open(RecordingExecutor::new());
            for sql in statements {
                seqs.push(log.execute(sql, Vec::new(), &mut |_| {}).unwrap());
            }
            log.close().unwrap();
        }

        let total = seqs.len() as u64;
        prop_assert_eq!(seqs, (0..total).collect::<Vec<_>>());
        let log = temp.open(RecordingExecutor::new());
        prop_assert_eq!(log.header().sequence, total);
        prop_assert_eq!(u64::from(log.header().entries), total);
    }

    #[test]
    fn replay_reproduces_every_statement(statements in statements_strategy(12)) {
        let temp = TempLog::new();
        let refs: Vec<&str> = statements.iter().map(String::as_str).collect();
        temp.populated(&refs).close().unwrap();

        let log = temp.open(RecordingExecutor::new());
        prop_assert_eq!(log.replayed(), statements.len());
        prop_assert_eq!(log.executor().patterns(), refs);
    }

    #[test]
    fn stored_events_match_executed_ones(events in prop::collection::vec(event_strategy(), 1..5)) {
        let temp = TempLog::new();
        let mut log = temp.open(RecordingExecutor::new());
        for event in &events {
            log.execute(&event.pattern, event.args.clone(), &mut |_| {}).unwrap();
        }

        let snapshot = log.read_entries().unwrap();
        let stored: Vec<_> = snapshot
            .entries
            .iter()
            .flat_map(|e| e.events.iter().cloned())
            .collect();
        prop_assert_eq!(&stored, &events);
        prop_assert_eq!(&log.executor().executed, &events);
        prop_assert!(snapshot.entries.iter().all(|e| e.client_id == temp.client_id()));
    }

    #[test]
    fn interrupted_append_is_never_counted(
        statements in statements_strategy(6),
        garbage in 1usize..300,
        partial in any::<bool>(),
    ) {
        let temp = TempLog::new();
        let refs: Vec<&str> = statements.iter().map(String::as_str).collect();
        temp.populated(&refs).close().unwrap();
        let clean_len = file_len(temp.path()).unwrap();

        if partial {
            let lost = local_entry("A", statements.len() as u64, "lost");
            simulate_crash(temp.path(), &lost, CrashPoint::DuringEntryWrite).unwrap();
        } else {
            append_garbage(temp.path(), garbage).unwrap();
        }

        let mut log = temp.open(RecordingExecutor::new());
        prop_assert_eq!(log.replayed(), statements.len());
        prop_assert_eq!(file_len(temp.path()).unwrap(), clean_len);
        let seq = log.execute("after", Vec::new(), &mut |_| {}).unwrap();
        prop_assert_eq!(seq, statements.len() as u64);
        log.close().unwrap();

        let log = temp.open(RecordingExecutor::new());
        prop_assert_eq!(log.replayed(), statements.len() + 1);
        prop_assert_eq!(log.executor().patterns().last().copied(), Some("after"));
    }
}

#[test]
fn replay_all_events_runs_every_event() {
    use edgelog_core::{Event, LogEntry};

    let temp = TempLog::new();
    let mut log = temp.open(RecordingExecutor::new());
    let mut entry = LogEntry::new("A")
        .with_event(Event::new("first"))
        .with_event(Event::new("second"));
    log.append(&mut entry).unwrap();
    log.close().unwrap();

    let log = temp.open_with(RecordingExecutor::new(), test_config());
    assert_eq!(log.executor().patterns(), vec!["first"]);
    log.close().unwrap();

    let config = Config::new()
        .sync_on_write(false)
        .replay(ReplayMode::AllEvents);
    let log = temp.open_with(RecordingExecutor::new(), config);
    assert_eq!(log.executor().patterns(), vec!["first", "second"]);
}

#[test]
fn rejected_statement_leaves_log_untouched() {
    let temp = TempLog::new();
    let mut log = temp.open(FailingExecutor::on_pattern("DROP"));
    log.execute("CREATE TABLE t (v)", Vec::new(), &mut |_| {}).unwrap();
    let before = file_len(temp.path()).unwrap();

    assert!(log.execute("DROP TABLE t", Vec::new(), &mut |_| {}).is_err());
    assert_eq!(file_len(temp.path()).unwrap(), before);
    assert_eq!(log.header().sequence, 1);

    let seq = log.execute("INSERT INTO t VALUES (1)", Vec::new(), &mut |_| {}).unwrap();
    assert_eq!(seq, 1);
}

#[test]
fn replay_failure_fails_open() {
    let temp = TempLog::new();
    temp.populated(&["a", "b", "c"]).close().unwrap();

    let result = edgelog_core::LocalLog::open(
        temp.path(),
        "A",
        FailingExecutor::on_call(2),
        test_config(),
    );
    assert!(matches!(result, Err(edgelog_core::CoreError::Executor(_))));

    // The lock was released with the failed session.
    let log = temp.open(RecordingExecutor::new());
    assert_eq!(log.replayed(), 3);
}
