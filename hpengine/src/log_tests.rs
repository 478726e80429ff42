use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
use std::sync::Mutex;
use std::thread;

const ALL: [LogSeverity; 5] = [
    LogSeverity::Trace,
    LogSeverity::Debug,
    LogSeverity::Info,
    LogSeverity::Warn,
    LogSeverity::Error,
];

// ============================================================================
// LogSeverity
// ============================================================================

#[test]
fn test_rank_round_trips_and_follows_ordering() {
    for pair in ALL.windows(2) {
        assert!(pair[0] < pair[1]);
        assert!(pair[0].rank() < pair[1].rank());
    }
    for severity in ALL {
        assert_eq!(LogSeverity::from_rank(severity.rank()), severity);
    }
    assert_eq!(LogSeverity::from_rank(200), LogSeverity::Error);
}

#[test]
fn test_labels_share_one_width() {
    assert!(ALL.iter().all(|severity| severity.label().len() == 5));
    assert_eq!(LogSeverity::Warn.label().trim_end(), "WARN");
}

// ============================================================================
// LogEntry
// ============================================================================

#[test]
fn test_entry_records_named_thread() {
    let entry = thread::Builder::new()
        .name("render".to_string())
        .spawn(|| LogEntry::new(LogSeverity::Debug, "hpengine::RenderLoop", "frame".to_string()))
        .unwrap()
        .join()
        .unwrap();

    assert_eq!(entry.thread.as_deref(), Some("render"));
    assert_eq!(entry.location(), None);
}

#[test]
fn test_entry_at_sets_location() {
    let entry = LogEntry::new(LogSeverity::Error, "hpengine::CommandQueue", "failed".to_string())
        .at("command_queue.rs", 42);

    assert_eq!(entry.file, Some("command_queue.rs"));
    assert_eq!(entry.line, Some(42));
    assert_eq!(entry.location().as_deref(), Some("command_queue.rs:42"));
}

// ============================================================================
// DefaultLogger
// ============================================================================

#[test]
fn test_format_line_layout() {
    let mut entry = LogEntry::new(LogSeverity::Warn, "hpengine::Octree", "clamped".to_string())
        .at("octree.rs", 7);
    entry.thread = Some("sim".to_string());

    let line = DefaultLogger::format_line(&entry);

    assert!(line.starts_with('['));
    assert!(line.ends_with("[WARN ] [sim] [hpengine::Octree] clamped (octree.rs:7)"), "{}", line);
}

#[test]
fn test_format_line_omits_unknown_parts() {
    let mut entry = LogEntry::new(LogSeverity::Info, "hpengine::Simulation", "tick".to_string());
    entry.thread = None;

    let line = DefaultLogger::format_line(&entry);

    assert!(line.ends_with("[INFO ] [hpengine::Simulation] tick"), "{}", line);
}

#[test]
fn test_default_logger_accepts_every_severity() {
    for severity in ALL {
        DefaultLogger.log(&LogEntry::new(severity, "log_tests", "plain".to_string()));
        DefaultLogger.log(&LogEntry::new(severity, "log_tests", "located".to_string()).at("log_tests.rs", 1));
    }
}

// ============================================================================
// Logger
// ============================================================================

struct CollectingLogger(Mutex<Vec<String>>);

impl Logger for CollectingLogger {
    fn log(&self, entry: &LogEntry) {
        self.0.lock().unwrap().push(entry.message.clone());
    }
}

#[test]
fn test_logger_shared_across_threads() {
    let logger = std::sync::Arc::new(CollectingLogger(Mutex::new(Vec::new())));
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let logger = std::sync::Arc::clone(&logger);
            thread::spawn(move || {
                logger.log(&LogEntry::new(LogSeverity::Info, "log_tests", format!("t{}", i)));
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let mut messages = logger.0.lock().unwrap().clone();
    messages.sort();
    assert_eq!(messages, ["t0", "t1", "t2", "t3"]);
}
