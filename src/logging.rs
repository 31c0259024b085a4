use log::{info, warn, error, debug, trace};
use std::time::{Duration, Instant};
use std::sync::{Arc, Mutex};
use std::collections::VecDeque;
use chrono::{DateTime, Utc};

/// Stream orchestration event for logging and debugging
#[derive(Debug, Clone)]
pub struct StreamEvent {
    pub timestamp: DateTime<Utc>,
    pub event_type: StreamEventType,
    pub duration: Option<Duration>,
    pub details: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamEventType {
    LoadRequested,
    HandoverInitiated,
    HandoverReady,
    HandoverSwapped,
    LoopSwapDeferred,
    StartSeekIssued,
    StartSeekDropped,
    PlaybackError,
    BlackFrame,
    PreviewShown,
    PreviewHidden,
    BufferReallocated,
    BufferRebased,
    BufferOverrun,
    PerformanceWarning,
}

impl StreamEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamEventType::LoadRequested => "LOAD_REQUESTED",
            StreamEventType::HandoverInitiated => "HANDOVER_INITIATED",
            StreamEventType::HandoverReady => "HANDOVER_READY",
            StreamEventType::HandoverSwapped => "HANDOVER_SWAPPED",
            StreamEventType::LoopSwapDeferred => "LOOP_SWAP_DEFERRED",
            StreamEventType::StartSeekIssued => "START_SEEK_ISSUED",
            StreamEventType::StartSeekDropped => "START_SEEK_DROPPED",
            StreamEventType::PlaybackError => "PLAYBACK_ERROR",
            StreamEventType::BlackFrame => "BLACK_FRAME",
            StreamEventType::PreviewShown => "PREVIEW_SHOWN",
            StreamEventType::PreviewHidden => "PREVIEW_HIDDEN",
            StreamEventType::BufferReallocated => "BUFFER_REALLOCATED",
            StreamEventType::BufferRebased => "BUFFER_REBASED",
            StreamEventType::BufferOverrun => "BUFFER_OVERRUN",
            StreamEventType::PerformanceWarning => "PERFORMANCE_WARNING",
        }
    }
}

/// Logger for orchestration events, with a bounded in-memory history
#[derive(Clone)]
pub struct StreamLogger {
    events: Arc<Mutex<VecDeque<StreamEvent>>>,
    max_events: usize,
}

impl Default for StreamLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl StreamLogger {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(VecDeque::new())),
            max_events: 1000,
        }
    }

    /// Initialize logging from HANDOVER_LOG_LEVEL (default info)
    pub fn init() -> Result<(), Box<dyn std::error::Error>> {
        let log_level = std::env::var("HANDOVER_LOG_LEVEL")
            .unwrap_or_else(|_| "info".to_string());

        let mut builder = env_logger::Builder::new();

        builder.format(|buf, record| {
            use std::io::Write;
            writeln!(
                buf,
                "{} [{}] [{}:{}] {}",
                chrono::Utc::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        });

        builder.filter_level(Self::parse_level(&log_level));
        builder.try_init()?;

        info!("Handover player logging initialized with level: {}", log_level);
        Ok(())
    }

    fn parse_level(level: &str) -> log::LevelFilter {
        match level.to_lowercase().as_str() {
            "trace" => log::LevelFilter::Trace,
            "debug" => log::LevelFilter::Debug,
            "warn" => log::LevelFilter::Warn,
            "error" => log::LevelFilter::Error,
            "off" => log::LevelFilter::Off,
            _ => log::LevelFilter::Info,
        }
    }

    pub fn log_event(&self, event_type: StreamEventType, details: String, duration: Option<Duration>) {
        match event_type {
            StreamEventType::LoadRequested
            | StreamEventType::HandoverInitiated
            | StreamEventType::HandoverReady
            | StreamEventType::PreviewShown
            | StreamEventType::PreviewHidden
            | StreamEventType::BufferReallocated => {
                info!("[{}] {}", event_type.as_str(), details);
            }
            StreamEventType::HandoverSwapped => {
                info!("[{}] {} (took: {:?})", event_type.as_str(), details, duration);
            }
            StreamEventType::StartSeekIssued
            | StreamEventType::LoopSwapDeferred
            | StreamEventType::BlackFrame
            | StreamEventType::BufferRebased => {
                debug!("[{}] {}", event_type.as_str(), details);
            }
            StreamEventType::StartSeekDropped | StreamEventType::BufferOverrun => {
                warn!("[{}] {}", event_type.as_str(), details);
            }
            StreamEventType::PerformanceWarning => {
                warn!("[{}] {} (duration: {:?})", event_type.as_str(), details, duration);
            }
            StreamEventType::PlaybackError => {
                error!("[{}] {}", event_type.as_str(), details);
            }
        }

        let event = StreamEvent {
            timestamp: Utc::now(),
            event_type,
            duration,
            details,
        };

        let mut events = self.events.lock().unwrap();
        events.push_back(event);
        while events.len() > self.max_events {
            events.pop_front();
        }
    }

    pub fn log_load_requested(&self, url: &str, dual_start: bool) {
        let details = if url.is_empty() {
            "Empty URL requested, stopping both slots".to_string()
        } else if dual_start {
            format!("Loading '{}' on both slots", url)
        } else {
            format!("Prebuffering '{}' on the handover slot", url)
        };
        self.log_event(StreamEventType::LoadRequested, details, None);
    }

    pub fn log_handover_initiated(&self, url: &str) {
        self.log_event(
            StreamEventType::HandoverInitiated,
            format!("Handover prebuffering '{}'", url),
            None,
        );
    }

    pub fn log_handover_ready(&self, url: &str, buffer_level: f32) {
        self.log_event(
            StreamEventType::HandoverReady,
            format!("Handover '{}' ready at {:.1}% buffered", url, buffer_level),
            None,
        );
    }

    pub fn log_swap(&self, from_url: &str, to_url: &str, reason: &str, took: Duration) {
        self.log_event(
            StreamEventType::HandoverSwapped,
            format!("Swapped '{}' -> '{}' ({})", from_url, to_url, reason),
            Some(took),
        );
    }

    pub fn log_start_seek(&self, slot: &str, start_ms: i64) {
        self.log_event(
            StreamEventType::StartSeekIssued,
            format!("{} slot seeking to start time {}ms", slot, start_ms),
            None,
        );
    }

    pub fn log_start_seek_dropped(&self, slot: &str, error: &crate::error::PlaybackError) {
        self.log_event(
            StreamEventType::StartSeekDropped,
            format!("{} slot: {}", slot, error),
            None,
        );
    }

    pub fn log_playback_error(&self, error: &crate::error::PlaybackError) {
        self.log_event(StreamEventType::PlaybackError, error.to_string(), None);
    }

    pub fn log_performance_warning(&self, operation: &str, duration: Duration, threshold: Duration) {
        self.log_event(
            StreamEventType::PerformanceWarning,
            format!("{} took {}us (threshold: {}us)",
                operation, duration.as_micros(), threshold.as_micros()),
            Some(duration),
        );
    }

    /// Get recent events for debugging
    pub fn get_recent_events(&self, count: usize) -> Vec<StreamEvent> {
        let events = self.events.lock().unwrap();
        let skip = events.len().saturating_sub(count);
        events.iter().skip(skip).cloned().collect()
    }

    pub fn clear_events(&self) {
        self.events.lock().unwrap().clear();
    }

    pub fn get_event_statistics(&self) -> EventStatistics {
        let events = self.events.lock().unwrap();
        let mut stats = EventStatistics::new();

        for event in events.iter() {
            match event.event_type {
                StreamEventType::HandoverSwapped => stats.swaps += 1,
                StreamEventType::LoopSwapDeferred => stats.deferred_loops += 1,
                StreamEventType::StartSeekDropped => stats.dropped_seeks += 1,
                StreamEventType::PlaybackError => stats.playback_errors += 1,
                StreamEventType::BufferOverrun => stats.buffer_overruns += 1,
                _ => {}
            }
        }

        stats.total_events = events.len();
        stats
    }
}

/// Statistics about logged events
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventStatistics {
    pub total_events: usize,
    pub swaps: usize,
    pub deferred_loops: usize,
    pub dropped_seeks: usize,
    pub playback_errors: usize,
    pub buffer_overruns: usize,
}

impl EventStatistics {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Timer utility for measuring operation durations
pub struct OperationTimer {
    start_time: Instant,
    operation_name: String,
}

impl OperationTimer {
    pub fn new(operation_name: String) -> Self {
        trace!("Starting operation: {}", operation_name);
        Self {
            start_time: Instant::now(),
            operation_name,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn finish(self) -> Duration {
        let duration = self.elapsed();
        trace!("Completed operation '{}' in {}us", self.operation_name, duration.as_micros());
        duration
    }

    pub fn finish_with_threshold(self, threshold: Duration) -> Duration {
        let duration = self.elapsed();
        if duration > threshold {
            warn!("Operation '{}' took {}us (threshold: {}us)",
                self.operation_name, duration.as_micros(), threshold.as_micros());
        } else {
            debug!("Completed operation '{}' in {}us", self.operation_name, duration.as_micros());
        }
        duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PlaybackError;
    use std::thread;

    #[test]
    fn test_stream_logger_creation() {
        let logger = StreamLogger::new();
        assert_eq!(logger.max_events, 1000);
        assert!(logger.get_recent_events(10).is_empty());
    }

    #[test]
    fn test_log_event() {
        let logger = StreamLogger::new();
        logger.log_event(StreamEventType::HandoverReady, "ready".to_string(), None);

        let events = logger.get_recent_events(1);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].details, "ready");
        assert_eq!(events[0].event_type, StreamEventType::HandoverReady);
    }

    #[test]
    fn test_event_history_limit() {
        let mut logger = StreamLogger::new();
        logger.max_events = 3;

        for i in 0..5 {
            logger.log_event(StreamEventType::LoadRequested, format!("Event {}", i), None);
        }

        let events = logger.get_recent_events(10);
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].details, "Event 2");
        assert_eq!(events[2].details, "Event 4");
    }

    #[test]
    fn test_recent_events_keep_order() {
        let logger = StreamLogger::new();
        for i in 0..4 {
            logger.log_event(StreamEventType::BlackFrame, format!("{}", i), None);
        }
        let details: Vec<_> = logger.get_recent_events(2).into_iter().map(|e| e.details).collect();
        assert_eq!(details, vec!["2", "3"]);
    }

    #[test]
    fn test_event_statistics() {
        let logger = StreamLogger::new();

        logger.log_swap("a", "b", "handover", Duration::from_micros(20));
        logger.log_swap("b", "b", "loop", Duration::from_micros(20));
        logger.log_start_seek_dropped(
            "Active",
            &PlaybackError::SeekOutOfRange { start_ms: 5000, duration_ms: 1000 },
        );
        logger.log_event(StreamEventType::LoopSwapDeferred, "waiting".to_string(), None);

        let stats = logger.get_event_statistics();
        assert_eq!(stats.total_events, 4);
        assert_eq!(stats.swaps, 2);
        assert_eq!(stats.dropped_seeks, 1);
        assert_eq!(stats.deferred_loops, 1);
        assert_eq!(stats.playback_errors, 0);
    }

    #[test]
    fn test_operation_timer() {
        let timer = OperationTimer::new("test_operation".to_string());
        thread::sleep(Duration::from_millis(10));
        assert!(timer.finish() >= Duration::from_millis(10));

        let timer = OperationTimer::new("fast".to_string());
        assert!(timer.finish_with_threshold(Duration::from_secs(10)) < Duration::from_secs(10));
    }

    #[test]
    fn test_clear_events() {
        let logger = StreamLogger::new();
        logger.log_load_requested("a.mp4", true);
        assert_eq!(logger.get_recent_events(10).len(), 1);

        logger.clear_events();
        assert!(logger.get_recent_events(10).is_empty());
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(StreamLogger::parse_level("DEBUG"), log::LevelFilter::Debug);
        assert_eq!(StreamLogger::parse_level("bogus"), log::LevelFilter::Info);
        assert_eq!(StreamLogger::parse_level("off"), log::LevelFilter::Off);
    }

    #[test]
    fn test_specific_log_methods() {
        let logger = StreamLogger::new();

        logger.log_load_requested("", false);
        logger.log_handover_initiated("b.mp4");
        logger.log_handover_ready("b.mp4", 92.0);
        logger.log_start_seek("Handover", 1500);
        logger.log_playback_error(&PlaybackError::Transport {
            url: "b.mp4".to_string(),
            message: "404".to_string(),
        });
        logger.log_performance_warning("swap", Duration::from_millis(9), Duration::from_millis(5));

        let kinds: Vec<_> = logger
            .get_recent_events(10)
            .iter()
            .map(|e| e.event_type.as_str())
            .collect();
        assert_eq!(
            kinds,
            vec![
                "LOAD_REQUESTED",
                "HANDOVER_INITIATED",
                "HANDOVER_READY",
                "START_SEEK_ISSUED",
                "PLAYBACK_ERROR",
                "PERFORMANCE_WARNING",
            ]
        );
    }
}
