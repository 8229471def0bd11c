//! Job logging facade.

use std::fmt;
use std::str::FromStr;

use tracing::{debug, error, info, warn};

/// Severity of a job log message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARNING"),
            LogLevel::Error => write!(f, "ERROR"),
            LogLevel::Critical => write!(f, "CRITICAL"),
        }
    }
}

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            "critical" | "fatal" => Ok(LogLevel::Critical),
            other => Err(format!("Unknown log level: {}", other)),
        }
    }
}

/// Named logger for one job.
///
/// Messages go through `tracing` with the job name as a structured field;
/// `Critical` is emitted at error level and tagged `critical = true`.
#[derive(Debug, Clone)]
pub struct JobLogger {
    name: String,
}

impl JobLogger {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn log(&self, message: &str, level: LogLevel) {
        let job = self.name.as_str();
        match level {
            LogLevel::Debug => debug!(job, "{}", message),
            LogLevel::Info => info!(job, "{}", message),
            LogLevel::Warning => warn!(job, "{}", message),
            LogLevel::Error => error!(job, "{}", message),
            LogLevel::Critical => error!(job, critical = true, "{}", message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::io::Write;
    use std::sync::Arc;
    use tracing_subscriber::fmt::MakeWriter;

    #[derive(Clone, Default)]
    struct Buffer(Arc<Mutex<Vec<u8>>>);

    impl Buffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock()).into_owned()
        }
    }

    impl Write for Buffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for Buffer {
        type Writer = Buffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn capture<F: FnOnce()>(f: F) -> String {
        let buffer = Buffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(buffer.clone())
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .finish();
        tracing::subscriber::with_default(subscriber, f);
        buffer.contents()
    }

    #[test]
    fn test_level_parse() {
        assert_eq!("INFO".parse::<LogLevel>().unwrap(), LogLevel::Info);
        assert_eq!("warn".parse::<LogLevel>().unwrap(), LogLevel::Warning);
        assert_eq!("Critical".parse::<LogLevel>().unwrap(), LogLevel::Critical);
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_level_order() {
        assert!(LogLevel::Debug < LogLevel::Info);
        assert!(LogLevel::Error < LogLevel::Critical);
        assert_eq!(LogLevel::Warning.to_string(), "WARNING");
    }

    #[test]
    fn test_info_written_with_job_field() {
        let logger = JobLogger::new("t1");
        let out = capture(|| logger.log("Running bash task", LogLevel::Info));
        assert!(out.contains("Running bash task"));
        assert!(out.contains("job=\"t1\""));
        assert!(out.contains("INFO"));
    }

    #[test]
    fn test_debug_filtered_at_info() {
        let logger = JobLogger::new("t1");
        let out = capture(|| logger.log("noisy detail", LogLevel::Debug));
        assert!(out.is_empty());
    }

    #[test]
    fn test_critical_tagged() {
        let logger = JobLogger::new("t1");
        let out = capture(|| logger.log("disk gone", LogLevel::Critical));
        assert!(out.contains("ERROR"));
        assert!(out.contains("critical=true"));
    }
}
