//! JSON log output through the installed subscriber.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use geochem_cli::config_store::load_config;
use geochem_cli::logging::{LogConfig, LogFormat, init_logging_with_writer};
use tempfile::TempDir;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::MakeWriter;

#[derive(Clone, Default)]
struct Capture(Arc<Mutex<Vec<u8>>>);

impl Capture {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for Capture {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for Capture {
    type Writer = Capture;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

#[test]
fn json_format_emits_structured_events() {
    let capture = Capture::default();
    let mut config = LogConfig::default()
        .with_level(LevelFilter::INFO)
        .with_format(LogFormat::Json)
        .with_ansi(false);
    config.use_env_filter = false;
    init_logging_with_writer(&config, capture.clone());

    let dir = TempDir::new().unwrap();
    load_config(&dir.path().join("config.toml")).unwrap();

    let events: Vec<serde_json::Value> = capture
        .contents()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    let event = events
        .iter()
        .find(|event| {
            event["fields"]["message"] == "no configuration file found, using defaults"
        })
        .expect("config event logged");
    assert_eq!(event["level"], "INFO");
    assert!(event["fields"]["path"].as_str().unwrap().ends_with("config.toml"));
}
