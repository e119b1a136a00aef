//! Known shapes of mongod log lines.
//!
//! Matching is done against the lower-cased line. The wording is tied to the
//! mongod releases we have seen; newer releases log structured JSON where the
//! readiness line looks like `"msg":"waiting for connections","attr":{"port":27017`,
//! which the ready pattern also accepts.

use super::{StartupFailure, StartupOutcome};
use regex::Regex;
use std::sync::OnceLock;

static READY_REGEX: OnceLock<Regex> = OnceLock::new();
static FAILURE_PATTERNS: OnceLock<Vec<(Regex, StartupFailure)>> = OnceLock::new();

fn ready_regex() -> &'static Regex {
    READY_REGEX.get_or_init(|| {
        Regex::new(r#"waiting for connections.*port(\s|":)(\d+)"#)
            .expect("static regex pattern is valid")
    })
}

/// Failure patterns in priority order.
fn failure_patterns() -> &'static [(Regex, StartupFailure)] {
    FAILURE_PATTERNS.get_or_init(|| {
        [
            ("addr already in use", StartupFailure::AddressInUse),
            ("mongod already running", StartupFailure::AlreadyRunning),
            ("mongod permission denied", StartupFailure::PermissionDenied),
            ("data directory .*? not found", StartupFailure::DataDirectoryNotFound),
            ("shutting down with code", StartupFailure::ShuttingDown),
        ]
        .into_iter()
        .map(|(pattern, failure)| {
            (
                Regex::new(pattern).expect("static regex pattern is valid"),
                failure,
            )
        })
        .collect()
    })
}

/// Classify a single line of mongod stdout.
///
/// Returns `None` for lines that say nothing about startup. The readiness
/// pattern is checked first, then the failure patterns in a fixed order.
pub fn classify_line(line: &str) -> Option<StartupOutcome> {
    let lowered = line.to_lowercase();

    if let Some(captures) = ready_regex().captures(&lowered) {
        let outcome = match captures[2].parse::<u16>() {
            Ok(port) => StartupOutcome::Ready { port },
            Err(_) => StartupOutcome::Failed(StartupFailure::UnparseablePort { line: lowered }),
        };
        return Some(outcome);
    }

    failure_patterns()
        .iter()
        .find(|(regex, _)| regex.is_match(&lowered))
        .map(|(_, failure)| StartupOutcome::Failed(failure.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_ready_legacy_text_format() {
        let line = "2019-02-13T11:35:58.915-0800 I NETWORK  [initandlisten] waiting for connections on port 27018";
        assert_eq!(
            classify_line(line),
            Some(StartupOutcome::Ready { port: 27018 })
        );
    }

    #[test]
    fn test_ready_json_format() {
        let line = r#"{"t":{"$date":"2023-01-01T00:00:00.000+00:00"},"s":"I","c":"NETWORK","id":23016,"ctx":"listener","msg":"Waiting for connections","attr":{"port":40123,"ssl":"off"}}"#;
        assert_eq!(
            classify_line(line),
            Some(StartupOutcome::Ready { port: 40123 })
        );
    }

    #[test]
    fn test_ready_with_overflowing_port() {
        let line = "waiting for connections on port 99999";
        match classify_line(line) {
            Some(StartupOutcome::Failed(StartupFailure::UnparseablePort { line })) => {
                assert!(line.contains("99999"));
            }
            other => panic!("expected unparseable port, got {:?}", other),
        }
    }

    #[test]
    fn test_failure_patterns() {
        let cases = [
            ("listen(): bind() failed errno:98 Addr already in use for socket", StartupFailure::AddressInUse),
            ("ERROR: mongod already running", StartupFailure::AlreadyRunning),
            ("mongod permission denied on /data", StartupFailure::PermissionDenied),
            ("Data directory /tmp/nope not found., terminating", StartupFailure::DataDirectoryNotFound),
            ("shutting down with code:100", StartupFailure::ShuttingDown),
        ];
        for (line, expected) in cases {
            assert_eq!(
                classify_line(line),
                Some(StartupOutcome::Failed(expected)),
                "line: {}",
                line
            );
        }
    }

    #[test]
    fn test_ready_wins_over_failure_in_same_line() {
        let line = "waiting for connections on port 1234 (shutting down with code 0 later)";
        assert_eq!(classify_line(line), Some(StartupOutcome::Ready { port: 1234 }));
    }

    #[test]
    fn test_unrelated_line() {
        assert_eq!(classify_line("build info: version 6.0.4"), None);
        assert_eq!(classify_line(""), None);
    }

    proptest! {
        #[test]
        fn any_valid_port_round_trips(port in 1u16..=u16::MAX) {
            let line = format!("[initandlisten] Waiting For Connections on PORT {}", port);
            prop_assert_eq!(classify_line(&line), Some(StartupOutcome::Ready { port }));
        }

        #[test]
        fn arbitrary_text_never_panics(line in ".*") {
            let _ = classify_line(&line);
        }
    }
}
