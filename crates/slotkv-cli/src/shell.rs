//! Line-oriented command language for driving a store.
//!
//! ```text
//! put <key> <value>   # value is JSON if it parses, else a string
//! get <key>
//! stats
//! persist
//! ```
//!
//! Blank lines and lines starting with `#` are ignored.

use std::fmt;
use std::io::{BufRead, Write};

use serde_json::Value;
use slotkv_store::{ConcurrentStore, FlushOutcome, Lookup, StoreError};

/// A parsed shell command.
#[derive(Clone, Debug, PartialEq)]
pub enum ShellCommand {
    Put { key: String, value: Value },
    Get { key: String },
    Stats,
    Persist,
}

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("unknown command: {0}")]
    UnknownCommand(String),
    #[error("usage: {0}")]
    Usage(&'static str),
}

/// Parse one input line. Returns `Ok(None)` for blank and comment lines.
pub fn parse_line(line: &str) -> Result<Option<ShellCommand>, ParseError> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let (verb, rest) = split_word(line);
    let cmd = match verb {
        "put" => {
            let (key, raw) = split_word(rest);
            if key.is_empty() || raw.is_empty() {
                return Err(ParseError::Usage("put <key> <value>"));
            }
            let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
            ShellCommand::Put { key: key.to_string(), value }
        }
        "get" => {
            let (key, extra) = split_word(rest);
            if key.is_empty() || !extra.is_empty() {
                return Err(ParseError::Usage("get <key>"));
            }
            ShellCommand::Get { key: key.to_string() }
        }
        "stats" => ShellCommand::Stats,
        "persist" => ShellCommand::Persist,
        other => return Err(ParseError::UnknownCommand(other.to_string())),
    };
    Ok(Some(cmd))
}

fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(i) => (&s[..i], s[i..].trim()),
        None => (s, ""),
    }
}

/// Outcome of executing one command.
#[derive(Debug)]
pub enum Reply {
    Stored { index: usize, flush: FlushOutcome },
    Value(Value),
    Empty { index: usize },
    Mismatch { index: usize, actual_key: String },
    Stats { capacity: usize, occupied: usize, load_factor: f64 },
    Persisted { bytes: usize },
    Error(String),
}

impl Reply {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::Error(_))
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Stored { index, flush } => {
                write!(f, "OK slot {index}")?;
                match flush {
                    FlushOutcome::Skipped => Ok(()),
                    FlushOutcome::Written { bytes } => write!(f, " (snapshot {bytes} bytes)"),
                    FlushOutcome::Failed(e) => write!(f, " (snapshot failed: {e})"),
                }
            }
            Self::Value(v) => write!(f, "{v}"),
            Self::Empty { index } => write!(f, "(empty slot {index})"),
            Self::Mismatch { index, actual_key } => {
                write!(f, "(slot {index} holds key {actual_key:?})")
            }
            Self::Stats { capacity, occupied, load_factor } => write!(
                f,
                "capacity {capacity}, occupied {occupied}, load factor {load_factor:.3}"
            ),
            Self::Persisted { bytes } => write!(f, "persisted {bytes} bytes"),
            Self::Error(msg) => write!(f, "ERR {msg}"),
        }
    }
}

/// Execute a command. Store errors become [`Reply::Error`] so a session can
/// carry on after a collision or failed flush.
pub fn execute(store: &ConcurrentStore<Value>, cmd: ShellCommand) -> Reply {
    let result = match cmd {
        ShellCommand::Put { key, value } => store
            .put(key, value)
            .map(|r| Reply::Stored { index: r.index, flush: r.flush }),
        ShellCommand::Get { key } => store.get(&key).map(|lookup| match lookup {
            Lookup::Found(v) => Reply::Value(v),
            Lookup::EmptySlot { index } => Reply::Empty { index },
            Lookup::KeyMismatch { index, actual_key } => Reply::Mismatch { index, actual_key },
        }),
        ShellCommand::Stats => store.len().and_then(|occupied| {
            Ok(Reply::Stats {
                capacity: store.capacity(),
                occupied,
                load_factor: store.load_factor()?,
            })
        }),
        ShellCommand::Persist => store.persist().map(|bytes| Reply::Persisted { bytes }),
    };
    result.unwrap_or_else(|e: StoreError| Reply::Error(e.to_string()))
}

/// Counters for a finished session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub commands: usize,
    pub errors: usize,
}

/// Run every command from `input`, writing one reply line per command to
/// `output`. `render` formats each reply (e.g. to add color).
pub fn run_session<R, W, F>(
    store: &ConcurrentStore<Value>,
    input: R,
    mut output: W,
    render: F,
) -> std::io::Result<SessionSummary>
where
    R: BufRead,
    W: Write,
    F: Fn(&Reply) -> String,
{
    let mut summary = SessionSummary::default();
    for (lineno, line) in input.lines().enumerate() {
        let line = line?;
        let reply = match parse_line(&line) {
            Ok(None) => continue,
            Ok(Some(cmd)) => {
                tracing::debug!(line = lineno + 1, ?cmd, "executing");
                execute(store, cmd)
            }
            Err(e) => Reply::Error(format!("line {}: {e}", lineno + 1)),
        };
        summary.commands += 1;
        if reply.is_error() {
            summary.errors += 1;
        }
        writeln!(output, "{}", render(&reply))?;
    }
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use slotkv_store::policy::Never;
    use slotkv_store::MemorySink;

    fn store() -> ConcurrentStore<Value> {
        ConcurrentStore::with_sink(1000, Never, MemorySink::new()).unwrap()
    }

    #[test]
    fn parse_put_json_value() {
        assert_eq!(
            parse_line("put a {\"n\": 1}").unwrap(),
            Some(ShellCommand::Put { key: "a".into(), value: json!({"n": 1}) })
        );
    }

    #[test]
    fn parse_put_plain_text_value() {
        assert_eq!(
            parse_line("  put greeting hello world ").unwrap(),
            Some(ShellCommand::Put { key: "greeting".into(), value: json!("hello world") })
        );
    }

    #[test]
    fn parse_skips_blank_and_comments() {
        assert_eq!(parse_line("").unwrap(), None);
        assert_eq!(parse_line("   ").unwrap(), None);
        assert_eq!(parse_line("# note").unwrap(), None);
    }

    #[test]
    fn parse_errors() {
        assert_eq!(parse_line("put a"), Err(ParseError::Usage("put <key> <value>")));
        assert_eq!(parse_line("get"), Err(ParseError::Usage("get <key>")));
        assert_eq!(parse_line("get a b"), Err(ParseError::Usage("get <key>")));
        assert_eq!(parse_line("del a"), Err(ParseError::UnknownCommand("del".into())));
    }

    #[test]
    fn execute_reports_each_lookup_outcome() {
        let s = store();
        assert!(matches!(
            execute(&s, ShellCommand::Put { key: "Aa".into(), value: json!(1) }),
            Reply::Stored { index: 112, .. }
        ));
        assert!(matches!(
            execute(&s, ShellCommand::Get { key: "Aa".into() }),
            Reply::Value(v) if v == json!(1)
        ));
        assert!(matches!(
            execute(&s, ShellCommand::Get { key: "BB".into() }),
            Reply::Mismatch { index: 112, .. }
        ));
        assert!(matches!(
            execute(&s, ShellCommand::Get { key: "a".into() }),
            Reply::Empty { index: 97 }
        ));
    }

    #[test]
    fn collision_is_an_error_reply() {
        let s = store();
        execute(&s, ShellCommand::Put { key: "a".into(), value: json!(1) });
        let reply = execute(&s, ShellCommand::Put { key: "a".into(), value: json!(2) });
        assert!(reply.is_error());
        assert!(reply.to_string().contains("collision at index 97"));
    }

    #[test]
    fn session_continues_after_errors() {
        let s = store();
        let script = "put a 1\nput a 2\nbogus\n\n# done\nget a\nstats\n";
        let mut out = Vec::new();
        let summary = run_session(&s, script.as_bytes(), &mut out, |r| r.to_string()).unwrap();

        assert_eq!(summary, SessionSummary { commands: 5, errors: 2 });
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "OK slot 97");
        assert!(lines[1].starts_with("ERR collision"));
        assert_eq!(lines[2], "ERR line 3: unknown command: bogus");
        assert_eq!(lines[3], "1");
        assert_eq!(lines[4], "capacity 1000, occupied 1, load factor 0.001");
    }

    #[test]
    fn stats_reports_counters() {
        let s = store();
        execute(&s, ShellCommand::Put { key: "a".into(), value: json!(1) });
        execute(&s, ShellCommand::Put { key: "b".into(), value: json!(2) });
        match execute(&s, ShellCommand::Stats) {
            Reply::Stats { capacity, occupied, load_factor } => {
                assert_eq!(capacity, 1000);
                assert_eq!(occupied, 2);
                assert!((load_factor - 0.002).abs() < f64::EPSILON);
            }
            other => panic!("expected stats, got {other:?}"),
        }
    }

    #[test]
    fn persist_command_writes_snapshot() {
        let sink = std::sync::Arc::new(MemorySink::new());
        let s: ConcurrentStore<Value> =
            ConcurrentStore::with_sink(4, Never, std::sync::Arc::clone(&sink)).unwrap();
        let reply = execute(&s, ShellCommand::Persist);
        assert!(matches!(reply, Reply::Persisted { .. }));
        assert_eq!(sink.writes(), 1);
    }
}
