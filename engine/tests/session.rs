use std::io::{self, BufReader, Read, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{unbounded, Receiver, Sender};
use engine::{
    EngineError, EngineListener, EngineSession, EngineSettings, SearchLine, SessionState,
    Transport,
};

/// Answers one line written by the session. `None` closes the engine's output.
type Responder = Box<dyn FnMut(&str) -> Option<Vec<String>> + Send>;

struct FakeInput {
    pending: Vec<u8>,
    written: Arc<Mutex<Vec<String>>>,
    output: Option<Sender<String>>,
    responder: Responder,
}

impl Write for FakeInput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);
        while let Some(end) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=end).collect();
            let line = String::from_utf8_lossy(&line).trim().to_string();
            self.written.lock().unwrap().push(line.clone());

            if line == "quit" {
                self.output = None;
                continue;
            }
            match (self.responder)(&line) {
                Some(replies) => {
                    if let Some(output) = &self.output {
                        for reply in replies {
                            let _ = output.send(reply);
                        }
                    }
                }
                None => self.output = None,
            }
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

struct FakeOutput {
    lines: Receiver<String>,
    buffer: Vec<u8>,
    position: usize,
}

impl Read for FakeOutput {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.position >= self.buffer.len() {
            match self.lines.recv() {
                Ok(line) => {
                    self.buffer = format!("{}\n", line).into_bytes();
                    self.position = 0;
                }
                Err(_) => return Ok(0),
            }
        }
        let n = buf.len().min(self.buffer.len() - self.position);
        buf[..n].copy_from_slice(&self.buffer[self.position..self.position + n]);
        self.position += n;
        Ok(n)
    }
}

fn fake_engine(responder: Responder) -> (Transport, Arc<Mutex<Vec<String>>>) {
    let (tx, rx) = unbounded();
    let written = Arc::new(Mutex::new(Vec::new()));
    let input = FakeInput {
        pending: Vec::new(),
        written: Arc::clone(&written),
        output: Some(tx),
        responder,
    };
    let output = FakeOutput {
        lines: rx,
        buffer: Vec::new(),
        position: 0,
    };
    (
        Transport::from_streams(input, BufReader::new(output)),
        written,
    )
}

/// Handshakes like a real engine and answers every `go` with `bestmove e7e5`.
fn responsive(line: &str) -> Option<Vec<String>> {
    let replies = if line == "uci" {
        vec![
            "id name Fake".to_string(),
            "option name UCI_Variant type combo default chess var chess var xiangqi".to_string(),
            "option name UCI_Elo type spin default 1350 min 500 max 2850".to_string(),
            "option name MultiPV type spin default 1 min 1 max 5".to_string(),
            "uciok".to_string(),
        ]
    } else if line.starts_with("go") {
        vec![
            "info depth 1 score cp 15 pv e7e5".to_string(),
            "info depth 2 score cp 20 pv e7e5 e2e6".to_string(),
            "bestmove e7e5 ponder e2e6".to_string(),
        ]
    } else {
        Vec::new()
    };
    Some(replies)
}

#[derive(Debug)]
enum Event {
    Result(String, Option<SearchLine>),
    Fatal(String),
}

struct Events(Sender<Event>);

impl EngineListener for Events {
    fn on_search_result(&self, notation: &str, line: Option<&SearchLine>) {
        let _ = self
            .0
            .send(Event::Result(notation.to_string(), line.cloned()));
    }

    fn on_engine_fatal(&self, error: &EngineError) {
        let _ = self.0.send(Event::Fatal(error.to_string()));
    }
}

fn settings() -> EngineSettings {
    EngineSettings {
        settle_delay: Duration::ZERO,
        watchdog_deadline: Duration::from_secs(10),
        ..EngineSettings::default()
    }
}

fn session(
    settings: EngineSettings,
    responder: Responder,
) -> (EngineSession, Receiver<Event>, Arc<Mutex<Vec<String>>>) {
    let (transport, written) = fake_engine(responder);
    let (tx, rx) = unbounded();
    let listener: Arc<dyn EngineListener> = Arc::new(Events(tx));
    let session = EngineSession::with_transport(settings, transport, vec![listener]);
    (session, rx, written)
}

fn lines_starting(written: &Arc<Mutex<Vec<String>>>, prefix: &str) -> Vec<String> {
    written
        .lock()
        .unwrap()
        .iter()
        .filter(|l| l.starts_with(prefix))
        .cloned()
        .collect()
}

const WAIT: Duration = Duration::from_secs(5);

#[test]
fn test_search_round_trip() {
    let (mut session, events, written) = session(settings(), Box::new(responsive));
    assert_eq!(session.state(), SessionState::Starting);
    session.start().unwrap();
    session.submit_position("P1 w - - 0 1");

    let Event::Result(notation, line) = events.recv_timeout(WAIT).unwrap() else {
        panic!("Expected Result")
    };
    assert_eq!(notation, "P1 w - - 0 1");
    let line = line.unwrap();
    assert_eq!(line.pv, vec!["e7e5", "e2e6"]);

    session.stop();
    assert_eq!(session.state(), SessionState::Stopped);

    let written = written.lock().unwrap().clone();
    assert_eq!(
        written[..3],
        [
            "uci",
            "setoption name UCI_Variant value xiangqi",
            "setoption name UCI_Elo value 2850",
        ]
    );
    assert_eq!(
        written[3..7],
        [
            "stop",
            "ucinewgame",
            "position fen P1 w - - 0 1",
            "go movetime 2000",
        ]
    );
    assert_eq!(written[written.len() - 2..], ["stop", "quit"]);

    // Clean shutdown reports nothing
    assert!(events.try_recv().is_err());
}

#[test]
fn test_queued_positions_collapse_to_latest() {
    let (mut session, events, written) = session(settings(), Box::new(responsive));
    session.submit_position("P1");
    session.submit_position("P2");
    session.submit_position("P3");
    session.start().unwrap();

    let Event::Result(notation, _) = events.recv_timeout(WAIT).unwrap() else {
        panic!("Expected Result")
    };
    assert_eq!(notation, "P3");
    session.stop();

    assert_eq!(lines_starting(&written, "position"), vec!["position fen P3"]);
    assert_eq!(lines_starting(&written, "go").len(), 1);
    assert!(events.try_recv().is_err());
}

#[test]
fn test_sequential_positions_each_get_a_result() {
    let (mut session, events, written) = session(settings(), Box::new(responsive));
    session.start().unwrap();

    session.submit_position("P1");
    let Event::Result(first, _) = events.recv_timeout(WAIT).unwrap() else {
        panic!("Expected Result")
    };
    session.submit_position("P2");
    let Event::Result(second, _) = events.recv_timeout(WAIT).unwrap() else {
        panic!("Expected Result")
    };
    session.stop();

    assert_eq!((first.as_str(), second.as_str()), ("P1", "P2"));
    assert_eq!(lines_starting(&written, "go").len(), 2);
}

#[test]
fn test_hung_engine_raises_one_timeout() {
    let silent: Responder = Box::new(|line: &str| {
        if line.starts_with("go") {
            Some(Vec::new())
        } else {
            responsive(line)
        }
    });
    let settings = EngineSettings {
        watchdog_deadline: Duration::from_millis(200),
        ..settings()
    };
    let (mut session, events, _written) = session(settings, silent);
    session.start().unwrap();
    session.submit_position("P1");

    let Event::Fatal(message) = events.recv_timeout(WAIT).unwrap() else {
        panic!("Expected Fatal")
    };
    assert!(message.contains("No bestmove"), "{}", message);

    session.stop();
    assert!(events.try_recv().is_err());
}

#[test]
fn test_closed_output_is_fatal() {
    let crash: Responder = Box::new(|line: &str| {
        if line.starts_with("go") {
            None
        } else {
            responsive(line)
        }
    });
    let (mut session, events, _written) = session(settings(), crash);
    session.start().unwrap();
    session.submit_position("P1");

    let Event::Fatal(message) = events.recv_timeout(WAIT).unwrap() else {
        panic!("Expected Fatal")
    };
    assert_eq!(message, EngineError::OutputClosed.to_string());

    session.stop();
    assert!(events.try_recv().is_err());
}

#[test]
fn test_stop_drops_pending_positions() {
    let settings = EngineSettings {
        settle_delay: Duration::from_secs(2),
        ..settings()
    };
    let (mut session, events, written) = session(settings, Box::new(responsive));
    session.start().unwrap();
    session.submit_position("P1");

    // The dispatcher is now waiting out the settle delay
    let Event::Result(notation, _) = events.recv_timeout(WAIT).unwrap() else {
        panic!("Expected Result")
    };
    assert_eq!(notation, "P1");
    session.submit_position("P2");

    let started = Instant::now();
    session.stop();
    assert!(started.elapsed() < Duration::from_secs(1));

    assert_eq!(lines_starting(&written, "position"), vec!["position fen P1"]);
    let written = written.lock().unwrap().clone();
    assert_eq!(written[written.len() - 2..], ["stop", "quit"]);
    assert!(events.try_recv().is_err());
}

#[test]
fn test_timeout_raised_from_named_watchdog() {
    struct ThreadNames(Sender<Option<String>>);

    impl EngineListener for ThreadNames {
        fn on_search_result(&self, _notation: &str, _line: Option<&SearchLine>) {}

        fn on_engine_fatal(&self, _error: &EngineError) {
            let _ = self.0.send(thread::current().name().map(str::to_string));
        }
    }

    let silent: Responder = Box::new(|line: &str| {
        if line.starts_with("go") {
            Some(Vec::new())
        } else {
            responsive(line)
        }
    });
    let settings = EngineSettings {
        watchdog_deadline: Duration::from_millis(200),
        ..settings()
    };
    let (transport, _written) = fake_engine(silent);
    let (tx, rx) = unbounded();
    let listener: Arc<dyn EngineListener> = Arc::new(ThreadNames(tx));
    let mut session = EngineSession::with_transport(settings, transport, vec![listener]);
    session.start().unwrap();
    session.submit_position("P1");

    let name = rx.recv_timeout(WAIT).unwrap();
    assert_eq!(name.as_deref(), Some("engine-watchdog"));
    session.stop();
}

#[test]
fn test_setters_after_stop_are_dropped() {
    let (mut session, _events, written) = session(settings(), Box::new(responsive));
    session.start().unwrap();
    session.stop();

    session.set_line_count(3);
    session.set_time_budget(Duration::from_secs(5));
    session.submit_position("P1");

    assert!(lines_starting(&written, "setoption name MultiPV").is_empty());
    assert!(lines_starting(&written, "position").is_empty());
    assert_eq!(session.state(), SessionState::Stopped);
}

#[test]
fn test_line_count_is_forwarded() {
    let (mut session, _events, written) = session(settings(), Box::new(responsive));
    session.start().unwrap();
    session.set_line_count(3);
    session.stop();

    assert_eq!(
        lines_starting(&written, "setoption name MultiPV"),
        vec!["setoption name MultiPV value 3"]
    );
}

#[test]
fn test_start_twice_fails() {
    let (mut session, _events, _written) = session(settings(), Box::new(responsive));
    session.start().unwrap();
    assert!(matches!(session.start(), Err(EngineError::AlreadyStarted)));
}

#[test]
fn test_spawn_failure_is_reported() {
    let settings = EngineSettings {
        path: PathBuf::from("/nonexistent/engine-binary"),
        ..settings()
    };
    let result = EngineSession::spawn(settings, Vec::new());
    assert!(matches!(result, Err(EngineError::Spawn { .. })));
}
