use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub path: PathBuf,
    pub args: Vec<String>,
    /// Written as `setoption` during the handshake, in order.
    pub options: Vec<(String, String)>,
    pub move_time: Duration,
    pub line_count: u8,
    /// How long a search may run past its handoff before the engine is presumed hung.
    pub watchdog_deadline: Duration,
    /// Pause after each `go` before the next command is processed.
    pub settle_delay: Duration,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("fairy-stockfish"),
            args: Vec::new(),
            options: vec![
                ("UCI_Variant".to_string(), "xiangqi".to_string()),
                ("UCI_Elo".to_string(), "2850".to_string()),
            ],
            move_time: Duration::from_secs(2),
            line_count: 1,
            watchdog_deadline: Duration::from_secs(20),
            settle_delay: Duration::from_millis(100),
        }
    }
}

impl EngineSettings {
    /// Replaces an option of the same name, or appends it.
    pub fn set_option(&mut self, name: &str, value: &str) {
        match self.options.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
            Some((_, v)) => *v = value.to_string(),
            None => self.options.push((name.to_string(), value.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_option_replaces_default() {
        let mut settings = EngineSettings::default();
        settings.set_option("uci_elo", "2000");
        settings.set_option("Threads", "4");

        assert_eq!(
            settings.options,
            vec![
                ("UCI_Variant".to_string(), "xiangqi".to_string()),
                ("UCI_Elo".to_string(), "2000".to_string()),
                ("Threads".to_string(), "4".to_string()),
            ]
        );
    }
}
