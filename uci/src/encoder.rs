use super::commands::{EngineInput, GoParams};

pub struct Encoder {}

impl Encoder {
    pub fn encode(&self, command: &EngineInput) -> String {
        match command {
            EngineInput::Uci => "uci".to_string(),
            EngineInput::SetOption { name, value } if value.is_empty() => {
                format!("setoption name {}", name)
            }
            EngineInput::SetOption { name, value } => {
                format!("setoption name {} value {}", name, value)
            }
            EngineInput::UciNewGame => "ucinewgame".to_string(),
            EngineInput::Position { fen } => format!("position fen {}", fen),
            EngineInput::Go(params) => self.encode_go(params),
            EngineInput::Stop => "stop".to_string(),
            EngineInput::Quit => "quit".to_string(),
        }
    }

    fn encode_go(&self, params: &GoParams) -> String {
        let mut line = "go".to_string();
        if let Some(move_time) = params.move_time {
            line.push_str(&format!(" movetime {}", move_time));
        }
        line
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_commands() {
        let encoder = Encoder {};
        assert_eq!(encoder.encode(&EngineInput::Uci), "uci");
        assert_eq!(encoder.encode(&EngineInput::UciNewGame), "ucinewgame");
        assert_eq!(encoder.encode(&EngineInput::Stop), "stop");
        assert_eq!(encoder.encode(&EngineInput::Quit), "quit");
    }

    #[test]
    fn test_setoption() {
        let encoder = Encoder {};
        let with_value = EngineInput::SetOption {
            name: "UCI_Variant".to_string(),
            value: "xiangqi".to_string(),
        };
        assert_eq!(
            encoder.encode(&with_value),
            "setoption name UCI_Variant value xiangqi"
        );

        let button = EngineInput::SetOption {
            name: "Clear Hash".to_string(),
            value: String::new(),
        };
        assert_eq!(encoder.encode(&button), "setoption name Clear Hash");
    }

    #[test]
    fn test_position_and_go() {
        let encoder = Encoder {};
        let position = EngineInput::Position {
            fen: "9/9/9/9/9/9/9/9/9/9 w - - 0 1".to_string(),
        };
        assert_eq!(
            encoder.encode(&position),
            "position fen 9/9/9/9/9/9/9/9/9/9 w - - 0 1"
        );

        let go = EngineInput::Go(GoParams {
            move_time: Some(2000),
        });
        assert_eq!(encoder.encode(&go), "go movetime 2000");
        assert_eq!(encoder.encode(&EngineInput::Go(GoParams::default())), "go");
    }
}
