use super::commands::{EngineOutput, Info, Score};
use super::options::{AdvertisedOption, UciOptionType};

pub struct Decoder;

impl Default for Decoder {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder {
    pub fn new() -> Self {
        Self
    }

    pub fn decode(&self, input: &str) -> EngineOutput {
        match input {
            "uciok" => EngineOutput::UciOk,

            _ if input.starts_with("info") => self.decode_info(input),
            _ if input.starts_with("bestmove") => self.decode_bestmove(input),
            _ if input.starts_with("option") => self.decode_option(input),
            _ if input.starts_with("id name ") => {
                EngineOutput::IdName(input[8..].trim().to_string())
            }
            _ if input.starts_with("id author ") => {
                EngineOutput::IdAuthor(input[10..].trim().to_string())
            }

            _ => EngineOutput::Unknown(input.to_string()),
        }
    }

    fn decode_info(&self, input: &str) -> EngineOutput {
        // Parse: info [depth d] ... [score cp|mate v [lowerbound|upperbound]] ... [pv m1 m2 ...]
        // Everything after "pv" is the variation; "string" carries free text we ignore.
        let tokens: Vec<&str> = input.split_whitespace().skip(1).collect();
        let cut = tokens
            .iter()
            .position(|t| matches!(*t, "pv" | "string"))
            .unwrap_or(tokens.len());
        let head = &tokens[..cut];

        let pv = match tokens.get(cut) {
            Some(&"pv") => tokens[cut + 1..].iter().map(|m| m.to_string()).collect(),
            _ => Vec::new(),
        };

        EngineOutput::Info(Info {
            depth: extract_numeric_param(head, "depth").map(|d| d as u32),
            sel_depth: extract_numeric_param(head, "seldepth").map(|d| d as u32),
            multi_pv: extract_numeric_param(head, "multipv").map(|d| d as u32),
            nodes: extract_numeric_param(head, "nodes"),
            nodes_per_second: extract_numeric_param(head, "nps"),
            time: extract_numeric_param(head, "time"),
            score: extract_score(head),
            pv,
        })
    }

    fn decode_bestmove(&self, input: &str) -> EngineOutput {
        // Parse: bestmove <move> [ponder <move>]
        let tokens: Vec<&str> = input.split_whitespace().collect();
        let Some(best_move) = tokens.get(1) else {
            return EngineOutput::Unknown(input.to_string());
        };

        let ponder = tokens
            .windows(2)
            .find(|w| w[0] == "ponder")
            .map(|w| w[1].to_string());

        EngineOutput::BestMove {
            best_move: best_move.to_string(),
            ponder,
        }
    }

    fn decode_option(&self, input: &str) -> EngineOutput {
        // Parse: option name <name> type <type> [default <v>] [min <m>] [max <m>] [var <v>]*
        // Names and string defaults may contain spaces.
        let Some((name, tail)) = input
            .strip_prefix("option name ")
            .and_then(|rest| rest.split_once(" type "))
        else {
            return EngineOutput::Unknown(input.to_string());
        };

        let mut tokens = tail.split_whitespace();
        let kind = tokens.next().unwrap_or_default();

        let mut fields: Vec<(&str, String)> = Vec::new();
        for token in tokens {
            match token {
                "default" | "min" | "max" | "var" => fields.push((token, String::new())),
                _ => {
                    if let Some((_, value)) = fields.last_mut() {
                        if !value.is_empty() {
                            value.push(' ');
                        }
                        value.push_str(token);
                    }
                }
            }
        }
        let field = |key: &str| {
            fields
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.clone())
        };

        let option_type = match kind {
            "spin" => UciOptionType::Spin {
                min: field("min").and_then(|v| v.parse().ok()).unwrap_or(i32::MIN),
                max: field("max").and_then(|v| v.parse().ok()).unwrap_or(i32::MAX),
            },
            "check" => UciOptionType::Check,
            "combo" => UciOptionType::Combo {
                vars: fields
                    .iter()
                    .filter(|(k, _)| *k == "var")
                    .map(|(_, v)| v.clone())
                    .collect(),
            },
            "string" => UciOptionType::String,
            "button" => UciOptionType::Button,
            _ => return EngineOutput::Unknown(input.to_string()),
        };

        EngineOutput::Option(AdvertisedOption {
            name: name.trim().to_string(),
            option_type,
            default: field("default"),
        })
    }
}

fn extract_numeric_param(tokens: &[&str], param: &str) -> Option<u64> {
    tokens
        .windows(2)
        .find(|w| w[0] == param)
        .and_then(|w| w[1].parse().ok())
}

fn extract_score(tokens: &[&str]) -> Option<Score> {
    let w = tokens.windows(3).find(|w| w[0] == "score")?;
    let value = w[2].parse().ok()?;
    match w[1] {
        "cp" => Some(Score::Centipawns(value)),
        "mate" => Some(Score::Mate(value)),
        _ => None,
    }
}
