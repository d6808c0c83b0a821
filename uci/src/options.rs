#[derive(Debug, Clone)]
pub struct UciOption {
    pub name: &'static str,
    pub option_type: UciOptionType,
}

#[derive(Debug, Clone, PartialEq)]
pub enum UciOptionType {
    Spin { min: i32, max: i32 },
    Check,
    Combo { vars: Vec<String> },
    String,
    Button,
}

impl UciOptionType {
    pub fn validate(&self, value: &str) -> Result<(), String> {
        match self {
            UciOptionType::Spin { min, max } => {
                let parsed = value
                    .parse::<i32>()
                    .map_err(|e| format!("Invalid integer: {}", e))?;
                if parsed < *min || parsed > *max {
                    return Err(format!("Value {} out of range [{}, {}]", parsed, min, max));
                }
                Ok(())
            }
            UciOptionType::Check => match value.to_lowercase().as_str() {
                "true" | "false" => Ok(()),
                _ => Err("Boolean value must be 'true' or 'false'".to_string()),
            },
            UciOptionType::Combo { vars } => {
                if vars.iter().any(|v| v.eq_ignore_ascii_case(value)) {
                    Ok(())
                } else {
                    Err(format!("Value {} is not one of {}", value, vars.join(", ")))
                }
            }
            UciOptionType::String | UciOptionType::Button => Ok(()),
        }
    }

    pub fn to_uci<T>(&self, name: &str, current_value: &T) -> String
    where
        T: ToString,
    {
        match self {
            UciOptionType::Spin { min, max } => {
                format!(
                    "option name {} type spin default {} min {} max {}",
                    name,
                    current_value.to_string(),
                    min,
                    max
                )
            }
            UciOptionType::Check => {
                format!(
                    "option name {} type check default {}",
                    name,
                    current_value.to_string()
                )
            }
            UciOptionType::Combo { vars } => {
                let vars: Vec<String> = vars.iter().map(|v| format!("var {}", v)).collect();
                format!(
                    "option name {} type combo default {} {}",
                    name,
                    current_value.to_string(),
                    vars.join(" ")
                )
            }
            UciOptionType::String => {
                format!(
                    "option name {} type string default {}",
                    name,
                    current_value.to_string()
                )
            }
            UciOptionType::Button => format!("option name {} type button", name),
        }
    }
}

/// An option as announced by the engine during the handshake.
#[derive(Debug, Clone, PartialEq)]
pub struct AdvertisedOption {
    pub name: String,
    pub option_type: UciOptionType,
    pub default: Option<String>,
}

impl AdvertisedOption {
    pub fn validate(&self, value: &str) -> Result<(), String> {
        self.option_type.validate(value)
    }
}
