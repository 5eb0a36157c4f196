use std::str::FromStr;

use rtrb::{Consumer, Producer};

/// Operator input, in the order it was given.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlEvent {
    Start,
    Stop,
    /// Select a global channel number.
    SetChannel(usize),
    SetGain(f64),
    /// Report playback state, selection and gain.
    Status,
    /// The surface is going away; shut the pipeline down.
    Shutdown,
}

pub type ControlEventProducer = Producer<ControlEvent>;
pub type ControlEventConsumer = Consumer<ControlEvent>;

/// Why an operator line was not understood.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseControlError {
    #[error("empty command")]
    Empty,

    #[error("unexpected argument '{0}'")]
    UnexpectedArgument(String),

    #[error("'{0}' needs a value")]
    MissingValue(String),

    #[error("bad {verb} '{value}': {reason}")]
    BadValue {
        verb: String,
        value: String,
        reason: String,
    },

    #[error("unknown command '{0}'")]
    Unknown(String),
}

impl ParseControlError {
    fn bad_value(verb: &str, value: &str, reason: impl ToString) -> Self {
        Self::BadValue {
            verb: verb.to_owned(),
            value: value.to_owned(),
            reason: reason.to_string(),
        }
    }
}

impl FromStr for ControlEvent {
    type Err = ParseControlError;

    /// Accepts `start`, `stop`, `channel <n>`, `gain <g>`, `status` and
    /// `quit`, case-insensitively.
    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let verb = words
            .next()
            .ok_or(ParseControlError::Empty)?
            .to_ascii_lowercase();
        let argument = words.next();
        if let Some(extra) = words.next() {
            return Err(ParseControlError::UnexpectedArgument(extra.to_owned()));
        }

        let event = match (verb.as_str(), argument) {
            ("start", None) => Self::Start,
            ("stop", None) => Self::Stop,
            ("status", None) => Self::Status,
            ("quit" | "exit", None) => Self::Shutdown,
            ("channel", Some(value)) => Self::SetChannel(
                value
                    .parse()
                    .map_err(|e| ParseControlError::bad_value(&verb, value, e))?,
            ),
            ("gain", Some(value)) => Self::SetGain(
                value
                    .parse()
                    .map_err(|e| ParseControlError::bad_value(&verb, value, e))?,
            ),
            ("channel" | "gain", None) => {
                return Err(ParseControlError::MissingValue(verb.clone()));
            }
            _ => return Err(ParseControlError::Unknown(line.trim().to_owned())),
        };
        Ok(event)
    }
}
