//! Parsing of `.srs` configuration files.

use std::{num, mem, fmt, error};

use crate::items::Part;
use crate::scheduler::ScheduleError;
use crate::settings::{ConfigStore, SrsConfig};
use crate::Interval;

/// Parse settings from `.srs` format.
///
/// Parts that are not configured in `src` keep their default settings.
pub fn parse_config(src: &str) -> Result<ConfigStore, ParsingErrorLine> {
    let mut parser = Parser::default();
    parser.parse(src)?;
    Ok(parser.store)
}

/// Parse a key-value pair in the format `<key>: <value>`.
///
/// The colon may be surronded by whitespaces, which will be trimmed.
fn key_value(s: &str) -> Result<(&str, &str), ParsingError> {
    let colon = s.find(':').ok_or(ParsingError::Other("not a proper key-value pair (no colon present)"))?;
    // Check out-of-bounds to avoid panic.
    if colon + 1 < s.len() {
        Ok((s[..colon].trim_end(), s[colon + 1..].trim_start()))
    } else {
        Err(ParsingError::Other("no value specified"))
    }
}

/// Parse duration into seconds.
///
/// This parses a string of form `<integer><unit>` where `<unit>` is one of the following:
///
/// - `s` for second.
/// - `m` for minute.
/// - `h` for hour.
/// - `d` for day.
/// - `w` for week.
/// - `M` for month (4 weeks).
/// - `y` for year (12 months).
fn parse_duration(s: &str) -> Result<Interval, ParsingError> {
    let (number_part, unit) = s.char_indices().last().ok_or(ParsingError::Other("duration empty"))?;
    let number: Interval = s[..number_part].trim_end().parse()?;

    let seconds = match unit {
        's' => 1,
        'm' => 60,
        'h' => 60 * 60,
        'd' => 24 * 60 * 60,
        'w' => 7 * 24 * 60 * 60,
        'M' => 4 * 7 * 24 * 60 * 60,
        'y' => 12 * 4 * 7 * 24 * 60 * 60,
        _ => return Err(ParsingError::UnknownUnit(unit)),
    };

    number.checked_mul(seconds).ok_or(ParsingError::Other("duration too long"))
}

/// Parse a comma-separated list of ease factors.
fn parse_factors(s: &str) -> Result<Vec<f64>, ParsingError> {
    s.split(',')
        .map(str::trim)
        .map(|x| x.parse::<f64>().map_err(ParsingError::from))
        .collect()
}

/// An error during parsing.
#[derive(Debug)]
pub enum ParsingError {
    /// Error during integer parsing.
    ParseInt(num::ParseIntError),
    /// Error during float parsing.
    ParseFloat(num::ParseFloatError),
    /// The settings of a section cannot be used for scheduling.
    Invalid(ScheduleError),
    /// A duration with an unknown unit.
    UnknownUnit(char),
    /// Other error.
    Other(&'static str),
}

impl From<num::ParseIntError> for ParsingError {
    fn from(error: num::ParseIntError) -> Self {
        ParsingError::ParseInt(error)
    }
}

impl From<num::ParseFloatError> for ParsingError {
    fn from(error: num::ParseFloatError) -> Self {
        ParsingError::ParseFloat(error)
    }
}

impl From<ScheduleError> for ParsingError {
    fn from(error: ScheduleError) -> Self {
        ParsingError::Invalid(error)
    }
}

/// A parsing error with an associated line number.
#[derive(Debug)]
pub struct ParsingErrorLine {
    /// The line number.
    pub line_num: usize,
    /// The error.
    pub err: ParsingError,
}

impl error::Error for ParsingErrorLine {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self.err {
            ParsingError::ParseInt(ref err) => Some(err),
            ParsingError::ParseFloat(ref err) => Some(err),
            ParsingError::Invalid(ref err) => Some(err),
            ParsingError::UnknownUnit(..) | ParsingError::Other(..) => None,
        }
    }
}

impl fmt::Display for ParsingErrorLine {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.err {
            ParsingError::ParseInt(ref err) => write!(f, "failed to parse integer ({}); at line {}", err, self.line_num),
            ParsingError::ParseFloat(ref err) => write!(f, "failed to parse float ({}); at line {}", err, self.line_num),
            ParsingError::Invalid(ref err) => write!(f, "{}; at line {}", err, self.line_num),
            ParsingError::UnknownUnit(unit) => write!(f, "unknown unit '{}'; at line {}", unit, self.line_num),
            ParsingError::Other(ref err) => write!(f, "{}; at line {}", err, self.line_num),
        }
    }
}

/// A `.srs`-file parser.
struct Parser {
    /// The settings parsed so far.
    store: ConfigStore,
    /// The part whose section is being parsed, if any.
    section: Option<Part>,
    /// The parts that had a section.
    seen: Vec<Part>,
    /// Settings of the current section.
    ///
    /// This is built incrementally as more lines are parsed. To manifest it to `store`, use
    /// `flush()`.
    current: SrsConfig,
}

impl Default for Parser {
    fn default() -> Parser {
        Parser {
            store: ConfigStore::default(),
            section: None,
            seen: Vec::new(),
            current: SrsConfig::default(),
        }
    }
}

impl Parser {
    /// Parse `src` and update state accordingly.
    fn parse(&mut self, src: &str) -> Result<(), ParsingErrorLine> {
        let mut line_num = 0;
        for line in src.lines() {
            line_num += 1;
            self.parse_line(line).map_err(|err| ParsingErrorLine { err, line_num })?;
        }

        // Flush the last section.
        self.flush().map_err(|err| ParsingErrorLine { err, line_num })
    }

    /// Flush the current section into the store.
    fn flush(&mut self) -> Result<(), ParsingError> {
        if let Some(part) = self.section.take() {
            let config = mem::replace(&mut self.current, SrsConfig::default());
            self.store.insert(part, config)?;
        }

        Ok(())
    }

    /// Parse a single line and update state accordingly.
    fn parse_line(&mut self, mut line: &str) -> Result<(), ParsingError> {
        line = line.trim();
        // Skip blank lines and comments.
        if line.is_empty() || line.starts_with('#') {
            return Ok(());
        }

        if line.starts_with('[') && line.ends_with(']') {
            // Close off existing section.
            self.flush()?;

            let title = line[1..line.len() - 1].trim();
            if !title.starts_with("part ") {
                return Err(ParsingError::Other("unknown section"));
            }
            let part = title["part ".len()..].trim_start().parse::<Part>()
                .map_err(|()| ParsingError::Other("unknown part (expected rune, tone, defn or rdng)"))?;
            if self.seen.contains(&part) {
                return Err(ParsingError::Other("configuring a part multiple times"));
            }
            self.seen.push(part);
            // Sections start from the defaults of their part.
            self.current = self.store.get(part)?.clone();
            self.section = Some(part);

            return Ok(());
        }

        if self.section.is_none() {
            return Err(ParsingError::Other("setting outside of a section"));
        }

        let (key, value) = key_value(line)?;
        match key {
            "INHERIT" => {
                let part = value.parse::<Part>()
                    .map_err(|()| ParsingError::Other("cannot inherit from unknown part"))?;
                if !self.seen.contains(&part) || self.section == Some(part) {
                    return Err(ParsingError::Other("cannot inherit from a part that has not been configured"));
                }
                self.current = self.store.get(part)?.clone();
            },
            "initial right interval" => self.current.initial_right_interval = parse_duration(value)?,
            "initial wrong interval" => self.current.initial_wrong_interval = parse_duration(value)?,
            "right factors" => self.current.right_factors = parse_factors(value)?,
            "wrong factors" => self.current.wrong_factors = parse_factors(value)?,
            _ => return Err(ParsingError::Other("unknown key")),
        }

        Ok(())
    }
}
