use log::{debug, warn};

use crate::config::ParserConfig;
use crate::models::{SkippedValue, SugarReading, TextLine};

/// Result of scanning a line for its numeric content
#[derive(Debug, Clone, PartialEq)]
pub enum NumberScan {
    Value(f64),
    /// Neither digits nor decimal points were present
    Empty,
    /// Digits and points were found but do not form one number
    Malformed(String),
}

/// Collects every ASCII digit and `.` in order and reads them as one number.
///
/// Everything else is ignored, so "8.5g" gives 8.5, "g8g" gives 8 and
/// "Natrium 200mg" gives 200. More than one point, or points with no digits,
/// is malformed.
pub fn scan_number(text: &str) -> NumberScan {
    let mut accumulated = String::new();
    let mut digits = 0usize;
    let mut points = 0usize;

    for ch in text.chars() {
        match ch {
            '0'..='9' => {
                digits += 1;
                accumulated.push(ch);
            }
            '.' => {
                points += 1;
                accumulated.push(ch);
            }
            _ => {}
        }
    }

    if accumulated.is_empty() {
        return NumberScan::Empty;
    }
    if digits == 0 || points > 1 {
        return NumberScan::Malformed(accumulated);
    }

    match accumulated.parse::<f64>() {
        Ok(value) => NumberScan::Value(value),
        Err(_) => NumberScan::Malformed(accumulated),
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseOutcome {
    pub readings: Vec<SugarReading>,
    pub skipped: Vec<SkippedValue>,
}

/// Pairs each sugar label line with the measurement on the line after it
pub struct SugarValueParser {
    keywords: Vec<String>,
    unit_marker: String,
}

impl SugarValueParser {
    pub fn new(config: &ParserConfig) -> Self {
        Self {
            keywords: config
                .keywords
                .iter()
                .map(|k| k.trim().to_lowercase())
                .filter(|k| !k.is_empty())
                .collect(),
            unit_marker: config.unit_marker.clone(),
        }
    }

    /// Readings in line order. Repeated labels yield repeated readings.
    pub fn parse(&self, lines: &[TextLine]) -> Vec<SugarReading> {
        self.parse_detailed(lines).readings
    }

    pub fn parse_detailed(&self, lines: &[TextLine]) -> ParseOutcome {
        let mut outcome = ParseOutcome::default();

        for (i, line) in lines.iter().enumerate() {
            if !self.is_label(&line.text) {
                continue;
            }
            let Some(next) = lines.get(i + 1) else {
                debug!("Label on last line {} has no value line", line.line_index);
                continue;
            };
            if !self.is_value_line(&next.text) {
                continue;
            }

            match scan_number(&next.text) {
                NumberScan::Value(value_grams) => {
                    debug!("Sugar reading {} from line {}", value_grams, next.line_index);
                    outcome.readings.push(SugarReading {
                        value_grams,
                        source_line_index: next.line_index,
                    });
                }
                NumberScan::Empty => {}
                NumberScan::Malformed(digits) => {
                    warn!("Unable to convert {:?} on line {} to a number", digits, next.line_index);
                    outcome.skipped.push(SkippedValue {
                        line_index: next.line_index,
                        text: next.text.clone(),
                        reason: format!("not a number: {}", digits),
                    });
                }
            }
        }

        outcome
    }

    pub fn is_label(&self, text: &str) -> bool {
        let lowered = text.to_lowercase();
        self.keywords.iter().any(|k| lowered.contains(k.as_str()))
    }

    /// Contains the unit marker and at least one digit
    pub fn is_value_line(&self, text: &str) -> bool {
        text.contains(self.unit_marker.as_str()) && text.chars().any(|c| c.is_ascii_digit())
    }
}

impl Default for SugarValueParser {
    fn default() -> Self {
        Self::new(&ParserConfig::default())
    }
}
