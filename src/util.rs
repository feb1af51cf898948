// Locale-aware unit formatting for the status panel.

use serde::{Deserialize, Serialize};

use crate::model::Position;

/// Rendered for readings that lack a value.
pub const PLACEHOLDER: &str = "-";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Locale {
    #[default]
    #[serde(rename = "de-DE")]
    DeDe,
    #[serde(rename = "en-US")]
    EnUs,
}

impl Locale {
    fn decimal_separator(self) -> char {
        match self {
            Locale::DeDe => ',',
            Locale::EnUs => '.',
        }
    }

    fn group_separator(self) -> char {
        match self {
            Locale::DeDe => '.',
            Locale::EnUs => ',',
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnitFormatter {
    pub fraction_digits: usize,
    pub min_integer_digits: usize,
    pub unit: &'static str,
}

pub const COORD_FORMAT: UnitFormatter = UnitFormatter {
    fraction_digits: 6,
    min_integer_digits: 3,
    unit: "°",
};
pub const DIST_FORMAT: UnitFormatter = UnitFormatter {
    fraction_digits: 1,
    min_integer_digits: 1,
    unit: " m",
};
pub const DEG_FORMAT: UnitFormatter = UnitFormatter {
    fraction_digits: 1,
    min_integer_digits: 1,
    unit: "°",
};
pub const SPEED_FORMAT: UnitFormatter = UnitFormatter {
    fraction_digits: 1,
    min_integer_digits: 1,
    unit: " m/s",
};

impl UnitFormatter {
    pub fn format(&self, value: f64, locale: Locale) -> String {
        if !value.is_finite() {
            return PLACEHOLDER.to_string();
        }
        let fixed = format!("{:.*}", self.fraction_digits, value.abs());
        let (int_part, frac_part) = match fixed.split_once('.') {
            Some((i, f)) => (i, Some(f)),
            None => (fixed.as_str(), None),
        };
        let mut out = String::with_capacity(fixed.len() + self.unit.len() + 4);
        if value < 0.0 {
            out.push('-');
        }
        let padded = format!("{:0>width$}", int_part, width = self.min_integer_digits);
        out.push_str(&group_thousands(&padded, locale.group_separator()));
        if let Some(frac) = frac_part {
            out.push(locale.decimal_separator());
            out.push_str(frac);
        }
        out.push_str(self.unit);
        out
    }

    pub fn format_opt(&self, value: Option<f64>, locale: Locale) -> String {
        match value {
            Some(v) => self.format(v, locale),
            None => PLACEHOLDER.to_string(),
        }
    }
}

fn group_thousands(digits: &str, sep: char) -> String {
    if digits.len() < 4 {
        return digits.to_string();
    }
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(sep);
        }
        out.push(ch);
    }
    out
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StatusField {
    pub label: &'static str,
    pub value: String,
}

/// Left column (LAT/LONG/ALT) and middle column (ACC/HEAD/SPD) of the panel.
pub fn status_fields(pos: &Position, locale: Locale) -> ([StatusField; 3], [StatusField; 3]) {
    let field = |label, value| StatusField { label, value };
    (
        [
            field("LAT", COORD_FORMAT.format(pos.latitude, locale)),
            field("LONG", COORD_FORMAT.format(pos.longitude, locale)),
            field("ALT", DIST_FORMAT.format_opt(pos.altitude, locale)),
        ],
        [
            field("ACC", DIST_FORMAT.format_opt(pos.accuracy, locale)),
            field("HEAD", DEG_FORMAT.format_opt(pos.heading, locale)),
            field("SPD", SPEED_FORMAT.format_opt(pos.speed, locale)),
        ],
    )
}
