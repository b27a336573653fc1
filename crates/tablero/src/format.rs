//! Display helpers for amounts, percentages, dates and traffic-light status.
//!
//! Numbers follow the `es-PE` convention: `,` groups thousands and `.`
//! separates decimals. Non-finite inputs render as a dash instead of `NaN`.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Execution percentage at or above which a value is on track.
pub const VERDE_MIN: f64 = 90.0;
/// Execution percentage at or above which a value is moderate.
pub const AMARILLO_MIN: f64 = 70.0;

/// Traffic-light classification of an execution percentage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Semaforo {
    /// On track.
    #[serde(alias = "verde")]
    Verde,
    /// Moderate.
    #[serde(alias = "amarillo")]
    Amarillo,
    /// Critical.
    #[serde(alias = "rojo")]
    Rojo,
}

impl Semaforo {
    /// Classify an execution percentage.
    pub fn from_percent(percent: f64) -> Self {
        if percent >= VERDE_MIN {
            Self::Verde
        } else if percent >= AMARILLO_MIN {
            Self::Amarillo
        } else {
            Self::Rojo
        }
    }

    /// Lowercase name, as used in labels.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Verde => "verde",
            Self::Amarillo => "amarillo",
            Self::Rojo => "rojo",
        }
    }
}

impl std::fmt::Display for Semaforo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Format an amount in soles, abbreviating millions and thousands.
///
/// `1_234_567.0` becomes `S/ 1.23M`, `12_500.0` becomes `S/ 13K` and
/// `950.0` becomes `S/ 950`.
pub fn format_monto(value: f64) -> String {
    if !value.is_finite() {
        return "S/ —".to_string();
    }
    let abs = value.abs();
    if abs >= 1_000_000.0 {
        let millions = (value / 1_000_000.0 * 100.0).round() / 100.0;
        format!("S/ {millions:.2}M")
    } else if abs >= 1_000.0 {
        format!("S/ {}K", (value / 1_000.0).round() as i64)
    } else {
        format!("S/ {}", group(value.round(), 0, false))
    }
}

/// Format an amount in soles with two decimals and grouped thousands.
pub fn format_monto_completo(value: f64) -> String {
    if !value.is_finite() {
        return "S/ —".to_string();
    }
    format!("S/ {}", group(value, 2, false))
}

/// Format a percentage with `decimals` decimals.
pub fn format_percent(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return "—%".to_string();
    }
    format!("{value:.decimals$}%")
}

/// Format a number with grouped thousands and up to three decimals.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return "—".to_string();
    }
    group(value, 3, true)
}

/// Format an ISO date or datetime as `dd/mm/yyyy`.
///
/// Empty input renders as a dash, unparseable input is returned unchanged.
pub fn format_fecha(value: &str) -> String {
    format_date_with(value, "%d/%m/%Y")
}

/// Format an ISO date or datetime as `dd/mm/yyyy hh:mm`.
pub fn format_fecha_hora(value: &str) -> String {
    format_date_with(value, "%d/%m/%Y %H:%M")
}

fn format_date_with(value: &str, pattern: &str) -> String {
    let value = value.trim();
    if value.is_empty() {
        return "—".to_string();
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(value) {
        return datetime.naive_local().format(pattern).to_string();
    }
    if let Ok(datetime) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return datetime.format(pattern).to_string();
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        return date.and_time(chrono::NaiveTime::MIN).format(pattern).to_string();
    }
    value.to_string()
}

fn group(value: f64, decimals: usize, trim_zeros: bool) -> String {
    let text = format!("{:.decimals$}", value.abs());
    let (int_part, frac_part) = text.split_once('.').unwrap_or((text.as_str(), ""));
    let frac_part = if trim_zeros {
        frac_part.trim_end_matches('0')
    } else {
        frac_part
    };

    let mut out = String::with_capacity(text.len() + int_part.len() / 3 + 1);
    let is_zero = int_part.chars().all(|c| c == '0') && frac_part.chars().all(|c| c == '0');
    if value.is_sign_negative() && !is_zero {
        out.push('-');
    }
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    if !frac_part.is_empty() {
        out.push('.');
        out.push_str(frac_part);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_semaforo_thresholds() {
        assert_eq!(Semaforo::from_percent(90.0), Semaforo::Verde);
        assert_eq!(Semaforo::from_percent(89.9), Semaforo::Amarillo);
        assert_eq!(Semaforo::from_percent(70.0), Semaforo::Amarillo);
        assert_eq!(Semaforo::from_percent(12.0), Semaforo::Rojo);
        assert_eq!(Semaforo::from_percent(f64::NAN), Semaforo::Rojo);
    }

    #[test]
    fn test_semaforo_accepts_both_cases() {
        let upper: Semaforo = serde_json::from_str("\"VERDE\"").unwrap();
        let lower: Semaforo = serde_json::from_str("\"amarillo\"").unwrap();
        assert_eq!(upper, Semaforo::Verde);
        assert_eq!(lower, Semaforo::Amarillo);
    }

    #[test]
    fn test_format_monto() {
        assert_eq!(format_monto(1_234_567.0), "S/ 1.23M");
        assert_eq!(format_monto(-2_500_000.0), "S/ -2.50M");
        assert_eq!(format_monto(12_500.0), "S/ 13K");
        assert_eq!(format_monto(950.4), "S/ 950");
        assert_eq!(format_monto(f64::NAN), "S/ —");
        assert_eq!(format_monto_completo(1_234_567.891), "S/ 1,234,567.89");
    }

    #[test]
    fn test_format_percent_and_number() {
        assert_eq!(format_percent(87.456, 1), "87.5%");
        assert_eq!(format_percent(f64::INFINITY, 1), "—%");
        assert_eq!(format_number(1_234_567.0), "1,234,567");
        assert_eq!(format_number(1234.5), "1,234.5");
        assert_eq!(format_number(-999.0), "-999");
        assert_eq!(format_number(f64::NAN), "—");
    }

    #[test]
    fn test_format_fecha() {
        assert_eq!(format_fecha("2026-03-07"), "07/03/2026");
        assert_eq!(format_fecha("2026-03-07T15:04:05"), "07/03/2026");
        assert_eq!(format_fecha_hora("2026-03-07T15:04:05.123"), "07/03/2026 15:04");
        assert_eq!(format_fecha("2026-03-07T15:04:05-05:00"), "07/03/2026");
        assert_eq!(format_fecha(""), "—");
        assert_eq!(format_fecha("pendiente"), "pendiente");
    }
}
