// src/common/parse.rs
//
// O front manda números ora como número, ora como texto ("12"),
// e os formulários multipart só conhecem texto. Estes helpers
// centralizam a conversão.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde_json::Value;

/// Inteiro vindo de JSON como número ou texto. Vazio, nulo ou lixo -> `None`.
pub fn loose_i32(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i32::try_from(i).ok()
            } else {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && *f >= i32::MIN as f64 && *f <= i32::MAX as f64)
                    .map(|f| f as i32)
            }
        }
        Value::String(s) => parse_i32(s),
        _ => None,
    }
}

/// Decimal vindo de JSON como número ou texto.
pub fn loose_decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::Number(n) => Decimal::from_str(&n.to_string())
            .or_else(|_| Decimal::from_scientific(&n.to_string()))
            .ok(),
        Value::String(s) => parse_decimal(s),
        _ => None,
    }
}

/// Texto vindo de JSON; números viram texto (ex: código de barras numérico).
pub fn loose_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Ausente, `null` ou texto vazio contam como "não enviado".
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(_) => false,
    }
}

pub fn parse_i32(raw: &str) -> Option<i32> {
    raw.trim().parse::<i32>().ok()
}

pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed).ok()
}

/// Data no formato explícito `YYYY-MM-DD`.
pub fn parse_iso_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// Aceita `DD/MM/YYYY` (formato do formulário) ou `YYYY-MM-DD`.
pub fn parse_flexible_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    NaiveDate::parse_from_str(trimmed, "%d/%m/%Y")
        .ok()
        .or_else(|| parse_iso_date(trimmed))
}

/// Campos de texto de um formulário multipart.
#[derive(Debug, Default, Clone)]
pub struct FormFields(HashMap<String, String>);

impl FormFields {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    /// Primeiro valor não vazio entre os nomes alternativos (na ordem dada).
    pub fn first(&self, names: &[&str]) -> Option<&str> {
        names
            .iter()
            .filter_map(|name| self.0.get(*name))
            .map(|v| v.trim())
            .find(|v| !v.is_empty())
    }

    pub fn first_i32(&self, names: &[&str]) -> Option<i32> {
        self.first(names).and_then(parse_i32)
    }

    pub fn first_decimal(&self, names: &[&str]) -> Option<Decimal> {
        self.first(names).and_then(parse_decimal)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormFields {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = FormFields::new();
        for (k, v) in iter {
            fields.insert(k, v);
        }
        fields
    }
}
