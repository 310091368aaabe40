//! Client-side validation for outbound submissions.
//!
//! Failures use the same shape the backend's rejections arrive in: a map of
//! field names to messages plus free-floating banner messages. Local and
//! remote failures can then be rendered exactly the same way.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::deal::{DealDraft, DealType, UrgencyLevel};
use crate::invite::InviteDraft;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldErrors {
    #[serde(default)]
    fields: BTreeMap<String, Vec<String>>,
    #[serde(default)]
    general: Vec<String>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// A single message not tied to any field.
    pub fn banner(message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add_general(message);
        errors
    }

    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields
            .entry(field.into())
            .or_default()
            .push(message.into());
    }

    pub fn add_general(&mut self, message: impl Into<String>) {
        self.general.push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() && self.general.is_empty()
    }

    /// Messages for one field; empty when the field is clean.
    pub fn field(&self, name: &str) -> &[String] {
        self.fields.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn general(&self) -> &[String] {
        &self.general
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.fields {
            for message in messages {
                if !first {
                    write!(f, "; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }
        for message in &self.general {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{message}")?;
            first = false;
        }
        Ok(())
    }
}

const REGION_CODES: [&str; 27] = [
    "AC", "AL", "AP", "AM", "BA", "CE", "DF", "ES", "GO", "MA", "MT", "MS", "MG", "PA", "PB",
    "PR", "PE", "PI", "RJ", "RN", "RS", "RO", "RR", "SC", "SP", "SE", "TO",
];

/// Maps a spelled-out Brazilian state name, or a bare two-letter code, to
/// the canonical code. Unknown input yields `None`.
pub fn normalize_region(input: &str) -> Option<String> {
    let upper = input.trim().to_uppercase();
    if upper.len() == 2 && REGION_CODES.contains(&upper.as_str()) {
        return Some(upper);
    }
    let code = match upper.as_str() {
        "ACRE" => "AC",
        "ALAGOAS" => "AL",
        "AMAPA" | "AMAPÁ" => "AP",
        "AMAZONAS" => "AM",
        "BAHIA" => "BA",
        "CEARA" | "CEARÁ" => "CE",
        "DISTRITO FEDERAL" => "DF",
        "ESPIRITO SANTO" | "ESPÍRITO SANTO" => "ES",
        "GOIAS" | "GOIÁS" => "GO",
        "MARANHAO" | "MARANHÃO" => "MA",
        "MATO GROSSO" => "MT",
        "MATO GROSSO DO SUL" => "MS",
        "MINAS GERAIS" => "MG",
        "PARA" | "PARÁ" => "PA",
        "PARAIBA" | "PARAÍBA" => "PB",
        "PARANA" | "PARANÁ" => "PR",
        "PERNAMBUCO" => "PE",
        "PIAUI" | "PIAUÍ" => "PI",
        "RIO DE JANEIRO" => "RJ",
        "RIO GRANDE DO NORTE" => "RN",
        "RIO GRANDE DO SUL" => "RS",
        "RONDONIA" | "RONDÔNIA" => "RO",
        "RORAIMA" => "RR",
        "SANTA CATARINA" => "SC",
        "SAO PAULO" | "SÃO PAULO" => "SP",
        "SERGIPE" => "SE",
        "TOCANTINS" => "TO",
        _ => return None,
    };
    Some(code.to_string())
}

/// Strips everything but ASCII digits. Postal codes arrive masked
/// ("80.020-010") and leave as bare digits.
pub fn digits_only(input: &str) -> String {
    input.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// The shape check the sign-up and invite forms apply to email addresses.
pub fn looks_like_email(input: &str) -> bool {
    let trimmed = input.trim();
    if trimmed.is_empty() || trimmed.contains(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = trimmed.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !host.is_empty() && !tld.is_empty()
}

/// Submit-time checks for a deal draft.
///
/// Sale and trade deals need a positive value; every deal needs a real
/// description, a complete address with a known region code, and a postal
/// code with at least one digit; date urgency needs its limit date.
pub fn validate_deal_draft(draft: &DealDraft) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    if matches!(draft.deal_type, DealType::Sale | DealType::Trade) && draft.value <= 0.0 {
        errors.add("value", "enter a value greater than zero");
    }
    if draft.description.trim().chars().count() < 6 {
        errors.add("description", "describe the deal with at least 6 characters");
    }
    if draft.location.address.trim().is_empty() {
        errors.add("address", "enter the street address");
    }
    if draft.location.city.trim().is_empty() {
        errors.add("city", "enter the city");
    }
    if normalize_region(&draft.location.state).is_none() {
        errors.add("state", "enter a valid region code (e.g. SP, RJ)");
    }
    if digits_only(&draft.location.zip_code).is_empty() {
        errors.add("zip_code", "enter a postal code");
    }
    if draft.urgency.level == UrgencyLevel::Date && draft.urgency.limit_date.is_none() {
        errors.add("limit_date", "date urgency needs a limit date");
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

/// Submit-time checks for an invite draft.
pub fn validate_invite_draft(draft: &InviteDraft) -> Result<(), FieldErrors> {
    let mut errors = FieldErrors::new();

    if draft.name.trim().is_empty() {
        errors.add("name", "enter the guest's name");
    }
    if !looks_like_email(&draft.email) {
        errors.add("email", "enter a valid email address");
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}
