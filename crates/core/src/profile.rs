//! Customer profile: the shipping and identity data required before checkout.
//!
//! A profile is validated from raw form input ([`ProfileDraft`]) into a
//! [`NewProfile`]; the storefront then persists it for the logged-in user.

use std::fmt;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{ProfileId, UserId};

/// Brazilian federative units accepted in the `state` field.
pub const STATES: [&str; 27] = [
    "AC", "AL", "AP", "AM", "BA", "CE", "DF", "ES", "GO", "MA", "MT", "MS", "MG", "PA", "PB", "PR",
    "PE", "PI", "RJ", "RN", "RS", "RO", "RR", "SC", "SP", "SE", "TO",
];

/// Oldest birth year accepted.
const MIN_BIRTH_YEAR: i32 = 1900;

/// Profile validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProfileError {
    /// A required field was left blank.
    #[error("{0} is required")]
    Required(&'static str),

    /// CPF is malformed or fails its check digits.
    #[error("invalid CPF")]
    InvalidCpf,

    /// CEP is not 8 digits.
    #[error("invalid postal code")]
    InvalidPostalCode,

    /// Not a Brazilian UF.
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Birth date is unparseable, in the future or implausibly old.
    #[error("invalid birth date")]
    InvalidBirthDate,
}

impl ProfileError {
    /// Customer-facing message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Required(field) => format!("O campo {field} é obrigatório."),
            Self::InvalidCpf => "CPF inválido.".to_string(),
            Self::InvalidPostalCode => "CEP inválido, digite os 8 dígitos.".to_string(),
            Self::InvalidState(_) => "Estado inválido.".to_string(),
            Self::InvalidBirthDate => "Data de nascimento inválida.".to_string(),
        }
    }
}

/// A CPF (Cadastro de Pessoas Físicas) number, stored as 11 digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cpf(String);

impl Cpf {
    /// Parse a CPF, ignoring punctuation, and verify its check digits.
    ///
    /// ```
    /// use loja_core::Cpf;
    ///
    /// assert_eq!(Cpf::parse("529.982.247-25").unwrap().as_str(), "52998224725");
    /// assert!(Cpf::parse("111.111.111-11").is_err());
    /// ```
    ///
    /// # Errors
    ///
    /// Returns [`ProfileError::InvalidCpf`] for anything that is not a valid CPF.
    pub fn parse(raw: &str) -> Result<Self, ProfileError> {
        let digits: Vec<u32> = raw
            .chars()
            .filter(|c| !matches!(c, '.' | '-' | ' '))
            .map(|c| c.to_digit(10).ok_or(ProfileError::InvalidCpf))
            .collect::<Result<_, _>>()?;

        let [first, rest @ ..] = digits.as_slice() else {
            return Err(ProfileError::InvalidCpf);
        };
        if digits.len() != 11 || rest.iter().all(|d| d == first) {
            return Err(ProfileError::InvalidCpf);
        }

        let check = |len: usize| -> u32 {
            let weight_start = u32::try_from(len).unwrap_or(0) + 1;
            let sum: u32 = digits
                .iter()
                .take(len)
                .zip((2..=weight_start).rev())
                .map(|(d, w)| d * w)
                .sum();
            match (sum * 10) % 11 {
                10 => 0,
                r => r,
            }
        };

        if digits.get(9) != Some(&check(9)) || digits.get(10) != Some(&check(10)) {
            return Err(ProfileError::InvalidCpf);
        }

        Ok(Self(digits.iter().map(u32::to_string).collect()))
    }

    /// The 11 digits without punctuation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wrap digits already validated by the database layer.
    #[must_use]
    pub const fn from_trusted(digits: String) -> Self {
        Self(digits)
    }
}

impl fmt::Display for Cpf {
    /// Formats as `000.000.000-00`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (
            self.0.get(0..3),
            self.0.get(3..6),
            self.0.get(6..9),
            self.0.get(9..11),
        ) {
            (Some(a), Some(b), Some(c), Some(d)) => write!(f, "{a}.{b}.{c}-{d}"),
            _ => f.write_str(&self.0),
        }
    }
}

/// A stored customer profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub id: ProfileId,
    pub user_id: UserId,
    pub full_name: String,
    pub birth_date: NaiveDate,
    pub cpf: Cpf,
    pub street: String,
    pub number: String,
    pub complement: Option<String>,
    pub district: String,
    /// CEP, 8 digits.
    pub postal_code: String,
    pub city: String,
    /// Two-letter UF.
    pub state: String,
}

/// Validated profile data ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProfile {
    pub full_name: String,
    pub birth_date: NaiveDate,
    pub cpf: Cpf,
    pub street: String,
    pub number: String,
    pub complement: Option<String>,
    pub district: String,
    pub postal_code: String,
    pub city: String,
    pub state: String,
}

/// Raw profile form input.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileDraft {
    pub full_name: String,
    /// `YYYY-MM-DD`, as sent by an HTML date input.
    pub birth_date: String,
    pub cpf: String,
    pub street: String,
    pub number: String,
    #[serde(default)]
    pub complement: String,
    pub district: String,
    pub postal_code: String,
    pub city: String,
    pub state: String,
}

impl ProfileDraft {
    /// Validate the draft, given today's date for the birth date check.
    ///
    /// # Errors
    ///
    /// Returns the first [`ProfileError`] found, checking fields in form order.
    pub fn validate(&self, today: NaiveDate) -> Result<NewProfile, ProfileError> {
        let full_name = required(&self.full_name, "nome completo")?;

        let birth_date = NaiveDate::parse_from_str(self.birth_date.trim(), "%Y-%m-%d")
            .map_err(|_| ProfileError::InvalidBirthDate)?;
        if birth_date >= today || birth_date.year() < MIN_BIRTH_YEAR {
            return Err(ProfileError::InvalidBirthDate);
        }

        let cpf = Cpf::parse(&self.cpf)?;
        let street = required(&self.street, "endereço")?;
        let number = required(&self.number, "número")?;
        let complement = Some(self.complement.trim())
            .filter(|c| !c.is_empty())
            .map(str::to_string);
        let district = required(&self.district, "bairro")?;

        let postal_code: String = self
            .postal_code
            .chars()
            .filter(|c| !matches!(c, '-' | '.' | ' '))
            .collect();
        if postal_code.len() != 8 || !postal_code.chars().all(|c| c.is_ascii_digit()) {
            return Err(ProfileError::InvalidPostalCode);
        }

        let city = required(&self.city, "cidade")?;
        let state = self.state.trim().to_uppercase();
        if !STATES.contains(&state.as_str()) {
            return Err(ProfileError::InvalidState(state));
        }

        Ok(NewProfile {
            full_name,
            birth_date,
            cpf,
            street,
            number,
            complement,
            district,
            postal_code,
            city,
            state,
        })
    }
}

fn required(value: &str, field: &'static str) -> Result<String, ProfileError> {
    let value = value.trim();
    if value.is_empty() {
        Err(ProfileError::Required(field))
    } else {
        Ok(value.to_string())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    fn draft() -> ProfileDraft {
        ProfileDraft {
            full_name: " Maria da Silva ".to_string(),
            birth_date: "1990-05-20".to_string(),
            cpf: "529.982.247-25".to_string(),
            street: "Rua das Flores".to_string(),
            number: "100".to_string(),
            complement: "  ".to_string(),
            district: "Centro".to_string(),
            postal_code: "01310-100".to_string(),
            city: "São Paulo".to_string(),
            state: "sp".to_string(),
        }
    }

    #[test]
    fn test_cpf_valid_formats() {
        assert_eq!(Cpf::parse("52998224725").unwrap().as_str(), "52998224725");
        assert_eq!(
            Cpf::parse("529.982.247-25").unwrap().to_string(),
            "529.982.247-25"
        );
    }

    #[test]
    fn test_cpf_rejects_bad_check_digits() {
        assert_eq!(Cpf::parse("529.982.247-26"), Err(ProfileError::InvalidCpf));
        assert_eq!(Cpf::parse("529.982.247-35"), Err(ProfileError::InvalidCpf));
    }

    #[test]
    fn test_cpf_rejects_repeated_and_malformed() {
        assert_eq!(Cpf::parse("000.000.000-00"), Err(ProfileError::InvalidCpf));
        assert_eq!(Cpf::parse("5299822472"), Err(ProfileError::InvalidCpf));
        assert_eq!(Cpf::parse("5299822472a"), Err(ProfileError::InvalidCpf));
        assert_eq!(Cpf::parse(""), Err(ProfileError::InvalidCpf));
    }

    #[test]
    fn test_validate_normalises_fields() {
        let profile = draft().validate(today()).unwrap();
        assert_eq!(profile.full_name, "Maria da Silva");
        assert_eq!(profile.postal_code, "01310100");
        assert_eq!(profile.state, "SP");
        assert_eq!(profile.complement, None);
        assert_eq!(profile.cpf.as_str(), "52998224725");
    }

    #[test]
    fn test_validate_required_fields() {
        let mut d = draft();
        d.street = "   ".to_string();
        assert_eq!(
            d.validate(today()),
            Err(ProfileError::Required("endereço"))
        );
    }

    #[test]
    fn test_validate_birth_date() {
        let mut d = draft();
        d.birth_date = "2030-01-01".to_string();
        assert_eq!(d.validate(today()), Err(ProfileError::InvalidBirthDate));
        d.birth_date = "20/05/1990".to_string();
        assert_eq!(d.validate(today()), Err(ProfileError::InvalidBirthDate));
    }

    #[test]
    fn test_validate_postal_code_and_state() {
        let mut d = draft();
        d.postal_code = "0131010".to_string();
        assert_eq!(d.validate(today()), Err(ProfileError::InvalidPostalCode));

        let mut d = draft();
        d.state = "XX".to_string();
        assert_eq!(
            d.validate(today()),
            Err(ProfileError::InvalidState("XX".to_string()))
        );
    }
}
