use serde::{Deserialize, Serialize};

pub const DEFAULT_COUNTRY: &str = "US";

fn default_country() -> String {
    DEFAULT_COUNTRY.to_string()
}

/// Recipient address embedded in a seed's `addresses` jsonb column.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Address {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    pub address_line1: String,
    #[serde(default)]
    pub address_line2: Option<String>,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    #[serde(default = "default_country")]
    pub country: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl Address {
    /// Structural checks only; deliverability is the provider's concern.
    pub fn validate(&self) -> Result<(), String> {
        let has_name = non_blank(self.name.as_deref());
        let has_company = non_blank(self.company.as_deref());
        if !has_name && !has_company {
            return Err("name or company is required".to_string());
        }
        if self.address_line1.trim().is_empty() {
            return Err("address_line1 is required".to_string());
        }
        if self.city.trim().is_empty() {
            return Err("city is required".to_string());
        }

        let state = self.state.trim();
        if state.len() != 2 || !state.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(format!("state must be a 2-letter code, got {:?}", self.state));
        }

        let country = self.country.trim();
        if country.is_empty() {
            return Err("country is required".to_string());
        }
        if country.eq_ignore_ascii_case(DEFAULT_COUNTRY) && !is_us_zip(self.postal_code.trim()) {
            return Err(format!(
                "postal_code must be 12345 or 12345-6789, got {:?}",
                self.postal_code
            ));
        }
        if self.postal_code.trim().is_empty() {
            return Err("postal_code is required".to_string());
        }

        Ok(())
    }

    /// Copy of this address with `token` appended to the company line, so a printed piece
    /// can be matched to its proof by eye.
    pub fn with_attention_token(&self, token: &str) -> Address {
        let company = match self.company.as_deref().map(str::trim) {
            Some(company) if !company.is_empty() => format!("{} #{}", company, token),
            _ => format!("#{}", token),
        };

        Address {
            company: Some(company),
            ..self.clone()
        }
    }
}

fn non_blank(value: Option<&str>) -> bool {
    value.map(|v| !v.trim().is_empty()).unwrap_or(false)
}

fn is_us_zip(value: &str) -> bool {
    let (base, plus_four) = match value.split_once('-') {
        Some((base, ext)) => (base, Some(ext)),
        None => (value, None),
    };

    let digits = |s: &str, len: usize| s.len() == len && s.chars().all(|c| c.is_ascii_digit());

    digits(base, 5) && plus_four.map(|ext| digits(ext, 4)).unwrap_or(true)
}
