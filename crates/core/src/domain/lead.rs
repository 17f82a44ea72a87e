use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::DomainError;
use crate::flows::is_plausible_phone;
use crate::i18n::Lang;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LeadId(pub i64);

/// One answer slot of the sell questionnaire. The phone is collected last and
/// carried separately on [`LeadDraft`] because it is the only validated field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeadField {
    Brand,
    Model,
    Year,
    Color,
    Price,
    Condition,
    Name,
}

impl LeadField {
    pub fn column(self) -> &'static str {
        match self {
            Self::Brand => "brand_text",
            Self::Model => "model_text",
            Self::Year => "year",
            Self::Color => "color",
            Self::Price => "price_wanted",
            Self::Condition => "condition",
            Self::Name => "full_name",
        }
    }
}

/// A completed questionnaire ready for persistence. `created_at` and the
/// initial `new` status are stamped by the store on insert.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadDraft {
    pub lang: Lang,
    pub full_name: String,
    pub phone: String,
    pub brand_text: String,
    pub model_text: String,
    pub year: String,
    pub color: String,
    pub price_wanted: String,
    pub condition: String,
}

impl LeadDraft {
    pub fn validate(&self) -> Result<(), DomainError> {
        let fields: [(&'static str, &str); 8] = [
            ("full_name", &self.full_name),
            ("phone", &self.phone),
            ("brand_text", &self.brand_text),
            ("model_text", &self.model_text),
            ("year", &self.year),
            ("color", &self.color),
            ("price_wanted", &self.price_wanted),
            ("condition", &self.condition),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(DomainError::EmptyLeadField(name));
            }
        }
        if !is_plausible_phone(&self.phone) {
            return Err(DomainError::InvalidPhone(self.phone.clone()));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeadStatus {
    New,
    Contacted,
    Closed,
}

impl LeadStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::Contacted => "contacted",
            Self::Closed => "closed",
        }
    }
}

impl std::str::FromStr for LeadStatus {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "new" => Ok(Self::New),
            "contacted" => Ok(Self::Contacted),
            "closed" => Ok(Self::Closed),
            other => Err(DomainError::UnknownLeadStatus(other.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellLead {
    pub id: LeadId,
    pub lang: Lang,
    pub full_name: String,
    pub phone: String,
    pub brand_text: String,
    pub model_text: String,
    pub year: String,
    pub color: String,
    pub price_wanted: String,
    pub condition: String,
    pub created_at: DateTime<Utc>,
    pub status: LeadStatus,
}

impl SellLead {
    /// Human-readable summary sent to staff when a lead is captured.
    pub fn notification_text(draft: &LeadDraft, leads_url: &str) -> String {
        format!(
            "📝 <b>Новая заявка</b>\n👤 {}\n📞 <code>{}</code>\n🚗 {} {}\n📅 {} • 🎨 {}\n💰 {}\n🧰 {}\n🌐 {}",
            draft.full_name,
            draft.phone,
            draft.brand_text,
            draft.model_text,
            draft.year,
            draft.color,
            draft.price_wanted,
            draft.condition,
            leads_url,
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::errors::DomainError;
    use crate::i18n::Lang;

    use super::{LeadDraft, LeadStatus, SellLead};

    fn draft() -> LeadDraft {
        LeadDraft {
            lang: Lang::Ru,
            full_name: "Алишер".to_string(),
            phone: "+998901234567".to_string(),
            brand_text: "Chevrolet".to_string(),
            model_text: "Cobalt".to_string(),
            year: "2020".to_string(),
            color: "белый".to_string(),
            price_wanted: "150000000".to_string(),
            condition: "отличное".to_string(),
        }
    }

    #[test]
    fn complete_draft_validates() {
        draft().validate().expect("complete draft should validate");
    }

    #[test]
    fn blank_answer_is_rejected() {
        let mut incomplete = draft();
        incomplete.color = "   ".to_string();
        let error = incomplete.validate().expect_err("blank color should fail");
        assert_eq!(error, DomainError::EmptyLeadField("color"));
    }

    #[test]
    fn implausible_phone_is_rejected() {
        let mut bad = draft();
        bad.phone = "call me".to_string();
        let error = bad.validate().expect_err("non-numeric phone should fail");
        assert!(matches!(error, DomainError::InvalidPhone(_)));
    }

    #[test]
    fn lead_status_round_trips_through_strings() {
        for status in [LeadStatus::New, LeadStatus::Contacted, LeadStatus::Closed] {
            assert_eq!(status.as_str().parse::<LeadStatus>().expect("parse"), status);
        }
        assert!("done".parse::<LeadStatus>().is_err());
    }

    #[test]
    fn notification_text_carries_every_answer() {
        let text = SellLead::notification_text(&draft(), "https://example.com/admin/leads");
        for needle in
            ["Алишер", "+998901234567", "Chevrolet Cobalt", "2020", "белый", "150000000", "отличное"]
        {
            assert!(text.contains(needle), "missing `{needle}` in notification");
        }
        assert!(text.contains("https://example.com/admin/leads"));
    }
}
