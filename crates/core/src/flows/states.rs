use serde::{Deserialize, Serialize};

use crate::domain::lead::{LeadDraft, LeadField};
use crate::i18n::{Lang, MessageKey};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SellStep {
    #[default]
    Idle,
    Brand,
    Model,
    Year,
    Color,
    Price,
    Condition,
    Name,
    Phone,
}

impl SellStep {
    /// The answer slot a text reply fills at this step. `Idle` consumes
    /// nothing; the phone is validated separately and never stored as a field.
    pub fn field(self) -> Option<LeadField> {
        match self {
            Self::Idle | Self::Phone => None,
            Self::Brand => Some(LeadField::Brand),
            Self::Model => Some(LeadField::Model),
            Self::Year => Some(LeadField::Year),
            Self::Color => Some(LeadField::Color),
            Self::Price => Some(LeadField::Price),
            Self::Condition => Some(LeadField::Condition),
            Self::Name => Some(LeadField::Name),
        }
    }

    /// The question asked while this step is waiting for input.
    pub fn prompt(self) -> Option<MessageKey> {
        match self {
            Self::Idle => None,
            Self::Brand => Some(MessageKey::AskBrand),
            Self::Model => Some(MessageKey::AskModel),
            Self::Year => Some(MessageKey::AskYear),
            Self::Color => Some(MessageKey::AskColor),
            Self::Price => Some(MessageKey::AskPrice),
            Self::Condition => Some(MessageKey::AskCondition),
            Self::Name => Some(MessageKey::AskName),
            Self::Phone => Some(MessageKey::AskPhone),
        }
    }

    /// Stable storage token, used by session stores.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Brand => "brand",
            Self::Model => "model",
            Self::Year => "year",
            Self::Color => "color",
            Self::Price => "price",
            Self::Condition => "condition",
            Self::Name => "name",
            Self::Phone => "phone",
        }
    }

    pub fn from_str_lenient(raw: &str) -> Option<Self> {
        match raw.trim() {
            "idle" => Some(Self::Idle),
            "brand" => Some(Self::Brand),
            "model" => Some(Self::Model),
            "year" => Some(Self::Year),
            "color" => Some(Self::Color),
            "price" => Some(Self::Price),
            "condition" => Some(Self::Condition),
            "name" => Some(Self::Name),
            "phone" => Some(Self::Phone),
            _ => None,
        }
    }

    pub fn next(self) -> SellStep {
        match self {
            Self::Idle => Self::Idle,
            Self::Brand => Self::Model,
            Self::Model => Self::Year,
            Self::Year => Self::Color,
            Self::Color => Self::Price,
            Self::Price => Self::Condition,
            Self::Condition => Self::Name,
            Self::Name => Self::Phone,
            Self::Phone => Self::Idle,
        }
    }
}

/// Per-user questionnaire state. Field entries appear in collection order and
/// only for steps already answered.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SellSession {
    pub lang: Lang,
    pub step: SellStep,
    pub fields: Vec<(LeadField, String)>,
}

impl SellSession {
    pub fn idle(lang: Lang) -> Self {
        Self { lang, step: SellStep::Idle, fields: Vec::new() }
    }

    pub fn is_active(&self) -> bool {
        self.step != SellStep::Idle
    }

    pub fn answer(&self, field: LeadField) -> Option<&str> {
        self.fields
            .iter()
            .find(|(stored, _)| *stored == field)
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SellEvent {
    Start,
    Cancel,
    Reply(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SellEffect {
    Say(MessageKey),
    CompleteLead(LeadDraft),
}
