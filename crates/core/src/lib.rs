pub mod config;
pub mod domain;
pub mod errors;
pub mod flows;
pub mod i18n;
pub mod money;

pub use domain::catalog::{
    Brand, BrandId, Car, CarDetail, CarId, CarPhoto, CarSummary, Manager, ManagerId,
    PriceCategory, PriceCategoryId,
};
pub use domain::lead::{LeadDraft, LeadField, LeadId, LeadStatus, SellLead};
pub use domain::user::{BotUser, ChatId};
pub use errors::{ApplicationError, DomainError};
pub use flows::{is_plausible_phone, transition, SellEffect, SellEvent, SellSession, SellStep};
pub use i18n::{lookup, text, Lang, MessageKey};
pub use money::format_price;
