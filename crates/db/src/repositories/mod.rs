use async_trait::async_trait;
use thiserror::Error;

use automarket_core::domain::catalog::{Brand, BrandId, Car, CarDetail, CarId, Manager};
use automarket_core::domain::lead::{LeadDraft, LeadId, LeadStatus, SellLead};
use automarket_core::domain::user::ChatId;
use automarket_core::errors::DomainError;
use automarket_core::flows::SellSession;
use automarket_core::i18n::Lang;

pub mod admin_session;
pub mod catalog;
pub mod lead;
pub mod memory;
pub mod session;
pub mod user;

pub use admin_session::SqlAdminSessionRepository;
pub use catalog::{NewCar, SqlCatalogRepository};
pub use lead::SqlLeadRepository;
pub use memory::{
    FailingLeadStore, InMemoryCatalogReader, InMemoryLeadStore, InMemorySessionStore,
    InMemoryUserStore,
};
pub use session::SqlSessionRepository;
pub use user::SqlUserRepository;

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("decode error: {0}")]
    Decode(String),
    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Per-chat questionnaire state. `put` overwrites any previous snapshot for
/// the chat; `clear` is idempotent.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, chat_id: ChatId) -> Result<Option<SellSession>, RepositoryError>;
    async fn put(&self, chat_id: ChatId, session: &SellSession) -> Result<(), RepositoryError>;
    async fn clear(&self, chat_id: ChatId) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait LeadStore: Send + Sync {
    async fn insert(&self, draft: &LeadDraft) -> Result<LeadId, RepositoryError>;
    async fn recent(&self, limit: i64) -> Result<Vec<SellLead>, RepositoryError>;
    async fn set_status(&self, id: LeadId, status: LeadStatus) -> Result<bool, RepositoryError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Returns the stored language for the chat, creating the row with the
    /// default language on first contact.
    async fn lang_or_default(&self, chat_id: ChatId) -> Result<Lang, RepositoryError>;
    async fn set_lang(&self, chat_id: ChatId, lang: Lang) -> Result<(), RepositoryError>;
}

#[async_trait]
pub trait CatalogReader: Send + Sync {
    async fn brands(&self) -> Result<Vec<Brand>, RepositoryError>;
    async fn cars_of_brand(&self, brand_id: BrandId) -> Result<Vec<Car>, RepositoryError>;
    async fn car_detail(&self, car_id: CarId) -> Result<Option<CarDetail>, RepositoryError>;
    async fn active_managers(&self) -> Result<Vec<Manager>, RepositoryError>;
}
