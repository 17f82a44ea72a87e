//! In-memory doubles for exercising flows without a database.

use std::collections::HashMap;

use chrono::Utc;
use tokio::sync::RwLock;

use automarket_core::domain::catalog::{Brand, BrandId, Car, CarDetail, CarId, Manager};
use automarket_core::domain::lead::{LeadDraft, LeadId, LeadStatus, SellLead};
use automarket_core::domain::user::ChatId;
use automarket_core::flows::SellSession;
use automarket_core::i18n::Lang;

use super::{CatalogReader, LeadStore, RepositoryError, SessionStore, UserStore};

#[derive(Default)]
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<i64, SellSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, chat_id: ChatId) -> Result<Option<SellSession>, RepositoryError> {
        Ok(self.sessions.read().await.get(&chat_id.0).cloned())
    }

    async fn put(&self, chat_id: ChatId, session: &SellSession) -> Result<(), RepositoryError> {
        self.sessions.write().await.insert(chat_id.0, session.clone());
        Ok(())
    }

    async fn clear(&self, chat_id: ChatId) -> Result<(), RepositoryError> {
        self.sessions.write().await.remove(&chat_id.0);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryLeadStore {
    leads: RwLock<Vec<SellLead>>,
}

impl InMemoryLeadStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn all(&self) -> Vec<SellLead> {
        self.leads.read().await.clone()
    }
}

#[async_trait::async_trait]
impl LeadStore for InMemoryLeadStore {
    async fn insert(&self, draft: &LeadDraft) -> Result<LeadId, RepositoryError> {
        draft.validate()?;

        let mut leads = self.leads.write().await;
        let id = LeadId(leads.len() as i64 + 1);
        leads.push(SellLead {
            id,
            lang: draft.lang,
            full_name: draft.full_name.clone(),
            phone: draft.phone.clone(),
            brand_text: draft.brand_text.clone(),
            model_text: draft.model_text.clone(),
            year: draft.year.clone(),
            color: draft.color.clone(),
            price_wanted: draft.price_wanted.clone(),
            condition: draft.condition.clone(),
            created_at: Utc::now(),
            status: LeadStatus::New,
        });
        Ok(id)
    }

    async fn recent(&self, limit: i64) -> Result<Vec<SellLead>, RepositoryError> {
        let leads = self.leads.read().await;
        Ok(leads.iter().rev().take(limit.max(0) as usize).cloned().collect())
    }

    async fn set_status(&self, id: LeadId, status: LeadStatus) -> Result<bool, RepositoryError> {
        let mut leads = self.leads.write().await;
        match leads.iter_mut().find(|lead| lead.id == id) {
            Some(lead) => {
                lead.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Lead store whose writes always fail, for exercising the save-error path.
#[derive(Default)]
pub struct FailingLeadStore;

#[async_trait::async_trait]
impl LeadStore for FailingLeadStore {
    async fn insert(&self, _draft: &LeadDraft) -> Result<LeadId, RepositoryError> {
        Err(RepositoryError::Decode("simulated storage failure".to_string()))
    }

    async fn recent(&self, _limit: i64) -> Result<Vec<SellLead>, RepositoryError> {
        Err(RepositoryError::Decode("simulated storage failure".to_string()))
    }

    async fn set_status(&self, _id: LeadId, _status: LeadStatus) -> Result<bool, RepositoryError> {
        Err(RepositoryError::Decode("simulated storage failure".to_string()))
    }
}

#[derive(Default)]
pub struct InMemoryUserStore {
    langs: RwLock<HashMap<i64, Lang>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl UserStore for InMemoryUserStore {
    async fn lang_or_default(&self, chat_id: ChatId) -> Result<Lang, RepositoryError> {
        let mut langs = self.langs.write().await;
        Ok(*langs.entry(chat_id.0).or_default())
    }

    async fn set_lang(&self, chat_id: ChatId, lang: Lang) -> Result<(), RepositoryError> {
        self.langs.write().await.insert(chat_id.0, lang);
        Ok(())
    }
}

#[derive(Default)]
pub struct InMemoryCatalogReader {
    brands: Vec<Brand>,
    cars: Vec<Car>,
    details: HashMap<i64, CarDetail>,
    managers: Vec<Manager>,
}

impl InMemoryCatalogReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_brand(mut self, brand: Brand) -> Self {
        self.brands.push(brand);
        self
    }

    pub fn with_car(mut self, car: Car) -> Self {
        self.cars.push(car);
        self
    }

    pub fn with_detail(mut self, detail: CarDetail) -> Self {
        self.details.insert(detail.car.id.0, detail);
        self
    }

    pub fn with_manager(mut self, manager: Manager) -> Self {
        self.managers.push(manager);
        self
    }
}

#[async_trait::async_trait]
impl CatalogReader for InMemoryCatalogReader {
    async fn brands(&self) -> Result<Vec<Brand>, RepositoryError> {
        Ok(self.brands.clone())
    }

    async fn cars_of_brand(&self, brand_id: BrandId) -> Result<Vec<Car>, RepositoryError> {
        Ok(self
            .cars
            .iter()
            .filter(|car| car.brand_id == brand_id && car.active)
            .cloned()
            .collect())
    }

    async fn car_detail(&self, car_id: CarId) -> Result<Option<CarDetail>, RepositoryError> {
        Ok(self.details.get(&car_id.0).cloned())
    }

    async fn active_managers(&self) -> Result<Vec<Manager>, RepositoryError> {
        Ok(self.managers.iter().filter(|manager| manager.active).cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use automarket_core::domain::lead::{LeadDraft, LeadStatus};
    use automarket_core::domain::user::ChatId;
    use automarket_core::i18n::Lang;

    use super::{FailingLeadStore, InMemoryLeadStore, InMemoryUserStore};
    use crate::repositories::{LeadStore, RepositoryError, UserStore};

    fn draft() -> LeadDraft {
        LeadDraft {
            lang: Lang::Ru,
            full_name: "Алишер".to_string(),
            phone: "+998901234567".to_string(),
            brand_text: "Chevrolet".to_string(),
            model_text: "Cobalt".to_string(),
            year: "2020".to_string(),
            color: "белый".to_string(),
            price_wanted: "150 млн".to_string(),
            condition: "отличное".to_string(),
        }
    }

    #[tokio::test]
    async fn memory_lead_store_mirrors_sql_semantics() {
        let store = InMemoryLeadStore::new();

        let first = store.insert(&draft()).await.expect("insert");
        let second = store.insert(&draft()).await.expect("insert");
        assert_ne!(first, second);

        let recent = store.recent(1).await.expect("recent");
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, second);

        assert!(store.set_status(first, LeadStatus::Closed).await.expect("set status"));
        let all = store.all().await;
        assert_eq!(all[0].status, LeadStatus::Closed);
    }

    #[tokio::test]
    async fn failing_lead_store_rejects_every_write() {
        let store = FailingLeadStore;
        let error = store.insert(&draft()).await.expect_err("insert should fail");
        assert!(matches!(error, RepositoryError::Decode(_)));
    }

    #[tokio::test]
    async fn user_store_defaults_to_russian() {
        let store = InMemoryUserStore::new();
        assert_eq!(store.lang_or_default(ChatId(1)).await.expect("lookup"), Lang::Ru);
        store.set_lang(ChatId(1), Lang::Uz).await.expect("set");
        assert_eq!(store.lang_or_default(ChatId(1)).await.expect("lookup"), Lang::Uz);
    }
}
