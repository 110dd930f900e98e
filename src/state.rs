use std::sync::Arc;

use crate::auth::TokenService;
use crate::config::AppConfig;
use crate::database::Database;
use crate::services::{
    AppointmentService, FamilyMemberService, HealthRecordService, MedicationService, Pagination,
    UserService,
};

/// Shared by every handler through axum's `State` extractor
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: Database,
    pub tokens: TokenService,
}

impl AppState {
    pub fn new(config: AppConfig, db: Database) -> Self {
        let tokens = TokenService::from_config(&config.security);
        Self {
            config: Arc::new(config),
            db,
            tokens,
        }
    }

    pub fn users(&self) -> UserService {
        UserService::new(self.db.pool().clone())
    }

    pub fn family_members(&self) -> FamilyMemberService {
        FamilyMemberService::new(self.db.pool().clone())
    }

    pub fn health_records(&self) -> HealthRecordService {
        HealthRecordService::new(self.db.pool().clone())
    }

    pub fn medications(&self) -> MedicationService {
        MedicationService::new(self.db.pool().clone())
    }

    pub fn appointments(&self) -> AppointmentService {
        AppointmentService::new(self.db.pool().clone())
    }

    /// Request paging clamped to the configured limits
    pub fn page(&self, skip: Option<i64>, limit: Option<i64>) -> Pagination {
        Pagination::new(skip, limit, &self.config.api)
    }
}
