use sea_orm::DatabaseConnection;

use crate::{auth::TokenService, db::dao::DaoContext, services::UserService, state::AppState};

#[derive(Clone)]
pub struct ServiceContext {
    daos: DaoContext,
    tokens: TokenService,
}

impl ServiceContext {
    pub fn new(db: &DatabaseConnection, tokens: TokenService) -> Self {
        Self {
            daos: DaoContext::new(db),
            tokens,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(&state.db, state.tokens.clone())
    }

    pub fn user(&self) -> UserService {
        UserService::new(self.daos.user(), self.daos.province(), self.tokens.clone())
    }
}
