use sea_orm::DatabaseConnection;

use crate::{
    auth::AuthState,
    db::dao::DaoContext,
    services::{
        auth_service::AuthService, cart_service::CartService, catalog_service::CatalogService,
        profile_service::ProfileService,
    },
    state::AppState,
};

#[derive(Clone)]
pub struct ServiceContext {
    daos: DaoContext,
}

impl ServiceContext {
    pub fn new(db: &DatabaseConnection) -> Self {
        Self {
            daos: DaoContext::new(db),
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(&state.db)
    }

    pub fn auth<'a>(&self, auth: &'a AuthState) -> AuthService<'a> {
        AuthService::new(self.daos.user(), auth)
    }

    pub fn catalog(&self) -> CatalogService {
        CatalogService::new(self.daos.listing(), self.daos.category())
    }

    pub fn cart(&self) -> CartService {
        CartService::new(self.daos.cart())
    }

    pub fn profile(&self) -> ProfileService {
        ProfileService::new(
            self.daos.user(),
            self.daos.listing(),
            self.daos.cart(),
            self.daos.rating(),
        )
    }
}
