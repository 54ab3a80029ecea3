/// Directory service - registration and lookup of users and groups
use crate::error::{AppError, Result};
use crate::models::{Group, NewGroup, NewUser, User};
use crate::store::ContentStore;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

#[derive(Clone)]
pub struct Directory {
    store: Arc<dyn ContentStore>,
}

impl Directory {
    pub fn new(store: Arc<dyn ContentStore>) -> Self {
        Self { store }
    }

    pub async fn register_user(&self, new_user: &NewUser) -> Result<User> {
        new_user.validate()?;
        let user = self.store.create_user(&new_user.username).await?;
        info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user)
    }

    pub async fn create_group(&self, new_group: &NewGroup) -> Result<Group> {
        new_group.validate()?;
        let group = self.store.create_group(new_group).await?;
        info!(group_id = group.id, slug = %group.slug, "Group created");
        Ok(group)
    }

    pub async fn user(&self, user_id: Uuid) -> Result<User> {
        self.store
            .find_user_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("user {}", user_id)))
    }
}
