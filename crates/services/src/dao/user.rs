use async_trait::async_trait;
use bson::{DateTime, doc, oid::ObjectId};
use mongodb::Database;
use traino_db::models::{NotificationPrefs, Role, User};

use super::base::{BaseDao, DaoError, DaoResult};
use crate::notify::{Recipient, RecipientSource};

pub struct UserDao {
    pub base: BaseDao<User>,
}

impl UserDao {
    pub fn new(db: &Database) -> Self {
        Self {
            base: BaseDao::new(db, User::COLLECTION),
        }
    }

    pub async fn create(
        &self,
        email: String,
        full_name: String,
        contact_number: Option<String>,
        role: Role,
    ) -> DaoResult<User> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(DaoError::Validation("A valid email is required".to_string()));
        }
        let full_name = full_name.trim().to_string();
        if full_name.is_empty() {
            return Err(DaoError::Validation("full_name must not be empty".to_string()));
        }

        let now = DateTime::now();
        let user = User {
            id: None,
            email,
            full_name,
            contact_number,
            role,
            is_active: true,
            notification_preferences: NotificationPrefs::default(),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        let id = self.base.insert_one(&user).await?;
        self.base.find_by_id(id).await
    }

    pub async fn soft_delete(&self, id: ObjectId) -> DaoResult<bool> {
        self.base.soft_delete(id).await
    }
}

#[async_trait]
impl RecipientSource for UserDao {
    async fn resolve(&self, id: ObjectId) -> DaoResult<Option<Recipient>> {
        let user = self
            .base
            .find_one(doc! { "_id": id, "deleted_at": null })
            .await?;

        Ok(user.map(|u| Recipient {
            name: u.full_name,
            email: u.email,
            contact_number: u.contact_number,
            preferences: u.notification_preferences,
        }))
    }
}
