//! SeaORM implementation of `ImportStore`

use std::collections::HashSet;

use async_trait::async_trait;
use sea_orm::sea_query::{Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, Set, TransactionTrait,
};

use super::{ImportStore, PermissionSpan};
use crate::entity::{role_offer, user_offer, user_role_offer};
use crate::import::record::{Gender, PermissionRecord, RoleRecord, UserRecord, UserStatus};

/// Database-backed store
#[derive(Clone)]
pub struct SeaOrmStore {
    db: DatabaseConnection,
}

impl SeaOrmStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

impl From<user_offer::Model> for UserRecord {
    fn from(m: user_offer::Model) -> Self {
        Self {
            id: Some(m.id),
            username: m.user_name,
            full_name: m.full_name,
            email: m.email,
            phone: m.phone,
            birth_day: m.birth_day,
            gender: m.gender.as_deref().and_then(Gender::parse),
            status: UserStatus::from(m.status.as_str()),
            created_by: m.created_by,
            created_time: m.created_time,
            updated_by: m.updated_by,
            updated_time: m.updated_time,
            permissions: Vec::new(),
        }
    }
}

impl From<role_offer::Model> for RoleRecord {
    fn from(m: role_offer::Model) -> Self {
        Self {
            id: m.id,
            name: m.role_name,
            status: m.status,
            description: m.description,
        }
    }
}

/// Insert model for a user that has not been persisted yet
pub fn new_user_model(user: &UserRecord) -> user_offer::ActiveModel {
    user_offer::ActiveModel {
        user_name: Set(user.username.clone()),
        full_name: Set(user.full_name.clone()),
        email: Set(user.email.clone()),
        phone: Set(user.phone.clone()),
        birth_day: Set(user.birth_day),
        gender: Set(user.gender.map(|g| g.as_str().to_string())),
        status: Set(user.status.as_str().to_string()),
        created_by: Set(user.created_by.clone()),
        created_time: Set(user.created_time),
        updated_by: Set(user.updated_by.clone()),
        updated_time: Set(user.updated_time),
        ..Default::default()
    }
}

/// Insert model for a permission; the owner's id is the foreign key
pub fn permission_model(user_id: i64, permission: &PermissionRecord) -> user_role_offer::ActiveModel {
    user_role_offer::ActiveModel {
        kind: Set(permission.kind.clone()),
        role_id: Set(permission.role.id),
        bank: Set(permission.bank.clone()),
        branch: Set(permission.branch.clone()),
        from_date: Set(permission.from_date),
        to_date: Set(permission.to_date),
        user_id: Set(user_id),
        ..Default::default()
    }
}

#[async_trait]
impl ImportStore for SeaOrmStore {
    async fn find_users_by_usernames(
        &self,
        usernames: &HashSet<String>,
    ) -> Result<Vec<UserRecord>, DbErr> {
        let users = user_offer::Entity::find()
            .filter(user_offer::Column::UserName.is_in(usernames.iter().cloned()))
            .all(&self.db)
            .await?;
        Ok(users.into_iter().map(UserRecord::from).collect())
    }

    async fn find_all_roles(&self) -> Result<Vec<RoleRecord>, DbErr> {
        let roles = role_offer::Entity::find().all(&self.db).await?;
        Ok(roles.into_iter().map(RoleRecord::from).collect())
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Option<RoleRecord>, DbErr> {
        let role = role_offer::Entity::find()
            .filter(
                Expr::expr(Func::upper(Expr::col(role_offer::Column::RoleName)))
                    .eq(name.trim().to_uppercase()),
            )
            .one(&self.db)
            .await?;
        Ok(role.map(RoleRecord::from))
    }

    async fn exists_duplicate_permission(&self, span: &PermissionSpan<'_>) -> Result<bool, DbErr> {
        let count = user_role_offer::Entity::find()
            .filter(user_role_offer::Column::UserId.eq(span.user_id))
            .filter(user_role_offer::Column::RoleId.eq(span.role_id))
            .filter(user_role_offer::Column::Bank.eq(span.bank))
            .filter(user_role_offer::Column::Branch.eq(span.branch))
            .filter(user_role_offer::Column::Kind.eq(span.kind))
            .filter(
                Condition::any()
                    .add(user_role_offer::Column::ToDate.is_null())
                    .add(user_role_offer::Column::ToDate.gte(span.from)),
            )
            .filter(
                Condition::any()
                    .add(user_role_offer::Column::FromDate.is_null())
                    .add(user_role_offer::Column::FromDate.lte(span.to)),
            )
            .count(&self.db)
            .await?;
        Ok(count > 0)
    }

    async fn save_all(&self, users: Vec<UserRecord>) -> Result<Vec<UserRecord>, DbErr> {
        let txn = self.db.begin().await?;
        let mut saved = Vec::with_capacity(users.len());

        for mut user in users {
            let user_id = match user.id {
                Some(id) => id,
                None => new_user_model(&user).insert(&txn).await?.id,
            };

            for permission in &user.permissions {
                permission_model(user_id, permission).insert(&txn).await?;
            }

            user.id = Some(user_id);
            saved.push(user);
        }

        txn.commit().await?;
        tracing::info!("Saved {} users", saved.len());
        Ok(saved)
    }
}
