use sea_orm::sea_query::Expr;
use sea_orm::*;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::dto::{PageQuery, UserPage, UserResponse};
use crate::models::{bookings, email_verifications, users};

const DEFAULT_PAGE_SIZE: u64 = 10;
const MAX_PAGE_SIZE: u64 = 100;

pub struct UserService;

impl UserService {
    /// Liste paginée des utilisateurs (plus récents d'abord)
    pub async fn list_users(db: &DatabaseConnection, query: PageQuery) -> Result<UserPage, ApiError> {
        let page = query.page.filter(|p| *p >= 1).unwrap_or(1);
        let limit = query
            .limit
            .filter(|l| *l >= 1)
            .unwrap_or(DEFAULT_PAGE_SIZE)
            .min(MAX_PAGE_SIZE);

        let paginator = users::Entity::find()
            .order_by_desc(users::Column::CreatedAt)
            .order_by_asc(users::Column::Id)
            .paginate(db, limit);

        // Au-delà de la dernière page : liste vide, sans calcul d'offset
        let total = paginator.num_items().await?;
        let users = if page <= total.div_ceil(limit) {
            paginator.fetch_page(page - 1).await?
        } else {
            Vec::new()
        };

        Ok(UserPage {
            page,
            limit,
            total,
            users: users.into_iter().map(UserResponse::from).collect(),
        })
    }

    pub async fn get_user(db: &DatabaseConnection, id: Uuid) -> Result<UserResponse, ApiError> {
        users::Entity::find_by_id(id)
            .one(db)
            .await?
            .map(UserResponse::from)
            .ok_or_else(|| ApiError::not_found("user not found"))
    }

    /// Suppression : code de vérification supprimé, réservations détachées
    pub async fn delete_user(db: &DatabaseConnection, id: Uuid) -> Result<(), ApiError> {
        let txn = db.begin().await?;

        let user = users::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or_else(|| ApiError::not_found("user not found"))?;

        bookings::Entity::update_many()
            .col_expr(bookings::Column::UserId, Expr::value(Option::<Uuid>::None))
            .filter(bookings::Column::UserId.eq(user.id))
            .exec(&txn)
            .await?;
        email_verifications::Entity::delete_by_id(user.email.clone())
            .exec(&txn)
            .await?;
        user.delete(&txn).await?;

        txn.commit().await?;

        tracing::info!(user_id = %id, "user deleted");
        Ok(())
    }
}
