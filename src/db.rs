// connexion BD + création du schéma

use sea_orm::{ConnectionTrait, Database, DatabaseConnection, DbErr, EntityTrait, Schema};

use crate::config::AppConfig;
use crate::models::{bookings, email_verifications, properties, property_images, users};

pub async fn establish_connection(config: &AppConfig) -> Result<DatabaseConnection, DbErr> {
    Database::connect(&config.database_url).await
}

/// Crée les tables manquantes à partir des entités (ordre des clés étrangères)
pub async fn sync_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    create_table(db, users::Entity).await?;
    create_table(db, email_verifications::Entity).await?;
    create_table(db, properties::Entity).await?;
    create_table(db, property_images::Entity).await?;
    create_table(db, bookings::Entity).await?;
    Ok(())
}

async fn create_table<E: EntityTrait>(db: &DatabaseConnection, entity: E) -> Result<(), DbErr> {
    let backend = db.get_database_backend();
    let schema = Schema::new(backend);
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(backend.build(&statement)).await?;
    Ok(())
}

#[cfg(test)]
pub mod test_support {
    use chrono::Utc;
    use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
    use uuid::Uuid;

    use crate::models::users::{self, UserRole};

    /// Base SQLite en mémoire, une seule connexion (les transactions concurrentes
    /// attendent donc la libération de la connexion)
    pub async fn memory_db() -> DatabaseConnection {
        let mut options = ConnectOptions::new("sqlite::memory:");
        options.max_connections(1).min_connections(1).sqlx_logging(false);

        let db = Database::connect(options).await.expect("sqlite connection");
        super::sync_schema(&db).await.expect("schema creation");
        db
    }

    /// Utilisateur vérifié inséré directement (sans passer par l'inscription)
    pub async fn verified_user(db: &DatabaseConnection, role: UserRole) -> users::Model {
        let now = Utc::now();
        users::ActiveModel {
            id: Set(Uuid::new_v4()),
            email: Set(format!("{}@example.com", Uuid::new_v4())),
            password_hash: Set("pbkdf2:sha256:1$AA$AA".to_string()),
            name: Set("Guest".to_string()),
            role: Set(role),
            is_verified: Set(true),
            expires_at: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
            .insert(db)
            .await
            .expect("user insert")
    }
}
