use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::*;
use uuid::Uuid;

use crate::error::ApiError;
use crate::models::dto::{CreatePropertyRequest, PropertyFilter, PropertyWithImages, UpdatePropertyRequest};
use crate::models::properties::{self, PropertyCategory};
use crate::models::{bookings, property_images};
use crate::services::availability::{self, StayRange};

/// Nombre maximum de logements renvoyés par le listing
pub const LIST_LIMIT: u64 = 100;
const DEFAULT_CURRENCY: &str = "NGN";

pub struct PropertyService;

impl PropertyService {
    /// Listing filtré ; avec checkin + checkout, exclut les logements occupés
    pub async fn list_properties(
        db: &DatabaseConnection,
        filter: PropertyFilter,
    ) -> Result<Vec<PropertyWithImages>, ApiError> {
        let mut query = properties::Entity::find();

        if let Some(category) = non_empty(&filter.category) {
            let category = PropertyCategory::parse(category)
                .ok_or_else(|| ApiError::validation("invalid category; use buy, rent or shortlet"))?;
            query = query.filter(properties::Column::Category.eq(category));
        }
        if let Some(area) = non_empty(&filter.area) {
            query = query.filter(properties::Column::Area.eq(area));
        }
        if let Some(min_beds) = filter.min_beds {
            query = query.filter(properties::Column::Bedrooms.gte(min_beds));
        }

        // Disponibilité : même prédicat que la réservation
        if let (Some(checkin), Some(checkout)) = (non_empty(&filter.checkin), non_empty(&filter.checkout)) {
            let range = parse_range(checkin, checkout)?;
            query = query.filter(
                properties::Column::Id.not_in_subquery(availability::unavailable_property_ids(&range)),
            );
        }

        let found = query
            .order_by_desc(properties::Column::CreatedAt)
            .limit(LIST_LIMIT)
            .all(db)
            .await?;

        Self::with_images(db, found).await
    }

    pub async fn get_property(db: &DatabaseConnection, id: Uuid) -> Result<PropertyWithImages, ApiError> {
        let property = properties::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ApiError::not_found("property not found"))?;

        let mut listed = Self::with_images(db, vec![property]).await?;
        listed.pop().ok_or_else(|| ApiError::internal("property vanished while loading images"))
    }

    /// Création (admin) avec images optionnelles, dans une transaction
    pub async fn create_property(
        db: &DatabaseConnection,
        request: CreatePropertyRequest,
    ) -> Result<PropertyWithImages, ApiError> {
        ensure_price(request.price)?;
        let now = Utc::now();

        let txn = db.begin().await?;

        let property = properties::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(request.title),
            description: Set(request.description),
            category: Set(request.category),
            price: Set(request.price),
            currency: Set(request
                .currency
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| DEFAULT_CURRENCY.to_string())),
            address: Set(request.address),
            area: Set(request.area),
            bedrooms: Set(request.bedrooms),
            bathrooms: Set(request.bathrooms),
            furnished: Set(request.furnished),
            party_allowed: Set(request.party_allowed),
            instant_book: Set(request.instant_book),
            owner_id: Set(request.owner_id),
            created_at: Set(now),
            updated_at: Set(now),
        }
            .insert(&txn)
            .await?;

        let mut images = Vec::with_capacity(request.images.len());
        for (position, image) in request.images.into_iter().enumerate() {
            let position = i32::try_from(position).map_err(|_| ApiError::validation("too many images"))?;
            let image = property_images::ActiveModel {
                id: Set(Uuid::new_v4()),
                property_id: Set(property.id),
                url: Set(image.url),
                alt_text: Set(image.alt_text),
                position: Set(position),
                created_at: Set(now),
            }
                .insert(&txn)
                .await?;
            images.push(image);
        }

        txn.commit().await?;

        tracing::info!(property_id = %property.id, "property created");
        Ok(PropertyWithImages { property, images })
    }

    /// Mise à jour partielle (admin)
    pub async fn update_property(
        db: &DatabaseConnection,
        id: Uuid,
        request: UpdatePropertyRequest,
    ) -> Result<PropertyWithImages, ApiError> {
        let property = properties::Entity::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| ApiError::not_found("property not found"))?;

        let mut active: properties::ActiveModel = property.into();
        if let Some(title) = request.title {
            active.title = Set(title);
        }
        if let Some(description) = request.description {
            active.description = Set(description);
        }
        if let Some(category) = request.category {
            active.category = Set(category);
        }
        if let Some(price) = request.price {
            ensure_price(price)?;
            active.price = Set(price);
        }
        if let Some(currency) = request.currency {
            active.currency = Set(currency);
        }
        if let Some(address) = request.address {
            active.address = Set(address);
        }
        if let Some(area) = request.area {
            active.area = Set(area);
        }
        if let Some(bedrooms) = request.bedrooms {
            active.bedrooms = Set(bedrooms);
        }
        if let Some(bathrooms) = request.bathrooms {
            active.bathrooms = Set(bathrooms);
        }
        if let Some(furnished) = request.furnished {
            active.furnished = Set(furnished);
        }
        if let Some(party_allowed) = request.party_allowed {
            active.party_allowed = Set(party_allowed);
        }
        if let Some(instant_book) = request.instant_book {
            active.instant_book = Set(instant_book);
        }
        active.updated_at = Set(Utc::now());

        let property = active.update(db).await?;
        let mut listed = Self::with_images(db, vec![property]).await?;
        listed.pop().ok_or_else(|| ApiError::internal("property vanished while loading images"))
    }

    /// Suppression (admin) : images supprimées avec le logement ; refusée s'il
    /// reste des réservations qui le référencent
    pub async fn delete_property(db: &DatabaseConnection, id: Uuid) -> Result<(), ApiError> {
        let txn = db.begin().await?;

        let property = properties::Entity::find_by_id(id)
            .lock_exclusive()
            .one(&txn)
            .await?
            .ok_or_else(|| ApiError::not_found("property not found"))?;

        let booking_count = bookings::Entity::find()
            .filter(bookings::Column::PropertyId.eq(property.id))
            .count(&txn)
            .await?;
        if booking_count > 0 {
            txn.rollback().await?;
            return Err(ApiError::conflict("property has bookings and cannot be deleted"));
        }

        property_images::Entity::delete_many()
            .filter(property_images::Column::PropertyId.eq(property.id))
            .exec(&txn)
            .await?;
        property.delete(&txn).await?;

        txn.commit().await?;

        tracing::info!(property_id = %id, "property deleted");
        Ok(())
    }

    async fn with_images(
        db: &DatabaseConnection,
        found: Vec<properties::Model>,
    ) -> Result<Vec<PropertyWithImages>, ApiError> {
        let images = found.load_many(property_images::Entity, db).await?;

        Ok(found
            .into_iter()
            .zip(images)
            .map(|(property, mut images)| {
                images.sort_by_key(|image| image.position);
                PropertyWithImages { property, images }
            })
            .collect())
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn ensure_price(price: Decimal) -> Result<(), ApiError> {
    if price.is_sign_negative() {
        return Err(ApiError::validation("price cannot be negative"));
    }
    Ok(())
}

fn parse_range(checkin: &str, checkout: &str) -> Result<StayRange, ApiError> {
    let checkin = NaiveDate::parse_from_str(checkin, "%Y-%m-%d")
        .map_err(|_| ApiError::validation("invalid checkin date; use YYYY-MM-DD"))?;
    let checkout = NaiveDate::parse_from_str(checkout, "%Y-%m-%d")
        .map_err(|_| ApiError::validation("invalid checkout date; use YYYY-MM-DD"))?;
    StayRange::new(checkin, checkout).ok_or_else(|| ApiError::validation("checkout must be after checkin"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::db::test_support::{memory_db, verified_user};
    use crate::models::users::UserRole;
    use crate::models::dto::{CreateBookingRequest, ImageInput};
    use crate::services::booking_service::BookingService;
    use std::str::FromStr;

    fn shortlet(title: &str, area: &str, bedrooms: i32) -> CreatePropertyRequest {
        CreatePropertyRequest {
            title: title.to_string(),
            description: String::new(),
            category: PropertyCategory::Shortlet,
            price: Decimal::from_str("90.00").unwrap(),
            currency: None,
            address: String::new(),
            area: area.to_string(),
            bedrooms,
            bathrooms: 1,
            furnished: true,
            party_allowed: false,
            instant_book: true,
            owner_id: None,
            images: vec![],
        }
    }

    fn dates(checkin: &str, checkout: &str) -> PropertyFilter {
        PropertyFilter {
            checkin: Some(checkin.to_string()),
            checkout: Some(checkout.to_string()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_create_with_images_in_order() {
        let db = memory_db().await;
        let mut request = shortlet("Ikoyi loft", "Ikoyi", 1);
        request.images = vec![
            ImageInput { url: "https://img/1.jpg".to_string(), alt_text: "front".to_string() },
            ImageInput { url: "https://img/2.jpg".to_string(), alt_text: "room".to_string() },
        ];

        let created = PropertyService::create_property(&db, request).await.unwrap();
        assert_eq!(created.property.currency, "NGN");

        let fetched = PropertyService::get_property(&db, created.property.id).await.unwrap();
        let urls: Vec<_> = fetched.images.iter().map(|i| i.url.as_str()).collect();
        assert_eq!(urls, ["https://img/1.jpg", "https://img/2.jpg"]);
    }

    #[tokio::test]
    async fn test_filters() {
        let db = memory_db().await;
        PropertyService::create_property(&db, shortlet("A", "Lekki", 1)).await.unwrap();
        PropertyService::create_property(&db, shortlet("B", "Lekki", 3)).await.unwrap();
        let mut rent = shortlet("C", "Yaba", 3);
        rent.category = PropertyCategory::Rent;
        PropertyService::create_property(&db, rent).await.unwrap();

        let lekki = PropertyService::list_properties(&db, PropertyFilter {
            area: Some("Lekki".to_string()),
            ..Default::default()
        })
            .await
            .unwrap();
        assert_eq!(lekki.len(), 2);

        let big_shortlets = PropertyService::list_properties(&db, PropertyFilter {
            category: Some("shortlet".to_string()),
            min_beds: Some(2),
            ..Default::default()
        })
            .await
            .unwrap();
        assert_eq!(big_shortlets.len(), 1);
        assert_eq!(big_shortlets[0].property.title, "B");

        let err = PropertyService::list_properties(&db, PropertyFilter {
            category: Some("castle".to_string()),
            ..Default::default()
        })
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn test_availability_filter_matches_booking_rule() {
        let db = memory_db().await;
        let config = AppConfig::for_tests();
        let booked = PropertyService::create_property(&db, shortlet("Booked", "Lekki", 2)).await.unwrap();
        let free = PropertyService::create_property(&db, shortlet("Free", "Lekki", 2)).await.unwrap();

        let guest = verified_user(&db, UserRole::User).await.id;
        BookingService::create_booking(&db, &config, guest, CreateBookingRequest {
            property_id: booked.property.id.to_string(),
            checkin: "2024-06-01".to_string(),
            checkout: "2024-06-05".to_string(),
            guests: 1,
        })
            .await
            .unwrap();

        let overlapping = PropertyService::list_properties(&db, dates("2024-06-03", "2024-06-07")).await.unwrap();
        let ids: Vec<_> = overlapping.iter().map(|p| p.property.id).collect();
        assert_eq!(ids, vec![free.property.id]);

        // départ le jour de l'arrivée : disponible
        let back_to_back = PropertyService::list_properties(&db, dates("2024-06-05", "2024-06-08")).await.unwrap();
        assert_eq!(back_to_back.len(), 2);

        let err = PropertyService::list_properties(&db, dates("2024-06-05", "2024-06-01")).await.unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));
    }

    #[tokio::test]
    async fn test_partial_update() {
        let db = memory_db().await;
        let created = PropertyService::create_property(&db, shortlet("Old", "Lekki", 2)).await.unwrap();

        let updated = PropertyService::update_property(&db, created.property.id, UpdatePropertyRequest {
            title: Some("New".to_string()),
            price: Some(Decimal::from(120)),
            ..Default::default()
        })
            .await
            .unwrap();

        assert_eq!(updated.property.title, "New");
        assert_eq!(updated.property.price, Decimal::from(120));
        assert_eq!(updated.property.area, "Lekki");

        let err = PropertyService::update_property(&db, Uuid::new_v4(), UpdatePropertyRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_cascades_images_and_refuses_booked() {
        let db = memory_db().await;
        let config = AppConfig::for_tests();
        let mut request = shortlet("Gone", "Lekki", 2);
        request.images = vec![ImageInput { url: "https://img/x.jpg".to_string(), alt_text: String::new() }];
        let gone = PropertyService::create_property(&db, request).await.unwrap();

        PropertyService::delete_property(&db, gone.property.id).await.unwrap();
        let remaining = property_images::Entity::find()
            .filter(property_images::Column::PropertyId.eq(gone.property.id))
            .count(&db)
            .await
            .unwrap();
        assert_eq!(remaining, 0);
        assert!(matches!(
            PropertyService::delete_property(&db, gone.property.id).await,
            Err(ApiError::NotFound(_))
        ));

        let kept = PropertyService::create_property(&db, shortlet("Kept", "Lekki", 2)).await.unwrap();
        let guest = verified_user(&db, UserRole::User).await.id;
        BookingService::create_booking(&db, &config, guest, CreateBookingRequest {
            property_id: kept.property.id.to_string(),
            checkin: "2024-09-01".to_string(),
            checkout: "2024-09-03".to_string(),
            guests: 1,
        })
            .await
            .unwrap();

        assert!(matches!(
            PropertyService::delete_property(&db, kept.property.id).await,
            Err(ApiError::Conflict(_))
        ));
    }
}
