use serde::{Serialize, Deserialize};
use sea_orm::entity::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum PropertyCategory {
    #[sea_orm(string_value = "buy")]
    Buy,
    #[sea_orm(string_value = "rent")]
    Rent,
    // Seule catégorie réservable par dates
    #[sea_orm(string_value = "shortlet")]
    Shortlet,
}

impl PropertyCategory {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "buy" => Some(PropertyCategory::Buy),
            "rent" => Some(PropertyCategory::Rent),
            "shortlet" => Some(PropertyCategory::Shortlet),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "properties")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub category: PropertyCategory,
    pub price: Decimal, // par nuit pour un shortlet
    pub currency: String,
    pub address: String,
    pub area: String,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub furnished: bool,
    pub party_allowed: bool,
    pub instant_book: bool,
    pub owner_id: Option<Uuid>,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::property_images::Entity")]
    Images,

    #[sea_orm(has_many = "super::bookings::Entity")]
    Bookings,
}

impl Related<super::property_images::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Images.def()
    }
}

impl Related<super::bookings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bookings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
