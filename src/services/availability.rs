// ============================================================================
// DISPONIBILITÉ D'UN LOGEMENT
// ============================================================================
//
// Un séjour occupe l'intervalle semi-ouvert [checkin, checkout).
// Deux séjours se chevauchent ssi NOT (a.checkout <= b.checkin OR a.checkin >= b.checkout).
// Un départ le jour d'une arrivée ne chevauche donc PAS.
//
// Le même prédicat sert :
//   - à la réservation (comptage des conflits DANS la transaction)
//   - au filtre "disponible pour ces dates" du listing (sous-requête)
//
// ============================================================================

use chrono::NaiveDate;
use sea_orm::sea_query::{Query, SelectStatement};
use sea_orm::{ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait, QueryFilter};
use uuid::Uuid;

use crate::models::bookings::{self, BookingStatus};

/// Intervalle de dates semi-ouvert [checkin, checkout), checkout > checkin garanti
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StayRange {
    checkin: NaiveDate,
    checkout: NaiveDate,
}

impl StayRange {
    pub fn new(checkin: NaiveDate, checkout: NaiveDate) -> Option<Self> {
        (checkout > checkin).then_some(Self { checkin, checkout })
    }

    pub fn checkin(&self) -> NaiveDate {
        self.checkin
    }

    pub fn checkout(&self) -> NaiveDate {
        self.checkout
    }

    /// Nombre de nuits (jours entiers entre les deux dates), toujours >= 1
    pub fn nights(&self) -> i64 {
        (self.checkout - self.checkin).num_days()
    }
}

/// Prédicat de chevauchement en mémoire (référence pour les tests du SQL)
#[cfg(test)]
pub fn ranges_overlap(a: &StayRange, b: &StayRange) -> bool {
    !(a.checkout <= b.checkin || a.checkin >= b.checkout)
}

/// Même prédicat, exprimé sur les colonnes de bookings : réservations
/// pending/confirmed qui chevauchent `range`
pub fn blocking_bookings(range: &StayRange) -> Condition {
    Condition::all()
        .add(bookings::Column::Status.is_in(BookingStatus::BLOCKING))
        .add(
            Condition::any()
                .add(bookings::Column::Checkout.lte(range.checkin))
                .add(bookings::Column::Checkin.gte(range.checkout))
                .not(),
        )
}

/// Sous-requête des property_id indisponibles sur `range` (filtre du listing)
pub fn unavailable_property_ids(range: &StayRange) -> SelectStatement {
    Query::select()
        .column(bookings::Column::PropertyId)
        .from(bookings::Entity)
        .cond_where(blocking_bookings(range))
        .to_owned()
}

/// Vérifie s'il existe un conflit pour ce logement
/// À appeler avec la transaction de la réservation pour lire le même état
pub async fn has_conflict<C: ConnectionTrait>(
    conn: &C,
    property_id: Uuid,
    range: &StayRange,
) -> Result<bool, DbErr> {
    let conflicts = bookings::Entity::find()
        .filter(bookings::Column::PropertyId.eq(property_id))
        .filter(blocking_bookings(range))
        .count(conn)
        .await?;

    Ok(conflicts > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn range(a: &str, b: &str) -> StayRange {
        StayRange::new(day(a), day(b)).unwrap()
    }

    #[test]
    fn test_back_to_back_stays_do_not_overlap() {
        let first = range("2024-06-01", "2024-06-05");
        let second = range("2024-06-05", "2024-06-10");
        assert!(!ranges_overlap(&first, &second));
        assert!(!ranges_overlap(&second, &first));
    }

    #[test]
    fn test_overlapping_stays() {
        let existing = range("2024-06-01", "2024-06-05");
        assert!(ranges_overlap(&existing, &range("2024-06-03", "2024-06-07")));
        assert!(ranges_overlap(&existing, &range("2024-05-28", "2024-06-02")));
        assert!(ranges_overlap(&existing, &range("2024-06-02", "2024-06-03")));
        assert!(ranges_overlap(&existing, &range("2024-05-01", "2024-07-01")));
        assert!(ranges_overlap(&existing, &existing));
    }

    #[test]
    fn test_disjoint_stays() {
        let existing = range("2024-06-01", "2024-06-05");
        assert!(!ranges_overlap(&existing, &range("2024-05-20", "2024-05-25")));
        assert!(!ranges_overlap(&existing, &range("2024-06-20", "2024-06-25")));
    }

    #[test]
    fn test_range_requires_checkout_after_checkin() {
        assert!(StayRange::new(day("2024-06-05"), day("2024-06-05")).is_none());
        assert!(StayRange::new(day("2024-06-05"), day("2024-06-01")).is_none());
        assert_eq!(range("2024-06-01", "2024-06-05").nights(), 4);
        assert_eq!(range("2024-02-28", "2024-03-01").nights(), 2);
    }
}
