//! Offer catalog collaborator and status-aware query biasing.
//!
//! The catalog is only ever used to steer retrieval toward the FAQ entry
//! matching the user's offer situation; an answer never requires it.

use std::collections::HashMap;

use parley_core::types::{OfferRecord, OfferStatus, VerificationStatus};

/// Narrow catalog lookup contract.
pub trait OfferStore: Send + Sync {
    fn get(&self, offer_id: u64) -> Option<OfferRecord>;

    /// Case-insensitive lookup by offer title.
    fn find_by_title(&self, title: &str) -> Option<OfferRecord>;
}

/// Map an offer's status to the FAQ query most likely to answer the
/// question the user is actually asking.
pub fn faq_query(offer: &OfferRecord) -> &'static str {
    match offer.user_status {
        OfferStatus::Ongoing => "What is an ongoing offer?",
        OfferStatus::Completed => match offer.verification_status {
            Some(VerificationStatus::UnderVerification) => {
                "Why is my offer status under verification?"
            }
            // Verified: the user is usually asking about the payout.
            _ => "When will the rewards be added to my wallet?",
        },
        OfferStatus::Expired => "Why does the offer status show as expired?",
    }
}

/// In-memory catalog seeded with fixture offers.
pub struct InMemoryOfferStore {
    offers: HashMap<u64, OfferRecord>,
}

impl InMemoryOfferStore {
    pub fn new(offers: Vec<OfferRecord>) -> Self {
        Self {
            offers: offers.into_iter().map(|o| (o.offer_id, o)).collect(),
        }
    }

    /// Catalog with the standard demo fixtures.
    pub fn with_fixtures() -> Self {
        Self::new(vec![
            OfferRecord {
                offer_id: 925599,
                title: "Netclan Explorer".to_string(),
                user_status: OfferStatus::Completed,
                verification_status: Some(VerificationStatus::UnderVerification),
            },
            OfferRecord {
                offer_id: 111222,
                title: "Cool Gaming App".to_string(),
                user_status: OfferStatus::Ongoing,
                verification_status: None,
            },
            OfferRecord {
                offer_id: 333444,
                title: "Shopping Cashback".to_string(),
                user_status: OfferStatus::Expired,
                verification_status: None,
            },
        ])
    }
}

impl OfferStore for InMemoryOfferStore {
    fn get(&self, offer_id: u64) -> Option<OfferRecord> {
        self.offers.get(&offer_id).cloned()
    }

    fn find_by_title(&self, title: &str) -> Option<OfferRecord> {
        self.offers
            .values()
            .find(|o| o.title.eq_ignore_ascii_case(title))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> InMemoryOfferStore {
        InMemoryOfferStore::with_fixtures()
    }

    // ---- Lookup ----

    #[test]
    fn test_get_known_offer() {
        let offer = store().get(925599).unwrap();
        assert_eq!(offer.title, "Netclan Explorer");
        assert_eq!(offer.user_status, OfferStatus::Completed);
    }

    #[test]
    fn test_get_unknown_offer() {
        assert!(store().get(1).is_none());
    }

    #[test]
    fn test_find_by_title_case_insensitive() {
        let offer = store().find_by_title("cool gaming app").unwrap();
        assert_eq!(offer.offer_id, 111222);
    }

    #[test]
    fn test_find_by_title_unknown() {
        assert!(store().find_by_title("No Such Offer").is_none());
    }

    // ---- FAQ query mapping ----

    #[test]
    fn test_ongoing_offer_query() {
        let offer = store().get(111222).unwrap();
        assert_eq!(faq_query(&offer), "What is an ongoing offer?");
    }

    #[test]
    fn test_completed_under_verification_query() {
        let offer = store().get(925599).unwrap();
        assert_eq!(faq_query(&offer), "Why is my offer status under verification?");
    }

    #[test]
    fn test_completed_verified_query_points_at_payout() {
        let offer = OfferRecord {
            offer_id: 1,
            title: "Verified Offer".to_string(),
            user_status: OfferStatus::Completed,
            verification_status: Some(VerificationStatus::Verified),
        };
        assert_eq!(faq_query(&offer), "When will the rewards be added to my wallet?");
    }

    #[test]
    fn test_completed_no_verification_state_query_points_at_payout() {
        let offer = OfferRecord {
            offer_id: 2,
            title: "Completed Offer".to_string(),
            user_status: OfferStatus::Completed,
            verification_status: None,
        };
        assert_eq!(faq_query(&offer), "When will the rewards be added to my wallet?");
    }

    #[test]
    fn test_expired_offer_query() {
        let offer = store().get(333444).unwrap();
        assert_eq!(faq_query(&offer), "Why does the offer status show as expired?");
    }
}
