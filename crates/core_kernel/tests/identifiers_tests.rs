//! Identifier Tests
//!
//! # Test Organization
//!
//! - `creation` - v4/v7 generation and UUID conversion
//! - `display_and_parsing` - prefixes, parsing, and serde form

use core_kernel::{PolicyRecordId, RentalId, TenantId, CustomerId, UserId, NotificationId};
use uuid::Uuid;

mod creation {
    use super::*;

    #[test]
    fn test_new_generates_unique_ids() {
        assert_ne!(PolicyRecordId::new(), PolicyRecordId::new());
    }

    #[test]
    fn test_new_v7_generates_time_ordered_ids() {
        let id1 = PolicyRecordId::new_v7();
        std::thread::sleep(std::time::Duration::from_millis(2));
        let id2 = PolicyRecordId::new_v7();
        let uuid1: Uuid = id1.into();
        let uuid2: Uuid = id2.into();
        assert!(uuid1 < uuid2);
    }

    #[test]
    fn test_from_uuid_roundtrip() {
        let uuid = Uuid::new_v4();
        let id = TenantId::from_uuid(uuid);
        assert_eq!(*id.as_uuid(), uuid);
    }
}

mod display_and_parsing {
    use super::*;

    #[test]
    fn test_prefixes() {
        assert_eq!(PolicyRecordId::PREFIX, "PRC");
        assert_eq!(RentalId::PREFIX, "RNT");
        assert_eq!(TenantId::PREFIX, "TEN");
        assert_eq!(CustomerId::PREFIX, "CUS");
        assert_eq!(UserId::PREFIX, "USR");
        assert_eq!(NotificationId::PREFIX, "NTF");
    }

    #[test]
    fn test_parse_rejects_invalid_uuid() {
        assert!("RNT-not-a-uuid".parse::<RentalId>().is_err());
    }

    #[test]
    fn test_serde_is_transparent() {
        let id = CustomerId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.as_uuid()));
    }
}
