use licgen_license::{IdGenerator, LicenseId, RandomIds};
use std::collections::HashSet;
use uuid::Uuid;

#[test]
fn license_id_new_is_unique() {
    let a = LicenseId::new();
    let b = LicenseId::new();
    assert_ne!(a, b);
}

#[test]
fn license_id_is_v4() {
    assert_eq!(LicenseId::new().as_uuid().get_version_num(), 4);
}

#[test]
fn random_ids_do_not_repeat() {
    let ids: HashSet<_> = (0..1000).map(|_| RandomIds.next_id()).collect();
    assert_eq!(ids.len(), 1000);
}

#[test]
fn license_id_displays_as_hyphenated_uuid() {
    let uuid = Uuid::from_u128(0x6f1c2b1e_8a3d_4c1e_9f00_0123456789ab);
    let id = LicenseId::from_uuid(uuid);
    assert_eq!(id.to_string(), "6f1c2b1e-8a3d-4c1e-9f00-0123456789ab");
    assert_eq!(id.as_uuid(), uuid);
}

#[test]
fn license_id_serializes_as_string() {
    let id = LicenseId::from_uuid(Uuid::from_u128(0x6f1c2b1e_8a3d_4c1e_9f00_0123456789ab));
    let json = serde_json::to_string(&id).unwrap();
    assert_eq!(json, "\"6f1c2b1e-8a3d-4c1e-9f00-0123456789ab\"");
}
