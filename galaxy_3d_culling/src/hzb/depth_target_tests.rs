use crate::error::Error;
use super::*;

#[test]
fn test_new_is_far() {
    let level = DepthLevel::new(4, 3);
    assert_eq!(level.data.len(), 12);
    assert!(level.data.iter().all(|&d| d == 1.0));
    assert!(!level.is_empty());
    assert!(DepthLevel::new(0, 3).is_empty());
}

#[test]
fn test_get_set_row_major() {
    let mut level = DepthLevel::new(4, 3);
    level.set(3, 1, 0.25);
    assert_eq!(level.get(3, 1), 0.25);
    assert_eq!(level.data[7], 0.25);
}

#[test]
fn test_resize() {
    let mut level = DepthLevel::filled(2, 2, 0.5);
    level.resize(3, 3);
    assert_eq!(level.data.len(), 9);
    assert_eq!((level.width, level.height), (3, 3));
}

#[test]
fn test_bytes_round_trip() {
    let mut level = DepthLevel::new(2, 2);
    level.set(1, 0, 0.125);
    let bytes = level.as_bytes().to_vec();
    assert_eq!(bytes.len(), 16);
    assert_eq!(DepthTarget::from_bytes(2, 2, &bytes).unwrap(), level);
}

#[test]
fn test_from_bytes_unaligned() {
    let level = DepthLevel::filled(3, 1, 0.75);
    let mut bytes = vec![0u8];
    bytes.extend_from_slice(level.as_bytes());
    assert_eq!(DepthTarget::from_bytes(3, 1, &bytes[1..]).unwrap(), level);
}

#[test]
fn test_from_bytes_is_little_endian() {
    let mut bytes = Vec::new();
    for depth in [0.25f32, 1.0] {
        bytes.extend_from_slice(&depth.to_le_bytes());
    }
    let level = DepthTarget::from_bytes(2, 1, &bytes).unwrap();
    assert_eq!(level.data, vec![0.25, 1.0]);
}

#[test]
fn test_from_bytes_wrong_size() {
    let result = DepthTarget::from_bytes(2, 2, &[0u8; 15]);
    assert!(matches!(result, Err(Error::BackendError(_))));
}
