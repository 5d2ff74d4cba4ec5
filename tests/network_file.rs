use std::fs::{create_dir_all, remove_file, File};
use std::io::Write;
use std::path::PathBuf;
use valuebot::encoder::encode_position;
use pretty_assertions::assert_eq;
use valuebot::network::{load_or_init, load_required, ModelError, ValueNet, WeightsOrigin};

fn scratch(name: &str) -> PathBuf {
    let dir = PathBuf::from("target/network_file_test");
    create_dir_all(&dir).unwrap();
    let path = dir.join(name);
    let _ = remove_file(&path);
    path
}

#[test]
fn save_then_load_preserves_predictions() {
    let path = scratch("roundtrip.bin");
    let net = ValueNet::seeded(17);
    net.save(&path).unwrap();
    let loaded = ValueNet::load(&path).unwrap();
    assert_eq!(loaded, net);
    let s = encode_position(&cozy_chess::Board::default());
    assert_eq!(loaded.forward(&s), net.forward(&s));
}

#[test]
fn save_overwrites_existing_file() {
    let path = scratch("overwrite.bin");
    ValueNet::seeded(1).save(&path).unwrap();
    let second = ValueNet::seeded(2);
    second.save(&path).unwrap();
    assert_eq!(ValueNet::load(&path).unwrap(), second);
}

#[test]
fn missing_file_starts_fresh_or_fails_when_required() {
    let path = scratch("absent.bin");
    let (net, origin) = load_or_init(&path, Some(5)).unwrap();
    assert_eq!(origin, WeightsOrigin::Fresh);
    assert_eq!(net, ValueNet::seeded(5));
    assert!(!path.exists(), "load_or_init must not write");
    match load_required(&path) {
        Err(ModelError::Missing(p)) => assert_eq!(p, path),
        other => panic!("expected Missing, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn existing_file_is_loaded() {
    let path = scratch("present.bin");
    let net = ValueNet::seeded(8);
    net.save(&path).unwrap();
    let (loaded, origin) = load_or_init(&path, Some(99)).unwrap();
    assert_eq!(origin, WeightsOrigin::Loaded);
    assert_eq!(loaded, net);
}

#[test]
fn rejects_bad_magic() {
    let path = scratch("magic.bin");
    let mut f = File::create(&path).unwrap();
    f.write_all(b"NOTANNET").unwrap();
    f.write_all(&1u32.to_le_bytes()).unwrap();
    drop(f);
    assert!(matches!(ValueNet::load(&path), Err(ModelError::BadMagic(_))));
}

#[test]
fn rejects_wrong_layer_shape() {
    let path = scratch("shape.bin");
    let mut f = File::create(&path).unwrap();
    f.write_all(b"VALNET01").unwrap();
    f.write_all(&1u32.to_le_bytes()).unwrap();
    f.write_all(&3u32.to_le_bytes()).unwrap();
    // first layer claims 100 inputs
    f.write_all(&100u32.to_le_bytes()).unwrap();
    f.write_all(&128u32.to_le_bytes()).unwrap();
    drop(f);
    match ValueNet::load(&path) {
        Err(ModelError::Shape { layer, got, expected }) => {
            assert_eq!(layer, 0);
            assert_eq!(got, (100, 128));
            assert_eq!(expected, (768, 128));
        }
        other => panic!("expected Shape, got {:?}", other.map(|_| ())),
    }
}

#[test]
fn rejects_truncated_weights() {
    let path = scratch("truncated.bin");
    let mut f = File::create(&path).unwrap();
    f.write_all(b"VALNET01").unwrap();
    f.write_all(&1u32.to_le_bytes()).unwrap();
    f.write_all(&3u32.to_le_bytes()).unwrap();
    f.write_all(&768u32.to_le_bytes()).unwrap();
    f.write_all(&128u32.to_le_bytes()).unwrap();
    for _ in 0..10 { f.write_all(&0.5f32.to_le_bytes()).unwrap(); }
    drop(f);
    assert!(matches!(ValueNet::load(&path), Err(ModelError::Io { .. })));
}
