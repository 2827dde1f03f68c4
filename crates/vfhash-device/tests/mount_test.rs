//! Mount table resolution over real host directories.

use std::sync::Arc;

use tempfile::TempDir;
use vfhash_device::{Device, DeviceResolver, LocalDevice, MemoryDevice, MountTable};

fn read_all(device: &dyn Device, path: &str, chunk: usize) -> Option<Vec<u8>> {
    let handle = device.open(path, true)?;
    let mut out = Vec::new();
    let mut buf = vec![0u8; chunk];
    loop {
        let n = device.read(handle, &mut buf);
        if n <= 0 {
            break;
        }
        out.extend_from_slice(&buf[..n as usize]);
    }
    assert_eq!(out.len() as u64, device.length(handle));
    device.close(handle);
    Some(out)
}

#[test]
fn test_local_volumes_resolve_by_prefix() {
    let temp = TempDir::new().unwrap();
    let platform = temp.path().join("platform");
    let update = temp.path().join("update");
    std::fs::create_dir_all(platform.join("data")).unwrap();
    std::fs::create_dir_all(&update).unwrap();
    std::fs::write(platform.join("data/level.rpf"), vec![7u8; 10_000]).unwrap();
    std::fs::write(update.join("level.rpf"), b"patched").unwrap();

    let table = MountTable::from_dirs(vec![
        ("platform:/".to_string(), platform),
        ("update:/".to_string(), update),
    ])
    .unwrap();
    assert_eq!(table.len(), 2);

    let device = table.resolve("platform:/data/level.rpf").unwrap();
    assert_eq!(
        read_all(device.as_ref(), "platform:/data/level.rpf", 4096),
        Some(vec![7u8; 10_000])
    );

    let device = table.resolve("update:/level.rpf").unwrap();
    assert_eq!(
        read_all(device.as_ref(), "update:/level.rpf", 3).as_deref(),
        Some(&b"patched"[..])
    );

    assert!(table.resolve("audio:/level.rpf").is_none());
}

#[test]
fn test_nested_prefix_shadows_outer_mount() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("outer.bin"), b"outer").unwrap();

    let inner = Arc::new(MemoryDevice::named("inner"));
    inner.insert("common:/dlc/x.bin", b"inner".to_vec());

    let table = MountTable::new()
        .with(
            "common:/",
            Arc::new(LocalDevice::new("common:/", temp.path()).unwrap()),
        )
        .unwrap()
        .with("common:/dlc/", inner.clone() as Arc<dyn Device>)
        .unwrap();

    assert_eq!(table.resolve("common:/dlc/x.bin").unwrap().name(), "inner");
    let outer = table.resolve("common:/outer.bin").unwrap();
    assert_eq!(
        read_all(outer.as_ref(), "common:/outer.bin", 64).as_deref(),
        Some(&b"outer"[..])
    );
    assert_eq!(inner.open_handles(), 0);
}

#[test]
fn test_local_device_releases_handles() {
    let temp = TempDir::new().unwrap();
    std::fs::write(temp.path().join("a"), b"a").unwrap();
    let device = LocalDevice::new("audio:/", temp.path()).unwrap();

    let handles: Vec<_> = (0..8).filter_map(|_| device.open("audio:/a", true)).collect();
    assert_eq!(device.open_handles(), 8);
    for handle in handles {
        device.close(handle);
    }
    assert_eq!(device.open_handles(), 0);
    assert!(device.open("audio:/missing", true).is_none());
    assert_eq!(device.open_handles(), 0);
}
