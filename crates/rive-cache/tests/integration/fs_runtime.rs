use rive_cache::runtime::fs::FsRuntime;
use rive_cache::runtime::header::SUPPORTED_MAJOR_VERSION;
use rive_cache::{FileCache, FileError, FileStatus, RiveBuffer, RiveFileParams};
use rive_cache_test as test;

#[tokio::test]
async fn test_load_from_base_dir() {
    test::setup();
    let dir = test::tempdir();
    test::write_file(dir.path(), "anims/vehicles.riv", &test::rive_file(7, 2, 42));

    let cache = FileCache::new(FsRuntime::new(dir.path()));
    let params = RiveFileParams::src("anims/vehicles.riv");

    let state = cache.load_file(&params).settled().await;
    assert_eq!(state.status, FileStatus::Success);

    let file = state.file.unwrap();
    let header = file.header().unwrap();
    assert_eq!(header.major_version, SUPPORTED_MAJOR_VERSION);
    assert_eq!(header.minor_version, 2);
    assert_eq!(header.file_id, 42);
    assert_eq!(file.path(), Some(dir.path().join("anims/vehicles.riv").as_path()));
    assert_eq!(file.instances(), 1);

    cache.release_file(&params);
    assert!(cache.is_empty());
    // cleanup drops the loaded contents
    assert!(file.data().is_none());
}

#[tokio::test]
async fn test_missing_file() {
    test::setup();
    let dir = test::tempdir();

    let cache = FileCache::new(FsRuntime::new(dir.path()));
    let state = cache
        .load_file(&RiveFileParams::src("missing.riv"))
        .settled()
        .await;

    assert_eq!(state.status, FileStatus::Failed);
    assert!(matches!(state.error, Some(FileError::NotFound(_))));
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_malformed_file() {
    test::setup();
    let dir = test::tempdir();
    test::write_file(dir.path(), "not-rive.riv", b"GIF89a");
    test::write_file(dir.path(), "future.riv", &test::rive_file(8, 0, 1));

    let cache = FileCache::new(FsRuntime::new(dir.path()));

    let state = cache
        .load_file(&RiveFileParams::src("not-rive.riv"))
        .settled()
        .await;
    assert_eq!(
        state.error,
        Some(FileError::Malformed("missing RIVE fingerprint".into()))
    );

    let state = cache
        .load_file(&RiveFileParams::src("future.riv"))
        .settled()
        .await;
    assert_eq!(state.status, FileStatus::Failed);
    assert!(matches!(state.error, Some(FileError::Malformed(_))));
}

#[tokio::test]
async fn test_unsupported_scheme() {
    test::setup();
    let cache = FileCache::new(FsRuntime::default());

    let state = cache
        .load_file(&RiveFileParams::src("https://cdn.rive.app/animations/off_road_car.riv"))
        .settled()
        .await;
    assert_eq!(
        state.error,
        Some(FileError::UnsupportedScheme("https".into()))
    );
}

#[tokio::test]
async fn test_load_buffer() {
    test::setup();
    let cache = FileCache::new(FsRuntime::default());
    let buffer = RiveBuffer::new(test::rive_file(7, 0, 9));
    let params = RiveFileParams::buffer(buffer.clone());

    let first = cache.load_file(&params);
    let second = cache.load_file(&RiveFileParams::buffer(buffer));
    assert!(first.same_episode(&second));

    let state = first.settled().await;
    assert_eq!(state.status, FileStatus::Success);
    assert_eq!(state.file.unwrap().header().unwrap().file_id, 9);
    assert_eq!(cache.ref_count(&params), Some(2));

    // identical contents, but a different buffer
    let copy = RiveBuffer::new(test::rive_file(7, 0, 9));
    let copy_state = cache.load_file(&RiveFileParams::buffer(copy));
    assert!(!copy_state.same_episode(&first));
    copy_state.settled().await;
    assert_eq!(cache.len(), 2);

    cache.clear_cache();
    assert!(cache.is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn test_load_file_url() {
    test::setup();
    let dir = test::tempdir();
    let path = test::write_file(dir.path(), "loader.riv", &test::rive_file(7, 0, 3));

    let cache = FileCache::new(FsRuntime::default());
    let src = format!("file://{}", path.display());
    let state = cache.load_file(&RiveFileParams::src(src)).settled().await;
    assert_eq!(state.status, FileStatus::Success);
}
