use std::sync::Arc;

use docq_memory::{MemoryBudget, MemoryEstimator};
use docq_registry::{
    ActiveRegistry, FsArtifactStore, GenerationError, NoopGenerator, PackageCatalog,
    RegistryCache, RegistryError, RegistryLoader,
};

use super::fixtures::{install, loader, package, roomy_cache, CountingStore, FakeGenerator};

#[test]
fn load_installs_registry_in_cache_and_active_slot() {
    let dir = tempfile::tempdir().unwrap();
    install(dir.path(), &[("json", &["JSON", "JSON::Parser"])]);
    let store = CountingStore::new(dir.path());
    let loader = loader(&["json"], store.clone(), FakeGenerator::silent(), roomy_cache(4));

    let mut active = ActiveRegistry::new();
    let registry = loader.load("json", &mut active).unwrap();

    assert_eq!(registry.package(), "json");
    assert!(registry.contains("JSON::Parser"));
    assert_eq!(active.package(), Some("json"));
    assert!(loader.cache().contains("json"));
    assert_eq!(store.loads(), 1);
}

#[test]
fn cache_hit_does_no_disk_io() {
    let dir = tempfile::tempdir().unwrap();
    install(dir.path(), &[("json", &["JSON"]), ("rake", &["Rake"])]);
    let store = CountingStore::new(dir.path());
    let loader = loader(
        &["json", "rake"],
        store.clone(),
        FakeGenerator::silent(),
        roomy_cache(4),
    );
    let mut active = ActiveRegistry::new();

    let first = loader.load("json", &mut active).unwrap();
    loader.load("rake", &mut active).unwrap();
    let (checks, loads) = (store.checks(), store.loads());

    let again = loader.load("json", &mut active).unwrap();
    assert!(Arc::ptr_eq(&first, &again));
    assert_eq!(store.checks(), checks);
    assert_eq!(store.loads(), loads);
    assert_eq!(active.package(), Some("json"));
    assert_eq!(loader.cache().stats().access_order, ["rake", "json"]);
}

#[test]
fn missing_artifact_is_generated_once() {
    let dir = tempfile::tempdir().unwrap();
    let generator = FakeGenerator::writing();
    let loader = loader(
        &["json"],
        CountingStore::new(dir.path()),
        generator.clone(),
        roomy_cache(4),
    );
    let mut active = ActiveRegistry::new();

    let registry = loader.load("json", &mut active).unwrap();
    assert!(registry.contains("Generated::json"));
    assert_eq!(generator.calls(), 1);

    loader.cache().clear();
    loader.load("json", &mut active).unwrap();
    assert_eq!(generator.calls(), 1, "artifact is on disk now");
}

#[test]
fn artifact_still_missing_after_generation() {
    let dir = tempfile::tempdir().unwrap();
    let generator = FakeGenerator::silent();
    let loader = loader(
        &["json"],
        CountingStore::new(dir.path()),
        generator.clone(),
        roomy_cache(4),
    );
    let mut active = ActiveRegistry::new();

    let err = loader.load("json", &mut active).unwrap_err();
    assert!(
        matches!(&err, RegistryError::ArtifactNotFound { package, .. } if package == "json"),
        "{err:?}"
    );
    assert_eq!(generator.calls(), 1);
    assert!(active.get().is_none());
    assert_eq!(loader.cache().size(), 0);
}

#[test]
fn generator_failure_leaves_cache_and_active_untouched() {
    let dir = tempfile::tempdir().unwrap();
    install(dir.path(), &[("json", &["JSON"])]);
    let generator = FakeGenerator::failing();
    let loader = loader(
        &["json", "ghost"],
        CountingStore::new(dir.path()),
        generator.clone(),
        roomy_cache(4),
    );
    let mut active = ActiveRegistry::new();
    let json = loader.load("json", &mut active).unwrap();

    let err = loader.load("ghost", &mut active).unwrap_err();
    assert!(
        matches!(
            &err,
            RegistryError::GenerationFailed {
                package,
                source: GenerationError::Failed { .. },
            } if package == "ghost"
        ),
        "{err:?}"
    );
    assert_eq!(generator.calls(), 1);
    assert!(!loader.cache().contains("ghost"));
    assert_eq!(loader.cache().size(), 1);
    assert!(Arc::ptr_eq(active.get().unwrap(), &json));

    // Nothing is remembered about the failure: the next call runs the generator again.
    loader.load("ghost", &mut active).unwrap_err();
    assert_eq!(generator.calls(), 2);
    assert_eq!(active.package(), Some("json"));
}

#[test]
fn malformed_artifact_leaves_cache_and_active_untouched() {
    let dir = tempfile::tempdir().unwrap();
    install(dir.path(), &[("json", &["JSON"])]);
    let broken = FsArtifactStore::new(dir.path())
        .package_dir(&package("broken"))
        .join("registry.bin");
    std::fs::create_dir_all(broken.parent().unwrap()).unwrap();
    std::fs::write(&broken, b"\xff\xff definitely not bincode").unwrap();

    let loader = loader(
        &["json", "broken"],
        CountingStore::new(dir.path()),
        FakeGenerator::silent(),
        roomy_cache(4),
    );
    let mut active = ActiveRegistry::new();
    loader.load("json", &mut active).unwrap();

    let err = loader.load("broken", &mut active).unwrap_err();
    assert!(
        matches!(err, RegistryError::RegistryLoadFailed { .. }),
        "{err:?}"
    );
    assert_eq!(err.package(), Some("broken"));
    assert!(!loader.cache().contains("broken"));
    assert_eq!(active.package(), Some("json"));
}

#[test]
fn unknown_package_is_rejected_before_touching_disk() {
    let dir = tempfile::tempdir().unwrap();
    let store = CountingStore::new(dir.path());
    let loader = loader(&["json"], store.clone(), FakeGenerator::writing(), roomy_cache(4));

    let err = loader.load("nope", &mut ActiveRegistry::new()).unwrap_err();
    assert!(matches!(err, RegistryError::UnknownPackage(ref name) if name == "nope"));
    assert_eq!(store.checks(), 0);
}

#[test]
fn fetch_does_not_touch_active_slot() {
    let dir = tempfile::tempdir().unwrap();
    install(dir.path(), &[("json", &["JSON"]), ("rake", &["Rake"])]);
    let loader = loader(
        &["json", "rake"],
        CountingStore::new(dir.path()),
        FakeGenerator::silent(),
        roomy_cache(4),
    );
    let mut active = ActiveRegistry::new();
    loader.load("json", &mut active).unwrap();

    let rake = loader.fetch("rake").unwrap();
    assert_eq!(rake.package(), "rake");
    assert_eq!(active.package(), Some("json"));
    assert!(loader.cache().contains("rake"));
}

#[test]
fn evicting_the_active_registry_keeps_it_readable() {
    let dir = tempfile::tempdir().unwrap();
    install(dir.path(), &[("json", &["JSON"]), ("rake", &["Rake"])]);
    let loader = loader(
        &["json", "rake"],
        CountingStore::new(dir.path()),
        FakeGenerator::silent(),
        roomy_cache(1),
    );
    let mut active = ActiveRegistry::new();
    loader.load("json", &mut active).unwrap();

    loader.fetch("rake").unwrap();
    assert!(!loader.cache().contains("json"));
    assert_eq!(active.package(), Some("json"));
    assert!(active.get().unwrap().contains("JSON"));
}

#[test]
fn separate_sessions_keep_separate_active_registries() {
    let dir = tempfile::tempdir().unwrap();
    install(dir.path(), &[("json", &["JSON"]), ("rake", &["Rake"])]);
    let loader = loader(
        &["json", "rake"],
        CountingStore::new(dir.path()),
        FakeGenerator::silent(),
        roomy_cache(4),
    );

    let mut first = ActiveRegistry::new();
    let mut second = ActiveRegistry::new();
    loader.load("json", &mut first).unwrap();
    loader.load("rake", &mut second).unwrap();

    assert_eq!(first.package(), Some("json"));
    assert_eq!(second.package(), Some("rake"));
}

#[test]
fn zero_capacity_still_serves_the_loaded_registry() {
    let dir = tempfile::tempdir().unwrap();
    install(dir.path(), &[("json", &["JSON"])]);
    let cache = Arc::new(RegistryCache::new(
        0,
        MemoryBudget::default(),
        MemoryEstimator::default(),
    ));
    let loader = RegistryLoader::new(
        PackageCatalog::new([package("json")]),
        FsArtifactStore::new(dir.path()),
        NoopGenerator,
        cache,
    );
    let mut active = ActiveRegistry::new();

    let registry = loader.load("json", &mut active).unwrap();
    assert!(registry.contains("JSON"));
    assert_eq!(active.package(), Some("json"));
    assert_eq!(loader.cache().size(), 0);
}
