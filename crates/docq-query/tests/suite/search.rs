use docq_fuzzy::{MatchKind, MatchScore};
use docq_query::DocService;

use super::fixtures::{config_for, install_fixture_packages, service};

#[test]
fn search_without_active_registry_covers_installed_packages() {
    let dir = tempfile::tempdir().unwrap();
    let service = service(dir.path());

    let hits = service.search("parse", 10, None).unwrap();
    assert_eq!(hits[0].path, "JSON.parse");
    assert_eq!(hits[0].package, "json");
    assert!(hits.iter().any(|hit| hit.path == "JSON::ParserError"));
    assert_eq!(service.active_package(), None);

    let hits = service.search("upcase", 10, None).unwrap();
    assert_eq!(hits[0].path, "String#upcase");
    assert_eq!(hits[0].package, "core");
}

#[test]
fn search_across_packages_skips_broken_ones() {
    let dir = tempfile::tempdir().unwrap();
    install_fixture_packages(dir.path());
    std::fs::create_dir_all(dir.path().join("aaa-1.0.0")).unwrap();
    let service = DocService::from_config(&config_for(dir.path())).unwrap();

    let hits = service.search("parse", 10, None).unwrap();
    assert_eq!(hits[0].path, "JSON.parse");
}

#[test]
fn search_ranks_exact_names_first() {
    let dir = tempfile::tempdir().unwrap();
    let service = service(dir.path());

    let hits = service.search("upcase", 10, Some("core")).unwrap();
    let paths: Vec<&str> = hits.iter().map(|hit| hit.path.as_str()).collect();
    assert_eq!(paths[0], "String#upcase");
    assert!(paths.contains(&"String#upcase!"));
    assert!(hits.iter().all(|hit| hit.package == "core"));
    assert_eq!(service.active_package().as_deref(), Some("core"));
}

#[test]
fn search_defaults_to_the_active_registry() {
    let dir = tempfile::tempdir().unwrap();
    let service = service(dir.path());
    service.lookup("JSON").unwrap();

    let hits = service.search("parse", 10, None).unwrap();
    assert_eq!(hits[0].path, "JSON.parse");
    assert!(hits.iter().all(|hit| hit.package == "json"));
}

#[test]
fn search_respects_limit_and_blank_queries() {
    let dir = tempfile::tempdir().unwrap();
    let service = service(dir.path());

    assert_eq!(service.search("s", 2, Some("core")).unwrap().len(), 2);
    assert!(service.search("   ", 10, Some("core")).unwrap().is_empty());
    assert!(service.search("upcase", 0, Some("core")).unwrap().is_empty());
}

#[test]
fn scorer_is_pluggable() {
    let dir = tempfile::tempdir().unwrap();
    install_fixture_packages(dir.path());
    let service = DocService::from_config(&config_for(dir.path()))
        .unwrap()
        .with_scorer(|query: &str, candidate: &str| {
            candidate.ends_with(query).then_some(MatchScore {
                kind: MatchKind::Exact,
                score: candidate.len() as i32,
            })
        });

    let hits = service.search("Error", 10, Some("json")).unwrap();
    let paths: Vec<&str> = hits.iter().map(|hit| hit.path.as_str()).collect();
    assert_eq!(paths, ["JSON::ParserError", "JSON::JSONError"]);
}
