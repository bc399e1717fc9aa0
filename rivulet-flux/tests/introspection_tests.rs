// Copyright 2026 the Rivulet authors
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

use rivulet_flux::Flux;

#[test]
fn test_stage_names_reflect_the_assembled_chain() {
    // Arrange
    let flux = Flux::from_iter(1..=5).map(|n| n * 2).filter(|n| *n > 4);

    // Assert
    assert_eq!(flux.stage_name(), "filter");
    assert_eq!(flux.upstream_name(), Some("map"));
}

#[test]
fn test_upstream_walk_reaches_the_root_source() {
    // Arrange
    let flux = Flux::from_iter(1..=5).map(|n| n + 1).take(2);

    // Act: walk the chain from the terminal stage to the root.
    let mut names = vec![flux.info().stage_name()];
    let mut stage = flux.info().upstream();
    while let Some(info) = stage {
        names.push(info.stage_name());
        stage = info.upstream();
    }

    // Assert
    assert_eq!(names, vec!["take", "map", "from_iter"]);
}

#[test]
fn test_root_source_has_no_upstream() {
    let flux = Flux::from_iter(1..=5);
    assert_eq!(flux.stage_name(), "from_iter");
    assert!(flux.upstream_name().is_none());
    assert!(flux.prefetch().is_none());
}

#[test]
fn test_publish_exposes_its_prefetch() {
    // Arrange
    let connectable = Flux::from_iter(1..=5).publish_with_prefetch(64);
    let flux = connectable.flux();

    // Assert
    assert_eq!(flux.stage_name(), "publish");
    assert_eq!(flux.prefetch(), Some(64));
    assert_eq!(flux.upstream_name(), Some("from_iter"));
}

#[test]
fn test_replay_stage_name() {
    let connectable = Flux::from_iter(1..=5).replay(rivulet_flux::ReplayConfig::all());
    let flux = connectable.flux();
    assert_eq!(flux.stage_name(), "replay");
    assert!(flux.prefetch().is_none());
}
