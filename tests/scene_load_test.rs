use anyhow::anyhow;
use tilt_viewer::{
    data_structures::scene::{LoadOutcome, Loaded, Phase, Scene, Settled},
    resources::{AssetKind, LoadError},
};

type TestScene = Scene<&'static str, u32>;

fn model(name: &'static str) -> LoadOutcome<&'static str, u32> {
    Ok(Loaded::Model(name))
}

fn environment(id: u32) -> LoadOutcome<&'static str, u32> {
    Ok(Loaded::Environment(id))
}

fn failed(kind: AssetKind) -> LoadOutcome<&'static str, u32> {
    Err(LoadError::new(kind, "missing.file", anyhow!("not found")))
}

#[test]
fn new_scene_is_empty_and_loading() {
    let scene = TestScene::new();
    assert!(scene.is_empty());
    assert_eq!(scene.phase(), Phase::Loading);
    assert_eq!(scene.loads().pending(), vec![AssetKind::Model, AssetKind::Environment]);
}

#[test]
fn ready_after_both_loads_in_either_order() {
    let mut model_first = TestScene::new();
    assert_eq!(model_first.apply(model("helmet")), Phase::Loading);
    assert_eq!(model_first.apply(environment(7)), Phase::Ready);

    let mut environment_first = TestScene::new();
    assert_eq!(environment_first.apply(environment(7)), Phase::Loading);
    assert_eq!(environment_first.apply(model("helmet")), Phase::Ready);

    for scene in [&model_first, &environment_first] {
        assert_eq!(scene.model().map(|node| node.model), Some("helmet"));
        assert_eq!(scene.environment(), Some(&7));
        assert!(scene.loads().is_settled());
        assert!(scene.loads().pending().is_empty());
    }
}

#[test]
fn failed_model_keeps_environment_and_never_gets_ready() {
    let mut scene = TestScene::new();
    assert_eq!(scene.apply(failed(AssetKind::Model)), Phase::Loading);
    assert_eq!(scene.apply(environment(1)), Phase::Loading);

    assert!(scene.model().is_none());
    assert_eq!(scene.environment(), Some(&1));
    assert!(scene.loads().is_settled());
    assert_eq!(scene.loads().get(AssetKind::Model), Some(Settled::Failed));
    assert_eq!(scene.loads().get(AssetKind::Environment), Some(Settled::Succeeded));
}

#[test]
fn failed_environment_keeps_model() {
    let mut scene = TestScene::new();
    scene.apply(model("helmet"));
    assert_eq!(scene.apply(failed(AssetKind::Environment)), Phase::Loading);
    assert!(scene.model().is_some());
    assert!(scene.environment().is_none());
}

#[test]
fn second_outcome_for_the_same_asset_is_ignored() {
    let mut scene = TestScene::new();
    scene.apply(model("first"));
    scene.apply(model("second"));
    scene.apply(failed(AssetKind::Model));
    assert_eq!(scene.model().map(|node| node.model), Some("first"));
    assert_eq!(scene.loads().get(AssetKind::Model), Some(Settled::Succeeded));
}

#[test]
fn a_late_success_does_not_revive_a_failed_load() {
    let mut scene = TestScene::new();
    scene.apply(failed(AssetKind::Environment));
    scene.apply(model("helmet"));
    assert_eq!(scene.apply(environment(3)), Phase::Loading);
    assert!(scene.environment().is_none());
}

#[test]
fn loaded_model_starts_untilted() {
    let mut scene = TestScene::new();
    scene.apply(model("helmet"));
    let node = scene.model().unwrap();
    assert_eq!(node.tilt, tilt_viewer::data_structures::tilt::Tilt::ZERO);
}

#[test]
fn load_error_names_asset_and_path() {
    let err = LoadError::new(AssetKind::Environment, "assets/sky.hdr", anyhow!("truncated"));
    assert_eq!(err.to_string(), "failed to load environment map from assets/sky.hdr");
    let source = std::error::Error::source(&err).map(|s| s.to_string());
    assert_eq!(source.as_deref(), Some("truncated"));
}
