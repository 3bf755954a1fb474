#[cfg(feature = "integration-tests")]
mod common;

#[cfg(feature = "integration-tests")]
mod gpu {
    use anyhow::anyhow;
    use tilt_viewer::{
        ViewerConfig,
        data_structures::scene::{Phase, Scene},
        render::PassTarget,
        resources::{AssetKind, LoadError},
    };
    use wgpu::Color;

    use crate::common::test_utils::Headless;

    const RED: [u8; 4] = [255, 0, 0, 255];

    fn red_config() -> ViewerConfig {
        ViewerConfig::default().with_clear_colour(Color::RED)
    }

    #[test]
    fn intermediate_targets_follow_resize() {
        let gpu = Headless::new();
        let mut chain = gpu.chain(64, 48, &ViewerConfig::default());
        assert!(chain.intermediate_sizes().iter().all(|size| *size == [64, 48]));

        for (w, h) in [(1, 1), (300, 200), (17, 999)] {
            chain.resize(w, h);
            assert_eq!(chain.size(), [w, h]);
            assert!((chain.projection().aspect() - w as f32 / h as f32).abs() < 1e-6);
            assert!(chain.intermediate_sizes().iter().all(|size| *size == [w, h]));
        }
    }

    #[test]
    fn zero_sized_resize_keeps_previous_targets() {
        let gpu = Headless::new();
        let mut chain = gpu.chain(64, 48, &ViewerConfig::default());
        chain.resize(0, 100);
        chain.resize(100, 0);
        assert_eq!(chain.size(), [64, 48]);
        assert!(chain.intermediate_sizes().iter().all(|size| *size == [64, 48]));
    }

    #[test]
    fn rgb_shift_is_the_only_terminal_pass() {
        let gpu = Headless::new();
        let chain = gpu.chain(8, 8, &ViewerConfig::default());
        let terminal: Vec<_> = chain
            .chain()
            .iter()
            .filter(|pass| pass.target == PassTarget::Surface)
            .collect();
        assert_eq!(terminal.len(), 1);
        assert_eq!(chain.chain().last().map(|pass| pass.label), Some("rgb shift"));
    }

    #[test]
    fn empty_scene_renders_clear_colour() {
        let gpu = Headless::new();
        let mut chain = gpu.chain(32, 32, &red_config());
        let target = gpu.target(32, 32);
        let scene = Scene::new();

        chain.render_frame(&scene, &target.create_view(&Default::default()));

        let pixels = gpu.read_pixels(&target);
        assert_eq!(pixels.len(), 32 * 32);
        assert!(pixels.iter().all(|px| *px == RED));
        assert!(scene.is_empty());
        assert_eq!(scene.phase(), Phase::Loading);
    }

    #[test]
    fn renders_after_both_loads_failed() {
        let gpu = Headless::new();
        let mut chain = gpu.chain(16, 16, &red_config());
        let target = gpu.target(16, 16);
        let mut scene = Scene::new();
        scene.apply(Err(LoadError::new(AssetKind::Model, "missing.glb", anyhow!("not found"))));
        scene.apply(Err(LoadError::new(AssetKind::Environment, "missing.hdr", anyhow!("not found"))));

        chain.render_frame(&scene, &target.create_view(&Default::default()));

        assert!(gpu.read_pixels(&target).iter().all(|px| *px == RED));
    }

    #[test]
    fn renders_after_resize() {
        let gpu = Headless::new();
        let mut chain = gpu.chain(16, 16, &red_config());
        chain.resize(40, 24);
        let target = gpu.target(40, 24);

        chain.render_frame(&Scene::new(), &target.create_view(&Default::default()));

        let pixels = gpu.read_pixels(&target);
        assert_eq!(pixels.len(), 40 * 24);
        assert!(pixels.iter().all(|px| *px == RED));
    }
}
