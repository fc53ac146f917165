use std::sync::Mutex;

use tempfile::NamedTempFile;

use vision_harness::config::HarnessConfig;
use vision_harness::VisionProcessor;

static ENV_LOCK: Mutex<()> = Mutex::new(());

fn clear_env() {
    for key in [
        "VISION_HARNESS_CONFIG",
        "VISION_HARNESS_WORKERS",
        "VISION_HARNESS_PROCESSOR",
        "VISION_HARNESS_FRAME_WIDTH",
        "VISION_HARNESS_FRAME_HEIGHT",
        "VISION_HARNESS_FRAME_ROTATION",
        "VISION_HARNESS_LUMA_THRESHOLD",
    ] {
        std::env::remove_var(key);
    }
}

fn write_config(json: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("temp config");
    std::io::Write::write_all(&mut file, json.as_bytes()).expect("write config");
    file
}

#[test]
fn defaults_without_file_or_env() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let cfg = HarnessConfig::load().expect("load config");

    assert_eq!(cfg.workers, 2);
    assert_eq!(cfg.processor, "motion");
    assert_eq!(cfg.frame.width, 640);
    assert_eq!(cfg.frame.height, 480);
    assert_eq!(cfg.frame.rotation, 0);
    assert!(!cfg.frame.flipped);
    assert_eq!(cfg.luma_threshold, 200);
}

#[test]
fn loads_config_from_file_and_env_overrides() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    let file = write_config(
        r#"{
            "workers": 3,
            "processor": "Bright",
            "frame": {
                "width": 1920,
                "height": 1080,
                "rotation": 90,
                "flipped": true
            },
            "bright": {
                "luma_threshold": 180
            }
        }"#,
    );

    std::env::set_var("VISION_HARNESS_CONFIG", file.path());
    std::env::set_var("VISION_HARNESS_WORKERS", "6");
    std::env::set_var("VISION_HARNESS_FRAME_ROTATION", "270");

    let cfg = HarnessConfig::load().expect("load config");

    assert_eq!(cfg.workers, 6);
    assert_eq!(cfg.processor, "bright");
    assert_eq!(cfg.frame.width, 1920);
    assert_eq!(cfg.frame.height, 1080);
    assert_eq!(cfg.frame.rotation, 270);
    assert!(cfg.frame.flipped);
    assert_eq!(cfg.luma_threshold, 180);

    let registry = cfg.build_registry().expect("registry");
    assert_eq!(registry.list(), vec!["bright", "motion"]);
    let default = registry.default_processor().expect("default processor");
    assert_eq!(default.lock().unwrap().name(), "bright");

    clear_env();
}

#[test]
fn rejects_invalid_values() {
    let _guard = ENV_LOCK.lock().unwrap();
    clear_env();

    std::env::set_var("VISION_HARNESS_WORKERS", "0");
    assert!(HarnessConfig::load().is_err());
    clear_env();

    std::env::set_var("VISION_HARNESS_FRAME_ROTATION", "45");
    assert!(HarnessConfig::load().is_err());
    clear_env();

    std::env::set_var("VISION_HARNESS_PROCESSOR", "faces");
    assert!(HarnessConfig::load().is_err());
    clear_env();

    std::env::set_var("VISION_HARNESS_LUMA_THRESHOLD", "300");
    assert!(HarnessConfig::load().is_err());
    clear_env();

    let file = write_config("{ not json");
    std::env::set_var("VISION_HARNESS_CONFIG", file.path());
    assert!(HarnessConfig::load().is_err());
    clear_env();
}
