use std::sync::atomic::{AtomicUsize, Ordering};

use super::{
    is_accepted, parse_short_code, short_code_path, EmoticonManifest, ManifestCell,
};

const MANIFEST: &str = r#"{
    "face": {"id": "face", "name": "Face", "layer": 0, "multiSelect": false,
        "items": [{"id": "round", "src": "bmo/face/round.png", "layer": 0}]},
    "mouth": {"id": "mouth", "name": "Mouth", "layer": 2, "multiSelect": false,
        "items": [{"id": "smile", "alias": "happy", "src": "bmo/mouth/smile.png", "layer": 2},
                  {"id": "frown", "src": "bmo/mouth/frown.png", "layer": 2}]},
    "eyes": {"id": "eyes", "name": "Eyes", "layer": 1, "multiSelect": false, "items": []},
    "accessories": {"id": "accessories", "name": "Accessories", "layer": 3,
        "multiSelect": true, "maxSelect": 3,
        "items": [{"id": "hat", "src": "bmo/acc/hat.png", "layer": 3}]},
    "others": {"id": "others", "name": "Others", "layer": 4, "multiSelect": true, "items": []}
}"#;

#[test]
pub fn bands() {
    assert!(is_accepted(24, false));
    assert!(is_accepted(125, false));
    assert!(!is_accepted(23, false));
    assert!(is_accepted(23, true));
    assert!(is_accepted(238, true));
    assert!(is_accepted(529, true));
    assert!(!is_accepted(0, true));
    assert!(!is_accepted(126, true));
    assert!(!is_accepted(999, true));
}

#[test]
pub fn short_codes() {
    assert_eq!(parse_short_code("bgm38", true), Some(38));
    assert_eq!(parse_short_code("bgm038", true), Some(38));
    assert_eq!(parse_short_code("bgm999", true), None);
    assert_eq!(parse_short_code("bgm", true), None);
    assert_eq!(parse_short_code("bgm3a", true), None);
    assert_eq!(parse_short_code("BGM38", true), None);
    assert_eq!(parse_short_code("bgm99999999999999999999", true), None);
}

#[test]
pub fn paths() {
    assert_eq!(short_code_path(1), "bgm/01.gif");
    assert_eq!(short_code_path(24), "tv/01.gif");
    assert_eq!(short_code_path(38), "tv/15.gif");
    assert_eq!(short_code_path(200), "tv_vs/bgm_200.png");
    assert_eq!(short_code_path(500), "tv_500/bgm_500.gif");
    assert_eq!(short_code_path(150), "bgm150.gif");
}

#[test]
pub fn manifest_order() {
    let manifest = EmoticonManifest::from_json(MANIFEST).unwrap();
    assert_eq!(manifest.len(), 4);

    let (category, item) = manifest.get(2).unwrap();
    assert_eq!(category.id, "mouth");
    assert_eq!(item.id, "frown");

    let (category, item) = manifest.get(3).unwrap();
    assert_eq!(category.id, "accessories");
    assert_eq!(item.layer, 3);

    assert!(manifest.get(4).is_none());
    assert_eq!(manifest.get(1).unwrap().1.alias.as_deref(), Some("happy"));
}

#[test]
pub fn bad_manifest() {
    assert!(EmoticonManifest::from_json("{}").is_err());
    assert!(EmoticonManifest::from_json("not json").is_err());
}

#[test]
pub fn cell_loads_once() {
    let cell = ManifestCell::new();
    assert!(cell.get().is_none());
    assert!(cell
        .get_or_try_init(|| EmoticonManifest::from_json("{}"))
        .is_err());
    assert!(cell.get().is_none());

    let loads = AtomicUsize::new(0);
    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                let manifest = cell
                    .get_or_try_init(|| {
                        loads.fetch_add(1, Ordering::SeqCst);
                        EmoticonManifest::from_json(MANIFEST)
                    })
                    .unwrap();
                assert_eq!(manifest.len(), 4);
            });
        }
    });
    assert_eq!(loads.load(Ordering::SeqCst), 1);
}
