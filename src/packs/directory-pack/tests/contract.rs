use directory_pack::{DirectoryPack, MANIFEST_FILE};
use sheetpack_core::pack_contract::{
    run_pack_contract, InfoExpectation, PackContractExpectations,
};
use sheetpack_core::records::{ClassList, RecordList};
use sheetpack_core::{MultiPageInfo, RecordType, Resolver};
use std::fs;
use std::path::Path;
use std::sync::Arc;

const MANIFEST: &str = r#"
id = "primal"
name = "Primal Paths"
version = "1.2.0"

[resources]
classes = "raw/classes.toml"
class_spells = "raw/class_spells.toml"
spells = "raw/spells.toml"
"#;

const CLASSES: &str = r#"
[[class]]
name = "Barbarian"
hit_die = 12
saving_throws = ["Strength", "Constitution"]

[[class.features]]
name = "Primal Instinct"
level = 3
description = "Trust the beast within."
"#;

const CLASS_SPELLS: &str = r#"
[[class_spells]]
class = "Druid"
spells = ["Shillelagh", "Thorn Whip"]
"#;

const SPELLS: &str = r#"
[[spell]]
name = "Thorn Whip"
level = 0
school = "Transmutation"
components = ["V", "S", "M"]
"#;

fn write(root: &Path, relative: &str, contents: &[u8]) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn fixture() -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();
    write(root, MANIFEST_FILE, MANIFEST.as_bytes());
    write(root, "raw/classes.toml", CLASSES.as_bytes());
    write(root, "raw/class_spells.toml", CLASS_SPELLS.as_bytes());
    write(root, "raw/spells.toml", SPELLS.as_bytes());
    write(root, "assets/info/barbarian/10.Rage.md", b"Enter a rage.\nGain resistance.");
    write(root, "assets/info/barbarian/02.Background.md", b"World");
    write(root, "assets/info/barbarian/01.Intro.md", b"Hello");
    write(root, "assets/icons/barbarian.png", b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR");
    dir
}

fn resolver(root: &Path) -> Resolver {
    Resolver::new(Arc::new(DirectoryPack::load(root).expect("pack should load")))
}

#[test]
fn directory_pack_contract() {
    let dir = fixture();
    let expectations = PackContractExpectations {
        supported: vec![RecordType::Classes, RecordType::ClassSpells, RecordType::Spells],
        unsupported: vec![
            RecordType::Backgrounds,
            RecordType::Feats,
            RecordType::Items,
            RecordType::Races,
            RecordType::Talents,
        ],
        info: Some(InfoExpectation {
            path: "info/barbarian".into(),
            titles: vec!["Intro".into(), "Background".into(), "Rage".into()],
        }),
        image_path: Some("icons/barbarian.png".into()),
    };

    if let Err(e) = run_pack_contract(&resolver(dir.path()), &expectations) {
        panic!("Contract test failed: {}", e);
    }
}

#[test]
fn resolved_classes_keep_nested_features() {
    let dir = fixture();
    let envelope = resolver(dir.path()).resolve("classes", None);
    let classes = ClassList::from_bytes(envelope.bytes("classes").unwrap()).unwrap();
    let barbarian = &classes.classes[0];
    assert_eq!(barbarian.saving_throws, vec!["Strength", "Constitution"]);
    assert_eq!(barbarian.features[0].name, "Primal Instinct");
    assert_eq!(barbarian.features[0].level, Some(3));
}

#[test]
fn info_pages_carry_file_contents() {
    let dir = fixture();
    let envelope = resolver(dir.path()).resolve("info", Some("info/barbarian"));
    let info = MultiPageInfo::from_bytes(envelope.bytes("info").unwrap()).unwrap();
    assert_eq!(info.pages[0].content, "Hello");
    assert_eq!(info.pages[1].content, "World");
    assert_eq!(info.pages[2].content, "Enter a rage.\nGain resistance.");
}

#[test]
fn malformed_record_file_surfaces_in_exception() {
    let dir = fixture();
    write(dir.path(), "raw/spells.toml", b"[[spell]\nname = ");
    let envelope = resolver(dir.path()).resolve("spells", None);
    assert_eq!(envelope.key(), Some("exception"));
    assert!(envelope.error_message().unwrap().contains("spells"));
}

#[test]
fn missing_info_directory_is_reported() {
    let dir = fixture();
    let envelope = resolver(dir.path()).resolve("info", Some("info/wizard"));
    assert!(envelope.is_failure());
    assert!(envelope.error_message().unwrap().contains("wizard"));
}
