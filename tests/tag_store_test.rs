use tts_tester::tags::format::FileFormat;
use tts_tester::tags::SpeakerTagStore;

mod common;
use common::TestContext;

const VCTK: &str = "tts_models/en/vctk/vits";

#[test]
fn test_missing_file_gives_empty_store() {
    let ctx = TestContext::new();
    let store = SpeakerTagStore::load(ctx.tags_path());

    assert!(store.get_all_tags().is_empty());
    assert!(store.loaded_format().is_none());
    assert!(!store.summary().file_exists);
}

#[test]
fn test_current_format_round_trips_through_disk() {
    let ctx = TestContext::new();
    let mut store = SpeakerTagStore::load(ctx.tags_path());
    store.add_tag_definition("female", "Female voice", "#ff69b4");
    store.add_tag_to_speaker(VCTK, "p225", "female");
    store.add_tag_to_speaker(VCTK, "p226", "calm");
    store.mark_model_downloaded(VCTK);
    store.update_available_models(vec![VCTK.to_string()]);
    store.save().unwrap();

    let json = TestContext::read_json(&ctx.tags_path());
    assert_eq!(json["_metadata"]["version"], "1.3");
    assert_eq!(json["_tags"]["female"]["color"], "#ff69b4");
    assert_eq!(json["_tags"]["female"]["speakers"][VCTK][0], "p225");
    assert_eq!(json["_tags"]["calm"]["description"], "Tag: calm");
    assert_eq!(json["_models"]["downloaded"][0], VCTK);

    let reloaded = SpeakerTagStore::load(ctx.tags_path());
    assert_eq!(reloaded.loaded_format(), Some(FileFormat::V13));
    assert_eq!(reloaded.get_all_tags(), vec!["calm", "female"]);
    assert!(reloaded.is_model_downloaded(VCTK));
    assert_eq!(reloaded.get_available_models(), &[VCTK.to_string()]);
    assert!(reloaded.get_speaker_tags(VCTK, "p225").contains("female"));
}

#[test]
fn test_v12_file_is_migrated() {
    let ctx = TestContext::new();
    let path = ctx.write_tags(
        r##"{
            "_metadata": {"version": "1.2"},
            "_models": {"downloaded": ["tts_models/en/vctk/vits"], "available": []},
            "_tags": {"female": {"description": "Female voice", "color": "#ff69b4"}},
            "_speakers": {
                "tts_models/en/vctk/vits": {"p225": ["female", "deep"]}
            }
        }"##,
    );

    let store = SpeakerTagStore::load(&path);
    assert_eq!(store.loaded_format(), Some(FileFormat::V12));
    assert_eq!(
        store.get_tag_definition("female").unwrap().description,
        "Female voice"
    );
    // tag used but never defined
    let deep = store.get_tag_definition("deep").unwrap();
    assert_eq!(deep.description, "Tag: deep");
    assert_eq!(deep.speakers[VCTK], vec!["p225"]);

    store.save().unwrap();
    let json = TestContext::read_json(&path);
    assert_eq!(json["_metadata"]["version"], "1.3");
    assert!(json.get("_speakers").is_none());
}

#[test]
fn test_v11_file_is_migrated() {
    let ctx = TestContext::new();
    let path = ctx.write_tags(
        r#"{
            "_metadata": {"version": "1.1"},
            "_models": {"downloaded": [], "available": ["tts_models/en/vctk/vits"]},
            "speaker_tags": {
                "tts_models/en/vctk/vits": {"p225": ["warm"], "p226": ["warm"]}
            }
        }"#,
    );

    let store = SpeakerTagStore::load(&path);
    assert_eq!(store.loaded_format(), Some(FileFormat::V11));
    assert_eq!(store.get_speakers_with_tag(VCTK, "warm"), vec!["p225", "p226"]);
    assert!(!store.is_model_downloaded(VCTK));
    assert_eq!(store.get_undownloaded_models(), vec![VCTK.to_string()]);
}

#[test]
fn test_legacy_file_is_migrated() {
    let ctx = TestContext::new();
    let path = ctx.write_tags(r#"{"tts_models/en/vctk/vits": {"p230": ["old"]}}"#);

    let store = SpeakerTagStore::load(&path);
    assert_eq!(store.loaded_format(), Some(FileFormat::Legacy));
    assert_eq!(store.get_all_models(), vec![VCTK.to_string()]);
    assert!(store.get_speaker_tags(VCTK, "p230").contains("old"));
    // models found in a legacy file were in use, so they count as downloaded
    assert!(store.is_model_downloaded(VCTK));
}

#[test]
fn test_corrupt_file_is_backed_up() {
    let ctx = TestContext::new();
    let path = ctx.write_tags("{ this is not json");

    assert!(SpeakerTagStore::try_load(&path).is_err());

    let store = SpeakerTagStore::load(&path);
    assert!(store.get_all_tags().is_empty());
    assert!(!path.exists());

    let backup = path.with_extension("json.corrupt");
    assert_eq!(
        std::fs::read_to_string(backup).unwrap(),
        "{ this is not json"
    );
}

#[test]
fn test_wrong_shape_is_rejected() {
    let ctx = TestContext::new();
    let path = ctx.write_tags(r#"["not", "an", "object"]"#);

    let err = SpeakerTagStore::try_load(&path).unwrap_err();
    assert!(err.to_string().contains("not an object"));
}

#[test]
fn test_save_creates_parent_directories() {
    let ctx = TestContext::new();
    let path = ctx.temp_dir.path().join("nested").join("tags.json");
    let mut store = SpeakerTagStore::load(&path);
    store.add_tag_to_speaker(VCTK, "p225", "bright");
    store.save().unwrap();

    assert!(path.exists());
    assert!(SpeakerTagStore::try_load(&path)
        .unwrap()
        .get_speaker_tags(VCTK, "p225")
        .contains("bright"));
}

#[test]
fn test_non_ascii_names_are_written_unescaped() {
    let ctx = TestContext::new();
    let mut store = SpeakerTagStore::load(ctx.tags_path());
    store.add_tag_to_speaker(VCTK, "Zoë", "ruhig");
    store.add_tag_definition("ruhig", "Ruhige Stimme, sehr angenehm", "#4a9eff");
    store.save().unwrap();

    let raw = std::fs::read_to_string(ctx.tags_path()).unwrap();
    assert!(raw.contains("\"Zoë\""));
    assert!(!raw.contains("\\u00eb"));
    // two-space indentation
    assert!(raw.contains("\n  \"_metadata\": {"));

    let reloaded = SpeakerTagStore::try_load(ctx.tags_path()).unwrap();
    assert_eq!(reloaded.get_speakers_with_tag(VCTK, "ruhig"), vec!["Zoë"]);
}
