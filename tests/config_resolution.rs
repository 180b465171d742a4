//! End-to-end exercises of the configuration engine, driven through the
//! text format the pipeline actually reads and writes.

use hwas::config::{format, overlay, ConfigError, ConfigStore, Params};

fn base_store() -> ConfigStore {
    format::parse_str(
        "[common]\n\
         option_a\n\
         option_b = b\n\
         option_d = ${option_a}\n\
         \n\
         [query]\n\
         qa = ${common:option_a}\n",
    )
    .unwrap()
}

#[test]
fn alias_to_an_absent_option_reads_as_absent() {
    let store = base_store();

    assert_eq!(
        store.resolve("common", "option_d").unwrap(),
        ("common".to_string(), "option_a".to_string())
    );
    assert_eq!(store.get("common", "option_d").unwrap(), None);
}

#[test]
fn cross_section_alias_sees_writes_to_its_target() {
    let mut store = base_store();

    assert_eq!(store.get("query", "qa").unwrap(), None);
    store.set("common", "option_a", Some("a".into())).unwrap();
    assert_eq!(store.get("query", "qa").unwrap().as_deref(), Some("a"));
}

#[test]
fn mutual_references_hit_the_recursion_limit() {
    let store = format::parse_str(
        "[common]\n\
         option_f = ${option_g}\n\
         option_g = ${option_f}\n",
    )
    .unwrap();

    let err = store.resolve("common", "option_f").unwrap_err();
    assert!(matches!(
        err,
        ConfigError::RecursionLimit { max_depth: 10, .. }
    ));
}

#[test]
fn parameter_bag_gates_and_folds_overrides() {
    let store = format::parse_str(
        "[hgrm]\n\
         chrm\n\
         vcf = /data/x.vcf\n",
    )
    .unwrap();
    let mut params = Params::from_store(&store, "hgrm").unwrap();

    assert!(!params.is_complete());
    params.update(vec![
        ("chrm".to_string(), Some("chr1".to_string())),
        ("extra".to_string(), Some("ignored".to_string())),
    ]);
    assert!(params.is_complete());
    assert_eq!(params.get("chrm"), Some("chr1"));
    assert!(!params.contains("extra"));
}

#[test]
fn overlay_warns_only_when_writing_through_an_alias() {
    let donor = format::parse_str("[common]\noption_b = new\n").unwrap();

    let mut literal_receiver = format::parse_str("[common]\noption_b = old\n").unwrap();
    let warnings = overlay(&mut literal_receiver, &donor).unwrap();
    assert!(warnings.is_empty());
    assert_eq!(
        literal_receiver.get("common", "option_b").unwrap().as_deref(),
        Some("new")
    );

    let mut alias_receiver = format::parse_str(
        "[common]\n\
         option_a\n\
         option_b = ${option_a}\n",
    )
    .unwrap();
    let warnings = overlay(&mut alias_receiver, &donor).unwrap();
    assert_eq!(warnings.len(), 1);
    assert_eq!(
        alias_receiver.get("common", "option_b").unwrap().as_deref(),
        Some("new")
    );
    // The donor value went through the alias to its target.
    assert_eq!(
        alias_receiver.get("common", "option_a").unwrap().as_deref(),
        Some("new")
    );
}

#[test]
fn full_cycle_survives_a_save_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config");

    let mut store = base_store();
    store.set("query", "qa", Some("written".into())).unwrap();
    format::save(&store, &path).unwrap();

    let reloaded = format::load(&path).unwrap();
    // The write landed at the alias target and the alias survived on disk.
    assert!(reloaded.is_interpolation("query", "qa"));
    assert_eq!(
        reloaded.raw("common", "option_a").unwrap(),
        Some("written")
    );
    assert_eq!(reloaded.get("query", "qa").unwrap().as_deref(), Some("written"));
}
