#![forbid(unsafe_code)]
use chrono::{NaiveDate, NaiveTime};
use repartiteur::{JsonStorage, Plage, Planning, SourceId, Storage, TimeSegment, Traducteur};
use tempfile::tempdir;

#[test]
fn save_and_load_planning_roundtrip() {
    let dir = tempdir().unwrap();
    let storage = JsonStorage::open(dir.path().join("planning.json"));

    let mut tr = Traducteur::new("Ana", "8h30-16h30", Some(7.0));
    tr.paires.push("EN>FR".into());
    let seg = TimeSegment::tache(
        tr.id.clone(),
        NaiveDate::from_ymd_opt(2025, 12, 8).unwrap(),
        Plage::new(
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(11, 30, 0).unwrap(),
        ),
        SourceId::random(),
    )
    .unwrap()
    .avec_priorite(2)
    .non_fractionnable();
    let planning = Planning {
        traducteurs: vec![tr],
        segments: vec![seg],
    };

    storage.save(&planning).unwrap();
    let loaded = storage.load().unwrap();
    assert_eq!(loaded.traducteurs, planning.traducteurs);
    assert_eq!(loaded.segments, planning.segments);
    assert!(!loaded.segments[0].fractionnable);
}

#[test]
fn missing_file_loads_as_empty_planning() {
    let dir = tempdir().unwrap();
    let storage = JsonStorage::open(dir.path().join("absent.json"));
    assert!(storage.load().is_err());
    let planning = storage.load_or_default().unwrap();
    assert!(planning.traducteurs.is_empty());
    assert!(planning.segments.is_empty());
}

#[test]
fn corrupt_file_is_reported() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("planning.json");
    std::fs::write(&path, "{ pas du json").unwrap();
    let err = JsonStorage::open(&path).load_or_default().unwrap_err();
    assert!(format!("{err:#}").contains("parsing"));
}
