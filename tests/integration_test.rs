// Integration tests for argrisk
use argrisk_core::{
    bulk_table, compute, lookup, normalize, parse_pasted, parse_table, resolve_all, risk_table,
    AbundanceEntry, ClampPolicy, DatasetHandle, Error, LookupOutcome, MatchNote, MatchSettings,
    ReferenceDataset, ResultTable, Settings,
};
use argrisk_similarity::{match_best, match_one};
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;

const GENES_TSV: &str = "\u{feff}Genes\tClinical Importance level\tMobility-level\tFinal Risk score\tPathogenic_score\tSource\n\
geneA\tHigh\tMobile\t2.0\t1\tcard\n\
mecA\tHigh\tMobile\t0.9\t3\tcard\n\
bla_TEM_1\tMedium\t\t0.7\tNot Defined\tresfinder\n\
vanA\tHigh\tFixed\tNot Defined\t2\tcard\n\
MECA\tLow\tFixed\t0.1\t1\tduplicate\n";

fn dataset_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn load() -> (NamedTempFile, ReferenceDataset) {
    let file = dataset_file(GENES_TSV);
    let dataset = ReferenceDataset::load(file.path()).unwrap();
    (file, dataset)
}

#[test]
fn test_load_tab_delimited_with_messy_headers() {
    let (_file, dataset) = load();
    assert_eq!(dataset.len(), 5);
    assert_eq!(dataset.delimiter(), b'\t');

    let columns = dataset.display_columns();
    assert_eq!(columns[0], "Genes");
    assert!(columns.contains(&"Mobility_level".to_string()));
    assert!(columns.contains(&"Final_Risk_score".to_string()));
    assert!(columns.contains(&"Source".to_string()));
    assert_eq!(dataset.default_score_column(), Some("Final_Risk_score"));

    let record = dataset.lookup_exact("BLA_TEM_1").unwrap();
    assert_eq!(record.mobility_level.as_deref(), Some("Unknown"));
}

#[test]
fn test_normalize_is_idempotent() {
    let raw = ["Genes", "Clinical Importance level", "Mobility-level", "Final Risk score", "Source"];
    let once = normalize(&raw);
    assert_eq!(normalize(&once), once);
}

#[test]
fn test_missing_gene_column_fails() {
    let file = dataset_file("Name,Final_Risk_score\nmecA,0.9\n");
    match ReferenceDataset::load(file.path()) {
        Err(Error::Schema { missing }) => assert_eq!(missing, "Genes"),
        other => panic!("expected schema error, got {:?}", other.map(|d| d.len())),
    }
}

#[test]
fn test_verbatim_query_matches_in_both_modes() {
    let (_file, dataset) = load();
    for query in ["mecA", "VANA", "bla_tem_1"] {
        assert!(matches!(
            lookup(&dataset, query, &MatchSettings::exact()),
            LookupOutcome::Hit { note: MatchNote::Exact, .. }
        ));

        let top = match_best(&query.to_lowercase(), dataset.all_keys(), 1);
        assert_eq!(top[0].key, query.to_lowercase());
        assert_eq!(top[0].score, 100.0);
    }
}

#[test]
fn test_match_one_respects_cutoff() {
    let (_file, dataset) = load();
    for query in ["meca1", "blatem", "vanz", "tetM", "qnrS"] {
        let best = match_best(query, dataset.all_keys(), 1)[0].score;
        for cutoff in [50.0, 70.0, 85.0, 95.0] {
            assert_eq!(
                match_one(query, dataset.all_keys(), cutoff).is_some(),
                best >= cutoff,
                "query {} cutoff {}",
                query,
                cutoff
            );
        }
    }
}

#[test]
fn test_duplicate_keys_resolve_to_first_row() {
    let (file, dataset) = load();
    let first = dataset.lookup_exact("meca").unwrap();
    assert_eq!(first.genes, "mecA");

    let reloaded = ReferenceDataset::load(file.path()).unwrap();
    assert_eq!(reloaded.lookup_exact("MECA").unwrap(), first);
}

#[test]
fn test_bulk_lookup_export_roundtrip() {
    let (_file, dataset) = load();
    let queries = ["mecA", "unknown_gene", "blaTEM1", "vanA"];
    let results = resolve_all(&dataset, &queries, &MatchSettings::default());
    assert_eq!(results.len(), queries.len());
    assert_eq!(results[2].match_name(), "bla_TEM_1");

    let table = bulk_table(&dataset, &results);
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join(argrisk_core::export::BULK_EXPORT_FILENAME);
    std::fs::write(&path, table.to_csv().unwrap()).unwrap();

    let parsed = ResultTable::from_csv(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(parsed.len(), table.len());
    for (row, original) in parsed.rows.iter().zip(&table.rows) {
        for (cell, expected) in row.iter().zip(original) {
            if let Some(expected) = expected.as_deref().filter(|v| !v.is_empty()) {
                assert_eq!(cell.as_deref(), Some(expected));
            }
        }
    }
}

#[test]
fn test_risk_index_example() {
    let (_file, dataset) = load();
    let entries = parse_pasted("geneA, 10.0\ngeneB, 3.5\n");
    let index = compute(&dataset, &entries, "Final_Risk_score", &MatchSettings::exact(), ClampPolicy::None)
        .unwrap();
    assert_eq!(index.total, 20.0);
    assert_eq!(index.display_total(), "20");
}

#[test]
fn test_risk_index_from_uploaded_table() {
    let (_file, dataset) = load();
    let upload = dataset_file("gene,abundance\nvanA,5\nmecA,not-a-number\ngeneA,1.5\n");
    let entries = parse_table(&std::fs::read_to_string(upload.path()).unwrap()).unwrap();

    let index = compute(&dataset, &entries, "Final_Risk_score", &MatchSettings::exact(), ClampPolicy::None)
        .unwrap();
    assert_eq!(index.rows.len(), 3);
    assert_eq!(index.rows[0].risk_score, 0.0);
    assert_eq!(index.rows[1].product, None);
    assert_eq!(index.total, 3.0);

    let table = risk_table(&dataset, &index);
    let parsed = ResultTable::from_csv(&table.to_csv().unwrap()).unwrap();
    assert_eq!(parsed.len(), 3);
    assert_eq!(parsed.cell(1, "Product"), None);
    assert_eq!(parsed.cell(1, "Genes"), Some("mecA"));
}

#[test]
fn test_settings_file_drives_risk() {
    let (_file, dataset) = load();
    let config = dataset_file(
        r#"{"match": {"fuzzy": false}, "risk": {"score_attribute": "Pathogenic score", "clamp": "unit_interval"}}"#,
    );
    let settings = Settings::from_json_file(config.path()).unwrap();
    assert_eq!(settings.matching.cutoff, 70);

    let entries = vec![AbundanceEntry::new("mecA", Some(2.0)), AbundanceEntry::new("bla_TEM_1", Some(2.0))];
    let index = compute(
        &dataset,
        &entries,
        &settings.risk.score_attribute,
        &settings.matching,
        settings.risk.clamp,
    )
    .unwrap();
    assert_eq!(index.score_column, "Pathogenic_score");
    assert_eq!(index.rows[0].risk_score, 1.0);
    assert_eq!(index.total, 2.0);
}

#[test]
fn test_settings_reject_out_of_range_cutoff() {
    let config = dataset_file(r#"{"match": {"cutoff": 99}}"#);
    assert!(matches!(Settings::from_json_file(config.path()), Err(Error::InvalidConfig(_))));
}

#[test]
fn test_dataset_handle_loads_once() {
    let file = dataset_file(GENES_TSV);
    let handle = Arc::new(DatasetHandle::new(file.path()));
    assert!(!handle.is_loaded());

    let loaded: Vec<_> = std::thread::scope(|s| {
        let workers: Vec<_> = (0..4)
            .map(|_| {
                let handle = handle.clone();
                s.spawn(move || handle.get_or_load().unwrap())
            })
            .collect();
        workers.into_iter().map(|w| w.join().unwrap()).collect()
    });

    assert!(handle.is_loaded());
    assert!(loaded.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
}
