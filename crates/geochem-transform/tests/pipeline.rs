//! End-to-end tests over files: load, filter, reshape, extract, aggregate.

use std::fs;
use std::path::{Path, PathBuf};

use geochem_ingest::{LoadOptions, LongTable};
use geochem_model::{ColumnMap, FilterSpec, Record, SchemaTag};
use geochem_transform::{
    Extractor, MaxAccumulator, Normaliser, ProcessOptions, WideAccumulator, WideOptions, extract,
    filter, max_table, narrow_table, process, scan, to_wide,
};
use insta::assert_snapshot;
use proptest::prelude::*;
use tempfile::TempDir;

const SURVEY: &str = "\
SAMPLE_NO,SAMPLE_SOURCE,DRILLHOLE_NUMBER,DH_DEPTH_FROM,DH_DEPTH_TO,LONGITUDE_GDA2020,LATITUDE_GDA2020,CHEM_CODE,VALUE,UNIT,CHEM_METHOD_CODE
101,Drill core,6363.0,2,4,136.8,-30.4,Cu,150,ppm,ICP
101,Drill core,6363.0,2,4,136.8,-30.4,Cu,170,ppm,XRF
101,Drill core,6363.0,2,4,136.8,-30.4,Au,<0.01,ppm,FA
102,Drill core,6363.0,12,14,136.8,-30.4,Cu,0.2,%,XRF
103,Soil,,,,137.1,-31.2,Cu,45,ppm,ICP
104,Drill core,6364,40,42,136.9,-30.5,Cu,,ppm,ICP
";

fn write_fixture(dir: &Path, contents: &str) -> PathBuf {
    let path = dir.join("sarig_rs_chem_exp.csv");
    fs::write(&path, contents).expect("write fixture");
    path
}

fn open(path: &Path, carry: bool) -> LongTable {
    let options = LoadOptions::default()
        .with_carry_metadata(carry)
        .with_batch_size(2);
    LongTable::open(path, &ColumnMap::builtin(SchemaTag::Sarig), options).expect("open table")
}

fn wide_csv(table: &LongTable, spec: &FilterSpec) -> String {
    let options = WideOptions::new(true, false).with_layout(
        "SAMPLE_NO",
        table.columns().carried_headers().to_vec(),
    );
    let mut accumulator = WideAccumulator::new(options);
    for batch in scan(table, spec).expect("scan") {
        accumulator.push_batch(batch.expect("batch")).expect("push");
    }
    let mut bytes = Vec::new();
    accumulator
        .finish()
        .to_text()
        .write_to(&mut bytes)
        .expect("write csv");
    String::from_utf8(bytes).expect("utf8")
}

#[test]
fn wide_output_is_stable() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_fixture(dir.path(), SURVEY);
    let table = open(&path, true);
    let spec = FilterSpec::default();

    let first = wide_csv(&table, &spec);
    let second = wide_csv(&table, &spec);
    assert_eq!(first, second);
    assert_snapshot!(first.trim_end(), @r"
    SAMPLE_NO,SAMPLE_SOURCE,DRILLHOLE_NUMBER,DH_DEPTH_FROM,DH_DEPTH_TO,LONGITUDE_GDA2020,LATITUDE_GDA2020,Au,Au_UNIT,Cu,Cu_UNIT
    101,Drill core,6363.0,2,4,136.8,-30.4,,ppm,170,ppm
    102,Drill core,6363.0,12,14,136.8,-30.4,,,0.2,%
    103,Soil,,,,137.1,-31.2,,,45,ppm
    104,Drill core,6364,40,42,136.9,-30.5,,,,ppm
    ");
}

#[test]
fn filters_apply_before_reshape() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_fixture(dir.path(), SURVEY);
    let table = open(&path, false);
    let spec = FilterSpec::new(["Cu"], Vec::<String>::new(), ["6363"], false);
    let records = table.read_filtered(&spec).expect("read");
    let wide = to_wide(records, &WideOptions::default()).expect("reshape");
    assert_eq!(wide.elements(), &["Cu"]);
    assert_eq!(wide.len(), 2);
    assert_eq!(wide.value("101", "Cu"), Some(170.0));
}

#[test]
fn extract_then_reshape_matches_direct_reshape() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_fixture(dir.path(), SURVEY);
    let table = open(&path, false);
    let all = table.read_filtered(&FilterSpec::default()).expect("read");

    let direct = to_wide(
        filter(all.clone(), &FilterSpec::default().with_elements(["Cu"])),
        &WideOptions::default(),
    )
    .expect("direct");

    // Write the extracted subset and load it again, as the commands do.
    let subsets = extract(&all, ["Cu"], false);
    let map = ColumnMap::builtin(SchemaTag::Sarig);
    let extracted = dir.path().join("Cu_processed.csv");
    narrow_table(&subsets["Cu"], &map)
        .write_csv(&extracted)
        .expect("write subset");
    let reloaded = LongTable::open(&extracted, &map, LoadOptions::default())
        .expect("open subset")
        .read_filtered(&FilterSpec::default())
        .expect("read subset");
    let round_trip = to_wide(reloaded, &WideOptions::default()).expect("round trip");

    assert_eq!(round_trip, direct);
}

#[test]
fn processed_maxima_per_hole() {
    let dir = TempDir::new().expect("temp dir");
    let path = write_fixture(dir.path(), SURVEY);
    let table = open(&path, false);

    let mut extractor = Extractor::new(["Cu"], true);
    for batch in scan(&table, &extractor.filter_spec()).expect("scan") {
        extractor.push_batch(&batch.expect("batch"));
    }
    let subset = extractor.finish().remove("Cu").unwrap_or_default();
    let processed = process(subset, ProcessOptions::default());

    let mut maxima = MaxAccumulator::per_hole();
    maxima.push_batch(processed.into_iter().map(|p| p.into_ppm_record()).collect());
    let rows = maxima.finish();

    // 0.2 % is 2000 ppm; hole 6364 has only a blank value.
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].drillhole_id, "6363");
    assert_eq!(rows[0].value(), Some(2000.0));
    assert_eq!(rows[0].record.sample_id, "102");

    let normaliser = Normaliser::new("Cu", &geochem_model::UserConfig::default());
    let table = max_table(&rows, &ColumnMap::builtin(SchemaTag::Sarig), &normaliser, false);
    assert_eq!(table.headers()[0], "DRILLHOLE_NUMBER");
    assert_eq!(table.rows()[0][4], "2000");
}

fn arb_record() -> impl Strategy<Value = Record> {
    (
        0u8..6,
        prop::sample::select(vec!["Cu", "Au", "Pb"]),
        prop::option::of(0u32..1000),
        prop::sample::select(vec!["ICP", "XRF", "FA"]),
        prop::option::of(prop::sample::select(vec!["DH1", "DH2"])),
        prop::sample::select(vec!["Drill core", "Soil", ""]),
    )
        .prop_map(|(sample, element, value, method, hole, source)| {
            let mut record = Record::reading(sample.to_string(), element, value.map(f64::from))
                .with_method(method)
                .with_unit("ppm");
            record.carried = vec![source.to_string()];
            match hole {
                Some(hole) => record.with_drillhole(hole),
                None => record,
            }
        })
}

proptest! {
    #[test]
    fn unrestricted_filter_is_identity(records in prop::collection::vec(arb_record(), 0..40)) {
        prop_assert_eq!(filter(records.clone(), &FilterSpec::default()), records);
    }

    #[test]
    fn reshape_is_order_independent(
        records in prop::collection::vec(arb_record(), 1..40),
        seed in any::<u64>(),
    ) {
        let mut shuffled = records.clone();
        let len = shuffled.len();
        let mut state = seed;
        for i in (1..len).rev() {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            let j = (state >> 33) as usize % (i + 1);
            shuffled.swap(i, j);
        }
        let options = WideOptions::new(true, true)
            .with_layout("SAMPLE_NO", vec!["SAMPLE_SOURCE".to_string()]);
        let a = to_wide(records, &options).expect("reshape");
        let b = to_wide(shuffled, &options).expect("reshape");
        prop_assert_eq!(a, b);
    }

    #[test]
    fn extraction_equals_filtered_projection(records in prop::collection::vec(arb_record(), 0..40)) {
        let subsets = extract(&records, ["Cu"], false);
        let expected: Vec<Record> = filter(records, &FilterSpec::default().with_elements(["Cu"]))
            .iter()
            .map(Record::narrow)
            .collect();
        prop_assert_eq!(&subsets["Cu"], &expected);
    }
}
