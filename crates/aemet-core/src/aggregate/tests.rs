use super::*;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn rec(fields: &[(&str, &str)]) -> Record {
    fields
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn day(date: &str, tmed: &str) -> Record {
    rec(&[("fecha", date), ("indicativo", "0200E"), ("tmed", tmed)])
}

#[test]
fn reindexes_with_explicit_gaps() {
    let outcomes = vec![ChunkOutcome::Fetched(vec![
        day("1980-01-01", "9,8"),
        day("1980-01-04", "11,0"),
    ])];
    let s = aggregate("0200E", &outcomes, &AggregateOptions::default());

    assert_eq!(s.rows.len(), 4);
    assert_eq!(s.span(), Some((d(1980, 1, 1), d(1980, 1, 4))));
    assert_eq!(s.gap_days(), 2);
    assert_eq!(s.get(d(1980, 1, 1), "tmed"), Some(&Cell::Number(9.8)));
    assert_eq!(s.get(d(1980, 1, 2), "tmed"), Some(&Cell::Missing));
    assert_eq!(s.get(d(1980, 1, 4), "indicativo"), Some(&Cell::Text("0200E".into())));
    assert_eq!(s.columns, vec!["indicativo", "tmed"]);
}

#[test]
fn sorts_and_keeps_first_occurrence() {
    let outcomes = vec![
        ChunkOutcome::Fetched(vec![day("1980-04-01", "1,0"), day("1980-03-31", "2,0")]),
        ChunkOutcome::EmptyConfirmed,
        ChunkOutcome::Fetched(vec![day("1980-04-01", "99,0"), day("1980-04-02", "3,0")]),
    ];
    let s = aggregate("0200E", &outcomes, &AggregateOptions::default());
    let dates: Vec<_> = s.rows.iter().map(|r| r.date).collect();
    assert_eq!(dates, vec![d(1980, 3, 31), d(1980, 4, 1), d(1980, 4, 2)]);
    assert_eq!(s.get(d(1980, 4, 1), "tmed"), Some(&Cell::Number(1.0)));
}

#[test]
fn dedup_is_idempotent() {
    let once = vec![ChunkOutcome::Fetched(vec![
        day("1980-01-01", "1,0"),
        day("1980-01-02", "2,0"),
    ])];
    let twice: Vec<_> = once.iter().chain(once.iter()).cloned().collect();
    let opts = AggregateOptions::default();
    assert_eq!(aggregate("0200E", &once, &opts), aggregate("0200E", &twice, &opts));
}

#[test]
fn coerces_sentinels() {
    let outcomes = vec![ChunkOutcome::Fetched(vec![rec(&[
        ("fecha", "1980-01-01"),
        ("prec", "Ip"),
        ("sol", ""),
        ("racha", "Varias"),
        ("tmax", "3,4"),
        ("horatmax", "Varias"),
    ])])];
    let s = aggregate("0200E", &outcomes, &AggregateOptions::default());
    let at = |c: &str| s.get(d(1980, 1, 1), c).cloned();
    assert_eq!(at("prec"), Some(Cell::Number(0.0)));
    assert_eq!(at("sol"), Some(Cell::Missing));
    assert_eq!(at("racha"), Some(Cell::Missing));
    assert_eq!(at("tmax"), Some(Cell::Number(3.4)));
    // not a numeric field: passed through verbatim
    assert_eq!(at("horatmax"), Some(Cell::Text("Varias".into())));
}

#[test]
fn drops_foreign_and_undated_records() {
    let outcomes = vec![ChunkOutcome::Fetched(vec![
        day("1980-01-01", "1,0"),
        rec(&[("fecha", "1980-01-02"), ("indicativo", "3195"), ("tmed", "5,0")]),
        rec(&[("fecha", "not a date"), ("tmed", "5,0")]),
        rec(&[("tmed", "5,0")]),
    ])];
    let s = aggregate("0200E", &outcomes, &AggregateOptions::default());
    assert_eq!(s.rows.len(), 1);
}

#[test]
fn empty_input_gives_empty_series() {
    let s = aggregate(
        "0200E",
        &[ChunkOutcome::EmptyConfirmed],
        &AggregateOptions::default(),
    );
    assert!(s.is_empty());
    assert_eq!(s.span(), None);
    assert_eq!(String::from_utf8(s.to_csv().unwrap()).unwrap(), "fecha\n");
}

#[test]
fn csv_has_date_column_and_empty_missing_cells() {
    let outcomes = vec![ChunkOutcome::Fetched(vec![
        day("1980-01-01", "9,8"),
        day("1980-01-03", "Ip"),
    ])];
    let s = aggregate("0200E", &outcomes, &AggregateOptions::default());
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("out/aemet_0200E.csv");
    s.write_csv(&path).unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert_eq!(
        text,
        "fecha,indicativo,tmed\n1980-01-01,0200E,9.8\n1980-01-02,,\n1980-01-03,0200E,0\n"
    );
}
