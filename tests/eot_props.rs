//! Property tests for the end-of-transmission filter

use hecate_cli::eot::{pipe, EotFilter, Scan, TransferOutcome};
use hecate_cli::{CancelToken, HecateError};
use proptest::prelude::*;

const SENTINEL: &str = "{\"__eot__\":true}\n";

fn record() -> impl Strategy<Value = String> {
    (any::<u32>(), "[a-zA-Z ]{0,12}").prop_map(|(id, name)| {
        serde_json::json!({ "type": "Feature", "id": id, "properties": { "name": name } })
            .to_string()
    })
}

/// Feed `body` split at `cuts` and collect the sink and outcome.
fn feed(body: &[u8], cuts: &[usize]) -> (Vec<u8>, Result<TransferOutcome, String>) {
    let mut points: Vec<usize> = cuts.iter().map(|c| c % (body.len() + 1)).collect();
    points.push(0);
    points.push(body.len());
    points.sort_unstable();
    points.dedup();

    let mut sink = Vec::new();
    let mut filter = EotFilter::new();
    for window in points.windows(2) {
        match filter.push(&body[window[0]..window[1]], &mut sink) {
            Ok(Scan::NeedMore) => {}
            Ok(Scan::Done) => break,
            Err(e) => return (sink, Err(e.to_string())),
        }
    }
    (sink, Ok(filter.finish()))
}

proptest! {
    #[test]
    fn complete_transfers_forward_every_record(records in prop::collection::vec(record(), 0..20)) {
        let mut body = String::new();
        for r in &records {
            body.push_str(r);
            body.push('\n');
        }
        let expected = body.clone();
        body.push_str(SENTINEL);

        let (sink, outcome) = feed(body.as_bytes(), &[]);
        prop_assert_eq!(outcome, Ok(TransferOutcome::Complete { records: records.len() as u64 }));
        prop_assert_eq!(String::from_utf8(sink).unwrap(), expected);
    }

    #[test]
    fn missing_sentinel_reports_forwarded_count(records in prop::collection::vec(record(), 0..20)) {
        let body: String = records.iter().map(|r| format!("{r}\n")).collect();

        let (sink, outcome) = feed(body.as_bytes(), &[]);
        prop_assert_eq!(outcome, Ok(TransferOutcome::Truncated { records: records.len() as u64 }));
        prop_assert_eq!(sink, body.into_bytes());
    }

    #[test]
    fn chunk_boundaries_do_not_matter(
        records in prop::collection::vec(record(), 0..10),
        terminated in any::<bool>(),
        garbage in any::<bool>(),
        cuts in prop::collection::vec(any::<usize>(), 0..40),
    ) {
        let mut body: String = records.iter().map(|r| format!("{r}\n")).collect();
        if garbage {
            body.push_str("{\"broken\":\n");
        }
        if terminated {
            body.push_str(SENTINEL);
        }
        body.push_str("{\"trailing\":");

        let whole = feed(body.as_bytes(), &[]);
        let split = feed(body.as_bytes(), &cuts);
        prop_assert_eq!(&whole, &split);

        let bytes: Vec<usize> = (0..body.len()).collect();
        let single = feed(body.as_bytes(), &bytes);
        prop_assert_eq!(&whole, &single);
    }
}

#[test]
fn pipe_matches_push_for_readers() {
    let body = format!("{{\"id\":1}}\n{{\"id\":2}}\n{SENTINEL}");
    let mut sink = Vec::new();
    let outcome = pipe(body.as_bytes(), &mut sink, &CancelToken::new()).unwrap();

    assert_eq!(outcome, TransferOutcome::Complete { records: 2 });
    assert_eq!(sink, b"{\"id\":1}\n{\"id\":2}\n");
}

#[test]
fn malformed_record_surfaces_as_error() {
    let mut sink = Vec::new();
    let err = pipe(&b"{\"id\":1}\nnope\n"[..], &mut sink, &CancelToken::new()).unwrap_err();

    assert!(matches!(err, HecateError::MalformedRecord { line: 2, .. }));
    assert_eq!(sink, b"{\"id\":1}\n");
}
