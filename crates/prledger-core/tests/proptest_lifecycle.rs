use chrono::Duration;
use proptest::prelude::*;

use prledger_core::lifecycle::{self, InitialCapture};
use prledger_core::model::{EditType, ManualEdit, RepairStatistics};
use prledger_core::store::LedgerStore;

#[path = "fixtures.rs"]
mod fixtures;
use fixtures::*;

fn arb_edit() -> impl Strategy<Value = (i64, String, bool)> {
    (-600_i64..600, "[a-z][a-z ]{0,15}", any::<bool>())
}

fn seeded_store() -> LedgerStore {
    let id = widget();
    let mut store = LedgerStore::new();
    let capture = InitialCapture {
        pr_state: open_state(&id),
        initial_diff: INITIAL_DIFF.to_string(),
        repair_statistics: RepairStatistics::empty(),
    };
    let record = lifecycle::create_initial(&store, &id, capture, t0()).expect("create initial");
    store.upsert(id, record);
    store
}

proptest! {
    #![proptest_config(proptest::test_runner::Config::with_cases(256))]

    #[test]
    fn manual_edits_keep_call_order_and_monotonic_timestamps(
        edits in prop::collection::vec(arb_edit(), 0..12)
    ) {
        let id = widget();
        let mut store = seeded_store();
        let mut previous = t0();
        let mut latest_clock = t0();

        for (offset, reason, before_open) in &edits {
            let now = t0() + Duration::seconds(*offset);
            latest_clock = latest_clock.max(now);
            let edit = ManualEdit {
                edit_type: if *before_open { EditType::BeforeOpenPr } else { EditType::AfterOpenPr },
                reason: reason.clone(),
                diff: String::new(),
            };
            let record = lifecycle::append_manual_edit(&store, &id, edit, now)
                .expect("append manual edit");

            let metadata = *record.record_metadata();
            prop_assert!(metadata.last_modified() >= previous);
            prop_assert_eq!(metadata.created_at(), t0());
            previous = metadata.last_modified();
            store.upsert(id.clone(), record);
        }

        let record = store.get(&id).expect("record exists");
        let stored: Vec<&str> = record.manual_edits().iter().map(|e| e.reason.as_str()).collect();
        let given: Vec<&str> = edits.iter().map(|(_, reason, _)| reason.as_str()).collect();
        prop_assert_eq!(stored, given);
        prop_assert_eq!(record.record_metadata().last_modified(), latest_clock);
        prop_assert_eq!(store.len(), 1);
    }

    #[test]
    fn reloading_a_ledger_reproduces_its_bytes(
        edits in prop::collection::vec(arb_edit(), 0..6)
    ) {
        let id = widget();
        let mut store = seeded_store();
        for (offset, reason, _) in edits {
            let edit = ManualEdit {
                edit_type: EditType::default(),
                reason,
                diff: "diff\n".to_string(),
            };
            let now = t0() + Duration::seconds(offset);
            let record = lifecycle::append_manual_edit(&store, &id, edit, now)
                .expect("append manual edit");
            store.upsert(id.clone(), record);
        }

        let text = store.to_json_string().expect("serialize");
        let reloaded = LedgerStore::from_json_str(&text).expect("parse");
        prop_assert_eq!(&reloaded, &store);
        prop_assert_eq!(reloaded.to_json_string().expect("serialize"), text);
    }
}
