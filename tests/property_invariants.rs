use proptest::prelude::*;

use studybundle_backend::analytics::rollup::apply_order_to_day;
use studybundle_backend::analytics::wrong_answers::{apply_wrong_answer, WrongAnswerSnapshot};
use studybundle_backend::store::operations::metrics::DailyMetric;

fn snapshot(html: &str) -> WrongAnswerSnapshot {
    WrongAnswerSnapshot {
        question_set_id: "qs1".to_string(),
        question_index: 0,
        title: "Set".to_string(),
        collection_id: String::new(),
        collection_name: String::new(),
        html: html.to_string(),
        correct_answer: "A".to_string(),
        explanation: String::new(),
        selector: "#a".to_string(),
    }
}

proptest! {
    #[test]
    fn pt_wrong_counter_counts_every_event(repeats in 1usize..64) {
        let first = snapshot("<p>original</p>");
        let mut stat = None;
        for _ in 0..repeats {
            stat = Some(apply_wrong_answer("ALL", stat, &first, 0));
        }
        let stat = stat.unwrap();
        prop_assert_eq!(stat.wrong_count, repeats as u64);
    }

    #[test]
    fn pt_snapshot_fields_are_first_writer_wins(
        repeats in 2usize..32,
        later_html in "<p>[a-z]{1,16}</p>",
    ) {
        let first = snapshot("<p>original</p>");
        let mut stat = Some(apply_wrong_answer("ALL", None, &first, 0));
        let later = snapshot(&later_html);
        for _ in 1..repeats {
            stat = Some(apply_wrong_answer("ALL", stat, &later, 1));
        }
        let stat = stat.unwrap();
        prop_assert_eq!(stat.html.as_str(), "<p>original</p>");
        prop_assert_eq!(stat.wrong_count, repeats as u64);
    }

    #[test]
    fn pt_day_metric_invariants_hold_under_any_order_sequence(
        events in proptest::collection::vec((0u8..5, 1i64..100_000), 1..40),
    ) {
        let mut metric: Option<DailyMetric> = None;
        let mut expected_revenue = 0i64;
        for (user_idx, amount) in &events {
            let user = format!("u{user_idx}");
            expected_revenue += amount;
            metric = Some(apply_order_to_day(
                metric,
                "default",
                "VND",
                "2025-03-10",
                &user,
                *amount,
                0,
            ));
        }
        let metric = metric.unwrap();

        let distinct_users = {
            let mut ids: Vec<u8> = events.iter().map(|(u, _)| *u).collect();
            ids.sort_unstable();
            ids.dedup();
            ids.len() as u64
        };

        prop_assert_eq!(metric.revenue, expected_revenue);
        prop_assert_eq!(metric.order_count, events.len() as u64);
        prop_assert_eq!(metric.paying_users, distinct_users);
        prop_assert_eq!(metric.paying_users as usize, metric.paying_user_ids.len());
    }
}
