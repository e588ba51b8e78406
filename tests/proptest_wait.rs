//! Property tests for the condition poller
//!
//! For arbitrary URL sequences and prefixes: the poller resolves satisfied
//! exactly when some sampled URL starts with the prefix, on exactly that
//! tick, and transient probe failures never change the answer.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use proptest::prelude::*;

use hh_pilot::error::Error;
use hh_pilot::wait::{wait_for_url_prefix, PollOptions, ShutdownSignal, WaitOutcome};

const URL_POOL: &[&str] = &[
    "https://example.com",
    "https://example.org",
    "https://example.org/page",
    "https://hh.ru/search/vacancy?from=resumelist",
    "https://hh.ru/applicant/vacancy_response?vacancyId=1",
    "about:blank",
];

const PREFIXES: &[&str] = &[
    "https://example.org",
    "https://hh.ru/search/vacancy",
    "https://never.example",
];

fn url_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(URL_POOL)
}

fn prefix_strategy() -> impl Strategy<Value = &'static str> {
    prop::sample::select(PREFIXES)
}

/// Each step is either a sampled URL or a transient probe failure.
#[derive(Debug, Clone)]
enum Step {
    Url(&'static str),
    TransientError,
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        4 => url_strategy().prop_map(Step::Url),
        1 => Just(Step::TransientError),
    ]
}

fn run_poller(steps: Vec<Step>, prefix: &str, deadline: Duration) -> (WaitOutcome, u32) {
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .expect("runtime");

    let calls = Arc::new(AtomicU32::new(0));
    let queue = Arc::new(Mutex::new(VecDeque::from(steps)));
    let counter = calls.clone();

    let probe = move || {
        let queue = queue.clone();
        let counter = counter.clone();
        async move {
            counter.fetch_add(1, Ordering::SeqCst);
            // Once the script runs out, report a URL that matches nothing
            let step = queue
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or(Step::Url("about:blank"));
            match step {
                Step::Url(url) => Ok(url.to_string()),
                Step::TransientError => Err(Error::generic("Execution context was destroyed")),
            }
        }
    };

    let signal = ShutdownSignal::new();
    let opts = PollOptions {
        interval: Duration::from_millis(1),
        log_every: 0,
        deadline: Some(deadline),
    };

    let outcome = rt.block_on(wait_for_url_prefix(probe, prefix, &signal, opts, "prop"));
    (outcome, calls.load(Ordering::SeqCst))
}

fn expected_satisfied_tick(steps: &[Step], prefix: &str) -> Option<u32> {
    steps.iter().enumerate().find_map(|(i, step)| match step {
        Step::Url(url) if url.starts_with(prefix) => Some(i as u32 + 1),
        _ => None,
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn satisfied_iff_a_sample_matches(
        steps in prop::collection::vec(step_strategy(), 1..10),
        prefix in prefix_strategy(),
    ) {
        match expected_satisfied_tick(&steps, prefix) {
            Some(tick) => {
                // A generous deadline that resolution at tick <= 10 never hits
                let (outcome, calls) = run_poller(steps, prefix, Duration::from_secs(10));
                prop_assert_eq!(outcome, WaitOutcome::Satisfied);
                prop_assert_eq!(calls, tick);
            }
            None => {
                // Tail samples never match either, so a bounded wait
                // must run out of time
                let (outcome, _) = run_poller(steps, prefix, Duration::from_millis(20));
                prop_assert_eq!(outcome, WaitOutcome::TimedOut);
            }
        }
    }

    #[test]
    fn failures_before_a_match_never_block_satisfaction(
        failures in 0u32..8,
        prefix in prefix_strategy().prop_filter("needs a matchable prefix", |p| *p != "https://never.example"),
    ) {
        let mut steps: Vec<Step> = (0..failures).map(|_| Step::TransientError).collect();
        let matching = if prefix == "https://example.org" {
            "https://example.org/page"
        } else {
            "https://hh.ru/search/vacancy?from=resumelist"
        };
        steps.push(Step::Url(matching));

        let (outcome, calls) = run_poller(steps, prefix, Duration::from_secs(10));

        prop_assert_eq!(outcome, WaitOutcome::Satisfied);
        prop_assert_eq!(calls, failures + 1);
    }
}
