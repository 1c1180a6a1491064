//! Behavior-driven tests for Market Data Service behavior
//!
//! These tests verify HOW the service enforces its session lifecycle and
//! business rules, focusing on user-visible outcomes. The feed is always a
//! scripted in-memory fetcher; no network is touched.

use tempfile::TempDir;
use tickvault_core::store::{self, BackendKind, StoreConfig};
use tickvault_core::{MarketDataService, ServiceError, StoreError};
use tickvault_tests::{bar_with_close, date, sample_bar, ticker, ScriptedFetcher};

fn json_config(temp: &TempDir) -> StoreConfig {
    StoreConfig::new(temp.path().join("store.json"), BackendKind::Json)
}

fn running_service(
    temp: &TempDir,
    fetcher: ScriptedFetcher,
) -> MarketDataService<ScriptedFetcher> {
    let config = json_config(temp);
    store::create(&config).expect("create store");
    let mut service = MarketDataService::new(fetcher);
    service.run(&config).expect("run");
    service
}

// =============================================================================
// Market Data Service: Session Lifecycle
// =============================================================================

#[test]
fn every_operation_fails_before_run_and_after_close() {
    let temp = TempDir::new().expect("tempdir");
    let amzn = ticker("AMZN");

    // Given: A service that has never run
    let mut service = MarketDataService::new(ScriptedFetcher::new());
    assert!(matches!(
        service.securities(),
        Err(ServiceError::NotInitialized)
    ));
    assert!(matches!(
        service.add_security(&amzn),
        Err(ServiceError::NotInitialized)
    ));

    // When: A full run/close cycle completes
    let config = json_config(&temp);
    store::create(&config).expect("create store");
    service.run(&config).expect("run");
    service.add_security(&amzn).expect("add while running");
    service.close().expect("close");

    // Then: The closed service behaves exactly like an uninitialized one
    assert!(matches!(
        service.series(&amzn),
        Err(ServiceError::NotInitialized)
    ));
    assert!(matches!(
        service.update_one(&amzn, date("2019-05-10")),
        Err(ServiceError::NotInitialized)
    ));
}

#[test]
fn run_against_a_missing_store_propagates_not_found_unchanged() {
    // The service never creates stores; that is the front end's explicit act.
    let temp = TempDir::new().expect("tempdir");
    let mut service = MarketDataService::new(ScriptedFetcher::new());
    let error = service.run(&json_config(&temp)).expect_err("must fail");
    assert!(matches!(
        error,
        ServiceError::Store(StoreError::NotFound { .. })
    ));
}

// =============================================================================
// Market Data Service: Security Register
// =============================================================================

#[test]
fn added_securities_are_listed_without_duplicates() {
    let temp = TempDir::new().expect("tempdir");
    let mut service = running_service(&temp, ScriptedFetcher::new());

    service.add_security(&ticker("AMZN")).expect("add AMZN");
    service.add_security(&ticker("GOOG")).expect("add GOOG");
    service.add_security(&ticker("AMZN")).expect("re-add AMZN");

    let listed = service.securities().expect("list");
    assert_eq!(listed, vec![ticker("AMZN"), ticker("GOOG")]);
}

#[test]
fn latest_bar_distinguishes_unknown_ticker_from_no_data() {
    let temp = TempDir::new().expect("tempdir");
    let mut service = running_service(&temp, ScriptedFetcher::new());
    let amzn = ticker("AMZN");

    // Given: A fresh store, the ticker is unknown
    assert!(service.securities().expect("fresh list").is_empty());
    assert!(matches!(
        service.latest_bar(&amzn),
        Err(ServiceError::Store(StoreError::UnknownTicker { .. }))
    ));

    // When: The ticker is registered but still has zero bars
    service.add_security(&amzn).expect("add");

    // Then: The failure class changes from unknown-ticker to no-data
    assert!(matches!(
        service.latest_bar(&amzn),
        Err(ServiceError::NoData { .. })
    ));
}

// =============================================================================
// Market Data Service: Single-Date Updates
// =============================================================================

#[test]
fn update_one_persists_exactly_the_fetched_bar() {
    // Given: A feed scripted with the AMZN close of 2019-05-10
    let temp = TempDir::new().expect("tempdir");
    let fetcher = ScriptedFetcher::new().with_bar("AMZN", "2019-05-10", sample_bar());
    let mut service = running_service(&temp, fetcher);
    let amzn = ticker("AMZN");

    // When: The date is fetched and persisted
    service.add_security(&amzn).expect("add");
    service
        .update_one(&amzn, date("2019-05-10"))
        .expect("update");

    // Then: The stored bar is field-for-field what the feed returned
    let stored = service.bar(&amzn, date("2019-05-10")).expect("read back");
    assert_eq!(stored, sample_bar());
    assert_eq!(stored.open.to_string(), "1898.00");
    assert_eq!(stored.volume, 5_718_000);
}

#[test]
fn update_one_never_contacts_the_feed_for_an_unregistered_ticker() {
    let temp = TempDir::new().expect("tempdir");
    let mut service = running_service(&temp, ScriptedFetcher::new());

    let error = service
        .update_one(&ticker("AMZN"), date("2019-05-10"))
        .expect_err("must fail");
    assert!(matches!(
        error,
        ServiceError::Store(StoreError::UnknownTicker { .. })
    ));
    // A fetch for an invalid ticker would be a wasted upstream call.
    assert_eq!(service.fetcher().calls(), 0);
}

#[test]
fn update_one_propagates_a_feed_miss_unchanged() {
    let temp = TempDir::new().expect("tempdir");
    let mut service = running_service(&temp, ScriptedFetcher::new());
    let amzn = ticker("AMZN");

    service.add_security(&amzn).expect("add");
    let error = service
        .update_one(&amzn, date("2019-05-10"))
        .expect_err("must fail");
    assert!(matches!(
        error,
        ServiceError::Feed(tickvault_core::FeedError::NoQuoteForDate { .. })
    ));
}

// =============================================================================
// Market Data Service: Ranged Refresh
// =============================================================================

#[test]
fn ranged_update_fetches_only_the_business_day_gap() {
    // Given: History ending Friday 2019-08-23, refreshing as of the Monday
    let temp = TempDir::new().expect("tempdir");
    let fetcher = ScriptedFetcher::new()
        .with_bar("AMZN", "2019-08-23", sample_bar())
        .with_bar("AMZN", "2019-08-26", bar_with_close("1768.87"));
    let mut service = running_service(&temp, fetcher);
    let amzn = ticker("AMZN");

    service.add_security(&amzn).expect("add");
    service
        .update_one(&amzn, date("2019-08-23"))
        .expect("seed friday bar");

    // When: The ranged refresh runs
    let outcome = service
        .update_range_as_of(&amzn, date("2019-08-26"))
        .expect("ranged update");

    // Then: The weekend is skipped, the one batch call asks for Monday only
    assert_eq!(outcome.updated, 1);
    assert!(outcome.unresolved.is_empty());
    assert_eq!(
        service.fetcher().requests(),
        vec![vec!["2019-08-26".to_owned()]]
    );

    let (latest_date, latest_bar) = service.latest_bar(&amzn).expect("latest");
    assert_eq!(latest_date, date("2019-08-26"));
    assert_eq!(latest_bar.close.to_string(), "1768.87");
}

#[test]
fn ranged_update_reports_unresolved_dates_instead_of_failing() {
    // Given: A gap covering Mon 2019-08-19 through Fri 2019-08-23 with only
    // three scripted hits, so Tuesday and Thursday come back unresolved.
    let temp = TempDir::new().expect("tempdir");
    let fetcher = ScriptedFetcher::new()
        .with_bar("AMZN", "2019-08-16", sample_bar())
        .with_bar("AMZN", "2019-08-19", bar_with_close("1816.12"))
        .with_bar("AMZN", "2019-08-21", bar_with_close("1823.54"))
        .with_bar("AMZN", "2019-08-23", bar_with_close("1749.62"));
    let mut service = running_service(&temp, fetcher);
    let amzn = ticker("AMZN");

    service.add_security(&amzn).expect("add");
    service
        .update_one(&amzn, date("2019-08-16"))
        .expect("seed prior friday");

    // When: The refresh resolves only part of the gap
    let outcome = service
        .update_range_as_of(&amzn, date("2019-08-23"))
        .expect("partial refresh is not an error");

    // Then: Hits are persisted, misses are reported, nothing is raised
    assert_eq!(outcome.updated, 3);
    assert_eq!(outcome.unresolved.len(), 2);

    let series = service.series(&amzn).expect("series");
    assert_eq!(series.len(), 4);
    assert_eq!(series[0].0, date("2019-08-23"));
}

#[test]
fn ranged_update_makes_no_feed_call_when_nothing_is_missing() {
    let temp = TempDir::new().expect("tempdir");
    let fetcher = ScriptedFetcher::new().with_bar("AMZN", "2019-08-26", sample_bar());
    let mut service = running_service(&temp, fetcher);
    let amzn = ticker("AMZN");

    service.add_security(&amzn).expect("add");
    service
        .update_one(&amzn, date("2019-08-26"))
        .expect("seed today");

    let outcome = service
        .update_range_as_of(&amzn, date("2019-08-26"))
        .expect("nothing to do");
    assert_eq!(outcome.updated, 0);
    // Only the seeding fetch happened; no batch call was made.
    assert!(service.fetcher().requests().is_empty());
    assert_eq!(service.fetcher().calls(), 1);
}

#[test]
fn ranged_update_with_no_history_on_a_weekend_makes_no_feed_call() {
    let temp = TempDir::new().expect("tempdir");
    let mut service = running_service(&temp, ScriptedFetcher::new());
    let amzn = ticker("AMZN");

    service.add_security(&amzn).expect("add");
    // 2019-08-24 is a Saturday; no prior data, so there is no gap.
    let outcome = service
        .update_range_as_of(&amzn, date("2019-08-24"))
        .expect("nothing to do");
    assert_eq!(outcome.updated, 0);
    assert!(outcome.unresolved.is_empty());
    assert_eq!(service.fetcher().calls(), 0);
}

#[test]
fn ranged_update_for_an_unregistered_ticker_is_rejected_before_fetching() {
    let temp = TempDir::new().expect("tempdir");
    let mut service = running_service(&temp, ScriptedFetcher::new());

    let error = service
        .update_range_as_of(&ticker("AMZN"), date("2019-08-26"))
        .expect_err("must fail");
    assert!(matches!(
        error,
        ServiceError::Store(StoreError::UnknownTicker { .. })
    ));
    assert_eq!(service.fetcher().calls(), 0);
}

// =============================================================================
// Market Data Service: Durability Across Sessions
// =============================================================================

#[test]
fn stored_bars_survive_close_and_a_fresh_session() {
    for kind in [BackendKind::Json, BackendKind::DuckDb] {
        // Given: A bar persisted through one full session
        let temp = TempDir::new().expect("tempdir");
        let config = StoreConfig::new(temp.path().join(format!("store.{kind}")), kind);
        store::create(&config).expect("create store");
        let amzn = ticker("AMZN");

        let fetcher = ScriptedFetcher::new().with_bar("AMZN", "2019-05-10", sample_bar());
        let mut service = MarketDataService::new(fetcher);
        service.run(&config).expect("run");
        service.add_security(&amzn).expect("add");
        service
            .update_one(&amzn, date("2019-05-10"))
            .expect("update");
        service.close().expect("close");

        // When: A brand-new service session opens the same store
        let mut reopened = MarketDataService::new(ScriptedFetcher::new());
        reopened.run(&config).expect("run again");

        // Then: The bar reads back exactly, decimals included
        let stored = reopened.bar(&amzn, date("2019-05-10")).expect("read back");
        assert_eq!(stored, sample_bar(), "{kind}");
        assert_eq!(stored.open.to_string(), "1898.00", "{kind}");
        reopened.close().expect("close");
    }
}
