use std::sync::Arc;

use chrono::Utc;
use llm_trade_broker::PaperBroker;
use llm_trade_core::{Candidate, ExitReason, MockMarketDataSource, Sentiment, TradeRecord, TradeStore};
use llm_trade_data::TradeDatabase;
use llm_trade_position_manager::{MonitorConfig, PositionMonitor, PositionOutcome};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn quotes(close: Decimal) -> MockMarketDataSource {
    let mut market = MockMarketDataSource::new();
    market.expect_fetch().returning(move |symbol| {
        Ok(Some(Candidate {
            symbol: symbol.to_string(),
            close,
            support: dec!(95),
            resistance: dec!(105),
            rsi: dec!(50),
            sentiment: Sentiment::Neutral,
        }))
    });
    market
}

async fn seeded(close: Decimal) -> (Arc<TradeDatabase>, Arc<PaperBroker>) {
    let db = Arc::new(TradeDatabase::in_memory().await.unwrap());
    db.insert_trade(&TradeRecord {
        symbol: "TCS.NS".to_string(),
        quantity: 10,
        entry: dec!(100),
        target: dec!(102.5),
        stop: dec!(98.5),
        order_id: "PAPER-1-0".to_string(),
        executed_at: Utc::now(),
    })
    .await
    .unwrap();

    let broker = Arc::new(PaperBroker::new(Arc::new(quotes(close))));
    broker.restore(&db.open_trades().await.unwrap()).await;
    (db, broker)
}

#[tokio::test]
async fn target_exit_closes_trade_in_store_and_book() {
    let (db, broker) = seeded(dec!(103)).await;
    let monitor = PositionMonitor::new(broker.clone(), db.clone(), MonitorConfig::default());

    let report = monitor.run_cycle().await.unwrap();
    assert_eq!(report.exits().len(), 1);

    let exits = db.all_exits().await.unwrap();
    assert_eq!(exits.len(), 1);
    assert_eq!(exits[0].reason, ExitReason::TargetReached);
    assert_eq!(exits[0].price, dec!(102.5));
    assert_eq!(exits[0].entry_order_id.as_deref(), Some("PAPER-1-0"));

    assert!(db.open_trades().await.unwrap().is_empty());
    assert!(llm_trade_core::Brokerage::open_positions(broker.as_ref())
        .await
        .unwrap()
        .is_empty());

    let logs = db.recent_logs(10).await.unwrap();
    assert!(logs.iter().any(|row| row.message.starts_with("Position Exited: ")));
}

#[tokio::test]
async fn trailing_stop_is_ratcheted_and_reused() {
    let (db, broker) = seeded(dec!(100.2)).await;
    let monitor = PositionMonitor::new(broker.clone(), db.clone(), MonitorConfig::default());

    let report = monitor.run_cycle().await.unwrap();
    assert!(matches!(
        report.outcomes[0],
        PositionOutcome::StopRaised { order_modified: true, .. }
    ));
    assert_eq!(broker.trigger_price("TCS.NS").await, Some(dec!(99.699)));
    assert_eq!(db.trailing_stop("PAPER-1-0").await.unwrap(), Some(dec!(99.699)));

    // Same price next cycle: the stored stop already covers the candidate.
    let report = monitor.run_cycle().await.unwrap();
    assert!(matches!(report.outcomes[0], PositionOutcome::Held { .. }));
}

#[tokio::test]
async fn new_entry_ignores_earlier_ratchet_in_symbol() {
    let db = Arc::new(TradeDatabase::in_memory().await.unwrap());
    // Left behind by a position that closed outside the monitor.
    db.save_trailing_stop("PAPER-1-0", "TCS.NS", dec!(99.699)).await.unwrap();

    db.insert_trade(&TradeRecord {
        symbol: "TCS.NS".to_string(),
        quantity: 10,
        entry: dec!(90),
        target: dec!(92.25),
        stop: dec!(88.65),
        order_id: "PAPER-2-0".to_string(),
        executed_at: Utc::now(),
    })
    .await
    .unwrap();

    let broker = Arc::new(PaperBroker::new(Arc::new(quotes(dec!(90)))));
    broker.restore(&db.open_trades().await.unwrap()).await;
    let monitor = PositionMonitor::new(broker.clone(), db.clone(), MonitorConfig::default());

    let report = monitor.run_cycle().await.unwrap();
    assert!(report.exits().is_empty());
    assert!(matches!(
        report.outcomes[0],
        PositionOutcome::StopRaised { from, .. } if from == dec!(88.65)
    ));
    assert!(db.all_exits().await.unwrap().is_empty());
    assert!(db.trailing_stop("PAPER-1-0").await.unwrap().is_none());
    assert_eq!(db.trailing_stop("PAPER-2-0").await.unwrap(), Some(dec!(89.55)));
}
