//! Tx-finished accounting and the restart threshold.

use crate::mock_node::{MockNode, PortCall, RecordingSink};

use lpnode::app::events::AppEvent;
use lpnode::app::service::NodeController;
use lpnode::config::{AckPolicy, NodeConfig};

fn confirmed(policy: AckPolicy) -> NodeController {
    NodeController::new(NodeConfig {
        confirmed: true,
        ack_policy: policy,
        ..Default::default()
    })
}

#[test]
fn nine_naks_do_not_restart() {
    let mut ctl = confirmed(AckPolicy::ResetOnAck);
    let mut hw = MockNode::new();
    let mut sink = RecordingSink::new();

    for _ in 0..9 {
        ctl.on_tx_finished(false, &mut hw, &mut sink);
    }
    assert_eq!(hw.restarts(), 0);
    assert_eq!(ctl.send_failures(), 9);
}

#[test]
fn tenth_nak_restarts_after_settle_delay() {
    let mut ctl = confirmed(AckPolicy::ResetOnAck);
    let mut hw = MockNode::new();
    let mut sink = RecordingSink::new();

    for _ in 0..10 {
        ctl.on_tx_finished(false, &mut hw, &mut sink);
    }

    assert_eq!(hw.calls, vec![PortCall::DelayMs(100), PortCall::Restart]);
    assert_eq!(ctl.send_failures(), 0);
    assert_eq!(ctl.stats().restarts, 1);
    assert_eq!(sink.last(), Some(&AppEvent::Restarting { failures: 10 }));
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::Restarting { .. })),
        1
    );
}

#[test]
fn ack_clears_count_under_reset_policy() {
    let mut ctl = confirmed(AckPolicy::ResetOnAck);
    let mut hw = MockNode::new();
    let mut sink = RecordingSink::new();

    for _ in 0..9 {
        ctl.on_tx_finished(false, &mut hw, &mut sink);
    }
    ctl.on_tx_finished(true, &mut hw, &mut sink);
    assert_eq!(ctl.send_failures(), 0);

    for _ in 0..9 {
        ctl.on_tx_finished(false, &mut hw, &mut sink);
    }
    assert_eq!(hw.restarts(), 0);
}

#[test]
fn acks_do_not_help_under_accumulate_policy() {
    let mut ctl = confirmed(AckPolicy::Accumulate);
    let mut hw = MockNode::new();
    let mut sink = RecordingSink::new();

    for _ in 0..9 {
        ctl.on_tx_finished(false, &mut hw, &mut sink);
        ctl.on_tx_finished(true, &mut hw, &mut sink);
    }
    assert_eq!(ctl.send_failures(), 9);
    assert_eq!(ctl.stats().acks, 9);

    ctl.on_tx_finished(false, &mut hw, &mut sink);
    assert_eq!(hw.restarts(), 1);
}

#[test]
fn unconfirmed_uplinks_leave_counter_alone() {
    let mut ctl = NodeController::new(NodeConfig::default());
    let mut hw = MockNode::new();
    let mut sink = RecordingSink::new();

    for _ in 0..25 {
        ctl.on_tx_finished(false, &mut hw, &mut sink);
    }
    assert_eq!(ctl.send_failures(), 0);
    assert!(hw.calls.is_empty());
    assert!(matches!(
        sink.last(),
        Some(AppEvent::TxFinished {
            confirmed: false,
            failures: 0,
            ..
        })
    ));
}

#[test]
fn p2p_tx_finished_is_log_only() {
    let mut ctl = NodeController::new(NodeConfig {
        lorawan_enabled: false,
        confirmed: true,
        ..Default::default()
    });
    let mut hw = MockNode::new();
    let mut sink = RecordingSink::new();

    for _ in 0..15 {
        ctl.on_tx_finished(false, &mut hw, &mut sink);
    }
    assert_eq!(ctl.send_failures(), 0);
    assert_eq!(hw.restarts(), 0);
    assert_eq!(sink.count(|e| *e == AppEvent::P2pTxFinished), 15);
}

#[test]
fn reconfiguring_keeps_the_count() {
    let mut ctl = confirmed(AckPolicy::ResetOnAck);
    let mut hw = MockNode::new();
    let mut sink = RecordingSink::new();

    for _ in 0..4 {
        ctl.on_tx_finished(false, &mut hw, &mut sink);
    }

    let tighter = NodeConfig {
        confirmed: true,
        max_send_failures: 5,
        ..Default::default()
    };
    ctl.apply_config(tighter).expect("valid config");
    assert_eq!(ctl.send_failures(), 4);

    ctl.on_tx_finished(false, &mut hw, &mut sink);
    assert_eq!(hw.restarts(), 1);
}

#[test]
fn invalid_config_is_refused_whole() {
    let mut ctl = confirmed(AckPolicy::ResetOnAck);
    let bad = NodeConfig {
        max_send_failures: 0,
        ..Default::default()
    };
    assert!(ctl.apply_config(bad).is_err());
    assert_eq!(ctl.config().max_send_failures, 10);
    assert!(ctl.config().confirmed);
}
