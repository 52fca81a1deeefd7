//! Join-finished handling and rejoin policies.

use crate::mock_node::{MockNode, PortCall, RecordingSink};

use lpnode::app::events::AppEvent;
use lpnode::app::ports::RadioError;
use lpnode::app::service::NodeController;
use lpnode::config::{NodeConfig, RejoinPolicy};

fn with_rejoin(policy: RejoinPolicy) -> NodeController {
    NodeController::new(NodeConfig {
        rejoin_policy: policy,
        ..Default::default()
    })
}

#[test]
fn successful_join_captures_session() {
    let mut ctl = NodeController::new(NodeConfig::default());
    let mut hw = MockNode::new();
    let mut sink = RecordingSink::new();

    ctl.on_join_finished(true, &mut hw, &mut sink);

    let session = ctl.session().expect("session stored");
    assert_eq!(session.nwk_skey, [0xA5; 16]);
    assert_eq!(session.app_skey, [0x5A; 16]);
    assert_eq!(session.dev_addr, 0x260B_1234);
    assert_eq!(
        sink.last(),
        Some(&AppEvent::Joined {
            dev_addr: 0x260B_1234
        })
    );
}

#[test]
fn failed_join_keeps_previous_session() {
    let mut ctl = NodeController::new(NodeConfig::default());
    let mut hw = MockNode::new();
    let mut sink = RecordingSink::new();

    ctl.on_join_finished(true, &mut hw, &mut sink);
    hw.dev_addr = 0xDEAD_BEEF;
    ctl.on_join_finished(false, &mut hw, &mut sink);

    assert_eq!(ctl.session().map(|s| s.dev_addr), Some(0x260B_1234));
    assert_eq!(ctl.join_failures(), 1);
}

#[test]
fn manual_policy_never_rejoins() {
    let mut ctl = with_rejoin(RejoinPolicy::Manual);
    let mut hw = MockNode::unjoined();
    let mut sink = RecordingSink::new();

    for _ in 0..5 {
        ctl.on_join_finished(false, &mut hw, &mut sink);
    }

    assert_eq!(hw.joins(), 0);
    assert!(ctl.session().is_none());
    assert_eq!(
        sink.count(|e| *e == AppEvent::JoinFailed { rejoin: false }),
        5
    );
}

#[test]
fn bounded_policy_rejoins_until_limit() {
    let mut ctl = with_rejoin(RejoinPolicy::Bounded { max_attempts: 3 });
    let mut hw = MockNode::unjoined();
    let mut sink = RecordingSink::new();

    for _ in 0..6 {
        ctl.on_join_finished(false, &mut hw, &mut sink);
    }

    // Failures 1 and 2 re-issue the join; the third reaches the limit.
    assert_eq!(hw.joins(), 2);
    assert_eq!(sink.count(|e| *e == AppEvent::JoinFailed { rejoin: true }), 2);
    assert_eq!(ctl.join_failures(), 6);
}

#[test]
fn success_resets_rejoin_budget() {
    let mut ctl = with_rejoin(RejoinPolicy::Bounded { max_attempts: 2 });
    let mut hw = MockNode::new();
    let mut sink = RecordingSink::new();

    ctl.on_join_finished(false, &mut hw, &mut sink);
    ctl.on_join_finished(true, &mut hw, &mut sink);
    assert_eq!(ctl.join_failures(), 0);

    ctl.on_join_finished(false, &mut hw, &mut sink);
    assert_eq!(hw.joins(), 2);
}

#[test]
fn rejected_rejoin_request_is_reported() {
    let mut ctl = with_rejoin(RejoinPolicy::Bounded { max_attempts: 5 });
    let mut hw = MockNode::unjoined();
    hw.join_result = Err(RadioError::Busy);
    let mut sink = RecordingSink::new();

    ctl.on_join_finished(false, &mut hw, &mut sink);

    assert_eq!(hw.calls, vec![PortCall::Join]);
    assert_eq!(sink.last(), Some(&AppEvent::JoinFailed { rejoin: false }));
}
