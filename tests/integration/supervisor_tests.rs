//! ConnectionSupervisor against a scripted link on a simulated clock.

use std::net::Ipv4Addr;

use uplink::app::events::LinkEvent;
use uplink::app::supervisor::{ADDRESS_WAIT_CEILING_MS, INITIAL_WINDOW_MS, MIN_RETRY_INTERVAL_MS};
use uplink::error::AssociationError;
use uplink::{ClockPort, CommandServer, ConnectionSupervisor};

use crate::mock_hw::{
    test_config, AssociationPlan, MockLink, MockListener, RecordingSink, SimClock, TEST_ADDRESS,
};

const OTHER_ADDRESS: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 42);

fn supervisor(link: MockLink, retry_ms: u32) -> ConnectionSupervisor<MockLink> {
    ConnectionSupervisor::new(&test_config(retry_ms), link)
}

// ── attempt_association ───────────────────────────────────────

#[test]
fn success_records_the_observed_address() {
    let clock = SimClock::new();
    let link = MockLink::new(&clock, AssociationPlan::succeeds(1000, 500));
    let mut sup = supervisor(link, 1000);
    let mut sink = RecordingSink::new();
    let mut c = clock.clone();

    assert!(sup.attempt_association(5000, &mut c, &mut sink));
    assert_eq!(sup.last_known_address(), Some(TEST_ADDRESS));
    assert_eq!(sup.current_address(), Some(TEST_ADDRESS));
    assert_eq!(clock.now_ms(), 1600);
    assert_eq!(sink.count(&LinkEvent::Associated { address: TEST_ADDRESS }), 1);
}

#[test]
fn link_timeout_keeps_last_known_address() {
    let clock = SimClock::new();
    let link = MockLink::new(&clock, AssociationPlan::succeeds(0, 0)).script([
        AssociationPlan::succeeds(0, 0),
        AssociationPlan::succeeds(6000, 0).with_address(OTHER_ADDRESS),
    ]);
    let mut sup = supervisor(link, 1000);
    let mut sink = RecordingSink::new();
    let mut c = clock.clone();

    assert!(sup.attempt_association(5000, &mut c, &mut sink));
    sup.link_mut().drop_link();

    let start = clock.now_ms();
    assert_eq!(
        sup.try_association(5000, &mut c, &mut sink),
        Err(AssociationError::LinkTimeout)
    );
    assert_eq!(clock.now_ms() - start, 5000);
    assert_eq!(sup.last_known_address(), Some(TEST_ADDRESS));
    assert_eq!(sink.count(&LinkEvent::LinkTimeout), 1);
    assert_eq!(sink.count(&LinkEvent::NoAddress), 0);
}

#[test]
fn slow_lease_fails_then_fast_lease_succeeds() {
    let clock = SimClock::new();
    let link = MockLink::new(&clock, AssociationPlan::no_link()).script([
        AssociationPlan::succeeds(0, 6000),
        AssociationPlan::succeeds(0, 1000).with_address(OTHER_ADDRESS),
    ]);
    let mut sup = supervisor(link, 1000);
    let mut sink = RecordingSink::new();
    let mut c = clock.clone();

    assert_eq!(sup.try_association(5000, &mut c, &mut sink), Err(AssociationError::NoAddress));
    assert_eq!(clock.now_ms(), u64::from(ADDRESS_WAIT_CEILING_MS));
    assert_eq!(sup.last_known_address(), None);
    assert!(sup.is_linked());

    assert_eq!(sup.try_association(5000, &mut c, &mut sink), Ok(OTHER_ADDRESS));
    assert_eq!(sup.last_known_address(), Some(OTHER_ADDRESS));
    assert_eq!(clock.now_ms(), u64::from(ADDRESS_WAIT_CEILING_MS) + 1000);
}

#[test]
fn clean_disconnect_precedes_request_only_when_down() {
    let clock = SimClock::new();
    let link = MockLink::new(&clock, AssociationPlan::succeeds(0, 0));
    let mut sup = supervisor(link, 1000);
    let mut sink = RecordingSink::new();
    let mut c = clock.clone();

    assert!(sup.attempt_association(5000, &mut c, &mut sink));
    assert_eq!(sup.link().call_log, "DB");

    // Already connected: no disconnect before the request.
    assert!(sup.attempt_association(5000, &mut c, &mut sink));
    assert_eq!(sup.link().call_log, "DBB");
}

#[test]
#[should_panic(expected = "halted")]
fn missing_radio_halts_instead_of_returning() {
    let clock = SimClock::new();
    let mut sup = supervisor(MockLink::without_hardware(&clock), 1000);
    let mut c = clock.clone();
    sup.attempt_association(5000, &mut c, &mut RecordingSink::new());
}

// ── begin ─────────────────────────────────────────────────────

#[test]
fn begin_retries_until_associated_then_listens() {
    let clock = SimClock::new();
    let link = MockLink::new(&clock, AssociationPlan::succeeds(500, 0))
        .script([AssociationPlan::no_link(), AssociationPlan::no_link()]);
    let mut sup = supervisor(link, 1000);
    let mut server = CommandServer::new(MockListener::new(&clock));
    let mut sink = RecordingSink::new();
    let mut c = clock.clone();

    assert!(sup.begin(&mut server, &mut c, &mut sink));

    let window = u64::from(INITIAL_WINDOW_MS);
    assert_eq!(sup.link().begin_calls, vec![0, window + 1000, 2 * (window + 1000)]);
    assert_eq!(server.listener().start_calls, vec![9000]);
    assert!(sup.server_started());
    assert_eq!(sup.last_known_address(), Some(TEST_ADDRESS));
    assert_eq!(sink.count(&LinkEvent::ListenerStarted { port: 9000 }), 1);
}

#[test]
fn begin_uses_clamped_interval_for_zero_retry() {
    let clock = SimClock::new();
    let link = MockLink::new(&clock, AssociationPlan::succeeds(0, 0))
        .script([AssociationPlan::no_link()]);
    let mut sup = supervisor(link, 0);
    let mut server = CommandServer::new(MockListener::new(&clock));
    let mut c = clock.clone();

    assert!(sup.begin(&mut server, &mut c, &mut RecordingSink::new()));
    assert_eq!(
        sup.link().begin_calls,
        vec![0, u64::from(INITIAL_WINDOW_MS + MIN_RETRY_INTERVAL_MS)]
    );
}

#[test]
fn second_begin_does_not_restart_listener() {
    let clock = SimClock::new();
    let link = MockLink::new(&clock, AssociationPlan::succeeds(0, 0));
    let mut sup = supervisor(link, 1000);
    let mut server = CommandServer::new(MockListener::new(&clock));
    let mut sink = RecordingSink::new();
    let mut c = clock.clone();

    assert!(sup.begin(&mut server, &mut c, &mut sink));
    assert!(sup.begin(&mut server, &mut c, &mut sink));
    assert_eq!(server.listener().start_calls.len(), 1);
}

#[test]
fn failed_listener_is_not_latched() {
    let clock = SimClock::new();
    let link = MockLink::new(&clock, AssociationPlan::succeeds(0, 0));
    let mut sup = supervisor(link, 1000);
    let mut listener = MockListener::new(&clock);
    listener.fail_start = true;
    let mut server = CommandServer::new(listener);
    let mut sink = RecordingSink::new();
    let mut c = clock.clone();

    assert!(!sup.begin(&mut server, &mut c, &mut sink));
    assert!(!sup.server_started());
    assert_eq!(sink.count(&LinkEvent::ListenerFailed { port: 9000 }), 1);

    server.listener_mut().fail_start = false;
    assert!(sup.begin(&mut server, &mut c, &mut sink));
    assert!(sup.server_started());
    assert_eq!(server.listener().start_calls.len(), 2);
}

// ── check_and_repair ──────────────────────────────────────────

#[test]
fn repair_makes_one_attempt_per_interval() {
    let clock = SimClock::new();
    let link = MockLink::new(&clock, AssociationPlan::no_link());
    let mut sup = supervisor(link, 3000);
    let mut sink = RecordingSink::new();
    let mut c = clock.clone();

    for now in 0..10_000u64 {
        sup.check_and_repair(now, &mut c, &mut sink);
    }

    // Attempts at 0, 3000, 6000, 9000.
    assert_eq!(sup.link().begin_calls.len(), 4);
    assert_eq!(sup.next_retry_at(), 12_000);
    assert_eq!(sink.count(&LinkEvent::LinkDown), 4);
}

#[test]
fn repair_reschedules_after_success_too() {
    let clock = SimClock::new();
    let plan = AssociationPlan::succeeds(100, 100).with_address(OTHER_ADDRESS);
    let link = MockLink::new(&clock, plan);
    let mut sup = supervisor(link, 2500);
    let mut sink = RecordingSink::new();
    let mut c = clock.clone();

    sup.check_and_repair(0, &mut c, &mut sink);
    assert!(sup.is_linked());
    assert_eq!(sup.last_known_address(), Some(OTHER_ADDRESS));
    assert_eq!(sup.next_retry_at(), 2500);

    // Connected: nothing more happens however late it gets.
    sup.check_and_repair(100_000, &mut c, &mut sink);
    assert_eq!(sup.link().begin_calls.len(), 1);
}

#[test]
fn link_loss_keeps_stale_address() {
    let clock = SimClock::new();
    let link = MockLink::new(&clock, AssociationPlan::no_link())
        .script([AssociationPlan::succeeds(0, 0)]);
    let mut sup = supervisor(link, 1000);
    let mut sink = RecordingSink::new();
    let mut c = clock.clone();

    assert!(sup.attempt_association(5000, &mut c, &mut sink));
    sup.link_mut().drop_link();

    let now = clock.now_ms();
    sup.check_and_repair(now, &mut c, &mut sink);
    assert!(!sup.is_linked());
    assert_eq!(sup.current_address(), None);
    assert_eq!(sup.last_known_address(), Some(TEST_ADDRESS));
}
