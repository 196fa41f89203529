//! Uplink facade: begin once, then poll. Repair ordering and gating.

use uplink::app::events::LinkEvent;
use uplink::{ClockPort, LinkState, Uplink};

use crate::mock_hw::{
    test_config, AssociationPlan, MockLink, MockListener, PeerScript, RecordingSink, SimClock,
    TEST_ADDRESS,
};

type TestUplink = Uplink<MockLink, MockListener, SimClock, RecordingSink>;

fn uplink(clock: &SimClock, link: MockLink, retry_ms: u32) -> TestUplink {
    Uplink::new(
        &test_config(retry_ms),
        link,
        MockListener::new(clock),
        clock.clone(),
        RecordingSink::new(),
    )
}

fn position(events: &[LinkEvent], wanted: &LinkEvent) -> usize {
    events
        .iter()
        .position(|e| e == wanted)
        .unwrap_or_else(|| panic!("{wanted:?} not emitted"))
}

#[test]
fn begin_then_poll_services_a_command() {
    let clock = SimClock::new();
    let mut up = uplink(&clock, MockLink::new(&clock, AssociationPlan::succeeds(750, 250)), 5000);

    assert!(up.begin());
    assert_eq!(up.last_known_address(), Some(TEST_ADDRESS));

    let peer = up
        .server_mut()
        .listener_mut()
        .connect(PeerScript::Sends(b"PING\n".to_vec()));
    assert_eq!(up.poll().as_deref(), Some("PING"));
    assert_eq!(peer.borrow().response(), "Received: PING");
    assert_eq!(peer.borrow().deadline_ms, Some(up.read_timeout_ms()));
}

#[test]
fn poll_with_timeout_overrides_read_deadline() {
    let clock = SimClock::new();
    let mut up = uplink(&clock, MockLink::new(&clock, AssociationPlan::succeeds(0, 0)), 5000);
    assert!(up.begin());

    let peer = up.server_mut().listener_mut().connect(PeerScript::Silent);
    let before = clock.now_ms();
    assert_eq!(up.poll_with_timeout(500), None);
    assert_eq!(peer.borrow().deadline_ms, Some(500));
    assert_eq!(clock.now_ms() - before, 500);
}

#[test]
fn idle_poll_is_instant_while_linked() {
    let clock = SimClock::new();
    let mut up = uplink(&clock, MockLink::new(&clock, AssociationPlan::succeeds(0, 0)), 5000);
    assert!(up.begin());

    let before = clock.now_ms();
    for _ in 0..100 {
        assert_eq!(up.poll(), None);
    }
    assert_eq!(clock.now_ms(), before);
    assert_eq!(up.supervisor().link().begin_calls.len(), 1);
}

#[test]
fn peers_wait_while_link_stays_down() {
    let clock = SimClock::new();
    let link = MockLink::new(&clock, AssociationPlan::no_link())
        .script([AssociationPlan::succeeds(0, 0)]);
    let mut up = uplink(&clock, link, 10_000);
    assert!(up.begin());

    up.supervisor_mut().link_mut().drop_link();
    let peer = up
        .server_mut()
        .listener_mut()
        .connect(PeerScript::Sends(b"PING\n".to_vec()));
    let accepts = up.server().listener().accept_calls;

    assert_eq!(up.poll(), None);
    assert_eq!(up.supervisor().link_state(), LinkState::Disconnected);
    assert_eq!(up.server().listener().accept_calls, accepts);
    assert_eq!(up.server().listener().waiting(), 1);
    assert!(!peer.borrow().closed);

    // Inside the retry interval: no new attempt, still no service.
    let attempts = up.supervisor().link().begin_calls.len();
    assert_eq!(up.poll(), None);
    assert_eq!(up.supervisor().link().begin_calls.len(), attempts);
    assert_eq!(up.last_known_address(), Some(TEST_ADDRESS));
}

#[test]
fn repair_is_committed_before_the_peer_is_serviced() {
    let clock = SimClock::new();
    let link = MockLink::new(&clock, AssociationPlan::succeeds(250, 0))
        .script([AssociationPlan::succeeds(0, 0)]);
    let mut up = uplink(&clock, link, 10_000);
    assert!(up.begin());

    up.supervisor_mut().link_mut().drop_link();
    up.server_mut()
        .listener_mut()
        .connect(PeerScript::Sends(b"stop\n".to_vec()));

    assert_eq!(up.poll().as_deref(), Some("stop"));

    let events = &up.sink().events;
    let down = position(events, &LinkEvent::LinkDown);
    let relinked = events
        .iter()
        .rposition(|e| *e == LinkEvent::Associated { address: TEST_ADDRESS })
        .unwrap();
    let served = position(events, &LinkEvent::CommandReceived { len: 4 });
    assert!(down < relinked && relinked < served);
}

#[test]
fn listener_starts_once_across_repairs() {
    let clock = SimClock::new();
    let mut up = uplink(&clock, MockLink::new(&clock, AssociationPlan::succeeds(0, 0)), 2000);
    assert!(up.begin());

    for _ in 0..3 {
        up.supervisor_mut().link_mut().drop_link();
        clock.advance(2000);
        let _ = up.poll();
        assert!(up.supervisor().is_linked());
    }

    assert_eq!(up.supervisor().link().begin_calls.len(), 4);
    assert_eq!(up.server().listener().start_calls, vec![9000]);
}
