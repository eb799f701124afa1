use crate::pairing::{PairingCoordinator, PairingOutcome, PairingState, Rejection};
use crate::protocol::Message;
use crate::types::{ClientId, Role};

fn subscribed(role: Role, self_id: &str) -> PairingCoordinator {
    let mut coordinator = PairingCoordinator::new(role);
    coordinator.begin_connect();
    coordinator.on_connected(ClientId::from(self_id));
    coordinator.on_subscribed(0.0);
    coordinator
}

// ===== State transitions =====

#[test]
fn test_initial_state() {
    let coordinator = PairingCoordinator::new(Role::Display);
    assert_eq!(coordinator.state(), PairingState::Disconnected);
    assert!(coordinator.binding().peer().is_none());
    assert!(coordinator.binding().self_id().is_none());
}

#[test]
fn test_connect_then_subscribe() {
    let mut coordinator = PairingCoordinator::new(Role::Display);
    coordinator.begin_connect();
    assert_eq!(coordinator.state(), PairingState::Connecting);

    coordinator.on_connected(ClientId::from("display-1"));
    assert_eq!(coordinator.state(), PairingState::Connecting);
    assert_eq!(coordinator.binding().self_id(), Some(&ClientId::from("display-1")));

    assert!(coordinator.on_subscribed(10.0).is_none());
    assert_eq!(coordinator.state(), PairingState::Unpaired);
}

#[test]
fn test_controller_announces_on_subscribe() {
    let mut coordinator = PairingCoordinator::new(Role::Controller);
    coordinator.begin_connect();
    coordinator.on_connected(ClientId::from("controller-1"));

    let announcement = coordinator.on_subscribed(1_234.0);

    assert_eq!(
        announcement,
        Some(Message::Discovery {
            role: Role::Controller,
            time_stamp: 1_234.0
        })
    );
}

// ===== Handshake =====

#[test]
fn test_display_pairs_on_controller_discovery() {
    let mut display = subscribed(Role::Display, "display-1");
    let controller = ClientId::from("controller-1");

    let outcome = display.on_unpaired_message(
        &controller,
        &Message::Discovery {
            role: Role::Controller,
            time_stamp: 1_000.0,
        },
        1_030.0,
    );

    assert_eq!(
        outcome,
        PairingOutcome::Paired {
            peer: controller.clone(),
            replies: vec![
                Message::Discovery {
                    role: Role::Display,
                    time_stamp: 1_030.0
                },
                Message::Sync {
                    delta: 30.0,
                    time_stamp: 1_030.0
                },
            ],
        }
    );
    assert_eq!(display.state(), PairingState::Paired);
    assert_eq!(display.binding().peer(), Some(&controller));
}

#[test]
fn test_controller_pairs_on_display_discovery_without_reply() {
    let mut controller = subscribed(Role::Controller, "controller-1");
    let display = ClientId::from("display-1");

    let outcome = controller.on_unpaired_message(
        &display,
        &Message::Discovery {
            role: Role::Display,
            time_stamp: 5.0,
        },
        6.0,
    );

    assert_eq!(
        outcome,
        PairingOutcome::Paired {
            peer: display.clone(),
            replies: Vec::new(),
        }
    );
    assert_eq!(controller.binding().peer(), Some(&display));
}

#[test]
fn test_full_handshake_binds_both_sides() {
    let controller_id = ClientId::from("c");
    let display_id = ClientId::from("d");
    let mut controller = PairingCoordinator::new(Role::Controller);
    let mut display = subscribed(Role::Display, "d");

    controller.begin_connect();
    controller.on_connected(controller_id.clone());
    let announcement = controller.on_subscribed(100.0).unwrap();

    let PairingOutcome::Paired { replies, .. } =
        display.on_unpaired_message(&controller_id, &announcement, 120.0)
    else {
        panic!("display did not pair");
    };
    for reply in &replies {
        let _ = controller.on_unpaired_message(&display_id, reply, 140.0);
    }

    assert_eq!(controller.state(), PairingState::Paired);
    assert_eq!(display.state(), PairingState::Paired);
    assert_eq!(controller.binding().peer(), Some(&display_id));
    assert_eq!(display.binding().peer(), Some(&controller_id));
}

#[test]
fn test_own_discovery_echo_ignored() {
    let mut controller = subscribed(Role::Controller, "c");
    let outcome = controller.on_unpaired_message(
        &ClientId::from("c"),
        &Message::Discovery {
            role: Role::Controller,
            time_stamp: 0.0,
        },
        0.0,
    );
    assert_eq!(outcome, PairingOutcome::Ignored(Rejection::UnexpectedRole));
    assert_eq!(controller.state(), PairingState::Unpaired);
}

#[test]
fn test_non_discovery_ignored_while_unpaired() {
    let mut display = subscribed(Role::Display, "d");
    let outcome = display.on_unpaired_message(
        &ClientId::from("c"),
        &Message::Seek { position: 3.0 },
        0.0,
    );
    assert_eq!(outcome, PairingOutcome::Ignored(Rejection::AwaitingDiscovery));
    assert_eq!(display.state(), PairingState::Unpaired);
}

#[test]
fn test_discovery_ignored_before_subscribe() {
    let mut display = PairingCoordinator::new(Role::Display);
    display.begin_connect();
    let outcome = display.on_unpaired_message(
        &ClientId::from("c"),
        &Message::Discovery {
            role: Role::Controller,
            time_stamp: 0.0,
        },
        0.0,
    );
    assert_eq!(outcome, PairingOutcome::Ignored(Rejection::NotListening));
}

#[test]
fn test_second_controller_cannot_rebind() {
    let mut display = subscribed(Role::Display, "d");
    let discovery = Message::Discovery {
        role: Role::Controller,
        time_stamp: 0.0,
    };
    display.on_unpaired_message(&ClientId::from("c1"), &discovery, 0.0);

    let outcome = display.on_unpaired_message(&ClientId::from("c2"), &discovery, 0.0);

    assert_eq!(outcome, PairingOutcome::Ignored(Rejection::NotListening));
    assert_eq!(display.binding().peer(), Some(&ClientId::from("c1")));
}

// ===== Admission =====

#[test]
fn test_admit_only_bound_peer() {
    let mut controller = subscribed(Role::Controller, "c");
    controller.on_unpaired_message(
        &ClientId::from("d"),
        &Message::Discovery {
            role: Role::Display,
            time_stamp: 0.0,
        },
        0.0,
    );

    assert!(controller.admit(&ClientId::from("d")).is_ok());
    assert_eq!(
        controller.admit(&ClientId::from("intruder")),
        Err(Rejection::UnboundSender)
    );
    // Our own echo is not the peer either
    assert_eq!(controller.admit(&ClientId::from("c")), Err(Rejection::UnboundSender));
    assert_eq!(controller.state(), PairingState::Paired);
}

#[test]
fn test_admit_before_pairing() {
    let controller = subscribed(Role::Controller, "c");
    assert_eq!(controller.admit(&ClientId::from("d")), Err(Rejection::NotListening));
}

// ===== Reset =====

#[test]
fn test_reset_from_paired() {
    let mut display = subscribed(Role::Display, "d");
    display.on_unpaired_message(
        &ClientId::from("c"),
        &Message::Discovery {
            role: Role::Controller,
            time_stamp: 0.0,
        },
        0.0,
    );

    display.reset();

    assert_eq!(display.state(), PairingState::Disconnected);
    assert!(display.binding().peer().is_none());
    assert!(display.binding().self_id().is_none());
}

#[test]
fn test_unbind_returns_to_unpaired() {
    let mut display = subscribed(Role::Display, "d");
    display.on_unpaired_message(
        &ClientId::from("c"),
        &Message::Discovery {
            role: Role::Controller,
            time_stamp: 0.0,
        },
        0.0,
    );

    display.unbind();

    assert_eq!(display.state(), PairingState::Unpaired);
    assert!(display.binding().peer().is_none());
    assert_eq!(display.binding().self_id(), Some(&ClientId::from("d")));
}

#[test]
fn test_announcement_only_for_unpaired_controller() {
    let display = subscribed(Role::Display, "d");
    assert!(display.announcement(0.0).is_none());
    let controller = PairingCoordinator::new(Role::Controller);
    assert!(controller.announcement(0.0).is_none());
}
