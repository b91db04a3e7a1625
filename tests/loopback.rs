//! Client and server talking over real loopback sockets.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::{Duration, Instant};

use realmlink::messages::{Chat, ChatKind, Connect, ConnectReply, ResultCode, TimeMinute};
use realmlink::network::{handler_fn, Connection, LinkError, MessageHandlerRegistry, PingClient};
use realmlink::{ClientNetwork, NetConfig, ServerNetwork};

type Seen<T> = Rc<RefCell<Vec<T>>>;

fn config(max_players: usize) -> NetConfig {
    NetConfig { address: "127.0.0.1".into(), port: 0, max_players, ..NetConfig::default() }
}

/// Server that answers Connect and records every Chat it gets.
fn server(max_players: usize) -> (ServerNetwork, Seen<Chat>) {
    let seen = Seen::default();
    let sink = seen.clone();
    let mut registry = MessageHandlerRegistry::new();
    registry
        .register_message_with_handler::<Connect>(handler_fn(|_: &Connect, conn: &mut Connection| {
            let reply = ConnectReply {
                result: ResultCode::Success.into(),
                protocol_version: "test".into(),
                ..ConnectReply::default()
            };
            conn.send_message(&reply).unwrap();
        }))
        .unwrap();
    registry
        .register_message_with_handler::<Chat>(handler_fn(move |msg: &Chat, _: &mut Connection| {
            sink.borrow_mut().push(msg.clone())
        }))
        .unwrap();
    (ServerNetwork::start_listening(&config(max_players), registry).unwrap(), seen)
}

/// Client that records replies and clock ticks.
fn client() -> (ClientNetwork, Seen<ConnectReply>, Seen<u32>) {
    let replies = Seen::default();
    let ticks = Seen::default();
    let (r, t) = (replies.clone(), ticks.clone());
    let mut registry = MessageHandlerRegistry::new();
    registry
        .register_message_with_handler::<ConnectReply>(handler_fn(move |msg: &ConnectReply, _: &mut Connection| {
            r.borrow_mut().push(msg.clone())
        }))
        .unwrap();
    registry
        .register_message_with_handler::<TimeMinute>(handler_fn(move |msg: &TimeMinute, _: &mut Connection| {
            t.borrow_mut().push(msg.gametime)
        }))
        .unwrap();
    (ClientNetwork::new(registry), replies, ticks)
}

fn connect(client: &mut ClientNetwork, server: &ServerNetwork) {
    let port = server.local_addr().unwrap().port();
    client.connect("127.0.0.1", port).unwrap();
}

fn tick(server: &mut ServerNetwork) -> Vec<realmlink::ConnectionId> {
    server.process_until(Instant::now() + Duration::from_millis(5))
}

/// Runs `step` until it reports done, failing the test after about two seconds.
fn settle(mut step: impl FnMut() -> bool) {
    for _ in 0..400 {
        if step() {
            return;
        }
    }
    panic!("network never settled");
}

#[test]
fn request_and_reply() {
    let (mut server, _) = server(4);
    let (mut client, replies, _) = client();
    connect(&mut client, &server);
    settle(|| {
        tick(&mut server);
        server.connection_count() == 1
    });

    client.send_to_server(&Connect {}).unwrap();
    settle(|| {
        tick(&mut server);
        client.process().unwrap();
        !replies.borrow().is_empty()
    });
    let replies = replies.borrow();
    assert_eq!(replies.len(), 1);
    assert_eq!(replies[0].result, ResultCode::Success.code());
    assert_eq!(replies[0].protocol_version, "test");

    let id = server.connection_ids().next().unwrap();
    let stats = server.connection(id).unwrap().stats();
    assert_eq!(stats.packets_received, 1);
    assert_eq!(stats.packets_sent, 1);
}

#[test]
fn chat_arrives_in_order() {
    let (mut server, seen) = server(4);
    let (mut client, _, _) = client();
    connect(&mut client, &server);
    for i in 0..50 {
        let line = Chat { origin: "mira".into(), target: String::new(), text: format!("line {i}"), kind: ChatKind::Chat as u32 };
        client.send_to_server(&line).unwrap();
    }
    settle(|| {
        tick(&mut server);
        client.process().unwrap();
        seen.borrow().len() == 50
    });
    let texts: Vec<_> = seen.borrow().iter().map(|c| c.text.clone()).collect();
    let expected: Vec<_> = (0..50).map(|i| format!("line {i}")).collect();
    assert_eq!(texts, expected);
}

#[test]
fn broadcast_skips_the_excluded_player() {
    let (mut server, _) = server(4);
    let (mut a, _, a_ticks) = client();
    let (mut b, _, b_ticks) = client();
    connect(&mut a, &server);
    settle(|| {
        tick(&mut server);
        server.connection_count() == 1
    });
    let a_id = server.connection_ids().next().unwrap();
    connect(&mut b, &server);
    settle(|| {
        tick(&mut server);
        server.connection_count() == 2
    });

    assert_eq!(server.send_to_all(&TimeMinute { gametime: 1 }).unwrap(), 2);
    assert_eq!(server.send_to_all_but(a_id, &TimeMinute { gametime: 2 }).unwrap(), 1);
    server.send_to(a_id, &TimeMinute { gametime: 3 }).unwrap();
    settle(|| {
        tick(&mut server);
        a.process().unwrap();
        b.process().unwrap();
        a_ticks.borrow().len() == 2 && b_ticks.borrow().len() == 2
    });
    assert_eq!(&*a_ticks.borrow(), &[1, 3]);
    assert_eq!(&*b_ticks.borrow(), &[1, 2]);
}

#[test]
fn players_over_the_limit_are_turned_away() {
    let (mut server, _) = server(1);
    let (mut first, _, _) = client();
    let (mut second, _, _) = client();
    connect(&mut first, &server);
    settle(|| {
        tick(&mut server);
        server.connection_count() == 1
    });
    connect(&mut second, &server);
    settle(|| {
        tick(&mut server);
        second.process().is_err()
    });
    assert!(!second.is_connected());
    assert!(first.is_connected());
    assert_eq!(server.connection_count(), 1);
}

#[test]
fn server_reports_players_that_leave() {
    let (mut server, _) = server(4);
    let (mut client, _, _) = client();
    connect(&mut client, &server);
    settle(|| {
        tick(&mut server);
        server.connection_count() == 1
    });
    let id = server.connection_ids().next().unwrap();
    client.disconnect();
    assert!(matches!(client.process(), Err(LinkError::NotConnected)));

    let mut lost = Vec::new();
    settle(|| {
        lost.extend(tick(&mut server));
        !lost.is_empty()
    });
    assert_eq!(lost, [id]);
    assert_eq!(server.connection_count(), 0);
    assert!(server.connection(id).is_none());
}

#[test]
fn kicked_player_sees_the_link_drop() {
    let (mut server, _) = server(4);
    let (mut client, _, _) = client();
    connect(&mut client, &server);
    settle(|| {
        tick(&mut server);
        server.connection_count() == 1
    });
    let id = server.connection_ids().next().unwrap();
    assert!(server.disconnect_player(id));
    assert!(!server.disconnect_player(id));
    settle(|| {
        std::thread::sleep(Duration::from_millis(5));
        client.process().is_err()
    });
    assert!(!client.is_connected());
}

#[test]
fn second_connect_is_refused() {
    let (mut server, _) = server(4);
    let (mut client, _, _) = client();
    connect(&mut client, &server);
    let port = server.local_addr().unwrap().port();
    let err = client.connect_to_server("127.0.0.1", port, Duration::from_secs(1)).unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::AlreadyExists);
    tick(&mut server);
    assert!(client.is_connected());
}

#[test]
fn ping_echoes_the_timestamp() {
    let (mut server, _) = server(4);
    let ping_port = server.ping_addr().unwrap().port();
    assert_ne!(ping_port, server.local_addr().unwrap().port());

    let mut pinger = PingClient::new();
    pinger.add_server("127.0.0.1", ping_port, 7).unwrap();
    let mut sent = false;
    settle(|| {
        tick(&mut server);
        if !sent {
            pinger.send_pings(1234);
            sent = true;
        }
        pinger.process_ping_replies();
        pinger.collect_ping_reply_data()[0].timestamp == 1234
    });
    let entry = pinger.collect_ping_reply_data()[0];
    assert_eq!(entry.id, 7);
    assert_eq!(entry.round_trip(1300), Some(66));
}
