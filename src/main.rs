use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::time::*;

use realmlink::messages::{Chat, ChatKind, Command, Connect, ConnectReply, ResultCode};
use realmlink::network::{handler_fn, Connection, MessageHandlerRegistry};
use realmlink::{NetConfig, ServerNetwork};

fn system_line(text: String) -> Chat {
    Chat { origin: "server".into(), target: String::new(), text, kind: ChatKind::System as u32 }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let config = match std::env::args_os().nth(1) {
        Some(path) => NetConfig::load(path)?,
        None => NetConfig::default(),
    };

    let starttime = Instant::now();
    let players = Rc::new(Cell::new(0u32));
    let chat_lines: Rc<RefCell<Vec<Chat>>> = Rc::default();

    let mut registry = MessageHandlerRegistry::new();
    let online = players.clone();
    registry.register_message_with_handler::<Connect>(handler_fn(move |_: &Connect, conn: &mut Connection| {
        let reply = ConnectReply {
            result: ResultCode::Success.into(),
            protocol_version: env!("CARGO_PKG_VERSION").into(),
            uptime: format!("{}s", starttime.elapsed().as_secs()),
            current_players: online.get(),
            ..ConnectReply::default()
        };
        if let Err(e) = conn.send_message(&reply) {
            log::warn!("greeting {}: {e}", conn.peer());
        }
    }))?;
    let relay = chat_lines.clone();
    registry.register_message_with_handler::<Chat>(handler_fn(move |msg: &Chat, _: &mut Connection| {
        relay.borrow_mut().push(msg.clone());
    }))?;
    registry.register_message_with_handler::<Command>(handler_fn(move |msg: &Command, conn: &mut Connection| {
        let text = match msg.command.trim() {
            "/uptime" => format!("up for {}s", starttime.elapsed().as_secs()),
            other => format!("unknown command '{other}'"),
        };
        if let Err(e) = conn.send_message(&system_line(text)) {
            log::warn!("answering {}: {e}", conn.peer());
        }
    }))?;

    let mut network = ServerNetwork::start_listening(&config, registry)?;
    let tick = config.tick();
    let mut next_tick_due = Instant::now() + tick;
    loop {
        for id in network.process_until(next_tick_due) {
            log::info!("player {id} left");
        }
        players.set(network.connection_count() as u32);

        for line in chat_lines.borrow_mut().drain(..) {
            // private messages need a name to connection mapping, which
            // belongs to the login layer
            if line.kind() == Some(ChatKind::Pm) {
                continue;
            }
            if let Err(e) = network.send_to_all(&line) {
                log::warn!("relaying chat from {}: {e}", line.origin);
            }
        }
        next_tick_due += tick;
    }
}
