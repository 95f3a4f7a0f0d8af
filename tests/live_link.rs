//! End-to-end: the dashboard against a local websocket server standing in
//! for the Node-RED flow.

use std::net::TcpListener;
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::unbounded;
use transformer_hmi::logbuf::LogBuffer;
use transformer_hmi::signals::Signal;
use transformer_hmi::ws::WsTransport;
use transformer_hmi::{ConnectionStatus, Dashboard, DashboardConfig};
use tungstenite::Message;

fn pump_until<F>(d: &mut Dashboard, timeout: Duration, mut done: F) -> bool
where
    F: FnMut(&Dashboard) -> bool,
{
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        d.pump(Instant::now());
        if done(&*d) {
            return true;
        }
        thread::sleep(Duration::from_millis(10));
    }
    false
}

fn config_for(port: u16, reconnect_ms: u64) -> DashboardConfig {
    DashboardConfig {
        host: "127.0.0.1".into(),
        port,
        reconnect_delay: Duration::from_millis(reconnect_ms),
        ..DashboardConfig::default()
    }
}

#[test]
fn receives_and_merges_pushed_frames() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let server = thread::spawn(move || {
        let (stream, _) = listener.accept().expect("accept");
        let mut ws = tungstenite::accept(stream).expect("handshake");
        ws.send(Message::text(
            r#"{"LV L1 Winding temperature": 101.2, "Transformer trip": false}"#,
        ))
        .unwrap();
        ws.send(Message::text("{broken")).unwrap();
        ws.send(Message::text(r#"{"Cooling bank working": true}"#))
            .unwrap();
        while ws.read().is_ok() {}
    });

    let (tx, rx) = unbounded();
    let mut d = Dashboard::with_transport(
        &config_for(port, 5000),
        WsTransport::new(tx),
        rx,
        LogBuffer::default(),
    );

    assert!(pump_until(&mut d, Duration::from_secs(5), |d| {
        d.state().snapshot().flag(Signal::CoolingOk) == Some(true)
    }));
    let snap = d.state().snapshot();
    assert_eq!(snap.number(Signal::TempL1), Some(101.2));
    assert_eq!(snap.flag(Signal::Trip), Some(false));
    assert_eq!(d.state().status(), ConnectionStatus::Connected);
    assert!(d.state().error().is_none());

    d.shutdown();
    server.join().unwrap();
}

#[test]
fn reconnects_after_server_drops_the_link() {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let server = thread::spawn(move || {
        for round in 0..2 {
            let (stream, _) = listener.accept().expect("accept");
            let mut ws = tungstenite::accept(stream).expect("handshake");
            let payload = format!(r#"{{"LV L3 Winding temperature": {}}}"#, 90 + round);
            ws.send(Message::text(payload)).unwrap();
            if round == 0 {
                let _ = ws.close(None);
            }
            while ws.read().is_ok() {}
        }
    });

    let (tx, rx) = unbounded();
    let mut d = Dashboard::with_transport(
        &config_for(port, 200),
        WsTransport::new(tx),
        rx,
        LogBuffer::default(),
    );

    assert!(pump_until(&mut d, Duration::from_secs(5), |d| {
        d.state().snapshot().number(Signal::TempL3) == Some(90.0)
    }));
    assert!(pump_until(&mut d, Duration::from_secs(5), |d| {
        d.state().status() == ConnectionStatus::Disconnected
    }));
    assert!(pump_until(&mut d, Duration::from_secs(5), |d| {
        d.state().snapshot().number(Signal::TempL3) == Some(91.0)
    }));
    assert_eq!(d.state().status(), ConnectionStatus::Connected);

    d.shutdown();
    server.join().unwrap();
}

#[test]
fn unreachable_controller_surfaces_error_and_stays_retrying() {
    let port = TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();

    let (tx, rx) = unbounded();
    let mut d = Dashboard::with_transport(
        &config_for(port, 5000),
        WsTransport::new(tx),
        rx,
        LogBuffer::default(),
    );

    assert!(pump_until(&mut d, Duration::from_secs(5), |d| {
        d.state().status() == ConnectionStatus::Disconnected
    }));
    let err = d.state().error().expect("user-visible error");
    assert!(err.starts_with("Failed to connect to Node-RED"), "{err}");
    assert!(d.state().snapshot().is_empty());
}
