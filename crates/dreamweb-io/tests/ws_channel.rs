use std::net::TcpListener;
use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use dreamweb_io::{ChannelError, WsChannel};
use tungstenite::{Message, accept};

fn wait_for_frames(channel: &WsChannel, timeout: Duration) -> Vec<String> {
    let deadline = Instant::now() + timeout;
    loop {
        let frames = channel.drain_inbound();
        if !frames.is_empty() || Instant::now() >= deadline {
            return frames;
        }
        thread::sleep(Duration::from_millis(10));
    }
}

#[test]
fn exchanges_text_frames_with_server() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let port = listener.local_addr()?.port();
    let (seen_tx, seen_rx) = mpsc::channel();

    let server = thread::spawn(move || -> Result<()> {
        let (stream, _) = listener.accept()?;
        let mut socket = accept(stream)?;
        socket.send(Message::Text(r#"{"type":"reload","tree":{"type":"Text","props":{"content":"hi"}}}"#.into()))?;
        loop {
            match socket.read()? {
                Message::Text(text) => {
                    seen_tx.send(text)?;
                    break;
                }
                _ => continue,
            }
        }
        Ok(())
    });

    let channel = WsChannel::connect(format!("ws://127.0.0.1:{port}"), Duration::from_millis(100));
    assert!(channel.wait_open(Duration::from_secs(5)));

    let frames = wait_for_frames(&channel, Duration::from_secs(5));
    assert_eq!(frames.len(), 1);
    assert!(frames[0].contains("\"reload\""));

    channel.send(r#"{"type":"event","event":"click","handler":"h1"}"#.to_string())?;
    let echoed = seen_rx.recv_timeout(Duration::from_secs(5))?;
    assert!(echoed.contains("\"h1\""));

    server.join().expect("server thread")?;
    Ok(())
}

#[test]
fn reconnects_after_server_drops_connection() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let port = listener.local_addr()?.port();

    let server = thread::spawn(move || -> Result<()> {
        // First connection is closed right after the handshake.
        let (stream, _) = listener.accept()?;
        let mut first = accept(stream)?;
        first.close(None)?;
        let _ = first.flush();
        drop(first);

        let (stream, _) = listener.accept()?;
        let mut second = accept(stream)?;
        second.send(Message::Text("second".into()))?;
        // Keep the socket alive long enough for the client to read.
        thread::sleep(Duration::from_millis(500));
        Ok(())
    });

    let channel = WsChannel::connect(format!("ws://127.0.0.1:{port}"), Duration::from_millis(50));
    let frames = wait_for_frames(&channel, Duration::from_secs(5));
    assert_eq!(frames, vec!["second".to_string()]);

    server.join().expect("server thread")?;
    Ok(())
}

#[test]
fn send_fails_while_not_connected() {
    // Port 9 (discard) is not expected to speak WebSocket.
    let channel = WsChannel::connect("ws://127.0.0.1:9", Duration::from_secs(60));
    assert!(!channel.is_open());
    assert_eq!(channel.send("x".into()), Err(ChannelError::Closed));
    assert!(channel.drain_inbound().is_empty());
}
