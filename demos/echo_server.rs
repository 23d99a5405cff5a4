//! A minimal WebSocket echo server, demonstrating the `upgrade` feature:
//! a bare `std::net::TcpListener` loop that reads one HTTP/1.1 request
//! line-by-line, builds an `http::Request` from it, and hijacks the
//! connection into a `wen::Link` once the upgrade headers check out.
//!
//! Run with `cargo run --example echo_server --features upgrade`, then
//! connect with any WebSocket client to `ws://127.0.0.1:9001`.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};

use wen::upgrade;
use wen::websocket::FragmentCollector;
use wen::LinkConfig;

fn read_request_head(stream: &TcpStream) -> anyhow::Result<http::Request<()>> {
  let mut reader = BufReader::new(stream.try_clone()?);
  let mut request_line = String::new();
  reader.read_line(&mut request_line)?;
  let mut parts = request_line.split_whitespace();
  let method = parts.next().unwrap_or("GET");
  let path = parts.next().unwrap_or("/");

  let mut builder = http::Request::builder().method(method).uri(path);
  loop {
    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
      break;
    }
    let line = line.trim_end();
    if line.is_empty() {
      break;
    }
    if let Some((name, value)) = line.split_once(':') {
      builder = builder.header(name.trim(), value.trim());
    }
  }

  Ok(builder.body(())?)
}

fn handle(stream: TcpStream) -> anyhow::Result<()> {
  let request = read_request_head(&stream)?;
  if !upgrade::is_upgrade_request(&request) {
    anyhow::bail!("not a WebSocket upgrade request");
  }

  let response = upgrade::build_accept_response(&request)?;
  let mut writer = stream.try_clone()?;
  write!(
    writer,
    "HTTP/1.1 101 Switching Protocols\r\n\
     Upgrade: websocket\r\n\
     Connection: Upgrade\r\n\
     Sec-WebSocket-Accept: {}\r\n\r\n",
    response.headers().get("sec-websocket-accept").unwrap().to_str()?
  )?;

  let mut link = upgrade::hijack(stream, LinkConfig::default())?;
  let mut collector = FragmentCollector::new(&mut link);

  loop {
    match collector.next_message()? {
      Some(mut msg) => {
        // Text frames typed in most demo clients carry a trailing
        // newline; trim one before echoing and printing it back.
        if msg.opcode == wen::websocket::OpCode::Text && msg.payload.last() == Some(&b'\n') {
          msg.payload.pop();
        }
        println!("echoing {} bytes", msg.payload.len());
        link
          .send(msg.opcode.into(), &msg.payload)
          .map_err(wen::WenError::from)?;
      }
      None if link.state() >= wen::LinkState::Closing => break,
      None => continue,
    }
  }

  Ok(())
}

fn main() -> anyhow::Result<()> {
  let listener = TcpListener::bind("127.0.0.1:9001")?;
  println!("listening on ws://127.0.0.1:9001");

  for stream in listener.incoming() {
    let stream = stream?;
    if let Err(e) = handle(stream) {
      eprintln!("connection error: {e}");
    }
  }

  Ok(())
}
