//! oldfilm-control-osc
//!
//! OSC control-plane for the player: receives OSC packets over UDP and turns them into
//! [`ControlCommand`]s.
//!
//! Address map (first argument is the value where one is needed):
//! - `/play`, `/pause`, `/toggle`
//! - `/seek <ms>`
//! - `/effect <0|1>` (no argument toggles)
//! - `/sepia`, `/noise`, `/scratch`, `/vignetting` with a value in `[0, 1]`
//!
//! A `/oldfilm` prefix is accepted and stripped.
//!
//! rosc 0.10.x API note:
//! - `rosc::decoder::decode_udp` returns `Result<(&[u8], OscPacket), _>` (nom-style),
//!   where the first tuple element is the *unconsumed remainder* of the buffer.

use std::io;
use std::net::{SocketAddr, UdpSocket};

use oldfilm_core::ControlCommand;
use rosc::{OscPacket, OscType};
use tracing::{debug, warn};

/// Non-blocking UDP OSC receiver that yields control commands.
#[derive(Debug)]
pub struct OscControlReceiver {
    sock: UdpSocket,
    buf: [u8; 2048],
}

impl OscControlReceiver {
    /// Bind to an address like "127.0.0.1:9000" and put the socket in non-blocking mode.
    pub fn bind(addr: &str) -> io::Result<Self> {
        let sock = UdpSocket::bind(addr)?;
        sock.set_nonblocking(true)?;
        Ok(Self {
            sock,
            buf: [0u8; 2048],
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.sock.local_addr()
    }

    /// Drains the socket until `WouldBlock` and returns every recognised command, in order.
    pub fn poll(&mut self) -> Vec<ControlCommand> {
        let mut out = Vec::new();

        loop {
            match self.sock.recv_from(&mut self.buf) {
                Ok((n, from)) => match rosc::decoder::decode_udp(&self.buf[..n]) {
                    Ok((_rest, pkt)) => extract_from_packet(pkt, &mut out),
                    Err(e) => debug!(%from, error = ?e, "undecodable osc packet"),
                },
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    warn!(error = %e, "osc socket error");
                    break;
                }
            }
        }

        out
    }
}

/// Walk a packet/bundle tree and push parsed commands into `out`.
fn extract_from_packet(pkt: OscPacket, out: &mut Vec<ControlCommand>) {
    match pkt {
        OscPacket::Message(m) => match parse_command(&m.addr, &m.args) {
            Some(cmd) => out.push(cmd),
            None => debug!(addr = %m.addr, "ignored osc message"),
        },
        OscPacket::Bundle(b) => {
            for p in b.content {
                extract_from_packet(p, out);
            }
        }
    }
}

fn number(args: &[OscType]) -> Option<f64> {
    match *args.first()? {
        OscType::Float(x) => Some(x as f64),
        OscType::Double(x) => Some(x),
        OscType::Int(x) => Some(x as f64),
        OscType::Long(x) => Some(x as f64),
        OscType::Bool(b) => Some(if b { 1.0 } else { 0.0 }),
        _ => None,
    }
}

/// Maps one OSC message onto a command, or `None` if the address or argument is unusable.
pub fn parse_command(addr: &str, args: &[OscType]) -> Option<ControlCommand> {
    let name = addr.strip_prefix("/oldfilm").unwrap_or(addr);
    let name = name.strip_prefix('/')?;
    let cmd = match name {
        "play" => ControlCommand::Play,
        "pause" => ControlCommand::Pause,
        "toggle" => ControlCommand::TogglePlayback,
        "seek" => {
            let ms = number(args).filter(|v| v.is_finite() && *v >= 0.0)?;
            ControlCommand::Seek { ms: ms as u64 }
        }
        "effect" => match number(args) {
            Some(v) => ControlCommand::EnableEffect(v >= 0.5),
            None => ControlCommand::ToggleEffect,
        },
        "sepia" => ControlCommand::SetSepia(number(args)? as f32),
        "noise" => ControlCommand::SetNoise(number(args)? as f32),
        "scratch" => ControlCommand::SetScratch(number(args)? as f32),
        "vignetting" => ControlCommand::SetVignetting(number(args)? as f32),
        _ => return None,
    };
    Some(cmd)
}
