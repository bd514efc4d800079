//! TCP host - a device loop on a non-blocking socket.
//!
//! This example demonstrates:
//! - Wrapping a `std::io` transport in `IoStream`
//! - Polling a receiver from an application loop without blocking
//! - Waiting for argument bytes that arrive in a later segment
//! - Stopping the loop from inside a handler
//!
//! The "device" runs on its own thread with its own receiver; the host
//! connects over localhost and sends a few instructions.

use std::cell::Cell;
use std::net::{TcpListener, TcpStream};
use std::rc::Rc;
use std::thread;
use std::time::Duration;

use serialwire::handler::DispatchTable;
use serialwire::stream::IoStream;
use serialwire::{ArgumentRead, Receiver, ReceiverConfig, Sender};
use tracing_subscriber::EnvFilter;

fn run_device(listener: TcpListener) -> serialwire::Result<()> {
    let (socket, peer) = listener.accept()?;
    socket.set_nonblocking(true)?;
    tracing::info!("Device accepted {}", peer);

    let done = Rc::new(Cell::new(false));
    let stop = done.clone();
    let table = DispatchTable::builder()
        .handle_args("log", |(level, value): (u8, i32)| {
            tracing::info!("log level={} value={}", level, value);
            Ok(())
        })
        .handle_args("position", |(x, y, z): (f32, f32, f32)| {
            tracing::info!("position ({}, {}, {})", x, y, z);
            Ok(())
        })
        .handle_args("quit", move |()| {
            stop.set(true);
            Ok(())
        })
        .build();
    // TCP may split a code from its arguments; give them time to follow.
    let config = ReceiverConfig {
        argument_read: ArgumentRead::Wait { timeout_ms: 100 },
    };
    let mut receiver = Receiver::<u8, _>::with_config(IoStream::new(socket), table, config)?;

    while !done.get() && !receiver.stream().is_closed() {
        receiver.poll()?;
        // The rest of the device's work would go here.
        thread::sleep(Duration::from_millis(1));
    }

    if let Some(e) = receiver.stream_mut().take_error() {
        tracing::warn!("Link failed: {}", e);
        return Err(e.into());
    }

    tracing::info!("Device loop finished");
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    let device = thread::spawn(move || run_device(listener));

    let mut host = Sender::<u8, _>::new(IoStream::new(TcpStream::connect(addr)?));
    let log = host.create_typed::<(u8, i32)>("log")?;
    let position = host.create_typed::<(f32, f32, f32)>("position")?;
    let quit = host.create_typed::<()>("quit")?;

    log.invoke(&(1, -40))?;
    position.invoke(&(1.5, 0.0, -2.25))?;
    log.invoke(&(2, 7))?;
    quit.invoke(&())?;

    match device.join() {
        Ok(result) => result?,
        Err(_) => return Err("device thread panicked".into()),
    }
    Ok(())
}
