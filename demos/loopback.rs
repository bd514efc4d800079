//! Loopback - host and device in one process.
//!
//! This example demonstrates:
//! - Registering instructions on a sender in a fixed order
//! - Building the matching dispatch table on the receiver
//! - Moving bytes between them through `MemoryStream`
//! - Checking both sides' schemas before talking
//!
//! ```text
//! RUST_LOG=serialwire=trace cargo run --example loopback
//! ```

use std::cell::RefCell;
use std::rc::Rc;

use serialwire::handler::DispatchTable;
use serialwire::stream::MemoryStream;
use serialwire::{Receiver, Sender};
use tracing_subscriber::EnvFilter;

/// What the pretend device is doing.
#[derive(Debug, Default)]
struct Device {
    leds: [bool; 4],
    speed: u16,
    pings: u32,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("serialwire=debug".parse()?))
        .init();

    // Host side: the order of these calls is the protocol.
    let mut host = Sender::<u8, _>::new(MemoryStream::new());
    let ping = host.create_typed::<()>("ping")?;
    let set_led = host.create_typed::<(u8, bool)>("set_led")?;
    let set_speed = host.create_typed::<u16>("set_speed")?;

    // Device side: same names, same order.
    let device = Rc::new(RefCell::new(Device::default()));
    let (d1, d2, d3) = (device.clone(), device.clone(), device.clone());
    let table = DispatchTable::builder()
        .handle_args("ping", move |()| {
            d1.borrow_mut().pings += 1;
            Ok(())
        })
        .handle_args("set_led", move |(index, on): (u8, bool)| {
            if let Some(led) = d2.borrow_mut().leds.get_mut(index as usize) {
                *led = on;
            }
            Ok(())
        })
        .handle_args("set_speed", move |speed: u16| {
            d3.borrow_mut().speed = speed;
            Ok(())
        })
        .build();
    let mut receiver = Receiver::<u8, _>::new(MemoryStream::new(), table);

    host.build_schema()
        .ensure_compatible(&receiver.build_schema())?;
    println!("schema:\n{}", host.build_schema().to_json()?);

    ping.invoke(&())?;
    set_led.invoke(&(2, true))?;
    set_speed.invoke(&1200)?;
    set_led.invoke(&(0, true))?;

    let bytes = host.with_stream(|s| s.take_written())?;
    println!("wire: {:02X?}", &bytes[..]);

    receiver.stream_mut().push(&bytes);
    while receiver.stream().pending() > 0 {
        receiver.poll()?;
    }

    println!("device: {:?}", device.borrow());
    Ok(())
}
