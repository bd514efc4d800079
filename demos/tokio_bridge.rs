//! Tokio bridge - driving the synchronous core from async code.
//!
//! This example demonstrates:
//! - Keeping the sender and receiver on `MemoryStream`s
//! - Pumping bytes to and from async transports with `stream::pump`
//!
//! Run with `cargo run --example tokio_bridge --features tokio`.

use std::cell::Cell;
use std::rc::Rc;

use serialwire::handler::DispatchTable;
use serialwire::stream::{pump, MemoryStream};
use serialwire::{Receiver, Sender};
use tokio::io::duplex;
use tracing_subscriber::EnvFilter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("serialwire=debug".parse()?))
        .init();

    let (mut host_io, mut device_io) = duplex(256);

    let mut host = Sender::<u16, _>::new(MemoryStream::new());
    let add = host.create_typed::<u32>("add")?;
    let reset = host.create_typed::<()>("reset")?;

    let total = Rc::new(Cell::new(0u32));
    let (t1, t2) = (total.clone(), total.clone());
    let table = DispatchTable::builder()
        .handle_args("add", move |n: u32| {
            t1.set(t1.get() + n);
            Ok(())
        })
        .handle_args("reset", move |()| {
            t2.set(0);
            Ok(())
        })
        .build();
    let mut device = Receiver::<u16, _>::new(MemoryStream::new(), table);

    for n in [5, 10, 20] {
        add.invoke(&n)?;
    }
    reset.invoke(&())?;
    add.invoke(&7)?;

    let pending = host.with_stream(|s| s.take_written())?;
    let sent = pump::write_out(&mut host_io, pending).await?;
    drop(host_io);

    while pump::fill_from(&mut device_io, device.stream_mut()).await? > 0 {}
    while device.stream().pending() > 0 {
        device.poll()?;
    }

    println!("sent {} bytes, device total = {}", sent, total.get());
    Ok(())
}
