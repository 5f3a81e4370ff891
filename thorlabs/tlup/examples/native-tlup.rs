//! List all connected TLUP devices and blink the first LED that is found.
//!
//! Run with `RUST_LOG=debug` to see every driver call.

use std::{thread, time::Duration};

use thorlabs_tlup::{Light, SetpointAttribute, Tlup};

fn main() {
    env_logger::init();

    let tlup = Tlup::shared();

    let resources = tlup.list_devices().unwrap();
    for resource in &resources {
        let handle = tlup.open(resource).unwrap();
        let info = tlup.get_info(&handle).unwrap();
        let max = tlup
            .get_current_attribute(&handle, SetpointAttribute::MaxValue)
            .unwrap();
        println!("{resource}: {info}, max. current setpoint: {max} A");
        tlup.close(handle).unwrap();
    }

    let Some(resource) = resources.first() else {
        println!("No devices found.");
        return;
    };

    let light = Light::open(tlup, "LED", resource).unwrap();
    let amps = light.info().unwrap().current_limit().as_amperes() / 10.0;
    for _ in 0..3 {
        light.set_state(amps).unwrap();
        println!("{} is on at {} A", light.name(), light.state().unwrap());
        thread::sleep(Duration::from_secs(1));
        light.set_state(0.0).unwrap();
        thread::sleep(Duration::from_secs(1));
    }
    light.close().unwrap();
}
