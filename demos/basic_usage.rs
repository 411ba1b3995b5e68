//! Basic meshlock usage example

use meshlock::{Resource, ResourceGroup};
use std::thread;

fn main() {
    println!("meshlock Basic Usage Example");
    println!("============================");

    // Two independent resources: acquiring one never blocks on the other.
    let a = Resource::<&'static str>::create();
    let b = Resource::create();
    a.set_associated_object("account-a");
    b.set_associated_object("account-b");

    println!("\nIndependent resources:");
    {
        let mut group = ResourceGroup::create_acquiring(&[a.clone()]);
        println!("  holding {:?} alone", a.associated_object());
        group.free().unwrap();
    }

    // Declaring them connected merges their classes: acquiring either now
    // locks both.
    println!("\nConnecting a and b:");
    let mut group = ResourceGroup::create_acquiring(&[a.clone(), b.clone()]);
    group.connect(&a, &b).unwrap();
    group.free().unwrap();

    let mut group = ResourceGroup::create_acquiring(&[a.clone()]);
    let neighbors = group.directly_connected_to(&b).unwrap();
    println!(
        "  acquiring `a` alone also holds `b`'s class: neighbors of b = {}",
        neighbors.len()
    );
    group.free().unwrap();

    // Two threads contending for the same class serialize automatically.
    println!("\nTwo threads contending for the merged class:");
    thread::scope(|s| {
        for i in 0..2 {
            let a = a.clone();
            s.spawn(move || {
                let mut g = ResourceGroup::create_acquiring(&[a]);
                println!("  thread {i} holds the class");
                g.free().unwrap();
            });
        }
    });

    // A resource created already-connected to another, in one step.
    let c = a.create_connected();
    let mut group = ResourceGroup::create_acquiring(&[c.clone()]);
    println!(
        "\ncreate_connected: new resource's class also includes `a` = {}",
        group.directly_connected_to(&a).unwrap().contains(&c)
    );
    group.free().unwrap();
}
