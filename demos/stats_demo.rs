use clap::Parser;
use hopscotch_table::Config;
use hopscotch_table::DefaultHashBuilder;
use hopscotch_table::Event;
use hopscotch_table::HashTable;

#[derive(Parser, Debug)]
struct Args {
    #[arg(short = 'c', long = "target_capacity", default_value_t = 1000)]
    target_capacity: usize,

    #[arg(long = "hop_limit", default_value_t = hopscotch_table::DEFAULT_HOP_LIMIT)]
    hop_limit: usize,

    #[arg(long = "add_limit", default_value_t = hopscotch_table::DEFAULT_ADD_LIMIT)]
    add_limit: usize,
}

#[derive(Default)]
struct Counts {
    inserts: usize,
    hops: usize,
    grows: usize,
    erases: usize,
}

fn letters() {
    let mut table = HashTable::new();
    for c in ('a'..='z').chain('A'..='Z') {
        table.insert(c.to_string(), c as i32);
    }
    println!("Inserted {} letters", table.len());

    for value in [1, 2] {
        for key in ["f", "p", "q", "C"] {
            table.insert(key.to_string(), value);
        }
        println!(
            "f={} p={} q={} C={}",
            table["f"], table["p"], table["q"], table["C"]
        );
    }

    for key in ["f", "C", "f"] {
        println!("erase {key}: {}", table.erase(key));
    }
    println!("f present after erase: {}", table.contains_key("f"));

    for key in ["f", "p", "q", "C"] {
        table.insert(key.to_string(), 3);
    }

    for (count, (_, value)) in table.iter_mut().enumerate() {
        *value = count as i32 + 1;
    }
    let forward: String = table.keys().map(String::as_str).collect();
    let backward: String = table.keys().rev().map(String::as_str).collect();
    println!("forward:  {forward}");
    println!("backward: {backward}");
    println!("lookup of missing key: {:?}", table.get("not present"));
}

fn main() {
    let args = Args::parse();

    letters();
    println!();

    let config = Config::default()
        .with_initial_capacity(args.target_capacity)
        .with_hop_limit(args.hop_limit)
        .with_add_limit(args.add_limit);
    println!("Creating HashTable with {config:?}");

    let mut counts = Counts::default();
    let mut table = match HashTable::with_config_hasher_and_observer(
        config,
        DefaultHashBuilder::default(),
        |event: Event| match event {
            Event::Insert { .. } => counts.inserts += 1,
            Event::Hop { .. } => counts.hops += 1,
            Event::Grow { .. } => counts.grows += 1,
            Event::Erase { .. } => counts.erases += 1,
        },
    ) {
        Ok(table) => table,
        Err(err) => {
            eprintln!("invalid configuration: {err}");
            std::process::exit(2);
        }
    };

    let initial_capacity = table.capacity();
    println!("Actual capacity: {initial_capacity}");
    println!("Filling table with u64 keys...");

    let mut num_failures = 0;
    for i in 0..initial_capacity as u64 {
        if table.try_insert(i, i).is_err() {
            num_failures += 1;
        }
    }

    println!("Inserted {} values into table", table.len());
    println!(
        "Final load factor: {:.2}%",
        (table.len() as f64 / table.capacity() as f64) * 100.0
    );

    table.probe_histogram().print();
    table.debug_stats().print();
    println!("Failed insertions: {num_failures}");
    drop(table);

    println!(
        "Events: {} inserts, {} hops, {} grows, {} erases",
        counts.inserts, counts.hops, counts.grows, counts.erases
    );
}
