//! Prints the LTE counters found in a saved device response.
//!
//! `unifi-parse capture.json` or `curl ... | unifi-parse -`

use std::fs::File;
use std::io;
use std::process::ExitCode;

use tracker_core::format_megabytes;
use unifi::counters_from_reader;

fn main() -> ExitCode {
    let Some(source) = std::env::args().nth(1) else {
        eprintln!("usage: unifi-parse <device-response.json | ->");
        return ExitCode::from(2);
    };

    let parsed = if source == "-" {
        counters_from_reader(io::stdin().lock())
    } else {
        match File::open(&source) {
            Ok(file) => counters_from_reader(file),
            Err(err) => {
                eprintln!("cannot open {source}: {err}");
                return ExitCode::FAILURE;
            }
        }
    };

    match parsed {
        Ok(counters) => {
            println!("lte_rxbytes {}", counters.rx_bytes);
            println!("lte_txbytes {}", counters.tx_bytes);
            println!("total {}", format_megabytes(counters.total_bytes()));
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("{err}");
            ExitCode::from(3)
        }
    }
}
